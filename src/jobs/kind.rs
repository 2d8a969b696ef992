//! # Known job kinds and their unlock messages.
//!
//! Job names are free-form strings in the catalog, but the standard jobs are
//! a closed set. [`JobKind`] maps those names to their announcement text;
//! any other name gets a generic message from [`unlock_message`].

use std::fmt;

/// The standard jobs shipped in [`Catalog::default`](crate::Catalog).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    BountyHunter,
    RwaMonitor,
    TradingBot,
    InvestmentEngine,
}

impl JobKind {
    pub const ALL: [JobKind; 4] = [
        JobKind::BountyHunter,
        JobKind::RwaMonitor,
        JobKind::TradingBot,
        JobKind::InvestmentEngine,
    ];

    /// Registry name of this job.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::BountyHunter => "bounty_hunter",
            JobKind::RwaMonitor => "rwa_monitor",
            JobKind::TradingBot => "trading_bot",
            JobKind::InvestmentEngine => "investment_engine",
        }
    }

    /// Parses a registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Message announced when this job is enabled.
    pub fn unlock_message(&self) -> &'static str {
        match self {
            JobKind::BountyHunter => {
                "Bounty hunter is active and keeps running around the clock."
            }
            JobKind::RwaMonitor => {
                "New capability unlocked: RWA monitoring is live. Bounty hunting keeps running, you now earn on 2 fronts."
            }
            JobKind::TradingBot => {
                "New capability unlocked: the trading bot is live. Bounty hunting and RWA monitoring keep running, you now earn on 3 fronts."
            }
            JobKind::InvestmentEngine => {
                "New capability unlocked: the investment engine is live. Bounty hunting, RWA monitoring and trading keep running, you now earn on 4 fronts."
            }
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unlock message for any job name, falling back to a generic template.
pub fn unlock_message(name: &str) -> String {
    match JobKind::from_name(name) {
        Some(kind) => kind.unlock_message().to_string(),
        None => format!("Job {name} enabled."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in JobKind::ALL {
            assert_eq!(JobKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(JobKind::from_name("nope"), None);
    }

    #[test]
    fn unknown_names_get_generic_message() {
        assert_eq!(unlock_message("backup"), "Job backup enabled.");
        assert!(unlock_message("trading_bot").contains("trading bot"));
    }
}
