use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    config::EngineConfig,
    core::{
        resources::{ResourceProbe, SysinfoProbe},
        runner::JobRunner,
        supervisor::Supervisor,
    },
    error::EngineError,
    events::Bus,
    jobs::{Catalog, JobRef},
    subscribers::Subscribe,
};

/// Builder for constructing a [`Supervisor`] from a catalog and job bodies.
///
/// Only catalog jobs can be registered, and the registry is frozen by
/// [`build`](Self::build). Catalog jobs without a registered body are not run.
pub struct SupervisorBuilder {
    cfg: EngineConfig,
    catalog: Catalog,
    bodies: BTreeMap<String, JobRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    probe: Option<Arc<dyn ResourceProbe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration and catalog.
    pub fn new(cfg: EngineConfig, catalog: Catalog) -> Self {
        Self {
            cfg,
            catalog,
            bodies: BTreeMap::new(),
            subscribers: Vec::new(),
            probe: None,
        }
    }

    /// Binds a body to a catalog job. Re-registering a name replaces its body.
    ///
    /// Fails with [`EngineError::UnknownJob`] if the catalog has no such job.
    pub fn register(mut self, name: &str, body: JobRef) -> Result<Self, EngineError> {
        if !self.catalog.contains(name) {
            return Err(EngineError::UnknownJob {
                name: name.to_string(),
            });
        }
        if self.bodies.insert(name.to_string(), body).is_some() {
            tracing::debug!(target: "jobvisor", job = name, "job body replaced");
        }
        Ok(self)
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues while the engine is started.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the `sysinfo` process probe.
    pub fn with_probe(mut self, probe: Arc<dyn ResourceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Builds the supervisor. The set of registered jobs is fixed from here on.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let probe = self
            .probe
            .unwrap_or_else(|| Arc::new(SysinfoProbe::new()) as Arc<dyn ResourceProbe>);

        let mut runners = BTreeMap::new();
        for (name, body) in self.bodies {
            if let Some(spec) = self.catalog.get(&name) {
                let runner = JobRunner::new(
                    Arc::new(spec.clone()),
                    body,
                    bus.clone(),
                    Arc::clone(&probe),
                );
                runners.insert(name, Arc::new(runner));
            }
        }

        Arc::new(Supervisor::new_internal(
            self.cfg,
            self.catalog,
            bus,
            runners,
            self.subscribers,
            probe,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JobError;
    use crate::jobs::JobFn;

    #[test]
    fn unknown_job_cannot_be_registered() {
        let res = SupervisorBuilder::new(EngineConfig::default(), Catalog::default())
            .register("ghost", JobFn::arc(|| async { Ok::<(), JobError>(()) }));
        assert!(matches!(res, Err(EngineError::UnknownJob { name }) if name == "ghost"));
    }

    #[tokio::test]
    async fn reregistering_replaces_the_body() {
        let sup = SupervisorBuilder::new(EngineConfig::default(), Catalog::default())
            .register("trading_bot", JobFn::arc(|| async { Err::<(), JobError>(JobError::fail("old")) }))
            .unwrap()
            .register("trading_bot", JobFn::arc(|| async { Ok::<(), JobError>(()) }))
            .unwrap()
            .build();

        assert_eq!(sup.job_names().collect::<Vec<_>>(), vec!["trading_bot"]);
        let runner = sup.runner("trading_bot").unwrap();
        runner.enable();
        assert!(runner.execute().await);
    }
}
