//! # Job bodies.
//!
//! A job body is the opaque unit of work the engine invokes on a schedule.
//! The engine only needs it to eventually return success or failure.
//!
//! - [`JobBody`]: the trait
//! - [`JobFn`]: async closure adapter (new future per invocation)
//! - [`BlockingFn`]: synchronous closure adapter, run on the blocking pool
//! - [`JobRef`]: shared handle (`Arc<dyn JobBody>`)
//!
//! ## Example
//! ```rust
//! use jobvisor::{JobError, JobFn, JobRef};
//!
//! let body: JobRef = JobFn::arc(|| async {
//!     // fetch, trade, compute...
//!     Ok::<(), JobError>(())
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::JobError;

/// Shared reference to a job body.
pub type JobRef = Arc<dyn JobBody>;

/// One invocation of recurring work.
///
/// Invocations of the same body never overlap. A panic inside `run` is
/// caught by the runner and counted as a failure.
#[async_trait]
pub trait JobBody: Send + Sync + 'static {
    /// Runs the job once.
    async fn run(&self) -> Result<(), JobError>;
}

/// Function-backed async job body.
pub struct JobFn<F> {
    f: F,
}

impl<F, Fut> JobFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the body and returns it as a [`JobRef`].
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> JobBody for JobFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), JobError>> + Send + 'static,
{
    async fn run(&self) -> Result<(), JobError> {
        (self.f)().await
    }
}

/// Function-backed blocking job body.
///
/// Each invocation runs on `tokio::task::spawn_blocking`, so a slow
/// synchronous body never stalls other jobs.
pub struct BlockingFn<F> {
    f: Arc<F>,
}

impl<F> BlockingFn<F>
where
    F: Fn() -> Result<(), JobError> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }

    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F> JobBody for BlockingFn<F>
where
    F: Fn() -> Result<(), JobError> + Send + Sync + 'static,
{
    async fn run(&self) -> Result<(), JobError> {
        let f = Arc::clone(&self.f);
        match tokio::task::spawn_blocking(move || f()).await {
            Ok(res) => res,
            Err(join_err) if join_err.is_panic() => Err(JobError::Panicked {
                info: crate::core::panic_message(join_err.into_panic().as_ref()),
            }),
            Err(join_err) => Err(JobError::fail(join_err.to_string())),
        }
    }
}
