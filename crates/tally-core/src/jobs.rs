//! Background job abstraction
//!
//! Long-running analytics (classifier retraining, a forecast sweep over a
//! whole month, clustering) must not block the thread that requested them.
//! `spawn` runs a blocking closure on the tokio blocking pool and hands back
//! a `JobHandle` the caller can await for the result. A panicking job
//! surfaces as an `Error::Job` value instead of taking the process down.

use tracing::{debug, error};

use crate::error::{Error, Result};

/// Handle to a running background job; await `join` for the outcome
pub struct JobHandle<T> {
    name: String,
    inner: tokio::task::JoinHandle<Result<T>>,
}

impl<T> JobHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the job to finish and return its result
    pub async fn join(self) -> Result<T> {
        match self.inner.await {
            Ok(result) => result,
            Err(e) => {
                error!(job = %self.name, error = %e, "Background job died");
                Err(Error::Job(format!("job '{}' failed: {}", self.name, e)))
            }
        }
    }

    /// Abort the job. No cleanup contract beyond "let it finish or fail":
    /// jobs only publish results on full success.
    pub fn abort(&self) {
        self.inner.abort();
    }
}

/// Run a blocking closure off the calling thread.
///
/// Must be called from within a tokio runtime.
pub fn spawn<T, F>(name: impl Into<String>, f: F) -> JobHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let name = name.into();
    debug!(job = %name, "Spawning background job");
    JobHandle {
        name: name.clone(),
        inner: tokio::task::spawn_blocking(f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn job_returns_its_result() {
        let handle = spawn("sum", || Ok(2 + 2));
        assert_eq!(handle.join().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn job_errors_surface_to_the_caller() {
        let handle: JobHandle<()> =
            spawn("fail", || Err(Error::InsufficientData("too small".into())));
        assert!(matches!(
            handle.join().await,
            Err(Error::InsufficientData(_))
        ));
    }

    #[tokio::test]
    async fn panicking_job_becomes_an_error_not_a_crash() {
        let handle: JobHandle<()> = spawn("boom", || panic!("boom"));
        assert!(matches!(handle.join().await, Err(Error::Job(_))));
    }
}
