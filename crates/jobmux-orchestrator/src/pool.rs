use jobmux_core::{JobmuxError, JobmuxResult};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::debug;

/// Worker count for a batch: `min(jobs, parallelism / 2 + 1)`, at least 1.
///
/// Compiler runs are CPU and memory heavy, so only about half the cores are
/// used. A batch smaller than that gets one worker per job.
pub fn pool_size(job_count: usize, parallelism: usize) -> usize {
    job_count.min(parallelism / 2 + 1).max(1)
}

/// Parallelism reported by the OS, or 1 if unknown.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Fixed-size pool running blocking jobs on tokio's blocking threads.
///
/// At most `size` jobs run at once. Workers are granted in submission order.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    size: usize,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    /// Creates a pool with `size` workers (at least 1).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    /// Creates a pool sized for `job_count` jobs on this machine.
    pub fn for_jobs(job_count: usize) -> Self {
        Self::new(pool_size(job_count, available_parallelism()))
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Submits a blocking job, waiting for a free worker first.
    pub async fn submit<F, T>(&self, label: impl Into<String>, job: F) -> JobHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let label = label.into();
        let permit = Arc::clone(&self.permits).acquire_owned().await;
        debug!(job = %label, "Submitting job");

        let inner = tokio::spawn(async move {
            let _permit = permit.map_err(|e| JobmuxError::Pool(e.to_string()))?;
            tokio::task::spawn_blocking(job)
                .await
                .map_err(|e| JobmuxError::Pool(describe_join_error(e)))
        });

        JobHandle { label, inner }
    }
}

/// Pending outcome of a submitted job.
#[derive(Debug)]
pub struct JobHandle<T> {
    label: String,
    inner: JoinHandle<JobmuxResult<T>>,
}

impl<T> JobHandle<T> {
    /// The label given at submission.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Waits for the job. A panicked or cancelled job yields
    /// [`JobmuxError::Pool`].
    pub async fn join(self) -> JobmuxResult<T> {
        match self.inner.await {
            Ok(result) => result,
            Err(e) => Err(JobmuxError::Pool(describe_join_error(e))),
        }
    }
}

fn describe_join_error(e: JoinError) -> String {
    if e.is_cancelled() {
        return "task was cancelled".to_string();
    }
    match e.try_into_panic() {
        Ok(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            format!("task panicked: {message}")
        }
        Err(e) => e.to_string(),
    }
}
