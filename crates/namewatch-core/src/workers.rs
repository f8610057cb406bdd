//! Bounded worker pool for command execution
//!
//! Commands run off the input loop on pool tasks. At most `max_concurrent`
//! run at once; the rest wait for a permit. Shutdown refuses new work, gives
//! running work a grace period, then cancels whatever is left.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Executor for command futures
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    tasks: Mutex<JoinSet<()>>,
    cancel: CancellationToken,
    closed: AtomicBool,
}

impl WorkerPool {
    /// Create a pool running at most `max_concurrent` jobs at once
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tasks: Mutex::new(JoinSet::new()),
            cancel: CancellationToken::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Queue a job
    ///
    /// The job is dropped without running to completion if the pool is
    /// cancelled first.
    pub async fn submit<F>(&self, job: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shut_down() {
            return Err(Error::shutdown("Worker pool is shutting down"));
        }

        let mut tasks = self.tasks.lock().await;
        if self.is_shut_down() {
            return Err(Error::shutdown("Worker pool is shutting down"));
        }

        while let Some(finished) = tasks.try_join_next() {
            log_join(finished);
        }

        let permits = Arc::clone(&self.permits);
        let cancel = self.cancel.clone();
        tasks.spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                permit = permits.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => debug!("Command cancelled by shutdown"),
                _ = job => {}
            }
        });

        Ok(())
    }

    /// Number of jobs queued or running
    pub async fn pending(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Whether shutdown has begun
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Token cancelled when the pool gives up on outstanding work
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop accepting work, wait up to `grace` for outstanding jobs, cancel the rest
    pub async fn shutdown(&self, grace: Duration) {
        self.closed.store(true, Ordering::Release);
        let mut tasks = self.tasks.lock().await;

        let drained = tokio::time::timeout(grace, async {
            while let Some(finished) = tasks.join_next().await {
                log_join(finished);
            }
        })
        .await;

        if drained.is_err() {
            debug!("Grace period elapsed, cancelling {} commands", tasks.len());
        }

        self.cancel.cancel();
        self.permits.close();
        while let Some(finished) = tasks.join_next().await {
            log_join(finished);
        }
    }
}

fn log_join(result: std::result::Result<(), JoinError>) {
    if let Err(e) = result
        && e.is_panic()
    {
        warn!("Command task panicked: {}", e);
    }
}
