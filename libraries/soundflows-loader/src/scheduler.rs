use futures_util::future::BoxFuture;
use soundflows_core::IdleScheduler;
use std::time::Duration;
use tracing::warn;

/// Timer-based idle scheduler
///
/// Hosts without an idle callback run background work on the tokio runtime
/// after a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct TokioIdleScheduler {
    delay: Duration,
}

impl TokioIdleScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl IdleScheduler for TokioIdleScheduler {
    fn schedule(&self, job: BoxFuture<'static, ()>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime available, dropping background job");
            return;
        };

        let delay = self.delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            job.await;
        });
    }
}
