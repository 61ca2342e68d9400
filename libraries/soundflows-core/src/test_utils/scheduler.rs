use crate::traits::IdleScheduler;
use futures_util::future::BoxFuture;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Scheduler that holds jobs until the test runs them
#[derive(Default)]
pub struct ManualScheduler {
    jobs: Mutex<Vec<BoxFuture<'static, ()>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn jobs(&self) -> MutexGuard<'_, Vec<BoxFuture<'static, ()>>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Jobs scheduled but not yet run
    pub fn pending(&self) -> usize {
        self.jobs().len()
    }

    /// Run queued jobs one after another, including jobs they schedule
    pub async fn run_all(&self) {
        loop {
            let next = {
                let mut jobs = self.jobs();
                if jobs.is_empty() {
                    None
                } else {
                    Some(jobs.remove(0))
                }
            };
            match next {
                Some(job) => job.await,
                None => break,
            }
        }
    }

    /// Drop queued jobs without running them
    pub fn discard(&self) {
        self.jobs().clear();
    }
}

impl IdleScheduler for ManualScheduler {
    fn schedule(&self, job: BoxFuture<'static, ()>) {
        self.jobs().push(job);
    }
}
