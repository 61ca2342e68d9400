use crate::error::{Result, SoundflowsError};
use crate::traits::{MediaHandle, MediaProbe, ProbedMedia};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Scripted result for URLs containing a pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeOutcome {
    /// Settle immediately with this duration
    Ready(Duration),
    /// Settle after `delay` with `duration`
    Delayed { delay: Duration, duration: Duration },
    /// Fail immediately
    Fail,
    /// Never settle
    Hang,
}

#[derive(Default)]
struct ProbeLog {
    requested: Vec<String>,
    handles: Vec<(String, Arc<AtomicBool>)>,
}

/// Media probe with scripted outcomes that records every request
pub struct FakeProbe {
    default: ProbeOutcome,
    rules: Vec<(String, ProbeOutcome)>,
    log: Mutex<ProbeLog>,
}

impl FakeProbe {
    /// Every load succeeds with a 60 second duration
    pub fn new() -> Self {
        Self {
            default: ProbeOutcome::Ready(Duration::from_secs(60)),
            rules: Vec::new(),
            log: Mutex::new(ProbeLog::default()),
        }
    }

    /// URLs containing `pattern` settle with `outcome`; first match wins
    pub fn with_outcome(mut self, pattern: impl Into<String>, outcome: ProbeOutcome) -> Self {
        self.rules.push((pattern.into(), outcome));
        self
    }

    fn log(&self) -> MutexGuard<'_, ProbeLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total number of loads issued
    pub fn calls(&self) -> usize {
        self.log().requested.len()
    }

    /// Loads issued for URLs containing `pattern`
    pub fn calls_for(&self, pattern: &str) -> usize {
        self.log()
            .requested
            .iter()
            .filter(|url| url.contains(pattern))
            .count()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.log().requested.clone()
    }

    /// Handles that have been released, by URL
    pub fn released_urls(&self) -> Vec<String> {
        self.log()
            .handles
            .iter()
            .filter(|(_, released)| released.load(Ordering::SeqCst))
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Handles handed out and not yet released
    pub fn live_handles(&self) -> usize {
        self.log()
            .handles
            .iter()
            .filter(|(_, released)| !released.load(Ordering::SeqCst))
            .count()
    }

    fn outcome_for(&self, url: &str) -> ProbeOutcome {
        self.rules
            .iter()
            .find(|(pattern, _)| url.contains(pattern.as_str()))
            .map_or(self.default, |(_, outcome)| *outcome)
    }

    fn handle(&self, url: &str, duration: Duration) -> ProbedMedia {
        let released = Arc::new(AtomicBool::new(false));
        self.log()
            .handles
            .push((url.to_string(), Arc::clone(&released)));
        ProbedMedia {
            handle: Box::new(FakeHandle { released }),
            duration,
        }
    }
}

impl Default for FakeProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn load_metadata(&self, url: &str) -> Result<ProbedMedia> {
        self.log().requested.push(url.to_string());

        match self.outcome_for(url) {
            ProbeOutcome::Ready(duration) => Ok(self.handle(url, duration)),
            ProbeOutcome::Delayed { delay, duration } => {
                tokio::time::sleep(delay).await;
                Ok(self.handle(url, duration))
            }
            ProbeOutcome::Fail => Err(SoundflowsError::load(format!("failed to load {url}"))),
            ProbeOutcome::Hang => std::future::pending().await,
        }
    }
}

struct FakeHandle {
    released: Arc<AtomicBool>,
}

impl MediaHandle for FakeHandle {
    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
