use crate::traits::{ConnectionInfo, NetworkInfo};
use std::sync::{Mutex, PoisonError};

/// Network signal that reports whatever the test sets
#[derive(Debug, Default)]
pub struct StaticNetwork {
    connection: Mutex<Option<ConnectionInfo>>,
}

impl StaticNetwork {
    /// Report `effective_type` (e.g. `"3g"`)
    pub fn new(effective_type: &str) -> Self {
        let network = Self::default();
        network.set(effective_type);
        network
    }

    /// No network information signal at all
    pub fn absent() -> Self {
        Self::default()
    }

    /// Simulate a connection change
    pub fn set(&self, effective_type: &str) {
        *self.connection.lock().unwrap_or_else(PoisonError::into_inner) = Some(ConnectionInfo {
            effective_type: effective_type.to_string(),
            save_data: false,
        });
    }
}

impl NetworkInfo for StaticNetwork {
    fn connection(&self) -> Option<ConnectionInfo> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
