//! Preload strategies and the performance report

use crate::network::NetworkSpeed;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Coarse preset for cache size and prefetch aggressiveness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreloadStrategy {
    Low,
    #[default]
    Medium,
    High,
}

/// Concrete limits applied by a [`PreloadStrategy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategySettings {
    pub cache_capacity: usize,
    pub prefetch_count: usize,
    pub background_batch_size: usize,
}

impl PreloadStrategy {
    pub fn settings(self) -> StrategySettings {
        match self {
            Self::Low => StrategySettings {
                cache_capacity: 5,
                prefetch_count: 2,
                background_batch_size: 1,
            },
            Self::Medium => StrategySettings {
                cache_capacity: 10,
                prefetch_count: 4,
                background_batch_size: 3,
            },
            Self::High => StrategySettings {
                cache_capacity: 20,
                prefetch_count: 8,
                background_batch_size: 5,
            },
        }
    }
}

impl FromStr for PreloadStrategy {
    type Err = std::convert::Infallible;

    /// Unrecognised names fall back to `Medium`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        })
    }
}

/// Snapshot of loader effectiveness
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    /// Percentage of cache lookups that hit
    pub cache_hit_rate: f64,
    /// Categories whose initial slice has been loaded, in load order
    pub loaded_categories: Vec<String>,
    pub cache_size: usize,
    pub max_cache_size: usize,
    pub network_speed: NetworkSpeed,
    /// Mean duration of initial category loads, in milliseconds
    pub avg_load_time_ms: f64,
}
