//! SoundFlows Loader
//!
//! Network-aware lazy prefetch of track metadata with a bounded cache.
//!
//! - **Metadata cache**: capacity-bounded, evicts in insertion order and
//!   releases the media handle of every evicted entry
//! - **Network classification**: `slow-2g` to `4g` mapped to a prefetch count
//! - **Lazy loader**: concurrent per-category probes with per-item timeouts and
//!   idle-time background continuation
//! - **Preload strategies** and a performance report
//!
//! # Example
//!
//! ```rust,no_run
//! use soundflows_core::{Catalog, LoaderConfig, MediaProbe, NoNetworkInfo};
//! use soundflows_loader::{CategoryLoad, LazyLoader, TokioIdleScheduler};
//! use std::sync::Arc;
//!
//! # async fn example(probe: Arc<dyn MediaProbe>) -> soundflows_core::Result<()> {
//! let config = LoaderConfig::default();
//! let loader = LazyLoader::new(
//!     Arc::new(Catalog::builtin()?),
//!     probe,
//!     Arc::new(NoNetworkInfo),
//!     Arc::new(TokioIdleScheduler::new(config.idle_fallback_delay())),
//!     config,
//! )?;
//!
//! if let CategoryLoad::Loaded(report) = loader.load_category("Rain", 0, None).await? {
//!     println!("{} of {} tracks ready", report.loaded_count, report.total_count);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod cache;
pub mod loader;
pub mod network;
pub mod scheduler;
pub mod strategy;

pub use cache::{CacheEntry, CachedMedia, MetadataCache};
pub use loader::{CategoryLoad, LazyLoader, LoadReport};
pub use network::NetworkSpeed;
pub use scheduler::TokioIdleScheduler;
pub use strategy::{PerformanceReport, PreloadStrategy, StrategySettings};
