//! Lazy, network-aware prefetch of track metadata
//!
//! A category's first few tracks are probed concurrently when the category is
//! opened. The rest trickles in through best-effort background batches run by
//! an [`IdleScheduler`]. Probed handles live in a shared [`MetadataCache`].

use crate::cache::{CacheEntry, CachedMedia, MetadataCache};
use crate::network::NetworkSpeed;
use crate::strategy::{PerformanceReport, PreloadStrategy};
use chrono::Utc;
use futures_util::future::join_all;
use soundflows_core::{
    Catalog, IdleScheduler, LoaderConfig, MediaProbe, NetworkInfo, Result, SoundflowsError,
    TrackRef,
};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome of [`LazyLoader::load_category`]
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryLoad {
    /// The category was already loaded; this is what the cache holds for it
    Cached(Vec<CachedMedia>),
    /// A fresh slice was probed
    Loaded(LoadReport),
}

/// Result of probing one slice of a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub category: String,
    pub loaded_count: usize,
    pub failed_count: usize,
    /// Number of files in the category
    pub total_count: usize,
    /// File names in the probed slice
    pub files: Vec<String>,
}

struct LoaderState {
    cache: MetadataCache,
    loaded_categories: Vec<String>,
    load_times: HashMap<String, Duration>,
    network_speed: NetworkSpeed,
    loads_in_flight: usize,
    /// Bumped by `cleanup`; loads started in an older epoch are discarded
    epoch: u64,
    prefetch_override: Option<usize>,
    background_batch_size: usize,
}

struct Inner {
    catalog: Arc<Catalog>,
    probe: Arc<dyn MediaProbe>,
    network: Arc<dyn NetworkInfo>,
    scheduler: Arc<dyn IdleScheduler>,
    config: LoaderConfig,
    state: Mutex<LoaderState>,
}

/// Lazy metadata loader
///
/// Cheap to clone; clones share the cache and bookkeeping.
#[derive(Clone)]
pub struct LazyLoader {
    inner: Arc<Inner>,
}

impl LazyLoader {
    /// Create a loader, classifying the network once up front
    pub fn new(
        catalog: Arc<Catalog>,
        probe: Arc<dyn MediaProbe>,
        network: Arc<dyn NetworkInfo>,
        scheduler: Arc<dyn IdleScheduler>,
        config: LoaderConfig,
    ) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.cache_capacity).ok_or_else(|| {
            SoundflowsError::invalid_config("loader.cache_capacity must be at least 1")
        })?;
        if config.background_batch_size == 0 {
            return Err(SoundflowsError::invalid_config(
                "loader.background_batch_size must be at least 1",
            ));
        }

        let network_speed = NetworkSpeed::classify(network.as_ref());
        info!(network_speed = %network_speed, "Lazy loader initialized");

        let state = LoaderState {
            cache: MetadataCache::new(capacity),
            loaded_categories: Vec::new(),
            load_times: HashMap::new(),
            network_speed,
            loads_in_flight: 0,
            epoch: 0,
            prefetch_override: None,
            background_batch_size: config.background_batch_size,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                catalog,
                probe,
                network,
                scheduler,
                config,
                state: Mutex::new(state),
            }),
        })
    }

    pub fn network_speed(&self) -> NetworkSpeed {
        self.inner.state().network_speed
    }

    /// Re-read the network signal after a connection change
    pub fn on_connection_change(&self) -> NetworkSpeed {
        let speed = NetworkSpeed::classify(self.inner.network.as_ref());
        let mut state = self.inner.state();
        if state.network_speed != speed {
            info!(from = %state.network_speed, to = %speed, "Network speed changed");
            state.network_speed = speed;
        }
        speed
    }

    /// Initial slice size used when `load_category` gets no explicit count
    pub fn prefetch_count(&self) -> usize {
        let state = self.inner.state();
        state
            .prefetch_override
            .unwrap_or_else(|| state.network_speed.prefetch_count())
    }

    /// Probe `count` files of `category` starting at `start`
    ///
    /// `count` defaults to [`prefetch_count`](Self::prefetch_count). Failed or
    /// timed-out items are counted, not returned as errors; only an unknown
    /// category fails the call. A category is loaded at most once until
    /// [`cleanup`](Self::cleanup). Remaining files are handed to the idle
    /// scheduler.
    pub async fn load_category(
        &self,
        category: &str,
        start: usize,
        count: Option<usize>,
    ) -> Result<CategoryLoad> {
        {
            let state = self.inner.state();
            if state.loaded_categories.iter().any(|c| c == category) {
                debug!(category = %category, "Category already loaded");
                return Ok(CategoryLoad::Cached(state.cache.media_for(category)));
            }
        }

        let files = match self.inner.catalog.files(category) {
            Ok(files) => files.to_vec(),
            Err(e) => {
                error!(category = %category, error = %e, "Cannot load category");
                return Err(e);
            }
        };

        let count = count.unwrap_or_else(|| self.prefetch_count());
        let start = start.min(files.len());
        let end = start.saturating_add(count).min(files.len());
        let slice = files[start..end].to_vec();

        info!(
            category = %category,
            slice = slice.len(),
            total = files.len(),
            "Loading category"
        );

        let _loading = LoadingGuard::new(&self.inner);
        let epoch = self.inner.state().epoch;
        let started = Instant::now();

        let results = join_all(
            slice
                .iter()
                .map(|file_name| self.inner.preload(category, file_name)),
        )
        .await;

        let mut loaded_count = 0;
        let mut failed_count = 0;
        for (file_name, result) in slice.iter().zip(&results) {
            match result {
                Ok(_) => loaded_count += 1,
                Err(e) => {
                    failed_count += 1;
                    warn!(
                        category = %category,
                        file = %file_name,
                        error = %e,
                        "Metadata load failed"
                    );
                }
            }
        }
        if failed_count > 0 {
            warn!(category = %category, failed = failed_count, "Some tracks failed to load");
        }

        let current = {
            let mut state = self.inner.state();
            let current = state.epoch == epoch;
            if current {
                if !state.loaded_categories.iter().any(|c| c == category) {
                    state.loaded_categories.push(category.to_string());
                }
                state
                    .load_times
                    .insert(category.to_string(), started.elapsed());
            } else {
                debug!(category = %category, "Loader cleaned up during load, result discarded");
            }
            current
        };

        if current && end < files.len() {
            self.schedule_background(category, end, epoch);
        }

        info!(
            category = %category,
            loaded = loaded_count,
            failed = failed_count,
            "Category loaded"
        );

        Ok(CategoryLoad::Loaded(LoadReport {
            category: category.to_string(),
            loaded_count,
            failed_count,
            total_count: files.len(),
            files: slice,
        }))
    }

    /// Probe a single track through the cache
    pub async fn fetch_metadata(&self, category: &str, file_name: &str) -> Result<CachedMedia> {
        self.inner.catalog.category(category)?;
        self.inner.preload(category, file_name).await
    }

    /// Everything the cache currently holds for `category`, oldest first
    pub fn cached_media(&self, category: &str) -> Vec<CachedMedia> {
        self.inner.state().cache.media_for(category)
    }

    pub fn is_category_loaded(&self, category: &str) -> bool {
        self.inner
            .state()
            .loaded_categories
            .iter()
            .any(|c| c == category)
    }

    pub fn cache_len(&self) -> usize {
        self.inner.state().cache.len()
    }

    pub fn cache_capacity(&self) -> usize {
        self.inner.state().cache.capacity()
    }

    pub fn performance_report(&self) -> PerformanceReport {
        let state = self.inner.state();
        let avg_load_time_ms = if state.load_times.is_empty() {
            0.0
        } else {
            let total: Duration = state.load_times.values().sum();
            total.as_secs_f64() * 1000.0 / state.load_times.len() as f64
        };

        PerformanceReport {
            cache_hit_rate: state.cache.hit_rate(),
            loaded_categories: state.loaded_categories.clone(),
            cache_size: state.cache.len(),
            max_cache_size: state.cache.capacity(),
            network_speed: state.network_speed,
            avg_load_time_ms,
        }
    }

    /// Switch cache size and prefetch aggressiveness
    ///
    /// Shrinking the cache evicts the oldest entries.
    pub fn update_preload_strategy(&self, strategy: PreloadStrategy) {
        let settings = strategy.settings();
        let mut state = self.inner.state();

        if let Some(capacity) = NonZeroUsize::new(settings.cache_capacity) {
            let evicted = state.cache.resize(capacity);
            if evicted > 0 {
                debug!(evicted, "Cache shrunk");
            }
        }
        state.prefetch_override = Some(settings.prefetch_count);
        state.background_batch_size = settings.background_batch_size;

        info!(
            strategy = ?strategy,
            cache = settings.cache_capacity,
            prefetch = settings.prefetch_count,
            batch = settings.background_batch_size,
            "Preload strategy updated"
        );
    }

    /// Release every cached handle and forget loaded categories
    ///
    /// Loads still in flight are released as soon as they settle.
    pub fn cleanup(&self) {
        let mut state = self.inner.state();
        state.cache.clear();
        state.loaded_categories.clear();
        state.epoch += 1;
        info!("Lazy loader cache cleaned up");
    }

    /// Queue the rest of a category; the job is dropped if `cleanup` runs
    /// before it starts
    fn schedule_background(&self, category: &str, start: usize, epoch: u64) {
        let inner = Arc::clone(&self.inner);
        let category = category.to_string();
        debug!(category = %category, start, "Scheduling background preload");
        self.inner.scheduler.schedule(Box::pin(async move {
            inner.background_preload(&category, start, epoch).await;
        }));
    }
}

impl std::fmt::Debug for LazyLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("LazyLoader")
            .field("cache", &state.cache)
            .field("loaded_categories", &state.loaded_categories)
            .field("network_speed", &state.network_speed)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn preload(&self, category: &str, file_name: &str) -> Result<CachedMedia> {
        let track = TrackRef::new(category, file_name);
        let key = track.cache_key();

        let epoch = {
            let mut state = self.state();
            if let Some(entry) = state.cache.get(&key) {
                debug!(key = %key, "Cache hit");
                return Ok(entry.media().clone());
            }
            state.epoch
        };

        let url = self.catalog.audio_url(category, file_name)?;
        let timeout = self.config.item_timeout();
        let mut probed = match tokio::time::timeout(timeout, self.probe.load_metadata(&url)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(SoundflowsError::LoadTimeout {
                    file_name: file_name.to_string(),
                    after: timeout,
                })
            }
        };

        let mut state = self.state();
        if state.epoch != epoch {
            probed.handle.release();
            return Err(SoundflowsError::load(format!(
                "{key} settled after cleanup and was discarded"
            )));
        }

        let media = CachedMedia {
            track,
            duration: probed.duration,
            loaded_at: Utc::now(),
        };
        state
            .cache
            .put(key, CacheEntry::new(media.clone(), probed.handle));
        Ok(media)
    }

    async fn background_preload(&self, category: &str, start: usize, epoch: u64) {
        let batch_size = {
            let state = self.state();
            if state.epoch != epoch {
                debug!(category = %category, "Loader cleaned up, background preload abandoned");
                return;
            }
            if state.loads_in_flight > 0 {
                debug!(category = %category, "Foreground load running, background skipped");
                return;
            }
            state.background_batch_size
        };

        let Ok(files) = self.catalog.files(category) else {
            return;
        };
        let remaining = files.get(start..).unwrap_or_default();
        let batch = batch_size.min(remaining.len());
        debug!(category = %category, batch, "Background preload");

        for file_name in &remaining[..batch] {
            {
                let state = self.state();
                if state.epoch != epoch || state.cache.is_full() {
                    break;
                }
            }

            if let Err(e) = self.preload(category, file_name).await {
                warn!(
                    category = %category,
                    file = %file_name,
                    error = %e,
                    "Background preload failed"
                );
            }

            tokio::time::sleep(self.config.background_yield()).await;
        }
    }
}

/// Marks a foreground load as running for its lifetime
struct LoadingGuard<'a> {
    inner: &'a Inner,
}

impl<'a> LoadingGuard<'a> {
    fn new(inner: &'a Inner) -> Self {
        inner.state().loads_in_flight += 1;
        Self { inner }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.state();
        state.loads_in_flight = state.loads_in_flight.saturating_sub(1);
    }
}
