//! Lazy loader behaviour against the fake platform

use soundflows_core::test_utils::{FakeProbe, ManualScheduler, ProbeOutcome, StaticNetwork};
use soundflows_core::{Catalog, Category, LoaderConfig, SoundflowsError};
use soundflows_loader::{CategoryLoad, LazyLoader, LoadReport, NetworkSpeed, PreloadStrategy};
use std::sync::Arc;
use std::time::Duration;

// ===== Helpers =====

struct Harness {
    loader: LazyLoader,
    probe: Arc<FakeProbe>,
    network: Arc<StaticNetwork>,
    scheduler: Arc<ManualScheduler>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn catalog(rain_files: usize) -> Catalog {
    Catalog::new("https://cdn.test/")
        .with_category(
            "Rain",
            Category::with_files((0..rain_files).map(|i| format!("rain-{i:02}.mp3")))
                .folder("rain-sounds"),
        )
        .with_category("Fire", Category::with_files(["fire-a.mp3", "fire-b.mp3"]))
}

fn harness(
    probe: FakeProbe,
    network: StaticNetwork,
    catalog: Catalog,
    config: LoaderConfig,
) -> Harness {
    init_tracing();
    let probe = Arc::new(probe);
    let network = Arc::new(network);
    let scheduler = Arc::new(ManualScheduler::new());
    let loader = LazyLoader::new(
        Arc::new(catalog),
        probe.clone(),
        network.clone(),
        scheduler.clone(),
        config,
    )
    .unwrap();

    Harness {
        loader,
        probe,
        network,
        scheduler,
    }
}

fn default_harness(speed: &str, rain_files: usize) -> Harness {
    harness(
        FakeProbe::new(),
        StaticNetwork::new(speed),
        catalog(rain_files),
        LoaderConfig::default(),
    )
}

fn expect_loaded(load: CategoryLoad) -> LoadReport {
    match load {
        CategoryLoad::Loaded(report) => report,
        CategoryLoad::Cached(media) => panic!("expected a fresh load, got {} cached", media.len()),
    }
}

// ===== Initial Slice =====

#[tokio::test]
async fn slow_2g_requests_exactly_one_file() {
    let h = default_harness("slow-2g", 14);

    let report = expect_loaded(h.loader.load_category("Rain", 0, None).await.unwrap());

    assert_eq!(report.files, vec!["rain-00.mp3"]);
    assert_eq!(report.loaded_count, 1);
    assert_eq!(report.total_count, 14);
    assert_eq!(h.probe.calls(), 1);
}

#[tokio::test]
async fn prefetch_count_follows_network_class() {
    for (speed, expected) in [("2g", 2), ("3g", 4), ("4g", 8)] {
        let h = default_harness(speed, 14);
        let report = expect_loaded(h.loader.load_category("Rain", 0, None).await.unwrap());
        assert_eq!(report.files.len(), expected, "speed {speed}");
        assert_eq!(h.probe.calls(), expected);
    }
}

#[tokio::test]
async fn missing_network_signal_prefetches_three() {
    let h = harness(
        FakeProbe::new(),
        StaticNetwork::absent(),
        catalog(14),
        LoaderConfig::default(),
    );

    assert_eq!(h.loader.network_speed(), NetworkSpeed::Unknown);
    let report = expect_loaded(h.loader.load_category("Rain", 0, None).await.unwrap());
    assert_eq!(report.files.len(), 3);
}

#[tokio::test]
async fn explicit_slice_is_respected() {
    let h = default_harness("4g", 14);

    let report = expect_loaded(h.loader.load_category("Rain", 12, Some(5)).await.unwrap());

    assert_eq!(report.files, vec!["rain-12.mp3", "rain-13.mp3"]);
    assert_eq!(h.scheduler.pending(), 0);
}

#[tokio::test]
async fn urls_use_category_folder() {
    let h = default_harness("slow-2g", 3);

    h.loader.load_category("Rain", 0, None).await.unwrap();

    assert_eq!(
        h.probe.requested_urls(),
        vec!["https://cdn.test/rain-sounds/rain-00.mp3"]
    );
}

// ===== Idempotence and Errors =====

#[tokio::test]
async fn second_load_returns_cached_media_without_probing() {
    let h = default_harness("4g", 6);

    let first = expect_loaded(h.loader.load_category("Rain", 0, None).await.unwrap());
    assert_eq!(first.loaded_count, 6);

    let second = h.loader.load_category("Rain", 0, None).await.unwrap();
    match second {
        CategoryLoad::Cached(media) => assert_eq!(media.len(), 6),
        CategoryLoad::Loaded(_) => panic!("category reloaded"),
    }
    assert_eq!(h.probe.calls(), 6);
}

#[tokio::test]
async fn unknown_category_is_an_error() {
    let h = default_harness("4g", 6);

    let result = h.loader.load_category("Thunder", 0, None).await;

    assert!(matches!(result, Err(SoundflowsError::UnknownCategory(key)) if key == "Thunder"));
    assert_eq!(h.probe.calls(), 0);
    assert!(!h.loader.is_category_loaded("Thunder"));
}

#[tokio::test(start_paused = true)]
async fn item_failures_and_timeouts_do_not_abort_siblings() {
    let probe = FakeProbe::new()
        .with_outcome("rain-01", ProbeOutcome::Hang)
        .with_outcome("rain-02", ProbeOutcome::Fail);
    let h = harness(probe, StaticNetwork::new("3g"), catalog(4), LoaderConfig::default());

    let report = expect_loaded(h.loader.load_category("Rain", 0, None).await.unwrap());

    assert_eq!(report.loaded_count, 2);
    assert_eq!(report.failed_count, 2);
    assert_eq!(h.loader.cache_len(), 2);
    assert!(h.loader.is_category_loaded("Rain"));
}

#[tokio::test(start_paused = true)]
async fn timeout_is_configurable() {
    let slow = || {
        FakeProbe::new().with_outcome(
            "rain-00",
            ProbeOutcome::Delayed {
                delay: Duration::from_secs(11),
                duration: Duration::from_secs(90),
            },
        )
    };

    let h = harness(slow(), StaticNetwork::new("slow-2g"), catalog(1), LoaderConfig::default());
    let result = h.loader.fetch_metadata("Rain", "rain-00.mp3").await;
    assert!(matches!(
        result,
        Err(SoundflowsError::LoadTimeout { ref file_name, after })
            if file_name == "rain-00.mp3" && after == Duration::from_secs(10)
    ));
    assert_eq!(h.loader.cache_len(), 0);

    let config = LoaderConfig {
        item_timeout_ms: 20_000,
        ..LoaderConfig::default()
    };
    let patient = harness(slow(), StaticNetwork::new("slow-2g"), catalog(1), config);
    let media = patient.loader.fetch_metadata("Rain", "rain-00.mp3").await.unwrap();
    assert_eq!(media.duration, Duration::from_secs(90));
    assert_eq!(patient.loader.cached_media("Rain").len(), 1);
}

#[tokio::test]
async fn fetch_metadata_hits_cache() {
    let h = default_harness("slow-2g", 3);
    h.loader.load_category("Rain", 0, None).await.unwrap();

    let media = h.loader.fetch_metadata("Rain", "rain-00.mp3").await.unwrap();

    assert_eq!(media.track.file_name(), "rain-00.mp3");
    assert_eq!(h.probe.calls(), 1);
    assert!(matches!(
        h.loader.fetch_metadata("Nope", "x.mp3").await,
        Err(SoundflowsError::UnknownCategory(_))
    ));
}

// ===== Background Continuation =====

#[tokio::test(start_paused = true)]
async fn background_continuation_loads_one_batch() {
    let h = default_harness("slow-2g", 10);

    h.loader.load_category("Rain", 0, None).await.unwrap();
    assert_eq!(h.scheduler.pending(), 1);

    h.scheduler.run_all().await;

    assert_eq!(h.probe.calls(), 4);
    assert_eq!(h.loader.cache_len(), 4);
    for file in ["rain-01", "rain-02", "rain-03"] {
        assert_eq!(h.probe.calls_for(file), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn background_stops_when_cache_is_full() {
    let config = LoaderConfig {
        cache_capacity: 2,
        ..LoaderConfig::default()
    };
    let h = harness(FakeProbe::new(), StaticNetwork::new("4g"), catalog(12), config);

    h.loader.load_category("Rain", 0, None).await.unwrap();
    assert_eq!(h.probe.calls(), 8);
    assert_eq!(h.loader.cache_len(), 2);
    assert_eq!(h.probe.live_handles(), 2);

    h.scheduler.run_all().await;

    assert_eq!(h.probe.calls(), 8);
}

#[tokio::test(start_paused = true)]
async fn background_uses_strategy_batch_size() {
    let h = default_harness("slow-2g", 10);
    h.loader.update_preload_strategy(PreloadStrategy::Low);

    h.loader.load_category("Rain", 0, Some(1)).await.unwrap();
    h.scheduler.run_all().await;

    assert_eq!(h.probe.calls(), 2);
}

// ===== Network and Strategy =====

#[tokio::test]
async fn connection_change_reclassifies() {
    let h = default_harness("2g", 14);
    assert_eq!(h.loader.prefetch_count(), 2);

    h.network.set("4g");
    assert_eq!(h.loader.on_connection_change(), NetworkSpeed::FourG);
    assert_eq!(h.loader.prefetch_count(), 8);
}

#[tokio::test]
async fn low_strategy_shrinks_cache_and_releases_evicted() {
    let config = LoaderConfig {
        cache_capacity: 20,
        ..LoaderConfig::default()
    };
    let h = harness(FakeProbe::new(), StaticNetwork::new("4g"), catalog(8), config);
    h.loader.load_category("Rain", 0, None).await.unwrap();
    assert_eq!(h.loader.cache_len(), 8);

    h.loader.update_preload_strategy(PreloadStrategy::Low);

    assert_eq!(h.loader.cache_capacity(), 5);
    assert_eq!(h.loader.cache_len(), 5);
    assert_eq!(h.probe.live_handles(), 5);
    assert_eq!(h.loader.prefetch_count(), 2);

    let kept: Vec<String> = h
        .loader
        .cached_media("Rain")
        .into_iter()
        .map(|media| media.track.file_name().to_string())
        .collect();
    assert_eq!(kept.first().map(String::as_str), Some("rain-03.mp3"));
}

#[tokio::test]
async fn performance_report_tracks_hits() {
    let h = default_harness("3g", 4);
    h.loader.load_category("Rain", 0, None).await.unwrap();
    h.loader.fetch_metadata("Rain", "rain-00.mp3").await.unwrap();

    let report = h.loader.performance_report();

    assert!((report.cache_hit_rate - 20.0).abs() < 1e-9);
    assert_eq!(report.loaded_categories, vec!["Rain"]);
    assert_eq!(report.cache_size, 4);
    assert_eq!(report.max_cache_size, 10);
    assert_eq!(report.network_speed, NetworkSpeed::ThreeG);
    assert!(report.avg_load_time_ms >= 0.0);
}

// ===== Cleanup =====

#[tokio::test]
async fn cleanup_releases_handles_and_allows_reload() {
    let h = default_harness("4g", 6);
    h.loader.load_category("Rain", 0, None).await.unwrap();
    assert_eq!(h.probe.live_handles(), 6);

    h.loader.cleanup();

    assert_eq!(h.probe.live_handles(), 0);
    assert_eq!(h.loader.cache_len(), 0);
    assert!(!h.loader.is_category_loaded("Rain"));

    expect_loaded(h.loader.load_category("Rain", 0, None).await.unwrap());
    assert_eq!(h.probe.calls(), 12);
}

#[tokio::test(start_paused = true)]
async fn loads_settling_after_cleanup_are_discarded() {
    let probe = FakeProbe::new().with_outcome(
        "fire",
        ProbeOutcome::Delayed {
            delay: Duration::from_secs(5),
            duration: Duration::from_secs(60),
        },
    );
    let h = harness(probe, StaticNetwork::new("4g"), catalog(1), LoaderConfig::default());

    let pending = tokio::spawn({
        let loader = h.loader.clone();
        async move { loader.load_category("Fire", 0, None).await }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.probe.calls(), 2);
    h.loader.cleanup();

    let report = expect_loaded(pending.await.unwrap().unwrap());

    assert_eq!(report.loaded_count, 0);
    assert_eq!(report.failed_count, 2);
    assert_eq!(h.loader.cache_len(), 0);
    assert_eq!(h.probe.live_handles(), 0);
    assert!(!h.loader.is_category_loaded("Fire"));
}

#[tokio::test(start_paused = true)]
async fn background_job_queued_before_cleanup_is_abandoned() {
    let h = default_harness("slow-2g", 10);
    expect_loaded(h.loader.load_category("Rain", 0, None).await.unwrap());
    assert_eq!(h.scheduler.pending(), 1);

    h.loader.cleanup();
    h.scheduler.run_all().await;

    assert_eq!(h.probe.calls(), 1);
    assert_eq!(h.loader.cache_len(), 0);
    assert_eq!(h.probe.live_handles(), 0);
}

#[tokio::test(start_paused = true)]
async fn load_interrupted_by_cleanup_schedules_no_background() {
    let probe = FakeProbe::new().with_outcome(
        "rain-00",
        ProbeOutcome::Delayed {
            delay: Duration::from_secs(5),
            duration: Duration::from_secs(60),
        },
    );
    let h = harness(
        probe,
        StaticNetwork::new("slow-2g"),
        catalog(10),
        LoaderConfig::default(),
    );

    let pending = tokio::spawn({
        let loader = h.loader.clone();
        async move { loader.load_category("Rain", 0, None).await }
    });

    tokio::time::sleep(Duration::from_secs(1)).await;
    h.loader.cleanup();
    expect_loaded(pending.await.unwrap().unwrap());

    assert_eq!(h.scheduler.pending(), 0);
    h.scheduler.run_all().await;
    assert_eq!(h.loader.cache_len(), 0);
    assert_eq!(h.probe.calls(), 1);
    assert!(!h.loader.is_category_loaded("Rain"));
}
