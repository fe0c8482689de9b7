use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Metrics catalog
// ---------------------------------------------------------------------------

/// Register all metric descriptors at startup.
///
/// This must be called once before any metrics are recorded.
/// Descriptors provide human-readable descriptions for Prometheus.
pub fn describe_all_metrics() {
    // -- Catalog --
    describe_counter!(
        "reelshelf_catalog_requests_total",
        "Catalog listing requests by outcome"
    );
    describe_histogram!(
        "reelshelf_catalog_request_duration_seconds",
        "Catalog listing latency"
    );

    // -- Metadata cache --
    describe_counter!(
        "reelshelf_metadata_cache_hits_total",
        "Metadata sidecar cache hits"
    );
    describe_counter!(
        "reelshelf_metadata_cache_misses_total",
        "Metadata sidecar cache misses"
    );
    describe_gauge!(
        "reelshelf_metadata_cache_entries",
        "Current number of cached metadata records"
    );

    // -- Interactions --
    describe_counter!(
        "reelshelf_likes_toggled_total",
        "Like toggles by resulting state"
    );
    describe_counter!("reelshelf_comments_added_total", "Comments added");

    // -- Presigning --
    describe_counter!(
        "reelshelf_presign_urls_issued_total",
        "Presigned URLs issued by direction"
    );

    // -- Admin --
    describe_counter!(
        "reelshelf_admin_logins_total",
        "Admin login attempts by outcome"
    );

    // -- System --
    describe_gauge!("reelshelf_uptime_seconds", "Process uptime");
    describe_counter!(
        "reelshelf_panics_total",
        "Total panics caught (should always be 0)"
    );
}

/// Install the Prometheus recorder. Must happen before any metric is
/// recorded; the returned handle renders the /metrics endpoint.
pub fn install_prometheus_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus metrics recorder")
}

// ---------------------------------------------------------------------------
// Recording helpers
// ---------------------------------------------------------------------------

pub fn inc_catalog_request(outcome: &'static str) {
    counter!("reelshelf_catalog_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_catalog_duration(seconds: f64) {
    histogram!("reelshelf_catalog_request_duration_seconds").record(seconds);
}

pub fn inc_metadata_cache_hit() {
    counter!("reelshelf_metadata_cache_hits_total").increment(1);
}

pub fn inc_metadata_cache_miss() {
    counter!("reelshelf_metadata_cache_misses_total").increment(1);
}

pub fn set_metadata_cache_entries(entries: f64) {
    gauge!("reelshelf_metadata_cache_entries").set(entries);
}

pub fn inc_like_toggle(liked: bool) {
    let state = if liked { "liked" } else { "unliked" };
    counter!("reelshelf_likes_toggled_total", "state" => state).increment(1);
}

pub fn inc_comment_added() {
    counter!("reelshelf_comments_added_total").increment(1);
}

pub fn inc_presign_issued(direction: &'static str) {
    counter!("reelshelf_presign_urls_issued_total", "direction" => direction).increment(1);
}

pub fn inc_admin_login(outcome: &'static str) {
    counter!("reelshelf_admin_logins_total", "outcome" => outcome).increment(1);
}

pub fn inc_panic_total() {
    counter!("reelshelf_panics_total").increment(1);
}

/// Periodically refresh the uptime gauge until shutdown.
pub async fn run_uptime_task(start_time: Instant, cancel: CancellationToken) {
    let interval = std::time::Duration::from_secs(10);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {
                gauge!("reelshelf_uptime_seconds").set(start_time.elapsed().as_secs_f64());
            }
        }
    }
}
