//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Live WebSocket connections and non-empty groups in the hub
//! - Frames delivered, slow consumers evicted, inbound frames dropped

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "chat_hub";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Connections currently registered with the hub
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "websocket_connections_active",
            "Number of live WebSocket connections",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Groups with at least one live subscriber
pub static GROUP_SUBSCRIPTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "group_subscriptions_active",
            "Number of groups with at least one live connection",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create GROUP_SUBSCRIPTIONS_ACTIVE metric")
});

/// Frames accepted into an outbound queue
pub static FRAMES_DELIVERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "frames_delivered_total",
            "Frames enqueued for delivery to a connection",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create FRAMES_DELIVERED_TOTAL metric")
});

/// Connections dropped because their outbound queue was full or closed
pub static SLOW_CONSUMER_EVICTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "slow_consumer_evictions_total",
            "Connections evicted during fan-out",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create SLOW_CONSUMER_EVICTIONS_TOTAL metric")
});

/// Inbound frames dropped, by reason ("protocol", "unauthorized", "persistence", "unregistered")
pub static INBOUND_FRAMES_DROPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "inbound_frames_dropped_total",
            "Inbound frames dropped without effect",
        )
        .namespace(NAMESPACE),
        &["reason"],
    )
    .expect("Failed to create INBOUND_FRAMES_DROPPED_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(GROUP_SUBSCRIPTIONS_ACTIVE.clone()))
        .expect("Failed to register GROUP_SUBSCRIPTIONS_ACTIVE");
    registry
        .register(Box::new(FRAMES_DELIVERED_TOTAL.clone()))
        .expect("Failed to register FRAMES_DELIVERED_TOTAL");
    registry
        .register(Box::new(SLOW_CONSUMER_EVICTIONS_TOTAL.clone()))
        .expect("Failed to register SLOW_CONSUMER_EVICTIONS_TOTAL");
    registry
        .register(Box::new(INBOUND_FRAMES_DROPPED_TOTAL.clone()))
        .expect("Failed to register INBOUND_FRAMES_DROPPED_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to publish the hub's size after a membership change
pub fn set_hub_gauges(connections: usize, groups: usize) {
    WEBSOCKET_CONNECTIONS_ACTIVE.set(connections as i64);
    GROUP_SUBSCRIPTIONS_ACTIVE.set(groups as i64);
}

/// Helper to record the outcome of one fan-out
pub fn record_fan_out(delivered: usize, evicted: usize) {
    FRAMES_DELIVERED_TOTAL.inc_by(delivered as u64);
    SLOW_CONSUMER_EVICTIONS_TOTAL.inc_by(evicted as u64);
}

/// Helper to count a dropped inbound frame
pub fn record_dropped_frame(reason: &str) {
    INBOUND_FRAMES_DROPPED_TOTAL
        .with_label_values(&[reason])
        .inc();
}
