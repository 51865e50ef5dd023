//! Metrics collection and monitoring for linkpage
//!
//! Metrics are registered once into a crate-owned Prometheus registry by
//! [`init_registry`]. Until then every recording helper is a no-op, so library
//! users and tests that never initialise metrics pay nothing.

use once_cell::sync::{Lazy, OnceCell};
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::time::Instant;

use crate::types::Result;

/// Global metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Registered metric set
static METRICS: OnceCell<Metrics> = OnceCell::new();

/// Page edit metrics
pub struct PageMetrics {
    /// Canonical operations applied, by `op` and `outcome`
    pub operations: IntCounterVec,
    /// Histogram of operation durations in seconds, by `op`
    pub operation_duration: HistogramVec,
    /// Pages created on first access
    pub pages_created: IntCounter,
}

/// Post ingestion metrics
pub struct PostMetrics {
    /// Scrape requests, by `outcome`
    pub scrapes: IntCounterVec,
    /// Posts newly written to the post table
    pub posts_stored: IntCounter,
    /// Posts added to a collection
    pub collection_adds: IntCounter,
}

/// Session metrics
pub struct SessionMetrics {
    /// Successful logins
    pub logins: IntCounter,
    /// Currently valid sessions
    pub active_sessions: IntGauge,
}

/// Centralized metrics collection
pub struct Metrics {
    /// Page edits
    pub pages: PageMetrics,
    /// Post ingestion
    pub posts: PostMetrics,
    /// Sessions
    pub sessions: SessionMetrics,
}

fn register<M: prometheus::core::Collector + Clone + 'static>(metric: M) -> Result<M> {
    REGISTRY.register(Box::new(metric.clone()))?;
    Ok(metric)
}

impl Metrics {
    /// Create and register a metric set
    fn new() -> Result<Self> {
        Ok(Self {
            pages: PageMetrics {
                operations: register(IntCounterVec::new(
                    Opts::new("lp_page_operations_total", "Canonical page operations applied"),
                    &["op", "outcome"],
                )?)?,
                operation_duration: register(HistogramVec::new(
                    HistogramOpts::new(
                        "lp_page_operation_duration_seconds",
                        "Duration of page operations in seconds",
                    )
                    .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
                    &["op"],
                )?)?,
                pages_created: register(IntCounter::new(
                    "lp_pages_created_total",
                    "Pages created with the default header",
                )?)?,
            },
            posts: PostMetrics {
                scrapes: register(IntCounterVec::new(
                    Opts::new("lp_scrapes_total", "Link scrape requests"),
                    &["outcome"],
                )?)?,
                posts_stored: register(IntCounter::new(
                    "lp_posts_stored_total",
                    "Posts written to the post table",
                )?)?,
                collection_adds: register(IntCounter::new(
                    "lp_collection_adds_total",
                    "Posts added to a user collection",
                )?)?,
            },
            sessions: SessionMetrics {
                logins: register(IntCounter::new("lp_logins_total", "Successful logins")?)?,
                active_sessions: register(IntGauge::new(
                    "lp_active_sessions",
                    "Sessions issued and not yet revoked",
                )?)?,
            },
        })
    }

    /// The global metric set, if initialised
    pub fn global() -> Option<&'static Metrics> {
        METRICS.get()
    }
}

/// Timer for measuring operation duration with automatic histogram recording
pub struct Timer {
    /// Start time of the operation
    start: Instant,
    /// Histogram to record the duration when finished
    histogram: Option<Histogram>,
}

impl Timer {
    /// Start a new timer
    pub fn start(histogram: Option<Histogram>) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer
    pub fn finish(self) {
        if let Some(histogram) = self.histogram {
            histogram.observe(self.start.elapsed().as_secs_f64());
        }
    }
}

/// Initialize the metrics registry by creating the global metrics instance
///
/// Safe to call more than once; only the first call registers.
pub fn init_registry() -> Result<()> {
    METRICS.get_or_try_init(Metrics::new).map(|_| ())
}

/// Get the Prometheus registry for serving metrics to monitoring systems
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Collect and return all metrics as a Prometheus-formatted string
pub fn collect_metrics() -> Result<String> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = registry().gather();
    Ok(encoder.encode_to_string(&metric_families)?)
}

/// Start timing a page operation
pub fn page_op_timer(op: &str) -> Timer {
    Timer::start(Metrics::global().map(|m| m.pages.operation_duration.with_label_values(&[op])))
}

/// Count a page operation
pub fn record_page_op(op: &str, ok: bool) {
    if let Some(metrics) = Metrics::global() {
        let outcome = if ok { "ok" } else { "error" };
        metrics.pages.operations.with_label_values(&[op, outcome]).inc();
    }
}

/// Count a page created on first access
pub fn record_page_created() {
    if let Some(metrics) = Metrics::global() {
        metrics.pages.pages_created.inc();
    }
}

/// Count a scrape by outcome label
pub fn record_scrape(outcome: &str) {
    if let Some(metrics) = Metrics::global() {
        metrics.posts.scrapes.with_label_values(&[outcome]).inc();
    }
}

/// Count a post stored and/or added to a collection
pub fn record_post_added(newly_stored: bool, added_to_collection: bool) {
    if let Some(metrics) = Metrics::global() {
        if newly_stored {
            metrics.posts.posts_stored.inc();
        }
        if added_to_collection {
            metrics.posts.collection_adds.inc();
        }
    }
}

/// Track session issue (+1) and revoke (-1)
pub fn record_session(delta: i64) {
    if let Some(metrics) = Metrics::global() {
        if delta > 0 {
            metrics.sessions.logins.inc();
        }
        metrics.sessions.active_sessions.add(delta);
    }
}
