//! Prometheus metrics for the HTTP layer and the analysis pipeline.

use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: Gauge,
    pub http_request_duration_seconds: Histogram,
    pub analyses_total: IntCounter,
    pub cache_hits_total: IntCounter,
    pub cache_misses_total: IntCounter,
    pub records_generated_total: IntCounter,
    pub fetch_failures_total: IntCounter,
    pub scan_duration_seconds: Histogram,
    pub store_connected: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests received")?;
        let http_requests_in_flight =
            Gauge::new("http_requests_in_flight", "HTTP requests currently in flight")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let analyses_total =
            IntCounter::new("analyses_total", "Batch analyses executed")?;
        let cache_hits_total =
            IntCounter::new("cache_hits_total", "Symbols served from the signal cache")?;
        let cache_misses_total =
            IntCounter::new("cache_misses_total", "Symbols requiring fresh computation")?;
        let records_generated_total = IntCounter::new(
            "records_generated_total",
            "Signal records computed and persisted",
        )?;
        let fetch_failures_total = IntCounter::new(
            "fetch_failures_total",
            "Per-symbol fetch or compute failures",
        )?;
        let scan_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "scan_duration_seconds",
            "Duration of scheduled market scans in seconds",
        ))?;
        let store_connected =
            Gauge::new("store_connected", "Whether the persistent store is reachable")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(analyses_total.clone()))?;
        registry.register(Box::new(cache_hits_total.clone()))?;
        registry.register(Box::new(cache_misses_total.clone()))?;
        registry.register(Box::new(records_generated_total.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;
        registry.register(Box::new(scan_duration_seconds.clone()))?;
        registry.register(Box::new(store_connected.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
            analyses_total,
            cache_hits_total,
            cache_misses_total,
            records_generated_total,
            fetch_failures_total,
            scan_duration_seconds,
            store_connected,
        })
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics encoding error: {}", e)))
    }
}
