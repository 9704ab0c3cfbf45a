//! Prometheus metrics for the quote service

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Quote service metrics
#[derive(Clone)]
pub struct QuoteMetrics {
    pub quotes_total: IntCounter,
    pub cache_hits_total: IntCounter,
    pub errors_total: IntCounterVec,
    pub quote_duration_seconds: Histogram,
}

impl QuoteMetrics {
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            quotes_total: IntCounter::new("crewbill_quotes_total", "Total quotes served")?,
            cache_hits_total: IntCounter::new(
                "crewbill_quote_cache_hits_total",
                "Quotes answered from the cache",
            )?,
            errors_total: IntCounterVec::new(
                Opts::new("crewbill_pricing_errors_total", "Pricing failures by kind"),
                &["kind"],
            )?,
            quote_duration_seconds: Histogram::with_opts(
                HistogramOpts::new("crewbill_quote_duration_seconds", "Quote computation time")
                    .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01]),
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.quotes_total.clone()))?;
        registry.register(Box::new(self.cache_hits_total.clone()))?;
        registry.register(Box::new(self.errors_total.clone()))?;
        registry.register(Box::new(self.quote_duration_seconds.clone()))?;
        Ok(())
    }

    pub fn record_error(&self, kind: &str) {
        self.errors_total.with_label_values(&[kind]).inc();
    }
}

/// Render a registry in the text exposition format
pub fn render(registry: &Registry) -> prometheus::Result<(String, String)> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    let body = String::from_utf8_lossy(&buffer).into_owned();
    Ok((encoder.format_type().to_string(), body))
}
