//! # Prometheus Metrics
//!
//! Counts what the dashboard core reported while a command ran. The
//! registry is printed in the text exposition format after the command's
//! output when `--metrics` is given, so a scrape job wrapping the binary can
//! pick it up.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] under
//! the `halal_dash` namespace.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use halal_lending_core::diagnostics::{DiagnosticEvent, DiagnosticSink};

/// Metric handles for one dashboard run.
///
/// Cheap to clone: the prometheus handles share their storage, so a clone
/// handed to the diagnostics pipeline feeds the same registry.
#[derive(Clone)]
pub struct DiagnosticMetrics {
    registry: Registry,
    /// Diagnostic events by kind.
    pub diagnostics_total: IntCounterVec,
    /// Loan records returned by resolution.
    pub loans_resolved_total: IntCounter,
}

impl DiagnosticMetrics {
    /// Creates and registers all metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("halal_dash".into()), None)?;

        let diagnostics_total = IntCounterVec::new(
            Opts::new(
                "diagnostics_total",
                "Fallbacks reported by the dashboard core, by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(diagnostics_total.clone()))?;

        let loans_resolved_total = IntCounter::new(
            "loans_resolved_total",
            "Loan records returned by entity resolution",
        )?;
        registry.register(Box::new(loans_resolved_total.clone()))?;

        Ok(Self {
            registry,
            diagnostics_total,
            loans_resolved_total,
        })
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl DiagnosticSink for DiagnosticMetrics {
    fn report(&self, event: DiagnosticEvent) {
        self.diagnostics_total
            .with_label_values(&[event.kind.as_str()])
            .inc();
    }
}
