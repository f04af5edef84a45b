//! # Diagnostics
//!
//! Every fallback the core takes on behalf of the caller, whether a balance
//! that failed to parse, a derivation tier that threw, or a query strategy
//! that came back empty, is reported here as a structured
//! [`DiagnosticEvent`]. Nothing is swallowed: when the chain schema drifts
//! away from what the dashboard expects, these events are how an operator
//! finds out.
//!
//! Sinks are injected. [`TracingSink`] forwards to `tracing`, [`MemorySink`]
//! keeps events in memory for tests and for the dashboard's summary output.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// DiagnosticKind
// ---------------------------------------------------------------------------

/// What kind of fallback happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A display amount could not be parsed and was rendered as zero.
    AmountParseFallback,
    /// A loan field was missing or unparseable and took its default.
    FieldDefaulted,
    /// One tier of pallet-account resolution failed or was unavailable.
    DerivationTierFailed,
    /// A resolution strategy was skipped because the chain lacks its items.
    StrategyUnavailable,
    /// A resolution strategy threw and was treated as empty.
    StrategyFailed,
    /// A resolution strategy ran and found nothing.
    StrategyEmpty,
    /// A single query failed and its result was treated as absent.
    QueryFailed,
    /// The bounded scan hit its cap before the end of the loan ids.
    PartialResult,
    /// A balance row could not be read and was reported as zero.
    BalanceFallback,
}

impl DiagnosticKind {
    /// Stable snake_case name, used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmountParseFallback => "amount_parse_fallback",
            Self::FieldDefaulted => "field_defaulted",
            Self::DerivationTierFailed => "derivation_tier_failed",
            Self::StrategyUnavailable => "strategy_unavailable",
            Self::StrategyFailed => "strategy_failed",
            Self::StrategyEmpty => "strategy_empty",
            Self::QueryFailed => "query_failed",
            Self::PartialResult => "partial_result",
            Self::BalanceFallback => "balance_fallback",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DiagnosticEvent
// ---------------------------------------------------------------------------

/// A single reported fallback: its kind plus free-form key/value context.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticEvent {
    /// What happened.
    pub kind: DiagnosticKind,
    /// Where and with what inputs. Keys are stable; values are display strings.
    pub context: BTreeMap<String, String>,
    /// When it was reported.
    pub at: DateTime<Utc>,
}

impl DiagnosticEvent {
    /// Creates an event with empty context.
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            kind,
            context: BTreeMap::new(),
            at: Utc::now(),
        }
    }

    /// Adds a context entry. Builder-style.
    pub fn with(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    /// Looks up a context entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Receives diagnostic events. Implementations must not block for long:
/// sinks are called inline on the resolution path.
pub trait DiagnosticSink: Send + Sync {
    /// Record one event.
    fn report(&self, event: DiagnosticEvent);
}

/// Shared, type-erased sink handle.
pub type SharedSink = Arc<dyn DiagnosticSink>;

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Arc<T> {
    fn report(&self, event: DiagnosticEvent) {
        (**self).report(event)
    }
}

/// Forwards every event to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, event: DiagnosticEvent) {
        tracing::warn!(
            kind = %event.kind,
            context = ?event.context,
            "diagnostic"
        );
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// Number of events of the given kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind == kind).count()
    }

    /// Drops all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, event: DiagnosticEvent) {
        tracing::debug!(kind = %event.kind, "diagnostic recorded");
        self.events.lock().push(event);
    }
}

/// Sends every event to two sinks.
pub struct Tee<A, B>(pub A, pub B);

impl<A: DiagnosticSink, B: DiagnosticSink> DiagnosticSink for Tee<A, B> {
    fn report(&self, event: DiagnosticEvent) {
        self.0.report(event.clone());
        self.1.report(event);
    }
}
