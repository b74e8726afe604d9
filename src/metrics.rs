//! Counters recorded by the signing pipeline.

use std::fmt;

/// The pipeline stage a failed request stopped at.
///
/// Use these stable, low-cardinality labels when recording metrics.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum FailureStage {
    /// No enabled validator could be selected.
    Validator,
    /// The validator rejected the caller.
    Authentication,
    /// The CSR was malformed or badly signed.
    Csr,
    /// The CA failed to sign.
    Sign,
    /// The issued chain could not be encoded.
    Encode,
    /// The request was dropped before it finished, e.g. on a deadline or a
    /// client disconnect.
    Cancelled,
}

impl FailureStage {
    /// Returns a string representation of the stage.
    ///
    /// This is useful for metrics systems that require string labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validator => "validator",
            Self::Authentication => "authentication",
            Self::Csr => "csr",
            Self::Sign => "sign",
            Self::Encode => "encode",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for recording certificate signing metrics.
///
/// Implement this trait to integrate with your metrics system (e.g., Prometheus, `StatsD`).
/// Every request records [`MetricsRecorder::record_request`] once, followed by
/// exactly one of [`MetricsRecorder::record_success`] or [`MetricsRecorder::record_failure`].
/// A request abandoned by the transport is recorded as a failure at
/// [`FailureStage::Cancelled`].
///
/// # Example
///
/// ```no_run
/// use sentry_ca::metrics::{FailureStage, MetricsRecorder};
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// #[derive(Default)]
/// struct Counters {
///     received: AtomicU64,
/// }
///
/// impl MetricsRecorder for Counters {
///     fn record_request(&self) {
///         self.received.fetch_add(1, Ordering::Relaxed);
///     }
///
///     fn record_success(&self) {}
///
///     fn record_failure(&self, stage: FailureStage) {
///         println!("sign failed at {}", stage.as_str());
///     }
/// }
/// ```
pub trait MetricsRecorder: Send + Sync {
    /// Records that a signing request was received.
    fn record_request(&self);

    /// Records that a certificate was issued.
    fn record_success(&self);

    /// Records that a request failed at `stage`.
    fn record_failure(&self, stage: FailureStage);
}
