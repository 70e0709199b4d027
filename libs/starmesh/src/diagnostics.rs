//! # Diagnostics
//!
//! Non-fatal problem reporting for mesh operations.
//!
//! The editing pipeline prefers a visibly wrong but still renderable mesh
//! over a crash, so degeneracies and tracing failures are reported through a
//! caller-supplied sink instead of being propagated as fatal errors. No
//! global sink exists; callers inject one per operation.

/// Sink for non-fatal problems encountered during mesh operations.
pub trait Diagnostics {
    /// Reports a recoverable oddity (degenerate input, substituted fallback).
    fn warning(&mut self, message: &str);

    /// Reports a failure that abandoned part of an operation (for example
    /// one polygon of a punch-out batch).
    fn error(&mut self, message: &str);
}

/// Diagnostics sink forwarding to the `log` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warning(&mut self, message: &str) {
        log::warn!("{message}");
    }

    fn error(&mut self, message: &str) {
        log::error!("{message}");
    }
}

/// Diagnostics sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn warning(&mut self, _message: &str) {}

    fn error(&mut self, _message: &str) {}
}

/// Diagnostics sink that records messages, mainly for tests and tooling.
#[derive(Debug, Default, Clone)]
pub struct CollectingDiagnostics {
    /// Recorded warning messages, in order of arrival.
    pub warnings: Vec<String>,
    /// Recorded error messages, in order of arrival.
    pub errors: Vec<String>,
}

impl CollectingDiagnostics {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
