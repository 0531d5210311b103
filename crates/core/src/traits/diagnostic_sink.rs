use crate::models::HostRewrite;

/// Receiver of placement diagnostics.
///
/// Passed into the resolver instead of a process-wide logger so callers can
/// route host-rewrite warnings to whatever sink they run (tracing, a log
/// stream, a test recorder). Recording must never fail.
pub trait DiagnosticSink: Send + Sync {
    fn record_warning(&self, warning: &HostRewrite);
}
