use std::sync::Arc;

use tracing::warn;

use crate::logging::stream::LogPublisher;
use crate::models::HostRewrite;
use crate::traits::DiagnosticSink;

/// Emits diagnostics as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record_warning(&self, warning: &HostRewrite) {
        warn!(
            unit = warning.unit.as_deref().unwrap_or("-"),
            original_host = %warning.original_host,
            rewritten_host = %warning.rewritten_host,
            "{}",
            warning.message()
        );
    }
}

/// Publishes diagnostics as lines on a log stream.
#[derive(Debug, Clone)]
pub struct StreamSink {
    publisher: LogPublisher,
}

impl StreamSink {
    pub fn new(publisher: LogPublisher) -> Self {
        Self { publisher }
    }
}

impl DiagnosticSink for StreamSink {
    fn record_warning(&self, warning: &HostRewrite) {
        self.publisher.publish(format!("WARNING {}", warning.message()));
    }
}

/// Forwards every diagnostic to each inner sink in order.
#[derive(Default, Clone)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn DiagnosticSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl DiagnosticSink for CompositeSink {
    fn record_warning(&self, warning: &HostRewrite) {
        for sink in &self.sinks {
            sink.record_warning(warning);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::stream::StreamKind;

    #[tokio::test]
    async fn test_stream_sink_publishes_line() {
        let publisher = LogPublisher::new(StreamKind::Log, 8);
        let mut subscription = publisher.subscribe();

        let sink = StreamSink::new(publisher);
        sink.record_warning(&HostRewrite::new(
            Some("encoder-0".to_string()),
            "203.0.113.5",
            "0.0.0.0",
        ));

        let line = subscription.next_line().await.unwrap();
        assert!(line.starts_with("WARNING unit 'encoder-0'"));
        assert!(line.contains("203.0.113.5"));
    }

    #[tokio::test]
    async fn test_composite_sink_fans_out() {
        let publisher = LogPublisher::new(StreamKind::Log, 8);
        let mut subscription = publisher.subscribe();

        let composite = CompositeSink::new()
            .with_sink(Arc::new(TracingSink))
            .with_sink(Arc::new(StreamSink::new(publisher.clone())))
            .with_sink(Arc::new(StreamSink::new(publisher)));
        assert_eq!(composite.len(), 3);

        composite.record_warning(&HostRewrite::new(None, "10.0.0.9", "0.0.0.0"));

        assert!(subscription.next_line().await.is_some());
        assert!(subscription.next_line().await.is_some());
    }
}
