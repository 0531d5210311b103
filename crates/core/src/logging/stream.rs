//! Line-oriented log stream.
//!
//! Producers publish whole lines into a [`LogPublisher`]; every subscriber
//! receives them as a push stream of server-sent-event frames. Once the last
//! publisher is dropped the stream emits a terminal marker and ends.

use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// Which stream a publisher feeds. Each kind has its own end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Log,
    Profile,
}

impl StreamKind {
    pub fn end_marker(&self) -> &'static str {
        match self {
            StreamKind::Log => "LOG ENDS",
            StreamKind::Profile => "PROFILE ENDS",
        }
    }
}

/// Upstream end of a log stream. Cloning shares the same channel; the stream
/// closes when every clone is dropped.
#[derive(Debug, Clone)]
pub struct LogPublisher {
    kind: StreamKind,
    tx: broadcast::Sender<String>,
}

impl LogPublisher {
    pub fn new(kind: StreamKind, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { kind, tx }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Publishes one line and returns how many subscribers received it.
    /// Lines published while nobody listens are dropped.
    pub fn publish<S: Into<String>>(&self, line: S) -> usize {
        self.tx.send(line.into()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> LogSubscription {
        LogSubscription {
            kind: self.kind,
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Downstream end of a log stream.
#[derive(Debug)]
pub struct LogSubscription {
    kind: StreamKind,
    rx: broadcast::Receiver<String>,
}

impl LogSubscription {
    /// Next published line, or `None` once upstream is closed. A subscriber
    /// that falls behind skips the lines it missed.
    pub async fn next_line(&mut self) -> Option<String> {
        loop {
            match self.rx.recv().await {
                Ok(line) => return Some(line),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, kind = ?self.kind, "log subscriber lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Server-sent-event frames, terminated by the kind's end marker.
    pub fn into_event_stream(self) -> impl Stream<Item = String> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut subscription = state?;
            match subscription.next_line().await {
                Some(line) => Some((format_event(&line), Some(subscription))),
                None => Some((
                    format!("{}\n\n", subscription.kind.end_marker()),
                    None,
                )),
            }
        })
    }
}

/// One SSE `data` frame. Embedded newlines become separate `data:` lines.
pub fn format_event(line: &str) -> String {
    let mut frame = String::with_capacity(line.len() + 8);
    for part in line.split('\n') {
        frame.push_str("data: ");
        frame.push_str(part.trim_end_matches('\r'));
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_format_event() {
        assert_eq!(format_event("hello"), "data: hello\n\n");
        assert_eq!(format_event("a\nb"), "data: a\ndata: b\n\n");
    }

    #[tokio::test]
    async fn test_stream_terminates_on_upstream_close() {
        let publisher = LogPublisher::new(StreamKind::Log, 16);
        let subscription = publisher.subscribe();

        assert_eq!(publisher.publish("first"), 1);
        publisher.publish("second");
        drop(publisher);

        let frames: Vec<String> = subscription.into_event_stream().collect().await;
        assert_eq!(
            frames,
            vec![
                "data: first\n\n".to_string(),
                "data: second\n\n".to_string(),
                "LOG ENDS\n\n".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_every_subscriber_gets_every_line() {
        let publisher = LogPublisher::new(StreamKind::Profile, 16);
        let mut a = publisher.subscribe();
        let mut b = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 2);

        publisher.publish("tick");
        assert_eq!(a.next_line().await.as_deref(), Some("tick"));
        assert_eq!(b.next_line().await.as_deref(), Some("tick"));

        let clone = publisher.clone();
        drop(publisher);
        clone.publish("tock");
        drop(clone);

        assert_eq!(a.next_line().await.as_deref(), Some("tock"));
        assert_eq!(a.next_line().await, None);

        let rest: Vec<String> = b.into_event_stream().collect().await;
        assert_eq!(rest.last().map(String::as_str), Some("PROFILE ENDS\n\n"));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips_missed_lines() {
        let publisher = LogPublisher::new(StreamKind::Log, 2);
        let mut subscription = publisher.subscribe();

        for i in 0..5 {
            publisher.publish(format!("line {i}"));
        }

        assert_eq!(subscription.next_line().await.as_deref(), Some("line 3"));
        assert_eq!(subscription.next_line().await.as_deref(), Some("line 4"));
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let publisher = LogPublisher::new(StreamKind::Log, 4);
        assert_eq!(publisher.publish("nobody"), 0);
    }
}
