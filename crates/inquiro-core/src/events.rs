//! Session event bus.
//!
//! The HTTP client publishes here instead of calling back into the UI; the
//! top-level coordinator subscribes once and owns the global reaction
//! (clearing the store, leaving the dashboard).

use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A login stored a fresh credential.
    LoggedIn,
    /// The user logged out explicitly.
    LoggedOut,
    /// The backend rejected the credential (HTTP 401) on `path`.
    Expired { path: String },
}

/// Broadcast-backed bus for [`SessionEvent`]s.
#[derive(Clone, Debug)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Create a new bus with the given channel buffer size.
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        debug!("session event bus initialized (buffer={})", buffer);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    /// Publish an event. Returns false when nobody is listening, in which
    /// case the publisher has to perform the reaction itself.
    pub fn emit(&self, event: SessionEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_reports_undelivered() {
        let bus = SessionEvents::new(4);
        assert!(!bus.has_subscribers());
        assert!(!bus.emit(SessionEvent::LoggedOut));
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = SessionEvents::new(4);
        let mut rx = bus.subscribe();

        assert!(bus.emit(SessionEvent::LoggedIn));
        assert!(bus.emit(SessionEvent::Expired {
            path: "/query".to_string()
        }));

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::LoggedIn);
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::Expired {
                path: "/query".to_string()
            }
        );
    }
}
