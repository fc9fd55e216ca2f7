//! Boundary signals consumed by the hosting application.
//!
//! The client core never renders anything; it emits `SessionEvent`s on a
//! broadcast channel and the UI layer decides how to present them. The
//! re-authentication signal is latched so a burst of failing calls produces
//! exactly one redirect to the login screen, never a loop.

use crate::consts::client_consts;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Detail attached to a "backend unreachable" signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflineEvent {
    /// User-facing message from the failure's classification.
    pub message: String,
    /// Endpoint whose failure triggered the notification.
    pub endpoint: String,
    /// HTTP method of the failing call.
    pub method: String,
}

/// Signal crossing the boundary from the client core to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The backend is unreachable; show one banner, not a storm of toasts.
    Offline(OfflineEvent),
    /// Credentials are gone for good; redirect to the login screen.
    ReauthenticateRequired,
}

#[derive(Debug)]
struct Inner {
    sender: broadcast::Sender<SessionEvent>,
    reauth_latched: AtomicBool,
}

/// Handle to the boundary event channel.
#[derive(Debug, Clone)]
pub struct SessionEvents {
    inner: Arc<Inner>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(client_consts::SESSION_EVENT_QUEUE_SIZE);
        Self {
            inner: Arc::new(Inner {
                sender,
                reauth_latched: AtomicBool::new(false),
            }),
        }
    }

    /// Subscribe to boundary events. Each subscriber sees every event
    /// emitted after the subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.sender.subscribe()
    }

    /// Emit an offline event. Rate limiting is the notifier's job; this
    /// just crosses the boundary.
    pub(crate) fn offline(&self, event: OfflineEvent) {
        // No receivers is fine; the host may not have subscribed yet.
        let _ = self.inner.sender.send(SessionEvent::Offline(event));
    }

    /// Emit the re-authentication signal, at most once until the next
    /// successful login or renewal re-arms it.
    pub(crate) fn reauthenticate(&self) {
        if self.inner.reauth_latched.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.inner.sender.send(SessionEvent::ReauthenticateRequired);
    }

    /// Re-arm the re-authentication latch after credentials are restored.
    pub(crate) fn rearm(&self) {
        self.inner.reauth_latched.store(false, Ordering::SeqCst);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    /// Repeated failures produce exactly one redirect signal until re-armed.
    async fn reauthenticate_is_latched() {
        let events = SessionEvents::new();
        let mut receiver = events.subscribe();

        events.reauthenticate();
        events.reauthenticate();
        events.reauthenticate();

        assert_eq!(
            receiver.try_recv().unwrap(),
            SessionEvent::ReauthenticateRequired
        );
        assert!(matches!(receiver.try_recv(), Err(TryRecvError::Empty)));

        // A successful login re-arms the latch.
        events.rearm();
        events.reauthenticate();
        assert_eq!(
            receiver.try_recv().unwrap(),
            SessionEvent::ReauthenticateRequired
        );
    }

    #[tokio::test]
    /// Emitting with no subscribers must not panic or error out.
    async fn emit_without_subscribers_is_silent() {
        let events = SessionEvents::new();
        events.reauthenticate();
        events.offline(OfflineEvent {
            message: "unreachable".to_string(),
            endpoint: "api/records".to_string(),
            method: "GET".to_string(),
        });
    }
}
