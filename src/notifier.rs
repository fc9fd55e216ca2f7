//! Rate-limited "backend unreachable" notification.
//!
//! Many calls can fail at once when the backend drops; the notifier collapses
//! them into at most one offline event per cooldown window. It carries no
//! retry or backoff logic, only the last-emitted timestamp.

use crate::consts::client_consts;
use crate::events::{OfflineEvent, SessionEvents};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct OfflineNotifier {
    events: SessionEvents,
    cooldown: Duration,
    last_emitted: Mutex<Option<Instant>>,
}

impl OfflineNotifier {
    pub fn new(events: SessionEvents) -> Self {
        Self::with_cooldown(events, client_consts::offline_cooldown())
    }

    pub fn with_cooldown(events: SessionEvents, cooldown: Duration) -> Self {
        Self {
            events,
            cooldown,
            last_emitted: Mutex::new(None),
        }
    }

    /// Emit an offline event unless one was already emitted within the
    /// cooldown window.
    pub fn notify(&self, event: OfflineEvent) {
        let now = Instant::now();
        {
            let mut last = self.last_emitted.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(at) = *last {
                if now.duration_since(at) < self.cooldown {
                    log::debug!(
                        "suppressing offline notification for {} (cooldown active)",
                        event.endpoint
                    );
                    return;
                }
            }
            *last = Some(now);
        }
        log::warn!("backend unreachable: {} {}", event.method, event.endpoint);
        self.events.offline(event);
    }

    /// Reset the cooldown so the next outage notifies promptly. Called by
    /// the pipeline on any transport success.
    pub fn reset(&self) {
        let mut last = self.last_emitted.lock().unwrap_or_else(|e| e.into_inner());
        *last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::SessionEvent;
    use tokio::sync::broadcast::error::TryRecvError;

    fn event(endpoint: &str) -> OfflineEvent {
        OfflineEvent {
            message: "Unable to reach the records server.".to_string(),
            endpoint: endpoint.to_string(),
            method: "GET".to_string(),
        }
    }

    #[tokio::test]
    /// Many failures inside one cooldown window emit exactly one event.
    async fn throttles_within_cooldown_window() {
        let events = SessionEvents::new();
        let mut receiver = events.subscribe();
        let notifier = OfflineNotifier::with_cooldown(events, Duration::from_secs(60));

        for i in 0..5 {
            notifier.notify(event(&format!("api/records/{i}")));
        }

        assert!(matches!(
            receiver.try_recv().unwrap(),
            SessionEvent::Offline(_)
        ));
        assert!(matches!(receiver.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    /// A transport success resets the window; the next failure notifies again.
    async fn reset_reopens_the_window() {
        let events = SessionEvents::new();
        let mut receiver = events.subscribe();
        let notifier = OfflineNotifier::with_cooldown(events, Duration::from_secs(60));

        notifier.notify(event("api/records"));
        notifier.reset();
        notifier.notify(event("api/records"));

        assert!(matches!(
            receiver.try_recv().unwrap(),
            SessionEvent::Offline(_)
        ));
        assert!(matches!(
            receiver.try_recv().unwrap(),
            SessionEvent::Offline(_)
        ));
    }

    #[tokio::test]
    /// A zero cooldown disables throttling entirely.
    async fn zero_cooldown_never_throttles() {
        let events = SessionEvents::new();
        let mut receiver = events.subscribe();
        let notifier = OfflineNotifier::with_cooldown(events, Duration::ZERO);

        notifier.notify(event("api/records"));
        notifier.notify(event("api/records"));

        assert!(receiver.try_recv().is_ok());
        assert!(receiver.try_recv().is_ok());
    }
}
