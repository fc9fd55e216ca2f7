//! The request pipeline.
//!
//! Every outbound call goes through `ApiClient`: credentials are attached
//! pre-flight, failures are classified, auth failures are recovered through
//! the refresh coordinator with a single replay, network failures are
//! reported to the offline notifier, and non-critical endpoints degrade to a
//! caller-supplied fallback instead of surfacing an error.

use crate::auth::{LoginRequest, LoginResponse};
use crate::classifier::ErrorKind;
use crate::credentials::{CredentialPair, CredentialStore, SessionRecord, UserRecord};
use crate::endpoints;
use crate::error::ApiError;
use crate::events::{OfflineEvent, SessionEvent, SessionEvents};
use crate::notifier::OfflineNotifier;
use crate::refresh::RefreshCoordinator;
use crate::transport::{ApiRequest, HttpTransport, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    store: CredentialStore,
    coordinator: RefreshCoordinator,
    notifier: OfflineNotifier,
    events: SessionEvents,
}

impl ApiClient {
    pub fn new(base_url: &str, store: CredentialStore) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new(base_url)), store)
    }

    /// Build a client over an arbitrary transport. This is the seam tests
    /// and embedders use.
    pub fn with_transport(transport: Arc<dyn Transport>, store: CredentialStore) -> Self {
        let events = SessionEvents::new();
        Self {
            coordinator: RefreshCoordinator::new(
                transport.clone(),
                store.clone(),
                events.clone(),
            ),
            notifier: OfflineNotifier::new(events.clone()),
            transport,
            store,
            events,
        }
    }

    /// Replace the offline-notification cooldown window.
    pub fn with_offline_cooldown(mut self, cooldown: Duration) -> Self {
        self.notifier = OfflineNotifier::with_cooldown(self.events.clone(), cooldown);
        self
    }

    /// Subscribe to the boundary signals (offline banner, forced re-login).
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Issue a call and decode its JSON response.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let body = self.dispatch(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Issue a call, discarding the response body.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.dispatch(request).await.map(|_| ())
    }

    /// Issue a call, degrading to `fallback` when the backend is unreachable
    /// and the endpoint is non-critical. All other failures propagate.
    pub async fn send_with_fallback<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        fallback: T,
    ) -> Result<T, ApiError> {
        let non_critical = endpoints::is_non_critical(&request.endpoint);
        match self.send(request).await {
            Err(error)
                if non_critical
                    && matches!(error.kind(), ErrorKind::Network | ErrorKind::Timeout) =>
            {
                Ok(fallback)
            }
            other => other,
        }
    }

    /// The failure policy, per call. At most one replay: the request's retry
    /// marker gates the renewal path.
    async fn dispatch(&self, mut request: ApiRequest) -> Result<Vec<u8>, ApiError> {
        // Token handed back by the coordinator for the replay; it wins over
        // the store, which may have failed to persist the renewed pair.
        let mut renewed_bearer: Option<String> = None;
        loop {
            let bearer = match renewed_bearer.take() {
                Some(token) => Some(token),
                None => self.store.load().access_token,
            };
            match self.transport.execute(&request, bearer).await {
                Ok(response) => {
                    self.notifier.reset();
                    return Ok(response.body);
                }
                Err(failure) => {
                    let error = ApiError::from_failure(failure);
                    match error.kind() {
                        ErrorKind::Network | ErrorKind::Timeout => {
                            if endpoints::is_non_critical(&request.endpoint) {
                                log::debug!(
                                    "{} {} unreachable (non-critical)",
                                    request.method,
                                    request.endpoint
                                );
                            } else {
                                self.notify_offline(&request, &error);
                            }
                            return Err(error);
                        }
                        ErrorKind::Auth => {
                            if !request.retried
                                && !endpoints::is_auth_endpoint(&request.endpoint)
                            {
                                request.retried = true;
                                match self.coordinator.ensure_fresh_token().await {
                                    // Replay the original call once with the
                                    // renewed token.
                                    Ok(token) => {
                                        renewed_bearer = Some(token);
                                        continue;
                                    }
                                    Err(renewal_error) => {
                                        self.force_logout();
                                        return Err(renewal_error);
                                    }
                                }
                            }
                            if endpoints::is_logout_endpoint(&request.endpoint) {
                                // User-initiated sign-out; clearing suffices.
                                if let Err(e) = self.store.clear() {
                                    log::warn!("failed to clear credentials on logout: {e}");
                                }
                            } else {
                                self.force_logout();
                            }
                            return Err(error);
                        }
                        ErrorKind::ServerFault => {
                            // 503 means the backend is effectively down.
                            if error.status() == Some(503) {
                                self.notify_offline(&request, &error);
                            }
                            return Err(error);
                        }
                        ErrorKind::Permission | ErrorKind::NotFound | ErrorKind::Generic => {
                            return Err(error);
                        }
                    }
                }
            }
        }
    }

    fn notify_offline(&self, request: &ApiRequest, error: &ApiError) {
        let message = error
            .classification()
            .map(|c| c.message.clone())
            .unwrap_or_else(|| error.to_string());
        self.notifier.notify(OfflineEvent {
            message,
            endpoint: request.endpoint.clone(),
            method: request.method.to_string(),
        });
    }

    fn force_logout(&self) {
        if let Err(e) = self.store.clear() {
            log::warn!("failed to clear credentials on forced logout: {e}");
        }
        self.events.reauthenticate();
    }

    // =========================================================================
    // Auth operations
    // =========================================================================

    /// Sign in and persist the returned credentials and user record.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserRecord, ApiError> {
        let body = serde_json::to_value(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let response: LoginResponse = self
            .send(ApiRequest::post(endpoints::LOGIN).with_json(body))
            .await?;

        self.store.save(&CredentialPair {
            access_token: Some(response.access_token),
            refresh_token: response.refresh_token,
        })?;
        self.store.save_user(&response.user)?;
        self.events.rearm();
        log::debug!("login succeeded for session {}", self.store.session_id());
        Ok(response.user)
    }

    /// Sign out. The server call is best-effort; local credentials are
    /// cleared regardless.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Err(e) = self.send_empty(ApiRequest::post(endpoints::LOGOUT)).await {
            log::debug!("logout request failed (ignored): {e}");
        }
        self.store.clear()?;
        Ok(())
    }

    /// The signed-in user for this session, if any.
    pub fn current_user(&self) -> Option<UserRecord> {
        self.store.load_user()
    }

    /// The current session record, present once a user has signed in.
    pub fn session(&self) -> Option<SessionRecord> {
        self.store.session()
    }
}
