//! Single-flight credential renewal.
//!
//! Any number of calls can hit an auth failure at the same time; exactly one
//! of them becomes the leader and issues the renewal call, everyone else is
//! queued on a oneshot handle that the leader settles once the renewal
//! lands. The Idle→Renewing check-and-transition happens under one lock
//! acquisition with no await point in between, which is what makes the
//! single-flight guarantee hold under cooperative scheduling.

use crate::auth::{RefreshRequest, TokenResponse};
use crate::credentials::{CredentialPair, CredentialStore};
use crate::endpoints;
use crate::error::ApiError;
use crate::events::SessionEvents;
use crate::transport::{ApiRequest, Transport};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type RenewalOutcome = Result<String, ApiError>;

enum RefreshState {
    Idle,
    /// Renewal in flight; waiters are settled in arrival order.
    Renewing(Vec<oneshot::Sender<RenewalOutcome>>),
}

/// What a caller found when it checked the state machine.
enum Entry {
    Leader { refresh_token: String },
    Follower(oneshot::Receiver<RenewalOutcome>),
    NoToken { had_access_token: bool },
}

pub struct RefreshCoordinator {
    transport: Arc<dyn Transport>,
    store: CredentialStore,
    events: SessionEvents,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(transport: Arc<dyn Transport>, store: CredentialStore, events: SessionEvents) -> Self {
        Self {
            transport,
            store,
            events,
            state: Mutex::new(RefreshState::Idle),
        }
    }

    /// Obtain a fresh access token, coalescing concurrent callers onto one
    /// renewal call.
    ///
    /// With no stored refresh token this fails immediately, without touching
    /// the network or the state machine. On renewal failure the store is
    /// cleared and the re-authentication signal is raised; every queued
    /// caller sees the same error.
    pub async fn ensure_fresh_token(&self) -> RenewalOutcome {
        let entry = {
            // No await while this lock is held: the Idle check and the
            // transition to Renewing must be one atomic step.
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match &mut *state {
                RefreshState::Renewing(waiters) => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(sender);
                    Entry::Follower(receiver)
                }
                RefreshState::Idle => {
                    let pair = self.store.load();
                    match pair.refresh_token {
                        None => Entry::NoToken {
                            had_access_token: pair.access_token.is_some(),
                        },
                        Some(refresh_token) => {
                            *state = RefreshState::Renewing(Vec::new());
                            Entry::Leader { refresh_token }
                        }
                    }
                }
            }
        };

        match entry {
            Entry::Follower(receiver) => match receiver.await {
                Ok(outcome) => outcome,
                // The leader was dropped mid-renewal; treat as expired.
                Err(_) => Err(ApiError::session_expired()),
            },
            Entry::NoToken { had_access_token } => {
                if had_access_token {
                    log::warn!("access token present but refresh token missing; cannot renew");
                } else {
                    log::debug!("no stored credentials; renewal not attempted");
                }
                Err(ApiError::session_expired())
            }
            Entry::Leader { refresh_token } => {
                let outcome = self.renew(&refresh_token).await;
                if outcome.is_err() {
                    if let Err(e) = self.store.clear() {
                        log::warn!("failed to clear credentials after renewal failure: {e}");
                    }
                    self.events.reauthenticate();
                }
                let waiters = {
                    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                    match std::mem::replace(&mut *state, RefreshState::Idle) {
                        RefreshState::Renewing(waiters) => waiters,
                        RefreshState::Idle => Vec::new(),
                    }
                };
                for waiter in waiters {
                    let _ = waiter.send(outcome.clone());
                }
                outcome
            }
        }
    }

    /// Issue the one renewal call and persist the resulting pair.
    async fn renew(&self, refresh_token: &str) -> RenewalOutcome {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: refresh_token.to_string(),
        })?;
        let request = ApiRequest::post(endpoints::REFRESH).with_json(body);

        let response = self
            .transport
            .execute(&request, None)
            .await
            .map_err(ApiError::from_failure)?;

        let token: TokenResponse = serde_json::from_slice(&response.body)?;
        let pair = CredentialPair {
            access_token: Some(token.access_token.clone()),
            // An omitted refresh token means the stored one stays valid.
            refresh_token: token
                .refresh_token
                .or_else(|| Some(refresh_token.to_string())),
        };
        if let Err(e) = self.store.save(&pair) {
            log::error!("failed to persist renewed credentials: {e}");
        }
        self.events.rearm();
        log::debug!("credential renewal succeeded");
        Ok(token.access_token)
    }
}
