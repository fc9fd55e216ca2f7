//! Authenticated HTTP client core for the AFIS records console.
//!
//! The hosting application (dashboards, capture screens, analysis viewers)
//! issues every backend call through [`ApiClient`]. The client attaches the
//! session's bearer token pre-flight, classifies failures into a closed
//! taxonomy, recovers expired credentials through a single-flight renewal
//! with exactly one replay per call, and rate-limits "backend unreachable"
//! signals so the UI shows one banner instead of a storm of toasts.

pub mod auth;
pub mod classifier;
pub mod client;
pub mod consts;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod events;
pub mod notifier;
pub mod refresh;
pub mod transport;

pub use classifier::{Classification, ErrorKind, classify};
pub use client::ApiClient;
pub use credentials::{CredentialPair, CredentialStore, SessionRecord, UserRecord};
pub use error::{ApiError, TransportFailure};
pub use events::{OfflineEvent, SessionEvent, SessionEvents};
pub use refresh::RefreshCoordinator;
pub use transport::{ApiRequest, HttpTransport, Method, MultipartField, RequestBody, Transport};
