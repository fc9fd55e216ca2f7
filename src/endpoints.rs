//! Endpoint paths and the policies attached to them.
//!
//! Two static policies live here: which endpoints belong to the auth flow
//! (and therefore must never trigger a token renewal of their own), and
//! which endpoints are non-critical (background polling whose failures
//! degrade silently instead of interrupting the user).

/// Login endpoint; returns the initial token pair and user record.
pub const LOGIN: &str = "api/auth/login";

/// Credential-renewal endpoint; exchanges a refresh token for a new pair.
pub const REFRESH: &str = "api/auth/refresh";

/// Logout endpoint; best-effort, failures are ignored.
pub const LOGOUT: &str = "api/auth/logout";

/// Endpoints whose failures must never escalate to a user-visible
/// notification. Consulted, never mutated, by the pipeline.
pub const NON_CRITICAL: &[&str] = &[
    "api/notifications/poll",
    "api/telemetry",
    "api/stats/summary",
];

fn normalize(endpoint: &str) -> &str {
    endpoint.trim_start_matches('/')
}

/// True for the login, renewal, and logout endpoints. An auth failure on one
/// of these fails straight through to the caller; invoking the renewal flow
/// for them would deadlock on itself.
pub fn is_auth_endpoint(endpoint: &str) -> bool {
    let path = normalize(endpoint);
    path.starts_with(LOGIN) || path.starts_with(REFRESH) || path.starts_with(LOGOUT)
}

/// True for the logout endpoint specifically. A rejected logout still ends
/// with cleared credentials, but the user asked to leave; it must not raise
/// the forced re-login signal.
pub fn is_logout_endpoint(endpoint: &str) -> bool {
    normalize(endpoint).starts_with(LOGOUT)
}

/// True if the endpoint is in the non-critical allow-list (prefix match).
pub fn is_non_critical(endpoint: &str) -> bool {
    let path = normalize(endpoint);
    NON_CRITICAL.iter().any(|prefix| path.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// Auth endpoints should match regardless of a leading slash.
    fn auth_endpoints_match_with_leading_slash() {
        assert!(is_auth_endpoint("/api/auth/login"));
        assert!(is_auth_endpoint("api/auth/refresh"));
        assert!(is_auth_endpoint("/api/auth/logout"));
    }

    #[test]
    /// Ordinary resource endpoints are not auth endpoints.
    fn resource_endpoints_are_not_auth() {
        assert!(!is_auth_endpoint("api/records/123"));
        assert!(!is_auth_endpoint("api/biometrics/fingerprints"));
    }

    #[test]
    /// Non-critical matching is a prefix match on the normalized path.
    fn non_critical_prefix_match() {
        assert!(is_non_critical("api/notifications/poll"));
        assert!(is_non_critical("/api/notifications/poll?since=42"));
        assert!(!is_non_critical("api/records/search"));
    }
}
