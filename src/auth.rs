//! Wire shapes for the auth endpoints.
//!
//! The backend speaks the JavaScript casing convention, so every shape here
//! is camelCase on the wire.

use crate::credentials::UserRecord;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of the renewal call: `{ "refreshToken": "..." }`.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response of the renewal call. The refresh token is optional; when the
/// server omits it the previously stored one stays valid.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// Requests serialize with camelCase field names.
    fn refresh_request_is_camel_case() {
        let request = RefreshRequest {
            refresh_token: "r1".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "refreshToken": "r1" }));
    }

    #[test]
    /// The renewal response tolerates an omitted refresh token.
    fn token_response_refresh_token_is_optional() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"accessToken":"a1"}"#).unwrap();
        assert_eq!(response.access_token, "a1");
        assert!(response.refresh_token.is_none());
    }

    #[test]
    /// The login response carries the token pair and the user record.
    fn login_response_decodes() {
        let response: LoginResponse = serde_json::from_str(
            r#"{
                "accessToken": "a1",
                "refreshToken": "r1",
                "user": { "id": "u1", "username": "examiner", "role": "admin" }
            }"#,
        )
        .unwrap();
        assert_eq!(response.user.id, "u1");
        assert_eq!(response.refresh_token.as_deref(), Some("r1"));
    }
}
