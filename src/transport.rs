//! The transport seam.
//!
//! `ApiRequest` describes one outbound call in replayable form (the renewal
//! flow resubmits a call after obtaining a fresh token, so the body must be
//! rebuildable). `Transport` is the trait the pipeline talks to; the real
//! implementation wraps reqwest, tests substitute a mock.

use crate::consts::client_consts;
use crate::error::TransportFailure;
use reqwest::multipart;
use reqwest::{Client, ClientBuilder};

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Copy, Clone, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartField {
    Text {
        name: String,
        value: String,
    },
    /// Binary payload (photo, fingerprint capture). The transport negotiates
    /// the content type; nothing is forced here.
    File {
        name: String,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<MultipartField>),
}

/// A replayable outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: RequestBody,
    /// Set the first time the call is replayed after a renewal; a request
    /// with this flag set must never trigger a second renewal.
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: RequestBody::Empty,
            retried: false,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Post, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Delete, endpoint)
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Executes one request/response exchange. Success means a 2xx status;
/// everything else comes back as a `TransportFailure`.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<String>,
    ) -> Result<TransportResponse, TransportFailure>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: ClientBuilder::new()
                .connect_timeout(client_consts::connect_timeout())
                .timeout(client_consts::request_timeout())
                .user_agent(client_consts::USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.into(),
        }
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn build_form(fields: &[MultipartField]) -> multipart::Form {
        let mut form = multipart::Form::new();
        for field in fields {
            form = match field {
                MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartField::File {
                    name,
                    file_name,
                    mime_type,
                    bytes,
                } => form.part(name.clone(), file_part(file_name, mime_type, bytes)),
            };
        }
        form
    }
}

fn file_part(file_name: &str, mime_type: &str, bytes: &[u8]) -> multipart::Part {
    let part = multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
    match part.mime_str(mime_type) {
        Ok(part) => part,
        // Invalid mime string: leave the type to the transport.
        Err(_) => multipart::Part::bytes(bytes.to_vec()).file_name(file_name.to_string()),
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<String>,
    ) -> Result<TransportResponse, TransportFailure> {
        let url = self.build_url(&request.endpoint);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(Self::build_form(fields)),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportFailure::from_reqwest(&e))?;

        if !response.status().is_success() {
            return Err(TransportFailure::from_response(response).await);
        }

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportFailure::from_reqwest(&e))?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// URL joining tolerates slashes on either side.
    fn build_url_normalizes_slashes() {
        let transport = HttpTransport::new("https://records.example.gov/");
        assert_eq!(
            transport.build_url("/api/records/1"),
            "https://records.example.gov/api/records/1"
        );
        assert_eq!(
            transport.build_url("api/records/1"),
            "https://records.example.gov/api/records/1"
        );
    }

    #[test]
    /// Methods render as their uppercase wire names.
    fn method_display_is_uppercase() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    /// A fresh request carries no retry marker.
    fn new_request_has_no_retry_marker() {
        let request = ApiRequest::get("api/records").with_json(serde_json::json!({}));
        assert!(!request.retried);
    }
}
