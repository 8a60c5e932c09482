//! HTTP client with tracing and uniform failure mapping.
//!
//! Every request is tagged with a call name (`misoca.list_invoices`,
//! `gmail.token`, ...). Transport failures and non-2xx responses both
//! surface as [`FetchError::RemoteCall`] carrying that name and the
//! response body, so a single log line identifies the failing call.

use std::time::Duration;

use reqwest::{Client, Response, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::FetchError;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string for Invoicer.
const USER_AGENT: &str = concat!("Invoicer/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing and status checking.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates a new HTTP client with default settings.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a new HTTP client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                FetchError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { inner: client })
    }

    /// Performs a GET request with an authorization header.
    #[instrument(skip(self, auth_header), fields(url = %url))]
    pub async fn get_with_auth(
        &self,
        call: &str,
        url: &str,
        auth_header: &str,
    ) -> Result<Response, FetchError> {
        debug!("GET request with auth");

        let request = self
            .inner
            .get(url)
            .header(header::AUTHORIZATION, auth_header);
        send(call, request).await
    }

    /// Performs a POST request with a JSON body and an authorization header.
    #[instrument(skip(self, auth_header, body), fields(url = %url))]
    pub async fn post_json_with_auth<T: Serialize + ?Sized>(
        &self,
        call: &str,
        url: &str,
        auth_header: &str,
        body: &T,
    ) -> Result<Response, FetchError> {
        debug!("POST request with JSON");

        let request = self
            .inner
            .post(url)
            .header(header::AUTHORIZATION, auth_header)
            .json(body);
        send(call, request).await
    }

    /// Performs a POST request with form data.
    #[instrument(skip(self, form), fields(url = %url))]
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        call: &str,
        url: &str,
        form: &T,
    ) -> Result<Response, FetchError> {
        debug!("POST request with form data");

        let request = self.inner.post(url).form(form);
        send(call, request).await
    }
}

async fn send(call: &str, request: reqwest::RequestBuilder) -> Result<Response, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::transport(call, &e))?;
    debug!(status = %response.status(), "Response received");
    check_status(call, response).await
}

/// Turns a non-2xx response into [`FetchError::RemoteCall`] with the body as detail.
pub async fn check_status(call: &str, response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(call, %status, body = %body, "Remote call returned an error status");
    Err(FetchError::remote(call, format!("HTTP {status}: {body}")))
}

/// Decodes a JSON response body, reporting decode failures against `call`.
pub async fn read_json<T: DeserializeOwned>(call: &str, response: Response) -> Result<T, FetchError> {
    response
        .json::<T>()
        .await
        .map_err(|e| FetchError::remote(call, format!("invalid response body: {e}")))
}

/// Reads a binary response body.
pub async fn read_bytes(call: &str, response: Response) -> Result<Vec<u8>, FetchError> {
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| FetchError::transport(call, &e))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_with_auth_sends_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .and(header_eq("authorization", "Bearer A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/items", server.uri());
        let response = client.get_with_auth("test.items", &url, "Bearer A").await.unwrap();
        let items: Vec<i64> = read_json("test.items", response).await.unwrap();
        assert_eq!(items, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_non_2xx_is_remote_call_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/token", server.uri());
        let err = client
            .post_form("test.token", &url, &[("grant_type", "refresh_token")])
            .await
            .unwrap_err();

        match err {
            FetchError::RemoteCall { call, detail } => {
                assert_eq!(call, "test.token");
                assert!(detail.contains("500"));
                assert!(detail.contains("upstream exploded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_is_not_logged_as_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let (logs, _guard) = crate::testing::capture_warnings();
        let client = HttpClient::new().unwrap();
        let url = format!("{}/items", server.uri());
        let err = client.get_with_auth("test.items", &url, "Bearer A").await.unwrap_err();

        assert!(err.is_remote());
        assert_eq!(logs.contents(), "");
    }

    #[tokio::test]
    async fn test_post_form_encodes_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let url = format!("{}/token", server.uri());
        client
            .post_form(
                "test.token",
                &url,
                &[("grant_type", "authorization_code"), ("code", "abc123")],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_connection_failure_is_remote_call() {
        let client = HttpClient::with_timeout(Duration::from_secs(2)).unwrap();
        let err = client
            .get_with_auth("test.down", "http://127.0.0.1:9/nothing", "Bearer A")
            .await
            .unwrap_err();
        assert!(err.is_remote());
    }
}
