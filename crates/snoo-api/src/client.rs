//! Authenticated HTTP client for the SNOO API.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use snoo_core::DayAggregate;

use crate::error::ApiError;
use crate::token::{Credentials, TokenCache, TokenSession};

/// Default request timeout for API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_BASE_URL: &str = "https://snoo-api.happiestbaby.com";
const CLIENT_USER_AGENT: &str = "SNOO/351 CFNetwork/1121.2 Darwin/19.2.0";

pub const LOGIN_PATH: &str = "/us/login";
pub const STATUS_PATH: &str = "/ss/v2/sessions/last";
pub const AGGREGATED_PATH: &str = "/ss/v2/sessions/aggregated";

/// Layout of the aggregation endpoint's `startTime` parameter, at midnight.
const START_TIME_FORMAT: &str = "%m/%d/%Y 00:00:00";

/// How a failing status is reported for a request.
#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Login,
    Data,
}

impl Endpoint {
    fn status_error(self, status: String) -> ApiError {
        match self {
            Self::Login => ApiError::Authentication { status },
            Self::Data => ApiError::Api { status },
        }
    }

    /// Login responses carry tokens and stay out of the logs.
    const fn logs_body(self) -> bool {
        matches!(self, Self::Data)
    }
}

/// Connection settings for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// SNOO API client.
///
/// Holds the credentials and the current login token. Every authenticated
/// request goes through [`Client::token`], which logs in again once the
/// cached token has expired.
///
/// # Thread Safety
///
/// Token refresh is single-flight: callers that find the token stale queue
/// on an async lock, and only the first of them logs in.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    cache: Mutex<TokenCache>,
    refresh: tokio::sync::Mutex<()>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client for the production API.
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        Self::with_options(credentials, ClientOptions::default())
    }

    /// Creates a client with custom connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the username or password is empty, if the base
    /// URL does not parse, or if the HTTP client fails to build.
    pub fn with_options(credentials: Credentials, options: ClientOptions) -> Result<Self, ApiError> {
        if credentials.username().trim().is_empty() {
            return Err(ApiError::InvalidCredentials {
                reason: "username cannot be empty",
            });
        }
        if credentials.password().is_empty() {
            return Err(ApiError::InvalidCredentials {
                reason: "password cannot be empty",
            });
        }

        let base_url = Url::parse(&options.base_url).map_err(|err| ApiError::InvalidBaseUrl {
            url: options.base_url.clone(),
            reason: err.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(ApiError::ClientBuild)?;

        Ok(Self {
            http,
            base_url,
            credentials,
            cache: Mutex::new(TokenCache::default()),
            refresh: tokio::sync::Mutex::new(()),
        })
    }

    /// Logs in with the stored credentials and caches the new token.
    ///
    /// The expiry is measured from the moment the request was sent.
    pub async fn acquire_token(&self) -> Result<TokenSession, ApiError> {
        tracing::debug!(username = self.credentials.username(), "requesting new token");
        let issued_at = Utc::now();
        let body = serde_json::to_value(&self.credentials)?;

        let builder = self.build(Method::POST, LOGIN_PATH, &[], Some(&body));
        let session: TokenSession = self.execute(builder, Endpoint::Login).await?;

        let cache = TokenCache::issued(session.clone(), issued_at);
        tracing::debug!(expires_at = %cache.expires_at(), "token acquired");
        *self.lock_cache() = cache;
        Ok(session)
    }

    /// True if a token is cached and has not yet expired.
    pub fn has_valid_token(&self) -> bool {
        self.lock_cache().is_valid_at(Utc::now())
    }

    /// The cached access token, if it is usable right now.
    pub fn valid_token(&self) -> Option<String> {
        self.lock_cache()
            .access_token_at(Utc::now())
            .map(str::to_string)
    }

    /// Returns a usable access token, logging in first if needed.
    pub async fn token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.valid_token() {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(token) = self.valid_token() {
            return Ok(token);
        }
        Ok(self.acquire_token().await?.access_token)
    }

    /// Sends an authenticated request and decodes the JSON response.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let token = self.token().await?;
        let builder = self.build(method, path, query, body).bearer_auth(token);
        self.execute(builder, Endpoint::Data).await
    }

    /// Sends a request without a bearer token and decodes the JSON response.
    pub async fn request_unauthenticated<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let builder = self.build(method, path, query, body);
        self.execute(builder, Endpoint::Data).await
    }

    /// Current device status, returned verbatim.
    pub async fn status(&self) -> Result<Value, ApiError> {
        self.request(Method::GET, STATUS_PATH, &[], None).await
    }

    /// Aggregated totals and levels for one calendar day.
    pub async fn aggregate(&self, date: NaiveDate) -> Result<DayAggregate, ApiError> {
        let start_time = date.format(START_TIME_FORMAT).to_string();
        self.request(Method::GET, AGGREGATED_PATH, &[("startTime", start_time)], None)
            .await
    }

    fn build(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> RequestBuilder {
        let mut url = self.base_url.clone();
        url.set_path(path);
        tracing::debug!(%method, path, "sending request");

        let mut builder = self
            .http
            .request(method, url)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        endpoint: Endpoint,
    ) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(ApiError::Transport)?;

        // Read the whole body before looking at the status so the
        // connection can go back to the pool.
        let status = response.status();
        let body = response.bytes().await.map_err(ApiError::Transport)?;
        if endpoint.logs_body() {
            tracing::trace!(%status, body = %String::from_utf8_lossy(&body), "received response");
        } else {
            tracing::trace!(%status, len = body.len(), "received response");
        }

        if status.as_u16() >= 400 {
            return Err(endpoint.status_error(status.to_string()));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, TokenCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("parent@example.com", "hunter2")
    }

    fn client_for(server: &MockServer) -> Client {
        let options = ClientOptions {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        };
        Client::with_options(credentials(), options).unwrap()
    }

    fn login_response(expires_in: i64) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-abc",
            "expires_in": expires_in,
            "refresh_token": "refresh-def",
        }))
    }

    #[test]
    fn client_rejects_empty_username() {
        assert!(matches!(
            Client::new(Credentials::new("  ", "pw")),
            Err(ApiError::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn client_rejects_empty_password() {
        assert!(matches!(
            Client::new(Credentials::new("user", "")),
            Err(ApiError::InvalidCredentials { .. })
        ));
    }

    #[test]
    fn client_rejects_bad_base_url() {
        let options = ClientOptions {
            base_url: "not a url".to_string(),
            ..ClientOptions::default()
        };
        assert!(matches!(
            Client::with_options(credentials(), options),
            Err(ApiError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn client_debug_redacts_password() {
        let client = Client::new(credentials()).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn new_client_has_no_valid_token() {
        let client = Client::new(credentials()).unwrap();
        assert!(!client.has_valid_token());
        assert_eq!(client.valid_token(), None);
    }

    #[tokio::test]
    async fn acquire_token_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(header("user-agent", CLIENT_USER_AGENT))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "username": "parent@example.com",
                "password": "hunter2",
            })))
            .respond_with(login_response(10_800))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let session = client.acquire_token().await.unwrap();

        assert_eq!(session.access_token, "token-abc");
        assert_eq!(session.refresh_token, "refresh-def");
        assert!(client.has_valid_token());
    }

    #[tokio::test]
    async fn rejected_login_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.acquire_token().await.unwrap_err();

        match err {
            ApiError::Authentication { status } => assert_eq!(status, "401 Unauthorized"),
            other => panic!("expected authentication error, got {other:?}"),
        }
        assert!(!client.has_valid_token());
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_on_next_request() {
        let server = MockServer::start().await;
        // Zero lifetime: valid from nothing, so every call logs in again.
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(login_response(0))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.status().await.unwrap();
        assert!(!client.has_valid_token());
        client.status().await.unwrap();
    }

    #[tokio::test]
    async fn valid_token_is_reused_across_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(login_response(10_800))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server);
        for _ in 0..3 {
            client.status().await.unwrap();
        }
    }

    #[tokio::test]
    async fn concurrent_stale_callers_log_in_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(login_response(10_800).set_delay(Duration::from_millis(100)))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let (a, b, c) = tokio::join!(client.token(), client.token(), client.token());

        assert_eq!(a.unwrap(), "token-abc");
        assert_eq!(b.unwrap(), "token-abc");
        assert_eq!(c.unwrap(), "token-abc");
    }

    #[tokio::test]
    async fn status_returns_body_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(login_response(10_800))
            .mount(&server)
            .await;
        let status = json!({
            "levels": [{"type": "asleep"}],
            "snoo": {"serialNumber": "ABC123"},
        });
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(status.clone()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.status().await.unwrap(), status);
    }

    #[tokio::test]
    async fn aggregate_sends_formatted_start_time() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(login_response(10_800))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(AGGREGATED_PATH))
            .and(query_param("startTime", "08/24/2020 00:00:00"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "naps": 3,
                "timezone": "America/Los_Angeles",
                "levels": [],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let date = NaiveDate::from_ymd_opt(2020, 8, 24).unwrap();
        let day = client.aggregate(date).await.unwrap();

        assert_eq!(day.naps, 3);
        assert_eq!(day.timezone, "America/Los_Angeles");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(login_response(10_800))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        match client.status().await.unwrap_err() {
            ApiError::Api { status } => assert_eq!(status, "503 Service Unavailable"),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/some/path"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result: Result<Value, _> = client
            .request_unauthenticated(Method::GET, "/some/path", &[], None)
            .await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }

    #[tokio::test]
    async fn invalid_utf8_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/some/path"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                b"{\"a\":\"\xff\xfe\"}".to_vec(),
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result: Result<Value, _> = client
            .request_unauthenticated(Method::GET, "/some/path", &[], None)
            .await;
        assert!(matches!(result, Err(ApiError::Decode(_))), "{result:?}");
    }

    #[test]
    fn login_bodies_are_not_logged() {
        assert!(!Endpoint::Login.logs_body());
        assert!(Endpoint::Data.logs_body());
    }

    #[tokio::test]
    async fn unauthenticated_request_decodes_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/some/path"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result: Value = client
            .request_unauthenticated(Method::GET, "/some/path", &[], None)
            .await
            .unwrap();
        assert_eq!(result["status"], "ok");
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Nothing listens on port 1.
        let options = ClientOptions {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(5),
        };
        let client = Client::with_options(credentials(), options).unwrap();
        assert!(matches!(
            client.acquire_token().await,
            Err(ApiError::Transport(_))
        ));
    }
}
