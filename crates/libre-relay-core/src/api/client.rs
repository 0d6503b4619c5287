//! API client for the LibreLinkUp REST API.
//!
//! `LibreClient` can only log in. A successful login consumes it and yields a
//! `LibreSession`, which owns the bearer token and is the only type that can
//! issue authorized requests. Dropping the session releases the connection
//! pool.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info};
use url::Url;

use crate::auth::{authorized_headers, client_headers, AuthToken, ClientIdentity, Credentials};
use crate::models::{
    AccountResponse, AccountUser, Connection, ConnectionsResponse, GlucoseSample, GraphResponse,
    LogbookResponse,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL (US region)
pub const DEFAULT_BASE_URL: &str = "https://api-us.libreview.io/";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "llu/auth/login";
const TERMS_PATH: &str = "auth/continue/tou";
const ACCOUNT_PATH: &str = "account";
const CONNECTIONS_PATH: &str = "llu/connections";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    status: Option<i64>,
    data: Option<LoginData>,
    error: Option<LoginFailure>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(rename = "authTicket")]
    auth_ticket: Option<AuthTicket>,
    step: Option<LoginStep>,
}

#[derive(Debug, Deserialize)]
struct AuthTicket {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginStep {
    #[serde(rename = "type")]
    step_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginFailure {
    message: Option<String>,
}

impl LoginResponse {
    fn into_token(self) -> Result<AuthToken, ApiError> {
        let (ticket, step) = match self.data {
            Some(data) => (data.auth_ticket, data.step),
            None => (None, None),
        };

        if let Some(token) = ticket.and_then(|t| t.token).filter(|t| !t.is_empty()) {
            return Ok(AuthToken::new(token));
        }

        let reason = if let Some(message) = self.error.and_then(|e| e.message) {
            message
        } else if let Some(step_type) = step.and_then(|s| s.step_type) {
            format!("additional login step required: {}", step_type)
        } else {
            "response has no data.authTicket.token".to_string()
        };
        Err(ApiError::Authentication(match self.status {
            Some(status) => format!("{} (status {})", reason, status),
            None => reason,
        }))
    }
}

/// Resolve an endpoint path against the base URL
fn endpoint(base_url: &Url, path: &str) -> Result<Url, ApiError> {
    base_url
        .join(path)
        .map_err(|e| ApiError::Transport(format!("invalid endpoint {}: {}", path, e)))
}

fn build_http_client(timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ApiError::network("Failed to build HTTP client", e))
}

/// Check if response is successful, returning an error with body if not.
pub(crate) async fn check_response(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}

/// Unauthenticated LibreLinkUp client.
pub struct LibreClient {
    client: Client,
    base_url: Url,
    identity: ClientIdentity,
}

impl LibreClient {
    /// Create a new client. `timeout` applies to every request.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url,
            identity: ClientIdentity::default(),
        })
    }

    /// Override the `version`/`product` client identification headers
    pub fn with_identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Send credentials to the login endpoint and return the bearer token.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        let url = endpoint(&self.base_url, LOGIN_PATH)?;
        debug!(url = %url, email = %credentials.email(), "Logging in");

        let response = self
            .client
            .post(url)
            .headers(client_headers(&self.identity)?)
            .json(credentials)
            .send()
            .await
            .map_err(|e| ApiError::network("Failed to send login request", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::login_rejected(status, &body));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network("Failed to read login response", e))?;
        let parsed: LoginResponse = serde_json::from_str(&text).map_err(|e| {
            ApiError::Authentication(format!("unexpected login response: {}", e))
        })?;

        parsed.into_token()
    }

    /// Authenticate and turn this client into an authorized session.
    pub async fn login(self, credentials: &Credentials) -> Result<LibreSession, ApiError> {
        let token = self.authenticate(credentials).await?;
        let headers = authorized_headers(&self.identity, &token)?;
        info!(email = %credentials.email(), "Logged in to LibreLinkUp");

        Ok(LibreSession {
            client: self.client,
            base_url: self.base_url,
            token,
            headers,
        })
    }
}

/// Authorized LibreLinkUp session.
pub struct LibreSession {
    client: Client,
    base_url: Url,
    token: AuthToken,
    headers: HeaderMap,
}

impl LibreSession {
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    async fn read_json<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, ApiError> {
        let response = check_response(response).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network("Failed to read response body", e))?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::MalformedResponse(format!("{}: {}", url.path(), e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = endpoint(&self.base_url, path)?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url.clone())
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| ApiError::network(&format!("Failed to send GET request to {}", url), e))?;

        Self::read_json(response, &url).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = endpoint(&self.base_url, path)?;
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(url.clone())
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| ApiError::network(&format!("Failed to send POST request to {}", url), e))?;

        Self::read_json(response, &url).await
    }

    // ===== Data Fetching Methods =====

    /// Fetch the glucose graph (latest reading plus recent series) for a connection
    pub async fn graph(&self, connection_id: &str) -> Result<GraphResponse, ApiError> {
        let graph: GraphResponse = self
            .get(&format!("llu/connections/{}/graph", connection_id))
            .await?;
        debug!(samples = graph.series().len(), "Fetched graph");
        Ok(graph)
    }

    /// Fetch the logbook entries for a connection
    pub async fn logbook(&self, connection_id: &str) -> Result<Vec<GlucoseSample>, ApiError> {
        let logbook: LogbookResponse = self
            .get(&format!("llu/connections/{}/logbook", connection_id))
            .await?;
        Ok(logbook.data)
    }

    /// Fetch the patients this account follows
    pub async fn connections(&self) -> Result<Vec<Connection>, ApiError> {
        let response: ConnectionsResponse = self.get(CONNECTIONS_PATH).await?;
        Ok(response.data)
    }

    /// Fetch the logged-in account
    pub async fn account(&self) -> Result<AccountUser, ApiError> {
        let response: AccountResponse = self.get(ACCOUNT_PATH).await?;
        Ok(response.data.user)
    }

    /// Accept the terms of use when the API asks for it
    pub async fn accept_terms(&self) -> Result<serde_json::Value, ApiError> {
        self.post(TERMS_PATH).await
    }
}

impl Drop for LibreSession {
    fn drop(&mut self) {
        debug!("Closing LibreLinkUp HTTP session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> LibreClient {
        let base = Url::parse(&server.base_url()).expect("mock server URL");
        LibreClient::new(base, Duration::from_secs(5)).expect("client should build")
    }

    fn credentials() -> Credentials {
        Credentials::new("me@example.com", "hunter2")
    }

    fn sample(ts: &str, value: f64) -> serde_json::Value {
        json!({"Timestamp": ts, "Value": value, "isHigh": false, "isLow": false})
    }

    #[test]
    fn test_login_response_token() {
        let parsed: LoginResponse =
            serde_json::from_str(r#"{"data":{"authTicket":{"token":"abc"}}}"#).unwrap();
        assert_eq!(parsed.into_token().unwrap(), AuthToken::new("abc"));
    }

    #[test]
    fn test_login_response_without_token() {
        let parsed: LoginResponse =
            serde_json::from_str(r#"{"status":2,"error":{"message":"notAuthenticated"}}"#).unwrap();
        let err = parsed.into_token().unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
        assert!(err.to_string().contains("notAuthenticated"));
    }

    #[test]
    fn test_login_response_terms_step() {
        let parsed: LoginResponse =
            serde_json::from_str(r#"{"status":4,"data":{"step":{"type":"tou"}}}"#).unwrap();
        let msg = parsed.into_token().unwrap_err().to_string();
        assert!(msg.contains("additional login step required: tou"));
        assert!(msg.contains("status 4"));
    }

    #[test]
    fn test_endpoint_joins_base() {
        let base = Url::parse(DEFAULT_BASE_URL).unwrap();
        assert_eq!(
            endpoint(&base, LOGIN_PATH).unwrap().as_str(),
            "https://api-us.libreview.io/llu/auth/login"
        );
    }

    #[tokio::test]
    async fn test_authenticate_returns_token() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/llu/auth/login")
                    .header("version", "4.7")
                    .header("product", "llu.ios")
                    .json_body(json!({"email": "me@example.com", "password": "hunter2"}));
                then.status(200)
                    .json_body(json!({"data": {"authTicket": {"token": "abc"}}}));
            })
            .await;

        let token = client_for(&server).authenticate(&credentials()).await.unwrap();
        assert_eq!(token.as_str(), "abc");
        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_authenticate_unauthorized() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/llu/auth/login");
                then.status(401).body("bad credentials");
            })
            .await;

        let err = client_for(&server).authenticate(&credentials()).await.unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_authenticate_malformed_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/llu/auth/login");
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let err = client_for(&server).authenticate(&credentials()).await.unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_session_sends_bearer_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/llu/auth/login");
                then.status(200)
                    .json_body(json!({"data": {"authTicket": {"token": "abc"}}}));
            })
            .await;
        let series: Vec<_> = (0..12)
            .map(|i| sample(&format!("1/2/2024 2:{:02}:00 PM", i * 5), 100.0 + i as f64))
            .collect();
        let graph = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/llu/connections/p1/graph")
                    .header("authorization", "Bearer abc")
                    .header("accept", "application/json");
                then.status(200).json_body(json!({
                    "data": {
                        "connection": {"patientId": "p1", "glucoseItem": sample("1/2/2024 3:00:00 PM", 115.0)},
                        "graphData": series,
                    }
                }));
            })
            .await;

        let session = client_for(&server).login(&credentials()).await.unwrap();
        assert_eq!(session.token().as_str(), "abc");

        let response = session.graph("p1").await.unwrap();
        graph.assert_async().await;
        assert_eq!(response.series().len(), 12);
        assert_eq!(response.data.connection.glucose_item.value_f64(), 115.0);
    }

    #[tokio::test]
    async fn test_graph_missing_series_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/llu/auth/login");
                then.status(200)
                    .json_body(json!({"data": {"authTicket": {"token": "abc"}}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/llu/connections/p1/graph");
                then.status(200).json_body(json!({"data": {"connection": {}}}));
            })
            .await;

        let session = client_for(&server).login(&credentials()).await.unwrap();
        let err = session.graph("p1").await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_graph_error_status_is_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/llu/auth/login");
                then.status(200)
                    .json_body(json!({"data": {"authTicket": {"token": "abc"}}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/llu/connections/p1/graph");
                then.status(503).body("down for maintenance");
            })
            .await;

        let session = client_for(&server).login(&credentials()).await.unwrap();
        let err = session.graph("p1").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("down for maintenance"));
    }

    #[tokio::test]
    async fn test_connections_account_logbook_and_terms() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/llu/auth/login");
                then.status(200)
                    .json_body(json!({"data": {"authTicket": {"token": "abc"}}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/llu/connections").header("authorization", "Bearer abc");
                then.status(200)
                    .json_body(json!({"data": [{"patientId": "p1", "firstName": "Ada"}]}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/account").header("authorization", "Bearer abc");
                then.status(200).json_body(json!({"data": {"user": {"id": "u1"}}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/llu/connections/p1/logbook")
                    .header("authorization", "Bearer abc");
                then.status(200)
                    .json_body(json!({"data": [sample("1/2/2024 3:00:00 PM", 60.0)]}));
            })
            .await;
        let terms = server
            .mock_async(|when, then| {
                when.method(POST).path("/auth/continue/tou").header("authorization", "Bearer abc");
                then.status(200).json_body(json!({"status": 0}));
            })
            .await;

        let session = client_for(&server).login(&credentials()).await.unwrap();

        let connections = session.connections().await.unwrap();
        assert_eq!(connections[0].patient_id, "p1");
        assert_eq!(session.account().await.unwrap().id, "u1");
        assert_eq!(session.logbook("p1").await.unwrap()[0].value_f64(), 60.0);
        assert_eq!(session.accept_terms().await.unwrap()["status"], 0);
        terms.assert_async().await;
    }
}
