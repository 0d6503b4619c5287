use std::fmt;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::api::ApiError;

/// Default `version` header expected by the LibreLinkUp API
pub const DEFAULT_CLIENT_VERSION: &str = "4.7";

/// Default `product` header expected by the LibreLinkUp API
pub const DEFAULT_CLIENT_PRODUCT: &str = "llu.ios";

/// Bearer token returned by a successful login. Valid for one run.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Client identification sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub version: String,
    pub product: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            version: DEFAULT_CLIENT_VERSION.to_string(),
            product: DEFAULT_CLIENT_PRODUCT.to_string(),
        }
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|_| ApiError::InvalidHeader(format!("invalid characters in {} header", name)))
}

/// Headers sent on every request, including login.
pub fn client_headers(identity: &ClientIdentity) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("version"),
        header_value("version", &identity.version)?,
    );
    headers.insert(
        HeaderName::from_static("product"),
        header_value("product", &identity.product)?,
    );
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Client headers plus `Authorization: Bearer <token>`.
pub fn authorized_headers(
    identity: &ClientIdentity,
    token: &AuthToken,
) -> Result<HeaderMap, ApiError> {
    let mut headers = client_headers(identity)?;
    // The token comes from the login response, so a bad one is the server's fault
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.as_str())).map_err(|_| {
        ApiError::MalformedResponse("login token contains invalid header characters".to_string())
    })?;
    bearer.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, bearer);
    Ok(headers)
}
