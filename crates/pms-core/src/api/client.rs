//! API client for communicating with the property management backend.
//!
//! This module provides the `ApiClient` struct: a thin pass-through over
//! `reqwest` that attaches the bearer token to every request and turns
//! non-2xx responses into `ApiError`s. It never retries and never caches.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{AuthService, Credentials, TokenPair};
use crate::models::{Attachment, Registration};

use super::error::{ApiError, ApiResult};

// ============================================================================
// Constants
// ============================================================================

/// Default backend origin used by the development server.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const TOKEN_PATH: &str = "api/token/";
const TOKEN_REFRESH_PATH: &str = "api/token/refresh/";
const REGISTER_PATH: &str = "api/register/";
const RESET_REQUEST_PATH: &str = "api/request-reset-email/";
// No trailing slash: the backend routes it that way.
const RESET_COMPLETE_PATH: &str = "api/password-reset-complete";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// The refresh endpoint rotates refresh tokens, but tolerate a server that
/// only hands back a new access token.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    refresh: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResetEmailRequest<'a> {
    email: &'a str,
    redirect_url: &'a str,
}

#[derive(Debug, Serialize)]
struct ResetCompleteRequest<'a> {
    password: &'a str,
    token: &'a str,
    uidb64: &'a str,
}

/// API client for the property management backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client for the given backend origin
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let mut base_url = base_url.trim().to_string();
        if base_url.is_empty() {
            return Err(ApiError::InvalidRequest("API URL is empty".to_string()));
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: Option<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response, path: &str) -> ApiResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, path, "Request failed");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> ApiResult<Response> {
        debug!(path, authenticated = self.token.is_some(), "Sending request");
        let response = builder.send().await?;
        Self::check_response(response, path).await
    }

    async fn parse<T: DeserializeOwned>(response: Response, path: &str) -> ApiResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    /// Parse a confirmation body, which may legitimately be empty.
    async fn parse_confirmation(response: Response, path: &str) -> ApiResult<serde_json::Value> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.send(self.request(Method::GET, path), path).await?;
        Self::parse(response, path).await
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ApiResult<serde_json::Value> {
        let response = self
            .send(self.request(method, path).json(body), path)
            .await?;
        Self::parse_confirmation(response, path).await
    }

    pub(crate) async fn send_form(
        &self,
        method: Method,
        path: &str,
        form: multipart::Form,
    ) -> ApiResult<serde_json::Value> {
        let response = self
            .send(self.request(method, path).multipart(form), path)
            .await?;
        Self::parse_confirmation(response, path).await
    }

    // ===== Authentication =====

    /// Exchange email + password for a token pair
    pub async fn obtain_token_pair(&self, credentials: &Credentials) -> ApiResult<TokenPair> {
        let response = self
            .send(
                self.client.post(self.url(TOKEN_PATH)).json(credentials),
                TOKEN_PATH,
            )
            .await?;
        Self::parse(response, TOKEN_PATH).await
    }

    /// Exchange a refresh token for a new pair
    pub async fn refresh_token_pair(&self, refresh: &str) -> ApiResult<TokenPair> {
        let response = self
            .send(
                self.client
                    .post(self.url(TOKEN_REFRESH_PATH))
                    .json(&RefreshRequest { refresh }),
                TOKEN_REFRESH_PATH,
            )
            .await?;
        let renewed: RefreshResponse = Self::parse(response, TOKEN_REFRESH_PATH).await?;
        Ok(TokenPair {
            access: renewed.access,
            refresh: renewed.refresh.unwrap_or_else(|| refresh.to_string()),
        })
    }

    /// Create a new account
    pub async fn register(&self, registration: &Registration) -> ApiResult<serde_json::Value> {
        let form = text_form(registration.form_fields());
        let response = self
            .send(
                self.client.post(self.url(REGISTER_PATH)).multipart(form),
                REGISTER_PATH,
            )
            .await?;
        Self::parse_confirmation(response, REGISTER_PATH).await
    }

    /// Ask the backend to email a password reset link
    pub async fn request_password_reset(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> ApiResult<serde_json::Value> {
        let body = ResetEmailRequest {
            email,
            redirect_url,
        };
        let response = self
            .send(
                self.client.post(self.url(RESET_REQUEST_PATH)).json(&body),
                RESET_REQUEST_PATH,
            )
            .await?;
        Self::parse_confirmation(response, RESET_REQUEST_PATH).await
    }

    /// Set a new password using the uidb64/token pair from the reset link
    pub async fn complete_password_reset(
        &self,
        password: &str,
        token: &str,
        uidb64: &str,
    ) -> ApiResult<serde_json::Value> {
        let body = ResetCompleteRequest {
            password,
            token,
            uidb64,
        };
        let response = self
            .send(
                self.client.patch(self.url(RESET_COMPLETE_PATH)).json(&body),
                RESET_COMPLETE_PATH,
            )
            .await?;
        Self::parse_confirmation(response, RESET_COMPLETE_PATH).await
    }
}

#[async_trait]
impl AuthService for ApiClient {
    async fn obtain_pair(&self, credentials: &Credentials) -> ApiResult<TokenPair> {
        self.obtain_token_pair(credentials).await
    }

    async fn refresh_pair(&self, refresh: &str) -> ApiResult<TokenPair> {
        self.refresh_token_pair(refresh).await
    }
}

/// Build a multipart form out of plain text fields.
pub(crate) fn text_form(fields: Vec<(&'static str, String)>) -> multipart::Form {
    fields
        .into_iter()
        .fold(multipart::Form::new(), |form, (name, value)| form.text(name, value))
}

pub(crate) fn file_part(attachment: &Attachment) -> multipart::Part {
    multipart::Part::bytes(attachment.bytes.clone()).file_name(attachment.file_name.clone())
}
