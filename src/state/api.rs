// HTTP client for the payment backend: bearer auth, envelope unwrapping and
// status-to-error mapping.

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{ApiEnvelope, ApiErrorBody};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("backend rejected the session token")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Backend-provided explanation, when there is one worth showing.
    pub fn user_message(&self) -> Option<&str> {
        let message = match self {
            ApiError::Forbidden(msg) | ApiError::NotFound(msg) => Some(msg.as_str()),
            ApiError::Rejected { message, .. } => Some(message.as_str()),
            _ => None,
        };
        message.filter(|m| !m.is_empty())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, token: Option<&str>, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        token: Option<&str>,
        path: &str,
        query: &[(&'static str, String)],
    ) -> ApiResult<T> {
        let resp = self.request(Method::GET, token, path).query(query).send().await?;
        unwrap_envelope(path, resp).await
    }

    pub async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        token: Option<&str>,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let mut builder = self.request(method, token, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let resp = builder.send().await?;
        unwrap_envelope(path, resp).await
    }

    /// Requests whose success body is irrelevant (deletes).
    pub async fn send_no_content(&self, method: Method, token: Option<&str>, path: &str) -> ApiResult<()> {
        let resp = self.request(method, token, path).send().await?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(error_from_response(path, resp).await)
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(path: &str, resp: Response) -> ApiResult<T> {
    if !resp.status().is_success() {
        return Err(error_from_response(path, resp).await);
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice::<ApiEnvelope<T>>(&bytes)
        .map(|env| env.data)
        .map_err(|e| {
            warn!(path, error = %e, "could not decode backend response");
            ApiError::Decode(e.to_string())
        })
}

async fn error_from_response(path: &str, resp: Response) -> ApiError {
    let status = resp.status();
    let body: ApiErrorBody = resp.json().await.unwrap_or_default();
    let message = body.text().unwrap_or_default();
    debug!(path, status = status.as_u16(), %message, "backend error response");

    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        other => {
            if other.is_server_error() {
                warn!(path, status = other.as_u16(), "backend server error");
            }
            ApiError::Rejected {
                status: other.as_u16(),
                message,
            }
        }
    }
}
