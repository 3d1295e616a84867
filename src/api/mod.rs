//! HTTP client for the book inventory REST API

pub mod auth;
pub mod books;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::{
    config::ApiConfig,
    error::{ApiError, ApiResult},
    models::{user::ErrorDetail, AuthResponse, BookDraft, BookRecord, FieldErrors, UserProfile},
};

/// Authentication endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /login/`
    async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse>;

    /// `POST /register/`
    async fn register(&self, username: &str, password: &str) -> ApiResult<AuthResponse>;

    /// `GET /me/` with the token as bearer credential
    async fn me(&self, token: &str) -> ApiResult<UserProfile>;
}

/// Book catalog endpoints. The bearer token is attached when present.
#[async_trait]
pub trait BooksApi: Send + Sync {
    async fn list_books(&self, token: Option<&str>) -> ApiResult<Vec<BookRecord>>;

    async fn create_book(&self, draft: &BookDraft, token: Option<&str>) -> ApiResult<BookRecord>;

    async fn update_book(&self, id: i64, draft: &BookDraft, token: Option<&str>) -> ApiResult<BookRecord>;

    async fn delete_book(&self, id: i64, token: Option<&str>) -> ApiResult<()>;
}

/// reqwest-backed implementation of [`AuthApi`] and [`BooksApi`]
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("book-inventory-admin/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

/// Decode a 2xx JSON body, or turn the response into an [`ApiError`]
async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Classify a non-2xx response by its body:
/// `{"detail": ...}` first, then a 4xx field map, else status only.
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => return ApiError::Transport(e),
    };

    if let Ok(ErrorDetail { detail }) = serde_json::from_slice(&body) {
        return ApiError::Status {
            status,
            detail: Some(detail),
        };
    }

    if status.is_client_error() {
        if let Some(errors) = FieldErrors::from_body(&body) {
            return ApiError::Validation { status, errors };
        }
    }

    ApiError::Status { status, detail: None }
}
