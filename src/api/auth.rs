//! Authentication endpoints

use async_trait::async_trait;

use super::{read_json, ApiClient, AuthApi};
use crate::{
    error::ApiResult,
    models::{AuthResponse, Credentials, UserProfile},
};

impl ApiClient {
    async fn post_credentials(&self, path: &str, username: &str, password: &str) -> ApiResult<AuthResponse> {
        let response = self
            .http
            .post(self.url(path))
            .json(&Credentials { username, password })
            .send()
            .await?;

        read_json(response).await
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        tracing::debug!("POST login/ for user {}", username);
        self.post_credentials("login/", username, password).await
    }

    async fn register(&self, username: &str, password: &str) -> ApiResult<AuthResponse> {
        tracing::debug!("POST register/ for user {}", username);
        self.post_credentials("register/", username, password).await
    }

    async fn me(&self, token: &str) -> ApiResult<UserProfile> {
        tracing::debug!("GET me/");
        let response = self.http.get(self.url("me/")).bearer_auth(token).send().await?;
        read_json(response).await
    }
}
