use reqwest::Method;

use blush_types::api::{LoginRequest, RegisterRequest, TokenResponse};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    /// `POST /auth/register`. A 409 surfaces as [`crate::ApiError::Conflict`].
    pub async fn register(&self, phone_number: &str, password: &str) -> Result<TokenResponse> {
        let body = RegisterRequest {
            phone_number: phone_number.to_string(),
            password: password.to_string(),
        };
        self.send_json(self.request(Method::POST, "/auth/register").json(&body))
            .await
    }

    pub async fn login(&self, phone_number: &str, password: &str) -> Result<TokenResponse> {
        let body = LoginRequest {
            phone_number: phone_number.to_string(),
            password: password.to_string(),
        };
        self.send_json(self.request(Method::POST, "/auth/login").json(&body))
            .await
    }
}
