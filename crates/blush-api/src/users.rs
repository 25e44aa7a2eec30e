use reqwest::Method;

use blush_types::api::{ProfileUpdate, UserProfile};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub async fn me(&self) -> Result<UserProfile> {
        self.send_json(self.request(Method::GET, "/users/me")).await
    }

    pub async fn update_me(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        self.send_json(self.request(Method::PATCH, "/users/me").json(update))
            .await
    }
}
