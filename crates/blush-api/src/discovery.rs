use reqwest::Method;

use blush_types::api::UserProfile;

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub async fn discovery(&self, limit: u32) -> Result<Vec<UserProfile>> {
        let req = self
            .request(Method::GET, "/discovery")
            .query(&[("limit", limit)]);
        self.send_json(req).await
    }
}
