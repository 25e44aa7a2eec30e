use reqwest::Method;
use serde_json::json;

use blush_types::api::{
    AdminUserDetail, AdminUserList, AdminUserSummary, BanRequest, MetricsOverview,
    ResetPassesRequest, ResetPassesResponse, SetToggleRequest, StatusAck, TogglesResponse,
};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub async fn admin_metrics(&self) -> Result<MetricsOverview> {
        self.send_json(self.request(Method::GET, "/admin/metrics/overview"))
            .await
    }

    pub async fn admin_users(&self) -> Result<Vec<AdminUserSummary>> {
        let list: AdminUserList = self
            .send_json(self.request(Method::GET, "/admin/users"))
            .await?;
        Ok(list.into_users())
    }

    pub async fn admin_user(&self, user_id: &str) -> Result<AdminUserDetail> {
        let path = format!("/admin/users/{}", user_id);
        self.send_json(self.request(Method::GET, &path)).await
    }

    pub async fn admin_ban(&self, user_id: &str, reason: &str) -> Result<StatusAck> {
        let path = format!("/admin/users/{}/actions/ban", user_id);
        let body = BanRequest {
            reason: reason.to_string(),
        };
        self.send_json(self.request(Method::POST, &path).json(&body))
            .await
    }

    pub async fn admin_unban(&self, user_id: &str) -> Result<StatusAck> {
        let path = format!("/admin/users/{}/actions/unban", user_id);
        self.send_json(self.request(Method::POST, &path).json(&json!({})))
            .await
    }

    pub async fn admin_reset_passes(&self, user_id: &str, count: u32) -> Result<ResetPassesResponse> {
        let path = format!("/admin/users/{}/actions/reset-passes", user_id);
        let body = ResetPassesRequest { count };
        self.send_json(self.request(Method::POST, &path).json(&body))
            .await
    }

    pub async fn admin_toggles(&self) -> Result<TogglesResponse> {
        self.send_json(self.request(Method::GET, "/admin/toggles"))
            .await
    }

    pub async fn admin_set_toggle(&self, key: &str, value: &str) -> Result<()> {
        let body = SetToggleRequest {
            key: key.to_string(),
            value: value.to_string(),
        };
        self.send_empty(self.request(Method::POST, "/admin/toggles").json(&body))
            .await
    }
}
