use reqwest::Method;

use blush_types::api::{
    MessagePage, MessageResponse, PartnerEnvelope, PartnerProfile, SendMessageRequest, ThreadList,
};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub async fn threads(&self) -> Result<ThreadList> {
        self.send_json(self.request(Method::GET, "/chat/threads"))
            .await
    }

    /// One page of messages, newest first. `before` is the `next_cursor` of
    /// the previous page.
    pub async fn messages(
        &self,
        thread_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> Result<MessagePage> {
        let path = format!("/chat/threads/{}/messages", thread_id);
        let mut req = self
            .request(Method::GET, &path)
            .query(&[("limit", limit.to_string())]);
        if let Some(cursor) = before {
            req = req.query(&[("before", cursor)]);
        }
        self.send_json(req).await
    }

    pub async fn send_message(&self, thread_id: &str, text: &str) -> Result<MessageResponse> {
        let path = format!("/chat/threads/{}/messages", thread_id);
        let body = SendMessageRequest {
            text: text.to_string(),
        };
        self.send_json(self.request(Method::POST, &path).json(&body))
            .await
    }

    pub async fn mark_read(&self, thread_id: &str) -> Result<()> {
        let path = format!("/chat/threads/{}/read", thread_id);
        self.send_empty(self.request(Method::POST, &path)).await
    }

    pub async fn thread_partner(&self, thread_id: &str) -> Result<PartnerProfile> {
        let path = format!("/chat/threads/{}/partner", thread_id);
        let envelope: PartnerEnvelope = self.send_json(self.request(Method::GET, &path)).await?;
        Ok(envelope.into_profile())
    }
}
