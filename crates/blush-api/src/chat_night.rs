use reqwest::Method;

use blush_types::api::{
    ChatNightStatusResponse, EngageRequest, EnterPoolResponse, MyRoomResponse, RoomResponse,
    StatusAck,
};

use crate::client::ApiClient;
use crate::error::Result;

impl ApiClient {
    pub async fn chat_night_status(&self) -> Result<ChatNightStatusResponse> {
        self.send_json(self.request(Method::GET, "/chat-night/status"))
            .await
    }

    pub async fn enter_pool(&self) -> Result<EnterPoolResponse> {
        self.send_json(self.request(Method::POST, "/chat-night/enter"))
            .await
    }

    pub async fn leave_pool(&self) -> Result<()> {
        self.send_empty(self.request(Method::POST, "/chat-night/leave"))
            .await
    }

    pub async fn my_room(&self) -> Result<MyRoomResponse> {
        self.send_json(self.request(Method::GET, "/chat-night/my-room"))
            .await
    }

    pub async fn room(&self, room_id: &str) -> Result<RoomResponse> {
        let path = format!("/chat-night/room/{}", room_id);
        self.send_json(self.request(Method::GET, &path)).await
    }

    pub async fn engage(&self, room_id: &str) -> Result<StatusAck> {
        let body = EngageRequest {
            room_id: room_id.to_string(),
        };
        self.send_json(self.request(Method::POST, "/chat-night/engage").json(&body))
            .await
    }
}
