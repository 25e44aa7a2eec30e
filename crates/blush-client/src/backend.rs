//! The slices of the HTTP API each controller needs.
//!
//! Controllers are generic over these so the state machines can be driven
//! by an in-process fake in tests. [`ApiClient`] implements all of them.

use std::future::Future;

use blush_api::ApiClient;
use blush_api::error::Result;
use blush_types::api::{
    ChatNightStatusResponse, EnterPoolResponse, MessagePage, MessageResponse, MyRoomResponse,
    PartnerProfile, ProfileUpdate, RoomResponse, StatusAck, ThreadList, TokenResponse,
    UserProfile,
};

/// Sign-up, sign-in and the profile fetch that validates a token.
pub trait AccountApi: Send + Sync + 'static {
    fn register(&self, phone: &str, password: &str)
    -> impl Future<Output = Result<TokenResponse>> + Send;

    fn login(&self, phone: &str, password: &str)
    -> impl Future<Output = Result<TokenResponse>> + Send;

    /// `GET /users/me` on behalf of `token`, whatever token the
    /// implementation otherwise carries.
    fn fetch_profile(&self, token: &str) -> impl Future<Output = Result<UserProfile>> + Send;
}

pub trait ProfileApi: Send + Sync + 'static {
    fn update_profile(&self, update: &ProfileUpdate)
    -> impl Future<Output = Result<UserProfile>> + Send;

    fn discover(&self, limit: u32) -> impl Future<Output = Result<Vec<UserProfile>>> + Send;
}

pub trait ChatNightApi: Send + Sync + 'static {
    fn status(&self) -> impl Future<Output = Result<ChatNightStatusResponse>> + Send;
    fn enter(&self) -> impl Future<Output = Result<EnterPoolResponse>> + Send;
    fn leave(&self) -> impl Future<Output = Result<()>> + Send;
    fn my_room(&self) -> impl Future<Output = Result<MyRoomResponse>> + Send;
}

pub trait RoomApi: Send + Sync + 'static {
    fn room(&self, room_id: &str) -> impl Future<Output = Result<RoomResponse>> + Send;
    fn engage(&self, room_id: &str) -> impl Future<Output = Result<StatusAck>> + Send;
}

pub trait ThreadApi: Send + Sync + 'static {
    fn threads(&self) -> impl Future<Output = Result<ThreadList>> + Send;

    fn messages(
        &self,
        thread_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> impl Future<Output = Result<MessagePage>> + Send;

    fn send(&self, thread_id: &str, text: &str)
    -> impl Future<Output = Result<MessageResponse>> + Send;

    fn mark_read(&self, thread_id: &str) -> impl Future<Output = Result<()>> + Send;

    fn partner(&self, thread_id: &str) -> impl Future<Output = Result<PartnerProfile>> + Send;
}

// -- HTTP implementations --

impl AccountApi for ApiClient {
    async fn register(&self, phone: &str, password: &str) -> Result<TokenResponse> {
        ApiClient::register(self, phone, password).await
    }

    async fn login(&self, phone: &str, password: &str) -> Result<TokenResponse> {
        ApiClient::login(self, phone, password).await
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile> {
        self.authenticated(token).me().await
    }
}

impl ProfileApi for ApiClient {
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        self.update_me(update).await
    }

    async fn discover(&self, limit: u32) -> Result<Vec<UserProfile>> {
        self.discovery(limit).await
    }
}

impl ChatNightApi for ApiClient {
    async fn status(&self) -> Result<ChatNightStatusResponse> {
        self.chat_night_status().await
    }

    async fn enter(&self) -> Result<EnterPoolResponse> {
        self.enter_pool().await
    }

    async fn leave(&self) -> Result<()> {
        self.leave_pool().await
    }

    async fn my_room(&self) -> Result<MyRoomResponse> {
        ApiClient::my_room(self).await
    }
}

impl RoomApi for ApiClient {
    async fn room(&self, room_id: &str) -> Result<RoomResponse> {
        ApiClient::room(self, room_id).await
    }

    async fn engage(&self, room_id: &str) -> Result<StatusAck> {
        ApiClient::engage(self, room_id).await
    }
}

impl ThreadApi for ApiClient {
    async fn threads(&self) -> Result<ThreadList> {
        ApiClient::threads(self).await
    }

    async fn messages(
        &self,
        thread_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> Result<MessagePage> {
        ApiClient::messages(self, thread_id, limit, before).await
    }

    async fn send(&self, thread_id: &str, text: &str) -> Result<MessageResponse> {
        self.send_message(thread_id, text).await
    }

    async fn mark_read(&self, thread_id: &str) -> Result<()> {
        ApiClient::mark_read(self, thread_id).await
    }

    async fn partner(&self, thread_id: &str) -> Result<PartnerProfile> {
        self.thread_partner(thread_id).await
    }
}
