#![allow(dead_code)]

//! Scripted in-process backend for driving controllers without HTTP.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use blush_api::ApiError;
use blush_api::error::Result;
use blush_client::Context;
use blush_client::backend::{AccountApi, ChatNightApi, ProfileApi, RoomApi, ThreadApi};
use blush_store::Store;
use blush_types::api::{
    ChatNightStatusResponse, EnterPoolResponse, MessagePage, MessageResponse, MyRoomResponse,
    PartnerEnvelope, PartnerProfile, ProfileUpdate, RoomResponse, StatusAck, ThreadList,
    TokenResponse, UserProfile,
};
use blush_types::events::ClientEvent;

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16, String),
    Network,
}

impl Reply {
    pub fn ok(v: Value) -> Self {
        Self::Json(v)
    }

    pub fn status(code: u16, body: Value) -> Self {
        Self::Status(code, body.to_string())
    }

    fn resolve<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Json(v) => Ok(serde_json::from_value(v)?),
            Self::Status(code, body) => Err(ApiError::from_response(code, &body)),
            Self::Network => Err(ApiError::Decode(
                serde_json::from_str::<Value>("<connection reset>").unwrap_err(),
            )),
        }
    }
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, VecDeque<Reply>>,
    delays: HashMap<String, Duration>,
    calls: HashMap<String, usize>,
    messages: Vec<Value>,
    sent: usize,
}

/// Each endpoint replays its script in order; the last reply repeats.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, endpoint: &str, replies: impl IntoIterator<Item = Reply>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(endpoint.to_string(), replies.into_iter().collect());
        self
    }

    pub fn delay(&self, endpoint: &str, d: Duration) -> &Self {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(endpoint.to_string(), d);
        self
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn push_message(&self, id: &str, text: &str, created_at: &str) {
        self.state.lock().unwrap().messages.push(json!({
            "id": id, "sender_id": "u2", "text": text, "created_at": created_at
        }));
    }

    fn take(&self, endpoint: &str) -> (Option<Reply>, Option<Duration>) {
        let mut state = self.state.lock().unwrap();
        *state.calls.entry(endpoint.to_string()).or_default() += 1;
        let reply = state.scripts.get_mut(endpoint).and_then(|q| {
            if q.len() > 1 { q.pop_front() } else { q.front().cloned() }
        });
        (reply, state.delays.get(endpoint).copied())
    }

    async fn call<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let (reply, delay) = self.take(endpoint);
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        reply
            .unwrap_or_else(|| Reply::status(404, json!({"detail": format!("no script for {}", endpoint)})))
            .resolve()
    }
}

impl AccountApi for FakeBackend {
    async fn register(&self, _phone: &str, _password: &str) -> Result<TokenResponse> {
        self.call("register").await
    }

    async fn login(&self, _phone: &str, _password: &str) -> Result<TokenResponse> {
        self.call("login").await
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile> {
        self.call(&format!("me:{}", token)).await
    }
}

impl ProfileApi for FakeBackend {
    async fn update_profile(&self, _update: &ProfileUpdate) -> Result<UserProfile> {
        self.call("update_me").await
    }

    async fn discover(&self, _limit: u32) -> Result<Vec<UserProfile>> {
        self.call("discovery").await
    }
}

impl ChatNightApi for FakeBackend {
    async fn status(&self) -> Result<ChatNightStatusResponse> {
        self.call("status").await
    }

    async fn enter(&self) -> Result<EnterPoolResponse> {
        self.call("enter").await
    }

    async fn leave(&self) -> Result<()> {
        self.call::<Value>("leave").await.map(|_| ())
    }

    async fn my_room(&self) -> Result<MyRoomResponse> {
        self.call("my_room").await
    }
}

impl RoomApi for FakeBackend {
    async fn room(&self, _room_id: &str) -> Result<RoomResponse> {
        self.call("room").await
    }

    async fn engage(&self, _room_id: &str) -> Result<StatusAck> {
        self.call("engage").await
    }
}

impl ThreadApi for FakeBackend {
    async fn threads(&self) -> Result<ThreadList> {
        self.call("threads").await
    }

    /// Scripted pages win; otherwise the stored conversation is returned
    /// as a single page.
    async fn messages(
        &self,
        _thread_id: &str,
        _limit: u32,
        _before: Option<&str>,
    ) -> Result<MessagePage> {
        let scripted = self.state.lock().unwrap().scripts.contains_key("messages");
        if scripted {
            return self.call("messages").await;
        }
        let (_, delay) = self.take("messages");
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        let messages = self.state.lock().unwrap().messages.clone();
        Ok(serde_json::from_value(json!({"messages": messages, "next_cursor": null}))?)
    }

    async fn send(&self, _thread_id: &str, text: &str) -> Result<MessageResponse> {
        let (reply, delay) = self.take("send");
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if let Some(reply) = reply {
            return reply.resolve();
        }

        let mut state = self.state.lock().unwrap();
        state.sent += 1;
        let msg = json!({
            "id": format!("s{}", state.sent),
            "sender_id": "u1",
            "text": text,
            "created_at": chrono::Utc::now().to_rfc3339(),
        });
        state.messages.push(msg.clone());
        Ok(serde_json::from_value(msg)?)
    }

    async fn mark_read(&self, _thread_id: &str) -> Result<()> {
        self.call::<Value>("mark_read").await.map(|_| ())
    }

    async fn partner(&self, _thread_id: &str) -> Result<PartnerProfile> {
        self.call::<PartnerEnvelope>("partner")
            .await
            .map(PartnerEnvelope::into_profile)
    }
}

pub fn context() -> (Context, mpsc::UnboundedReceiver<ClientEvent>, Arc<Store>) {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let (ctx, rx) = Context::new(store.clone());
    (ctx, rx, store)
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

pub fn alert_titles(events: &[ClientEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ClientEvent::Alert { title, .. } => Some(title.clone()),
            _ => None,
        })
        .collect()
}

pub fn alert_messages(events: &[ClientEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            ClientEvent::Alert { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

pub async fn sleep_secs(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}
