//! Chat Night screen: status polling, pool entry and the wait for a room.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use blush_api::ApiError;
use blush_types::api::ChatNightStatusResponse;
use blush_types::events::Route;
use blush_types::models::{ChatNightPhase, GateInfo};

use crate::backend::ChatNightApi;
use crate::context::Context;
use crate::poller::{Next, PollTask};

pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MY_ROOM_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_NEXT_SESSION: &str = "20:00";

const DEFAULT_GATE_MESSAGE: &str = "Profile completion required.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatNightState {
    pub phase: ChatNightPhase,
    pub passes_remaining: i64,
    /// Start time of the next session, as the server formats it
    pub next_session: String,
    pub gate: Option<GateInfo>,
    /// An `/enter` request is in flight
    pub entering: bool,
    /// The search was cancelled while `/enter` was in flight
    cancelled: bool,
}

impl Default for ChatNightState {
    fn default() -> Self {
        Self {
            phase: ChatNightPhase::Loading,
            passes_remaining: 0,
            next_session: DEFAULT_NEXT_SESSION.into(),
            gate: None,
            entering: false,
            cancelled: false,
        }
    }
}

/// Result of asking to enter the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Already entering or searching; nothing is sent
    Busy,
    /// The last status seen was not `open`
    NotOpen,
    NoPasses,
    Granted,
}

impl ChatNightState {
    pub fn apply_status(&mut self, status: &ChatNightStatusResponse) {
        self.passes_remaining = status.passes_left();

        if status.is_gated() {
            self.phase = ChatNightPhase::Gated;
            self.gate = Some(GateInfo {
                message: status
                    .detail
                    .clone()
                    .or_else(|| status.message.clone())
                    .unwrap_or_else(|| DEFAULT_GATE_MESSAGE.into()),
                missing_fields: status.missing_fields.clone(),
                required: status.min_completion,
                current: status.user_completion,
            });
            return;
        }
        self.gate = None;

        if status.is_open {
            if !matches!(
                self.phase,
                ChatNightPhase::Searching | ChatNightPhase::Open
            ) {
                self.phase = ChatNightPhase::Open;
            }
        } else {
            self.phase = ChatNightPhase::Closed;
            self.next_session = status
                .next_start
                .clone()
                .unwrap_or_else(|| DEFAULT_NEXT_SESSION.into());
        }
    }

    /// A failed status check never opens the screen. A 400 mentioning
    /// completion is the older backends' way of saying "gated".
    pub fn apply_status_error(&mut self, err: &ApiError) {
        if let ApiError::Validation(detail) = err {
            if detail.to_lowercase().contains("completion") {
                self.phase = ChatNightPhase::Gated;
                self.gate = Some(GateInfo {
                    message: detail.clone(),
                    ..Default::default()
                });
                return;
            }
        }

        if self.phase != ChatNightPhase::Gated {
            self.phase = ChatNightPhase::Closed;
        }
    }

    pub fn admit(&mut self) -> Admission {
        if self.entering || self.phase == ChatNightPhase::Searching {
            return Admission::Busy;
        }
        if self.phase != ChatNightPhase::Open {
            return Admission::NotOpen;
        }
        if self.passes_remaining <= 0 {
            return Admission::NoPasses;
        }
        self.entering = true;
        self.phase = ChatNightPhase::Searching;
        Admission::Granted
    }

    /// Back to the lobby after joining a room or failing.
    pub fn settle(&mut self) {
        self.entering = false;
        self.phase = ChatNightPhase::Open;
    }

    /// Abandon the search. An `/enter` still in flight keeps `entering` set
    /// until it answers, so no second request can start meanwhile.
    pub fn cancel(&mut self) {
        if self.phase == ChatNightPhase::Searching {
            self.phase = ChatNightPhase::Open;
        }
        if self.entering {
            self.cancelled = true;
        }
    }

    /// Record that `/enter` answered. False when the search was cancelled
    /// while it was in flight.
    pub fn finish_entry(&mut self) -> bool {
        self.entering = false;
        !std::mem::take(&mut self.cancelled)
    }
}

/// What `enter_pool` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Skipped,
    NotOpen,
    NoPasses,
    Joined(String),
    Queued,
    /// Cancelled before the pool answered
    Cancelled,
    Failed,
}

pub struct ChatNight<B> {
    inner: Arc<Inner<B>>,
    status_poll: Mutex<Option<PollTask>>,
    room_poll: Mutex<Option<PollTask>>,
}

struct Inner<B> {
    api: B,
    ctx: Context,
    state: Mutex<ChatNightState>,
}

impl<B: ChatNightApi> ChatNight<B> {
    pub fn new(api: B, ctx: Context) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                ctx,
                state: Mutex::new(ChatNightState::default()),
            }),
            status_poll: Mutex::new(None),
            room_poll: Mutex::new(None),
        }
    }

    pub async fn snapshot(&self) -> ChatNightState {
        self.inner.state.lock().await.clone()
    }

    /// Fetch the status once and keep re-checking it every few seconds
    /// while the screen is closed.
    ///
    /// The controller is bound to the token its client was built with. After
    /// a sign-in, build a new `ChatNight` over the new client and start it.
    pub async fn start(&self) {
        self.inner.refresh_status().await;

        let inner = self.inner.clone();
        let task = PollTask::spawn("chat-night-status", STATUS_POLL_INTERVAL, move || {
            let inner = inner.clone();
            async move {
                let closed = inner.state.lock().await.phase == ChatNightPhase::Closed;
                if closed && !inner.ctx.lifecycle.is_background() {
                    inner.refresh_status().await;
                }
                Next::After(STATUS_POLL_INTERVAL)
            }
        });
        *self.status_poll.lock().await = Some(task);
    }

    pub async fn refresh_status(&self) {
        self.inner.refresh_status().await;
    }

    pub async fn enter_pool(&self) -> EntryOutcome {
        let admission = self.inner.state.lock().await.admit();
        match admission {
            Admission::Busy => {
                debug!("Pool entry already in progress");
                return EntryOutcome::Skipped;
            }
            Admission::NotOpen => {
                debug!("Pool entry refused: Chat Night is not open");
                return EntryOutcome::NotOpen;
            }
            Admission::NoPasses => {
                self.inner.ctx.events.alert(
                    "No Passes",
                    "You have used your pass for tonight. See you tomorrow!",
                );
                return EntryOutcome::NoPasses;
            }
            Admission::Granted => {}
        }

        info!("Entering Chat Night pool");
        let result = self.inner.api.enter().await;
        if !self.inner.state.lock().await.finish_entry() {
            let joined = matches!(
                &result,
                Ok(resp) if resp.status == "queued" || resp.room_id.is_some()
            );
            if joined {
                info!("Pool answered after the search was cancelled, leaving again");
                if let Err(e) = self.inner.api.leave().await {
                    warn!("Failed to leave pool: {}", e);
                }
            }
            return EntryOutcome::Cancelled;
        }

        match result {
            Ok(resp) if resp.status == "queued" => {
                debug!("Queued, waiting for a partner");
                self.start_room_poll().await;
                EntryOutcome::Queued
            }
            Ok(resp) => match resp.room_id {
                Some(room_id) => {
                    info!("Pool answered '{}' with room {}", resp.status, room_id);
                    self.inner.join_room(room_id.clone()).await;
                    EntryOutcome::Joined(room_id)
                }
                None => {
                    warn!("Pool answered '{}' without a room", resp.status);
                    self.inner.state.lock().await.settle();
                    EntryOutcome::Failed
                }
            },
            Err(e) => {
                if !self.inner.ctx.intercept(&e).await {
                    warn!("Failed to enter pool: {}", e);
                    self.inner
                        .ctx
                        .events
                        .alert("Error", "Failed to join pool. Please check your connection.");
                }
                self.inner.state.lock().await.settle();
                EntryOutcome::Failed
            }
        }
    }

    /// Stop waiting for a partner and leave the pool. A reply to an
    /// `/enter` still in flight is discarded when it arrives.
    pub async fn cancel_search(&self) {
        self.room_poll.lock().await.take();
        self.inner.state.lock().await.cancel();

        if let Err(e) = self.inner.api.leave().await {
            warn!("Failed to leave pool: {}", e);
        }
        info!("Left Chat Night pool");
    }

    /// Stop every loop this screen started.
    pub async fn stop(&self) {
        self.status_poll.lock().await.take();
        self.room_poll.lock().await.take();
    }

    pub async fn is_waiting_for_room(&self) -> bool {
        self.room_poll
            .lock()
            .await
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    async fn start_room_poll(&self) {
        let inner = self.inner.clone();
        let task = PollTask::spawn("my-room", MY_ROOM_POLL_INTERVAL, move || {
            let inner = inner.clone();
            async move { inner.poll_my_room().await }
        });
        *self.room_poll.lock().await = Some(task);
    }
}

impl<B: ChatNightApi> Inner<B> {
    async fn refresh_status(&self) {
        match self.api.status().await {
            Ok(status) => {
                let mut state = self.state.lock().await;
                state.apply_status(&status);
                debug!(
                    "Chat Night status: {} ({} passes)",
                    state.phase, state.passes_remaining
                );
            }
            Err(e) => {
                if self.ctx.intercept(&e).await {
                    return;
                }
                warn!("Chat Night status check failed: {}", e);
                self.state.lock().await.apply_status_error(&e);
            }
        }
    }

    async fn poll_my_room(&self) -> Next {
        if self.ctx.lifecycle.is_background() {
            return Next::After(MY_ROOM_POLL_INTERVAL);
        }

        match self.api.my_room().await {
            Ok(room) if room.state.is_joinable() => match room.room_id {
                Some(room_id) => {
                    info!("Matched into room {}", room_id);
                    self.join_room(room_id).await;
                    Next::Stop
                }
                None => Next::After(MY_ROOM_POLL_INTERVAL),
            },
            Ok(_) => Next::After(MY_ROOM_POLL_INTERVAL),
            Err(e) => {
                self.ctx.intercept(&e).await;
                if matches!(e, ApiError::Banned(_)) {
                    return Next::Stop;
                }
                debug!("my-room poll failed: {}", e);
                Next::After(MY_ROOM_POLL_INTERVAL)
            }
        }
    }

    async fn join_room(&self, room_id: String) {
        self.ctx.events.navigate(Route::TalkRoom { room_id });
        self.state.lock().await.settle();
    }
}
