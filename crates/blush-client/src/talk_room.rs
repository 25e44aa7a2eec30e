//! A live Chat Night room: the countdown, the room poll and engagement.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use blush_api::ApiError;
use blush_types::api::RoomResponse;
use blush_types::events::Route;
use blush_types::models::{EngageStatus, RoomState};

use crate::backend::RoomApi;
use crate::context::Context;
use crate::poller::{Next, PollTask};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const ROOM_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const ERROR_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const BACKGROUND_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// Rooms last five minutes; shown until the first poll lands.
pub const ROOM_DURATION_SECS: i64 = 300;

/// How a room came to an end. Reported exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Ended,
    Matched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalkRoomState {
    pub room_id: String,
    pub seconds_remaining: i64,
    pub state: RoomState,
    /// Highest engagement the server has reported; never decreases
    pub engage_status: EngageStatus,
    /// The caller has engaged, optimistically or as reported by the server
    pub engaged: bool,
    pub match_unlocked: bool,
    pub network_error: bool,
    pub partner_name: Option<String>,
    pub partner_photo: Option<String>,
    pub finished: Option<Finish>,
}

impl TalkRoomState {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            seconds_remaining: ROOM_DURATION_SECS,
            state: RoomState::Active,
            engage_status: EngageStatus::None,
            engaged: false,
            match_unlocked: false,
            network_error: false,
            partner_name: None,
            partner_photo: None,
            finished: None,
        }
    }

    pub fn tick(&mut self) {
        self.seconds_remaining = (self.seconds_remaining - 1).max(0);
    }

    /// Fold a room poll into local state. Returns the finish the first time
    /// the room is seen to be over and `None` on every later call.
    pub fn apply_poll(&mut self, room: &RoomResponse) -> Option<Finish> {
        if self.finished.is_some() {
            return None;
        }

        self.network_error = false;
        self.seconds_remaining = room.seconds_remaining.max(0);
        self.state = room.state;
        if room.partner_first_name.is_some() {
            self.partner_name = room.partner_first_name.clone();
        }
        if room.partner_photo.is_some() {
            self.partner_photo = room.partner_photo.clone();
        }

        let reported = if room.match_unlocked {
            EngageStatus::MatchUnlocked
        } else {
            room.engage_status
        };
        self.engage_status = self.engage_status.max(reported);
        if self.engage_status != EngageStatus::None {
            self.engaged = true;
        }
        if self.engage_status == EngageStatus::MatchUnlocked {
            self.match_unlocked = true;
        }

        // An unlocked match is permanent, so it outranks the room closing.
        let finish = if self.match_unlocked {
            Some(Finish::Matched)
        } else if room.state == RoomState::Ended || room.seconds_remaining <= 0 {
            Some(Finish::Ended)
        } else {
            None
        };
        self.finished = finish;
        finish
    }

    pub fn poll_failed(&mut self) {
        self.network_error = true;
    }

    /// Mark the caller as engaged. False when there is nothing to send.
    pub fn begin_engage(&mut self) -> bool {
        if self.engaged || self.finished.is_some() {
            return false;
        }
        self.engaged = true;
        true
    }

    /// Undo an optimistic engage. Whatever the server already confirmed
    /// stays.
    pub fn revert_engage(&mut self) {
        self.engaged = self.engage_status != EngageStatus::None;
    }
}

/// An open talk room. Dropping it stops the countdown and the poll.
pub struct TalkRoom<B> {
    inner: Arc<Inner<B>>,
    _ticker: PollTask,
    _poller: PollTask,
}

struct Inner<B> {
    api: B,
    ctx: Context,
    state: Mutex<TalkRoomState>,
}

impl<B: RoomApi> TalkRoom<B> {
    pub fn open(api: B, ctx: Context, room_id: impl Into<String>) -> Self {
        let room_id = room_id.into();
        info!("Opening talk room {}", room_id);

        let inner = Arc::new(Inner {
            api,
            ctx,
            state: Mutex::new(TalkRoomState::new(room_id)),
        });

        let ticker = {
            let inner = inner.clone();
            PollTask::spawn("talk-room-countdown", TICK_INTERVAL, move || {
                let inner = inner.clone();
                async move {
                    let mut state = inner.state.lock().await;
                    if state.finished.is_some() {
                        return Next::Stop;
                    }
                    state.tick();
                    Next::After(TICK_INTERVAL)
                }
            })
        };

        let poller = {
            let inner = inner.clone();
            PollTask::spawn("talk-room", Duration::ZERO, move || {
                let inner = inner.clone();
                async move { inner.poll().await }
            })
        };

        Self {
            inner,
            _ticker: ticker,
            _poller: poller,
        }
    }

    pub async fn snapshot(&self) -> TalkRoomState {
        self.inner.state.lock().await.clone()
    }

    /// Signal interest in the partner. Shown as engaged immediately and
    /// rolled back if the server refuses.
    pub async fn engage(&self) -> bool {
        let room_id = {
            let mut state = self.inner.state.lock().await;
            if !state.begin_engage() {
                debug!("Engage ignored: already engaged or room over");
                return false;
            }
            state.room_id.clone()
        };

        match self.inner.api.engage(&room_id).await {
            Ok(ack) => {
                debug!("Engage accepted ({:?})", ack.status);
                true
            }
            Err(e) => {
                self.inner.state.lock().await.revert_engage();
                if !self.inner.ctx.intercept(&e).await {
                    warn!("Engage failed: {}", e);
                    self.inner
                        .ctx
                        .events
                        .alert("Error", "Could not submit engagement.");
                }
                false
            }
        }
    }
}

impl<B: RoomApi> Inner<B> {
    async fn poll(&self) -> Next {
        if self.ctx.lifecycle.is_background() {
            return Next::After(BACKGROUND_POLL_INTERVAL);
        }

        let room_id = self.state.lock().await.room_id.clone();
        match self.api.room(&room_id).await {
            Ok(room) => {
                let finish = self.state.lock().await.apply_poll(&room);
                match finish {
                    Some(finish) => {
                        self.finish(finish);
                        Next::Stop
                    }
                    None => Next::After(ROOM_POLL_INTERVAL),
                }
            }
            Err(e) => {
                self.ctx.intercept(&e).await;
                if matches!(e, ApiError::Banned(_)) {
                    return Next::Stop;
                }
                warn!("Room poll failed: {}", e);
                self.state.lock().await.poll_failed();
                Next::After(ERROR_POLL_INTERVAL)
            }
        }
    }

    fn finish(&self, finish: Finish) {
        let events = &self.ctx.events;
        match finish {
            Finish::Ended => {
                info!("Talk room ended");
                events.alert("Session Ended", "The chat session has finished.");
                events.navigate(Route::ChatNight);
            }
            Finish::Matched => {
                info!("Talk room unlocked a match");
                events.alert(
                    "It's a Match! 💖",
                    "You both engaged! You can now find them in your Matches tab.",
                );
                events.navigate(Route::Matches);
            }
        }
    }
}
