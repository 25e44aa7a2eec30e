//! Message thread: optimistic sends reconciled against server pages.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use blush_api::ApiError;
use blush_types::api::{MessagePage, PartnerProfile};
use blush_types::models::{ChatMessage, MessageId};

use crate::backend::ThreadApi;
use crate::context::Context;
use crate::poller::{Next, PollTask};

pub const PAGE_SIZE: u32 = 50;
pub const THREAD_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Collapse duplicate ids and order by `created_at`.
///
/// A repeated id keeps the slot of its first occurrence and the value of
/// its last. The sort is stable, so messages with equal timestamps keep
/// their relative order.
pub fn reconcile(messages: impl IntoIterator<Item = ChatMessage>) -> Vec<ChatMessage> {
    let mut out: Vec<ChatMessage> = Vec::new();
    let mut slots: HashMap<MessageId, usize> = HashMap::new();

    for msg in messages {
        match slots.get(&msg.id) {
            Some(&i) => out[i] = msg,
            None => {
                slots.insert(msg.id.clone(), out.len());
                out.push(msg);
            }
        }
    }

    out.sort_by_key(|m| m.created_at);
    out
}

#[derive(Debug, Clone, Default)]
pub struct ThreadState {
    pub messages: Vec<ChatMessage>,
    /// Cursor for the next older page
    pub next_cursor: Option<String>,
    next_pending: u64,
}

impl ThreadState {
    /// Show `text` right away under a synthetic id.
    pub fn push_pending(
        &mut self,
        text: &str,
        sender_id: Option<String>,
        now: DateTime<Utc>,
    ) -> MessageId {
        self.next_pending += 1;
        let id = MessageId::Pending(self.next_pending);
        let msg = ChatMessage {
            id: id.clone(),
            text: text.to_string(),
            created_at: now,
            sender_id,
        };
        let current = std::mem::take(&mut self.messages);
        self.messages = reconcile(current.into_iter().chain([msg]));
        id
    }

    pub fn remove(&mut self, id: &MessageId) {
        self.messages.retain(|m| &m.id != id);
    }

    /// Merge a fetched page.
    ///
    /// A fresh snapshot (`paginated == false`) replaces everything except
    /// messages still waiting for their send to complete. An older page is
    /// merged into what is already shown.
    pub fn merge_page(&mut self, page: MessagePage, paginated: bool) {
        let fetched = page.messages.into_iter().map(ChatMessage::from);
        let current = std::mem::take(&mut self.messages);

        self.messages = if paginated {
            reconcile(current.into_iter().chain(fetched))
        } else {
            reconcile(
                current
                    .into_iter()
                    .filter(|m| m.id.is_pending())
                    .chain(fetched),
            )
        };

        if paginated || self.next_cursor.is_none() {
            self.next_cursor = page.next_cursor;
        }
    }

    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.id.is_pending()).count()
    }
}

/// What became of a `send_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing was sent
    Ignored,
    Sent(String),
    Failed,
}

pub struct Thread<B> {
    inner: Arc<Inner<B>>,
    poll: Mutex<Option<PollTask>>,
}

struct Inner<B> {
    api: B,
    ctx: Context,
    thread_id: String,
    state: Mutex<ThreadState>,
}

impl<B: ThreadApi> Thread<B> {
    pub fn new(api: B, ctx: Context, thread_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                ctx,
                thread_id: thread_id.into(),
                state: Mutex::new(ThreadState::default()),
            }),
            poll: Mutex::new(None),
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.inner.thread_id
    }

    pub async fn snapshot(&self) -> ThreadState {
        self.inner.state.lock().await.clone()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.inner.state.lock().await.messages.clone()
    }

    /// Load the latest page, mark the thread read and keep refreshing.
    pub async fn open(&self) {
        if let Err(e) = self.inner.fetch(None).await {
            debug!("Initial message load failed: {}", e);
        }
        self.mark_read().await;
        self.start_polling().await;
    }

    pub async fn start_polling(&self) {
        let inner = self.inner.clone();
        let task = PollTask::spawn("thread", THREAD_POLL_INTERVAL, move || {
            let inner = inner.clone();
            async move {
                if !inner.ctx.lifecycle.is_background() {
                    if let Err(e) = inner.fetch(None).await {
                        if matches!(e, ApiError::Banned(_)) {
                            return Next::Stop;
                        }
                    }
                }
                Next::After(THREAD_POLL_INTERVAL)
            }
        });
        *self.poll.lock().await = Some(task);
    }

    pub async fn stop(&self) {
        self.poll.lock().await.take();
    }

    /// Fetch a page. `before` selects an older page; `None` refreshes the
    /// newest one.
    pub async fn fetch_messages(&self, before: Option<&str>) -> Result<(), ApiError> {
        self.inner.fetch(before).await
    }

    /// Fetch the page before the oldest one loaded. False when there is none.
    pub async fn load_older(&self) -> Result<bool, ApiError> {
        let cursor = self.inner.state.lock().await.next_cursor.clone();
        match cursor {
            Some(cursor) => {
                self.inner.fetch(Some(&cursor)).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn send_message(&self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }

        let sender_id = self
            .inner
            .ctx
            .session
            .user()
            .await
            .and_then(|u| u.id);
        let pending = self
            .inner
            .state
            .lock()
            .await
            .push_pending(text, sender_id, Utc::now());

        let result = self.inner.api.send(&self.inner.thread_id, text).await;
        self.inner.state.lock().await.remove(&pending);

        match result {
            Ok(sent) => {
                debug!("Message {} sent", sent.id);
                if let Err(e) = self.inner.fetch(None).await {
                    debug!("Refresh after send failed: {}", e);
                }
                SendOutcome::Sent(sent.id)
            }
            Err(e) => {
                if !self.inner.ctx.intercept(&e).await {
                    warn!("Send failed: {}", e);
                    let message = if e.is_network() {
                        "Failed to send message: Network error"
                    } else {
                        "Failed to send message"
                    };
                    self.inner.ctx.events.alert("Error", message);
                }
                SendOutcome::Failed
            }
        }
    }

    pub async fn mark_read(&self) {
        if let Err(e) = self.inner.api.mark_read(&self.inner.thread_id).await {
            debug!("Failed to mark thread read: {}", e);
        }
    }

    pub async fn partner(&self) -> Result<PartnerProfile, ApiError> {
        self.inner.api.partner(&self.inner.thread_id).await
    }
}

impl<B: ThreadApi> Inner<B> {
    async fn fetch(&self, before: Option<&str>) -> Result<(), ApiError> {
        match self.api.messages(&self.thread_id, PAGE_SIZE, before).await {
            Ok(page) => {
                let mut state = self.state.lock().await;
                state.merge_page(page, before.is_some());
                Ok(())
            }
            Err(e) => {
                if !self.ctx.intercept(&e).await {
                    debug!("Failed to fetch messages: {}", e);
                }
                Err(e)
            }
        }
    }
}
