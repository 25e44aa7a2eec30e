//! Matches tab: the conversation list, refreshed every ten seconds.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use blush_api::ApiError;
use blush_types::api::ThreadSnippet;

use crate::backend::ThreadApi;
use crate::context::Context;
use crate::poller::{Next, PollTask};

pub const MATCHES_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRow {
    pub thread_id: String,
    pub partner_id: Option<String>,
    pub partner_name: String,
    pub partner_age: Option<u32>,
    pub photo_url: Option<String>,
    pub last_message: String,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread: u32,
}

impl From<ThreadSnippet> for MatchRow {
    fn from(t: ThreadSnippet) -> Self {
        Self {
            thread_id: t.thread_id,
            partner_id: t.partner.id,
            partner_name: t
                .partner
                .first_name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown".into()),
            partner_age: t.partner.age,
            photo_url: t.partner.photo_url,
            last_message: t
                .last_message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Start a conversation".into()),
            last_message_at: t.last_message_at.or(t.updated_at),
            unread: t.unread_count,
        }
    }
}

pub struct MatchesFeed<B> {
    inner: Arc<Inner<B>>,
    poll: Mutex<Option<PollTask>>,
}

struct Inner<B> {
    api: B,
    ctx: Context,
    rows: Mutex<Vec<MatchRow>>,
}

impl<B: ThreadApi> MatchesFeed<B> {
    pub fn new(api: B, ctx: Context) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                ctx,
                rows: Mutex::new(Vec::new()),
            }),
            poll: Mutex::new(None),
        }
    }

    pub async fn rows(&self) -> Vec<MatchRow> {
        self.inner.rows.lock().await.clone()
    }

    pub async fn refresh(&self) -> Result<Vec<MatchRow>, ApiError> {
        self.inner.refresh().await
    }

    pub async fn start(&self) {
        let inner = self.inner.clone();
        let task = PollTask::spawn("matches", Duration::ZERO, move || {
            let inner = inner.clone();
            async move {
                if !inner.ctx.lifecycle.is_background() {
                    if let Err(ApiError::Banned(_)) = inner.refresh().await {
                        return Next::Stop;
                    }
                }
                Next::After(MATCHES_POLL_INTERVAL)
            }
        });
        *self.poll.lock().await = Some(task);
    }

    pub async fn stop(&self) {
        self.poll.lock().await.take();
    }
}

impl<B: ThreadApi> Inner<B> {
    async fn refresh(&self) -> Result<Vec<MatchRow>, ApiError> {
        match self.api.threads().await {
            Ok(list) => {
                let rows: Vec<MatchRow> = list.threads.into_iter().map(MatchRow::from).collect();
                debug!("Loaded {} conversations", rows.len());
                *self.rows.lock().await = rows.clone();
                Ok(rows)
            }
            Err(e) => {
                if !self.ctx.intercept(&e).await {
                    warn!("Failed to fetch threads: {}", e);
                }
                Err(e)
            }
        }
    }
}
