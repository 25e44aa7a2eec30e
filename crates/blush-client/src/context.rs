use std::sync::Arc;

use tokio::sync::mpsc;

use blush_api::ApiError;
use blush_store::Store;
use blush_types::events::ClientEvent;

use crate::events::{self, EventSink};
use crate::lifecycle::Lifecycle;
use crate::session::Session;

/// Everything a controller shares with the rest of the client: the session,
/// the event channel and the foreground flag.
#[derive(Clone)]
pub struct Context {
    pub session: Session,
    pub events: EventSink,
    pub lifecycle: Lifecycle,
}

impl Context {
    /// Build a context over `store`. The receiver yields every event the
    /// client emits.
    pub fn new(store: Arc<Store>) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (events, rx) = events::channel();
        let session = Session::new(store, events.clone());
        let ctx = Self {
            session,
            events,
            lifecycle: Lifecycle::default(),
        };
        (ctx, rx)
    }

    pub async fn intercept(&self, err: &ApiError) -> bool {
        self.session.intercept(err).await
    }
}
