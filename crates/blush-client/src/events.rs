use tokio::sync::mpsc;
use tracing::debug;

use blush_types::events::{ClientEvent, Route};

/// Sending half of the event channel. Cheap to clone; every controller
/// holds one.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ClientEvent>,
}

pub fn channel() -> (EventSink, mpsc::UnboundedReceiver<ClientEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, rx)
}

impl EventSink {
    pub fn emit(&self, event: ClientEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event dropped: no front end is listening");
        }
    }

    pub fn navigate(&self, route: Route) {
        self.emit(ClientEvent::Navigate(route));
    }

    pub fn alert(&self, title: &str, message: &str) {
        self.emit(ClientEvent::alert(title, message));
    }
}
