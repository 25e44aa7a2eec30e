use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What a polling step wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    After(Duration),
    Stop,
}

/// A cancellable polling loop running on its own task.
///
/// The loop stops when a step returns [`Next::Stop`], when [`cancel`] is
/// called, or when the handle is dropped. A step that is still in flight at
/// cancellation is abandoned at its next await point, so nothing it would
/// have written after that point is applied.
///
/// [`cancel`]: PollTask::cancel
pub struct PollTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Run `step` after `first_delay`, then again after whatever delay each
    /// step asks for.
    pub fn spawn<F, Fut>(name: &'static str, first_delay: Duration, mut step: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Next> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut delay = first_delay;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }

                let next = tokio::select! {
                    _ = token.cancelled() => break,
                    next = step() => next,
                };

                match next {
                    Next::After(d) => delay = d,
                    Next::Stop => break,
                }
            }
            debug!("Poll loop '{}' finished", name);
        });

        Self {
            name,
            cancel,
            handle,
        }
    }

    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!("Cancelling poll loop '{}'", self.name);
            self.cancel.cancel();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
