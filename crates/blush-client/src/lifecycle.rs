use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Foreground/background flag shared by every polling loop.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    background: Arc<AtomicBool>,
}

impl Lifecycle {
    pub fn set_background(&self, background: bool) {
        self.background.store(background, Ordering::Relaxed);
    }

    pub fn is_background(&self) -> bool {
        self.background.load(Ordering::Relaxed)
    }
}
