use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Best-effort cancellation flag, checked between players
#[derive(Debug, Clone, Default)]
pub struct RebuildCancel {
    flag: Arc<AtomicBool>,
}

impl RebuildCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
