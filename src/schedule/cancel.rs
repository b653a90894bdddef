use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::foundation::error::{HalftoneError, HalftoneResult};

/// Shared stop flag checked by drivers at frame boundaries.
///
/// Clones observe the same flag, so a token handed out by `start` can stop the driver from
/// another thread or callback.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once [`CancelToken::cancel`] has been called.
    pub fn check(&self) -> HalftoneResult<()> {
        if self.is_cancelled() {
            Err(HalftoneError::Cancelled)
        } else {
            Ok(())
        }
    }
}
