use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancellation flag shared between a caller and a long-running
/// call into this crate.
///
/// `fill_sinks`, `upslope`, `watershed`, and `strahler` poll this at the
/// coarse granularity the crate documents (never per-cell) and bail out with
/// `TerrainError::Cancelled` once it is observed set. The grid being written
/// to is left in a memory-safe but otherwise unspecified partial state.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod test {
    use super::CancelToken;

    #[test]
    fn test_cancel_token_shared_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
