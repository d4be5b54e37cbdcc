use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot latch deciding the outcome of a discovery attempt.
///
/// Timeout expiry, message arrival, and a forced host election all race
/// for the same decision; each branch must win `try_resolve` before it may
/// act, so exactly one of them proceeds. The latch is an explicit
/// compare-and-swap so the invariant holds even off a single-threaded
/// runtime.
#[derive(Debug, Default)]
pub struct ResolutionGuard {
    resolved: AtomicBool,
}

impl ResolutionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to claim the resolution. Returns `true` exactly once per
    /// attempt; every later call returns `false`.
    pub fn try_resolve(&self) -> bool {
        self.resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    /// Re-arm the guard for a fresh discovery attempt.
    pub fn reset(&self) {
        self.resolved.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_resolves_exactly_once() {
        let guard = ResolutionGuard::new();
        assert!(!guard.is_resolved());
        assert!(guard.try_resolve());
        assert!(!guard.try_resolve());
        assert!(guard.is_resolved());
    }

    #[test]
    fn test_reset_rearms() {
        let guard = ResolutionGuard::new();
        assert!(guard.try_resolve());
        guard.reset();
        assert!(!guard.is_resolved());
        assert!(guard.try_resolve());
    }

    #[test]
    fn test_single_winner_across_threads() {
        let guard = Arc::new(ResolutionGuard::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let guard = guard.clone();
            handles.push(std::thread::spawn(move || guard.try_resolve()));
        }

        let winners: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();

        assert_eq!(winners, 1);
    }
}
