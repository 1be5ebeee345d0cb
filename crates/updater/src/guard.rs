use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Admits at most one update cycle at a time.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Move from Idle to Running. Returns `None` if a cycle is already in flight.
    pub fn try_start(&self) -> Option<RunPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                running: Arc::clone(&self.running),
            })
    }
}

/// Proof that the holder owns the running cycle. Dropping it returns the
/// guard to Idle, whether the cycle succeeded, failed or panicked.
#[derive(Debug)]
pub struct RunPermit {
    running: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_start_is_rejected_while_running() {
        let guard = RunGuard::new();
        assert_eq!(guard.state(), RunState::Idle);

        let permit = guard.try_start().expect("idle guard admits a cycle");
        assert_eq!(guard.state(), RunState::Running);
        assert!(guard.try_start().is_none());

        drop(permit);
        assert_eq!(guard.state(), RunState::Idle);
        assert!(guard.try_start().is_some());
    }

    #[test]
    fn clones_share_state() {
        let guard = RunGuard::new();
        let other = guard.clone();
        let _permit = guard.try_start().unwrap();
        assert_eq!(other.state(), RunState::Running);
        assert!(other.try_start().is_none());
    }
}
