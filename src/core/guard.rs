use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-slot "already in flight" flag shared between the UI loop and workers.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    busy: Arc<AtomicBool>,
}

/// Held while the guarded work runs. Dropping it releases the slot.
#[derive(Debug)]
pub struct InFlightToken {
    busy: Arc<AtomicBool>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<InFlightToken> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightToken {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_token_alive() {
        let guard = InFlight::new();
        let token = guard.try_acquire();
        assert!(token.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());

        drop(token);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn token_released_when_worker_panics() {
        let guard = InFlight::new();
        let token = guard.try_acquire().unwrap();

        let handle = std::thread::spawn(move || {
            let _token = token;
            panic!("refresh failed");
        });
        assert!(handle.join().is_err());
        assert!(!guard.is_busy());
    }

    #[test]
    fn clones_share_the_slot() {
        let guard = InFlight::new();
        let other = guard.clone();
        let _token = guard.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }
}
