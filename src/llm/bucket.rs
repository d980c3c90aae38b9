//! Full-reset token bucket shared by every model call of a run.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct BucketState {
    remaining: f64,
    next_refill: Instant,
}

/// Per-window token budget.
///
/// When a window elapses the budget is reset to full capacity; unused tokens
/// do not carry over. The lock only guards the check/debit/reset step, and
/// waiting for the next window happens with it released, so the bucket can
/// be shared between threads.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    refill_interval: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// A full bucket whose first window ends `refill_interval` from now.
    pub fn new(capacity: f64, refill_interval: Duration) -> Self {
        Self {
            capacity,
            refill_interval,
            state: Mutex::new(BucketState {
                remaining: capacity,
                next_refill: Instant::now() + refill_interval,
            }),
        }
    }

    /// Tokens left in the current window.
    pub fn remaining(&self) -> f64 {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).remaining
    }

    /// Block until `cost` tokens could be debited. Costs above capacity are
    /// clamped so they wait for one full window instead of forever. Returns
    /// the amount actually debited.
    pub fn acquire(&self, cost: f64) -> f64 {
        let cost = cost.clamp(0.0, self.capacity);
        loop {
            match self.try_debit(cost) {
                Ok(()) => return cost,
                Err(wake_at) => {
                    let wait = wake_at.saturating_duration_since(Instant::now());
                    tracing::debug!("token budget exhausted, waiting {:?} for refill", wait);
                    thread::sleep(wait);
                }
            }
        }
    }

    /// Debit without waiting. Returns false when the current window cannot
    /// cover `cost`.
    pub fn try_acquire(&self, cost: f64) -> bool {
        self.try_debit(cost.clamp(0.0, self.capacity)).is_ok()
    }

    /// Zero the current window so the next acquire waits for a refill.
    pub fn drain(&self) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).remaining = 0.0;
    }

    /// Check, reset and debit under the lock. On shortfall, returns when the
    /// current window ends.
    fn try_debit(&self, cost: f64) -> Result<(), Instant> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        if now >= state.next_refill {
            state.remaining = self.capacity;
            state.next_refill = now + self.refill_interval;
        }
        if state.remaining >= cost {
            state.remaining -= cost;
            Ok(())
        } else {
            Err(state.next_refill)
        }
    }
}
