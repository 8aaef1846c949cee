//! Settle timer adapter.
//!
//! Holds at most one armed deadline together with the epoch it was armed
//! for. Arming again replaces the previous deadline.
//!
//! - **always**: [`SettleDeadline::poll_expired`] for callers that drive
//!   their own clock (tests, synchronous loops).
//! - **`feature = "host"`**: [`SettleDeadline::wait`] sleeps on the tokio
//!   timer. Cancel-safe: dropping the future keeps the deadline armed.

use std::time::{Duration, Instant};

use crate::app::ports::SettleTimer;

#[derive(Debug, Clone, Copy, Default)]
pub struct SettleDeadline {
    armed: Option<(Instant, u32)>,
}

impl SettleDeadline {
    pub const fn new() -> Self {
        Self { armed: None }
    }

    pub fn arm(&mut self, delay: Duration, epoch: u32) {
        self.armed = Some((Instant::now() + delay, epoch));
    }

    pub const fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    /// Disarm and return the epoch if the deadline has passed at `now`.
    pub fn poll_expired(&mut self, now: Instant) -> Option<u32> {
        match self.armed {
            Some((deadline, epoch)) if now >= deadline => {
                self.armed = None;
                Some(epoch)
            }
            _ => None,
        }
    }

    /// Sleep until the armed deadline, then disarm and return its epoch.
    /// Pends forever when nothing is armed.
    #[cfg(feature = "host")]
    pub async fn wait(&mut self) -> u32 {
        let Some((deadline, epoch)) = self.armed else {
            return core::future::pending().await;
        };
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        self.armed = None;
        epoch
    }
}

impl SettleTimer for SettleDeadline {
    fn start_settle_timer(&mut self, delay: Duration, epoch: u32) {
        self.arm(delay, epoch);
    }
}
