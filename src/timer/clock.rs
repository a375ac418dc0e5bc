//! Tick sources for the step timer.
//!
//! A clock delivers one [`ClockTick`] per period while armed. Every arming is
//! tagged with an epoch so ticks queued before a release can be recognised as
//! stale by whoever consumes them.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub epoch: u64,
}

pub trait Clock: Send {
    /// Start delivering ticks tagged with `epoch`. Re-arming replaces any
    /// previous schedule.
    fn arm(&mut self, epoch: u64);

    /// Stop delivering ticks. Safe to call when not armed.
    fn release(&mut self);

    fn is_armed(&self) -> bool;
}

/// Clock that never fires on its own; tests drive the timer by hand and
/// inspect how it was armed.
#[derive(Debug, Default)]
pub struct ManualClock {
    armed_epoch: Option<u64>,
    arm_count: u32,
    release_count: u32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed_epoch(&self) -> Option<u64> {
        self.armed_epoch
    }

    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }

    /// Number of times a live arming was released.
    pub fn release_count(&self) -> u32 {
        self.release_count
    }
}

impl Clock for ManualClock {
    fn arm(&mut self, epoch: u64) {
        self.release();
        self.armed_epoch = Some(epoch);
        self.arm_count += 1;
    }

    fn release(&mut self) {
        if self.armed_epoch.take().is_some() {
            self.release_count += 1;
        }
    }

    fn is_armed(&self) -> bool {
        self.armed_epoch.is_some()
    }
}

/// Real-time clock backed by a tokio interval task. Must be armed from inside
/// a tokio runtime.
#[derive(Debug)]
pub struct IntervalClock {
    period: Duration,
    sender: mpsc::UnboundedSender<ClockTick>,
    ticker: Option<JoinHandle<()>>,
}

impl IntervalClock {
    /// Creates the clock and the receiving end its ticks are delivered to.
    pub fn channel(period: Duration) -> (Self, mpsc::UnboundedReceiver<ClockTick>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                period,
                sender,
                ticker: None,
            },
            receiver,
        )
    }
}

impl Clock for IntervalClock {
    fn arm(&mut self, epoch: u64) {
        self.release();

        let sender = self.sender.clone();
        let period = self.period;
        // First tick lands one full period after arming.
        let first_tick = Instant::now() + period;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(first_tick, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if sender.send(ClockTick { epoch }).is_err() {
                    break;
                }
            }
        });

        log_debug!("clock armed for epoch {epoch}");
        self.ticker = Some(handle);
    }

    fn release(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            log_debug!("clock released");
        }
    }

    fn is_armed(&self) -> bool {
        self.ticker
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for IntervalClock {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_counts_live_releases_only() {
        let mut clock = ManualClock::new();
        clock.release();
        assert_eq!(clock.release_count(), 0);

        clock.arm(1);
        clock.arm(2);
        assert_eq!(clock.armed_epoch(), Some(2));
        assert_eq!(clock.arm_count(), 2);
        assert_eq!(clock.release_count(), 1);

        clock.release();
        assert!(!clock.is_armed());
        assert_eq!(clock.release_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_clock_ticks_once_per_period_until_released() {
        let (mut clock, mut ticks) = IntervalClock::channel(Duration::from_secs(1));
        clock.arm(7);
        assert!(clock.is_armed());

        time::sleep(Duration::from_millis(3_500)).await;
        clock.release();
        assert!(!clock.is_armed());

        let mut received = Vec::new();
        while let Ok(tick) = ticks.try_recv() {
            received.push(tick);
        }
        assert_eq!(received, vec![ClockTick { epoch: 7 }; 3]);

        time::sleep(Duration::from_secs(5)).await;
        assert!(ticks.try_recv().is_err());
    }
}
