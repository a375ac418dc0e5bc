use serde::{Deserialize, Serialize};

use super::clock::Clock;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Expired,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timer was not running, or the tick was stale.
    Ignored,
    Counted,
    /// This tick reached the step duration.
    Expired,
}

/// Countdown for the active step.
///
/// The timer owns the clock handle and releases it whenever it stops
/// counting: on expiry, pause, stop, and restart.
#[derive(Debug)]
pub struct StepTimer<C: Clock> {
    status: TimerStatus,
    duration_seconds: u32,
    elapsed_seconds: u32,
    epoch: u64,
    clock: C,
}

impl<C: Clock> StepTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            status: TimerStatus::Idle,
            duration_seconds: 0,
            elapsed_seconds: 0,
            epoch: 0,
            clock,
        }
    }

    /// Begins counting `duration_seconds`. A zero duration leaves the timer
    /// idle with no clock: the step is open-ended.
    pub fn start(&mut self, duration_seconds: u32) {
        self.clock.release();
        self.duration_seconds = duration_seconds;
        self.elapsed_seconds = 0;

        if duration_seconds == 0 {
            self.status = TimerStatus::Idle;
            return;
        }

        self.arm_clock();
        self.status = TimerStatus::Running;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.status != TimerStatus::Running {
            return TickOutcome::Ignored;
        }

        self.elapsed_seconds = self
            .elapsed_seconds
            .saturating_add(1)
            .min(self.duration_seconds);

        if self.elapsed_seconds >= self.duration_seconds {
            self.clock.release();
            self.status = TimerStatus::Expired;
            TickOutcome::Expired
        } else {
            TickOutcome::Counted
        }
    }

    /// Returns whether the timer was running and is now paused.
    pub fn pause(&mut self) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }
        self.clock.release();
        self.status = TimerStatus::Paused;
        true
    }

    /// Returns whether the timer was paused and is now running again.
    pub fn resume(&mut self) -> bool {
        if self.status != TimerStatus::Paused || self.is_open_ended() {
            return false;
        }
        self.arm_clock();
        self.status = TimerStatus::Running;
        true
    }

    /// Releases the clock and returns to idle. Elapsed time is kept for
    /// inspection until the next `start`.
    pub fn stop(&mut self) {
        self.clock.release();
        self.status = TimerStatus::Idle;
    }

    /// Whether a tick from arming `epoch` should be counted.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.status == TimerStatus::Running && epoch == self.epoch
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_open_ended(&self) -> bool {
        self.duration_seconds == 0
    }

    /// Level-triggered: stays true for as long as the step is current.
    pub fn is_expired(&self) -> bool {
        !self.is_open_ended() && self.elapsed_seconds >= self.duration_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.duration_seconds.saturating_sub(self.elapsed_seconds)
    }

    pub fn progress_fraction(&self) -> f64 {
        if self.is_open_ended() {
            return 0.0;
        }
        (self.elapsed_seconds as f64 / self.duration_seconds as f64).min(1.0)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn arm_clock(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.clock.arm(self.epoch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::ManualClock;

    fn timer() -> StepTimer<ManualClock> {
        StepTimer::new(ManualClock::new())
    }

    #[test]
    fn expires_exactly_once_and_clamps_elapsed() {
        let mut timer = timer();
        timer.start(3);
        assert!(timer.clock().is_armed());

        assert_eq!(timer.tick(), TickOutcome::Counted);
        assert_eq!(timer.tick(), TickOutcome::Counted);
        assert_eq!(timer.tick(), TickOutcome::Expired);
        assert_eq!(timer.status(), TimerStatus::Expired);
        assert!(!timer.clock().is_armed());

        for _ in 0..5 {
            assert_eq!(timer.tick(), TickOutcome::Ignored);
        }
        assert_eq!(timer.elapsed_seconds(), 3);
        assert!(timer.is_expired());
        assert_eq!(timer.remaining_seconds(), 0);
        assert_eq!(timer.progress_fraction(), 1.0);
    }

    #[test]
    fn open_ended_never_runs_a_clock() {
        let mut timer = timer();
        timer.start(0);
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert!(!timer.clock().is_armed());

        for _ in 0..10_000 {
            assert_eq!(timer.tick(), TickOutcome::Ignored);
        }
        assert!(!timer.is_expired());
        assert_eq!(timer.elapsed_seconds(), 0);
        assert_eq!(timer.progress_fraction(), 0.0);
        assert_eq!(timer.clock().arm_count(), 0);
    }

    #[test]
    fn pause_and_resume_keep_elapsed() {
        let mut timer = timer();
        timer.start(10);
        timer.tick();
        timer.tick();

        assert!(timer.pause());
        assert!(!timer.clock().is_armed());
        assert_eq!(timer.tick(), TickOutcome::Ignored);
        assert_eq!(timer.elapsed_seconds(), 2);

        assert!(timer.resume());
        assert!(timer.clock().is_armed());
        assert_eq!(timer.elapsed_seconds(), 2);
        assert_eq!(timer.tick(), TickOutcome::Counted);
        assert_eq!(timer.elapsed_seconds(), 3);
    }

    #[test]
    fn invalid_pause_and_resume_are_noops() {
        let mut timer = timer();
        assert!(!timer.pause());
        assert!(!timer.resume());

        timer.start(5);
        assert!(!timer.resume());
        assert_eq!(timer.status(), TimerStatus::Running);

        timer.start(0);
        assert!(!timer.pause());
        assert!(!timer.resume());
    }

    #[test]
    fn each_arming_gets_a_new_epoch() {
        let mut timer = timer();
        timer.start(5);
        let first = timer.epoch();
        assert!(timer.accepts(first));

        timer.pause();
        assert!(!timer.accepts(first));

        timer.resume();
        assert!(!timer.accepts(first));
        assert!(timer.accepts(timer.epoch()));

        timer.stop();
        assert!(!timer.accepts(timer.epoch()));
        assert!(!timer.clock().is_armed());
    }
}
