use std::fmt;

use serde::Serialize;

use crate::{
    brew::{scaler, ScaledStep},
    db::models::NewBrewLog,
    models::{BrewMethod, Recipe},
};

use super::{
    clock::{Clock, ClockTick},
    state::{StepTimer, TickOutcome, TimerStatus},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    NotStarted,
    Running,
    Paused,
    /// Step is current but no clock is counting: open-ended, or timed out and
    /// waiting for the user to move on.
    AwaitingUser,
    Complete,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StepPosition {
    /// 1-based.
    pub number: usize,
    pub total: usize,
}

impl fmt::Display for StepPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.number, self.total)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub recipe_name: String,
    pub current_index: usize,
    pub position: StepPosition,
    pub step: Option<ScaledStep>,
    pub timer_status: TimerStatus,
    pub elapsed_seconds: u32,
    pub remaining_seconds: u32,
    pub progress_fraction: f64,
    pub step_timed_out: bool,
    pub total_elapsed_seconds: u64,
    pub is_running: bool,
    pub is_paused: bool,
    pub is_complete: bool,
    pub coffee_grams: f64,
    pub water_ml: f64,
    pub water_temperature_celsius: Option<u8>,
}

/// What a finished session leaves behind for the journal.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrewSummary {
    pub recipe_name: String,
    pub method: BrewMethod,
    pub coffee_grams: f64,
    pub water_ml: f64,
    pub total_elapsed_seconds: u64,
    pub ended_early: bool,
}

impl BrewSummary {
    pub fn log_draft(&self) -> NewBrewLog {
        NewBrewLog::new(
            self.recipe_name.clone(),
            self.method.label(),
            self.coffee_grams,
            self.water_ml,
        )
    }
}

/// Drives one run-through of a recipe.
///
/// Every operation is safe to call in any state; calls that make no sense for
/// the current state leave it unchanged.
#[derive(Debug)]
pub struct BrewSessionController<C: Clock> {
    recipe: Recipe,
    coffee_grams: f64,
    water_ml: f64,
    steps: Vec<ScaledStep>,
    current_index: usize,
    timer: StepTimer<C>,
    started: bool,
    is_running: bool,
    is_paused: bool,
    is_complete: bool,
    ended_early: bool,
    total_elapsed_seconds: u64,
}

impl<C: Clock> BrewSessionController<C> {
    /// Scales `recipe` to `coffee_grams` and prepares a session at step 0.
    pub fn new(recipe: Recipe, coffee_grams: f64, clock: C) -> Self {
        let steps = scaler::scale(&recipe, coffee_grams);
        let water_ml = recipe.water_for(coffee_grams);

        log_info!(
            "brew session for '{}' at {:.1}g coffee / {:.0}ml water ({} steps)",
            recipe.name,
            coffee_grams,
            water_ml,
            steps.len()
        );

        Self {
            recipe,
            coffee_grams,
            water_ml,
            steps,
            current_index: 0,
            timer: StepTimer::new(clock),
            started: false,
            is_running: false,
            is_paused: false,
            is_complete: false,
            ended_early: false,
            total_elapsed_seconds: 0,
        }
    }

    pub fn start_current_step(&mut self) {
        if self.is_complete {
            return;
        }
        let Some(duration) = self.current_step().map(|step| step.duration_seconds) else {
            return;
        };

        self.timer.start(duration);
        self.started = true;
        self.is_running = true;
        self.is_paused = false;

        log_debug!(
            "step {} started ({})",
            self.position(),
            if duration == 0 {
                "open-ended".to_string()
            } else {
                format!("{duration}s")
            }
        );
    }

    /// Moves to the next step, or completes the session from the last one.
    /// Allowed whether or not the current step's timer has run out.
    pub fn advance_step(&mut self) {
        if self.is_complete {
            return;
        }

        self.timer.stop();
        let next_index = self.current_index + 1;
        if next_index >= self.steps.len() {
            self.finish(false);
        } else {
            self.current_index = next_index;
            self.start_current_step();
        }
    }

    pub fn pause(&mut self) {
        if self.is_complete || !self.is_running || self.is_paused {
            return;
        }
        if self.timer.pause() {
            self.is_running = false;
            self.is_paused = true;
            log_debug!("paused at {}s into step {}", self.timer.elapsed_seconds(), self.position());
        }
    }

    pub fn resume(&mut self) {
        if self.is_complete || !self.is_paused {
            return;
        }
        if self.timer.resume() {
            self.is_running = true;
            self.is_paused = false;
            log_debug!("resumed step {}", self.position());
        }
    }

    /// Ends the session early from any state short of complete.
    pub fn end_brew(&mut self) {
        if self.is_complete {
            return;
        }
        self.timer.stop();
        self.finish(true);
    }

    /// Accounts one second of the current step.
    pub fn tick(&mut self) -> TickOutcome {
        if self.is_complete || !self.is_running {
            return TickOutcome::Ignored;
        }

        let outcome = self.timer.tick();
        match outcome {
            TickOutcome::Ignored => {}
            TickOutcome::Counted => {
                self.total_elapsed_seconds += 1;
            }
            TickOutcome::Expired => {
                self.total_elapsed_seconds += 1;
                self.is_running = false;
                log_debug!("step {} timed out", self.position());
            }
        }
        outcome
    }

    /// Accounts a tick from the clock, dropping it if it belongs to an arming
    /// that has since been released.
    pub fn on_clock_tick(&mut self, tick: ClockTick) -> TickOutcome {
        if !self.timer.accepts(tick.epoch) {
            log_debug!(
                "dropping stale tick (epoch {}, current {})",
                tick.epoch,
                self.timer.epoch()
            );
            return TickOutcome::Ignored;
        }
        self.tick()
    }

    pub fn current_step(&self) -> Option<&ScaledStep> {
        self.steps.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn steps(&self) -> &[ScaledStep] {
        &self.steps
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn coffee_grams(&self) -> f64 {
        self.coffee_grams
    }

    pub fn water_ml(&self) -> f64 {
        self.water_ml
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.timer.elapsed_seconds()
    }

    pub fn total_elapsed_seconds(&self) -> u64 {
        self.total_elapsed_seconds
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn remaining_seconds(&self) -> u32 {
        match self.current_step() {
            Some(step) if !step.is_open_ended() => self.timer.remaining_seconds(),
            _ => 0,
        }
    }

    pub fn progress_fraction(&self) -> f64 {
        match self.current_step() {
            Some(step) if !step.is_open_ended() => self.timer.progress_fraction(),
            _ => 0.0,
        }
    }

    pub fn position(&self) -> StepPosition {
        StepPosition {
            number: (self.current_index + 1).min(self.steps.len().max(1)),
            total: self.steps.len(),
        }
    }

    pub fn step_timed_out(&self) -> bool {
        match self.current_step() {
            Some(step) if !step.is_open_ended() => self.timer.is_expired(),
            _ => false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.is_complete {
            SessionPhase::Complete
        } else if !self.started {
            SessionPhase::NotStarted
        } else if self.is_paused {
            SessionPhase::Paused
        } else if self.timer.status() == TimerStatus::Running {
            SessionPhase::Running
        } else {
            SessionPhase::AwaitingUser
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase(),
            recipe_name: self.recipe.name.clone(),
            current_index: self.current_index,
            position: self.position(),
            step: self.current_step().cloned(),
            timer_status: self.timer.status(),
            elapsed_seconds: self.timer.elapsed_seconds(),
            remaining_seconds: self.remaining_seconds(),
            progress_fraction: self.progress_fraction(),
            step_timed_out: self.step_timed_out(),
            total_elapsed_seconds: self.total_elapsed_seconds,
            is_running: self.is_running,
            is_paused: self.is_paused,
            is_complete: self.is_complete,
            coffee_grams: self.coffee_grams,
            water_ml: self.water_ml,
            water_temperature_celsius: self.recipe.water_temperature_celsius,
        }
    }

    /// Available once the session is complete.
    pub fn summary(&self) -> Option<BrewSummary> {
        if !self.is_complete {
            return None;
        }
        Some(BrewSummary {
            recipe_name: self.recipe.name.clone(),
            method: self.recipe.method,
            coffee_grams: self.coffee_grams,
            water_ml: self.water_ml,
            total_elapsed_seconds: self.total_elapsed_seconds,
            ended_early: self.ended_early,
        })
    }

    pub fn clock(&self) -> &C {
        self.timer.clock()
    }

    fn finish(&mut self, ended_early: bool) {
        self.is_complete = true;
        self.is_running = false;
        self.is_paused = false;
        self.ended_early = ended_early;

        log_info!(
            "brew '{}' {} after {}s",
            self.recipe.name,
            if ended_early { "ended early" } else { "complete" },
            self.total_elapsed_seconds
        );
    }
}
