pub mod clock;
pub mod controller;
pub mod runner;
pub mod state;

pub use clock::{Clock, ClockTick, IntervalClock, ManualClock};
pub use controller::{
    BrewSessionController, BrewSummary, SessionPhase, SessionSnapshot, StepPosition,
};
pub use runner::{BrewSessionHandle, BrewSessionRunner, SessionCommand, SessionEvent};
pub use state::{StepTimer, TickOutcome, TimerStatus};
