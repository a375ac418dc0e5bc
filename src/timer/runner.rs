//! Event loop that owns a running brew session.
//!
//! Clock ticks and caller commands are applied to the controller one at a
//! time on a single task. Callers observe state through a watch channel and
//! receive one-shot notifications (step timed out, brew complete) through an
//! event queue.

use anyhow::{anyhow, Context, Result};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::brew::ScaledStep;

use super::{
    clock::{Clock, ClockTick},
    controller::{BrewSessionController, BrewSummary, SessionSnapshot},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Advance,
    Pause,
    Resume,
    End,
    /// Round-trip without changing state.
    Sync,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StepStarted { index: usize, step: ScaledStep },
    /// Fired once per step, the first time its countdown reaches zero.
    StepTimedOut { index: usize },
    Completed(BrewSummary),
}

struct CommandRequest {
    command: SessionCommand,
    reply: oneshot::Sender<SessionSnapshot>,
}

/// Tracks which edges have already been reported so level-triggered
/// controller state turns into single events.
#[derive(Default)]
struct EventLatch {
    announced_step: Option<usize>,
    timed_out_step: Option<usize>,
    completed: bool,
}

impl EventLatch {
    fn collect<C: Clock>(&mut self, controller: &BrewSessionController<C>) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if let Some(summary) = controller.summary() {
            if !self.completed {
                self.completed = true;
                events.push(SessionEvent::Completed(summary));
            }
            return events;
        }

        let index = controller.current_index();
        if controller.has_started() && self.announced_step != Some(index) {
            self.announced_step = Some(index);
            if let Some(step) = controller.current_step() {
                events.push(SessionEvent::StepStarted {
                    index,
                    step: step.clone(),
                });
            }
        }

        if controller.step_timed_out() && self.timed_out_step != Some(index) {
            self.timed_out_step = Some(index);
            events.push(SessionEvent::StepTimedOut { index });
        }

        events
    }
}

/// Caller side of a running session.
pub struct BrewSessionHandle<C: Clock + 'static> {
    commands: mpsc::UnboundedSender<CommandRequest>,
    snapshots: watch::Receiver<SessionSnapshot>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    cancel_token: CancellationToken,
    task: JoinHandle<BrewSessionController<C>>,
}

pub struct BrewSessionRunner;

impl BrewSessionRunner {
    /// Moves `controller` onto its own task and starts the first step if the
    /// caller has not already.
    pub fn spawn<C: Clock + 'static>(
        controller: BrewSessionController<C>,
        ticks: mpsc::UnboundedReceiver<ClockTick>,
    ) -> BrewSessionHandle<C> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let cancel_token = CancellationToken::new();

        let task = tokio::spawn(session_loop(
            controller,
            command_rx,
            ticks,
            snapshot_tx,
            event_tx,
            cancel_token.clone(),
        ));

        BrewSessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_rx,
            cancel_token,
            task,
        }
    }
}

async fn session_loop<C: Clock>(
    mut controller: BrewSessionController<C>,
    mut commands: mpsc::UnboundedReceiver<CommandRequest>,
    mut ticks: mpsc::UnboundedReceiver<ClockTick>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel_token: CancellationToken,
) -> BrewSessionController<C> {
    let mut latch = EventLatch::default();

    if !controller.has_started() {
        controller.start_current_step();
    }
    publish(&controller, &mut latch, &snapshots, &events);

    let mut ticks_open = true;

    loop {
        tokio::select! {
            // Ticks that are already due are accounted before any command.
            biased;
            _ = cancel_token.cancelled() => {
                log_debug!("session loop cancelled");
                break;
            }
            tick = ticks.recv(), if ticks_open => match tick {
                Some(tick) => {
                    controller.on_clock_tick(tick);
                    publish(&controller, &mut latch, &snapshots, &events);
                }
                None => {
                    log_warn!("clock channel closed; session continues without ticks");
                    ticks_open = false;
                }
            },
            request = commands.recv() => match request {
                Some(CommandRequest { command, reply }) => {
                    apply(&mut controller, command);
                    let snapshot = publish(&controller, &mut latch, &snapshots, &events);
                    let _ = reply.send(snapshot);
                }
                None => {
                    log_debug!("session handle dropped");
                    break;
                }
            },
        }
    }

    // Discarding a session must never leave a clock running.
    if !controller.is_complete() {
        controller.end_brew();
    }
    log_info!("session loop finished");
    controller
}

fn apply<C: Clock>(controller: &mut BrewSessionController<C>, command: SessionCommand) {
    match command {
        SessionCommand::Advance => controller.advance_step(),
        SessionCommand::Pause => controller.pause(),
        SessionCommand::Resume => controller.resume(),
        SessionCommand::End => controller.end_brew(),
        SessionCommand::Sync => {}
    }
}

fn publish<C: Clock>(
    controller: &BrewSessionController<C>,
    latch: &mut EventLatch,
    snapshots: &watch::Sender<SessionSnapshot>,
    events: &mpsc::UnboundedSender<SessionEvent>,
) -> SessionSnapshot {
    let snapshot = controller.snapshot();
    snapshots.send_replace(snapshot.clone());
    for event in latch.collect(controller) {
        // Nobody listening is fine.
        let _ = events.send(event);
    }
    snapshot
}

impl<C: Clock + 'static> BrewSessionHandle<C> {
    pub async fn advance(&self) -> Result<SessionSnapshot> {
        self.send(SessionCommand::Advance).await
    }

    pub async fn pause(&self) -> Result<SessionSnapshot> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<SessionSnapshot> {
        self.send(SessionCommand::Resume).await
    }

    pub async fn end(&self) -> Result<SessionSnapshot> {
        self.send(SessionCommand::End).await
    }

    /// State after every tick already delivered has been applied.
    pub async fn current(&self) -> Result<SessionSnapshot> {
        self.send(SessionCommand::Sync).await
    }

    pub async fn send(&self, command: SessionCommand) -> Result<SessionSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(CommandRequest {
                command,
                reply: reply_tx,
            })
            .map_err(|_| anyhow!("brew session is no longer running"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("brew session stopped before answering {command:?}"))
    }

    /// Latest published state, without waiting on the session task.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }

    /// Stops the session task and hands back the controller. A session that
    /// was still in progress is ended so its clock is released.
    pub async fn shutdown(self) -> Result<BrewSessionController<C>> {
        self.cancel_token.cancel();
        self.task.await.context("brew session task failed to join")
    }
}
