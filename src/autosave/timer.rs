//! Background autosave timer.
//!
//! A tokio task ticking at the configured interval. Each tick checks the
//! tracker at fire time and, when the draft is dirty and no save holds the
//! gate, spawns a save of the draft observed at that moment. The tick never
//! waits for the save, so a slow persist call does not delay later ticks.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

use super::controller::{AutoSaveError, Shared};
use super::state::SaveTrigger;
use crate::core::Persist;

/// Commands accepted by the timer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerCommand {
    /// Restart the period from now.
    Reset,
}

/// Handle to a running autosave timer task.
///
/// Dropping the handle aborts the task. A save the task already spawned is
/// left to complete.
#[derive(Debug)]
pub struct AutoSaveTimer {
    commands: mpsc::UnboundedSender<TimerCommand>,
    task: JoinHandle<()>,
    interval: Duration,
}

impl AutoSaveTimer {
    /// Spawn the timer task on the current runtime.
    pub(crate) fn spawn<P: Persist>(
        shared: Arc<Shared<P>>,
        interval: Duration,
    ) -> Result<Self, AutoSaveError> {
        if interval.is_zero() {
            return Err(AutoSaveError::InvalidInterval);
        }
        let first_tick = Instant::now()
            .checked_add(interval)
            .ok_or(AutoSaveError::InvalidInterval)?;
        let handle = Handle::try_current().map_err(|_| AutoSaveError::NoRuntime)?;
        let (commands, rx) = mpsc::unbounded_channel();
        let task = handle.spawn(run(shared, first_tick, interval, rx));
        Ok(Self {
            commands,
            task,
            interval,
        })
    }

    /// Restart the period from now, so the next tick is a full interval away.
    pub fn reset(&self) {
        // The task only goes away on drop, which also drops this sender.
        let _ = self.commands.send(TimerCommand::Reset);
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for AutoSaveTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run<P: Persist>(
    shared: Arc<Shared<P>>,
    first_tick: Instant,
    period: Duration,
    mut commands: mpsc::UnboundedReceiver<TimerCommand>,
) {
    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => on_tick(&shared),
            command = commands.recv() => match command {
                Some(TimerCommand::Reset) => {
                    trace!("autosave period reset");
                    ticker.reset();
                }
                None => break,
            },
        }
    }
}

/// Start a save unless one is in flight or the draft is clean.
///
/// A clean draft is not re-sent on every tick, unlike a timer that saves
/// whenever no save is running. Persist calls are idempotent, so the only
/// difference is fewer writes.
fn on_tick<P: Persist>(shared: &Arc<Shared<P>>) {
    if !shared.wants_autosave() {
        trace!("autosave tick: nothing to save or save in flight");
        return;
    }
    let shared = Arc::clone(shared);
    tokio::spawn(async move {
        // Failures are logged by perform_save and retried on the next tick.
        let _ = shared.perform_save(SaveTrigger::Timer).await;
    });
}
