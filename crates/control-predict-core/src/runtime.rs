//! Real-time driver for [`CountdownTimer`] on the tokio runtime.
//!
//! The timer itself is clock-agnostic; this module feeds it the elapsed time
//! of a spawned task and forwards its events over a channel. The screen
//! showing the countdown keeps the [`CountdownHandle`] for the pause and
//! cancel buttons.
//!
//! The task stops, cancelling the countdown, when the handle is dropped or
//! nobody listens for events any more, paused or not.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::events::CountdownEvent;
use crate::timer::{CountdownStatus, CountdownTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Cancel,
}

/// Controls a countdown running on the runtime.
#[derive(Debug, Clone)]
pub struct CountdownHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl CountdownHandle {
    /// Returns false once the countdown task has finished.
    pub fn pause(&self) -> bool {
        self.commands.send(Command::Pause).is_ok()
    }

    pub fn resume(&self) -> bool {
        self.commands.send(Command::Resume).is_ok()
    }

    pub fn cancel(&self) -> bool {
        self.commands.send(Command::Cancel).is_ok()
    }

    pub fn is_finished(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Start a countdown of `duration_ms`, ticking every `interval_ms`.
///
/// Must be called from within a tokio runtime. The join handle resolves to
/// the final status: `Expired` or `Cancelled`.
pub fn spawn_countdown(
    duration_ms: u64,
    interval_ms: u64,
) -> (
    CountdownHandle,
    mpsc::UnboundedReceiver<CountdownEvent>,
    JoinHandle<CountdownStatus>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_countdown(duration_ms, interval_ms, command_rx, event_tx));
    (CountdownHandle { commands: command_tx }, event_rx, task)
}

async fn run_countdown(
    duration_ms: u64,
    interval_ms: u64,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<CountdownEvent>,
) -> CountdownStatus {
    let origin = Instant::now();
    let elapsed_ms = || origin.elapsed().as_millis() as u64;

    let mut timer = CountdownTimer::new(interval_ms);
    timer.start(duration_ms, 0);

    while matches!(timer.status(), CountdownStatus::Running | CountdownStatus::Paused) {
        let due = timer
            .next_deadline()
            .and_then(|ms| origin.checked_add(Duration::from_millis(ms)));
        tokio::select! {
            command = commands.recv() => apply(&mut timer, command, elapsed_ms()),
            _ = events.closed() => {
                debug!("countdown listener gone");
                timer.cancel();
            }
            _ = sleep_until(due.unwrap_or(origin)), if due.is_some() => {
                for event in timer.tick(elapsed_ms()) {
                    if events.send(event).is_err() {
                        debug!("countdown listener gone");
                        timer.cancel();
                        break;
                    }
                }
            }
        }
    }
    timer.status()
}

fn apply(timer: &mut CountdownTimer, command: Option<Command>, now_ms: u64) {
    match command {
        Some(Command::Pause) => {
            timer.pause();
        }
        Some(Command::Resume) => {
            timer.resume(now_ms);
        }
        Some(Command::Cancel) | None => {
            timer.cancel();
        }
    }
}
