//! The emit-on-schedule loop and its shutdown state machine.

use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, tick, Receiver, Sender, TrySendError};
use rand::Rng;

use crate::{emitter::Emitter, sink::Sink};

/// Default period between two emissions.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    /// Terminal: no more records are emitted.
    ShuttingDown,
}

/// Requests a shutdown of a running [`Generator`].
///
/// Cheap to clone and safe to call from signal handlers on other threads. Only the first
/// request counts; later ones are no-ops.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<()>,
}

impl ShutdownHandle {
    pub fn request(&self) {
        match self.sender.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                log::debug!("shutdown requested after the generator stopped")
            }
        }
    }
}

/// Creates a shutdown handle and the receiving end consumed by [`Generator::run`].
pub fn shutdown_channel() -> (ShutdownHandle, Receiver<()>) {
    let (sender, receiver) = bounded(1);
    (ShutdownHandle { sender }, receiver)
}

/// A tick every `interval`, first one after `interval` has elapsed.
///
/// Ticks are never queued: if the receiver is busy when one is due, it is skipped.
pub fn schedule(interval: Duration) -> Receiver<Instant> {
    tick(interval)
}

/// Drives an [`Emitter`] from a schedule until shutdown.
pub struct Generator<S, R> {
    emitter: Emitter<S, R>,
    state: State,
}

impl<S: Sink, R: Rng> Generator<S, R> {
    pub fn new(emitter: Emitter<S, R>) -> Self {
        Generator {
            emitter,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn emitter(&self) -> &Emitter<S, R> {
        &self.emitter
    }

    /// Emit the first record right away and enter [`State::Running`].
    pub fn start(&mut self) {
        if self.state != State::Idle {
            return;
        }
        self.state = State::Running;
        self.on_tick();
    }

    /// Emit one record and push it to the sink. Ignored unless running.
    pub fn on_tick(&mut self) {
        if self.state != State::Running {
            return;
        }
        self.emitter.emit_once();
        self.emitter.sink().flush();
    }

    /// Stop emitting, then flush and close the sink. Only the first call has an effect.
    pub fn shutdown(&mut self) {
        if self.state == State::ShuttingDown {
            return;
        }
        self.state = State::ShuttingDown;
        let sink = self.emitter.sink();
        sink.flush();
        sink.close();
        log::info!("shut down after {} records", self.emitter.iteration());
    }

    /// [`start`](Self::start), then emit on every tick until a shutdown is requested.
    ///
    /// A shutdown request that is pending together with a tick wins over the tick. A closed
    /// `ticks` or `shutdown` channel also ends the loop.
    pub fn run(mut self, ticks: Receiver<Instant>, shutdown: Receiver<()>) {
        self.start();
        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(ticks) -> tick => {
                    if tick.is_err() || !shutdown.is_empty() {
                        break;
                    }
                    self.on_tick();
                }
            }
        }
        self.shutdown();
    }
}
