//! Background task that runs earn attempts and the local countdown

use super::state::{CooldownSnapshot, CooldownState};
use crate::{CreditsBackend, Session};
use hostcredits_core::{EarnOutcome, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_secs(1);

// ─── Events ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CooldownEvent {
    /// Credits were granted; `credits` is the new balance
    Granted {
        credits: i64,
        next_earn_in: u64,
        message: String,
    },
    /// Still cooling down; balance unchanged
    Rejected {
        remaining_seconds: u64,
        message: String,
    },
    Countdown { remaining_seconds: u64 },
    /// The countdown reached zero
    Ready,
    /// Transient failure; nothing changed
    EarnFailed { message: String },
    /// An attempt was already outstanding
    EarnIgnored,
    SessionEnded,
}

// ─── Handle ──────────────────────────────────────────────────────────

#[derive(Debug)]
enum CooldownCommand {
    Earn,
}

#[derive(Clone)]
pub struct CooldownHandle {
    commands: mpsc::UnboundedSender<CooldownCommand>,
    snapshot: watch::Receiver<CooldownSnapshot>,
    cancel: CancellationToken,
}

impl CooldownHandle {
    /// Attempt to earn now
    pub fn earn(&self) {
        if self.commands.send(CooldownCommand::Earn).is_err() {
            debug!("Cooldown timer is gone, earn dropped");
        }
    }

    pub fn snapshot(&self) -> CooldownSnapshot {
        *self.snapshot.borrow()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.commands.is_closed()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
        info!("Cooldown timer stopped");
    }
}

// ─── Spawn ───────────────────────────────────────────────────────────

/// Spawn the cooldown task. Nothing is sent to the backend until
/// [`CooldownHandle::earn`] is called.
pub fn spawn_cooldown_timer<B: CreditsBackend>(
    backend: Arc<B>,
    session: Session,
) -> (CooldownHandle, mpsc::UnboundedReceiver<CooldownEvent>) {
    let state = CooldownState::new();
    let cancel = CancellationToken::new();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

    let handle = CooldownHandle {
        commands: cmd_tx,
        snapshot: snapshot_rx,
        cancel: cancel.clone(),
    };

    let task = CooldownTask {
        backend,
        session,
        state,
        events: event_tx,
        snapshot: snapshot_tx,
    };
    tokio::spawn(task.run(cancel, cmd_rx));

    (handle, event_rx)
}

// ─── Loop ────────────────────────────────────────────────────────────

struct CooldownTask<B> {
    backend: Arc<B>,
    session: Session,
    state: CooldownState,
    events: mpsc::UnboundedSender<CooldownEvent>,
    snapshot: watch::Sender<CooldownSnapshot>,
}

impl<B: CreditsBackend> CooldownTask<B> {
    async fn run(
        mut self,
        cancel: CancellationToken,
        mut commands: mpsc::UnboundedReceiver<CooldownCommand>,
    ) {
        debug!("Cooldown timer started");

        let (result_tx, mut results) = mpsc::unbounded_channel::<Result<EarnOutcome>>();
        let mut next_tick = Instant::now() + TICK;

        loop {
            let keep_going = tokio::select! {
                biased;

                _ = cancel.cancelled() => false,

                command = commands.recv() => match command {
                    Some(CooldownCommand::Earn) => self.attempt(&result_tx),
                    None => false,
                },

                Some(result) = results.recv() => {
                    let keep_going = self.attempt_finished(result);
                    // A fresh countdown starts a full second from the answer
                    next_tick = Instant::now() + TICK;
                    keep_going
                }

                _ = tokio::time::sleep_until(next_tick), if self.state.remaining_seconds() > 0 => {
                    next_tick += TICK;
                    self.tick();
                    true
                }
            };

            self.snapshot.send_replace(self.state.snapshot());
            if !keep_going {
                break;
            }
        }

        debug!("Cooldown timer loop exited");
    }

    fn attempt(&mut self, result_tx: &mpsc::UnboundedSender<Result<EarnOutcome>>) -> bool {
        if !self.session.is_active() {
            self.emit(CooldownEvent::SessionEnded);
            return false;
        }
        if !self.state.begin_attempt() {
            debug!("Earn attempt already outstanding");
            self.emit(CooldownEvent::EarnIgnored);
            return true;
        }

        let backend = self.backend.clone();
        let result_tx = result_tx.clone();
        tokio::spawn(async move {
            let _ = result_tx.send(backend.earn().await);
        });
        true
    }

    fn attempt_finished(&mut self, result: Result<EarnOutcome>) -> bool {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) if e.is_session_ended() => {
                self.state.attempt_failed();
                warn!("Earn rejected by backend, session ended: {}", e);
                self.session.end();
                self.emit(CooldownEvent::SessionEnded);
                return false;
            }
            Err(e) => {
                self.state.attempt_failed();
                warn!("Earn attempt failed: {}", e);
                self.emit(CooldownEvent::EarnFailed {
                    message: e.to_string(),
                });
                return true;
            }
        };

        self.state.apply(&outcome);
        match outcome {
            EarnOutcome::Granted {
                credits,
                next_earn_in,
                message,
            } => {
                if !self.session.set_balance(credits) {
                    self.emit(CooldownEvent::SessionEnded);
                    return false;
                }
                info!("Earned credits, balance now {} (next in {}s)", credits, next_earn_in);
                self.emit(CooldownEvent::Granted {
                    credits,
                    next_earn_in,
                    message,
                });
            }
            EarnOutcome::Rejected {
                remaining_seconds,
                message,
            } => {
                info!("Earn on cooldown, {}s remaining", remaining_seconds);
                self.emit(CooldownEvent::Rejected {
                    remaining_seconds,
                    message,
                });
            }
        }

        if self.state.can_earn() {
            self.emit(CooldownEvent::Ready);
        }
        true
    }

    fn tick(&mut self) {
        let ready = self.state.tick();
        self.emit(CooldownEvent::Countdown {
            remaining_seconds: self.state.remaining_seconds(),
        });
        if ready {
            debug!("Cooldown finished");
            self.emit(CooldownEvent::Ready);
        }
    }

    fn emit(&self, event: CooldownEvent) {
        let _ = self.events.send(event);
    }
}
