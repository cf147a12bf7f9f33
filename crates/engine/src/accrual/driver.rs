//! Background task that drives [`AccrualState`] from a one-second clock

use super::state::{AccrualSnapshot, AccrualState, ClaimRejected};
use crate::{CreditsBackend, Session};
use hostcredits_core::{ClaimResponse, EarnConfig, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_secs(1);

// ─── Events ──────────────────────────────────────────────────────────

/// Emitted by the accrual task for display surfaces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccrualEvent {
    /// One visible second elapsed
    Tick {
        elapsed_seconds: u64,
        earned_unclaimed: u64,
        progress: f64,
    },
    /// An interval completed
    Earned { credits: u64, earned_unclaimed: u64 },
    ClaimSubmitted { intervals: u64, credits: u64 },
    ClaimRejected { reason: ClaimRejected },
    /// The backend confirmed a claim; `total_credits` is the new balance
    Claimed { credits: u64, total_credits: i64 },
    /// Transient failure; counters are unchanged and the claim can be retried
    ClaimFailed { message: String },
    SessionEnded,
}

// ─── Handle ──────────────────────────────────────────────────────────

#[derive(Debug)]
enum AccrualCommand {
    SetVisible(bool),
    Claim,
    UpdateConfig(EarnConfig),
}

/// Handle to control a running accrual task
#[derive(Clone)]
pub struct AccrualHandle {
    commands: mpsc::UnboundedSender<AccrualCommand>,
    snapshot: watch::Receiver<AccrualSnapshot>,
    cancel: CancellationToken,
}

impl AccrualHandle {
    pub fn set_visible(&self, visible: bool) {
        self.send(AccrualCommand::SetVisible(visible));
    }

    /// Request a manual claim of everything earned so far
    pub fn claim(&self) {
        self.send(AccrualCommand::Claim);
    }

    pub fn update_config(&self, config: EarnConfig) {
        self.send(AccrualCommand::UpdateConfig(config));
    }

    /// Latest counters published by the task
    pub fn snapshot(&self) -> AccrualSnapshot {
        *self.snapshot.borrow()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.commands.is_closed()
    }

    /// Tear the task down. Results of a claim still in flight are dropped.
    pub fn stop(&self) {
        self.cancel.cancel();
        info!("Accrual timer stopped");
    }

    fn send(&self, command: AccrualCommand) {
        if self.commands.send(command).is_err() {
            debug!("Accrual timer is gone, command dropped");
        }
    }
}

// ─── Spawn ───────────────────────────────────────────────────────────

/// Spawn the accrual task.
///
/// Returns a handle for controlling it and the receiver of its events.
pub fn spawn_accrual_timer<B: CreditsBackend>(
    backend: Arc<B>,
    session: Session,
    config: EarnConfig,
    visible: bool,
) -> (AccrualHandle, mpsc::UnboundedReceiver<AccrualEvent>) {
    let state = AccrualState::new(config, visible);
    let cancel = CancellationToken::new();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

    let handle = AccrualHandle {
        commands: cmd_tx,
        snapshot: snapshot_rx,
        cancel: cancel.clone(),
    };

    let task = AccrualTask {
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

struct AccrualTask<B> {
    backend: Arc<B>,
    session: Session,
    state: AccrualState,
    events: mpsc::UnboundedSender<AccrualEvent>,
    snapshot: watch::Sender<AccrualSnapshot>,
}

/// Whether the loop should keep going after handling something
enum Flow {
    Continue,
    Stop,
}

impl<B: CreditsBackend> AccrualTask<B> {
    async fn run(
        mut self,
        cancel: CancellationToken,
        mut commands: mpsc::UnboundedReceiver<AccrualCommand>,
    ) {
        info!(
            "Accrual timer started ({} credits every {}s)",
            self.state.config().credits_per_interval,
            self.state.config().interval_seconds
        );

        let (result_tx, mut results) = mpsc::unbounded_channel::<Result<ClaimResponse>>();
        let mut next_tick = Instant::now() + TICK;
        // Time left until the next tick when the surface was hidden
        let mut carried = TICK;

        loop {
            let flow = tokio::select! {
                biased;

                _ = cancel.cancelled() => Flow::Stop,

                command = commands.recv() => match command {
                    Some(AccrualCommand::SetVisible(visible)) => {
                        let was_visible = self.state.is_visible();
                        if was_visible && !visible {
                            carried = next_tick.saturating_duration_since(Instant::now());
                        } else if !was_visible && visible {
                            next_tick = Instant::now() + carried;
                        }
                        self.set_visible(visible, &result_tx)
                    }
                    Some(AccrualCommand::Claim) => self.manual_claim(&result_tx),
                    Some(AccrualCommand::UpdateConfig(config)) => {
                        info!(
                            "Earn config changed to {} credits every {}s",
                            config.credits_per_interval, config.interval_seconds
                        );
                        self.state.update_config(config);
                        Flow::Continue
                    }
                    None => Flow::Stop,
                },

                Some(result) = results.recv() => self.claim_finished(result),

                _ = tokio::time::sleep_until(next_tick), if self.state.is_visible() => {
                    next_tick += TICK;
                    self.tick()
                }
            };

            self.publish();
            if let Flow::Stop = flow {
                break;
            }
        }

        debug!("Accrual timer loop exited");
    }

    fn tick(&mut self) -> Flow {
        let credits = self.state.tick();
        if credits > 0 {
            debug!(
                "Interval completed: +{} ({} unclaimed)",
                credits,
                self.state.earned_unclaimed()
            );
            self.emit(AccrualEvent::Earned {
                credits,
                earned_unclaimed: self.state.earned_unclaimed(),
            });
        }
        self.emit(AccrualEvent::Tick {
            elapsed_seconds: self.state.elapsed_seconds(),
            earned_unclaimed: self.state.earned_unclaimed(),
            progress: self.state.progress(),
        });
        Flow::Continue
    }

    fn set_visible(
        &mut self,
        visible: bool,
        result_tx: &mpsc::UnboundedSender<Result<ClaimResponse>>,
    ) -> Flow {
        debug!("Surface visible: {}", visible);
        if let Some(ticket) = self.state.set_visible(visible) {
            info!("Surface hidden, claiming {} intervals", ticket.intervals);
            return self.submit(ticket.intervals, ticket.credits, result_tx);
        }
        Flow::Continue
    }

    fn manual_claim(&mut self, result_tx: &mpsc::UnboundedSender<Result<ClaimResponse>>) -> Flow {
        match self.state.begin_claim() {
            Ok(ticket) => self.submit(ticket.intervals, ticket.credits, result_tx),
            Err(reason) => {
                debug!("Claim rejected: {}", reason);
                self.emit(AccrualEvent::ClaimRejected { reason });
                Flow::Continue
            }
        }
    }

    fn submit(
        &mut self,
        intervals: u64,
        credits: u64,
        result_tx: &mpsc::UnboundedSender<Result<ClaimResponse>>,
    ) -> Flow {
        if !self.session.is_active() {
            self.state.claim_failed();
            return self.end_session();
        }

        self.emit(AccrualEvent::ClaimSubmitted { intervals, credits });

        let backend = self.backend.clone();
        let result_tx = result_tx.clone();
        tokio::spawn(async move {
            let result = backend.claim(intervals).await;
            // The loop may be gone by now; the result is simply dropped
            let _ = result_tx.send(result);
        });
        Flow::Continue
    }

    fn claim_finished(&mut self, result: Result<ClaimResponse>) -> Flow {
        match result {
            Ok(response) => {
                let Some(ticket) = self.state.claim_succeeded() else {
                    debug!("Ignoring claim confirmation with no claim outstanding");
                    return Flow::Continue;
                };
                if !self.session.set_balance(response.total_credits) {
                    return self.end_session();
                }
                info!(
                    "Claimed {} credits, balance now {}",
                    ticket.credits, response.total_credits
                );
                self.emit(AccrualEvent::Claimed {
                    credits: ticket.credits,
                    total_credits: response.total_credits,
                });
                Flow::Continue
            }
            Err(e) if e.is_session_ended() => {
                self.state.claim_failed();
                warn!("Claim rejected by backend, session ended: {}", e);
                self.session.end();
                self.end_session()
            }
            Err(e) => {
                self.state.claim_failed();
                warn!("Claim failed, will retry on next claim: {}", e);
                self.emit(AccrualEvent::ClaimFailed {
                    message: e.to_string(),
                });
                Flow::Continue
            }
        }
    }

    fn end_session(&mut self) -> Flow {
        self.emit(AccrualEvent::SessionEnded);
        Flow::Stop
    }

    /// Send an event; the snapshot is published first so a listener that
    /// reads it on receipt sees the state the event describes
    fn emit(&self, event: AccrualEvent) {
        self.publish();
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.snapshot.send_replace(self.state.snapshot());
    }
}
