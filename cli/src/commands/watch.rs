//! `watch`: visibility-driven accrual in the terminal
//!
//! The terminal session is the surface. Lines typed on stdin toggle its
//! visibility or claim; closing stdin hides it, which claims whatever is
//! still unclaimed before exiting.

use crate::{AppState, CliError};
use hostcredits_core::{Countdown, Credits, EarnConfig};
use hostcredits_engine::{
    spawn_accrual_timer, AccrualEvent, AccrualHandle, AccrualSnapshot, ClaimRejected,
};
use hostcredits_networking::{api, CreditsClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How often the earn configuration is re-read from the backend
const CONFIG_REFRESH: Duration = Duration::from_secs(300);

/// Upper bound on waiting for the final claim when leaving
const FINAL_CLAIM_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceCommand {
    Hide,
    Show,
    Claim,
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<SurfaceCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "hide" | "h" => Some(SurfaceCommand::Hide),
        "show" | "s" => Some(SurfaceCommand::Show),
        "claim" | "c" => Some(SurfaceCommand::Claim),
        "status" | "" => Some(SurfaceCommand::Status),
        "help" | "?" => Some(SurfaceCommand::Help),
        "quit" | "q" | "exit" => Some(SurfaceCommand::Quit),
        _ => None,
    }
}

pub async fn run(state: &AppState, visible: bool) -> Result<(), CliError> {
    let client = state.require_session().await?;
    let user = state.session.user();
    let config = api::resolve_earn_config(&client, user.as_ref()).await?;

    println!(
        "Earning {} every {} while visible ({}).",
        Credits(config.credits_per_interval as i64),
        Countdown(config.interval_seconds),
        if visible { "visible" } else { "hidden" }
    );
    print_help();

    let (handle, mut events) =
        spawn_accrual_timer(Arc::new(client.clone()), state.session.clone(), config, visible);

    let result = surface_loop(state, &client, &handle, &mut events, config).await;
    let result = match result {
        Ok(()) => finish(&handle, &mut events).await,
        Err(e) => Err(e),
    };

    handle.stop();
    if let Some(balance) = state.session.balance() {
        println!("Balance: {}", Credits(balance));
    }
    result
}

async fn surface_loop(
    state: &AppState,
    client: &CreditsClient,
    handle: &AccrualHandle,
    events: &mut mpsc::UnboundedReceiver<AccrualEvent>,
    mut config: EarnConfig,
) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut refresh =
        tokio::time::interval_at(tokio::time::Instant::now() + CONFIG_REFRESH, CONFIG_REFRESH);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("stdin closed, hiding surface");
                        return Ok(());
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        return Ok(());
                    }
                };
                match parse_command(&line) {
                    Some(SurfaceCommand::Hide) => handle.set_visible(false),
                    Some(SurfaceCommand::Show) => handle.set_visible(true),
                    Some(SurfaceCommand::Claim) => handle.claim(),
                    Some(SurfaceCommand::Status) => {
                        print_status(&handle.snapshot(), state.session.balance())
                    }
                    Some(SurfaceCommand::Help) => print_help(),
                    Some(SurfaceCommand::Quit) => return Ok(()),
                    None => eprintln!("Unknown command: {} (type `help`)", line.trim()),
                }
            }

            event = events.recv() => {
                let Some(event) = event else {
                    return Ok(());
                };
                if render(&event) {
                    return Err(CliError::SessionExpired);
                }
            }

            _ = refresh.tick() => {
                let user = state.session.user();
                match api::fetch_earn_config(client, user.as_ref()).await {
                    Ok(fresh) if fresh != config => {
                        info!("Earn configuration changed on the backend");
                        println!(
                            "Rate changed: {} every {}",
                            Credits(fresh.credits_per_interval as i64),
                            Countdown(fresh.interval_seconds)
                        );
                        handle.update_config(fresh);
                        config = fresh;
                    }
                    Ok(_) => {}
                    Err(e) if e.is_session_ended() => return Err(e.into()),
                    Err(e) => debug!("Config refresh failed, keeping current rate: {}", e),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                return Ok(());
            }
        }
    }
}

/// Hide the surface and claim until nothing earned is left
///
/// Intervals that complete while a claim is in flight are claimed once it
/// lands, so nothing is left behind on exit.
async fn finish(
    handle: &AccrualHandle,
    events: &mut mpsc::UnboundedReceiver<AccrualEvent>,
) -> Result<(), CliError> {
    let snap = handle.snapshot();
    if snap.earned_unclaimed == 0 && !snap.claim_in_flight {
        return Ok(());
    }

    if snap.visible {
        handle.set_visible(false);
    } else if !snap.claim_in_flight {
        handle.claim();
    }
    println!("Claiming {} before leaving...", Credits(snap.earned_unclaimed as i64));

    let wait = async {
        while let Some(event) = events.recv().await {
            if render(&event) {
                return Err(CliError::SessionExpired);
            }
            match event {
                AccrualEvent::Claimed { .. } => {
                    let snap = handle.snapshot();
                    if snap.earned_unclaimed == 0 {
                        return Ok(());
                    }
                    if !snap.claim_in_flight {
                        handle.claim();
                    }
                }
                AccrualEvent::ClaimFailed { message } => {
                    return Err(CliError::Transient(format!(
                        "final claim failed, unclaimed credits were not submitted: {}",
                        message
                    )))
                }
                AccrualEvent::ClaimRejected {
                    reason: ClaimRejected::NothingToClaim,
                } => return Ok(()),
                _ => {}
            }
        }
        Ok(())
    };

    match tokio::time::timeout(FINAL_CLAIM_TIMEOUT, wait).await {
        Ok(result) => result,
        Err(_) => Err(CliError::Transient("timed out waiting for the final claim".into())),
    }
}

/// Print an event. Returns true when the session has ended.
fn render(event: &AccrualEvent) -> bool {
    match event {
        AccrualEvent::Tick { .. } => {}
        AccrualEvent::Earned {
            credits,
            earned_unclaimed,
        } => println!(
            "+{} ({} unclaimed)",
            Credits(*credits as i64),
            earned_unclaimed
        ),
        AccrualEvent::ClaimSubmitted { intervals, credits } => println!(
            "Claiming {} for {} interval(s)...",
            Credits(*credits as i64),
            intervals
        ),
        AccrualEvent::ClaimRejected { reason } => println!("Cannot claim: {}", reason),
        AccrualEvent::Claimed {
            credits,
            total_credits,
        } => println!(
            "Claimed {}. Balance: {}",
            Credits(*credits as i64),
            Credits(*total_credits)
        ),
        AccrualEvent::ClaimFailed { message } => {
            println!("Claim failed, will retry on next hide or claim: {}", message)
        }
        AccrualEvent::SessionEnded => return true,
    }
    false
}

fn print_status(snap: &AccrualSnapshot, balance: Option<i64>) {
    let interval = snap.config.interval_seconds;
    let to_next = interval - snap.elapsed_seconds % interval;
    println!(
        "{} | {} unclaimed | {:.0}% of interval, next in {}{}",
        if snap.visible { "visible" } else { "hidden" },
        Credits(snap.earned_unclaimed as i64),
        snap.progress,
        Countdown(to_next),
        if snap.claim_in_flight { " | claim in flight" } else { "" }
    );
    if let Some(balance) = balance {
        println!("Balance: {}", Credits(balance));
    }
}

fn print_help() {
    println!("Commands: hide (h), show (s), claim (c), status (enter), quit (q)");
}
