//! `earn`: the server-gated cooldown action

use super::{print_json, Output};
use crate::{AppState, CliError};
use hostcredits_core::{Countdown, Credits};
use hostcredits_engine::{spawn_cooldown_timer, CooldownEvent};
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

pub async fn run(state: &AppState, follow: bool, out: Output) -> Result<(), CliError> {
    let client = state.require_session().await?;
    let (handle, mut events) = spawn_cooldown_timer(Arc::new(client), state.session.clone());
    handle.earn();

    let result = loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => {
                eprintln!();
                break Ok(());
            }
        };
        let Some(event) = event else {
            break Ok(());
        };

        if out.is_json() && !matches!(event, CooldownEvent::Countdown { .. }) {
            if let Err(e) = print_json(&event) {
                break Err(e);
            }
        }

        match event {
            CooldownEvent::Granted {
                credits,
                next_earn_in,
                message,
            } => {
                if !out.is_json() {
                    if !message.is_empty() {
                        println!("{}", message);
                    }
                    println!("Balance: {}", Credits(credits));
                    println!("Next earn in {}", Countdown(next_earn_in));
                }
                if !follow || next_earn_in == 0 {
                    break Ok(());
                }
            }
            CooldownEvent::Rejected {
                remaining_seconds,
                message,
            } => {
                if !out.is_json() {
                    println!("Still cooling down: {} remaining", Countdown(remaining_seconds));
                    debug!("Backend said: {}", message);
                }
                if !follow || remaining_seconds == 0 {
                    break Ok(());
                }
            }
            CooldownEvent::Countdown { remaining_seconds } => {
                if !out.is_json() {
                    eprint!("\rNext earn in {}   ", Countdown(remaining_seconds));
                    let _ = std::io::stderr().flush();
                }
            }
            CooldownEvent::Ready => {
                if !out.is_json() {
                    eprintln!("\rReady: run `hostcredits earn` again");
                }
                break Ok(());
            }
            CooldownEvent::EarnFailed { message } => {
                break Err(CliError::Transient(format!("earn failed: {}", message)));
            }
            CooldownEvent::EarnIgnored => {}
            CooldownEvent::SessionEnded => break Err(CliError::SessionExpired),
        }
    };

    handle.stop();
    result
}
