//! Authentication and account commands

use super::{print_json, prompt, Output};
use crate::args::RegisterArgs;
use crate::{AppState, CliError};
use hostcredits_core::{Credits, RegisterRequest, User};
use hostcredits_networking::api;
use tracing::{error, info};

pub async fn login(
    state: &AppState,
    username: &str,
    password: Option<String>,
    out: Output,
) -> Result<(), CliError> {
    let password = match password {
        Some(p) => p,
        None => prompt("Password: ").await?,
    };

    info!("Logging in as {}", username);
    let client = state.anonymous_client()?;
    let response = api::login(&client, username, &password).await.map_err(|e| {
        error!("Login failed: {}", e);
        e
    })?;

    let token = response.credential()?.to_string();
    state.remember(&token, response.user.clone()).await?;
    print_user(&response.user, out, "Logged in as")
}

pub async fn register(state: &AppState, args: &RegisterArgs, out: Output) -> Result<(), CliError> {
    let password = match &args.password {
        Some(p) => p.clone(),
        None => prompt("Password: ").await?,
    };
    let request = RegisterRequest {
        first_name: args.first_name.clone(),
        last_name: args.last_name.clone(),
        email: args.email.clone(),
        username: args.username.clone(),
        password,
    };

    let client = state.anonymous_client()?;
    let response = api::register(&client, &request).await?;
    let token = response.credential()?.to_string();
    state.remember(&token, response.user.clone()).await?;
    print_user(&response.user, out, "Registered")
}

pub async fn logout(state: &AppState) -> Result<(), CliError> {
    if state.forget().await? {
        println!("Logged out of {}", state.base_url);
    } else {
        println!("No saved session for {}", state.base_url);
    }
    Ok(())
}

pub async fn whoami(state: &AppState, out: Output) -> Result<(), CliError> {
    state.require_session().await?;
    let user = state.session.user().ok_or(CliError::NotLoggedIn)?;
    print_user(&user, out, "Logged in as")
}

pub async fn balance(state: &AppState, out: Output) -> Result<(), CliError> {
    let client = state.require_session().await?;
    let credits = client.get_balance().await?;
    state.session.set_balance(credits);

    if out.is_json() {
        return print_json(&serde_json::json!({ "credits": credits }));
    }
    println!("{}", Credits(credits));
    Ok(())
}

pub async fn sessions(state: &AppState, out: Output) -> Result<(), CliError> {
    let saved = state.saved_sessions().await?;
    if out.is_json() {
        return print_json(&saved);
    }
    if saved.is_empty() {
        println!("No saved sessions");
        return Ok(());
    }
    for s in saved {
        let when = s
            .saved_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let marker = if s.base_url == state.base_url { "*" } else { " " };
        println!("{} {:<32} {:<20} {}", marker, s.base_url, s.username, when);
    }
    Ok(())
}

fn print_user(user: &User, out: Output, heading: &str) -> Result<(), CliError> {
    if out.is_json() {
        return print_json(user);
    }
    let role = if user.is_admin() { " (admin)" } else { "" };
    println!("{} {} <{}>{}", heading, user.username, user.email, role);
    println!("Name:    {}", user.display_name());
    println!("Balance: {}", Credits(user.credits));
    Ok(())
}
