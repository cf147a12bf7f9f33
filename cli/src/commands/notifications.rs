//! Notices from the backend

use super::{print_json, Output};
use crate::args::NotificationsSubcommand;
use crate::{AppState, CliError};

pub async fn run(
    state: &AppState,
    command: &NotificationsSubcommand,
    out: Output,
) -> Result<(), CliError> {
    let client = state.require_session().await?;
    match command {
        NotificationsSubcommand::List => {
            let notices = client.notifications().await?;
            if out.is_json() {
                return print_json(&notices);
            }
            if notices.is_empty() {
                println!("No notifications");
            }
            for n in &notices {
                match &n.title {
                    Some(title) => println!("[{}] {}: {}", n.id, title, n.message),
                    None => println!("[{}] {}", n.id, n.message),
                }
            }
        }
        NotificationsSubcommand::Dismiss { id } => {
            client.dismiss_notification(id).await?;
            println!("Dismissed {}", id);
        }
    }
    Ok(())
}
