//! Admin commands: users, earn settings and the product catalog

use super::shop::print_products;
use super::{clip, print_json, Output};
use crate::args::{AdjustArgs, AdminSubcommand, ProductsSubcommand, SettingsSubcommand};
use crate::{AppState, CliError};
use hostcredits_core::{
    ActionResponse, Countdown, CreditAdjustment, Credits, ProductDraft, ProductUpdate,
    SettingsUpdate,
};
use hostcredits_networking::{api, CreditsClient};

pub async fn run(state: &AppState, command: &AdminSubcommand, out: Output) -> Result<(), CliError> {
    let client = state.require_session().await?;
    if !state.session.is_admin() {
        return Err(CliError::AdminRequired);
    }

    match command {
        AdminSubcommand::Users => users(&client, out).await,
        AdminSubcommand::AddCredits(args) => adjust(&client, args, true, out).await,
        AdminSubcommand::RemoveCredits(args) => adjust(&client, args, false, out).await,
        AdminSubcommand::Settings(cmd) => settings(&client, &cmd.command, out).await,
        AdminSubcommand::Products(cmd) => products(&client, &cmd.command, out).await,
    }
}

async fn users(client: &CreditsClient, out: Output) -> Result<(), CliError> {
    let users = api::list_users(client).await?;
    if out.is_json() {
        return print_json(&users);
    }
    println!("{:<10} {:<16} {:<28} {:>8} {}", "ID", "USERNAME", "EMAIL", "CREDITS", "ROLE");
    for u in &users {
        println!(
            "{:<10} {:<16} {:<28} {:>8} {}",
            clip(&u.id, 10),
            clip(&u.username, 16),
            clip(&u.email, 28),
            u.credits,
            if u.is_admin() { "admin" } else { "user" }
        );
    }
    Ok(())
}

async fn adjust(
    client: &CreditsClient,
    args: &AdjustArgs,
    add: bool,
    out: Output,
) -> Result<(), CliError> {
    let adjustment = CreditAdjustment {
        user_id: args.user_id.clone(),
        amount: args.amount,
        reason: args.reason.clone(),
    };
    let response = if add {
        api::add_credits(client, &adjustment).await?
    } else {
        api::remove_credits(client, &adjustment).await?
    };

    if out.is_json() {
        return print_json(&response);
    }
    if !response.message.is_empty() {
        println!("{}", response.message);
    }
    println!("User {} now has {}", args.user_id, Credits(response.new_credits));
    Ok(())
}

async fn settings(
    client: &CreditsClient,
    command: &SettingsSubcommand,
    out: Output,
) -> Result<(), CliError> {
    match command {
        SettingsSubcommand::Show => {
            let settings = api::get_settings(client).await?;
            if out.is_json() {
                return print_json(&settings);
            }
            println!("Credit amount:   {}", Credits(settings.credit_amount as i64));
            println!("Credit interval: {}", Countdown(settings.credit_interval));
            println!("Anti-adblock:    {}", settings.anti_adblock_enabled);
            Ok(())
        }
        SettingsSubcommand::Set {
            credit_amount,
            credit_interval,
            anti_adblock,
        } => {
            let update = SettingsUpdate {
                credit_amount: *credit_amount,
                credit_interval: *credit_interval,
                anti_adblock_enabled: *anti_adblock,
            };
            let response = api::update_settings(client, &update).await?;
            report(&response, "Settings updated", out)
        }
    }
}

async fn products(
    client: &CreditsClient,
    command: &ProductsSubcommand,
    out: Output,
) -> Result<(), CliError> {
    match command {
        ProductsSubcommand::List => {
            let products = api::list_products(client).await?;
            if out.is_json() {
                return print_json(&products);
            }
            print_products(&products, None);
            Ok(())
        }
        ProductsSubcommand::Create {
            name,
            description,
            price,
            stock,
        } => {
            let draft = ProductDraft {
                name: name.clone(),
                description: description.clone(),
                price: *price,
                stock: *stock,
            };
            let product = api::create_product(client, &draft).await?;
            if out.is_json() {
                return print_json(&product);
            }
            println!("Created {} ({})", product.name, product.id);
            Ok(())
        }
        ProductsSubcommand::Update {
            id,
            name,
            description,
            price,
            stock,
        } => {
            let update = ProductUpdate {
                name: name.clone(),
                description: description.clone(),
                price: *price,
                stock: *stock,
            };
            let response = api::update_product(client, id, &update).await?;
            report(&response, &format!("Updated {}", id), out)
        }
        ProductsSubcommand::Delete { id } => {
            let response = api::delete_product(client, id).await?;
            report(&response, &format!("Deleted {}", id), out)
        }
    }
}

fn report(response: &ActionResponse, fallback: &str, out: Output) -> Result<(), CliError> {
    if out.is_json() {
        return print_json(response);
    }
    if response.message.is_empty() {
        println!("{}", fallback);
    } else {
        println!("{}", response.message);
    }
    Ok(())
}
