//! Shop listing and purchase

use super::{clip, print_json, Output};
use crate::args::ShopSubcommand;
use crate::{AppState, CliError};
use hostcredits_core::{Credits, Product};
use hostcredits_networking::api;
use tracing::info;

pub async fn run(state: &AppState, command: &ShopSubcommand, out: Output) -> Result<(), CliError> {
    let client = state.require_session().await?;
    match command {
        ShopSubcommand::List => {
            let products = api::list_products(&client).await?;
            if out.is_json() {
                return print_json(&products);
            }
            print_products(&products, state.session.balance());
        }
        ShopSubcommand::Buy { product_id } => {
            // Warm the cache so a sold-out product is refused locally
            api::list_products(&client).await?;
            let response = api::purchase(&client, product_id).await?;
            state.session.set_balance(response.remaining_credits);
            info!("Purchased {} (order {:?})", product_id, response.order_id);

            if out.is_json() {
                return print_json(&response);
            }
            if !response.message.is_empty() {
                println!("{}", response.message);
            }
            if let Some(order) = &response.order_id {
                println!("Order:   {}", order);
            }
            println!("Balance: {}", Credits(response.remaining_credits));
        }
    }
    Ok(())
}

pub(crate) fn print_products(products: &[Product], balance: Option<i64>) {
    if products.is_empty() {
        println!("No products available");
        return;
    }
    println!("{:<12} {:<28} {:>8} {:>6}", "ID", "NAME", "PRICE", "STOCK");
    for p in products {
        let note = match balance {
            _ if !p.in_stock() => "  sold out",
            Some(b) if !p.affordable_with(b) => "  need more credits",
            _ => "",
        };
        println!(
            "{:<12} {:<28} {:>8} {:>6}{}",
            clip(&p.id, 12),
            clip(&p.name, 28),
            p.price,
            p.stock,
            note
        );
    }
    if let Some(b) = balance {
        println!("\nBalance: {}", Credits(b));
    }
}
