//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use hostcredits_networking::http::DEFAULT_BASE_URL;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hostcredits", version, about = "Earn and spend hosting credits")]
pub struct Cli {
    /// Backend base URL (API paths live under /api)
    #[arg(long, env = "HOSTCREDITS_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Where saved sessions are stored
    #[arg(long, env = "HOSTCREDITS_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs_next::data_local_dir()
                .map(|p| p.join("hostcredits"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and remember the session
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "HOSTCREDITS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and remember the session
    Register(RegisterArgs),
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Refresh and show the balance
    Balance,
    /// Try the timed earn action
    Earn {
        /// Keep counting down until the next earn is allowed
        #[arg(long)]
        follow: bool,
    },
    /// Accrue credits while this terminal session is marked visible
    Watch {
        /// Start hidden
        #[arg(long)]
        hidden: bool,
    },
    /// Show credit adjustments
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    Shop(ShopCommand),
    Notifications(NotificationsCommand),
    Admin(AdminCommand),
    /// List sessions saved on this machine
    Sessions,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    /// Read from stdin when omitted
    #[arg(long, env = "HOSTCREDITS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShopCommand {
    #[command(subcommand)]
    pub command: ShopSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ShopSubcommand {
    /// List products
    List,
    /// Buy a product
    Buy { product_id: String },
}

#[derive(Args, Debug)]
pub struct NotificationsCommand {
    #[command(subcommand)]
    pub command: NotificationsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum NotificationsSubcommand {
    List,
    Dismiss { id: String },
}

#[derive(Args, Debug)]
pub struct AdminCommand {
    #[command(subcommand)]
    pub command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum AdminSubcommand {
    /// List all users
    Users,
    AddCredits(AdjustArgs),
    RemoveCredits(AdjustArgs),
    Settings(SettingsCommand),
    Products(ProductsCommand),
}

#[derive(Args, Debug)]
pub struct AdjustArgs {
    pub user_id: String,
    pub amount: i64,
    #[arg(long)]
    pub reason: String,
}

#[derive(Args, Debug)]
pub struct SettingsCommand {
    #[command(subcommand)]
    pub command: SettingsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SettingsSubcommand {
    Show,
    Set {
        /// Credits granted per interval
        #[arg(long)]
        credit_amount: Option<u64>,
        /// Interval length in seconds
        #[arg(long)]
        credit_interval: Option<u64>,
        #[arg(long)]
        anti_adblock: Option<bool>,
    },
}

#[derive(Args, Debug)]
pub struct ProductsCommand {
    #[command(subcommand)]
    pub command: ProductsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ProductsSubcommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        price: i64,
        #[arg(long)]
        stock: i64,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<i64>,
        #[arg(long)]
        stock: Option<i64>,
    },
    Delete { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_admin_settings_set() {
        let cli = Cli::try_parse_from([
            "hostcredits",
            "admin",
            "settings",
            "set",
            "--credit-amount",
            "2",
            "--credit-interval",
            "300",
        ])
        .unwrap();
        match cli.command {
            Command::Admin(AdminCommand {
                command:
                    AdminSubcommand::Settings(SettingsCommand {
                        command:
                            SettingsSubcommand::Set {
                                credit_amount,
                                credit_interval,
                                anti_adblock,
                            },
                    }),
            }) => {
                assert_eq!(credit_amount, Some(2));
                assert_eq!(credit_interval, Some(300));
                assert_eq!(anti_adblock, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hostcredits",
            "earn",
            "--follow",
            "--base-url",
            "http://backend:9000",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.base_url, "http://backend:9000");
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Earn { follow: true }));
    }

    #[test]
    fn test_explicit_data_dir() {
        let cli =
            Cli::try_parse_from(["hostcredits", "--data-dir", "/tmp/hc", "sessions"]).unwrap();
        assert_eq!(cli.data_dir(), PathBuf::from("/tmp/hc"));
    }
}
