//! `medmarket`: command-line client for the MedMarket gateway.
//!
//! Credentials are kept in a token file between invocations, so a `login`
//! followed by any number of commands behaves like a browser session:
//! expiring tokens are refreshed on the fly and a rejected refresh signs
//! the user out.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use medmarket_models::{OrderStatus, SalesPeriod};
use medmarket_sdk::{
    ApiClient, AuthEvents, ClientConfig, ErrorEvent, FileTokenStore, Method, SdkError, Session,
};

#[derive(Parser, Debug)]
#[command(name = "medmarket")]
#[command(author, version, about = "MedMarket marketplace client", long_about = None)]
pub struct Cli {
    /// Gateway base URL (overrides MEDMARKET_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Token file (default: <config dir>/medmarket/tokens.json)
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Log SDK activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the credentials
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored credentials
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Search the catalog
    Products {
        /// Name substring
        #[arg(long)]
        name: Option<String>,
    },
    /// Shopping cart
    #[command(subcommand)]
    Cart(CartCommand),
    /// Orders
    #[command(subcommand)]
    Orders(OrderCommand),
    /// List company staff (directors, admins)
    Users {
        /// Company id (admins only; directors always see their own)
        #[arg(long)]
        company: Option<u64>,
        /// Name substring
        #[arg(long)]
        name: Option<String>,
    },
    /// Change the signed-in user's password
    Password {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
    /// Send an arbitrary authenticated request
    Request(RequestArgs),
}

#[derive(Subcommand, Debug)]
pub enum CartCommand {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        product_id: u64,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove { product_id: u64 },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum OrderCommand {
    /// List my orders (or every order with --all)
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<OrderStatus>,
        /// Every order on the marketplace (admin only)
        #[arg(long)]
        all: bool,
    },
    /// Turn the cart into an order
    Create,
    /// Show one order
    Show { id: u64 },
    /// Move an order to a new status (seller or admin)
    Status {
        id: u64,
        #[arg(value_parser = parse_status)]
        status: OrderStatus,
    },
    /// Sales report for the signed-in seller's company
    Stats {
        /// week or month
        #[arg(long, default_value_t = SalesPeriod::Week, value_parser = parse_period)]
        period: SalesPeriod,
        /// Only this category
        #[arg(long)]
        category: Option<u64>,
    },
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, ...)
    #[arg(value_parser = parse_method)]
    pub method: Method,

    /// Path below the gateway base, e.g. /product-service/cart
    pub path: String,

    /// JSON body
    #[arg(long)]
    pub body: Option<String>,

    /// Query parameter as key=value; repeatable
    #[arg(short, long = "query", value_parser = parse_pair)]
    pub query: Vec<(String, String)>,
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

fn parse_status(s: &str) -> Result<OrderStatus, String> {
    OrderStatus::parse(s).map_err(|e| e.to_string())
}

fn parse_period(s: &str) -> Result<SalesPeriod, String> {
    s.parse().map_err(|_| format!("expected week or month, got \"{s}\""))
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got \"{s}\""))
}

/// Print every published error and a hint on forced logout.
fn install_listeners(events: &AuthEvents) {
    events
        .errors
        .subscribe(|event: &ErrorEvent| eprintln!("error: {}", describe(event)))
        .detach();
    events
        .force_logout
        .subscribe(|()| eprintln!("session expired: run `medmarket login` to sign in again"))
        .detach();
}

fn describe(event: &ErrorEvent) -> String {
    match (&event.status, &event.method, &event.url) {
        (Some(status), Some(method), Some(url)) => {
            format!("{} ({status} on {} {url})", event.message, method.to_uppercase())
        }
        (None, Some(method), Some(url)) => {
            format!("{} ({} {url})", event.message, method.to_uppercase())
        }
        _ => event.message.clone(),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "medmarket_sdk=debug,info" } else { "error" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn build_session(cli: &Cli) -> anyhow::Result<Session> {
    let mut config = ClientConfig::from_env();
    if let Some(api_url) = &cli.api_url {
        let timeout = config.timeout;
        let margin = config.refresh_margin;
        config = ClientConfig::new(api_url)
            .with_timeout(timeout)
            .with_refresh_margin(margin);
    }

    let store = match &cli.token_file {
        Some(path) => FileTokenStore::open(path)?,
        None => FileTokenStore::open_default()?,
    };

    let events = AuthEvents::new();
    install_listeners(&events);

    let client = ApiClient::new(config, Arc::new(store), events)?;
    Ok(Session::new(client))
}

/// Whether the failure already reached stderr through the error channel.
fn already_reported(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<SdkError>(),
        Some(SdkError::Status { .. } | SdkError::Transport { .. })
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match build_session(&cli) {
        Ok(session) => commands::run(&session, cli.command, cli.json).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !already_reported(&err) {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
