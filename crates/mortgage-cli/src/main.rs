use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod chat;
mod display;

use mortgage_core::{
    calculate_mortgage, get_or_create_session_id, validate_mortgage_inputs, ChatClient,
    ClientConfig, Config, Conversation, FileSessionStore, LoanApplicationClient, MortgageInputs,
    SessionStore,
};

#[derive(Parser)]
#[command(name = "mortgage")]
#[command(about = "Mortgage calculator and chat assistant")]
struct Cli {
    /// Agent endpoint root (overrides config and MORTGAGE_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Request deadline in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    /// Log client activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the monthly payment for a fixed-rate mortgage
    Calc {
        /// Amount borrowed; derived from --price minus --down when omitted
        #[arg(short, long)]
        amount: Option<f64>,
        /// Annual interest rate in percent
        #[arg(short, long)]
        rate: f64,
        /// Loan term in years
        #[arg(short, long, default_value = "30")]
        years: u32,
        /// Down payment
        #[arg(short, long, default_value = "0")]
        down: f64,
        /// Property price
        #[arg(short, long)]
        price: Option<f64>,
        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the mortgage assistant a single question
    Ask {
        /// Your question
        question: String,
    },
    /// Chat with the mortgage assistant (interactive)
    Chat,
    /// Check whether the assistant backend is up
    Health,
    /// Show an applicant's summary and estimated mortgage
    Applicant {
        /// Loan application id
        id: u64,
        /// JSON file of applicant rows used when the backend has no record
        #[arg(short, long)]
        fallback: Option<PathBuf>,
    },
    /// Show or update the saved configuration
    Config {
        /// Agent endpoint root to save
        #[arg(long)]
        api_url: Option<String>,
        /// Request deadline in milliseconds to save
        #[arg(long)]
        timeout: Option<u64>,
        /// Conversation turns kept in chat history
        #[arg(long)]
        max_messages: Option<usize>,
    },
    /// Show the current chat session id
    Session {
        /// Forget the stored id and start a new session
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("ignoring unreadable config file: {}", e);
        Config::new()
    });
    let client_config = resolve_client_config(&config, &cli);

    match cli.command {
        Commands::Calc { amount, rate, years, down, price, json } => {
            let inputs = calc_inputs(amount, rate, years, down, price)?;
            run_calculation(&inputs, json)?
        }
        Commands::Ask { question } => {
            let session_id = get_or_create_session_id(&session_store(&config));
            let mut client = ChatClient::new(client_config);
            let mut conversation = Conversation::new(session_id);
            conversation.push_user(question);

            let response = client.send_message(conversation.to_request()).await?;
            println!("{}", response.output_text);
        }
        Commands::Chat => {
            let session_id = get_or_create_session_id(&session_store(&config));
            let mut client = ChatClient::new(client_config);
            let mut conversation =
                Conversation::new(session_id).with_max_messages(config.max_messages());
            chat::chat_interactive(&mut client, &mut conversation).await?
        }
        Commands::Health => {
            let client = ChatClient::new(client_config);
            let health = client.health().await?;
            display::print_health(client.base_url(), &health);
            if !health.is_ready() {
                bail!("assistant backend is not ready");
            }
        }
        Commands::Applicant { id, fallback } => {
            let mut lookup = LoanApplicationClient::new(&client_config);
            if let Some(path) = fallback {
                lookup = lookup.with_fallback(path);
            }
            let summary = lookup.summary(id).await?;
            display::print_applicant(&summary);

            let inputs = summary.mortgage_inputs();
            let issues = validate_mortgage_inputs(&inputs);
            if issues.is_empty() {
                display::print_results(&calculate_mortgage(&inputs));
            } else {
                display::print_issues(&issues);
            }
        }
        Commands::Config { api_url, timeout, max_messages } => {
            let mut config = config;
            if update_config(&mut config, api_url, timeout, max_messages) {
                let path = config.save()?;
                println!("{} {}", "Saved".green(), path.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Session { reset } => {
            let store = session_store(&config);
            if reset {
                store.clear()?;
            }
            println!("{}", get_or_create_session_id(&store));
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "mortgage_core=debug,info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_client_config(config: &Config, cli: &Cli) -> ClientConfig {
    let mut client_config = config.client_config();
    if let Some(url) = &cli.base_url {
        client_config = ClientConfig {
            timeout: client_config.timeout,
            ..ClientConfig::new(url)
        };
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        client_config = client_config.with_timeout_ms(timeout_ms);
    }
    client_config
}

/// Apply the given settings; returns whether anything changed
fn update_config(
    config: &mut Config,
    api_url: Option<String>,
    timeout: Option<u64>,
    max_messages: Option<usize>,
) -> bool {
    let before = config.clone();
    if let Some(url) = api_url {
        config.api_base_url = Some(url.trim_end_matches('/').to_string());
    }
    if let Some(timeout) = timeout {
        config.timeout_ms = Some(timeout);
    }
    if let Some(max_messages) = max_messages {
        config.max_messages = Some(max_messages);
    }
    *config != before
}

fn session_store(config: &Config) -> FileSessionStore {
    config
        .session_file
        .clone()
        .map(FileSessionStore::new)
        .unwrap_or_else(FileSessionStore::default_location)
}

fn calc_inputs(
    amount: Option<f64>,
    rate: f64,
    years: u32,
    down: f64,
    price: Option<f64>,
) -> Result<MortgageInputs> {
    let inputs = match (amount, price) {
        (Some(amount), price) => {
            let inputs = MortgageInputs::new(amount, rate, years).with_down_payment(down);
            match price {
                Some(price) => inputs.with_property_price(price),
                None => inputs,
            }
        }
        (None, Some(price)) => MortgageInputs::from_purchase(price, down, rate, years),
        (None, None) => bail!("either --amount or --price is required"),
    };
    Ok(inputs)
}

fn run_calculation(inputs: &MortgageInputs, json: bool) -> Result<()> {
    let issues = validate_mortgage_inputs(inputs);
    if !issues.is_empty() {
        display::print_issues(&issues);
        bail!("invalid mortgage inputs");
    }

    let results = calculate_mortgage(inputs);
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("\n{}", "🏠 Mortgage Estimate".bold().blue());
        display::print_results(&results);
    }
    Ok(())
}
