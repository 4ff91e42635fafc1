//! FolioGuard command-line front end.
//!
//! Operates on the database named by `DATABASE_URL` and prints results as
//! JSON on stdout. Logs go to stderr.
//!
//! # Usage
//! ```sh
//! folioguard create-portfolio --user alice
//! folioguard invest --user alice --amount 1000000 --type STOCK --strategy CONSERVATIVE
//! folioguard analyze --portfolio <id>
//! folioguard rebalance --portfolio <id> --set <investment-id>=250000
//! ```
//!
//! # Environment Variables
//! - `DATABASE_URL` - SQLite URL (default: sqlite://folioguard.db)
//! - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `DEFAULT_CURRENCY` - Currency for empty portfolios (default: JPY)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folioguard::application::bootstrap::{PersistenceBootstrap, ServicesBootstrap};
use folioguard::config::Config;
use folioguard::domain::errors::DomainError;
use folioguard::domain::investment::InvestmentId;
use folioguard::domain::money::Money;
use folioguard::domain::repositories::EventRepository;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty portfolio for a user
    CreatePortfolio {
        #[arg(short, long)]
        user: String,
    },
    /// Add an investment to the user's portfolio
    Invest {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        amount: Decimal,

        /// Currency code (defaults to DEFAULT_CURRENCY)
        #[arg(short, long)]
        currency: Option<String>,

        /// STOCK, BOND or REAL_ESTATE
        #[arg(short = 't', long = "type")]
        investment_type: String,

        /// CONSERVATIVE, MODERATE or AGGRESSIVE
        #[arg(short, long)]
        strategy: String,
    },
    /// Print a portfolio, by id or by owner
    Show {
        #[arg(short, long, conflicts_with = "user", required_unless_present = "user")]
        portfolio: Option<String>,

        #[arg(short, long)]
        user: Option<String>,
    },
    /// Risk score, allocation and rebalancing suggestions
    Analyze {
        #[arg(short, long)]
        portfolio: String,
    },
    /// Set new amounts for investments in one transaction
    Rebalance {
        #[arg(short, long)]
        portfolio: String,

        /// <investment-id>=<amount>, repeatable
        #[arg(long = "set", value_parser = parse_change, required = true)]
        changes: Vec<(String, Decimal)>,
    },
    /// Remove an investment from its portfolio
    Remove {
        #[arg(short, long)]
        investment: String,
    },
    /// Check the aggressive allocation ceiling
    Validate {
        #[arg(short, long)]
        portfolio: String,
    },
    /// List recorded domain events
    Events {
        /// Only events of this portfolio or investment
        #[arg(short, long)]
        aggregate: Option<String>,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

fn parse_change(raw: &str) -> Result<(String, Decimal), String> {
    let (id, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <investment-id>=<amount>, got '{}'", raw))?;
    let amount = Decimal::from_str(amount.trim()).map_err(|e| e.to_string())?;
    Ok((id.trim().to_string(), amount))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let persistence = PersistenceBootstrap::init(&config.database).await?;
    let services = ServicesBootstrap::init(&config, &persistence).await?;
    let portfolios = &services.portfolio_use_case;
    let investments = &services.investment_use_case;

    match cli.command {
        Commands::CreatePortfolio { user } => {
            print_json(&portfolios.create_portfolio(&user).await?)?;
        }
        Commands::Invest {
            user,
            amount,
            currency,
            investment_type,
            strategy,
        } => {
            let currency =
                currency.unwrap_or_else(|| config.default_currency.code().to_string());
            let investment = investments
                .create_investment(&user, amount, &currency, &investment_type, &strategy)
                .await?;
            print_json(&investment)?;
        }
        Commands::Show { portfolio, user } => {
            let found = match (portfolio, user) {
                (Some(id), _) => portfolios.get_portfolio(&id).await?,
                (None, Some(user)) => portfolios.get_user_portfolio(&user).await?,
                (None, None) => anyhow::bail!("either --portfolio or --user is required"),
            };
            print_json(&found)?;
        }
        Commands::Analyze { portfolio } => {
            print_json(&portfolios.get_portfolio_analysis(&portfolio).await?)?;
        }
        Commands::Rebalance { portfolio, changes } => {
            let current = portfolios.get_portfolio(&portfolio).await?;
            let currency = current.currency().unwrap_or(config.default_currency);

            let mut amounts = HashMap::new();
            for (id, amount) in changes {
                let money = Money::new(amount, currency)
                    .with_context(|| format!("Invalid amount for investment {}", id))?;
                amounts.insert(InvestmentId::new(id), money);
            }

            portfolios.rebalance_portfolio(&portfolio, amounts).await?;
            print_json(&portfolios.get_portfolio_analysis(&portfolio).await?)?;
        }
        Commands::Remove { investment } => {
            print_json(&investments.remove_investment(&investment).await?)?;
        }
        Commands::Validate { portfolio } => {
            portfolios.validate_portfolio(&portfolio).await?;
            info!("Portfolio {} is within its risk limits", portfolio);
        }
        Commands::Events { aggregate, limit } => {
            let events = match aggregate {
                Some(id) => persistence.event_repository.find_by_aggregate_id(&id).await?,
                None => persistence.event_repository.find_recent(limit).await?,
            };
            print_json(&events)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(stderr_layer)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<DomainError>() {
                Some(domain) => error!(code = domain.code(), "{}", domain),
                None => error!("{:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
