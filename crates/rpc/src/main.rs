//! Campaign CLI - Main entry point

use campaign_rpc::{commands, AppContext};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "campaign")]
#[command(about = "Campaign contribution eligibility and limit tracking", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// KYC registry owner (the initial verifier); recorded by the first run
    /// and required to match on every later one
    #[arg(long, default_value = "owner")]
    owner: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage KYC verification
    Kyc {
        #[command(subcommand)]
        command: KycCommands,
    },

    /// Submit a contribution
    Contribute {
        /// Donor ID or wallet address
        donor: String,
        /// Amount to contribute
        amount: Decimal,
        /// Asset/currency code (USD, or a native asset such as ETH)
        #[arg(long, default_value = "USD")]
        asset: String,
        /// Optional correlation ID
        #[arg(long)]
        correlation_id: Option<String>,
    },

    /// Evaluate a contribution without recording it
    Preview {
        /// Donor ID or wallet address
        donor: String,
        /// Amount to evaluate
        amount: Decimal,
        /// Asset/currency code
        #[arg(long, default_value = "USD")]
        asset: String,
    },

    /// Show a donor's standing and history
    Info {
        /// Donor ID or wallet address
        donor: String,
    },

    /// Show campaign-wide totals
    Stats,

    /// Replay a JSON contribution history through the evaluator
    Audit {
        /// Path to a JSON array of historical contributions
        history: PathBuf,
    },

    /// Verify the ledger hash chain and running totals
    VerifyLedger,

    /// Show or set the ETH/USD price
    Price {
        /// New ETH/USD price
        #[arg(long)]
        set: Option<Decimal>,
    },
}

#[derive(Subcommand)]
enum KycCommands {
    /// Mark a donor as verified
    Verify {
        donor: String,
        /// Verifier making the change (defaults to the owner)
        #[arg(long)]
        by: Option<String>,
    },

    /// Revoke a donor's verification
    Revoke {
        donor: String,
        #[arg(long)]
        by: Option<String>,
    },

    /// Show a donor's KYC status
    Status { donor: String },

    /// Grant the verifier role (owner only)
    AddVerifier { verifier: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // Runs before the context so an unreadable journal is still reported
    if let Commands::VerifyLedger = cli.command {
        if let Err(e) = commands::verify_ledger(&cli.data) {
            println!("❌ Ledger verification failed: {}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let ctx = AppContext::new(&cli.data, &cli.owner).await?;

    match cli.command {
        Commands::Kyc { command } => match command {
            KycCommands::Verify { donor, by } => {
                let by = by.unwrap_or_else(|| cli.owner.clone());
                commands::kyc_verify(&ctx, &by, &donor)?;
            }
            KycCommands::Revoke { donor, by } => {
                let by = by.unwrap_or_else(|| cli.owner.clone());
                commands::kyc_revoke(&ctx, &by, &donor)?;
            }
            KycCommands::Status { donor } => {
                commands::kyc_status(&ctx, &donor).await?;
            }
            KycCommands::AddVerifier { verifier } => {
                commands::kyc_add_verifier(&ctx, &cli.owner, &verifier)?;
            }
        },

        Commands::Contribute {
            donor,
            amount,
            asset,
            correlation_id,
        } => {
            let correlation_id = correlation_id.unwrap_or_else(|| Uuid::new_v4().to_string());
            commands::contribute(&ctx, &donor, amount, &asset, &correlation_id).await?;
        }

        Commands::Preview {
            donor,
            amount,
            asset,
        } => {
            commands::preview(&ctx, &donor, amount, &asset).await?;
        }

        Commands::Info { donor } => {
            commands::info(&ctx, &donor).await?;
        }

        Commands::Stats => {
            commands::stats(&ctx).await?;
        }

        Commands::Audit { history } => {
            commands::audit(&ctx, &history)?;
        }

        // Handled before the context is built
        Commands::VerifyLedger => {}

        Commands::Price { set } => {
            commands::price(&ctx, set).await?;
        }
    }

    Ok(())
}
