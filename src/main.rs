//! Karbun CLI Application
//!
//! A command-line interface for deploying and using the Karbun token ledger.

use clap::{Parser, Subcommand};
use karbun::api::{create_router, ApiConfig, ApiState};
use karbun::cli::{self, AppState};
use karbun::storage::Storage;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "karbun")]
#[command(version = "0.1.0")]
#[command(about = "Karbun (KBC) fixed-supply token ledger", long_about = None)]
struct Cli {
    /// Data directory for ledger storage
    #[arg(short, long, default_value = ".karbun_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the ledger, minting the full supply to the deployer
    Init {
        /// Deployer address (a new account is generated if omitted)
        #[arg(long)]
        deployer: Option<String>,
    },

    /// Display token information
    Info,

    /// Show token and native balance of an account
    Balance {
        /// Account address
        #[arg(short, long)]
        address: String,
    },

    /// List the largest token holders
    Holders {
        /// Number of holders to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Transfer tokens
    Transfer {
        /// Sender address
        #[arg(short, long)]
        from: String,

        /// Recipient address
        #[arg(short, long)]
        to: String,

        /// Amount in whole tokens (fractions allowed, e.g. 1.5)
        #[arg(short, long)]
        amount: String,
    },

    /// Approve a spender
    Approve {
        /// Token owner address
        #[arg(short, long)]
        owner: String,

        /// Spender address
        #[arg(short, long)]
        spender: String,

        /// Allowance in whole tokens
        #[arg(short, long)]
        amount: String,
    },

    /// Show the allowance an owner granted a spender
    Allowance {
        #[arg(short, long)]
        owner: String,

        #[arg(short, long)]
        spender: String,
    },

    /// Spend tokens on behalf of an owner
    TransferFrom {
        /// Spender (caller) address
        #[arg(short, long)]
        spender: String,

        /// Owner whose tokens are moved
        #[arg(short, long)]
        from: String,

        /// Recipient address
        #[arg(short, long)]
        to: String,

        /// Amount in whole tokens
        #[arg(short, long)]
        amount: String,
    },

    /// Transfer ledger ownership, or renounce it when no new owner is given
    Ownership {
        /// Current owner address
        #[arg(short, long)]
        caller: String,

        /// New owner address
        #[arg(short, long)]
        new_owner: Option<String>,
    },

    /// Send native currency
    Send {
        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        to: String,

        /// Value in whole native units
        #[arg(short, long)]
        value: String,
    },

    /// Credit native currency to an account
    Fund {
        #[arg(short, long)]
        address: String,

        /// Value in whole native units
        #[arg(short, long)]
        value: String,
    },

    /// Show recent ledger events
    Events {
        /// Number of events to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Account operations
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Export state to file
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import state from file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// REST API server
    Api {
        #[command(subcommand)]
        action: ApiCommands,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Generate a new account key pair
    New,

    /// Show the address of a private key
    Show {
        /// Hex-encoded private key
        #[arg(short, long)]
        private_key: String,
    },
}

#[derive(Subcommand)]
enum ApiCommands {
    /// Start the REST API server
    Start {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Commands that don't need loaded state
    match &cli.command {
        Commands::Init { deployer } => {
            return cli::cmd_init(&cli.data_dir, deployer.as_deref());
        }
        Commands::Account { action } => {
            return match action {
                AccountCommands::New => cli::cmd_account_new(),
                AccountCommands::Show { private_key } => cli::cmd_account_show(private_key),
            };
        }
        Commands::Api { action } => {
            return run_api_command(action, &cli.data_dir);
        }
        _ => {}
    }

    let mut state = AppState::new(cli.data_dir.clone())?;

    match cli.command {
        Commands::Init { .. } | Commands::Account { .. } | Commands::Api { .. } => {}

        Commands::Info => {
            cli::cmd_info(&state)?;
        }

        Commands::Balance { address } => {
            cli::cmd_balance(&state, &address)?;
        }

        Commands::Holders { count } => {
            cli::cmd_holders(&state, count)?;
        }

        Commands::Transfer { from, to, amount } => {
            cli::cmd_transfer(&mut state, &from, &to, &amount)?;
        }

        Commands::Approve {
            owner,
            spender,
            amount,
        } => {
            cli::cmd_approve(&mut state, &owner, &spender, &amount)?;
        }

        Commands::Allowance { owner, spender } => {
            cli::cmd_allowance(&state, &owner, &spender)?;
        }

        Commands::TransferFrom {
            spender,
            from,
            to,
            amount,
        } => {
            cli::cmd_transfer_from(&mut state, &spender, &from, &to, &amount)?;
        }

        Commands::Ownership { caller, new_owner } => {
            cli::cmd_ownership(&mut state, &caller, new_owner.as_deref())?;
        }

        Commands::Send { from, to, value } => {
            cli::cmd_send(&mut state, &from, &to, &value)?;
        }

        Commands::Fund { address, value } => {
            cli::cmd_fund(&mut state, &address, &value)?;
        }

        Commands::Events { count } => {
            cli::cmd_events(&state, count)?;
        }

        Commands::Export { output } => {
            cli::cmd_export(&state, &output)?;
        }

        Commands::Import { input } => {
            cli::cmd_import(&mut state, &input)?;
        }
    }

    Ok(())
}

fn run_api_command(
    action: &ApiCommands,
    data_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        match action {
            ApiCommands::Start { port } => {
                let config = ApiConfig {
                    port: port.unwrap_or(ApiConfig::default().port),
                };

                let storage = Storage::new(cli::storage_config(data_dir))?;
                if !storage.exists() {
                    println!("❌ No ledger found at {:?}. Run `karbun init` first.", data_dir);
                    return Ok(());
                }
                let runtime = storage.load()?;
                let state = ApiState::new(runtime, storage);
                let shutdown_state = state.clone();

                let app = create_router(state);
                let addr = format!("0.0.0.0:{}", config.port);

                println!("🚀 REST API server starting on http://localhost:{}", config.port);
                println!();
                println!("📡 Available endpoints:");
                println!("   GET  /health                          - Health check");
                println!("   GET  /api/token                       - Token info");
                println!("   GET  /api/token/balance/{{holder}}      - Token balance");
                println!("   GET  /api/token/allowance             - Allowance (?owner=&spender=)");
                println!("   GET  /api/token/events                - Event log (?since=)");
                println!("   POST /api/token/transfer              - Transfer tokens");
                println!("   POST /api/token/approve               - Approve spender");
                println!("   POST /api/token/transferFrom          - Delegated transfer");
                println!("   POST /api/token/ownership             - Transfer/renounce ownership");
                println!("   POST /api/send                        - Send native currency");
                println!("   GET  /api/accounts/{{address}}          - Account balances");
                println!();

                // Handle Ctrl+C with graceful shutdown
                tokio::spawn(async move {
                    tokio::signal::ctrl_c().await.ok();
                    println!("\n📴 Shutting down API server...");

                    println!("💾 Saving data...");
                    let runtime = shutdown_state.runtime.read().await;
                    match shutdown_state.storage.save(&runtime) {
                        Ok(()) => println!("✅ Data saved successfully!"),
                        Err(e) => log::error!("Failed to save state on shutdown: {}", e),
                    }
                    std::process::exit(0);
                });

                let listener = tokio::net::TcpListener::bind(&addr).await?;
                axum::serve(listener, app).await?;
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
