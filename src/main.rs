//! Command-line front-end for NRG Predict
//!
//! Lists symbols, requests predictions and buys prediction packages.

use anyhow::Result;
use clap::{Parser, Subcommand};
use nrg_predict::{
    Alert, ClientConfig, ClientConfigBuilder, HttpPredictionClient, KeypairWallet, PredictionApi,
    PurchaseFlow, RpcNetwork, Session, SymbolCatalog, Tier,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "NRG AI Crypto Predictor", long_about = None)]
struct Cli {
    /// Keypair file used as the wallet (defaults to the Solana CLI keypair)
    #[arg(long, global = true)]
    keypair: Option<PathBuf>,

    /// Prediction service base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Solana RPC endpoint
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the symbols the service can predict
    Symbols,
    /// Connect the wallet and print its address
    Wallet,
    /// Predict prices for a symbol
    Predict {
        /// Symbol to predict
        symbol: String,

        /// Number of days to predict (1-7)
        #[arg(short, long, default_value = "1", allow_hyphen_values = true)]
        days: i64,
    },
    /// Buy a prediction package (100, 500, 1000 or unlimited)
    Buy {
        tier: Tier,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = apply_overrides(ClientConfig::from_env()?, &cli);

    let api: Arc<dyn PredictionApi> = Arc::new(HttpPredictionClient::new(config.clone())?);
    let catalog = SymbolCatalog::new(api.clone(), config.symbols_cache_ttl_seconds);
    let mut wallet = open_wallet(&config);
    let mut session = Session::new();

    match cli.command {
        Commands::Symbols => {
            session.load_symbols(&catalog).await?;
            for symbol in &session.symbols {
                println!("{}", symbol.as_str().to_uppercase());
            }
        }
        Commands::Wallet => {
            session.connect_wallet(&mut wallet).await?;
            match session.wallet {
                Some(pubkey) => println!("Connected: {}", pubkey),
                None => println!("Wallet not connected"),
            }
        }
        Commands::Predict { symbol, days } => {
            session.load_symbols(&catalog).await?;
            session.select_symbol(&symbol)?;

            // Without a wallet the prediction is requested anonymously
            if let Err(alert) = session.connect_wallet(&mut wallet).await {
                info!("Predicting anonymously: {}", alert);
            }

            session.predict(api.as_ref(), days).await?;
            println!("{}", session.result);
            if let Some(menu) = session.buy_menu() {
                println!();
                for line in menu {
                    println!("{}", line);
                }
            }
        }
        Commands::Buy { tier } => {
            session.connect_wallet(&mut wallet).await?;
            if session.wallet.is_none() {
                return Err(Alert::ConnectWallet.into());
            }

            let network = Arc::new(RpcNetwork::new(
                config.rpc_url.clone(),
                config.rpc_timeout_seconds,
            ));
            let flow = PurchaseFlow::from_config(&config, network, api.clone())?;

            println!("Buying {} from {}", tier.label(), flow.recipient());
            session.buy_plan(&flow, &wallet, tier).await?;
            println!("{}", session.payment_status);
        }
    }

    Ok(())
}

fn apply_overrides(config: ClientConfig, cli: &Cli) -> ClientConfig {
    let mut builder = ClientConfigBuilder::from_config(config);
    if let Some(url) = &cli.api_url {
        builder = builder.with_api_base_url(url.clone());
    }
    if let Some(url) = &cli.rpc_url {
        builder = builder.with_rpc_url(url.clone());
    }
    if let Some(path) = &cli.keypair {
        builder = builder.with_keypair_path(path.clone());
    }
    builder.build()
}

fn open_wallet(config: &ClientConfig) -> KeypairWallet {
    let default_path = std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config").join("solana").join("id.json"));

    match config.keypair_path.clone().or(default_path) {
        Some(path) => KeypairWallet::from_file(path),
        None => KeypairWallet::unavailable(),
    }
}
