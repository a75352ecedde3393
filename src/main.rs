use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wallet_batcher::{
    checker::check_balances,
    config::{keys_path_from_env, Settings, DEFAULT_SETTINGS_PATH},
    encoder::AbiEncoder,
    jobs::{self, Asset, ClaimMode},
    utils::{append_private_keys, dedup_keys, generate_private_keys, load_private_keys, parse_selection},
    wallet::{execution::strategy_for, Wallet},
    ExecutionReport, RpcClient,
};

#[derive(Parser)]
#[command(name = "wallet-batcher")]
#[command(about = "Batch transfers, sweeps and claims across many wallets", long_about = None)]
struct Cli {
    /// Settings file
    #[arg(short, long, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    /// Keys file, one private key per line (defaults to KEYS_PATH or data/keys.txt)
    #[arg(short, long)]
    keys: Option<PathBuf>,

    /// Wallets to use: all, 3, 1,2,5 or 2-4
    #[arg(short, long, default_value = "all")]
    wallets: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print coin, token and NFT balances of the selected wallets
    Check,
    /// Sweep balances above the configured minimums into one address
    Collect {
        #[arg(value_enum)]
        asset: Asset,
        receiver: String,
    },
    /// Send random amounts from one wallet to all others
    MultiSend {
        #[arg(value_enum)]
        asset: Asset,
        /// 1-based index of the sending wallet
        sender: usize,
    },
    /// Approve the payment token and/or claim NFTs from the drop
    Claim {
        #[arg(value_enum)]
        mode: ClaimMode,
    },
    /// Send a dust self-transfer from every wallet
    Unbug,
    /// Generate new private keys and append them to the keys file
    Generate { count: usize },
}

fn init_tracing() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "wallet-batcher.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    guard
}

fn log_report(report: &ExecutionReport) {
    info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        total = report.total(),
        "Run finished"
    );
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let _guard = init_tracing();
    let cli = Cli::parse();
    let keys_path = cli
        .keys
        .clone()
        .unwrap_or_else(|| PathBuf::from(keys_path_from_env()));

    if let Commands::Generate { count } = cli.command {
        if count == 0 {
            eyre::bail!("count must be greater than 0");
        }
        append_private_keys(&keys_path, &generate_private_keys(count))?;
        info!("Successfully generated and saved {} wallets", count);
        return Ok(());
    }

    let settings = Arc::new(Settings::load(&cli.settings)?);

    let (keys, duplicates) = dedup_keys(load_private_keys(&keys_path)?);
    if duplicates > 0 {
        warn!("Keys list contains {} duplicates, using first occurrences", duplicates);
    }
    if keys.is_empty() {
        eyre::bail!("Fill in the keys list: {}", keys_path.display());
    }

    let client = RpcClient::connect(&settings.rpc_url).await?;
    match client.chain_id().await {
        Ok(chain_id) if chain_id != settings.chain_id => warn!(
            expected = settings.chain_id,
            actual = chain_id,
            "RPC endpoint serves a different chain"
        ),
        Ok(chain_id) => info!("Provider Chain ID: {}", chain_id),
        Err(e) => warn!(error = %e, "Could not verify chain ID"),
    }

    let all_wallets = Wallet::from_keys(
        &keys,
        Arc::new(client),
        Arc::new(AbiEncoder),
        settings.clone(),
    )?;
    let wallets: Vec<Wallet> = parse_selection(&cli.wallets, all_wallets.len())?
        .into_iter()
        .map(|position| all_wallets[position].clone())
        .collect();
    info!("Loaded {} of {} wallets", wallets.len(), all_wallets.len());

    let strategy = strategy_for(&settings);

    let result = match cli.command {
        Commands::Check => check_balances(&wallets).await.map(|_| None),
        Commands::Collect { asset, receiver } => {
            jobs::collect(&wallets, strategy.as_ref(), &settings, &receiver, asset)
                .await
                .map(Some)
        }
        Commands::MultiSend { asset, sender } => {
            jobs::multi_send(&wallets, &settings, sender, asset)
                .await
                .map(Some)
        }
        Commands::Claim { mode } => jobs::claim_nfts(&wallets, strategy.as_ref(), &settings, mode)
            .await
            .map(Some),
        Commands::Unbug => jobs::unbug(&wallets, strategy.as_ref()).await.map(Some),
        Commands::Generate { .. } => Ok(None),
    };

    match result {
        Ok(Some(report)) => log_report(&report),
        Ok(None) => {}
        Err(e) => error!("{}", e),
    }

    Ok(())
}
