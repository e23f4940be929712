//! CHOM Bridge CLI
//!
//! Terminal front end for bridging CHOM between Fantom testnet and Avalanche
//! Fuji over Axelar GMP.
//!
//! - `chom-bridge balances --account <addr>`: CHOM balance on both chains
//! - `chom-bridge bridge --amount <decimal>`: approve, lock and follow the relay
//! - `chom-bridge status --tx-hash <hash>`: one relayer status lookup
//! - `chom-bridge fee`: current relay fee quote

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use clap::{Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use gmp_client::clients::{FeeEstimator, GmpStatusSource};
use gmp_client::evm::{EvmBalanceReader, EvmWalletClient, ReceiptPolling};
use gmp_client::{AxelarQueryClient, AxelarRecoveryClient};
use tracing::{info, warn};

use chom_bridge::amount::format_token_amount;
use chom_bridge::config::Config;
use chom_bridge::{
    BalanceView, BridgeAmount, BridgeClients, BridgeFlow, ChainPair, ChainRegistry, FlowEvent,
    ResetReason,
};

#[derive(Parser)]
#[command(name = "chom-bridge")]
#[command(about = "Bridge CHOM between Fantom and Avalanche over Axelar", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print flow events as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the CHOM balance of an account on both chains
    Balances {
        #[arg(long)]
        account: Address,
    },

    /// Approve, lock and follow a bridge transfer until it executes
    Bridge {
        /// Amount of CHOM, e.g. 10 or 0.5
        #[arg(long)]
        amount: String,

        /// Source chain ID (defaults to SOURCE_CHAIN_ID)
        #[arg(long)]
        source: Option<u64>,
    },

    /// Look up relayer status for a lock transaction
    Status {
        #[arg(long)]
        tx_hash: TxHash,
    },

    /// Quote the relay fee for the configured source chain
    Fee {
        #[arg(long)]
        source: Option<u64>,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::load()?;
    info!(
        environment = %config.axelar_environment,
        axelar_api = %config.axelar_api_url,
        source_chain_id = config.source_chain_id,
        "Configuration loaded"
    );

    let registry = ChainRegistry::testnet();

    match cli.command {
        Commands::Balances { account } => {
            let pair = registry.pair(config.source_chain_id)?;
            show_balances(&config, &pair, account).await
        }
        Commands::Bridge { amount, source } => {
            let amount = BridgeAmount::parse(&amount)?;
            let pair = registry.pair(source.unwrap_or(config.source_chain_id))?;
            run_bridge(&config, pair, amount, cli.json).await
        }
        Commands::Status { tx_hash } => {
            let client = AxelarRecoveryClient::with_api_url(config.axelar_api_url.clone())?;
            let status = client.query_transaction_status(tx_hash).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Commands::Fee { source } => {
            let pair = registry.pair(source.unwrap_or(config.source_chain_id))?;
            let client = AxelarQueryClient::with_api_url(config.axelar_api_url.clone())?;
            let fee = client
                .estimate_gas_fee(
                    pair.source.axelar_chain,
                    pair.destination.axelar_chain,
                    pair.source.gas_token,
                    config.gas_limit,
                )
                .await?;
            println!(
                "{} -> {}: {} {}",
                pair.source.display_name,
                pair.destination.display_name,
                format_token_amount(fee),
                pair.source.gas_token
            );
            Ok(())
        }
    }
}

async fn show_balances(config: &Config, pair: &ChainPair, account: Address) -> Result<()> {
    let reader = EvmBalanceReader::new()
        .with_chain(pair.source.chain_id, config.rpc_url(pair.source.chain_id)?)?
        .with_chain(
            pair.destination.chain_id,
            config.rpc_url(pair.destination.chain_id)?,
        )?;
    let view = BalanceView::new(Arc::new(reader));

    let balances = view.load_pair(account, pair).await;
    println!("{}: {} CHOM", pair.source.display_name, balances.source);
    println!(
        "{}: {} CHOM",
        pair.destination.display_name, balances.destination
    );
    Ok(())
}

async fn run_bridge(config: &Config, pair: ChainPair, amount: BridgeAmount, json: bool) -> Result<()> {
    let source_chain_id = pair.source.chain_id;
    let wallet = EvmWalletClient::new(
        config.rpc_url(source_chain_id)?,
        source_chain_id,
        config.require_private_key()?,
    )
    .wrap_err("Failed to create wallet client")?
    .with_receipt_polling(ReceiptPolling {
        interval: Duration::from_secs(2),
        timeout: config.receipt_timeout(),
    });
    info!(wallet = %wallet.address(), chain_id = source_chain_id, "Wallet ready");

    let clients = BridgeClients {
        chain: Arc::new(wallet),
        fees: Arc::new(AxelarQueryClient::with_api_url(config.axelar_api_url.clone())?),
        status: Arc::new(AxelarRecoveryClient::with_api_url(
            config.axelar_api_url.clone(),
        )?),
    };

    let (flow, mut events) = BridgeFlow::new(clients, config.flow_config(), pair, amount);

    let approve = flow.approve();
    tokio::pin!(approve);
    let mut submitting = true;

    let shutdown = wait_for_shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                warn!("Bridge interrupted; any submitted transaction keeps relaying");
                flow.dispose();
                return Err(eyre!("Interrupted"));
            }
            result = &mut approve, if submitting => {
                submitting = false;
                if let Err(e) = result {
                    while let Ok(event) = events.try_recv() {
                        print_event(&event, json)?;
                    }
                    flow.dispose();
                    return Err(e.into());
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                print_event(&event, json)?;
                match event {
                    FlowEvent::Reset { reason: ResetReason::Completed } => break,
                    FlowEvent::Reset { reason } => {
                        flow.dispose();
                        return Err(eyre!("Bridge attempt ended: {:?}", reason));
                    }
                    _ => {}
                }
            }
        }
    }

    flow.dispose();
    Ok(())
}

fn print_event(event: &FlowEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }
    match event {
        FlowEvent::StepChanged { step } => println!("[step {}] {}", step.index(), step.title()),
        FlowEvent::TransactionRecorded { transaction } => {
            println!("Lock tx {} ({})", transaction.lock_tx_hash, transaction.explorer_url)
        }
        FlowEvent::Notice(notice) if notice.is_error() => eprintln!("error: {}", notice.message),
        FlowEvent::Notice(notice) => println!("{}", notice.message),
        FlowEvent::ResetScheduled { after_ms } => println!("Resetting in {}ms", after_ms),
        FlowEvent::Reset { reason } => println!("Reset ({:?})", reason),
    }
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chom_bridge=debug,gmp_client=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, disposing bridge flow");
        }
        _ = terminate => {
            info!("Received SIGTERM, disposing bridge flow");
        }
    }
}
