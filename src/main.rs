//! Token dApp command line client.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI command
//!       │
//!       ▼
//!   DappContext ──▶ ConnectionSession ──▶ ConnectorRegistry ──▶ injected (local key)
//!       │                 │                                  └─▶ walletconnect (relay)
//!       │                 ▼
//!       │           SessionStore (connectorId hint)
//!       │
//!       ├──▶ BalancePoller ──▶ ReadClient (RPC, random endpoint + failover)
//!       └──▶ TokenService ──▶ TokenContract ──▶ reads: ReadClient
//!                                            └─▶ writes: wallet → confirmation wait
//! ```
//!
//! Every run first tries a silent reconnection with the last used connector.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};

use token_dapp::blockchain::ChainReader;
use token_dapp::config::{load_config, load_from_env, DappConfig};
use token_dapp::errors::{DappError, Notification};
use token_dapp::format::{format_native, short};
use token_dapp::lifecycle::spawn_ctrl_c;
use token_dapp::observability::{logging, metrics};
use token_dapp::session::{Balance, ConnectionState, WalletInfo};
use token_dapp::token::{TokenView, TokenWrite};
use token_dapp::wallet::PairingUri;
use token_dapp::DappContext;

#[derive(Parser)]
#[command(name = "token-dapp")]
#[command(about = "Connect a wallet and manage the token contract", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults plus DAPP_* variables when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect a wallet (injected | walletconnect); repeating it disconnects
    Connect { connector: String },
    /// Disconnect the active wallet
    Disconnect,
    /// Show connection, network and balance
    Status,
    /// Follow connection, balance and token changes until Ctrl-C
    Watch,
    /// Token contract actions
    #[command(subcommand)]
    Token(TokenCommand),
    /// Ask the wallet to track the token
    AddToken,
    /// Ask the wallet to switch to (or add) the configured network
    SwitchNetwork,
    /// Sign an ownership message with the connected wallet
    Verify {
        /// Address to prove; defaults to the connected account
        address: Option<Address>,
    },
}

#[derive(Subcommand)]
enum TokenCommand {
    /// Token name, symbol, supply, owner and your balance
    Info,
    Mint {
        amount: String,
    },
    Burn {
        amount: String,
    },
    Transfer {
        recipient: Address,
        amount: String,
    },
    Approve {
        spender: Address,
        amount: String,
    },
    TransferFrom {
        sender: Address,
        recipient: Address,
        amount: String,
    },
    IncreaseAllowance {
        spender: Address,
        amount: String,
    },
    TransferOwnership {
        new_owner: Address,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config: DappConfig = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init_logging(Some(&config.observability.log_level));
    tracing::info!(chain_id = config.network.chain_id, "token-dapp starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let context = DappContext::builder(config)
        .pairing_display(Arc::new(|uri: &PairingUri| {
            println!("Scan this pairing code with your wallet:\n{}", uri);
        }))
        .build()
        .await?;

    context.session.eager_connect().await;

    let action = action_name(&cli.command);
    match run(&context, cli.command).await {
        Ok(notification) => {
            println!("{}", notification);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", Notification::failure(action, &e));
            std::process::exit(1);
        }
    }
}

async fn run(context: &DappContext, command: Commands) -> Result<Notification, DappError> {
    match command {
        Commands::Connect { connector } => {
            let state = context.session.connect(&connector).await?;
            Ok(match state {
                ConnectionState::Connected { .. } => Notification::success(describe(context, &state)),
                _ => Notification::info("Disconnected"),
            })
        }
        Commands::Disconnect => {
            context.session.disconnect().await;
            Ok(Notification::info("Disconnected"))
        }
        Commands::Status => status(context).await,
        Commands::Watch => watch(context).await,
        Commands::Token(command) => token(context, command).await,
        Commands::AddToken => {
            if context.add_token().await? {
                Ok(Notification::success("Token added to wallet"))
            } else {
                Ok(Notification::info("Wallet declined to add the token"))
            }
        }
        Commands::SwitchNetwork => {
            context.switch_network().await?;
            Ok(Notification::success(format!(
                "Switched to {}",
                context.config.network.chain_name
            )))
        }
        Commands::Verify { address } => {
            let address = match address.or_else(|| context.session.state().account()) {
                Some(address) => address,
                None => return Err(token_dapp::wallet::WalletError::NoAccounts.into()),
            };
            let proof = context.verify(address).await?;
            Ok(Notification::success(format!(
                "Signed ownership of {}\n{}",
                proof.address, proof.signature
            )))
        }
    }
}

async fn status(context: &DappContext) -> Result<Notification, DappError> {
    let state = context.session.state();
    let Some(account) = state.account() else {
        return Ok(Notification::info(describe(context, &state)));
    };

    let balance = match context.reader.balance(account).await {
        Ok(wei) => format!(
            "{} {}",
            format_native(wei),
            context.config.network.native_currency.symbol
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Balance unavailable");
            "unavailable".to_string()
        }
    };
    Ok(Notification::info(format!("{}\nBalance: {}", describe(context, &state), balance)))
}

async fn watch(context: &DappContext) -> Result<Notification, DappError> {
    let poller = context.spawn_poller();
    let mut wallet = poller.subscribe();
    let mut states = context.session.subscribe();
    let mut shutdown = context.shutdown.subscribe();
    let _signals = spawn_ctrl_c(context.shutdown.clone());

    let mut token_refresh =
        tokio::time::interval(Duration::from_secs(context.config.session.slow_poll_interval_secs));

    println!("{}", describe(context, &context.session.state()));
    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                println!("{}", describe(context, &state));
            }
            changed = wallet.changed() => {
                if changed.is_err() {
                    break;
                }
                let info = wallet.borrow_and_update().clone();
                if let Some(line) = describe_wallet(context, &info) {
                    println!("{}", line);
                }
            }
            _ = token_refresh.tick() => {
                if let (Ok(service), true) = (context.token(), context.session.state().is_connected()) {
                    match service.info().await {
                        Ok(view) => println!("{}", describe_token(&view)),
                        Err(e) => tracing::warn!(error = %e, "Token refresh failed"),
                    }
                }
            }
            _ = shutdown.recv() => break,
        }
    }

    Ok(Notification::info("Stopped watching"))
}

async fn token(context: &DappContext, command: TokenCommand) -> Result<Notification, DappError> {
    let service = context.token()?;

    let (action, write): (String, TokenWrite) = match command {
        TokenCommand::Info => return Ok(Notification::info(describe_token(&service.info().await?))),
        TokenCommand::Mint { amount } => {
            let value = service.parse_amount(&amount).await?;
            (format!("minted {}", amount), service.mint(value).await?)
        }
        TokenCommand::Burn { amount } => {
            let value = service.parse_amount(&amount).await?;
            (format!("burned {}", amount), service.burn(value).await?)
        }
        TokenCommand::Transfer { recipient, amount } => {
            let value = service.parse_amount(&amount).await?;
            (
                format!("transferred {} to {}", amount, recipient),
                service.transfer(recipient, value).await?,
            )
        }
        TokenCommand::Approve { spender, amount } => {
            let value = service.parse_amount(&amount).await?;
            (
                format!("approved {} to {}", amount, spender),
                service.approve(spender, value).await?,
            )
        }
        TokenCommand::TransferFrom {
            sender,
            recipient,
            amount,
        } => {
            let value = service.parse_amount(&amount).await?;
            (
                format!("transferred {} from {} to {}", amount, sender, recipient),
                service.transfer_from(sender, recipient, value).await?,
            )
        }
        TokenCommand::IncreaseAllowance { spender, amount } => {
            let value = service.parse_amount(&amount).await?;
            (
                format!("increased allowance by {} for {}", amount, spender),
                service.increase_allowance(spender, value).await?,
            )
        }
        TokenCommand::TransferOwnership { new_owner } => (
            format!("transferred ownership to {}", new_owner),
            service.transfer_ownership(new_owner).await?,
        ),
    };

    let explorer = context.config.network.explorer_url.trim_end_matches('/');
    let balance = write
        .view
        .as_ref()
        .map(TokenView::display_balance)
        .unwrap_or_else(|| "refresh failed, run `token info`".to_string());
    Ok(Notification::success(format!(
        "Successfully {} (block {})\n{}/tx/{}\nBalance: {}",
        action,
        write.receipt.block_number,
        explorer,
        write.receipt.tx_hash,
        balance
    )))
}

fn describe(context: &DappContext, state: &ConnectionState) -> String {
    match state {
        ConnectionState::Disconnected => "Not connected".to_string(),
        ConnectionState::Connecting { connector } => {
            format!("Connecting with {}...", connector.display_name())
        }
        ConnectionState::Connected {
            connector,
            account,
            chain_id,
        } => format!(
            "Connected {} via {} on {}",
            short(*account),
            connector.display_name(),
            context.network_label(*chain_id)
        ),
        ConnectionState::Error { connector, message } => {
            format!("{} connection failed: {}", connector.display_name(), message)
        }
    }
}

fn describe_wallet(context: &DappContext, info: &WalletInfo) -> Option<String> {
    let account = info.account?;
    let balance = match info.balance {
        Balance::Unknown => return None,
        Balance::Available(wei) => format!(
            "{} {}",
            format_native(wei),
            context.config.network.native_currency.symbol
        ),
        Balance::Unavailable => "unavailable".to_string(),
    };
    Some(format!(
        "{} on {}: {}",
        short(account),
        info.network.as_deref().unwrap_or("unknown network"),
        balance
    ))
}

fn describe_token(view: &TokenView) -> String {
    format!(
        "{} ({})\nTotal supply: {}\nOwner: {}\nYour balance: {}",
        view.name,
        view.symbol,
        view.display_total_supply(),
        view.display_owner(),
        view.display_balance()
    )
}

fn action_name(command: &Commands) -> &'static str {
    match command {
        Commands::Connect { .. } => "Connect",
        Commands::Disconnect => "Disconnect",
        Commands::Status => "Status",
        Commands::Watch => "Watch",
        Commands::Token(TokenCommand::Info) => "Token info",
        Commands::Token(TokenCommand::Mint { .. }) => "Mint",
        Commands::Token(TokenCommand::Burn { .. }) => "Burn",
        Commands::Token(TokenCommand::Transfer { .. }) => "Transfer",
        Commands::Token(TokenCommand::Approve { .. }) => "Approval",
        Commands::Token(TokenCommand::TransferFrom { .. }) => "Transfer",
        Commands::Token(TokenCommand::IncreaseAllowance { .. }) => "Allowance increase",
        Commands::Token(TokenCommand::TransferOwnership { .. }) => "Ownership transfer",
        Commands::AddToken => "Add token",
        Commands::SwitchNetwork => "Network switch",
        Commands::Verify { .. } => "Verification",
    }
}
