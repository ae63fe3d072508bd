#![deny(unused_crate_dependencies)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![warn(unused_imports)]

//! Deploys a compiled contract and prints its address.

use std::{io, process::ExitCode, sync::Arc};

use clap::Parser;
use deployer::EthersToolchain;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
};
use eyre::Result;

use cli::Args;
use config::Config;
use error::Error;

mod cli;
mod config;
mod error;
mod report;

async fn run_with_config(config: Config) -> Result<u8> {
    let mut provider = Provider::new(Http::new(config.rpc_url.clone()));

    if let Some(interval) = config.poll_interval() {
        provider = provider.interval(interval);
    }

    let settings = config.deploy_settings();
    vlog::info!(
        "deploying {} from {:?} to {}",
        config.contract_name,
        settings.artifacts_path,
        config.rpc_url
    );

    let code = match config.private_key.as_deref() {
        Some(private_key) => {
            let wallet = private_key
                .trim_start_matches("0x")
                .parse::<LocalWallet>()
                .map_err(Error::from)?;

            let chain_id = match config.chain_id {
                Some(chain_id) => chain_id,
                None => provider.get_chainid().await.map_err(Error::from)?.as_u64(),
            };

            let client = SignerMiddleware::new(provider, wallet.with_chain_id(chain_id));
            vlog::info!("signing for chain {chain_id} as {:?}", client.address());

            let toolchain = EthersToolchain::new(Arc::new(client), settings);

            report::run(
                &toolchain,
                &config.contract_name,
                &mut io::stdout(),
                &mut io::stderr(),
            )
            .await
        }
        None => {
            let sender = provider
                .get_accounts()
                .await
                .map_err(Error::from)?
                .first()
                .copied()
                .ok_or_else(|| Error::NoAccounts(config.rpc_url.clone()))?;
            vlog::info!("sending from node account {sender:?}");

            let toolchain = EthersToolchain::new(Arc::new(provider), settings).with_sender(sender);

            report::run(
                &toolchain,
                &config.contract_name,
                &mut io::stdout(),
                &mut io::stderr(),
            )
            .await
        }
    };

    Ok(code)
}

async fn try_main() -> Result<u8> {
    let args = Args::parse();

    let config = match args.config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    let sentry_guard = vlog::init()?;

    if sentry_guard.is_some() {
        vlog::info!("Starting Sentry");
    } else {
        vlog::info!("No sentry url configured");
    }

    run_with_config(config).await
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("{e:?}");
        return ExitCode::from(report::EXIT_FAILURE);
    }

    match try_main().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{e:?}");
            ExitCode::from(report::EXIT_FAILURE)
        }
    }
}
