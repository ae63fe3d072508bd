#![deny(unused_crate_dependencies)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![warn(unused_imports)]

//! Deployment of compiled contracts to EVM networks.

mod error;

pub mod artifact;
pub mod ethers_toolchain;

pub use artifact::ContractFactory;
pub use error::{Error, Result};
pub use ethers_toolchain::{DeploySettings, EthersToolchain};

use async_trait::async_trait;
use auto_impl::auto_impl;
use ethers::types::{Address, H256};

/// A submitted contract-creation transaction that is not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeployment {
    /// Name of the contract being created.
    pub contract_name: String,

    /// Hash of the creation transaction.
    pub tx_hash: H256,
}

/// A confirmed deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Address of the created contract.
    pub address: Address,

    /// Hash of the creation transaction.
    pub tx_hash: H256,
}

/// Contract compilation and deployment toolchain.
#[async_trait]
#[auto_impl(&, Arc, Box)]
pub trait Toolchain: Send + Sync {
    /// Resolve the factory of a contract by its name.
    ///
    /// # Arguments
    ///
    /// * `name`: Name of the contract
    async fn contract_factory(&self, name: &str) -> Result<ContractFactory>;

    /// Submit the creation transaction built by `factory` without waiting for it.
    async fn deploy(&self, factory: &ContractFactory) -> Result<PendingDeployment>;

    /// Wait until `pending` is confirmed and return the address of the created contract.
    async fn deployed(&self, pending: &PendingDeployment) -> Result<Address>;
}

/// Deploy contract `name` and wait for the deployment to be confirmed.
///
/// # Arguments
///
/// * `toolchain`: [`Toolchain`] to perform the deployment with
/// * `name`: Name of the contract
pub async fn deploy_contract<T: Toolchain>(toolchain: &T, name: &str) -> Result<Deployment> {
    let factory = toolchain.contract_factory(name).await?;
    vlog::info!("deploying {}", factory.fully_qualified_name());

    let pending = toolchain.deploy(&factory).await?;
    vlog::info!(
        "deployment of {} sent in tx {:?}",
        pending.contract_name,
        pending.tx_hash
    );

    let address = toolchain.deployed(&pending).await?;
    vlog::info!("deployment tx {:?} confirmed", pending.tx_hash);

    Ok(Deployment {
        address,
        tx_hash: pending.tx_hash,
    })
}
