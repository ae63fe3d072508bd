//! [`Toolchain`] over an `ethers` [`Middleware`].

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use ethers::{
    contract::ContractFactory as EthersContractFactory,
    providers::{Middleware, PendingTransaction},
    types::{Address, TransactionReceipt, U64},
};

use crate::{
    artifact::{self, ContractFactory},
    Error, PendingDeployment, Result, Toolchain,
};

/// Settings of the deployment that are not owned by the middleware.
#[derive(Debug, Clone)]
pub struct DeploySettings {
    /// Root of the compiled artifacts.
    pub artifacts_path: PathBuf,

    /// Number of confirmations to wait for.
    pub confirmations: usize,

    /// How long to wait for the confirmations, forever if `None`.
    pub confirmation_timeout: Option<Duration>,
}

/// Deploys contracts through a [`Middleware`].
///
/// The middleware fills and signs the creation transaction; a `SignerMiddleware`
/// with a local wallet and a bare `Provider` with a node-managed sender both work.
#[derive(Debug)]
pub struct EthersToolchain<M> {
    client: Arc<M>,
    sender: Option<Address>,
    settings: DeploySettings,
}

impl<M: Middleware> EthersToolchain<M> {
    /// Create a new toolchain.
    pub fn new(client: Arc<M>, settings: DeploySettings) -> Self {
        Self {
            client,
            sender: None,
            settings,
        }
    }

    /// Send deployments from `sender`, an account unlocked on the node.
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Root of the compiled artifacts.
    pub fn artifacts_path(&self) -> &Path {
        &self.settings.artifacts_path
    }
}

fn deployed_address(
    receipt: Option<TransactionReceipt>,
    pending: &PendingDeployment,
) -> Result<Address> {
    let receipt = receipt.ok_or(Error::Dropped(pending.tx_hash))?;

    if receipt.status == Some(U64::zero()) {
        return Err(Error::Reverted(pending.tx_hash));
    }

    receipt
        .contract_address
        .ok_or(Error::NoContractAddress(pending.tx_hash))
}

#[async_trait]
impl<M> Toolchain for EthersToolchain<M>
where
    M: Middleware + 'static,
{
    async fn contract_factory(&self, name: &str) -> Result<ContractFactory> {
        artifact::contract_factory(&self.settings.artifacts_path, name).await
    }

    async fn deploy(&self, factory: &ContractFactory) -> Result<PendingDeployment> {
        let deployer = EthersContractFactory::new(
            factory.abi.clone(),
            factory.bytecode.clone(),
            self.client.clone(),
        )
        .deploy_tokens(vec![])?;

        let mut tx = deployer.tx;

        if let Some(sender) = self.sender {
            tx.set_from(sender);
        }

        let sent_tx = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| Error::Middleware(e.to_string()))?;

        Ok(PendingDeployment {
            contract_name: factory.contract_name.clone(),
            tx_hash: sent_tx.tx_hash(),
        })
    }

    async fn deployed(&self, pending: &PendingDeployment) -> Result<Address> {
        let confirmation = PendingTransaction::new(pending.tx_hash, self.client.provider())
            .confirmations(self.settings.confirmations);

        let receipt = match self.settings.confirmation_timeout {
            Some(timeout) => tokio::time::timeout(timeout, confirmation)
                .await
                .map_err(|_| Error::Timedout(pending.tx_hash))??,
            None => confirmation.await?,
        };

        deployed_address(receipt, pending)
    }
}
