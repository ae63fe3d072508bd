use std::path::PathBuf;

use ethers::{
    contract::ContractError,
    prelude::Middleware,
    providers::ProviderError,
    types::H256,
};

#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error("Artifact for contract {name} not found in {path}")]
    ArtifactNotFound { name: String, path: PathBuf },

    #[error("Multiple artifacts for contract {name}, use one of {}", candidates.join(", "))]
    AmbiguousArtifact {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Contract {0} is abstract and can't be deployed")]
    AbstractContract(String),

    #[error("Contract {name} must be linked against {} before deployment", libraries.join(", "))]
    UnlinkedLibraries {
        name: String,
        libraries: Vec<String>,
    },

    #[error("Malformed artifact {path}")]
    InvalidArtifact {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed bytecode of contract {name}: {reason}")]
    InvalidBytecode { name: String, reason: String },

    #[error("Failed to read artifacts from {path}")]
    ArtifactsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    ProviderError(#[from] ProviderError),

    #[error("Contract error {0}")]
    ContractError(String),

    #[error("Middleware error {0}")]
    Middleware(String),

    #[error("Deployment transaction {0:?} was dropped from the mempool")]
    Dropped(H256),

    #[error("Deployment transaction {0:?} reverted")]
    Reverted(H256),

    #[error("Receipt of deployment transaction {0:?} has no contract address")]
    NoContractAddress(H256),

    #[error("Waiting for deployment transaction {0:?} to be mined timed out")]
    Timedout(H256),
}

impl<M: Middleware> From<ContractError<M>> for Error {
    fn from(value: ContractError<M>) -> Self {
        Self::ContractError(value.to_string())
    }
}

/// The deployer result type.
pub type Result<T> = std::result::Result<T, Error>;
