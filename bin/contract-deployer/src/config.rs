use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use deployer::DeploySettings;
use envconfig::Envconfig;
use serde::Deserialize;
use url::Url;

use crate::error::Error;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_CONTRACT_NAME: &str = "YourContract";
const DEFAULT_ARTIFACTS_PATH: &str = "artifacts";

/// Deployer configuration.
///
/// Read from a TOML file or from `DEPLOYER_*` environment variables.
#[derive(Deserialize, Envconfig)]
pub(crate) struct Config {
    /// JSON-RPC endpoint of the network.
    #[envconfig(from = "DEPLOYER_RPC_URL", default = "http://127.0.0.1:8545")]
    #[serde(default = "default_rpc_url")]
    pub rpc_url: Url,

    /// Key of the deploying account. The first node account is used if not set.
    #[envconfig(from = "DEPLOYER_PRIVATE_KEY")]
    #[serde(default)]
    pub private_key: Option<String>,

    /// Chain id to sign for, queried from the node if not set.
    #[envconfig(from = "DEPLOYER_CHAIN_ID")]
    #[serde(default)]
    pub chain_id: Option<u64>,

    #[envconfig(from = "DEPLOYER_CONTRACT_NAME", default = "YourContract")]
    #[serde(default = "default_contract_name")]
    pub contract_name: String,

    #[envconfig(from = "DEPLOYER_ARTIFACTS_PATH", default = "artifacts")]
    #[serde(default = "default_artifacts_path")]
    pub artifacts_path: PathBuf,

    #[envconfig(from = "DEPLOYER_CONFIRMATIONS", default = "1")]
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,

    #[envconfig(from = "DEPLOYER_CONFIRMATION_TIMEOUT_MS")]
    #[serde(default)]
    pub confirmation_timeout_ms: Option<u64>,

    #[envconfig(from = "DEPLOYER_POLL_INTERVAL_MS")]
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

fn default_rpc_url() -> Url {
    Url::parse(DEFAULT_RPC_URL).expect("default rpc url is valid; qed")
}

fn default_contract_name() -> String {
    DEFAULT_CONTRACT_NAME.to_string()
}

fn default_artifacts_path() -> PathBuf {
    PathBuf::from(DEFAULT_ARTIFACTS_PATH)
}

fn default_confirmations() -> usize {
    1
}

impl Config {
    pub(crate) fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(config_path)?;

        let config: Config = toml::from_str(&contents)?;

        Ok(config)
    }

    pub(crate) fn from_env() -> Result<Self, Error> {
        dotenvy::dotenv().ok();

        Ok(Self::init_from_env()?)
    }

    pub(crate) fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_ms.map(Duration::from_millis)
    }

    pub(crate) fn deploy_settings(&self) -> DeploySettings {
        DeploySettings {
            artifacts_path: self.artifacts_path.clone(),
            confirmations: self.confirmations,
            confirmation_timeout: self.confirmation_timeout_ms.map(Duration::from_millis),
        }
    }
}
