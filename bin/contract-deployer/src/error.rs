use url::Url;

#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    Env(#[from] envconfig::Error),

    #[error(transparent)]
    Provider(#[from] ethers::providers::ProviderError),

    #[error(transparent)]
    Wallet(#[from] ethers::signers::WalletError),

    #[error("Node at {0} has no accounts, set DEPLOYER_PRIVATE_KEY")]
    NoAccounts(Url),
}
