use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config, the environment is used when omitted
    #[arg(long)]
    pub(crate) config_path: Option<PathBuf>,
}
