pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "sealdrop")]
#[command(about = "Encrypted file sharing with wallet login and revocable share tokens")]
pub struct Args {
    /// Remote API URL (defaults to the configured local daemon)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the sealdrop config directory (defaults to ~/.sealdrop)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
