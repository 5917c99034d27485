use std::path::PathBuf;

use clap::Parser;

/// Check out a sheet of items to their users in one batch.
#[derive(Debug, Parser)]
#[command(name = "bulk-checkout", version)]
pub struct Cli {
    /// CSV or Excel sheet with PRIMARYIDENTIFIER and BARCODE columns
    pub input: PathBuf,
    /// RON settings file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Library code loans are created at
    #[arg(long)]
    pub library: Option<String>,
    /// Circulation desk code loans are created at
    #[arg(long)]
    pub circ_desk: Option<String>,
    /// Maximum concurrent requests
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Retries per item for server and network errors
    #[arg(long)]
    pub retries: Option<u32>,
    /// API base URL
    #[arg(long)]
    pub base_url: Option<String>,
    /// API key
    #[arg(long, env = "ALMA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Directory for checkout_results.csv and return_barcodes.txt
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    /// Also write logs to ./checkout.log
    #[arg(long)]
    pub log_file: bool,
    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}
