// CLI module for fhir2spine
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;

/// fhir2spine - FHIR Patient search to Spine PDS bridging gateway
#[derive(Parser, Debug)]
#[command(name = "fhir2spine", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.fhir2spine/config.toml)
    #[arg(short, long, env = "FHIR2SPINE_CONFIG")]
    pub config: Option<String>,

    /// Number of request handler workers (overrides queue.workers)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}
