use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "occupancy", version, about = "Live facility occupancy, with an offline cache fallback")]
pub struct Cli {
    /// Facility numbers separated by the configured delimiter (e.g. "1;2;3").
    /// At most three are shown; invalid entries are skipped.
    pub facilities: Option<String>,

    /// Serve cached readings when the network is unreachable.
    #[arg(long, value_name = "BOOL")]
    pub offline_mode: Option<bool>,

    /// Disable color coding of percentages.
    #[arg(long)]
    pub no_color: bool,

    /// Hide the "As of" timestamp.
    #[arg(long)]
    pub no_timestamp: bool,

    /// Print the cycle report as JSON.
    #[arg(long, conflicts_with = "cleanup")]
    pub json: bool,

    /// Keep refreshing on the configured interval until interrupted.
    #[arg(long, conflicts_with = "cleanup")]
    pub watch: bool,

    /// Remove week-old cache entries and exit.
    #[arg(long)]
    pub cleanup: bool,

    /// Write the effective configuration (after flags) to the config file and exit.
    #[arg(long, conflicts_with_all = ["watch", "cleanup", "json"])]
    pub write_config: bool,

    /// Config file to use instead of the default location.
    #[arg(long, env = "OCCUPANCY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache directory to use instead of the default location.
    #[arg(long, env = "OCCUPANCY_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}
