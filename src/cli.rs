use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "labdeck",
    version,
    about = "Browse lab container images and run their setup commands."
)]
pub struct CliArgs {
    /// Catalog service endpoint returning the lab image list
    #[arg(long, value_name = "URL")]
    pub catalog_url: Option<String>,

    /// Read the catalog from a local JSON file instead of the service
    #[arg(long, value_name = "PATH", conflicts_with = "catalog_url")]
    pub catalog_file: Option<PathBuf>,

    /// Config file (defaults to LABDECK_CONFIG, ./labdeck.yaml, ~/.config/labdeck/config.yaml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable the execution bridge; commands can still be copied
    #[arg(long)]
    pub no_bridge: bool,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Append logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
