// CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "oss-harness")]
#[command(author = "hatlonely <hatlonely@foxmail.com>")]
#[command(version = "0.1.0")]
#[command(about = "Exercise the full lifecycle of an object on an S3-compatible store", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.oss-harness/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level filter, overrides RUST_LOG (e.g. info, debug, oss_harness=trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload, download, verify and clean up a test object
    Run(RunArgs),
    /// Upload a test object and keep it on the server
    Upload(OverrideArgs),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Skip the download and verification steps
    #[arg(long)]
    pub no_download: bool,

    /// Only check that the download exists, skip the digest comparison
    #[arg(long)]
    pub no_verify_content: bool,
}

/// Flags that override values from the config file
#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// Endpoint as host:port (e.g. 127.0.0.1:9000)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Access key
    #[arg(long)]
    pub access_key: Option<String>,

    /// Secret key
    #[arg(long)]
    pub secret_key: Option<String>,

    /// Use HTTPS
    #[arg(long)]
    pub secure: bool,

    /// Region used for the client and bucket creation
    #[arg(long)]
    pub region: Option<String>,

    /// Bucket name
    #[arg(long)]
    pub bucket: Option<String>,

    /// Object key
    #[arg(long)]
    pub object: Option<String>,

    /// Minimum payload size in bytes
    #[arg(long)]
    pub min_size: Option<u64>,

    /// Use the in-memory store instead of a real server
    #[arg(long)]
    pub memory: bool,

    /// Timeout for each network call (e.g. 30s, 1m)
    #[arg(long)]
    pub timeout: Option<String>,
}
