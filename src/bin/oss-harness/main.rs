// oss-harness - Object storage lifecycle test tool

mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use oss_harness::cfg::{create_object_store, HarnessConfig};
use oss_harness::harness::{LifecycleMode, LifecycleOrchestrator};

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load the config file, apply subcommand flags and validate the result
fn resolve_config(cli: &Cli) -> Result<HarnessConfig> {
    let mut config = config::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Run(args) => {
            config::apply_overrides(&mut config, &args.overrides)?;
            config.mode = LifecycleMode::Full;
            if args.no_download {
                config.verify_download = false;
            }
            if args.no_verify_content {
                config.verify_content = false;
            }
        }
        Commands::Upload(args) => {
            config::apply_overrides(&mut config, args)?;
            config.mode = LifecycleMode::UploadOnly;
        }
    }
    config.check()?;

    Ok(config)
}

/// Log a fatal setup error and exit with status 1
fn exit_fatal(err: anyhow::Error) -> ! {
    tracing::error!(error = %format!("{:#}", err), "lifecycle test aborted");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = resolve_config(&cli).unwrap_or_else(|e| exit_fatal(e));

    let store = match create_object_store(&config.store)
        .await
        .context("Failed to initialize object store client")
    {
        Ok(store) => store,
        Err(e) => exit_fatal(e),
    };

    let report = LifecycleOrchestrator::new(store, config).run().await;

    for warning in report.warnings() {
        tracing::warn!(
            step = %warning.step_name,
            error = warning.error_detail.as_deref().unwrap_or_default(),
            "cleanup warning"
        );
    }

    if let Some(err) = &report.error {
        tracing::error!(step = err.step(), state = %report.state, error = %err, "lifecycle test failed");
        std::process::exit(1);
    }

    if let Some(object) = &report.object {
        tracing::info!(size = object.size, etag = %object.etag, "lifecycle test passed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_config_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.yaml");
        let cli = Cli::parse_from(["oss-harness", "-c", path.to_str().unwrap(), "run"]);

        let err = resolve_config(&cli).unwrap_err();
        assert!(format!("{:#}", err).contains("Config file not found"));
    }

    #[test]
    fn test_resolve_config_rejects_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("harness.yaml");
        std::fs::write(&path, "upload_path: same.txt\ndownload_path: same.txt\n").unwrap();
        let cli = Cli::parse_from(["oss-harness", "-c", path.to_str().unwrap(), "run", "--memory"]);
        assert!(resolve_config(&cli).is_err());

        let cli = Cli::parse_from([
            "oss-harness",
            "-c",
            path.to_str().unwrap(),
            "upload",
            "--timeout",
            "5x",
        ]);
        let err = resolve_config(&cli).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid --timeout"));
    }

    #[test]
    fn test_resolve_config_sets_mode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("harness.yaml");
        std::fs::write(&path, "bucket: mode-bucket\n").unwrap();

        let cli = Cli::parse_from(["oss-harness", "-c", path.to_str().unwrap(), "upload", "--memory"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.mode, LifecycleMode::UploadOnly);
        assert_eq!(config.bucket, "mode-bucket");
    }
}
