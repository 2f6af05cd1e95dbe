// Configuration loading for oss-harness

use anyhow::{Context, Result};
use oss_harness::cfg::{parse_duration, HarnessConfig, StoreConfig};
use oss_harness::oss::MemoryObjectStoreConfig;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::OverrideArgs;

/// Load configuration from file
///
/// A missing explicit path is an error. A missing default file falls back to
/// the built-in defaults (local MinIO).
pub fn load(config_path: Option<&str>) -> Result<HarnessConfig> {
    let (path, explicit) = match config_path {
        Some(p) => (PathBuf::from(shellexpand::tilde(p).to_string()), true),
        None => (default_config_path()?, false),
    };

    if !path.exists() {
        if explicit {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(HarnessConfig::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // Expand environment variables in the config content
    let expanded_content = expand_env_vars(&content)?;

    parse(&path, &expanded_content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Get default config path (~/.oss-harness/config.yaml)
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(".oss-harness").join("config.yaml"))
}

/// Pick the format from the file extension, YAML when unknown
fn parse(path: &Path, content: &str) -> Result<HarnessConfig> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") | Some("json5") => HarnessConfig::from_json(content),
        Some("toml") => HarnessConfig::from_toml(content),
        _ => HarnessConfig::from_yaml(content),
    }
}

/// Expand environment variables in the format ${VAR_NAME}
///
/// Unset variables are left untouched.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")?;

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];
        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    Ok(result)
}

/// Apply command line overrides on top of the loaded config
pub fn apply_overrides(config: &mut HarnessConfig, args: &OverrideArgs) -> Result<()> {
    if args.memory {
        config.store = StoreConfig::MemoryObjectStore(MemoryObjectStoreConfig::default());
    }

    match &mut config.store {
        StoreConfig::AwsS3ObjectStore(s3) => {
            if let Some(endpoint) = &args.endpoint {
                s3.endpoint = Some(endpoint.clone());
            }
            if let Some(access_key) = &args.access_key {
                s3.access_key_id = Some(access_key.clone());
            }
            if let Some(secret_key) = &args.secret_key {
                s3.secret_access_key = Some(secret_key.clone());
            }
            if args.secure {
                s3.use_ssl = true;
            }
            if let Some(region) = &args.region {
                s3.region = region.clone();
            }
        }
        StoreConfig::MemoryObjectStore(_) => {
            if args.endpoint.is_some() || args.access_key.is_some() || args.secret_key.is_some() {
                tracing::warn!("connection flags are ignored by the in-memory store");
            }
        }
    }

    if let Some(region) = &args.region {
        config.region = Some(region.clone());
    }
    if let Some(bucket) = &args.bucket {
        config.bucket = bucket.clone();
    }
    if let Some(object) = &args.object {
        config.object = object.clone();
    }
    if let Some(min_size) = args.min_size {
        config.min_payload_size = min_size;
    }
    if let Some(timeout) = &args.timeout {
        config.operation_timeout = Some(
            parse_duration(timeout).with_context(|| format!("Invalid --timeout: {}", timeout))?,
        );
    }

    Ok(())
}
