mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./tagforged.toml",
        "~/.config/tagforged/config.toml",
        "/etc/tagforged/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.tagging.timeout_ms == 0 {
        anyhow::bail!("Tagging timeout_ms cannot be 0");
    }

    // Missing tool paths are not fatal; resolution falls back to PATH
    let tools = [
        ("atomicparsley_path", &config.tools.atomicparsley_path),
        ("mediainfo_path", &config.tools.mediainfo_path),
    ];
    for (key, path) in tools {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("tools.{} does not exist: {:?}", key, path);
            }
        }
    }

    Ok(())
}
