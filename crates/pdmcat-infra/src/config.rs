//! Configuration loader for pdmcat.
//!
//! Reads `config.toml` from the data directory (`~/.pdmcat/` in production)
//! and deserializes it into [`CatalogConfig`]. Falls back to defaults when
//! the file is missing or malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use pdmcat_types::config::CatalogConfig;
use pdmcat_types::error::ConfigError;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "PDMCAT_DATA_DIR";
/// Environment override for `pdm_dir`.
pub const PDM_DIR_ENV: &str = "PDMCAT_PDM_DIR";
/// Environment override for `embedding_model`.
pub const EMBEDDING_MODEL_ENV: &str = "PDMCAT_EMBEDDING_MODEL";

/// Resolve the data directory.
///
/// Priority: explicit flag, `PDMCAT_DATA_DIR`, `~/.pdmcat`, `./.pdmcat`.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .or_else(|| dirs::home_dir().map(|home| home.join(".pdmcat")))
        .unwrap_or_else(|| PathBuf::from(".pdmcat"))
}

/// Parse `{data_dir}/config.toml` strictly.
///
/// Returns `Ok(None)` when the file does not exist.
pub async fn read_config(data_dir: &Path) -> Result<Option<CatalogConfig>, ConfigError> {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ConfigError::Read {
                path: config_path,
                message: err.to_string(),
            });
        }
    };

    toml::from_str::<CatalogConfig>(&content)
        .map(Some)
        .map_err(|err| ConfigError::Parse {
            path: config_path,
            message: err.to_string(),
        })
}

/// Load configuration from `{data_dir}/config.toml` with env overrides.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: logs a warning and uses defaults.
pub async fn load_config(data_dir: &Path) -> CatalogConfig {
    let config = match read_config(data_dir).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            tracing::debug!("No config.toml found in {}, using defaults", data_dir.display());
            CatalogConfig::default()
        }
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            CatalogConfig::default()
        }
    };

    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply `PDMCAT_PDM_DIR` / `PDMCAT_EMBEDDING_MODEL` style overrides.
///
/// `lookup` returns the value of an environment variable; empty values are
/// ignored.
pub fn apply_overrides(
    mut config: CatalogConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> CatalogConfig {
    let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(dir) = value(PDM_DIR_ENV) {
        config.pdm_dir = PathBuf::from(dir);
    }
    if let Some(model) = value(EMBEDDING_MODEL_ENV) {
        config.embedding_model = model.trim().to_string();
    }
    config
}
