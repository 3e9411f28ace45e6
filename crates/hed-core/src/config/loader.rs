//! Configuration file discovery and loading

use super::validator_config::ValidatorConfig;
use crate::error::HedError;
use crate::result::Result;
use std::path::{Path, PathBuf};

/// Config file names, in discovery priority order
const CONFIG_FILE_NAMES: [&str; 5] = [
    ".hedrc.json",
    ".hedrc.toml",
    "hed.yaml",
    "hed.yml",
    "hed.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// Searches for config files in the following order:
    /// 1. `.hedrc.json`
    /// 2. `.hedrc.toml`
    /// 3. `hed.yaml`
    /// 4. `hed.yml`
    /// 5. `hed.json`
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| HedError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<ValidatorConfig> {
        ValidatorConfig::load(path).map_err(|e| {
            HedError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Load config from path or auto-discover
    ///
    /// Falls back to [`ValidatorConfig::default`] when nothing is found during discovery.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<ValidatorConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(HedError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(ValidatorConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path =
            create_temp_config(temp_dir.path(), "hed.json", r#"{"checkWarnings": false}"#);

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert!(!config.check_warnings);
    }

    #[test]
    fn test_load_from_file_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path =
            create_temp_config(temp_dir.path(), ".hedrc.toml", "limitErrors = true\n");

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert!(config.limit_errors);
    }

    #[test]
    fn test_auto_discover() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("sub-01/eeg");
        fs::create_dir_all(&nested).unwrap();

        create_temp_config(temp_dir.path(), "hed.yaml", "allowPlaceholders: true\n");

        let found = ConfigLoader::auto_discover(&nested).unwrap();
        assert!(found.is_some());

        let config = ConfigLoader::load(None, Some(&nested)).unwrap();
        assert!(config.allow_placeholders);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("nonexistent.json")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_content_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(temp_dir.path(), "hed.json", "{ not json");
        let err = ConfigLoader::load_from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
