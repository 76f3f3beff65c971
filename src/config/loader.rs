//! Reads `.translate.json` from a project root.

use std::path::Path;

use super::{
    ConfigError,
    TranslateSettings,
};

/// Name of the configuration file looked up in the project root
pub const CONFIG_FILE_NAME: &str = ".translate.json";

/// Reads settings from `<root>/.translate.json`.
///
/// # Returns
/// - `Ok(Some(settings))`: file found and parsed
/// - `Ok(None)`: no configuration file
/// - `Err(ConfigError)`: read or parse failure
pub(super) fn load_from_root(root: &Path) -> Result<Option<TranslateSettings>, ConfigError> {
    let config_path = root.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!("Configuration file not found: {:?}", config_path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", config_path);

    let content = std::fs::read_to_string(&config_path)?;
    let settings: TranslateSettings = serde_json::from_str(&content)?;

    Ok(Some(settings))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    #[rstest]
    fn reads_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), r#"{"keySeparator": "-"}"#).unwrap();

        let settings = load_from_root(temp_dir.path()).unwrap();

        assert_eq!(settings.unwrap().key_separator, "-");
    }

    #[rstest]
    fn missing_config_file_is_none() {
        let temp_dir = TempDir::new().unwrap();

        let result = load_from_root(temp_dir.path());

        assert!(result.unwrap().is_none());
    }

    #[rstest]
    fn invalid_json_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "invalid json").unwrap();

        let result = load_from_root(temp_dir.path());

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
