//! Wires a project's configuration into a ready-to-use translation service.

use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use super::{
    ConfigError,
    TranslateSettings,
    loader,
};
use crate::loader::FileLoader;
use crate::service::TranslateService;

/// Validated settings of one project, plus the root they were read from.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings: TranslateSettings,
    /// Translation directories are resolved against this
    project_root: PathBuf,
}

impl ConfigManager {
    /// Reads `.translate.json` from `project_root`. A missing file yields the
    /// default settings.
    ///
    /// # Errors
    /// - File read error
    /// - JSON parse error
    /// - Validation errors
    pub fn load(project_root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let project_root = project_root.into();
        let settings = loader::load_from_root(&project_root)?.unwrap_or_else(|| {
            tracing::debug!(root = %project_root.display(), "No configuration file, using defaults");
            TranslateSettings::default()
        });

        settings.validate().map_err(ConfigError::ValidationErrors)?;
        tracing::debug!(root = %project_root.display(), ?settings, "Settings loaded");

        Ok(Self { settings, project_root })
    }

    #[must_use]
    pub const fn settings(&self) -> &TranslateSettings {
        &self.settings
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Loader for the configured translation directory.
    #[must_use]
    pub fn file_loader(&self) -> FileLoader {
        FileLoader::from_settings(&self.project_root, &self.settings.translation_files)
    }

    /// Service reading from [`Self::file_loader`] with these settings. No
    /// language is selected yet.
    #[must_use]
    pub fn build_service(&self) -> Arc<TranslateService> {
        TranslateService::builder(Arc::new(self.file_loader()))
            .settings(self.settings.clone())
            .build()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;
    use crate::config::CONFIG_FILE_NAME;
    use crate::params::Params;
    use crate::test_utils::lang;

    fn project_with_config(config: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), config).unwrap();
        dir
    }

    #[googletest::test]
    fn reads_settings_from_the_project_root() {
        let dir = project_with_config(r#"{"keySeparator": "-", "mergeOnLoad": true}"#);

        let manager = ConfigManager::load(dir.path()).unwrap();

        expect_that!(manager.settings().key_separator, eq("-"));
        expect_that!(manager.settings().merge_on_load, eq(true));
        expect_that!(manager.project_root(), eq(dir.path()));
    }

    #[googletest::test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();

        let manager = ConfigManager::load(dir.path()).unwrap();

        expect_that!(manager.settings(), eq(&TranslateSettings::default()));
    }

    #[googletest::test]
    fn invalid_settings_are_rejected() {
        let dir = project_with_config(r#"{"keySeparator": ""}"#);

        let result = ConfigManager::load(dir.path());

        expect_that!(matches!(result, Err(ConfigError::ValidationErrors(_))), eq(true));
    }

    #[googletest::test]
    fn file_loader_uses_the_configured_directory_and_suffix() {
        let dir = project_with_config(
            r#"{"translationFiles": {"directory": "locales", "suffix": ".jsonc"}}"#,
        );
        let manager = ConfigManager::load(dir.path()).unwrap();

        let path = manager.file_loader().path_for(&lang("en-EU"));

        expect_that!(path, eq(&dir.path().join("locales").join("en-EU.jsonc")));
    }

    #[tokio::test]
    async fn built_service_reads_configured_files() {
        let dir = project_with_config(r#"{"keySeparator": "/"}"#);
        fs::create_dir_all(dir.path().join("i18n")).unwrap();
        fs::write(dir.path().join("i18n/en.json"), r#"{"common": {"hello": "Hello"}}"#).unwrap();
        let service = ConfigManager::load(dir.path()).unwrap().build_service();

        service.use_language(lang("en")).await.unwrap();

        assert_eq!(service.get("common/hello", &Params::new()), "Hello");
        assert_eq!(service.settings().key_separator, "/");
    }
}
