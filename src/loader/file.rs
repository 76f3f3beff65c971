use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};

use async_trait::async_trait;
use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};
use ignore::WalkBuilder;
use jsonc_parser::ParseOptions;
use serde_json::{
    Map,
    Value,
};

use super::TranslationLoader;
use crate::config::TranslationFilesConfig;
use crate::error::LoaderError;
use crate::types::LanguageId;

/// Reads `<directory>/<lang><suffix>` files.
///
/// Files are parsed as JSONC, so comments and trailing commas are tolerated.
/// An empty file is an empty translation tree.
#[derive(Debug, Clone)]
pub struct FileLoader {
    /// Directory holding one file per language
    directory: PathBuf,
    /// File name suffix following the language id
    suffix: String,
    /// Glob (relative to `directory`) restricting [`Self::discover_languages`]
    file_pattern: String,
}

impl FileLoader {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let defaults = TranslationFilesConfig::default();
        Self {
            directory: directory.into(),
            suffix: defaults.suffix,
            file_pattern: defaults.file_pattern,
        }
    }

    /// Builds a loader for the translation directory configured under `root`.
    #[must_use]
    pub fn from_settings(root: &Path, files: &TranslationFilesConfig) -> Self {
        Self {
            directory: root.join(&files.directory),
            suffix: files.suffix.clone(),
            file_pattern: files.file_pattern.clone(),
        }
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Path of the translation file for `lang`.
    #[must_use]
    pub fn path_for(&self, lang: &LanguageId) -> PathBuf {
        self.directory.join(format!("{lang}{}", self.suffix))
    }

    /// Lists the languages that have a translation file, sorted and deduplicated.
    ///
    /// Walks the translation directory honouring `.gitignore`, keeps files
    /// matching the configured pattern and suffix, and parses the rest of the
    /// file name as a language id. Files whose name is not a language id are
    /// skipped.
    pub fn discover_languages(&self) -> Result<Vec<LanguageId>, LoaderError> {
        let pattern = self.pattern_set()?;
        let mut languages = Vec::new();

        for result in WalkBuilder::new(&self.directory)
            .hidden(false)
            .git_ignore(true)
            .git_exclude(true)
            .follow_links(false)
            .build()
        {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(?err, "Failed to read directory entry");
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Ok(relative_path) = path.strip_prefix(&self.directory) else {
                continue;
            };
            if !pattern.is_match(relative_path) {
                continue;
            }

            let Some(stem) = relative_path
                .to_str()
                .and_then(|name| name.strip_suffix(self.suffix.as_str()))
            else {
                continue;
            };
            match stem.parse::<LanguageId>() {
                Ok(lang) => languages.push(lang),
                Err(err) => tracing::debug!(path = %path.display(), %err, "Skipping file"),
            }
        }

        languages.sort();
        languages.dedup();
        Ok(languages)
    }

    fn pattern_set(&self) -> Result<GlobSet, LoaderError> {
        let invalid = |message: String| LoaderError::InvalidPattern {
            pattern: self.file_pattern.clone(),
            message,
        };
        let glob = Glob::new(&self.file_pattern).map_err(|e| invalid(e.to_string()))?;
        let mut builder = GlobSetBuilder::new();
        builder.add(glob);
        builder.build().map_err(|e| invalid(e.to_string()))
    }
}

#[async_trait]
impl TranslationLoader for FileLoader {
    async fn load(&self, lang: &LanguageId) -> Result<Value, LoaderError> {
        let path = self.path_for(lang);
        tracing::debug!(path = %path.display(), "Reading translation file");

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LoaderError::NotFound(lang.clone()));
            }
            Err(source) => return Err(LoaderError::Io { path, source }),
        };

        match jsonc_parser::parse_to_serde_value(&content, &ParseOptions::default()) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Ok(Value::Object(Map::new())),
            Err(err) => Err(LoaderError::Parse { path, message: err.to_string() }),
        }
    }
}
