//! Error types shared by the store, the service and bindings.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::types::LanguageId;

/// Errors surfaced by translation lookups, loads and bindings.
#[derive(Error, Debug, Clone)]
pub enum TranslateError {
    /// Parameter argument was neither a mapping nor a braces-delimited object literal
    #[error("Wrong parameter in TranslationBinding. Expected a valid Object, received: {literal}")]
    ParameterFormat { literal: String },

    /// Loader rejected or errored; every waiter of that load receives this
    #[error("Failed to load translations for '{language}': {source}")]
    LoadFailure {
        language: LanguageId,
        #[source]
        source: Arc<LoaderError>,
    },

    /// No resolution in the active or default tree and no missing-key handler substitute
    #[error("Missing translation for key '{key}'")]
    TranslationMissing { key: String },

    #[error("Parameter \"key\" required")]
    EmptyKey,
}

impl TranslateError {
    pub(crate) fn load_failure(language: &LanguageId, source: LoaderError) -> Self {
        Self::LoadFailure { language: language.clone(), source: Arc::new(source) }
    }
}

/// Errors produced by [`crate::loader::TranslationLoader`] implementations.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("No translations available for '{0}'")]
    NotFound(LanguageId),

    #[error("Failed to read translation file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse translation file {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Translation data must be an object at its root
    #[error("Translation data for '{0}' is not an object")]
    InvalidShape(LanguageId),

    #[error("Invalid translation file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn parameter_format_message_echoes_literal() {
        let error = TranslateError::ParameterFormat { literal: "param: \"with param\"".to_string() };

        expect_that!(
            error.to_string(),
            eq("Wrong parameter in TranslationBinding. Expected a valid Object, received: param: \"with param\"")
        );
    }

    #[googletest::test]
    fn load_failure_names_language_and_cause() {
        let lang = LanguageId::with_region("fr", "fr");
        let error = TranslateError::load_failure(&lang, LoaderError::NotFound(lang.clone()));

        let message = error.to_string();
        expect_that!(message, contains_substring("'fr-fr'"));
        expect_that!(message, contains_substring("No translations available"));
        expect_that!(std::error::Error::source(&error).is_some(), eq(true));
    }
}
