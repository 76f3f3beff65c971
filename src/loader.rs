//! Translation loaders.
//!
//! The store never fetches translation data itself; it asks a
//! [`TranslationLoader`] and caches what comes back.

/// Loader reading translation files from disk
pub mod file;
/// Loader serving in-process tables
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

pub use file::FileLoader;
pub use memory::MemoryLoader;

use crate::error::LoaderError;
use crate::types::LanguageId;

/// Source of translation data for a language.
///
/// The store coalesces concurrent requests, so an implementation sees at
/// most one in-flight call per language, but it must tolerate being called
/// again for the same language after a failure or a reset.
#[async_trait]
pub trait TranslationLoader: Send + Sync {
    /// Fetches the translation tree for `lang`. The value must be a JSON object.
    async fn load(&self, lang: &LanguageId) -> Result<Value, LoaderError>;
}
