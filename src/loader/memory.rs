use std::collections::HashMap;
use std::sync::{
    PoisonError,
    RwLock,
};

use async_trait::async_trait;
use serde_json::Value;

use super::TranslationLoader;
use crate::error::LoaderError;
use crate::types::LanguageId;

/// Serves translation tables held in memory.
///
/// Tables can be replaced at any time; the next load of that language sees
/// the new table.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    tables: RwLock<HashMap<LanguageId, Value>>,
}

impl MemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`Self::insert`].
    #[must_use]
    pub fn with(self, lang: LanguageId, table: Value) -> Self {
        self.insert(lang, table);
        self
    }

    pub fn insert(&self, lang: LanguageId, table: Value) {
        self.tables.write().unwrap_or_else(PoisonError::into_inner).insert(lang, table);
    }
}

#[async_trait]
impl TranslationLoader for MemoryLoader {
    async fn load(&self, lang: &LanguageId) -> Result<Value, LoaderError> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(lang)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(lang.clone()))
    }
}
