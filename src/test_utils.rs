//! Helpers shared by unit test modules.
#![cfg(test)]
#![allow(clippy::unwrap_used)]

use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::LoaderError;
use crate::loader::{
    MemoryLoader,
    TranslationLoader,
};
use crate::tree::TranslationTree;
use crate::types::LanguageId;

/// Loader that counts calls and holds every load until [`Self::release`].
#[derive(Debug, Default)]
pub(crate) struct GatedLoader {
    calls: AtomicUsize,
    gate: Notify,
    pub(crate) tables: MemoryLoader,
}

impl GatedLoader {
    /// Lets one held load (or the next one to start) complete.
    pub(crate) fn release(&self) {
        self.gate.notify_one();
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationLoader for GatedLoader {
    async fn load(&self, lang: &LanguageId) -> Result<Value, LoaderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        self.tables.load(lang).await
    }
}

pub(crate) fn lang(id: &str) -> LanguageId {
    id.parse().unwrap()
}

pub(crate) fn tree(value: Value) -> TranslationTree {
    TranslationTree::from_value(&lang("en"), value).unwrap()
}
