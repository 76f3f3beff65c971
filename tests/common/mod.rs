//! Fixtures shared by integration tests.
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};

use reactive_translate::{
    LanguageId,
    MemoryLoader,
    TranslateService,
};
use serde_json::Value;

pub fn en_eu() -> LanguageId {
    LanguageId::with_region("en", "eu")
}

pub fn fr_fr() -> LanguageId {
    LanguageId::with_region("fr", "fr")
}

/// Service over an empty in-memory loader; tests install translations directly.
pub fn service() -> Arc<TranslateService> {
    TranslateService::builder(Arc::new(MemoryLoader::new())).build()
}

/// Service whose loader serves `tables`.
pub fn service_with(tables: Vec<(LanguageId, Value)>) -> Arc<TranslateService> {
    let loader = tables.into_iter().fold(MemoryLoader::new(), |loader, (lang, table)| loader.with(lang, table));
    TranslateService::builder(Arc::new(loader)).build()
}

/// Counts mark-dirty calls.
#[derive(Debug, Clone, Default)]
pub struct DirtyCounter(Arc<AtomicUsize>);

impl DirtyCounter {
    pub fn hook(&self) -> impl Fn() + Send + Sync + 'static {
        let count = Arc::clone(&self.0);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
