//! Resident translation trees and in-flight loads.
//!
//! # Lock order
//!
//! `pending` is always taken before `translations`. Neither lock is held
//! across an `.await`.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{
    AtomicU64,
    Ordering,
};
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
    RwLock,
};

use futures::FutureExt;
use futures::future::{
    BoxFuture,
    Shared,
};

use crate::error::TranslateError;
use crate::loader::TranslationLoader;
use crate::tree::{
    MergeMode,
    TranslationTree,
};
use crate::types::LanguageId;

/// Future shared by every caller waiting on one language load.
type LoadFuture = Shared<BoxFuture<'static, Result<TranslationTree, TranslateError>>>;

/// One in-flight load.
struct PendingLoad {
    /// Generation id; a completion whose id no longer matches was superseded by a reset
    id: u64,
    future: LoadFuture,
}

/// State shared between the store and its in-flight loads.
#[derive(Default)]
struct StoreState {
    /// Resident trees, replaced wholesale on every install
    translations: RwLock<HashMap<LanguageId, TranslationTree>>,
    pending: Mutex<HashMap<LanguageId, PendingLoad>>,
    /// Known languages in insertion order
    langs: Mutex<Vec<LanguageId>>,
}

impl StoreState {
    fn pending(&self) -> MutexGuard<'_, HashMap<LanguageId, PendingLoad>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn translation(&self, lang: &LanguageId) -> Option<TranslationTree> {
        self.translations.read().unwrap_or_else(PoisonError::into_inner).get(lang).cloned()
    }

    fn install(&self, lang: &LanguageId, incoming: TranslationTree, mode: MergeMode) -> TranslationTree {
        let tree = {
            let mut translations =
                self.translations.write().unwrap_or_else(PoisonError::into_inner);
            let tree = match translations.get(lang) {
                Some(existing) => existing.merged(&incoming, mode),
                None => incoming,
            };
            translations.insert(lang.clone(), tree.clone());
            tree
        };
        self.add_langs(std::slice::from_ref(lang));
        tree
    }

    fn add_langs(&self, langs: &[LanguageId]) {
        let mut known = self.langs.lock().unwrap_or_else(PoisonError::into_inner);
        for lang in langs {
            if !known.contains(lang) {
                known.push(lang.clone());
            }
        }
    }
}

/// Per-language translation trees plus the loads currently fetching them.
///
/// Concurrent requests for a language that is not resident share a single
/// loader call.
pub struct TranslationStore {
    loader: Arc<dyn TranslationLoader>,
    /// Always reload on request and merge the result under the resident tree
    merge_on_load: bool,
    state: Arc<StoreState>,
    next_load_id: AtomicU64,
}

impl fmt::Debug for TranslationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationStore")
            .field("merge_on_load", &self.merge_on_load)
            .field("langs", &self.langs())
            .finish_non_exhaustive()
    }
}

impl TranslationStore {
    #[must_use]
    pub fn new(loader: Arc<dyn TranslationLoader>) -> Self {
        Self {
            loader,
            merge_on_load: false,
            state: Arc::new(StoreState::default()),
            next_load_id: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub const fn with_merge_on_load(mut self, merge_on_load: bool) -> Self {
        self.merge_on_load = merge_on_load;
        self
    }

    /// Installs `tree` for `lang`, combining it with any resident tree per
    /// `mode`, and returns the published tree.
    pub fn set_translation(
        &self,
        lang: &LanguageId,
        tree: TranslationTree,
        mode: MergeMode,
    ) -> TranslationTree {
        self.state.install(lang, tree, mode)
    }

    /// Resident tree for `lang`, if any. Never triggers a load.
    #[must_use]
    pub fn translation(&self, lang: &LanguageId) -> Option<TranslationTree> {
        self.state.translation(lang)
    }

    /// Returns the tree for `lang`, loading it if needed.
    ///
    /// A resident tree is returned as is, unless merge-on-load is enabled, in
    /// which case the language is reloaded and the loaded tree is merged under
    /// the resident one. Callers arriving while a load is in flight wait on
    /// that same load.
    ///
    /// # Errors
    /// [`TranslateError::LoadFailure`] when the loader fails. The failed load
    /// is forgotten, so a later call retries.
    pub async fn get_translation(&self, lang: &LanguageId) -> Result<TranslationTree, TranslateError> {
        let future = {
            // Loads install while holding `pending`, so this check cannot miss one.
            let mut pending = self.state.pending();
            if !self.merge_on_load
                && let Some(tree) = self.state.translation(lang)
            {
                return Ok(tree);
            }

            if let Some(load) = pending.get(lang) {
                tracing::debug!(%lang, "Joining pending translation load");
                load.future.clone()
            } else {
                let id = self.next_load_id.fetch_add(1, Ordering::Relaxed);
                let future = self.start_load(lang.clone(), id);
                pending.insert(lang.clone(), PendingLoad { id, future: future.clone() });
                future
            }
        };

        future.await
    }

    /// Builds the shared load future. Completion installs the result only if
    /// the load is still the current one for `lang`.
    fn start_load(&self, lang: LanguageId, id: u64) -> LoadFuture {
        let loader = Arc::clone(&self.loader);
        let state = Arc::clone(&self.state);
        let mode = if self.merge_on_load { MergeMode::Preserve } else { MergeMode::Replace };

        tracing::debug!(%lang, id, "Starting translation load");

        async move {
            let outcome = loader
                .load(&lang)
                .await
                .and_then(|value| TranslationTree::from_value(&lang, value));

            let mut pending = state.pending();
            let current = pending.get(&lang).is_some_and(|load| load.id == id);
            if current {
                pending.remove(&lang);
            }

            match outcome {
                Ok(tree) if current => Ok(state.install(&lang, tree, mode)),
                Ok(tree) => {
                    tracing::debug!(%lang, id, "Discarding superseded translation load");
                    Ok(tree)
                }
                Err(err) => {
                    tracing::warn!(%lang, %err, "Translation load failed");
                    Err(TranslateError::load_failure(&lang, err))
                }
            }
        }
        .boxed()
        .shared()
    }

    #[must_use]
    pub fn is_loaded(&self, lang: &LanguageId) -> bool {
        self.state.translations.read().unwrap_or_else(PoisonError::into_inner).contains_key(lang)
    }

    #[must_use]
    pub fn is_pending(&self, lang: &LanguageId) -> bool {
        self.state.pending().contains_key(lang)
    }

    /// Drops the resident tree and any in-flight load for `lang`.
    ///
    /// A load already running keeps running for its waiters, but its result
    /// is not installed.
    pub fn reset(&self, lang: &LanguageId) {
        let mut pending = self.state.pending();
        pending.remove(lang);
        self.state.translations.write().unwrap_or_else(PoisonError::into_inner).remove(lang);
        tracing::debug!(%lang, "Translations reset");
    }

    /// Records languages as available without loading them.
    pub fn add_langs(&self, langs: &[LanguageId]) {
        self.state.add_langs(langs);
    }

    /// Available languages in the order they were first seen.
    #[must_use]
    pub fn langs(&self) -> Vec<LanguageId> {
        self.state.langs.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
