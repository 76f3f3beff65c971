//! Memoized translation bindings.
//!
//! A [`TranslationBinding`] remembers its last `(key, params, languages)`
//! input and the output computed for it. Repeated calls with equal input
//! return the cached output without touching the service. Language and
//! translation changes refresh the cached output eagerly. Every
//! recomputation invokes the binding's [`MarkDirty`] hook once.
//!
//! The binding's state lock is never held while the service resolves a key
//! or while the hook runs.

use std::fmt;
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
    Weak,
};

use crate::error::TranslateError;
use crate::events::Subscription;
use crate::params::{
    self,
    Params,
    ParamsInput,
};
use crate::service::TranslateService;
use crate::types::{
    ActiveLanguages,
    LanguageId,
};

/// Render-scheduling hook invoked each time a binding recomputes its output.
///
/// Closures taking no arguments implement this trait.
pub trait MarkDirty: Send + Sync {
    fn mark_dirty(&self);
}

impl<F> MarkDirty for F
where
    F: Fn() + Send + Sync,
{
    fn mark_dirty(&self) {
        self();
    }
}

/// Last computed input and output.
#[derive(Debug, Clone, PartialEq)]
struct CacheEntry {
    key: String,
    params: Params,
    /// Languages in effect when `output` was computed
    languages: ActiveLanguages,
    output: String,
}

#[derive(Debug, Default)]
struct BindingState {
    entry: Option<CacheEntry>,
    recompute_count: usize,
}

fn lock(state: &Mutex<BindingState>) -> MutexGuard<'_, BindingState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Recomputes `state`'s cached entry against the service's current languages.
///
/// Returns true if a new output was stored. Does nothing when nothing is
/// cached, or when the cached input was replaced while the key was resolved.
fn recompute(service: &TranslateService, state: &Mutex<BindingState>) -> bool {
    let (key, params) = {
        let guard = lock(state);
        let Some(entry) = guard.entry.as_ref() else {
            return false;
        };
        (entry.key.clone(), entry.params.clone())
    };

    let languages = service.active_languages();
    let output = service.get(&key, &params);

    let mut guard = lock(state);
    let state = &mut *guard;
    let Some(entry) =
        state.entry.as_mut().filter(|entry| entry.key == key && entry.params == params)
    else {
        return false;
    };
    entry.languages = languages;
    entry.output = output;
    state.recompute_count += 1;

    tracing::debug!(%key, "Binding refreshed");
    true
}

/// What an event subscription needs to refresh a binding. Holds weak
/// references only, so subscriptions never keep the binding or the service
/// alive.
#[derive(Clone)]
struct Refresher {
    service: Weak<TranslateService>,
    state: Weak<Mutex<BindingState>>,
    hook: Weak<dyn MarkDirty>,
}

impl Refresher {
    /// Refreshes the binding; with `lang` set, only if that language is the
    /// current or default one.
    fn refresh(&self, lang: Option<&LanguageId>) {
        let (Some(service), Some(state)) = (self.service.upgrade(), self.state.upgrade()) else {
            return;
        };
        if let Some(lang) = lang
            && !service.active_languages().involves(lang)
        {
            return;
        }

        if recompute(&service, &state)
            && let Some(hook) = self.hook.upgrade()
        {
            hook.mark_dirty();
        }
    }
}

/// A memoized `key + params → string` binding that follows language changes.
///
/// The binding subscribes to the service's change events on creation and
/// unsubscribes on [`Self::dispose`] or drop.
pub struct TranslationBinding {
    service: Arc<TranslateService>,
    state: Arc<Mutex<BindingState>>,
    hook: Arc<dyn MarkDirty>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl fmt::Debug for TranslationBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationBinding")
            .field("state", &*lock(&self.state))
            .field(
                "subscriptions",
                &self.subscriptions.lock().unwrap_or_else(PoisonError::into_inner).len(),
            )
            .finish_non_exhaustive()
    }
}

impl TranslationBinding {
    #[must_use]
    pub fn new(service: Arc<TranslateService>, hook: impl MarkDirty + 'static) -> Self {
        let state = Arc::new(Mutex::new(BindingState::default()));
        let hook: Arc<dyn MarkDirty> = Arc::new(hook);
        let refresher = Refresher {
            service: Arc::downgrade(&service),
            state: Arc::downgrade(&state),
            hook: Arc::downgrade(&hook),
        };

        let events = service.events();
        let on_lang = refresher.clone();
        let on_default = refresher.clone();
        let subscriptions = vec![
            events.lang_change.subscribe(move |_| on_lang.refresh(None)),
            events.default_lang_change.subscribe(move |_| on_default.refresh(None)),
            events.translation_change.subscribe(move |event| refresher.refresh(Some(&event.lang))),
        ];

        Self { service, state, hook, subscriptions: Mutex::new(subscriptions) }
    }

    /// Returns the translation of `key` with `params` interpolated.
    ///
    /// An empty key yields an empty string and leaves the cache untouched.
    /// When key, params (by value) and active languages equal the previous
    /// call's, the cached output is returned without recomputation.
    ///
    /// # Errors
    /// [`TranslateError::ParameterFormat`] when `params` cannot be coerced
    /// into a mapping. The cache is left untouched.
    pub fn transform(
        &self,
        key: &str,
        params: impl Into<ParamsInput>,
    ) -> Result<String, TranslateError> {
        if key.is_empty() {
            return Ok(String::new());
        }

        let params = params::coerce(params.into())?;
        let languages = self.service.active_languages();

        if let Some(entry) = &lock(&self.state).entry
            && entry.key == key
            && entry.params == params
            && entry.languages == languages
        {
            return Ok(entry.output.clone());
        }

        let output = self.service.get(key, &params);
        {
            let mut state = lock(&self.state);
            state.entry =
                Some(CacheEntry { key: key.to_string(), params, languages, output: output.clone() });
            state.recompute_count += 1;
        }
        tracing::debug!(key, "Binding recomputed");

        self.hook.mark_dirty();
        Ok(output)
    }

    /// Cached output of the last computation.
    #[must_use]
    pub fn value(&self) -> Option<String> {
        lock(&self.state).entry.as_ref().map(|entry| entry.output.clone())
    }

    /// Number of times the output has been computed, including event-driven
    /// refreshes.
    #[must_use]
    pub fn recompute_count(&self) -> usize {
        lock(&self.state).recompute_count
    }

    /// Stops following change events and clears the cache. Idempotent.
    pub fn dispose(&self) {
        let subscriptions: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for subscription in &subscriptions {
            subscription.unsubscribe();
        }
        lock(&self.state).entry = None;
    }
}

impl Drop for TranslationBinding {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    use googletest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::loader::MemoryLoader;
    use crate::test_utils::lang;
    use crate::tree::MergeMode;

    fn counting_hook() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn service_in_english() -> Arc<TranslateService> {
        let loader = MemoryLoader::new()
            .with(lang("en"), json!({"TEST": "This is a test {{param}}", "PLAIN": "Plain", "SAME": "Plain"}))
            .with(lang("fr"), json!({"TEST": "C'est un test {{param}}", "PLAIN": "Plain", "SAME": "Plain"}));
        let service = TranslateService::builder(Arc::new(loader)).build();
        service.use_language(lang("en")).await.unwrap();
        service
    }

    #[tokio::test]
    async fn equal_input_is_served_from_cache() {
        let service = service_in_english().await;
        let (dirty, hook) = counting_hook();
        let binding = TranslationBinding::new(service, hook);

        binding.transform("TEST", json!({"param": "A"})).unwrap();
        let cached = binding.transform("TEST", "{param: 'A'}").unwrap();

        assert_eq!(cached, "This is a test A");
        assert_eq!(binding.recompute_count(), 1);
        assert_eq!(dirty.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_key_leaves_cache_untouched() {
        let service = service_in_english().await;
        let binding = TranslationBinding::new(service, || {});
        binding.transform("PLAIN", ParamsInput::Absent).unwrap();

        let output = binding.transform("", ParamsInput::Absent).unwrap();

        assert_eq!(output, "");
        assert_eq!(binding.value().as_deref(), Some("Plain"));
        assert_eq!(binding.recompute_count(), 1);
    }

    #[tokio::test]
    async fn malformed_params_fail_without_caching() {
        let service = service_in_english().await;
        let binding = TranslationBinding::new(service, || {});

        let result = binding.transform("TEST", "param: 'A'");

        assert!(matches!(result, Err(TranslateError::ParameterFormat { .. })));
        assert_eq!(binding.value(), None);
        assert_eq!(binding.recompute_count(), 0);
    }

    #[tokio::test]
    async fn every_recompute_marks_dirty_even_with_equal_output() {
        let service = service_in_english().await;
        let (dirty, hook) = counting_hook();
        let binding = TranslationBinding::new(Arc::clone(&service), hook);

        binding.transform("PLAIN", json!({"param": "with param"})).unwrap();
        binding.transform("PLAIN", json!({"param": "with param"})).unwrap();
        binding.transform("PLAIN", json!({"param": "with param2"})).unwrap();
        binding.transform("SAME", ParamsInput::Absent).unwrap();

        assert_eq!(binding.value().as_deref(), Some("Plain"));
        assert_eq!(binding.recompute_count(), 3);
        assert_eq!(dirty.load(Ordering::SeqCst), 3);

        service.use_language(lang("fr")).await.unwrap();

        assert_eq!(binding.value().as_deref(), Some("Plain"));
        assert_eq!(binding.recompute_count(), 4);
        assert_eq!(dirty.load(Ordering::SeqCst), 4);
    }

    #[googletest::test]
    #[tokio::test]
    async fn missing_translation_handler_may_read_the_binding() {
        let slot: Arc<Mutex<Weak<TranslationBinding>>> = Arc::new(Mutex::new(Weak::new()));
        let slot_in_handler = Arc::clone(&slot);
        let loader = MemoryLoader::new().with(lang("en"), json!({"PLAIN": "Plain"}));
        let service = TranslateService::builder(Arc::new(loader))
            .missing_translation_handler(move |key: &str, _: &Params| {
                let upgraded = slot_in_handler.lock().unwrap().upgrade();
                let previous = upgraded.and_then(|binding| binding.value()).unwrap_or_default();
                Some(format!("{key} after {previous}"))
            })
            .build();
        service.use_language(lang("en")).await.unwrap();
        let binding = Arc::new(TranslationBinding::new(Arc::clone(&service), || {}));
        *slot.lock().unwrap() = Arc::downgrade(&binding);

        binding.transform("PLAIN", ParamsInput::Absent).unwrap();
        let missing = binding.transform("GONE", ParamsInput::Absent).unwrap();
        expect_that!(missing, eq("GONE after Plain"));

        service.use_language(lang("en")).await.unwrap();
        expect_that!(binding.value(), some(eq("GONE after GONE after Plain")));
    }

    #[googletest::test]
    #[tokio::test]
    async fn translation_change_for_other_languages_is_ignored() {
        let service = service_in_english().await;
        let binding = TranslationBinding::new(Arc::clone(&service), || {});
        binding.transform("PLAIN", ParamsInput::Absent).unwrap();

        service.set_translation(&lang("de"), json!({"PLAIN": "Schlicht"}), MergeMode::Replace).unwrap();
        expect_that!(binding.recompute_count(), eq(1));

        service.set_translation(&lang("en"), json!({"PLAIN": "Changed"}), MergeMode::Overwrite).unwrap();
        expect_that!(binding.recompute_count(), eq(2));
        expect_that!(binding.value(), some(eq("Changed")));
    }

    #[tokio::test]
    async fn dispose_stops_following_events() {
        let service = service_in_english().await;
        let (dirty, hook) = counting_hook();
        let binding = TranslationBinding::new(Arc::clone(&service), hook);
        binding.transform("TEST", json!({"param": "A"})).unwrap();

        binding.dispose();
        service.use_language(lang("fr")).await.unwrap();

        assert_eq!(binding.value(), None);
        assert_eq!(dirty.load(Ordering::SeqCst), 1);
        assert_eq!(service.events().lang_change.subscriber_count(), 0);
    }

    #[googletest::test]
    #[tokio::test]
    async fn dropping_the_binding_unsubscribes() {
        let service = service_in_english().await;
        let binding = TranslationBinding::new(Arc::clone(&service), || {});
        expect_that!(service.events().translation_change.subscriber_count(), eq(1));

        drop(binding);

        expect_that!(service.events().lang_change.subscriber_count(), eq(0));
        expect_that!(service.events().default_lang_change.subscriber_count(), eq(0));
        expect_that!(service.events().translation_change.subscriber_count(), eq(0));
    }

    #[tokio::test]
    async fn hook_may_reenter_transform() {
        let service = service_in_english().await;
        let slot: Arc<Mutex<Weak<TranslationBinding>>> = Arc::new(Mutex::new(Weak::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (slot_in_hook, seen_in_hook) = (Arc::clone(&slot), Arc::clone(&seen));
        let binding = Arc::new(TranslationBinding::new(Arc::clone(&service), move || {
            let upgraded = slot_in_hook.lock().unwrap().upgrade();
            if let Some(binding) = upgraded {
                let output = binding.transform("PLAIN", ParamsInput::Absent).unwrap();
                seen_in_hook.lock().unwrap().push(output);
            }
        }));
        *slot.lock().unwrap() = Arc::downgrade(&binding);

        binding.transform("TEST", json!({"param": "A"})).unwrap();

        // The nested transform recomputes (new key) and fires the hook once more,
        // which is then served from the cache.
        assert_eq!(*seen.lock().unwrap(), vec!["Plain".to_string(), "Plain".to_string()]);
        assert_eq!(binding.recompute_count(), 2);
    }
}
