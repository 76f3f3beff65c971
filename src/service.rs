//! The translate service: one engine instance owning the store, the language
//! state and the change broadcaster.

use std::collections::HashMap;
use std::fmt;
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
};

use serde_json::Value;

use crate::config::TranslateSettings;
use crate::error::TranslateError;
use crate::events::{
    DefaultLangChangeEvent,
    LangChangeEvent,
    LanguageChangeBroadcaster,
    TranslationChangeEvent,
};
use crate::interpolate::interpolate;
use crate::loader::TranslationLoader;
use crate::params::Params;
use crate::store::TranslationStore;
use crate::tree::{
    MergeMode,
    TranslationTree,
};
use crate::types::{
    ActiveLanguages,
    LanguageId,
};

/// Supplies a value for keys that resolve in neither the active nor the
/// default language.
///
/// Returning `None` leaves the key missing. Closures taking `(&str, &Params)`
/// implement this trait.
pub trait MissingTranslationHandler: Send + Sync {
    fn handle(&self, key: &str, params: &Params) -> Option<String>;
}

impl<F> MissingTranslationHandler for F
where
    F: Fn(&str, &Params) -> Option<String> + Send + Sync,
{
    fn handle(&self, key: &str, params: &Params) -> Option<String> {
        self(key, params)
    }
}

/// Current and default language plus the latest request for each.
#[derive(Debug, Default)]
struct LanguageState {
    current: Option<LanguageId>,
    default: Option<LanguageId>,
    /// Bumped by every `use_language` call; only the latest may switch
    current_request: u64,
    /// Bumped by every `set_default_lang` call; only the latest may switch
    default_request: u64,
}

/// Builder for [`TranslateService`].
pub struct TranslateServiceBuilder {
    loader: Arc<dyn TranslationLoader>,
    settings: TranslateSettings,
    missing_translation_handler: Option<Arc<dyn MissingTranslationHandler>>,
}

impl fmt::Debug for TranslateServiceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslateServiceBuilder")
            .field("settings", &self.settings)
            .field("missing_translation_handler", &self.missing_translation_handler.is_some())
            .finish_non_exhaustive()
    }
}

impl TranslateServiceBuilder {
    #[must_use]
    pub fn settings(mut self, settings: TranslateSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn missing_translation_handler(
        mut self,
        handler: impl MissingTranslationHandler + 'static,
    ) -> Self {
        self.missing_translation_handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<TranslateService> {
        let store = TranslationStore::new(self.loader).with_merge_on_load(self.settings.merge_on_load);
        Arc::new(TranslateService {
            store,
            settings: self.settings,
            missing_translation_handler: self.missing_translation_handler,
            languages: Mutex::new(LanguageState::default()),
            events: LanguageChangeBroadcaster::default(),
        })
    }
}

/// Key lookup, language switching and change notification for one
/// application.
///
/// Shared as `Arc<TranslateService>`. Language switches are asynchronous
/// because they may have to load translations first; lookups are
/// synchronous and only consult resident trees.
pub struct TranslateService {
    store: TranslationStore,
    settings: TranslateSettings,
    missing_translation_handler: Option<Arc<dyn MissingTranslationHandler>>,
    languages: Mutex<LanguageState>,
    events: LanguageChangeBroadcaster,
}

impl fmt::Debug for TranslateService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let languages = self.active_languages();
        f.debug_struct("TranslateService")
            .field("current", &languages.current)
            .field("default", &languages.default)
            .field("store", &self.store)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TranslateService {
    #[must_use]
    pub fn builder(loader: Arc<dyn TranslationLoader>) -> TranslateServiceBuilder {
        TranslateServiceBuilder {
            loader,
            settings: TranslateSettings::default(),
            missing_translation_handler: None,
        }
    }

    fn languages(&self) -> MutexGuard<'_, LanguageState> {
        self.languages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub const fn settings(&self) -> &TranslateSettings {
        &self.settings
    }

    #[must_use]
    pub const fn store(&self) -> &TranslationStore {
        &self.store
    }

    #[must_use]
    pub const fn events(&self) -> &LanguageChangeBroadcaster {
        &self.events
    }

    #[must_use]
    pub fn current_lang(&self) -> Option<LanguageId> {
        self.languages().current.clone()
    }

    #[must_use]
    pub fn default_lang(&self) -> Option<LanguageId> {
        self.languages().default.clone()
    }

    #[must_use]
    pub fn active_languages(&self) -> ActiveLanguages {
        let state = self.languages();
        ActiveLanguages { current: state.current.clone(), default: state.default.clone() }
    }

    /// Installs translations for `lang` and notifies `translation_change`
    /// subscribers.
    ///
    /// # Errors
    /// [`TranslateError::LoadFailure`] if `translations` is not an object.
    pub fn set_translation(
        &self,
        lang: &LanguageId,
        translations: Value,
        mode: MergeMode,
    ) -> Result<TranslationTree, TranslateError> {
        let incoming = TranslationTree::from_value(lang, translations)
            .map_err(|err| TranslateError::load_failure(lang, err))?;
        let tree = self.store.set_translation(lang, incoming, mode);

        tracing::debug!(%lang, ?mode, "Translations installed");
        self.events
            .translation_change
            .emit(&TranslationChangeEvent { lang: lang.clone(), translations: tree.clone() });
        Ok(tree)
    }

    /// Makes `lang` the current language once its translations are loaded.
    ///
    /// If another `use_language` call is made while this one is loading, the
    /// later call wins and this one completes without switching.
    ///
    /// # Errors
    /// [`TranslateError::LoadFailure`] if loading fails; the current language
    /// is unchanged.
    pub async fn use_language(&self, lang: LanguageId) -> Result<TranslationTree, TranslateError> {
        let ticket = {
            let mut state = self.languages();
            state.current_request += 1;
            state.current_request
        };

        let tree = self.store.get_translation(&lang).await?;

        {
            let mut state = self.languages();
            if state.current_request != ticket {
                tracing::debug!(%lang, "Language switch superseded");
                return Ok(tree);
            }
            state.current = Some(lang.clone());
        }

        tracing::info!(%lang, "Language changed");
        self.events.lang_change.emit(&LangChangeEvent { lang, translations: tree.clone() });
        Ok(tree)
    }

    /// Makes `lang` the default language once its translations are loaded.
    ///
    /// Superseding follows the same rule as [`Self::use_language`].
    ///
    /// # Errors
    /// [`TranslateError::LoadFailure`] if loading fails; the default language
    /// is unchanged.
    pub async fn set_default_lang(&self, lang: LanguageId) -> Result<TranslationTree, TranslateError> {
        let ticket = {
            let mut state = self.languages();
            state.default_request += 1;
            state.default_request
        };

        let tree = self.store.get_translation(&lang).await?;

        {
            let mut state = self.languages();
            if state.default_request != ticket {
                tracing::debug!(%lang, "Default language switch superseded");
                return Ok(tree);
            }
            state.default = Some(lang.clone());
        }

        tracing::info!(%lang, "Default language changed");
        self.events
            .default_lang_change
            .emit(&DefaultLangChangeEvent { lang, translations: tree.clone() });
        Ok(tree)
    }

    /// Resolves `key` and interpolates `params` into the result.
    ///
    /// Lookup order: the active language, then (with `useDefaultLanguage`) the
    /// resident default language, then the missing-translation handler.
    ///
    /// # Errors
    /// - [`TranslateError::EmptyKey`] for an empty key
    /// - [`TranslateError::TranslationMissing`] when nothing resolves
    pub fn try_get(&self, key: &str, params: &Params) -> Result<String, TranslateError> {
        if key.is_empty() {
            return Err(TranslateError::EmptyKey);
        }

        let languages = self.active_languages();
        if let Some(template) = self.resolve(&languages, key) {
            return Ok(interpolate(&template, params));
        }

        if let Some(handler) = &self.missing_translation_handler
            && let Some(substitute) = handler.handle(key, params)
        {
            return Ok(substitute);
        }

        Err(TranslateError::TranslationMissing { key: key.to_string() })
    }

    /// Like [`Self::try_get`], but a missing translation yields the key itself.
    #[must_use]
    pub fn get(&self, key: &str, params: &Params) -> String {
        self.try_get(key, params).unwrap_or_else(|err| {
            tracing::warn!(key, %err, "Translation unavailable");
            key.to_string()
        })
    }

    /// [`Self::get`] for several keys with the same parameters.
    #[must_use]
    pub fn get_many(&self, keys: &[&str], params: &Params) -> HashMap<String, String> {
        keys.iter().map(|key| ((*key).to_string(), self.get(key, params))).collect()
    }

    /// Template for `key` in the active tree or, failing that, the default tree.
    fn resolve(&self, languages: &ActiveLanguages, key: &str) -> Option<String> {
        let separator = self.settings.key_separator.as_str();
        let active = languages.effective()?;

        let found = self
            .store
            .translation(active)
            .and_then(|tree| tree.resolve(key, separator).map(ToString::to_string));
        if found.is_some() || !self.settings.use_default_language {
            return found;
        }

        let default = languages.default.as_ref().filter(|default| *default != active)?;
        self.store.translation(default).and_then(|tree| tree.resolve(key, separator).map(ToString::to_string))
    }

    /// Drops the resident translations for `lang`.
    pub fn reset_lang(&self, lang: &LanguageId) {
        self.store.reset(lang);
    }

    /// Discards and reloads the translations for `lang`, then notifies
    /// `translation_change` subscribers.
    ///
    /// # Errors
    /// [`TranslateError::LoadFailure`] if loading fails.
    pub async fn reload_lang(&self, lang: &LanguageId) -> Result<TranslationTree, TranslateError> {
        self.store.reset(lang);
        let tree = self.store.get_translation(lang).await?;

        self.events
            .translation_change
            .emit(&TranslationChangeEvent { lang: lang.clone(), translations: tree.clone() });
        Ok(tree)
    }

    pub fn add_langs(&self, langs: &[LanguageId]) {
        self.store.add_langs(langs);
    }

    #[must_use]
    pub fn langs(&self) -> Vec<LanguageId> {
        self.store.langs()
    }
}
