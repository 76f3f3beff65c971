//! reactive-translate
//!
//! Key-based translation lookup with `{{param}}` interpolation, per-language
//! translation stores loaded on demand, and memoized bindings that refresh
//! when the active language changes.

pub mod binding;
pub mod config;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod loader;
pub mod params;
pub mod resolver;
pub mod service;
pub mod store;
pub mod tree;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use binding::{
    MarkDirty,
    TranslationBinding,
};
pub use error::{
    LoaderError,
    TranslateError,
};
pub use events::{
    DefaultLangChangeEvent,
    EventStream,
    LangChangeEvent,
    LanguageChangeBroadcaster,
    Subscription,
    TranslationChangeEvent,
};
pub use loader::{
    FileLoader,
    MemoryLoader,
    TranslationLoader,
};
pub use params::{
    Params,
    ParamsInput,
};
pub use service::{
    MissingTranslationHandler,
    TranslateService,
    TranslateServiceBuilder,
};
pub use store::TranslationStore;
pub use tree::{
    MergeMode,
    TranslationTree,
};
pub use types::{
    ActiveLanguages,
    LanguageId,
    LanguageIdError,
};
