//! Immutable translation trees.

use std::sync::Arc;

use serde_json::{
    Map,
    Value,
};

use crate::error::LoaderError;
use crate::resolver;
use crate::types::LanguageId;

/// How [`TranslationTree::merged`] combines an incoming tree with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Discard the existing tree.
    #[default]
    Replace,
    /// Deep merge; incoming values win on conflicting keys.
    Overwrite,
    /// Deep merge; existing values win on conflicting keys.
    Preserve,
}

/// Nested key → string mapping for one language.
///
/// Cloning is cheap and shares the underlying map. A published tree is never
/// mutated: merging builds a new tree that replaces the old reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationTree(Arc<Map<String, Value>>);

impl TranslationTree {
    #[must_use]
    pub fn new(map: Map<String, Value>) -> Self {
        Self(Arc::new(map))
    }

    /// Builds a tree from loader output, which must be an object at its root.
    ///
    /// # Errors
    /// [`LoaderError::InvalidShape`] for any non-object value.
    pub fn from_value(lang: &LanguageId, value: Value) -> Result<Self, LoaderError> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            _ => Err(LoaderError::InvalidShape(lang.clone())),
        }
    }

    /// Resolves `key` to its string leaf.
    #[must_use]
    pub fn resolve(&self, key: &str, separator: &str) -> Option<&str> {
        resolver::resolve(&self.0, key, separator)
    }

    /// Combines `self` (existing) with `incoming` into a new tree.
    #[must_use]
    pub fn merged(&self, incoming: &Self, mode: MergeMode) -> Self {
        match mode {
            MergeMode::Replace => incoming.clone(),
            MergeMode::Overwrite => {
                let mut map = (*self.0).clone();
                deep_merge(&mut map, &incoming.0, true);
                Self::new(map)
            }
            MergeMode::Preserve => {
                let mut map = (*self.0).clone();
                deep_merge(&mut map, &incoming.0, false);
                Self::new(map)
            }
        }
    }
}

fn deep_merge(base: &mut Map<String, Value>, incoming: &Map<String, Value>, incoming_wins: bool) {
    for (key, value) in incoming {
        if let (Some(Value::Object(existing)), Value::Object(child)) = (base.get_mut(key), value) {
            deep_merge(existing, child, incoming_wins);
        } else if incoming_wins || !base.contains_key(key) {
            base.insert(key.clone(), value.clone());
        }
    }
}
