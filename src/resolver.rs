//! Translation key path resolution.

use serde_json::{
    Map,
    Value,
};

/// Looks up a separator-delimited key in a nested tree.
///
/// Segments are walked one by one. When a segment is not present it is joined
/// with the next one, so keys that literally contain the separator
/// (`{"a.b": {"c": "x"}}` looked up as `a.b.c`) still resolve. Reaching a
/// non-object before the last segment is a miss.
#[must_use]
pub fn lookup<'a>(tree: &'a Map<String, Value>, key: &str, separator: &str) -> Option<&'a Value> {
    let mut node = tree;
    let mut pending = String::new();
    let mut segments = key.split(separator).peekable();

    while let Some(segment) = segments.next() {
        let is_last = segments.peek().is_none();
        if !pending.is_empty() {
            pending.push_str(separator);
        }
        pending.push_str(segment);

        match node.get(pending.as_str()) {
            Some(value) if is_last => return Some(value),
            Some(Value::Object(child)) => {
                node = child;
                pending.clear();
            }
            _ => {}
        }
    }

    None
}

/// Resolves a key to its string leaf. Subtrees and non-string leaves are misses.
#[must_use]
pub fn resolve<'a>(tree: &'a Map<String, Value>, key: &str, separator: &str) -> Option<&'a str> {
    lookup(tree, key, separator).and_then(Value::as_str)
}
