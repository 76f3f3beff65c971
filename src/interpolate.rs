//! `{{path}}` placeholder substitution.

use serde_json::Value;

use crate::params::Params;
use crate::resolver;

/// Opening delimiter of a placeholder.
const OPEN: &str = "{{";
/// Closing delimiter of a placeholder.
const CLOSE: &str = "}}";

/// Replaces every `{{path}}` token in `template` with the matching parameter.
///
/// `path` is a dotted sequence of letters, digits and underscores, optionally
/// padded with whitespace inside the braces, and walks nested parameter maps
/// (`{{user.name}}`). Tokens whose path does not resolve to a string, number or
/// boolean are left as they are. Substituted values are inserted literally and
/// never re-scanned.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use reactive_translate::interpolate::interpolate;
///
/// let params = json!({ "param": { "one": "A", "two": "B" } });
/// let params = params.as_object().cloned().unwrap_or_default();
///
/// assert_eq!(
///     interpolate("This is a test {{param.one}} {{param.two}}", &params),
///     "This is a test A B"
/// );
/// ```
#[must_use]
pub fn interpolate(template: &str, params: &Params) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let (before, candidate) = rest.split_at(start);
        output.push_str(before);

        match placeholder(candidate) {
            Some((path, token_len)) => {
                let (token, after) = candidate.split_at(token_len);
                match substitution(params, path) {
                    Some(value) => output.push_str(&value),
                    None => output.push_str(token),
                }
                rest = after;
            }
            None => {
                // Not a placeholder at this position; emit one brace and rescan.
                output.push('{');
                rest = candidate.get(1..).unwrap_or_default();
            }
        }
    }

    output.push_str(rest);
    output
}

/// Parses a placeholder at the start of `candidate`, returning its path and
/// the byte length of the whole token.
fn placeholder(candidate: &str) -> Option<(&str, usize)> {
    let body = candidate.strip_prefix(OPEN)?;
    let end = body.find(CLOSE)?;
    let inner = body.get(..end)?;
    let path = inner.trim();

    let valid = !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty() && segment.chars().all(|c| c.is_alphanumeric() || c == '_')
        });

    valid.then_some((path, OPEN.len() + end + CLOSE.len()))
}

/// Renders the parameter at `path`, if it is a scalar.
fn substitution(params: &Params, path: &str) -> Option<String> {
    match resolver::lookup(params, path, ".")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
