//! Parameter coercion for translation lookups.
//!
//! Callers may hand parameters over either as a structured mapping or as a
//! loosely formatted object literal (`{name: 'World'}`). Both end up as a
//! [`Params`] map before interpolation touches them.

mod literal;

use serde_json::{
    Map,
    Value,
};

use crate::error::TranslateError;

/// String-keyed parameter mapping used for one interpolation.
pub type Params = Map<String, Value>;

/// Parameter argument as received at the API boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParamsInput {
    #[default]
    Absent,
    Structured(Params),
    /// Object literal text, parsed by [`coerce`]
    Text(String),
    /// Any other structured value; always rejected
    Other(Value),
}

impl From<Params> for ParamsInput {
    fn from(params: Params) -> Self {
        Self::Structured(params)
    }
}

impl From<&str> for ParamsInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ParamsInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for ParamsInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Absent,
            Value::Object(map) => Self::Structured(map),
            Value::String(text) => Self::Text(text),
            other => Self::Other(other),
        }
    }
}

impl<T: Into<Self>> From<Option<T>> for ParamsInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Turns a parameter argument into a [`Params`] map.
///
/// # Errors
/// [`TranslateError::ParameterFormat`] carrying the rejected input verbatim when
/// text is not a single braces-delimited object literal, or when a structured
/// value is not a mapping.
pub fn coerce(input: ParamsInput) -> Result<Params, TranslateError> {
    match input {
        ParamsInput::Absent => Ok(Params::new()),
        ParamsInput::Structured(params) => Ok(params),
        ParamsInput::Text(text) => literal::parse_object_literal(&text).map_err(|error| {
            tracing::debug!(literal = %text, %error, "Rejected parameter literal");
            TranslateError::ParameterFormat { literal: text }
        }),
        ParamsInput::Other(value) => {
            tracing::debug!(%value, "Rejected non-object parameter value");
            Err(TranslateError::ParameterFormat { literal: value.to_string() })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    #[rstest]
    #[case(r#"{param: "with param"}"#)]
    #[case(r#"{"param": "with param"}"#)]
    #[case("{param: 'with param'}")]
    #[case("{'param' : 'with param'}")]
    fn text_literals_coerce_to_the_same_mapping(#[case] literal: &str) {
        let coerced = coerce(literal.into()).unwrap();

        assert_eq!(coerced, params(json!({ "param": "with param" })));
    }

    #[googletest::test]
    fn structured_mapping_passes_through() {
        let input = params(json!({ "param": { "one": "A" } }));

        let coerced = coerce(ParamsInput::from(input.clone())).unwrap();

        expect_that!(coerced == input, eq(true));
    }

    #[googletest::test]
    fn absent_parameters_are_empty() {
        expect_that!(coerce(ParamsInput::Absent).unwrap().is_empty(), eq(true));
        expect_that!(coerce(None::<&str>.into()).unwrap().is_empty(), eq(true));
        expect_that!(coerce(Value::Null.into()).unwrap().is_empty(), eq(true));
    }

    #[googletest::test]
    fn bare_key_value_text_is_rejected_verbatim() {
        let literal = r#"param: "with param""#;

        let error = coerce(literal.into()).unwrap_err();

        expect_that!(
            error.to_string(),
            eq(&format!(
                "Wrong parameter in TranslationBinding. Expected a valid Object, received: {literal}"
            ))
        );
    }

    #[googletest::test]
    fn deeply_nested_text_is_a_parameter_error() {
        let literal = format!("{}'x'{}", "{a:".repeat(200_000), "}".repeat(200_000));

        let result = coerce(literal.clone().into());

        expect_that!(
            matches!(result, Err(TranslateError::ParameterFormat { literal: ref rejected }) if *rejected == literal),
            eq(true)
        );
    }

    #[rstest]
    #[case::number(json!(42))]
    #[case::array(json!(["a"]))]
    #[case::boolean(json!(true))]
    fn non_object_values_are_rejected(#[case] value: Value) {
        let rendered = value.to_string();

        let result = coerce(value.into());

        assert!(
            matches!(result, Err(TranslateError::ParameterFormat { ref literal }) if *literal == rendered)
        );
    }
}
