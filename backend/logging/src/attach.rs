//! Turning arbitrary values and errors into the single attached field.

use std::error::Error as StdError;

use serde::Serialize;
use serde_json::{Map, Value};

/// Serialize `value` for attachment. A value that fails to serialize is
/// attached as the failure text instead of being dropped.
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|err| Value::String(format!("can not serialize value: {err}")))
}

/// `{"error": "<display>", "causes": ["<source>", ...]}`, following
/// `source()` until the chain ends. `causes` is left out for a bare error.
pub fn error_chain(err: &(dyn StdError + 'static)) -> Value {
    let mut object = Map::new();
    object.insert("error".to_owned(), Value::String(err.to_string()));

    let causes: Vec<Value> = std::iter::successors(err.source(), |&cause| cause.source())
        .map(|cause| Value::String(cause.to_string()))
        .collect();
    if !causes.is_empty() {
        object.insert("causes".to_owned(), Value::Array(causes));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io;

    use serde_json::json;
    use thiserror::Error;

    use super::*;

    #[derive(Debug, Error)]
    #[error("3.Wrapped")]
    struct Outer(#[source] Middle);

    #[derive(Debug, Error)]
    #[error("2.Wrapped")]
    struct Middle(#[source] io::Error);

    #[derive(Serialize)]
    struct User {
        id: u32,
        name: &'static str,
        #[serde(skip)]
        _age: u32,
    }

    #[test]
    fn serializes_structs() {
        let user = User { id: 1, name: "goroumaru", _age: 10 };
        assert_eq!(to_value(&user), json!({"id": 1, "name": "goroumaru"}));
        assert_eq!(to_value("plain"), json!("plain"));
    }

    #[test]
    fn unserializable_value_becomes_failure_text() {
        // JSON object keys must be strings.
        let map = BTreeMap::from([(vec![1u8], 1)]);
        let value = to_value(&map);
        assert!(value.as_str().unwrap().starts_with("can not serialize value"));
    }

    #[test]
    fn records_source_chain() {
        let err = Outer(Middle(io::Error::other("1.Occured")));
        assert_eq!(
            error_chain(&err),
            json!({"error": "3.Wrapped", "causes": ["2.Wrapped", "1.Occured"]})
        );
    }

    #[test]
    fn bare_error_has_no_causes() {
        let err = io::Error::other("1.Occured");
        assert_eq!(error_chain(&err), json!({"error": "1.Occured"}));
    }
}
