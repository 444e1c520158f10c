//! Interpolation propagation
//!
//! Applies the host interpolation function to every string in a decoded
//! value, mapping keys included. Numbers, booleans, and null pass through
//! untouched.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// Interpolate every string leaf and mapping key of `value`.
///
/// Sequence order is preserved. Two keys of one mapping that interpolate to
/// the same key are a collision error. Errors from `interpolate` are
/// returned unchanged.
pub fn propagate<F>(value: Value, interpolate: &mut F) -> Result<Value>
where
    F: FnMut(&str) -> Result<String>,
{
    Ok(match value {
        Value::String(s) => Value::String(interpolate(&s)?),
        Value::Sequence(seq) => Value::Sequence(
            seq.into_iter()
                .map(|v| propagate(v, interpolate))
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Mapping(map) => Value::Mapping(propagate_mapping(map, interpolate)?),
        scalar @ (Value::Null | Value::Bool(_) | Value::Integer(_) | Value::Float(_)) => scalar,
    })
}

fn propagate_mapping<F>(
    map: IndexMap<String, Value>,
    interpolate: &mut F,
) -> Result<IndexMap<String, Value>>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut result = IndexMap::with_capacity(map.len());
    // interpolated key -> source key, for collision reporting
    let mut sources: IndexMap<String, String> = IndexMap::with_capacity(map.len());

    for (key, value) in map {
        let new_key = interpolate(&key)?;
        if let Some(previous) = sources.get(&new_key) {
            return Err(Error::key_collision(previous, &key, &new_key));
        }
        let new_value = propagate(value, interpolate)?;
        sources.insert(new_key.clone(), key);
        result.insert(new_key, new_value);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn identity(s: &str) -> Result<String> {
        Ok(s.to_string())
    }

    fn sample() -> Value {
        let mut inner = IndexMap::new();
        inner.insert("host".to_string(), Value::from("db.%{env}.internal"));
        inner.insert("port".to_string(), Value::Integer(5432));
        inner.insert("tls".to_string(), Value::Bool(true));
        inner.insert("ratio".to_string(), Value::Float(0.5));
        inner.insert("replica".to_string(), Value::Null);

        let mut map = IndexMap::new();
        map.insert("database".to_string(), Value::Mapping(inner));
        map.insert(
            "servers".to_string(),
            Value::Sequence(vec![
                Value::from("a-%{env}"),
                Value::Sequence(vec![Value::from("nested")]),
                Value::Integer(3),
            ]),
        );
        Value::Mapping(map)
    }

    #[test]
    fn test_identity_is_identity() {
        let value = sample();
        assert_eq!(propagate(value.clone(), &mut identity).unwrap(), value);
    }

    #[test]
    fn test_string_interpolated() {
        let mut f = |s: &str| Ok(s.replace("%{env}", "prod"));
        assert_eq!(
            propagate(Value::from("db.%{env}"), &mut f).unwrap(),
            Value::from("db.prod")
        );
    }

    #[test]
    fn test_mapping_key_interpolated() {
        let mut map = IndexMap::new();
        map.insert("%{x}".to_string(), Value::from("val"));

        let mut f = |s: &str| Ok(if s == "%{x}" { "k".to_string() } else { s.to_string() });
        let result = propagate(Value::Mapping(map), &mut f).unwrap();

        let mut expected = IndexMap::new();
        expected.insert("k".to_string(), Value::from("val"));
        assert_eq!(result, Value::Mapping(expected));
    }

    #[test]
    fn test_recurses_into_nested_values() {
        let mut f = |s: &str| Ok(s.replace("%{env}", "prod"));
        let result = propagate(sample(), &mut f).unwrap();

        let map = result.as_mapping().unwrap();
        let database = map.get("database").unwrap().as_mapping().unwrap();
        assert_eq!(database.get("host"), Some(&Value::from("db.prod.internal")));
        assert_eq!(database.get("port"), Some(&Value::Integer(5432)));
        assert_eq!(
            map.get("servers").unwrap().as_sequence().unwrap()[0],
            Value::from("a-prod")
        );
    }

    #[test]
    fn test_sequence_order_preserved() {
        let mut calls = Vec::new();
        let mut f = |s: &str| {
            calls.push(s.to_string());
            Ok(s.to_uppercase())
        };
        let result = propagate(Value::from(vec!["x", "y", "z"]), &mut f).unwrap();

        assert_eq!(result, Value::from(vec!["X", "Y", "Z"]));
        assert_eq!(calls, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_non_string_scalars_untouched() {
        let mut f = |_: &str| -> Result<String> { panic!("must not interpolate non-strings") };

        for scalar in [
            Value::Null,
            Value::Bool(false),
            Value::Integer(-1),
            Value::Float(1.5),
        ] {
            assert_eq!(propagate(scalar.clone(), &mut f).unwrap(), scalar);
        }
    }

    #[test]
    fn test_key_collision_is_error() {
        let mut map = IndexMap::new();
        map.insert("%{a}".to_string(), Value::Integer(1));
        map.insert("%{b}".to_string(), Value::Integer(2));

        let mut f = |s: &str| {
            Ok(if s.starts_with("%{") {
                "same".to_string()
            } else {
                s.to_string()
            })
        };
        let err = propagate(Value::Mapping(map), &mut f).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Interpolation);
        assert!(err
            .to_string()
            .contains("Keys '%{a}' and '%{b}' both interpolate to 'same'"));
    }

    #[test]
    fn test_interpolation_error_propagates() {
        let mut f = crate::context::failing_on("%{missing}");
        let value = Value::from(vec!["ok", "%{missing}"]);

        let err = propagate(value, &mut f).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Interpolation);
        assert!(err.to_string().contains("Undefined variable in '%{missing}'"));
    }
}
