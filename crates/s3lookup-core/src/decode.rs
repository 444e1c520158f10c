//! Payload decoding
//!
//! Object bodies are parsed as YAML (which also accepts JSON). A body that
//! is not valid YAML is returned unchanged as a string.
//!
//! Only the first document of a multi-document body is used, and when a
//! mapping repeats a key the last occurrence wins.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess};

use crate::error::{Error, Result};
use crate::value::Value;

/// A decoded object body
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The body did not parse; kept verbatim
    Text(String),
    /// The body parsed as a structured document
    Document(Value),
}

impl Decoded {
    /// The decoded value, text bodies becoming string values
    pub fn into_value(self) -> Value {
        match self {
            Decoded::Text(s) => Value::String(s),
            Decoded::Document(v) => v,
        }
    }
}

/// Decode an object body.
///
/// YAML syntax errors fall back to [`Decoded::Text`]. A body that is not
/// UTF-8, or a document that cannot be represented as a [`Value`], is an
/// internal error.
pub fn decode(bytes: Vec<u8>) -> Result<Decoded> {
    let content = String::from_utf8(bytes)
        .map_err(|e| Error::internal(format!("S3 object is not valid UTF-8: {}", e)))?;

    let yaml = match first_document(&content) {
        Ok(yaml) => yaml,
        Err(e) => {
            log::trace!("Object is not YAML ({}), using it as a string", e);
            return Ok(Decoded::Text(content));
        }
    };

    Value::from_yaml(yaml).map(Decoded::Document)
}

/// Parse the first document of a YAML stream; an empty stream is null
fn first_document(content: &str) -> std::result::Result<serde_yaml::Value, serde_yaml::Error> {
    match serde_yaml::Deserializer::from_str(content).next() {
        Some(document) => LastKeyWins::deserialize(document).map(|doc| doc.0),
        None => Ok(serde_yaml::Value::Null),
    }
}

/// A YAML node whose mappings keep the last value of a repeated key.
///
/// `serde_yaml::Value` rejects repeated keys outright. Tags are dropped
/// here since lookup values never carry them.
struct LastKeyWins(serde_yaml::Value);

impl<'de> Deserialize<'de> for LastKeyWins {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(LastKeyWinsVisitor).map(LastKeyWins)
    }
}

struct LastKeyWinsVisitor;

impl<'de> de::Visitor<'de> for LastKeyWinsVisitor {
    type Value = serde_yaml::Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E>(self, b: bool) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(serde_yaml::Value::Bool(b))
    }

    fn visit_i64<E>(self, i: i64) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(serde_yaml::Value::Number(i.into()))
    }

    fn visit_u64<E>(self, u: u64) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(serde_yaml::Value::Number(u.into()))
    }

    fn visit_f64<E>(self, f: f64) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(serde_yaml::Value::Number(f.into()))
    }

    fn visit_str<E>(self, s: &str) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(serde_yaml::Value::String(s.to_owned()))
    }

    fn visit_string<E>(self, s: String) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(serde_yaml::Value::String(s))
    }

    fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(serde_yaml::Value::Null)
    }

    fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(serde_yaml::Value::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        LastKeyWins::deserialize(deserializer).map(|node| node.0)
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(LastKeyWins(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(serde_yaml::Value::Sequence(items))
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut mapping = serde_yaml::Mapping::new();
        while let Some((LastKeyWins(key), LastKeyWins(value))) = map.next_entry()? {
            mapping.insert(key, value);
        }
        Ok(serde_yaml::Value::Mapping(mapping))
    }

    fn visit_enum<A>(self, data: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: EnumAccess<'de>,
    {
        let (_tag, contents): (String, _) = data.variant()?;
        contents.newtype_variant::<LastKeyWins>().map(|node| node.0)
    }
}
