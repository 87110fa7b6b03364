#![forbid(unsafe_code)]

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decodes `T`, falling back to `T::default()` when the value has the wrong shape.
pub(super) fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let v = Value::deserialize(d)?;
    Ok(serde_json::from_value(v).unwrap_or_default())
}

/// Ids arrive as either JSON strings or numbers.
pub(super) fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Optional id: blank strings, nulls and non-scalars read as `None`; numbers are kept.
pub(super) fn non_empty<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.trim().is_empty() => Some(T::from(s)),
        Value::Number(n) => Some(T::from(n.to_string())),
        _ => None,
    })
}

/// Optional text: only non-blank strings survive, anything else reads as `None`.
pub(super) fn non_blank_string<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.trim().is_empty() => Some(T::from(s)),
        _ => None,
    })
}
