//! Wire Format Types
//!
//! The dynamically shaped value exchanged with the RPC transport. Requests are
//! built as `WireValue` trees and replies come back as `WireValue` trees; the
//! envelope codec decides how a tree is framed on the network.
//!
//! Maps keep insertion order and only carry string keys, which is all the
//! Marketstore data service uses. Raw byte strings are kept distinct from text
//! so column buffers survive any binary-capable codec untouched.

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

// ============================================================================
// Wire Value
// ============================================================================

/// Wire-serializable value tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WireValue {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    /// Binary data
    Bytes(Vec<u8>),
    Array(Vec<WireValue>),
    /// String-keyed map, insertion ordered
    Map(Vec<(String, WireValue)>),
}

impl WireValue {
    /// Build a map from key/value pairs, preserving their order.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, WireValue)>,
    {
        WireValue::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// An empty map.
    pub fn empty_map() -> Self {
        WireValue::Map(Vec::new())
    }

    /// Wrap raw bytes.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        WireValue::Bytes(data.into())
    }

    /// Look up a key in a map value. Returns `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        match self {
            WireValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Insert or replace a key in a map value. No-op for non-maps.
    pub fn insert(&mut self, key: impl Into<String>, value: WireValue) {
        if let WireValue::Map(entries) = self {
            let key = key.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
    }

    /// Check if this value is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, WireValue::Nil)
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::Int(v) => Some(*v),
            WireValue::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Try to get as u64
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            WireValue::Int(v) => u64::try_from(*v).ok(),
            WireValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Int(v) => Some(*v as f64),
            WireValue::UInt(v) => Some(*v as f64),
            WireValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string reference. Byte strings holding UTF-8 count too,
    /// since some codecs do not distinguish the two.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Str(s) => Some(s),
            WireValue::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Try to get as raw bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            WireValue::Bytes(b) => Some(b),
            WireValue::Str(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to get as array
    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get as map entries
    pub fn as_map(&self) -> Option<&[(String, WireValue)]> {
        match self {
            WireValue::Map(entries) => Some(entries),
            _ => None,
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Nil => write!(f, "nil"),
            WireValue::Bool(b) => write!(f, "{b}"),
            WireValue::Int(v) => write!(f, "{v}"),
            WireValue::UInt(v) => write!(f, "{v}"),
            WireValue::Float(v) => write!(f, "{v}"),
            WireValue::Str(s) => write!(f, "\"{s}\""),
            WireValue::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            WireValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            WireValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for WireValue {
    fn from(v: bool) -> Self {
        WireValue::Bool(v)
    }
}

impl From<i64> for WireValue {
    fn from(v: i64) -> Self {
        WireValue::Int(v)
    }
}

impl From<u32> for WireValue {
    fn from(v: u32) -> Self {
        WireValue::UInt(u64::from(v))
    }
}

impl From<u64> for WireValue {
    fn from(v: u64) -> Self {
        WireValue::UInt(v)
    }
}

impl From<usize> for WireValue {
    fn from(v: usize) -> Self {
        WireValue::UInt(v as u64)
    }
}

impl From<f64> for WireValue {
    fn from(v: f64) -> Self {
        WireValue::Float(v)
    }
}

impl From<&str> for WireValue {
    fn from(v: &str) -> Self {
        WireValue::Str(v.to_string())
    }
}

impl From<String> for WireValue {
    fn from(v: String) -> Self {
        WireValue::Str(v)
    }
}

impl<T: Into<WireValue>> From<Option<T>> for WireValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(WireValue::Nil, Into::into)
    }
}

impl<T: Into<WireValue>> FromIterator<T> for WireValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        WireValue::Array(iter.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Serde
// ============================================================================

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireValue::Nil => serializer.serialize_unit(),
            WireValue::Bool(b) => serializer.serialize_bool(*b),
            WireValue::Int(v) => serializer.serialize_i64(*v),
            WireValue::UInt(v) => serializer.serialize_u64(*v),
            WireValue::Float(v) => serializer.serialize_f64(*v),
            WireValue::Str(s) => serializer.serialize_str(s),
            WireValue::Bytes(b) => serializer.serialize_bytes(b),
            WireValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            WireValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

struct WireValueVisitor;

impl<'de> Visitor<'de> for WireValueVisitor {
    type Value = WireValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any wire value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<WireValue, E> {
        Ok(WireValue::Nil)
    }

    fn visit_none<E: de::Error>(self) -> Result<WireValue, E> {
        Ok(WireValue::Nil)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<WireValue, D::Error> {
        WireValue::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<WireValue, E> {
        Ok(WireValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<WireValue, E> {
        Ok(WireValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<WireValue, E> {
        Ok(WireValue::UInt(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<WireValue, E> {
        Ok(WireValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<WireValue, E> {
        Ok(WireValue::Str(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<WireValue, E> {
        Ok(WireValue::Str(v))
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<WireValue, E> {
        Ok(WireValue::Bytes(v.to_vec()))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<WireValue, E> {
        Ok(WireValue::Bytes(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<WireValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(WireValue::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<WireValue, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((k, v)) = access.next_entry::<String, WireValue>()? {
            entries.push((k, v));
        }
        Ok(WireValue::Map(entries))
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WireValueVisitor)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_preserves_insertion_order() {
        let mut value =
            WireValue::map([("b", WireValue::from(1i64)), ("a", WireValue::from(2i64))]);
        value.insert("c", WireValue::from(true));
        value.insert("b", WireValue::from(9i64));

        let keys: Vec<&str> = value
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(value.get("b").and_then(WireValue::as_i64), Some(9));
    }

    #[test]
    fn test_get_on_non_map() {
        assert!(WireValue::from(1i64).get("x").is_none());
        assert!(WireValue::Nil.is_nil());
    }

    #[test]
    fn test_integer_accessors_cross_sign() {
        assert_eq!(WireValue::UInt(5).as_i64(), Some(5));
        assert_eq!(WireValue::Int(-1).as_u64(), None);
        assert_eq!(WireValue::UInt(u64::MAX).as_i64(), None);
        assert_eq!(WireValue::Int(3).as_f64(), Some(3.0));
    }

    #[test]
    fn test_str_and_bytes_interchange() {
        assert_eq!(WireValue::bytes(b"AAPL".to_vec()).as_str(), Some("AAPL"));
        assert_eq!(WireValue::from("AAPL").as_bytes(), Some(&b"AAPL"[..]));
        assert_eq!(WireValue::bytes(vec![0xff, 0xfe]).as_str(), None);
    }

    #[test]
    fn test_from_iterator_builds_array() {
        let value: WireValue = vec!["a", "b"].into_iter().collect();
        assert_eq!(
            value,
            WireValue::Array(vec![WireValue::from("a"), WireValue::from("b")])
        );
    }

    #[test]
    fn test_display() {
        let value = WireValue::map([
            ("key", WireValue::from("TEST/1Min/Tick")),
            ("data", WireValue::bytes(vec![1, 2, 3])),
        ]);
        assert_eq!(value.to_string(), "{key: \"TEST/1Min/Tick\", data: bytes[3]}");
    }

    #[test]
    fn test_json_serialization() {
        let value = WireValue::map([
            ("requests", WireValue::Array(vec![WireValue::map([("key", WireValue::from("X"))])])),
            ("none", WireValue::Nil),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"requests":[{"key":"X"}],"none":null}"#);
    }

    #[test]
    fn test_json_deserialization() {
        let value: WireValue =
            serde_json::from_str(r#"{"Results":["A","B"],"n":-3,"u":7,"f":1.5,"z":null}"#).unwrap();
        let results: Vec<&str> = value
            .get("Results")
            .and_then(WireValue::as_array)
            .unwrap()
            .iter()
            .filter_map(WireValue::as_str)
            .collect();
        assert_eq!(results, vec!["A", "B"]);
        assert_eq!(value.get("n"), Some(&WireValue::Int(-3)));
        assert_eq!(value.get("u"), Some(&WireValue::UInt(7)));
        assert_eq!(value.get("f"), Some(&WireValue::Float(1.5)));
        assert_eq!(value.get("z"), Some(&WireValue::Nil));
    }
}
