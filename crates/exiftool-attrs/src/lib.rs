//! Attribute storage system for EXIF metadata.
//!
//! Provides typed storage for metadata values with serialization support.
//!
//! # Example
//!
//! ```
//! use exiftool_attrs::{Attrs, AttrValue};
//!
//! let mut attrs = Attrs::new();
//! attrs.set("Make", AttrValue::Str("Canon".to_string()));
//! attrs.set("ISO", AttrValue::UInt(400));
//!
//! assert_eq!(attrs.get_str("Make"), Some("Canon"));
//! assert_eq!(attrs.get_u32("ISO"), Some(400));
//! ```

mod error;
mod value;

pub use error::{Error, Result};
pub use value::AttrValue;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Attribute container: string key -> typed value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attrs {
    #[serde(default)]
    map: HashMap<String, AttrValue>,
}

impl Attrs {
    /// Create new empty attribute container.
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Set attribute value.
    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.map.insert(key.into(), value);
    }

    /// Get attribute value by key.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    /// Get mutable reference to attribute value.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut AttrValue> {
        self.map.get_mut(key)
    }

    /// Remove attribute by key.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.map.remove(key)
    }

    /// Check if attribute exists.
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Get number of attributes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all attributes.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.map.iter()
    }

    /// Iterate mutably over all attributes.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut AttrValue)> {
        self.map.iter_mut()
    }

    // === Type-specific getters ===

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.map.get(key) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        match self.map.get(key) {
            Some(AttrValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        match self.map.get(key) {
            Some(AttrValue::UInt(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        match self.map.get(key) {
            Some(AttrValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.map.get(key) {
            Some(AttrValue::Double(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.map.get(key) {
            Some(AttrValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bytes(&self, key: &str) -> Option<&[u8]> {
        match self.map.get(key) {
            Some(AttrValue::Bytes(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn get_rational(&self, key: &str) -> Option<(i32, i32)> {
        match self.map.get(key) {
            Some(AttrValue::Rational(n, d)) => Some((*n, *d)),
            _ => None,
        }
    }

    pub fn get_urational(&self, key: &str) -> Option<(u32, u32)> {
        match self.map.get(key) {
            Some(AttrValue::URational(n, d)) => Some((*n, *d)),
            _ => None,
        }
    }

    pub fn get_uuid(&self, key: &str) -> Option<uuid::Uuid> {
        match self.map.get(key) {
            Some(AttrValue::Uuid(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_list(&self, key: &str) -> Option<&Vec<AttrValue>> {
        match self.map.get(key) {
            Some(AttrValue::List(v)) => Some(v),
            _ => None,
        }
    }

    pub fn get_map(&self, key: &str) -> Option<&HashMap<String, AttrValue>> {
        match self.map.get(key) {
            Some(AttrValue::Map(v)) => Some(v),
            _ => None,
        }
    }

    // === JSON helpers ===

    /// Get JSON value and deserialize.
    pub fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.map.get(key) {
            Some(AttrValue::Json(s)) => serde_json::from_str(s).ok(),
            _ => None,
        }
    }

    /// Serialize value to JSON and store.
    pub fn set_json<T: serde::Serialize>(&mut self, key: impl Into<String>, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            self.set(key, AttrValue::Json(json));
        }
    }

    /// Hash all attributes in sorted key order.
    pub fn hash_all(&self) -> u64 {
        let mut keys: Vec<&String> = self.map.keys().collect();
        keys.sort_unstable();

        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        for key in keys {
            key.hash(&mut hasher);
            if let Some(val) = self.map.get(key) {
                val.hash(&mut hasher);
            }
        }
        hasher.finish()
    }

    /// Pretty-print the attrs tree with indentation.
    pub fn display_tree(&self) -> AttrsTreeDisplay<'_> {
        AttrsTreeDisplay { attrs: self }
    }
}

/// Flat key/value display for Attrs, keys in sorted order.
pub struct AttrsTreeDisplay<'a> {
    attrs: &'a Attrs,
}

impl<'a> std::fmt::Display for AttrsTreeDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.attrs.map.keys().collect();
        keys.sort();

        for key in keys {
            if let Some(value) = self.attrs.map.get(key) {
                writeln!(f, "{}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for Attrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_tree())
    }
}
