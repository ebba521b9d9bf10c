//! Ordered key/value/enabled triples.
//!
//! Headers, query parameters and gRPC metadata all share this shape.

use serde::{Deserialize, Serialize};

/// A single key/value pair that can be switched off without deleting it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyValue {
    /// The key (header name, parameter name, metadata name). Never templated.
    pub key: String,
    /// The value. May contain `{{variable}}` placeholders.
    #[serde(default)]
    pub value: String,
    /// Whether this pair takes part in sends and generated code.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl KeyValue {
    /// Creates a new enabled pair.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            enabled: true,
        }
    }

    /// Creates a new disabled pair.
    #[must_use]
    pub fn disabled(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(key, value)
        }
    }
}

/// An ordered list of [`KeyValue`] pairs. Duplicated keys are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueList {
    items: Vec<KeyValue>,
}

/// HTTP headers.
pub type Headers = KeyValueList;

/// URL query parameters.
pub type QueryParams = KeyValueList;

/// gRPC call metadata.
pub type Metadata = KeyValueList;

impl KeyValueList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Appends a pair.
    pub fn add(&mut self, pair: KeyValue) {
        self.items.push(pair);
    }

    /// Appends an enabled pair, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(KeyValue::new(key, value));
        self
    }

    /// Returns an iterator over enabled pairs, in order.
    pub fn enabled(&self) -> impl Iterator<Item = &KeyValue> {
        self.items.iter().filter(|p| p.enabled)
    }

    /// Returns all pairs (enabled and disabled).
    #[must_use]
    pub fn all(&self) -> &[KeyValue] {
        &self.items
    }

    /// Returns mutable access to every pair.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut KeyValue> {
        self.items.iter_mut()
    }

    /// Returns the value of the first enabled pair whose key matches,
    /// ignoring ASCII case.
    #[must_use]
    pub fn get_ignore_case(&self, key: &str) -> Option<&str> {
        self.enabled()
            .find(|p| p.key.eq_ignore_ascii_case(key))
            .map(|p| p.value.as_str())
    }

    /// Returns true if an enabled pair with this key exists, ignoring ASCII case.
    #[must_use]
    pub fn contains_ignore_case(&self, key: &str) -> bool {
        self.get_ignore_case(key).is_some()
    }

    /// Returns the number of pairs.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::len is not const in stable
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no pairs.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec::is_empty is not const in stable
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<KeyValue> for KeyValueList {
    fn from_iter<T: IntoIterator<Item = KeyValue>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a KeyValueList {
    type Item = &'a KeyValue;
    type IntoIter = std::slice::Iter<'a, KeyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
