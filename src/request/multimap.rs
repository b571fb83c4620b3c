use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Ordered multi-valued map of user-sent values.
///
/// Header maps are built case-insensitive; everything else matches keys
/// exactly. Lookups go through a key index, so building a map stays linear
/// in the number of keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiMap {
    entries: Vec<(String, Vec<Value>)>,
    // Entry position by key, lowercased for header maps.
    index: HashMap<String, usize>,
    case_insensitive: bool,
}

impl MultiMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            ..Self::default()
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut map = Self::new();
        map.extend(pairs);
        map
    }

    pub fn extend<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (k, v) in pairs {
            self.append(k, v);
        }
    }

    fn index_key<'a>(&self, key: &'a str) -> Cow<'a, str> {
        if self.case_insensitive && key.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(key.to_ascii_lowercase())
        } else {
            Cow::Borrowed(key)
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.index.get(self.index_key(key).as_ref()).copied()
    }

    fn insert_entry(&mut self, key: String, values: Vec<Value>) {
        let idx = self.entries.len();
        self.index.insert(self.index_key(&key).into_owned(), idx);
        self.entries.push((key, values));
    }

    /// Add one value under `key`, keeping previous ones.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1.push(value.into()),
            None => self.insert_entry(key, vec![value.into()]),
        }
    }

    /// Replace every value under `key`.
    pub fn set(&mut self, key: impl Into<String>, values: Vec<Value>) {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1 = values,
            None => self.insert_entry(key, values),
        }
    }

    /// First value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get_all(key).first()
    }

    /// First value under `key` when it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn get_all(&self, key: &str) -> &[Value] {
        self.position(key)
            .map_or(&[][..], |idx| self.entries[idx].1.as_slice())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply `f` to every string value.
    pub fn map_strings(&mut self, f: impl Fn(&str) -> String) {
        for (_, values) in &mut self.entries {
            for value in values.iter_mut() {
                if let Value::String(s) = value {
                    *s = f(s);
                }
            }
        }
    }

    /// Union of both maps; on conflict the entries of `over` win.
    #[must_use]
    pub fn shadowed_by(&self, over: &MultiMap) -> MultiMap {
        let mut merged = self.clone();
        for (k, v) in &over.entries {
            merged.set(k.clone(), v.clone());
        }
        merged
    }

    /// JSON object: single values stay scalar, repeated ones become arrays.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::with_capacity(self.entries.len());
        for (k, values) in &self.entries {
            let value = match values.as_slice() {
                [single] => single.clone(),
                many => Value::Array(many.to_vec()),
            };
            map.insert(k.clone(), value);
        }
        Value::Object(map)
    }
}

impl Serialize for MultiMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
