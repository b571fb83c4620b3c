use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use http::Method;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::error::NasseError;

/// Wildcard key meaning "every method".
pub const ALL_METHODS: &str = "*";

/// Verbs a `*` method set expands to when talking to the transport.
pub const HTTP_VERBS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
    Method::PATCH,
];

/// A set of uppercase HTTP verb tokens, or `*`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodSet(BTreeSet<String>);

impl Default for MethodSet {
    fn default() -> Self {
        Self::all()
    }
}

impl MethodSet {
    /// `{"*"}`
    #[must_use]
    pub fn all() -> Self {
        Self(BTreeSet::from([ALL_METHODS.to_string()]))
    }

    /// Build a set from tokens; tokens are trimmed and uppercased.
    ///
    /// An empty input yields `{"*"}`.
    pub fn new<I, S>(methods: I) -> Result<Self, NasseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for raw in methods {
            let token = raw.as_ref().trim().to_ascii_uppercase();
            if token.is_empty() {
                continue;
            }
            if token != ALL_METHODS && Method::from_bytes(token.as_bytes()).is_err() {
                return Err(NasseError::conversion(
                    "MethodSet",
                    format!("'{token}' is not an HTTP method"),
                ));
            }
            set.insert(token);
        }
        if set.is_empty() {
            return Ok(Self::all());
        }
        Ok(Self(set))
    }

    /// `"*" ∈ methods`
    #[must_use]
    pub fn all_methods(&self) -> bool {
        self.0.contains(ALL_METHODS)
    }

    /// Applies-to-method predicate: `"*" ∈ methods ∨ method ∈ methods`.
    #[must_use]
    pub fn applies_to(&self, method: &str) -> bool {
        self.all_methods() || self.0.iter().any(|m| m.eq_ignore_ascii_case(method))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Concrete verbs, with `*` expanded to every HTTP verb.
    #[must_use]
    pub fn expand(&self) -> Vec<Method> {
        if self.all_methods() {
            return HTTP_VERBS.to_vec();
        }
        self.0
            .iter()
            .filter_map(|m| Method::from_bytes(m.as_bytes()).ok())
            .collect()
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(", "))
    }
}

impl From<Method> for MethodSet {
    fn from(method: Method) -> Self {
        Self(BTreeSet::from([method.as_str().to_string()]))
    }
}

impl<'de> Deserialize<'de> for MethodSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }
        let tokens = match Raw::deserialize(deserializer)? {
            Raw::One(s) => s
                .split(|c: char| c == ',' || c.is_whitespace())
                .map(str::to_string)
                .collect(),
            Raw::Many(v) => v,
        };
        MethodSet::new(tokens).map_err(de::Error::custom)
    }
}

/// A small string-keyed mapping from method to value with a `*` fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct PerMethod<T>(BTreeMap<String, T>);

impl<T> Default for PerMethod<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T> PerMethod<T> {
    /// `{"*": value}`
    pub fn all(value: T) -> Self {
        Self(BTreeMap::from([(ALL_METHODS.to_string(), value)]))
    }

    pub fn insert(&mut self, method: impl AsRef<str>, value: T) -> Option<T> {
        self.0
            .insert(method.as_ref().trim().to_ascii_uppercase(), value)
    }

    /// Exact method first, then `*`.
    pub fn get(&self, method: &str) -> Option<&T> {
        self.0
            .get(&method.to_ascii_uppercase())
            .or_else(|| self.0.get(ALL_METHODS))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for PerMethod<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Map(BTreeMap<String, T>),
            One(T),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Map(map) => {
                let mut per = PerMethod::default();
                for (k, v) in map {
                    per.insert(k, v);
                }
                per
            }
            Raw::One(value) => PerMethod::all(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_normalized() {
        let set = MethodSet::new([" get", "Post"]).unwrap();
        assert!(set.applies_to("GET"));
        assert!(set.applies_to("post"));
        assert!(!set.applies_to("DELETE"));
        assert!(!set.all_methods());
    }

    #[test]
    fn test_wildcard_applies_everywhere() {
        let set = MethodSet::all();
        assert!(set.applies_to("PATCH"));
        assert_eq!(set.expand().len(), HTTP_VERBS.len());
    }

    #[test]
    fn test_invalid_token_rejected() {
        assert!(MethodSet::new(["GE T"]).is_err());
    }

    #[test]
    fn test_per_method_fallback() {
        let mut per = PerMethod::all("any");
        per.insert("post", "post only");
        assert_eq!(per.get("POST"), Some(&"post only"));
        assert_eq!(per.get("GET"), Some(&"any"));
        let empty: PerMethod<&str> = PerMethod::default();
        assert_eq!(empty.get("GET"), None);
    }

    #[test]
    fn test_deserialize_shapes() {
        let set: MethodSet = serde_json::from_str("\"GET, POST\"").unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["GET", "POST"]);
        let per: PerMethod<String> = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(per.get("PUT").map(String::as_str), Some("hello"));
    }
}
