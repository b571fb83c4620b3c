//! Route pattern compilation.
//!
//! ```text
//! pattern  := "/" segment ("/" segment)*
//! segment  := literal | "<" name ">" | "<" type ":" name ">"
//! type     := "str" | "int" | "float" | <extension>
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::error::NasseError;

static DYNAMIC_SEGMENT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^<(?:([A-Za-z_][A-Za-z0-9_]*):)?([A-Za-z_][A-Za-z0-9_]*)>$").ok()
});

/// Name of the fallback capture type.
pub const STR_TYPE: &str = "str";

/// One slash-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Dynamic { name: String, kind: String },
}

impl Segment {
    fn parse(raw: &str) -> Self {
        let captures = DYNAMIC_SEGMENT.as_ref().and_then(|re| re.captures(raw));
        match captures {
            Some(caps) => {
                let kind = caps
                    .get(1)
                    .map_or(STR_TYPE, |m| m.as_str())
                    .to_string();
                let name = caps.get(2).map_or("", |m| m.as_str()).to_string();
                Segment::Dynamic { name, kind }
            }
            None => Segment::Literal(raw.to_string()),
        }
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Segment::Dynamic { .. })
    }
}

/// Split a request path into segments, ignoring leading/trailing slashes.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

/// A compiled route pattern such as `/pages/<int:page>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern. The pattern must start with `/`.
    pub fn parse(pattern: &str) -> Result<Self, NasseError> {
        if !pattern.starts_with('/') {
            return Err(NasseError::conversion(
                "PathPattern",
                format!("the path '{pattern}' must start with '/'"),
            ));
        }
        let segments = split_path(pattern).into_iter().map(Segment::parse).collect();
        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of dynamic segments; lower means more specific.
    #[must_use]
    pub fn dynamic_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_dynamic()).count()
    }

    /// Names of the dynamic segments, in order.
    pub fn dynamic_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Dynamic { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Build a concrete path from capture values.
    ///
    /// Strings are inserted verbatim, numbers through their JSON display form.
    pub fn render(&self, values: &Map<String, Value>) -> Result<String, NasseError> {
        let mut path = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(lit) => path.push_str(lit),
                Segment::Dynamic { name, .. } => match values.get(name) {
                    Some(Value::String(s)) => path.push_str(s),
                    Some(Value::Number(n)) => path.push_str(&n.to_string()),
                    Some(other) => {
                        return Err(NasseError::conversion(
                            "path segment",
                            format!("'{name}' cannot be rendered from {other}"),
                        ))
                    }
                    None => {
                        return Err(NasseError::conversion(
                            "path segment",
                            format!("no value given for '{name}'"),
                        ))
                    }
                },
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }

    /// Project the pattern into the dialect of a host transport.
    #[must_use]
    pub fn to_transport(&self, converters: &Converters, style: TransportStyle) -> String {
        let mut path = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(lit) => path.push_str(lit),
                Segment::Dynamic { name, kind } => {
                    let tag = converters.resolve(kind).transport_name.as_str();
                    match style {
                        TransportStyle::Angle => {
                            path.push('<');
                            path.push_str(tag);
                            path.push(':');
                            path.push_str(name);
                            path.push('>');
                        }
                        TransportStyle::Brace => {
                            path.push('{');
                            path.push_str(name);
                            path.push('}');
                        }
                    }
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        path
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Path parameter syntax expected by the host transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportStyle {
    /// `<int:page>` with the converter's transport tag
    #[default]
    Angle,
    /// `{page}`
    Brace,
}

type CastFn = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// Coerces a raw path segment into a typed capture.
#[derive(Clone)]
pub struct Converter {
    pub transport_name: String,
    cast: Arc<CastFn>,
}

impl Converter {
    pub fn new<F>(transport_name: impl Into<String>, cast: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            transport_name: transport_name.into(),
            cast: Arc::new(cast),
        }
    }

    pub fn cast(&self, raw: &str) -> Result<Value, String> {
        (self.cast)(raw)
    }

    fn string() -> Self {
        Self::new("string", |raw| Ok(Value::String(raw.to_string())))
    }

    fn int() -> Self {
        Self::new("int", |raw| {
            raw.parse::<i64>()
                .map(Value::from)
                .map_err(|e| format!("'{raw}' is not an integer ({e})"))
        })
    }

    fn float() -> Self {
        Self::new("float", |raw| {
            raw.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{raw}' is not a finite number"))
        })
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("transport_name", &self.transport_name)
            .finish_non_exhaustive()
    }
}

/// Registry of capture types, extensible by the user.
#[derive(Debug, Clone)]
pub struct Converters {
    by_name: HashMap<String, Converter>,
    fallback: Converter,
}

impl Default for Converters {
    fn default() -> Self {
        let mut by_name = HashMap::new();
        by_name.insert(STR_TYPE.to_string(), Converter::string());
        by_name.insert("int".to_string(), Converter::int());
        by_name.insert("float".to_string(), Converter::float());
        Self {
            by_name,
            fallback: Converter::string(),
        }
    }
}

impl Converters {
    pub fn register(&mut self, name: impl Into<String>, converter: Converter) {
        self.by_name.insert(name.into(), converter);
    }

    /// Look up a converter; unknown types fall back to `str`.
    #[must_use]
    pub fn resolve(&self, kind: &str) -> &Converter {
        self.by_name.get(kind).unwrap_or(&self.fallback)
    }
}
