use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::methods::MethodSet;
use crate::error::{MissingKind, NasseError};

type CoerceFn = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// Callable producing a typed value from a raw user-sent string.
#[derive(Clone)]
pub struct Coercion {
    name: String,
    coerce: Arc<CoerceFn>,
}

impl Coercion {
    pub fn new<F>(name: impl Into<String>, coerce: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            coerce: Arc::new(coerce),
        }
    }

    /// Type tag shown in documentation (`int`, `float`...).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coerce(&self, raw: &str) -> Result<Value, String> {
        (self.coerce)(raw)
    }

    #[must_use]
    pub fn string() -> Self {
        Self::new("str", |raw| Ok(Value::String(raw.to_string())))
    }

    #[must_use]
    pub fn int() -> Self {
        Self::new("int", |raw| {
            raw.trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| format!("'{raw}' is not an integer ({e})"))
        })
    }

    #[must_use]
    pub fn float() -> Self {
        Self::new("float", |raw| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{raw}' is not a finite number"))
        })
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::new("bool", |raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(format!("'{raw}' is not a boolean")),
        })
    }

    #[must_use]
    pub fn json() -> Self {
        Self::new("json", |raw| {
            serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
        })
    }

    /// Built-in coercion for a type tag.
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "str" | "string" => Some(Self::string()),
            "int" | "integer" => Some(Self::int()),
            "float" | "number" => Some(Self::float()),
            "bool" | "boolean" => Some(Self::boolean()),
            "json" => Some(Self::json()),
            _ => None,
        }
    }
}

impl fmt::Debug for Coercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Coercion").field(&self.name).finish()
    }
}

/// Marker for the four kinds of client-supplied values.
pub trait UserSentKind: Send + Sync + 'static {
    /// Declaration type name used in conversion errors.
    const TARGET: &'static str;
    /// Error kind raised when a required value is absent.
    const MISSING: MissingKind;
}

macro_rules! user_sent_kind {
    ($marker:ident, $alias:ident, $target:literal, $missing:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $marker;

        impl UserSentKind for $marker {
            const TARGET: &'static str = $target;
            const MISSING: MissingKind = $missing;
        }

        pub type $alias = UserSent<$marker>;
    };
}

user_sent_kind!(ParameterKind, Parameter, "Parameter", MissingKind::Parameter);
user_sent_kind!(HeaderKind, Header, "Header", MissingKind::Header);
user_sent_kind!(CookieKind, Cookie, "Cookie", MissingKind::Cookie);
user_sent_kind!(DynamicKind, Dynamic, "Dynamic", MissingKind::Dynamic);

/// A value the client supplies: a parameter, header, cookie or path segment.
pub struct UserSent<K: UserSentKind> {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub methods: MethodSet,
    pub coercion: Option<Coercion>,
    kind: PhantomData<K>,
}

impl<K: UserSentKind> UserSent<K> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: true,
            methods: MethodSet::all(),
            coercion: None,
            kind: PhantomData,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn optional(self) -> Self {
        self.required(false)
    }

    #[must_use]
    pub fn methods(mut self, methods: MethodSet) -> Self {
        self.methods = methods;
        self
    }

    #[must_use]
    pub fn coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = Some(coercion);
        self
    }

    #[must_use]
    pub fn all_methods(&self) -> bool {
        self.methods.all_methods()
    }

    #[must_use]
    pub fn applies_to(&self, method: &str) -> bool {
        self.methods.applies_to(method)
    }

    /// The error raised when this value is required but absent.
    #[must_use]
    pub fn missing_error(&self) -> NasseError {
        NasseError::missing(K::MISSING, self.name.clone())
    }

    /// Coerce every raw value, or return them unchanged without a coercion.
    pub fn coerce_all(&self, raw: &[Value]) -> Result<Vec<Value>, NasseError> {
        let Some(coercion) = &self.coercion else {
            return Ok(raw.to_vec());
        };
        raw.iter()
            .map(|value| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                coercion
                    .coerce(&text)
                    .map_err(|reason| NasseError::Validation {
                        name: self.name.clone(),
                        reason,
                    })
            })
            .collect()
    }
}

// Manual impls: derives would put bounds on the marker type.
impl<K: UserSentKind> Clone for UserSent<K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            required: self.required,
            methods: self.methods.clone(),
            coercion: self.coercion.clone(),
            kind: PhantomData,
        }
    }
}

impl<K: UserSentKind> fmt::Debug for UserSent<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::TARGET)
            .field("name", &self.name)
            .field("required", &self.required)
            .field("methods", &self.methods)
            .field("coercion", &self.coercion)
            .finish_non_exhaustive()
    }
}

impl<K: UserSentKind> PartialEq for UserSent<K> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.required == other.required
            && self.methods == other.methods
            && self.coercion.as_ref().map(Coercion::name)
                == other.coercion.as_ref().map(Coercion::name)
    }
}

impl<K: UserSentKind> From<&str> for UserSent<K> {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl<K: UserSentKind> From<String> for UserSent<K> {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UserSentFields {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_required")]
    required: bool,
    #[serde(default)]
    methods: Option<MethodSet>,
    #[serde(default, rename = "type")]
    type_name: Option<String>,
}

fn default_required() -> bool {
    true
}

impl<K: UserSentKind> UserSent<K> {
    fn from_fields(fields: UserSentFields) -> Result<Self, NasseError> {
        let coercion = match fields.type_name.as_deref() {
            None => None,
            Some(t) => Some(Coercion::by_name(t).ok_or_else(|| {
                NasseError::conversion(K::TARGET, format!("unknown value type '{t}'"))
            })?),
        };
        Ok(Self {
            name: fields.name,
            description: fields.description,
            required: fields.required,
            methods: fields.methods.unwrap_or_default(),
            coercion,
            kind: PhantomData,
        })
    }
}

impl<K: UserSentKind> TryFrom<Value> for UserSent<K> {
    type Error = NasseError;

    /// A string is the name with defaults; an object carries the fields.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(Self::new(name)),
            Value::Object(_) => {
                let fields: UserSentFields = serde_json::from_value(value)
                    .map_err(|e| NasseError::conversion(K::TARGET, e.to_string()))?;
                Self::from_fields(fields)
            }
            other => Err(NasseError::conversion(
                K::TARGET,
                format!("expected a name or a mapping, got {other}"),
            )),
        }
    }
}

impl<'de, K: UserSentKind> Deserialize<'de> for UserSent<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(de::Error::custom)
    }
}
