use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::methods::MethodSet;
use crate::error::NasseError;

/// A value an endpoint returns. Documentation only: the dispatcher never
/// looks at it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Return {
    pub name: String,
    #[serde(default)]
    pub example: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub methods: MethodSet,
    #[serde(default, rename = "type")]
    pub type_tag: Option<String>,
    #[serde(default, deserialize_with = "children")]
    pub children: Vec<Return>,
    #[serde(default)]
    pub nullable: bool,
}

impl Return {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            example: Value::Null,
            description: String::new(),
            methods: MethodSet::all(),
            type_tag: None,
            children: Vec::new(),
            nullable: false,
        }
    }

    #[must_use]
    pub fn example(mut self, example: Value) -> Self {
        self.example = example;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn methods(mut self, methods: MethodSet) -> Self {
        self.methods = methods;
        self
    }

    #[must_use]
    pub fn type_tag(mut self, type_tag: impl Into<String>) -> Self {
        self.type_tag = Some(type_tag.into());
        self
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<Return>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Type tag, inferred from the example when not declared.
    #[must_use]
    pub fn effective_type(&self) -> &str {
        if let Some(t) = &self.type_tag {
            return t;
        }
        match &self.example {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_f64() => "float",
            Value::Number(_) => "int",
            Value::String(_) => "str",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

/// Children accept the same shapes as a top-level return.
fn children<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Return>, D::Error> {
    let raw = Vec::<Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|v| Return::try_from(v).map_err(de::Error::custom))
        .collect()
}

impl From<&str> for Return {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Return {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl TryFrom<Value> for Return {
    type Error = NasseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(Self::new(name)),
            Value::Object(_) => {
                serde_json::from_value(value).map_err(|e| NasseError::conversion("Return", e.to_string()))
            }
            other => Err(NasseError::conversion(
                "Return",
                format!("expected a name or a mapping, got {other}"),
            )),
        }
    }
}
