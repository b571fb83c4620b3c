use serde::Deserialize;
use serde_json::Value;

use super::methods::MethodSet;
use super::naming::error_name_from_type;
use crate::error::NasseError;
use crate::response::Exception;

/// An error an endpoint documents. Runtime exceptions map to the same
/// `(name, message, code)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclaredError {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_code")]
    pub code: u16,
    #[serde(default)]
    pub methods: MethodSet,
}

fn default_code() -> u16 {
    500
}

impl DeclaredError {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            code: default_code(),
            methods: MethodSet::all(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn methods(mut self, methods: MethodSet) -> Self {
        self.methods = methods;
        self
    }

    /// Declaration for an error type: `RuntimeError` → `RUNTIME_ERROR`.
    #[must_use]
    pub fn of<E: ?Sized>() -> Self {
        Self::new(error_name_from_type(std::any::type_name::<E>()))
    }

    /// Declaration matching a caught exception.
    #[must_use]
    pub fn from_exception(exception: &Exception) -> Self {
        Self {
            name: exception.name.clone(),
            description: exception.message.clone(),
            code: exception.code,
            methods: MethodSet::all(),
        }
    }
}

impl From<&NasseError> for DeclaredError {
    fn from(err: &NasseError) -> Self {
        Self::new(err.error_name())
            .description(err.to_string())
            .code(err.code())
    }
}

impl From<&str> for DeclaredError {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DeclaredError {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl TryFrom<Value> for DeclaredError {
    type Error = NasseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(name) => Ok(Self::new(name)),
            Value::Object(_) => {
                serde_json::from_value(value).map_err(|e| NasseError::conversion("Error", e.to_string()))
            }
            other => Err(NasseError::conversion(
                "Error",
                format!("expected a name or a mapping, got {other}"),
            )),
        }
    }
}
