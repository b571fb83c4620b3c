use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;

use crate::error::NasseError;

/// Per-method authentication policy.
///
/// The gate only runs when `!no_login && required` and the endpoint's login
/// mapping resolves for the request method.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Login {
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub verification_only: bool,
    #[serde(default)]
    pub no_login: bool,
    /// Allowed account types; empty means any account.
    #[serde(default)]
    pub types: BTreeSet<String>,
}

fn default_required() -> bool {
    true
}

impl Default for Login {
    fn default() -> Self {
        Self {
            required: true,
            verification_only: false,
            no_login: false,
            types: BTreeSet::new(),
        }
    }
}

impl Login {
    #[must_use]
    pub fn required() -> Self {
        Self::default()
    }

    /// Token must be present and verified, no account is loaded.
    #[must_use]
    pub fn verification_only() -> Self {
        Self {
            verification_only: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn no_login() -> Self {
        Self {
            required: false,
            no_login: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Restrict to the given account types.
    #[must_use]
    pub fn types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the gate must run.
    #[must_use]
    pub fn enforced(&self) -> bool {
        !self.no_login && self.required
    }
}

impl From<&str> for Login {
    /// A single string is read as the one allowed account type.
    fn from(account_type: &str) -> Self {
        Self::default().types([account_type])
    }
}

impl From<bool> for Login {
    fn from(required: bool) -> Self {
        Self {
            required,
            ..Self::default()
        }
    }
}

impl TryFrom<Value> for Login {
    type Error = NasseError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Self::from(s.as_str())),
            Value::Bool(b) => Ok(Self::from(b)),
            Value::Object(_) => {
                serde_json::from_value(value).map_err(|e| NasseError::conversion("Login", e.to_string()))
            }
            other => Err(NasseError::conversion(
                "Login",
                format!("expected an account type, a flag or a mapping, got {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enforcement() {
        assert!(Login::required().enforced());
        assert!(Login::verification_only().enforced());
        assert!(!Login::no_login().enforced());
        assert!(!Login::required().optional().enforced());
    }

    #[test]
    fn test_shapes() {
        let login = Login::try_from(json!({"types": ["admin"]})).unwrap();
        assert!(login.required);
        assert!(login.types.contains("admin"));
        assert_eq!(Login::try_from(json!("admin")).unwrap(), login);
        assert!(Login::try_from(json!(3)).is_err());
    }
}
