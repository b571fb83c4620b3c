use std::any::Any;
use std::fmt;

use crate::error::{HttpException, NasseError};
use crate::models::naming::error_name_from_type;

/// Message shown instead of internal error details outside debug mode.
pub const REDACTED_MESSAGE: &str = "An error occured on the server while processing your request";

/// Where an exception came from. Decides what is redacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionOrigin {
    /// Raised by the framework or built explicitly: always shown.
    Framework,
    /// A standard HTTP exception: 5xx messages are redacted.
    Http,
    /// Anything else: redacted unless in debug mode.
    Internal,
}

/// A request-time failure as the `(name, message, code)` triple that ends up
/// in the response envelope.
///
/// Any `std::error::Error` converts into it, so handlers can use `?` freely:
///
/// ```rust
/// use nasse::response::Exception;
///
/// fn parse(raw: &str) -> Result<i64, Exception> {
///     Ok(raw.parse::<i64>()?)
/// }
///
/// let err = parse("x").unwrap_err();
/// assert_eq!(err.name, "PARSE_INT_ERROR");
/// assert_eq!(err.code, 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    pub name: String,
    pub message: String,
    pub code: u16,
    pub origin: ExceptionOrigin,
    /// Short type name of the source error, shown in debug messages.
    pub type_name: Option<String>,
}

impl Exception {
    /// Explicit triple, never redacted.
    pub fn new(name: impl Into<String>, message: impl Into<String>, code: u16) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            code,
            origin: ExceptionOrigin::Framework,
            type_name: None,
        }
    }

    /// Opaque server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            name: "SERVER_ERROR".to_string(),
            message: message.into(),
            code: 500,
            origin: ExceptionOrigin::Internal,
            type_name: None,
        }
    }

    /// Message to show the client.
    #[must_use]
    pub fn display_message(&self, debug: bool) -> String {
        let redact = match self.origin {
            ExceptionOrigin::Framework => false,
            ExceptionOrigin::Http => self.code >= 500,
            ExceptionOrigin::Internal => true,
        };
        if debug {
            return match &self.type_name {
                Some(type_name) if self.origin != ExceptionOrigin::Framework => {
                    format!("{type_name}: {}", self.message)
                }
                _ => self.message.clone(),
            };
        }
        if redact {
            REDACTED_MESSAGE.to_string()
        } else {
            self.message.clone()
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.code, self.message)
    }
}

fn short_type_name<E: ?Sized>() -> String {
    let full = std::any::type_name::<E>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_string()
}

impl<E> From<E> for Exception
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        let any: &dyn Any = &err;
        if let Some(framework) = any.downcast_ref::<NasseError>() {
            return Self::new(framework.error_name(), framework.to_string(), framework.code());
        }
        if let Some(http) = any.downcast_ref::<HttpException>() {
            return Self {
                name: http.error_name(),
                message: http.to_string(),
                code: http.status.as_u16(),
                origin: ExceptionOrigin::Http,
                type_name: Some("HttpException".to_string()),
            };
        }
        Self {
            name: error_name_from_type(std::any::type_name::<E>()),
            message: err.to_string(),
            code: 500,
            origin: ExceptionOrigin::Internal,
            type_name: Some(short_type_name::<E>()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct RuntimeError(String);

    #[test]
    fn test_framework_errors_keep_their_triple() {
        let exc = Exception::from(NasseError::missing(crate::error::MissingKind::Parameter, "username"));
        assert_eq!(exc.name, "MISSING_PARAM");
        assert_eq!(exc.code, 400);
        assert!(exc.display_message(false).contains("username"));
    }

    #[test]
    fn test_internal_errors_are_redacted() {
        let exc = Exception::from(RuntimeError("secret".into()));
        assert_eq!(exc.name, "RUNTIME_ERROR");
        assert_eq!(exc.code, 500);
        assert_eq!(exc.display_message(false), REDACTED_MESSAGE);
        assert_eq!(exc.display_message(true), "RuntimeError: secret");
    }

    #[test]
    fn test_http_exceptions() {
        let teapot = Exception::from(HttpException::new(StatusCode::IM_A_TEAPOT).with_description("short"));
        assert_eq!(teapot.code, 418);
        assert_eq!(teapot.display_message(false), "short");

        let bad_gateway = Exception::from(HttpException::new(StatusCode::BAD_GATEWAY));
        assert_eq!(bad_gateway.name, "BAD_GATEWAY");
        assert_eq!(bad_gateway.display_message(false), REDACTED_MESSAGE);
    }

    #[test]
    fn test_question_mark_conversion() {
        fn parse(raw: &str) -> Result<i64, Exception> {
            Ok(raw.parse::<i64>()?)
        }
        let exc = parse("nope").unwrap_err();
        assert_eq!(exc.name, "PARSE_INT_ERROR");
    }
}
