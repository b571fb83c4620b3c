//! # Error Module
//!
//! Framework error taxonomy. Every failure the engine raises itself is a
//! [`NasseError`]; each variant knows its HTTP status code and the stable
//! upper-snake error name that ends up in the `error` field of the response
//! envelope.
//!
//! | Kind | Code |
//! |---|---|
//! | `SERVER_ERROR` / `MISSING_CONTEXT` / `CONVERSION_ERROR` | 500 |
//! | `METHOD_NOT_ALLOWED` | 405 |
//! | `NOT_FOUND` | 404 |
//! | `PAYLOAD_TOO_LARGE` | 413 |
//! | `AUTH_ERROR` / `MISSING_TOKEN` | 403 |
//! | `CLIENT_ERROR` / `MISSING_*` / `VALIDATION_ERROR` | 400 |
//!
//! Handler code usually does not build these directly: it returns any
//! `std::error::Error` and lets [`crate::response::Exception`] derive the
//! triple, or returns an [`HttpException`] to pick a standard status.

use http::StatusCode;
use std::fmt;

/// Which kind of user-sent value was missing from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingKind {
    Parameter,
    Header,
    Cookie,
    Dynamic,
    Value,
}

impl MissingKind {
    /// Error name used in the response envelope.
    #[must_use]
    pub fn error_name(self) -> &'static str {
        match self {
            MissingKind::Parameter => "MISSING_PARAM",
            MissingKind::Header => "MISSING_HEADER",
            MissingKind::Cookie => "MISSING_COOKIE",
            MissingKind::Dynamic => "MISSING_DYNAMIC",
            MissingKind::Value => "MISSING_VALUE",
        }
    }
}

impl fmt::Display for MissingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MissingKind::Parameter => "parameter",
            MissingKind::Header => "header",
            MissingKind::Cookie => "cookie",
            MissingKind::Dynamic => "dynamic path segment",
            MissingKind::Value => "value",
        };
        f.write_str(s)
    }
}

/// Errors raised by the framework itself.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NasseError {
    /// A declaration could not be converted into its target type (startup-time).
    #[error("Could not convert the given value into a {target}: {reason}")]
    Conversion {
        target: &'static str,
        reason: String,
    },

    /// A required user-sent value is absent.
    #[error("The {kind} '{name}' is missing from your request")]
    MissingValue { kind: MissingKind, name: String },

    /// No authentication token was found on a request that needs one.
    #[error("An authentication token is required to access this endpoint")]
    MissingToken,

    /// The token was rejected, or the account type is not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// A user-sent string could not be coerced into its declared type.
    #[error("The value '{name}' could not be validated: {reason}")]
    Validation { name: String, reason: String },

    /// A request-scoped API was used outside of a request.
    #[error("No request context is available for '{0}'")]
    MissingContext(String),

    #[error("The method {method} is not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error("Nothing was found at {path}")]
    NotFound { path: String },

    #[error("The request body exceeds the limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    /// Generic client-side error.
    #[error("{0}")]
    Client(String),

    /// Generic server-side error.
    #[error("{0}")]
    Server(String),
}

impl NasseError {
    /// HTTP status code associated with the error.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            NasseError::Conversion { .. } | NasseError::MissingContext(_) | NasseError::Server(_) => 500,
            NasseError::MethodNotAllowed { .. } => 405,
            NasseError::NotFound { .. } => 404,
            NasseError::PayloadTooLarge { .. } => 413,
            NasseError::MissingToken | NasseError::Forbidden(_) => 403,
            NasseError::MissingValue { .. } | NasseError::Validation { .. } | NasseError::Client(_) => 400,
        }
    }

    /// Stable upper-snake error name.
    #[must_use]
    pub fn error_name(&self) -> &'static str {
        match self {
            NasseError::Conversion { .. } => "CONVERSION_ERROR",
            NasseError::MissingValue { kind, .. } => kind.error_name(),
            NasseError::MissingToken => "MISSING_TOKEN",
            NasseError::Forbidden(_) => "AUTH_ERROR",
            NasseError::Validation { .. } => "VALIDATION_ERROR",
            NasseError::MissingContext(_) => "MISSING_CONTEXT",
            NasseError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            NasseError::NotFound { .. } => "NOT_FOUND",
            NasseError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            NasseError::Client(_) => "CLIENT_ERROR",
            NasseError::Server(_) => "SERVER_ERROR",
        }
    }

    /// Shorthand for a [`NasseError::Conversion`].
    pub fn conversion(target: &'static str, reason: impl Into<String>) -> Self {
        NasseError::Conversion {
            target,
            reason: reason.into(),
        }
    }

    pub fn missing(kind: MissingKind, name: impl Into<String>) -> Self {
        NasseError::MissingValue {
            kind,
            name: name.into(),
        }
    }
}

/// A standard HTTP error with a preserved status code.
///
/// Its envelope name is the upper-snake form of the canonical reason phrase
/// (`404` → `NOT_FOUND`). For 5xx statuses the description is redacted outside
/// debug mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpException {
    pub status: StatusCode,
    pub description: Option<String>,
}

impl HttpException {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// `NOT_FOUND`, `METHOD_NOT_ALLOWED`, `IM_A_TEAPOT`...
    #[must_use]
    pub fn error_name(&self) -> String {
        let reason = self.status.canonical_reason().unwrap_or("Http Error");
        let mut name = String::with_capacity(reason.len());
        for c in reason.chars() {
            if c.is_ascii_alphanumeric() {
                name.push(c.to_ascii_uppercase());
            } else if !name.ends_with('_') && !name.is_empty() {
                name.push('_');
            }
        }
        name.trim_end_matches('_').to_string()
    }
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(d) => f.write_str(d),
            None => f.write_str(self.status.canonical_reason().unwrap_or("HTTP error")),
        }
    }
}

impl std::error::Error for HttpException {}
