use tracing::debug;

use super::core::{AfterRequest, Middleware};
use crate::config::{normalize_origin, Config, WILDCARD_ORIGIN};
use crate::response::{Exception, OutgoingResponse};

pub const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains; preload";

/// Preflight cache lifetime outside debug mode, in seconds.
pub const PREFLIGHT_MAX_AGE: u32 = 86_400;

/// Allowed CORS origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginValidation {
    /// Any origin; the request origin is mirrored back.
    Wildcard,
    /// Normalized `scheme://host[:port]` origins.
    Exact(Vec<String>),
}

impl OriginValidation {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        if config.cors_wildcard() {
            OriginValidation::Wildcard
        } else {
            OriginValidation::Exact(config.cors.clone())
        }
    }

    /// `Access-Control-Allow-Origin` value for a request origin.
    ///
    /// An origin of the allow-list is echoed back; any other gets the first
    /// allowed origin. `None` when nothing is allowed.
    #[must_use]
    pub fn allow_origin(&self, origin: Option<&str>) -> Option<String> {
        match self {
            OriginValidation::Wildcard => {
                Some(origin.unwrap_or(WILDCARD_ORIGIN).to_string())
            }
            OriginValidation::Exact(origins) => {
                let requested = origin.map(|o| normalize_origin(o).unwrap_or_else(|_| o.to_string()));
                match requested {
                    Some(requested) if origins.contains(&requested) => Some(requested),
                    _ => origins.first().cloned(),
                }
            }
        }
    }

    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, OriginValidation::Wildcard)
    }
}

/// The after-request hook every application starts with: HSTS, preflight
/// method listing and CORS origin headers.
///
/// Headers are replaced, never appended, so running it twice yields the same
/// response.
#[derive(Debug, Clone)]
pub struct DefaultHeaders {
    origins: OriginValidation,
}

impl DefaultHeaders {
    #[must_use]
    pub fn new(origins: OriginValidation) -> Self {
        Self { origins }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(OriginValidation::from_config(config))
    }

    #[must_use]
    pub fn origins(&self) -> &OriginValidation {
        &self.origins
    }
}

impl Middleware for DefaultHeaders {
    fn after(&self, req: &AfterRequest<'_>, res: &mut OutgoingResponse) -> Result<(), Exception> {
        res.set_header(
            "strict-transport-security",
            STRICT_TRANSPORT_SECURITY.to_string(),
        );

        if *req.method == http::Method::OPTIONS {
            if let Some(endpoint) = req.endpoint {
                let methods = endpoint
                    .methods
                    .expand()
                    .iter()
                    .map(http::Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                res.set_header("access-control-allow-methods", methods);
            }
            if !req.debug {
                res.set_header("access-control-max-age", PREFLIGHT_MAX_AGE.to_string());
            }
        }

        match self.origins.allow_origin(req.origin) {
            Some(allowed) => {
                res.set_header("access-control-allow-origin", allowed);
                if self.origins.is_wildcard() {
                    res.set_header("vary", "Origin".to_string());
                }
            }
            None => debug!(origin = ?req.origin, "CORS: no origin allowed"),
        }
        Ok(())
    }
}
