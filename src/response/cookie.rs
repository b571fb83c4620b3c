use std::fmt;
use std::time::SystemTime;

use serde::Deserialize;
use tracing::warn;

/// Browsers reject cookies past roughly this size.
pub const DEFAULT_COOKIE_MAX_SIZE: usize = 4093;

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// A cookie to set on the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseCookie {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub max_age: Option<u64>,
    #[serde(skip)]
    pub expires: Option<SystemTime>,
    #[serde(default = "default_path")]
    pub path: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: Option<SameSite>,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

fn default_path() -> Option<String> {
    Some("/".to_string())
}

fn default_charset() -> String {
    "utf-8".to_string()
}

fn default_max_size() -> usize {
    DEFAULT_COOKIE_MAX_SIZE
}

/// RFC 6265 `cookie-octet`.
fn is_cookie_octet(c: char) -> bool {
    matches!(c, '\x21' | '\x23'..='\x2B' | '\x2D'..='\x3A' | '\x3C'..='\x5B' | '\x5D'..='\x7E')
}

impl ResponseCookie {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            max_age: None,
            expires: None,
            path: default_path(),
            domain: None,
            secure: false,
            http_only: false,
            same_site: None,
            charset: default_charset(),
            max_size: DEFAULT_COOKIE_MAX_SIZE,
        }
    }

    #[must_use]
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn expires(mut self, at: SystemTime) -> Self {
        self.expires = Some(at);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    fn quoted_value(&self) -> String {
        if self.value.chars().all(is_cookie_octet) {
            return self.value.clone();
        }
        let escaped = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    }

    /// `Set-Cookie` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut parts = vec![format!("{}={}", self.key, self.quoted_value())];
        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={max_age}"));
        }
        if let Some(expires) = self.expires {
            parts.push(format!("Expires={}", httpdate::fmt_http_date(expires)));
        }
        if let Some(path) = &self.path {
            parts.push(format!("Path={path}"));
        }
        if let Some(domain) = &self.domain {
            parts.push(format!("Domain={domain}"));
        }
        if self.secure {
            parts.push("Secure".to_string());
        }
        if self.http_only {
            parts.push("HttpOnly".to_string());
        }
        if let Some(same_site) = self.same_site {
            parts.push(format!("SameSite={same_site}"));
        }
        let header = parts.join("; ");
        if header.len() > self.max_size {
            warn!(
                cookie = %self.key,
                size = header.len(),
                max_size = self.max_size,
                "Cookie is larger than the maximum size and may be ignored by browsers"
            );
        }
        header
    }
}
