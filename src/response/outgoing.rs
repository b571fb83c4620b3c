use std::sync::Arc;

use http::{HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

use crate::request::HeaderVec;

/// A response ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingResponse {
    /// Status code, forwarded as-is even outside `[100, 600)`.
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
}

impl OutgoingResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body: body.into(),
        }
    }

    /// Serialized JSON body with its content type.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut response = Self::new(status, body.to_string());
        response.set_header("content-type", "application/json".to_string());
        response
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut response = Self::new(status, body.into());
        response.set_header("content-type", "text/plain; charset=utf-8".to_string());
        response
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a repeated header (`Set-Cookie`).
    pub fn get_all_headers<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Add a header, keeping existing values.
    pub fn append_header(&mut self, name: &str, value: String) {
        self.headers.push((Arc::from(name), value));
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
    }

    /// Convert into an `http` crate response for transports built on it.
    pub fn into_http(self) -> Result<http::Response<Vec<u8>>, http::Error> {
        let mut builder = http::Response::builder().status(StatusCode::from_u16(self.status)?);
        for (name, value) in &self.headers {
            builder = builder.header(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }
        builder.body(self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_header_replaces() {
        let mut res = OutgoingResponse::json(200, &json!({}));
        res.set_header("Vary", "Origin".into());
        res.set_header("vary", "Origin".into());
        assert_eq!(res.get_all_headers("VARY").count(), 1);
        res.append_header("set-cookie", "a=1".into());
        res.append_header("set-cookie", "b=2".into());
        assert_eq!(res.get_all_headers("Set-Cookie").count(), 2);
    }

    #[test]
    fn test_into_http() {
        let res = OutgoingResponse::text(201, "made").into_http().unwrap();
        assert_eq!(res.status(), 201);
        assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(res.body(), b"made");
        assert!(OutgoingResponse::new(42, "").into_http().is_err());
    }
}
