use std::net::IpAddr;
use std::sync::Arc;

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage shared by incoming and outgoing messages.
///
/// Names are `Arc<str>` since the same few names repeat on every request.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// A request as handed over by the transport.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: String,
    pub headers: HeaderVec,
    pub body: Vec<u8>,
    /// Address of the transport peer.
    pub peer: Option<IpAddr>,
}

impl IncomingRequest {
    /// `target` is a request target such as `/hello?name=world`.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self {
            method,
            path: path.to_string(),
            query: query.to_string(),
            headers: HeaderVec::new(),
            body: Vec::new(),
            peer: None,
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// JSON body with a matching content type.
    #[must_use]
    pub fn json_body(self, body: &Value) -> Self {
        self.header("content-type", "application/json")
            .body(body.to_string())
    }

    /// `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn form_body<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.header("content-type", "application/x-www-form-urlencoded")
            .body(encoded)
    }

    #[must_use]
    pub fn peer(mut self, peer: IpAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// First header with that name, case-insensitively.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decoded query pairs, in order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Form values from an urlencoded body, or the top-level keys of a JSON
    /// object body. Other bodies carry no form values.
    #[must_use]
    pub fn form_pairs(&self) -> Vec<(String, Value)> {
        if self.body.is_empty() {
            return Vec::new();
        }
        let content_type = self
            .get_header("content-type")
            .map(|ct| ct.to_ascii_lowercase())
            .unwrap_or_default();
        if content_type.starts_with("application/x-www-form-urlencoded") {
            return url::form_urlencoded::parse(&self.body)
                .into_owned()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
        }
        if content_type.starts_with("application/json") {
            if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&self.body) {
                return map.into_iter().collect();
            }
        }
        Vec::new()
    }

    /// Cookies from every `Cookie` header.
    #[must_use]
    pub fn cookies(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
            .flat_map(|(_, v)| v.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                let value = value.trim().trim_matches('"');
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Convert a transport request built with the `http` crate.
    pub fn from_http(req: http::Request<Vec<u8>>, peer: Option<IpAddr>) -> Self {
        let (parts, body) = req.into_parts();
        let mut headers = HeaderVec::new();
        for (name, value) in &parts.headers {
            if let Ok(value) = value.to_str() {
                headers.push((Arc::from(name.as_str()), value.to_string()));
            }
        }
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().unwrap_or_default().to_string(),
            headers,
            body,
            peer,
        }
    }
}
