use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};
use tracing::warn;

use super::cookie::ResponseCookie;
use super::exception::Exception;
use super::outcome::{FileLike, Item, Outcome, Payload, Response, ResponseError};
use super::outgoing::OutgoingResponse;
use crate::request::HeaderVec;

/// Data once files have been read.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Empty,
    Value(Value),
    Bytes(Vec<u8>),
    /// Content of a text file-like.
    FileText(String),
}

impl Resolved {
    /// Shape of `data` inside the envelope.
    #[must_use]
    pub fn envelope_data(&self) -> Value {
        match self {
            Resolved::Empty | Resolved::Value(Value::Null) => json!({}),
            Resolved::Value(Value::Object(map)) => Value::Object(map.clone()),
            Resolved::Value(Value::String(s)) => json!({ "message": s }),
            Resolved::Value(Value::Array(items)) => json!({ "array": items }),
            Resolved::Value(other) => {
                warn!(data = %other, "Response data is not a mapping, a string or an array, stringifying it");
                json!({ "message": other.to_string() })
            }
            Resolved::Bytes(bytes) => json!({ "base64": BASE64.encode(bytes) }),
            Resolved::FileText(content) => json!({ "content": content }),
        }
    }

    /// Body and default content type when no envelope is used.
    #[must_use]
    pub fn into_raw(self) -> (Vec<u8>, &'static str) {
        match self {
            Resolved::Empty => (Vec::new(), "text/plain; charset=utf-8"),
            Resolved::Value(Value::String(s)) | Resolved::FileText(s) => {
                (s.into_bytes(), "text/plain; charset=utf-8")
            }
            Resolved::Value(other) => (other.to_string().into_bytes(), "application/json"),
            Resolved::Bytes(bytes) => (bytes, "application/octet-stream"),
        }
    }
}

/// A normalized handler result, before rendering.
#[derive(Debug)]
pub struct Normalized {
    pub code: u16,
    pub message: Option<String>,
    pub error: Option<String>,
    pub data: Resolved,
    pub headers: HeaderVec,
    pub cookies: Vec<ResponseCookie>,
    pub content_type: Option<String>,
}

impl Default for Normalized {
    fn default() -> Self {
        Self {
            code: 200,
            message: None,
            error: None,
            data: Resolved::Empty,
            headers: HeaderVec::new(),
            cookies: Vec::new(),
            content_type: None,
        }
    }
}

impl Normalized {
    /// Normalized form of an exception.
    #[must_use]
    pub fn from_exception(exception: &Exception, debug: bool) -> Self {
        let mut normalized = Self::default();
        normalized.apply_exception(exception, debug);
        normalized
    }

    fn apply_exception(&mut self, exception: &Exception, debug: bool) {
        self.code = exception.code;
        self.error = Some(exception.name.clone());
        self.message = Some(exception.display_message(debug));
    }

    fn apply_payload(&mut self, payload: Payload, debug: bool) {
        match resolve(payload) {
            Ok(resolved) => self.data = resolved,
            Err(exception) => self.apply_exception(&exception, debug),
        }
    }
}

/// Outcome of normalization.
#[derive(Debug)]
pub enum Prepared {
    /// Handed to the transport as is.
    Raw(OutgoingResponse),
    Normalized(Normalized),
}

fn read_file(mut file: FileLike) -> Result<Resolved, Exception> {
    let content = file.read_preserving()?;
    if file.is_binary() {
        return Ok(Resolved::Bytes(content));
    }
    match String::from_utf8(content) {
        Ok(text) => Ok(Resolved::FileText(text)),
        Err(err) => Ok(Resolved::FileText(
            String::from_utf8_lossy(err.as_bytes()).into_owned(),
        )),
    }
}

fn resolve(payload: Payload) -> Result<Resolved, Exception> {
    match payload {
        Payload::Empty => Ok(Resolved::Empty),
        Payload::Value(value) => Ok(Resolved::Value(value)),
        Payload::Bytes(bytes) => Ok(Resolved::Bytes(bytes)),
        Payload::File(file) => read_file(file),
    }
}

fn from_response(response: Response, debug: bool) -> Normalized {
    let mut normalized = Normalized {
        code: response.code,
        message: response.message,
        headers: response.headers,
        cookies: response.cookies,
        content_type: response.content_type,
        ..Normalized::default()
    };
    normalized.apply_payload(response.data, debug);
    match response.error {
        None => {}
        Some(ResponseError::Name(name)) => normalized.error = Some(name),
        Some(ResponseError::Exception(exception)) => {
            normalized.code = exception.code;
            normalized.error = Some(exception.name.clone());
            if normalized.message.is_none() {
                normalized.message = Some(exception.display_message(debug));
            }
        }
    }
    normalized
}

/// Convert any handler outcome into its normalized form.
#[must_use]
pub fn normalize(outcome: Outcome, debug: bool) -> Prepared {
    let normalized = match outcome {
        Outcome::Raw(response) => return Prepared::Raw(response),
        Outcome::Envelope(response) => from_response(response, debug),
        Outcome::Text(text) => Normalized {
            data: Resolved::Value(Value::String(text)),
            ..Normalized::default()
        },
        Outcome::Bytes(bytes) => Normalized {
            data: Resolved::Bytes(bytes),
            ..Normalized::default()
        },
        Outcome::File(file) => {
            let mut normalized = Normalized::default();
            normalized.apply_payload(Payload::File(file), debug);
            normalized
        }
        Outcome::Exception(exception) => Normalized::from_exception(&exception, debug),
        Outcome::Iterable(items) => {
            let mut normalized = Normalized::default();
            for item in items {
                match item {
                    Item::Code(code) => normalized.code = code,
                    Item::Exception(exception) => normalized.apply_exception(&exception, debug),
                    Item::Data(payload) => normalized.apply_payload(payload, debug),
                }
            }
            normalized
        }
        Outcome::Mapping(map) => match Response::from_mapping(&map) {
            Some(response) => from_response(response, debug),
            None => Normalized {
                data: Resolved::Value(Value::Object(map)),
                ..Normalized::default()
            },
        },
    };
    if !(100..600).contains(&normalized.code) {
        warn!(code = normalized.code, "Response status code is outside [100, 600)");
    }
    Prepared::Normalized(normalized)
}
