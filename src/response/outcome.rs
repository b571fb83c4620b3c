use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::cookie::ResponseCookie;
use super::exception::Exception;
use super::outgoing::OutgoingResponse;
use crate::request::HeaderVec;

/// Something readable and seekable a handler can return.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// A file-like payload. Binary content is base64-encoded in the envelope,
/// text content is embedded as is.
pub struct FileLike {
    reader: Box<dyn ReadSeek>,
    binary: bool,
}

impl FileLike {
    pub fn binary<R: ReadSeek + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
            binary: true,
        }
    }

    pub fn text<R: ReadSeek + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
            binary: false,
        }
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.binary
    }

    /// Read from the current position to the end, then seek back so the
    /// cursor is where it was.
    pub fn read_preserving(&mut self) -> io::Result<Vec<u8>> {
        let position = self.reader.stream_position()?;
        let mut content = Vec::new();
        let read = self.reader.read_to_end(&mut content);
        self.reader.seek(SeekFrom::Start(position))?;
        read.map(|_| content)
    }
}

impl fmt::Debug for FileLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLike")
            .field("binary", &self.binary)
            .finish_non_exhaustive()
    }
}

/// The `data` part of a [`Response`].
#[derive(Debug, Default)]
pub enum Payload {
    #[default]
    Empty,
    Value(Value),
    Bytes(Vec<u8>),
    File(FileLike),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Value(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Value(Value::String(value))
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(value)
    }
}

impl From<FileLike> for Payload {
    fn from(value: FileLike) -> Self {
        Payload::File(value)
    }
}

/// The `error` part of a [`Response`]: a bare name, or an exception that
/// also contributes its message and code.
#[derive(Debug, Clone)]
pub enum ResponseError {
    Name(String),
    Exception(Exception),
}

/// Explicit response fields.
///
/// ```rust
/// use nasse::response::Response;
/// use serde_json::json;
///
/// let created = Response::new(json!({"id": 3})).code(201).header("Location", "/items/3");
/// assert_eq!(created.code, 201);
/// ```
#[derive(Debug)]
pub struct Response {
    pub data: Payload,
    pub code: u16,
    pub error: Option<ResponseError>,
    pub message: Option<String>,
    pub headers: HeaderVec,
    pub cookies: Vec<ResponseCookie>,
    pub content_type: Option<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            data: Payload::Empty,
            code: 200,
            error: None,
            message: None,
            headers: HeaderVec::new(),
            cookies: Vec::new(),
            content_type: None,
        }
    }
}

/// Keys a mapping must limit itself to for it to be read as a [`Response`].
pub const RESPONSE_FIELDS: [&str; 7] = [
    "data",
    "code",
    "error",
    "message",
    "headers",
    "cookies",
    "content_type",
];

impl Response {
    pub fn new(data: impl Into<Payload>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn error(mut self, name: impl Into<String>) -> Self {
        self.error = Some(ResponseError::Name(name.into()));
        self
    }

    #[must_use]
    pub fn exception(mut self, exception: Exception) -> Self {
        self.error = Some(ResponseError::Exception(exception));
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn cookie(mut self, cookie: ResponseCookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Read a mapping as response fields. `None` when a key is not a response
    /// field or a field has the wrong shape; the mapping is then plain data.
    #[must_use]
    pub fn from_mapping(map: &Map<String, Value>) -> Option<Self> {
        if map.is_empty() || !map.keys().all(|k| RESPONSE_FIELDS.contains(&k.as_str())) {
            return None;
        }
        let mut response = Response::default();
        for (key, value) in map {
            match (key.as_str(), value) {
                ("data", v) => response.data = Payload::Value(v.clone()),
                ("code", v) => response.code = u16::try_from(v.as_u64()?).ok()?,
                ("error", Value::String(s)) => response.error = Some(ResponseError::Name(s.clone())),
                ("error", Value::Null) => response.error = None,
                ("message", Value::String(s)) => response.message = Some(s.clone()),
                ("message", Value::Null) => response.message = None,
                ("headers", Value::Object(headers)) => {
                    for (name, value) in headers {
                        let value = match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        response.headers.push((Arc::from(name.as_str()), value));
                    }
                }
                ("cookies", Value::Object(cookies)) => {
                    for (name, value) in cookies {
                        let value = match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        response.cookies.push(ResponseCookie::new(name.clone(), value));
                    }
                }
                ("cookies", Value::Array(cookies)) => {
                    for cookie in cookies {
                        response
                            .cookies
                            .push(serde_json::from_value(cookie.clone()).ok()?);
                    }
                }
                ("content_type", Value::String(s)) => response.content_type = Some(s.clone()),
                _ => return None,
            }
        }
        Some(response)
    }
}

/// One element of an iterable outcome.
#[derive(Debug)]
pub enum Item {
    Code(u16),
    Exception(Exception),
    Data(Payload),
}

impl From<u16> for Item {
    fn from(code: u16) -> Self {
        Item::Code(code)
    }
}

impl From<Exception> for Item {
    fn from(exception: Exception) -> Self {
        Item::Exception(exception)
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Item::Data(Payload::Value(value))
    }
}

/// Everything a handler may return.
///
/// Handlers return anything that converts into an `Outcome`: strings, bytes,
/// JSON values, a [`Response`], an [`Exception`], a `(data, code)` tuple or a
/// `Result` of those.
#[derive(Debug)]
pub enum Outcome {
    /// Passed through to the transport untouched.
    Raw(OutgoingResponse),
    Envelope(Response),
    Text(String),
    Bytes(Vec<u8>),
    File(FileLike),
    Exception(Exception),
    /// Integers set the code, exceptions the error, anything else the data.
    Iterable(Vec<Item>),
    /// Read as a [`Response`] when its keys are response fields, otherwise
    /// as data.
    Mapping(Map<String, Value>),
}

impl From<OutgoingResponse> for Outcome {
    fn from(value: OutgoingResponse) -> Self {
        Outcome::Raw(value)
    }
}

impl From<Response> for Outcome {
    fn from(value: Response) -> Self {
        Outcome::Envelope(value)
    }
}

impl From<String> for Outcome {
    fn from(value: String) -> Self {
        Outcome::Text(value)
    }
}

impl From<&str> for Outcome {
    fn from(value: &str) -> Self {
        Outcome::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Outcome {
    fn from(value: Vec<u8>) -> Self {
        Outcome::Bytes(value)
    }
}

impl From<&[u8]> for Outcome {
    fn from(value: &[u8]) -> Self {
        Outcome::Bytes(value.to_vec())
    }
}

impl From<FileLike> for Outcome {
    fn from(value: FileLike) -> Self {
        Outcome::File(value)
    }
}

impl From<Exception> for Outcome {
    fn from(value: Exception) -> Self {
        Outcome::Exception(value)
    }
}

impl From<Vec<Item>> for Outcome {
    fn from(value: Vec<Item>) -> Self {
        Outcome::Iterable(value)
    }
}

impl From<Map<String, Value>> for Outcome {
    fn from(value: Map<String, Value>) -> Self {
        Outcome::Mapping(value)
    }
}

impl From<Value> for Outcome {
    /// Objects are mappings, strings are text; any other value is data.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Outcome::Mapping(map),
            Value::String(s) => Outcome::Text(s),
            other => Outcome::Envelope(Response::new(other)),
        }
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::Envelope(Response::default())
    }
}

impl<T: Into<Payload>> From<(T, u16)> for Outcome {
    fn from((data, code): (T, u16)) -> Self {
        Outcome::Iterable(vec![Item::Data(data.into()), Item::Code(code)])
    }
}

impl<T, E> From<Result<T, E>> for Outcome
where
    T: Into<Outcome>,
    E: Into<Exception>,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(err) => Outcome::Exception(err.into()),
        }
    }
}
