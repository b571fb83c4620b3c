//! # Response Module
//!
//! Turns whatever a handler returned into a uniform response.
//!
//! ## Pipeline
//!
//! 1. The handler result is an [`Outcome`], a tagged sum of every accepted
//!    shape: a raw transport response, explicit [`Response`] fields, text,
//!    bytes, a [`FileLike`], an [`Exception`], an iterable or a mapping.
//! 2. [`normalize`] matches on the tag and produces a [`Normalized`] result
//!    (code, message, error name, data, headers, cookies). Raw responses skip
//!    everything.
//! 3. [`render`] wraps it in the [`Envelope`]
//!    `{success, message?, error, data, debug?}` as JSON or XML, or sends the
//!    data as is for endpoints that opted out of the envelope.
//!
//! ## Data shapes inside the envelope
//!
//! | Data | Envelope `data` |
//! |---|---|
//! | mapping | the mapping |
//! | string | `{"message": s}` |
//! | array | `{"array": [...]}` |
//! | bytes / binary file | `{"base64": b64}` |
//! | text file | `{"content": text}` |
//!
//! ## Exceptions
//!
//! Framework errors keep their name, message and code. Standard HTTP
//! exceptions keep their code and have 5xx messages redacted outside debug
//! mode. Anything else is a 500 named after its type (`RuntimeError` →
//! `RUNTIME_ERROR`) with a redacted message unless in debug mode.

mod cookie;
mod envelope;
mod exception;
mod normalize;
mod outcome;
mod outgoing;
pub mod xml;

pub use cookie::{ResponseCookie, SameSite, DEFAULT_COOKIE_MAX_SIZE};
pub use envelope::{render, Envelope, Format, FormatHints, JSON_CONTENT_TYPE, XML_CONTENT_TYPE};
pub use exception::{Exception, ExceptionOrigin, REDACTED_MESSAGE};
pub use normalize::{normalize, Normalized, Prepared, Resolved};
pub use outcome::{FileLike, Item, Outcome, Payload, ReadSeek, Response, ResponseError, RESPONSE_FIELDS};
pub use outgoing::OutgoingResponse;
