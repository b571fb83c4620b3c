//! # Request Module
//!
//! Transport-neutral requests and the per-request context.
//!
//! [`IncomingRequest`] is what a transport hands over. [`RequestContext`] is
//! built from it once an endpoint has matched: it snapshots the method, the
//! client IP (honoring the first `X-Forwarded-For` entry when it is a dotted
//! IPv4), query and form values, headers, cookies and the typed path
//! captures. With sanitization on, every user-sent string goes through a
//! strict HTML sanitizer first.
//!
//! [`RequestContext::validate`] then enforces the endpoint's declarations: a
//! required value that applies to the request method must be present, and a
//! value declaring a type is coerced in place.

mod context;
mod incoming;
mod multimap;
mod sanitize;

pub(crate) use context::client_ip;
pub use context::RequestContext;
pub use incoming::{HeaderVec, IncomingRequest, MAX_INLINE_HEADERS};
pub use multimap::MultiMap;
pub use sanitize::sanitize;
