//! # Router Module
//!
//! Path parsing and matching for endpoint routes.
//!
//! ## Overview
//!
//! Patterns are slash-separated segments. A segment is either a literal or a
//! dynamic capture written `<name>` (string) or `<type:name>`. The built-in
//! capture types are `str`, `int` and `float`; more can be registered with
//! [`Router::register_converter`]. Unknown types fall back to `str`.
//!
//! Resolution:
//!
//! 1. Split the request path on `/` after trimming leading/trailing slashes.
//! 2. Patterns with a different segment count do not match.
//! 3. Literals must match byte-for-byte; dynamic segments are coerced to their
//!    declared type (a rejected coercion is a `VALIDATION_ERROR`).
//! 4. The matching pattern with the fewest dynamic segments wins; ties go to
//!    registration order.
//!
//! ## Example
//!
//! ```rust
//! use nasse::router::{PathPattern, Router};
//!
//! let mut router = Router::new();
//! router.insert(PathPattern::parse("/pages/<int:page>").unwrap(), "pages");
//! router.insert(PathPattern::parse("/pages/latest").unwrap(), "latest");
//!
//! let m = router.resolve("/pages/42").unwrap();
//! assert_eq!(*m.value, "pages");
//! assert_eq!(m.captures["page"], 42);
//!
//! assert_eq!(*router.resolve("/pages/latest").unwrap().value, "latest");
//! ```

mod core;
mod pattern;
#[cfg(test)]
mod tests;

pub use core::{Captures, RouteMatch, Router};
pub use pattern::{Converter, Converters, PathPattern, Segment, TransportStyle, STR_TYPE};
