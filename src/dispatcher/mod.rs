//! # Dispatcher Module
//!
//! Binds handlers to the request context.
//!
//! ## Overview
//!
//! A handler declares which context slots it needs by name, out of a closed
//! set: `app`, `endpoint`, `request`, `method`, `values`, `params`, `args`,
//! `form`, `headers` and `account`. The names are turned into a [`Plan`] once,
//! at registration; at request time the handler receives [`Arguments`] whose
//! accessors only succeed for planned slots. Unknown names are simply left
//! out.
//!
//! Handlers are usually declared with the `#[handler]` attribute, which reads
//! the function's parameter names at compile time:
//!
//! ```rust
//! use nasse::handler;
//! use nasse::request::MultiMap;
//! use serde_json::json;
//!
//! #[handler]
//! fn greet(params: &MultiMap) -> serde_json::Value {
//!     json!({ "hello": params.get_str("name").unwrap_or("world") })
//! }
//!
//! let h = greet();
//! assert_eq!(h.name(), Some("greet"));
//! ```
//!
//! ## Error Handling
//!
//! A handler panic is caught, logged with the request id, and converted into
//! a `500 SERVER_ERROR` whose message is redacted outside debug mode.

mod handler;
mod plan;

pub use handler::{Arguments, Handler, HandlerLocation};
pub use plan::{Plan, Slot};
