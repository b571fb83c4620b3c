//! # Nasse
//!
//! **Nasse** is a declarative HTTP framework core: endpoints describe their
//! path, methods, inputs, outputs, errors and login rules, and the framework
//! validates requests, authenticates them, calls the handler and answers
//! with a uniform response envelope.
//!
//! ## Overview
//!
//! Nasse is transport-neutral. A server hands each request to
//! [`App::handle`](app::App::handle) as an
//! [`IncomingRequest`](request::IncomingRequest) and writes back the
//! [`OutgoingResponse`](response::OutgoingResponse). Everything in between is
//! synchronous and runs on the calling thread.
//!
//! ## Architecture
//!
//! - **[`router`]** - Path patterns with typed dynamic segments and
//!   most-specific-first matching
//! - **[`models`]** - The declaration model: endpoints, user-sent values,
//!   returns, errors, login rules
//! - **[`config`]** - Application configuration, CORS origin normalization
//! - **[`request`]** - Request context, input validation and sanitization
//! - **[`security`]** - Token lookup and the authentication gate
//! - **[`dispatcher`]** - Handler argument plans and panic recovery
//! - **[`response`]** - Handler outcomes, exceptions and the JSON/XML envelope
//! - **[`record`]** - Per-request timings, log buffer and call-stack recorder
//! - **[`middleware`]** - Before/after hooks, security and CORS headers
//! - **[`app`]** - The registry and the request pipeline
//! - **[`logging`]** - Structured logging bootstrap
//!
//! ### Request Processing Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant App
//!     participant Router
//!     participant Context as RequestContext
//!     participant Gate as security::authenticate
//!     participant Handler
//!     participant Normalizer as response::normalize
//!     participant Hooks as Middleware
//!
//!     Transport->>App: handle(IncomingRequest)
//!     App->>Router: resolve(path)
//!     Router-->>App: endpoint + typed captures
//!     App->>Context: new + validate
//!     Context-->>App: values / MISSING_* / VALIDATION_ERROR
//!     App->>Gate: authenticate(ctx)
//!     Gate-->>App: account / MISSING_TOKEN / AUTH_ERROR
//!     App->>Handler: invoke(ctx, account)
//!     Handler-->>App: Outcome
//!     App->>Normalizer: normalize(outcome)
//!     Normalizer-->>App: envelope {success, error, data, debug?}
//!     App->>Hooks: after(response)
//!     App-->>Transport: OutgoingResponse
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use nasse::prelude::*;
//! use serde_json::json;
//!
//! #[handler]
//! fn greet(params: &MultiMap) -> serde_json::Value {
//!     json!({ "hello": params.get_str("name").unwrap_or("world") })
//! }
//!
//! let mut app = App::new(Config::named("Demo"));
//! app.route(
//!     Endpoint::builder()
//!         .path("/greet")
//!         .methods(["GET"])
//!         .param(Parameter::new("name"))
//!         .handler(greet()),
//! )
//! .unwrap();
//!
//! let ok = app.handle(IncomingRequest::get("/greet?name=nasse"));
//! assert_eq!(ok.status, 200);
//!
//! let missing = app.handle(IncomingRequest::get("/greet"));
//! assert_eq!(missing.status, 400);
//! assert!(String::from_utf8(missing.body).unwrap().contains("MISSING_PARAM"));
//! ```
//!
//! ## Error Handling
//!
//! Framework failures are [`NasseError`] values with a stable error name and
//! status code. Handlers may return any `std::error::Error`; it is reported
//! as a `500` named after its type, with the message redacted outside debug
//! mode. Panics are caught and reported the same way.

// Lets the `#[handler]` expansion refer to `::nasse` from inside this crate.
extern crate self as nasse;

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod record;
pub mod request;
pub mod response;
pub mod router;
pub mod security;

pub use app::{App, Transport};
pub use config::Config;
pub use error::{HttpException, MissingKind, NasseError};
pub use nasse_macros::handler;

/// Common imports for declaring endpoints.
pub mod prelude {
    pub use crate::app::App;
    pub use crate::config::Config;
    pub use crate::dispatcher::Handler;
    pub use crate::error::{HttpException, NasseError};
    pub use crate::models::{
        Coercion, Cookie, DeclaredError, Dynamic, Endpoint, Header, Login, Parameter, Return,
    };
    pub use crate::request::{IncomingRequest, MultiMap, RequestContext};
    pub use crate::response::{Exception, Outcome, Response};
    pub use crate::security::{Account, AccountManagement};
    pub use nasse_macros::handler;
}
