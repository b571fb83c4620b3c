//! # Middleware Module
//!
//! Before/after request hooks.
//!
//! Applications register [`Middleware`] values on the [`App`](crate::app::App);
//! they run in registration order around every request. Every application
//! starts with [`DefaultHeaders`], which sets:
//!
//! - `Strict-Transport-Security: max-age=31536000; includeSubDomains; preload`
//! - on `OPTIONS`, `Access-Control-Allow-Methods` with the endpoint methods,
//!   plus `Access-Control-Max-Age: 86400` outside debug mode
//! - `Access-Control-Allow-Origin` per the configured CORS origins, with
//!   `Vary: Origin` when every origin is allowed
//!
//! ## Example
//!
//! ```rust
//! use nasse::middleware::{AfterRequest, Middleware};
//! use nasse::response::{Exception, OutgoingResponse};
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn after(&self, _req: &AfterRequest<'_>, res: &mut OutgoingResponse) -> Result<(), Exception> {
//!         res.set_header("x-powered-by", "nasse".to_string());
//!         Ok(())
//!     }
//! }
//! ```

mod core;
mod defaults;

pub use core::{AfterRequest, Middleware};
pub use defaults::{DefaultHeaders, OriginValidation, PREFLIGHT_MAX_AGE, STRICT_TRANSPORT_SECURITY};
