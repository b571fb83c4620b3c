//! # Models Module
//!
//! The declaration model: everything an endpoint says about itself.
//!
//! ## Overview
//!
//! - [`Endpoint`] bundles a path pattern, accepted methods, the handler and
//!   its typed contracts.
//! - [`UserSent`] values ([`Parameter`], [`Header`], [`Cookie`], [`Dynamic`])
//!   describe client input, with an optional [`Coercion`] and method filter.
//! - [`Return`] and [`DeclaredError`] document outputs.
//! - [`Login`] rules select how authentication is enforced, per method.
//!
//! Each declaration can be built from its own type, from a bare name
//! (`"username".into()`), or from a JSON/YAML mapping of its fields
//! (`TryFrom<serde_json::Value>` and `Deserialize`). Any other shape fails
//! with `CONVERSION_ERROR` naming the target type.
//!
//! Per-method settings ([`PerMethod`]) resolve by exact method, then `*`.

mod declared_error;
mod endpoint;
mod login;
mod methods;
pub mod naming;
mod returning;
mod user_sent;

pub use declared_error::DeclaredError;
pub use endpoint::{Endpoint, EndpointBuilder, DEFAULT_ENDPOINT_NAME, DEFAULT_SECTION};
pub use login::Login;
pub use methods::{MethodSet, PerMethod, ALL_METHODS, HTTP_VERBS};
pub use returning::Return;
pub use user_sent::{
    Coercion, Cookie, CookieKind, Dynamic, DynamicKind, Header, HeaderKind, Parameter,
    ParameterKind, UserSent, UserSentKind,
};
