//! # Security Module
//!
//! Authentication gate and the account-management capability it consults.
//!
//! ## Overview
//!
//! Applications plug their account store in by implementing
//! [`AccountManagement`] and attaching it to the
//! [`Config`](crate::config::Config). Endpoints declare per-method
//! [`Login`](crate::models::Login) rules; the gate runs when a rule resolves
//! for the request method and is enforced (`!no_login && required`).
//!
//! ## Flow
//!
//! ```text
//! START ──token absent──► MISSING_TOKEN (403)
//! START ──token present──► HAVE_TOKEN
//! HAVE_TOKEN ──no account management──► warn, account = None
//! HAVE_TOKEN ──verification only──► verify_token(t) ? pass : AUTH_ERROR (403)
//! HAVE_TOKEN ──resolve──► retrieve_account(t)
//!     ├── no allowed types → pass
//!     └── retrieve_type(account) ∈ types ? pass : AUTH_ERROR (403)
//! ```
//!
//! Tokens are looked up in the `Authorization` header, then the
//! `{id}_token` query/form value, then the `__{id}_token` cookie.

mod account;
mod gate;

pub use account::{Account, AccountManagement};
pub use gate::{authenticate, retrieve_token};
