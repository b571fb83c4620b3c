use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::response::Exception;

/// An account resolved from a token. Opaque to the framework.
#[derive(Clone)]
pub struct Account(Arc<dyn Any + Send + Sync>);

impl Account {
    pub fn new<T: Any + Send + Sync>(account: T) -> Self {
        Self(Arc::new(account))
    }

    /// Borrow the account as the concrete type the manager stored.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Account(..)")
    }
}

/// User-supplied capability resolving tokens into accounts.
///
/// Implementations may block (database lookups, remote calls); the gate
/// calls them on the request thread.
///
/// # Example
///
/// ```rust
/// use nasse::response::Exception;
/// use nasse::security::{Account, AccountManagement};
///
/// struct User { kind: &'static str }
///
/// struct Tokens;
///
/// impl AccountManagement for Tokens {
///     fn retrieve_account(&self, token: &str) -> Result<Account, Exception> {
///         match token {
///             "admin-token" => Ok(Account::new(User { kind: "admin" })),
///             _ => Err(Exception::new("AUTH_ERROR", "Unknown token", 403)),
///         }
///     }
///
///     fn retrieve_type(&self, account: &Account) -> Option<String> {
///         account.downcast_ref::<User>().map(|u| u.kind.to_string())
///     }
/// }
/// ```
pub trait AccountManagement: Send + Sync {
    /// Resolve a token into an account.
    fn retrieve_account(&self, token: &str) -> Result<Account, Exception>;

    /// Account type matched against `Login::types`.
    fn retrieve_type(&self, _account: &Account) -> Option<String> {
        None
    }

    /// Check a token without loading the account.
    fn verify_token(&self, token: &str) -> bool {
        self.retrieve_account(token).is_ok()
    }
}
