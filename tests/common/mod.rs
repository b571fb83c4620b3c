#![allow(dead_code)]

use nasse::prelude::*;
use nasse::response::OutgoingResponse;
use serde_json::Value;

/// Parse a response body as JSON.
pub fn body_json(res: &OutgoingResponse) -> Value {
    serde_json::from_slice(&res.body).unwrap_or_else(|e| {
        panic!(
            "body is not JSON ({e}): {}",
            String::from_utf8_lossy(&res.body)
        )
    })
}

pub fn body_text(res: &OutgoingResponse) -> String {
    String::from_utf8(res.body.clone()).unwrap()
}

/// Account stored by [`Accounts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: &'static str,
    pub kind: &'static str,
}

/// Token store: `admin-token`, `user-token` and `verified-only` are known.
pub struct Accounts;

impl AccountManagement for Accounts {
    fn retrieve_account(&self, token: &str) -> Result<Account, Exception> {
        match token {
            "admin-token" => Ok(Account::new(User {
                name: "root",
                kind: "admin",
            })),
            "user-token" => Ok(Account::new(User {
                name: "alice",
                kind: "user",
            })),
            _ => Err(Exception::new("AUTH_ERROR", "Unknown token", 403)),
        }
    }

    fn retrieve_type(&self, account: &Account) -> Option<String> {
        account.downcast_ref::<User>().map(|u| u.kind.to_string())
    }

    fn verify_token(&self, token: &str) -> bool {
        token == "verified-only" || self.retrieve_account(token).is_ok()
    }
}

/// Application named `Demo` (identifier `demo`) with the test token store.
pub fn app() -> App {
    App::new(Config::named("Demo").with_account_management(Accounts))
}

pub fn debug_app() -> App {
    App::new(
        Config::named("Demo")
            .with_debug(true)
            .with_account_management(Accounts),
    )
}
