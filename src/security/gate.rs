use tracing::{debug, warn};

use super::account::Account;
use crate::error::NasseError;
use crate::request::RequestContext;
use crate::response::Exception;

const BEARER_PREFIX: &str = "Bearer ";

/// Find the request's token.
///
/// Priority: `Authorization` header (an optional `Bearer ` prefix is
/// stripped), then the `{id}_token` query/form value, then the
/// `__{id}_token` cookie, `{id}` being the application identifier.
#[must_use]
pub fn retrieve_token(ctx: &RequestContext<'_>) -> Option<String> {
    if let Some(header) = ctx.headers().get_str("authorization") {
        let token = header.strip_prefix(BEARER_PREFIX).unwrap_or(header).trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }
    let id = &ctx.app().config().id;
    if let Some(token) = ctx.values().get_str(&format!("{id}_token")) {
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }
    ctx.cookies()
        .get_str(&format!("__{id}_token"))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Run the authentication gate for the request's method.
///
/// Returns the resolved account, if any. When the login rule for the method
/// is not enforced, a token that happens to be present is still resolved on a
/// best-effort basis.
pub fn authenticate(ctx: &RequestContext<'_>) -> Result<Option<Account>, Exception> {
    let Some(login) = ctx.endpoint().login.get(ctx.method().as_str()) else {
        return Ok(None);
    };
    let manager = ctx.app().config().account_management.as_ref();

    if !login.enforced() {
        if login.no_login {
            return Ok(None);
        }
        let account = match (retrieve_token(ctx), manager) {
            (Some(token), Some(manager)) => manager.retrieve_account(&token).ok(),
            _ => None,
        };
        debug!(
            request_id = %ctx.id(),
            resolved = account.is_some(),
            "Optional login"
        );
        return Ok(account);
    }

    let Some(token) = retrieve_token(ctx) else {
        debug!(request_id = %ctx.id(), "No token on a protected endpoint");
        return Err(NasseError::MissingToken.into());
    };

    let Some(manager) = manager else {
        warn!(
            request_id = %ctx.id(),
            endpoint = %ctx.endpoint().name,
            "Login is required but no account management is configured, letting the request through"
        );
        return Ok(None);
    };

    if login.verification_only {
        if manager.verify_token(&token) {
            return Ok(None);
        }
        return Err(NasseError::Forbidden("The given token could not be verified".to_string()).into());
    }

    let account = manager.retrieve_account(&token)?;
    if login.types.is_empty() {
        return Ok(Some(account));
    }
    match manager.retrieve_type(&account) {
        Some(kind) if login.types.contains(&kind) => Ok(Some(account)),
        kind => {
            debug!(
                request_id = %ctx.id(),
                account_type = ?kind,
                allowed = ?login.types,
                "Account type not allowed"
            );
            Err(NasseError::Forbidden(
                "Your account type is not allowed to access this endpoint".to_string(),
            )
            .into())
        }
    }
}
