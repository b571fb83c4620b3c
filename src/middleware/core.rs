use http::Method;

use crate::models::Endpoint;
use crate::request::IncomingRequest;
use crate::response::{Exception, Outcome, OutgoingResponse};

/// What an after-request hook may look at.
#[derive(Debug, Clone, Copy)]
pub struct AfterRequest<'r> {
    pub method: &'r Method,
    /// `Origin` header of the request.
    pub origin: Option<&'r str>,
    /// Matched endpoint, absent for unmatched paths.
    pub endpoint: Option<&'r Endpoint>,
    pub debug: bool,
}

/// Before/after request hooks, invoked in registration order.
///
/// `before` may short-circuit the request by returning an outcome, which is
/// normalized like a handler result. `after` errors are logged and swallowed
/// so a failing hook never masks the response.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &IncomingRequest) -> Option<Outcome> {
        None
    }

    fn after(&self, _req: &AfterRequest<'_>, _res: &mut OutgoingResponse) -> Result<(), Exception> {
        Ok(())
    }
}
