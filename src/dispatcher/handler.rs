use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http::Method;
use tracing::{debug, error};

use super::plan::{Plan, Slot};
use crate::app::App;
use crate::error::NasseError;
use crate::models::Endpoint;
use crate::request::{MultiMap, RequestContext};
use crate::response::{Exception, Outcome};
use crate::security::Account;

/// What a handler receives: the request context seen through its plan.
///
/// Accessors for slots the handler did not declare fail with
/// `MISSING_CONTEXT`.
pub struct Arguments<'r, 'a> {
    plan: &'r Plan,
    ctx: &'r RequestContext<'a>,
    account: Option<&'r Account>,
}

impl<'r, 'a> Arguments<'r, 'a> {
    #[must_use]
    pub fn new(plan: &'r Plan, ctx: &'r RequestContext<'a>, account: Option<&'r Account>) -> Self {
        Self { plan, ctx, account }
    }

    fn require(&self, slot: Slot) -> Result<(), NasseError> {
        if self.plan.contains(slot) {
            Ok(())
        } else {
            Err(NasseError::MissingContext(slot.name().to_string()))
        }
    }

    pub fn app(&self) -> Result<&'a App, NasseError> {
        self.require(Slot::App)?;
        Ok(self.ctx.app())
    }

    pub fn endpoint(&self) -> Result<&'a Endpoint, NasseError> {
        self.require(Slot::Endpoint)?;
        Ok(self.ctx.endpoint())
    }

    pub fn request(&self) -> Result<&'r RequestContext<'a>, NasseError> {
        self.require(Slot::Request)?;
        Ok(self.ctx)
    }

    pub fn method(&self) -> Result<&'r Method, NasseError> {
        self.require(Slot::Method)?;
        Ok(self.ctx.method())
    }

    pub fn values(&self) -> Result<&'r MultiMap, NasseError> {
        self.require(Slot::Values)?;
        Ok(self.ctx.values())
    }

    pub fn params(&self) -> Result<&'r MultiMap, NasseError> {
        self.require(Slot::Params)?;
        Ok(self.ctx.params())
    }

    /// Query string values.
    pub fn args(&self) -> Result<&'r MultiMap, NasseError> {
        self.require(Slot::Args)?;
        Ok(self.ctx.args())
    }

    pub fn form(&self) -> Result<&'r MultiMap, NasseError> {
        self.require(Slot::Form)?;
        Ok(self.ctx.form())
    }

    pub fn headers(&self) -> Result<&'r MultiMap, NasseError> {
        self.require(Slot::Headers)?;
        Ok(self.ctx.headers())
    }

    /// The authenticated account, `None` when the endpoint does not resolve
    /// one.
    pub fn account(&self) -> Result<Option<&'r Account>, NasseError> {
        self.require(Slot::Account)?;
        Ok(self.account)
    }
}

type HandlerFn = dyn Fn(&Arguments<'_, '_>) -> Outcome + Send + Sync;

/// Where a handler was defined. Used to derive a default route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerLocation {
    pub module_path: String,
    pub name: String,
}

/// A registered endpoint handler.
#[derive(Clone)]
pub struct Handler {
    plan: Plan,
    call: Arc<HandlerFn>,
    location: Option<HandlerLocation>,
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("plan", &self.plan)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Handler {
    /// Handler binding the context slots named in `names`.
    ///
    /// ```rust
    /// use nasse::dispatcher::Handler;
    /// use nasse::response::Outcome;
    ///
    /// let handler = Handler::new(&["params"], |args| {
    ///     let params = match args.params() {
    ///         Ok(params) => params,
    ///         Err(err) => return Outcome::from(nasse::response::Exception::from(err)),
    ///     };
    ///     Outcome::from(params.to_json())
    /// });
    /// assert!(handler.plan().contains(nasse::dispatcher::Slot::Params));
    /// ```
    pub fn new<F, R>(names: &[&str], f: F) -> Self
    where
        F: Fn(&Arguments<'_, '_>) -> R + Send + Sync + 'static,
        R: Into<Outcome>,
    {
        Self {
            plan: Plan::from_names(names),
            call: Arc::new(move |args: &Arguments<'_, '_>| f(args).into()),
            location: None,
        }
    }

    /// Handler taking the whole request context.
    pub fn from_fn<F, R>(f: F) -> Self
    where
        F: Fn(&RequestContext<'_>) -> R + Send + Sync + 'static,
        R: Into<Outcome>,
    {
        Self::new(&["request"], move |args: &Arguments<'_, '_>| {
            match args.request() {
                Ok(ctx) => f(ctx).into(),
                Err(err) => Outcome::from(Exception::from(err)),
            }
        })
    }

    /// Handler taking the request context and the authenticated account.
    pub fn with_account<F, R>(f: F) -> Self
    where
        F: Fn(&RequestContext<'_>, Option<&Account>) -> R + Send + Sync + 'static,
        R: Into<Outcome>,
    {
        Self::new(&["request", "account"], move |args: &Arguments<'_, '_>| {
            match (args.request(), args.account()) {
                (Ok(ctx), Ok(account)) => f(ctx, account).into(),
                (Err(err), _) | (_, Err(err)) => Outcome::from(Exception::from(err)),
            }
        })
    }

    /// Record where the handler was defined.
    #[must_use]
    pub fn located(mut self, module_path: impl Into<String>, name: impl Into<String>) -> Self {
        self.location = Some(HandlerLocation {
            module_path: module_path.into(),
            name: name.into(),
        });
        self
    }

    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    #[must_use]
    pub fn location(&self) -> Option<&HandlerLocation> {
        self.location.as_ref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.name.as_str())
    }

    /// Run the handler. A panic becomes a redacted 500.
    pub fn invoke(&self, ctx: &RequestContext<'_>, account: Option<&Account>) -> Outcome {
        let handler_name = self.name().unwrap_or("anonymous");
        let execution_start = Instant::now();
        let args = Arguments::new(&self.plan, ctx, account);

        match catch_unwind(AssertUnwindSafe(|| (self.call)(&args))) {
            Ok(outcome) => {
                debug!(
                    request_id = %ctx.id(),
                    handler_name = %handler_name,
                    execution_time_us = execution_start.elapsed().as_micros() as u64,
                    "Handler execution complete"
                );
                outcome
            }
            Err(panic) => {
                let panic_message = panic_message(panic.as_ref());
                error!(
                    request_id = %ctx.id(),
                    handler_name = %handler_name,
                    panic_message = %panic_message,
                    "Handler panicked"
                );
                Outcome::Exception(Exception::internal(format!(
                    "Handler panicked: {panic_message}"
                )))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
