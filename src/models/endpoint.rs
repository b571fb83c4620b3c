use std::path::PathBuf;

use tracing::debug;

use super::declared_error::DeclaredError;
use super::login::Login;
use super::methods::{MethodSet, PerMethod};
use super::naming::derive_path;
use super::returning::Return;
use super::user_sent::{Cookie, Dynamic, Header, Parameter};
use crate::dispatcher::Handler;
use crate::error::NasseError;
use crate::router::PathPattern;

pub const DEFAULT_ENDPOINT_NAME: &str = "Untitled";
pub const DEFAULT_SECTION: &str = "Other";

/// A route declaration: where it lives, what it accepts and what it returns.
///
/// Built through [`EndpointBuilder`]; once registered it is immutable.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: PathPattern,
    pub methods: MethodSet,
    pub handler: Handler,
    pub name: String,
    /// Documentation grouping.
    pub section: String,
    pub description: PerMethod<String>,
    pub returning: Vec<Return>,
    /// Per-method login rules. Empty means no authentication.
    pub login: PerMethod<Login>,
    pub headers: Vec<Header>,
    pub params: Vec<Parameter>,
    pub cookies: Vec<Cookie>,
    pub dynamics: Vec<Dynamic>,
    pub errors: Vec<DeclaredError>,
    /// Wrap results in the response envelope.
    pub json: bool,
    pub base_dir: Option<PathBuf>,
}

impl Endpoint {
    #[must_use]
    pub fn builder() -> EndpointBuilder {
        EndpointBuilder::default()
    }

    /// Login rule for `method`, falling back to the `*` rule.
    #[must_use]
    pub fn login_for(&self, method: &str) -> Option<&Login> {
        self.login.get(method)
    }

    #[must_use]
    pub fn description_for(&self, method: &str) -> Option<&str> {
        self.description.get(method).map(String::as_str)
    }
}

/// Builds an [`Endpoint`].
///
/// A builder can be reused as a template: [`EndpointBuilder::base`] copies
/// every field of an existing endpoint except its path. Explicit values win
/// over the base, which wins over the defaults.
///
/// ```rust
/// use nasse::dispatcher::Handler;
/// use nasse::models::{Endpoint, Parameter, Login};
///
/// let endpoint = Endpoint::builder()
///     .path("/users/<int:id>")
///     .methods(["GET", "DELETE"])
///     .param(Parameter::new("fields").optional())
///     .login(Login::required().types(["admin"]))
///     .handler(Handler::from_fn(|ctx| ctx.dynamics().to_json()))
///     .build()
///     .unwrap();
///
/// assert_eq!(endpoint.dynamics[0].name, "id");
/// assert!(endpoint.methods.applies_to("DELETE"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EndpointBuilder {
    base: Option<Box<Endpoint>>,
    path: Option<String>,
    methods: Option<Result<MethodSet, NasseError>>,
    handler: Option<Handler>,
    name: Option<String>,
    section: Option<String>,
    description: Option<PerMethod<String>>,
    returning: Option<Vec<Return>>,
    login: Option<PerMethod<Login>>,
    headers: Option<Vec<Header>>,
    params: Option<Vec<Parameter>>,
    cookies: Option<Vec<Cookie>>,
    dynamics: Option<Vec<Dynamic>>,
    errors: Option<Vec<DeclaredError>>,
    json: Option<bool>,
    base_dir: Option<PathBuf>,
}

impl EndpointBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing endpoint. Its path is not inherited.
    #[must_use]
    pub fn base(mut self, endpoint: &Endpoint) -> Self {
        self.base = Some(Box::new(endpoint.clone()));
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Accepted methods. Invalid method tokens surface from `build`.
    #[must_use]
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.methods = Some(MethodSet::new(methods));
        self
    }

    #[must_use]
    pub fn method_set(mut self, methods: MethodSet) -> Self {
        self.methods = Some(Ok(methods));
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    /// Description for every method.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(PerMethod::all(description.into()));
        self
    }

    #[must_use]
    pub fn description_for(mut self, method: &str, description: impl Into<String>) -> Self {
        self.description
            .get_or_insert_with(PerMethod::default)
            .insert(method, description.into());
        self
    }

    #[must_use]
    pub fn returning(mut self, value: impl Into<Return>) -> Self {
        self.returning.get_or_insert_with(Vec::new).push(value.into());
        self
    }

    /// Login rule for every method.
    #[must_use]
    pub fn login(mut self, login: impl Into<Login>) -> Self {
        self.login = Some(PerMethod::all(login.into()));
        self
    }

    #[must_use]
    pub fn login_for(mut self, method: &str, login: impl Into<Login>) -> Self {
        self.login
            .get_or_insert_with(PerMethod::default)
            .insert(method, login.into());
        self
    }

    #[must_use]
    pub fn header(mut self, header: impl Into<Header>) -> Self {
        self.headers.get_or_insert_with(Vec::new).push(header.into());
        self
    }

    #[must_use]
    pub fn param(mut self, param: impl Into<Parameter>) -> Self {
        self.params.get_or_insert_with(Vec::new).push(param.into());
        self
    }

    #[must_use]
    pub fn cookie(mut self, cookie: impl Into<Cookie>) -> Self {
        self.cookies.get_or_insert_with(Vec::new).push(cookie.into());
        self
    }

    #[must_use]
    pub fn dynamic(mut self, dynamic: impl Into<Dynamic>) -> Self {
        self.dynamics.get_or_insert_with(Vec::new).push(dynamic.into());
        self
    }

    #[must_use]
    pub fn error(mut self, error: impl Into<DeclaredError>) -> Self {
        self.errors.get_or_insert_with(Vec::new).push(error.into());
        self
    }

    /// Send results as is instead of wrapping them in the envelope.
    #[must_use]
    pub fn raw(self) -> Self {
        self.json(false)
    }

    #[must_use]
    pub fn json(mut self, json: bool) -> Self {
        self.json = Some(json);
        self
    }

    #[must_use]
    pub fn base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Validate the declaration.
    ///
    /// Without an explicit path, one is derived from the handler's module
    /// path and name. Dynamic segments not declared get a default required
    /// declaration.
    pub fn build(self) -> Result<Endpoint, NasseError> {
        let base = self.base.map(|b| *b);

        let handler = match (self.handler, base.as_ref()) {
            (Some(handler), _) => handler,
            (None, Some(base)) => base.handler.clone(),
            (None, None) => {
                return Err(NasseError::conversion("Endpoint", "an endpoint needs a handler"));
            }
        };

        let raw_path = match (self.path, handler.location()) {
            (Some(path), _) if !path.trim().is_empty() => path,
            (_, Some(location)) => derive_path(&location.module_path, &location.name),
            (_, None) => {
                return Err(NasseError::conversion(
                    "Endpoint",
                    "no path was given and none can be derived from the handler",
                ));
            }
        };
        let path = PathPattern::parse(&raw_path)?;

        let methods = match self.methods {
            Some(methods) => methods?,
            None => base.as_ref().map(|b| b.methods.clone()).unwrap_or_default(),
        };

        let name = self
            .name
            .or_else(|| base.as_ref().map(|b| b.name.clone()))
            .or_else(|| handler.name().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_ENDPOINT_NAME.to_string());

        macro_rules! inherit {
            ($field:ident) => {
                self.$field
                    .or_else(|| base.as_ref().map(|b| b.$field.clone()))
                    .unwrap_or_default()
            };
        }

        let section = self
            .section
            .or_else(|| base.as_ref().map(|b| b.section.clone()))
            .unwrap_or_else(|| DEFAULT_SECTION.to_string());
        let description = inherit!(description);
        let returning = inherit!(returning);
        let login = inherit!(login);
        let headers = inherit!(headers);
        let params = inherit!(params);
        let cookies = inherit!(cookies);
        let mut dynamics: Vec<Dynamic> = match self.dynamics {
            Some(dynamics) => dynamics,
            // The base path is not inherited, so neither are its segments.
            None => base
                .as_ref()
                .map(|b| {
                    b.dynamics
                        .iter()
                        .filter(|d| path.dynamic_names().any(|name| name == d.name))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
        };
        let errors = inherit!(errors);
        let json = self
            .json
            .or_else(|| base.as_ref().map(|b| b.json))
            .unwrap_or(true);
        let base_dir = self
            .base_dir
            .or_else(|| base.as_ref().and_then(|b| b.base_dir.clone()));

        for captured in path.dynamic_names() {
            if !dynamics.iter().any(|d| d.name == captured) {
                dynamics.push(Dynamic::new(captured));
            }
        }

        debug!(
            path = %path,
            methods = %methods,
            name = %name,
            dynamics = dynamics.len(),
            "Endpoint declared"
        );

        Ok(Endpoint {
            path,
            methods,
            handler,
            name,
            section,
            description,
            returning,
            login,
            headers,
            params,
            cookies,
            dynamics,
            errors,
            json,
            base_dir,
        })
    }
}
