//! # App Module
//!
//! The endpoint registry and the request pipeline.
//!
//! ## Overview
//!
//! An [`App`] owns the configuration, the route table and the hooks. It is
//! built once at startup and is read-only afterwards, so a transport can
//! share it between worker threads and call [`App::handle`] concurrently.
//!
//! ## Request Flow
//!
//! 1. Before hooks, in order. One may answer the request early.
//! 2. Body size check (`413 PAYLOAD_TOO_LARGE`), path resolution
//!    (`404 NOT_FOUND`) and method check (`405 METHOD_NOT_ALLOWED`). These
//!    are answered with a best-effort envelope and no debug block.
//! 3. Verification: the request context is built and validated against the
//!    endpoint's declarations.
//! 4. Authentication: the login rule of the method, if any.
//! 5. Processing: the handler runs.
//! 6. Formatting: the outcome is normalized and rendered, with the debug
//!    block in debug mode.
//! 7. `Server` and `X-Request-Id` headers, then the after hooks.
//!
//! Each phase is timed. A failing phase skips the later ones and goes
//! straight to formatting.
//!
//! ## Example
//!
//! ```rust
//! use nasse::app::App;
//! use nasse::config::Config;
//! use nasse::dispatcher::Handler;
//! use nasse::models::Endpoint;
//! use nasse::request::IncomingRequest;
//! use serde_json::json;
//!
//! let mut app = App::new(Config::named("Demo"));
//! app.route(
//!     Endpoint::builder()
//!         .path("/hello")
//!         .handler(Handler::from_fn(|_ctx| json!({"hello": "world"}))),
//! )
//! .unwrap();
//!
//! let response = app.handle(IncomingRequest::get("/hello"));
//! assert_eq!(response.status, 200);
//! assert_eq!(
//!     String::from_utf8(response.body).unwrap(),
//!     r#"{"success":true,"error":null,"data":{"hello":"world"}}"#
//! );
//! ```

use std::fmt;
use std::net::IpAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http::Method;
use serde_json::{json, Value};
use tracing::{debug, error, info, info_span, warn};

use crate::config::Config;
use crate::error::NasseError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::{AfterRequest, DefaultHeaders, Middleware};
use crate::models::{Endpoint, EndpointBuilder};
use crate::record::{CallStackRecording, LogRecording, Phase, Timings};
use crate::request::{client_ip, IncomingRequest, MultiMap, RequestContext};
use crate::response::{
    normalize, render, Exception, FormatHints, Normalized, Outcome, OutgoingResponse, Prepared,
};
use crate::router::{Converter, Router, TransportStyle};
use crate::security::authenticate;

/// The host transport, informed of every registered route.
pub trait Transport: Send + Sync {
    fn register(&self, path: &str, methods: &[Method]);

    /// Path parameter syntax the transport expects.
    fn style(&self) -> TransportStyle {
        TransportStyle::Angle
    }
}

/// What the debug block reports about the client.
struct Snapshot {
    ip: Option<IpAddr>,
    domain: Option<String>,
    headers: Value,
    values: Value,
}

impl Snapshot {
    fn of_context(ctx: &RequestContext<'_>) -> Self {
        Self {
            ip: ctx.ip(),
            domain: ctx.host().map(str::to_string),
            headers: ctx.headers().to_json(),
            values: ctx.values().to_json(),
        }
    }

    fn of_request(request: &IncomingRequest) -> Self {
        let mut headers = MultiMap::case_insensitive();
        headers.extend(
            request
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone())),
        );
        let values = MultiMap::from_pairs(request.query_pairs())
            .shadowed_by(&MultiMap::from_pairs(request.form_pairs()));
        Self {
            ip: client_ip(request),
            domain: request.get_header("host").map(str::to_string),
            headers: headers.to_json(),
            values: values.to_json(),
        }
    }
}

/// Per-request recording state, released when the request ends.
struct Recording {
    timings: Timings,
    logs: LogRecording,
    call_stack: Option<CallStackRecording>,
}

impl Recording {
    fn debug_block(&self, snapshot: &Snapshot) -> Value {
        let mut block = json!({
            "time": self.timings.to_json(),
            "ip": snapshot.ip.map(|ip| ip.to_string()),
            "headers": snapshot.headers,
            "values": snapshot.values,
            "domain": snapshot.domain,
            "logs": self.logs.lines(),
        });
        if let (Some(call_stack), Value::Object(map)) = (&self.call_stack, &mut block) {
            map.insert("call_stack".to_string(), json!(call_stack.frames()));
        }
        block
    }
}

/// Endpoint registry and request pipeline.
pub struct App {
    config: Config,
    server_header: String,
    router: Router<Arc<Endpoint>>,
    middleware: Vec<Arc<dyn Middleware>>,
    transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.config.name)
            .field("id", &self.config.id)
            .field("endpoints", &self.router.len())
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create an application. The configuration is normalized and the
    /// default security and CORS after-hook is installed.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let config = config.normalize();
        let server_header = config.render_server_header().unwrap_or_else(|err| {
            warn!(error = %err, "Invalid server header template, using the application name");
            format!("{}/{}", config.name, env!("CARGO_PKG_VERSION"))
        });
        let default_headers: Arc<dyn Middleware> = Arc::new(DefaultHeaders::from_config(&config));

        info!(
            name = %config.name,
            id = %config.id,
            debug = config.debug,
            cors = ?config.cors,
            "Application created"
        );

        Self {
            config,
            server_header,
            router: Router::new(),
            middleware: vec![default_headers],
            transport: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rendered `Server` header value.
    #[must_use]
    pub fn server_header(&self) -> &str {
        &self.server_header
    }

    /// Attach the host transport. Routes already registered are replayed.
    #[must_use]
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(transport);
        for (path, methods) in self.transport_routes(transport.style()) {
            transport.register(&path, &methods);
        }
        self.transport = Some(transport);
        self
    }

    /// Register a hook. Hooks run in registration order, after the default
    /// one.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    /// Add a dynamic segment type, usable as `<name:...>` in later routes.
    pub fn register_converter(&mut self, name: impl Into<String>, converter: Converter) {
        self.router.register_converter(name, converter);
    }

    /// Declare an endpoint.
    ///
    /// Declaration errors are returned to the caller. A route registered at
    /// an existing path replaces the previous one.
    pub fn route(&mut self, builder: EndpointBuilder) -> Result<Arc<Endpoint>, NasseError> {
        let endpoint = Arc::new(builder.build()?);
        let pattern = endpoint.path.clone();

        if self.router.insert(pattern.clone(), Arc::clone(&endpoint)).is_some() {
            warn!(path = %pattern, "Endpoint replaced an existing route");
        }

        let methods = endpoint.methods.expand();
        if let Some(transport) = &self.transport {
            let path = pattern.to_transport(self.router.converters(), transport.style());
            transport.register(&path, &methods);
        }

        info!(
            path = %pattern,
            name = %endpoint.name,
            methods = %endpoint.methods,
            "Endpoint registered"
        );
        Ok(endpoint)
    }

    /// Registered endpoints, in registration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Arc<Endpoint>> {
        self.router.iter().map(|(_, endpoint)| endpoint)
    }

    /// Transport paths with their expanded method sets.
    #[must_use]
    pub fn transport_routes(&self, style: TransportStyle) -> Vec<(String, Vec<Method>)> {
        self.router
            .iter()
            .map(|(pattern, endpoint)| {
                (
                    pattern.to_transport(self.router.converters(), style),
                    endpoint.methods.expand(),
                )
            })
            .collect()
    }

    /// Run one request through the pipeline.
    pub fn handle(&self, mut request: IncomingRequest) -> OutgoingResponse {
        let started = Instant::now();
        let id = RequestId::from_header_or_new(request.get_header(REQUEST_ID_HEADER));
        let span = info_span!("request", request_id = %id, method = %request.method, path = %request.path);
        let _entered = span.enter();

        let debug = self.config.debug;
        let hints = FormatHints::from_args(&MultiMap::from_pairs(request.query_pairs()), debug);
        let mut recording = Recording {
            timings: Timings::new(),
            logs: LogRecording::start(),
            call_stack: (debug && hints.call_stack)
                .then(|| CallStackRecording::start(self.config.base_dir.clone())),
        };
        recording.timings.start(Phase::Global);

        info!(
            request_id = %id,
            method = %request.method,
            path = %request.path,
            body_size = request.body.len(),
            "Request received"
        );

        let requested_method = request.method.clone();
        let head = requested_method == Method::HEAD;
        let mut matched: Option<Arc<Endpoint>> = None;

        let mut response = 'pipeline: {
            for hook in &self.middleware {
                if let Some(outcome) = hook.before(&request) {
                    debug!(request_id = %id, "Request answered by a before hook");
                    let snapshot = Snapshot::of_request(&request);
                    break 'pipeline self.finish(outcome, true, &hints, &mut recording, &snapshot);
                }
            }

            if request.body.len() as u64 > self.config.max_request_size {
                let err = NasseError::PayloadTooLarge {
                    limit: self.config.max_request_size,
                };
                break 'pipeline self.pass_through(&err.into(), &hints);
            }

            let route = match self.router.resolve(&request.path) {
                Ok(route) => route,
                Err(err @ NasseError::NotFound { .. }) => {
                    break 'pipeline self.pass_through(&err.into(), &hints);
                }
                Err(err) => {
                    let snapshot = Snapshot::of_request(&request);
                    break 'pipeline self.finish(
                        Outcome::Exception(err.into()),
                        true,
                        &hints,
                        &mut recording,
                        &snapshot,
                    );
                }
            };
            let endpoint = Arc::clone(route.value);
            let captures = route.captures;
            matched = Some(Arc::clone(&endpoint));

            let method = request.method.as_str().to_string();
            if !endpoint.methods.applies_to(&method) {
                if request.method == Method::OPTIONS {
                    debug!(request_id = %id, path = %request.path, "Automatic preflight response");
                    break 'pipeline OutgoingResponse::new(204, Vec::new());
                }
                if head && endpoint.methods.applies_to(Method::GET.as_str()) {
                    request.method = Method::GET;
                } else {
                    let err = NasseError::MethodNotAllowed {
                        method,
                        path: request.path.clone(),
                    };
                    break 'pipeline self.pass_through(&err.into(), &hints);
                }
            }

            let mut ctx = RequestContext::new(self, &endpoint, &request, captures, id);
            let outcome = self.process(&mut ctx, &mut recording.timings);
            let snapshot = Snapshot::of_context(&ctx);
            self.finish(outcome, endpoint.json, &hints, &mut recording, &snapshot)
        };

        if head {
            response.body.clear();
        }
        response.set_header("server", self.server_header.clone());
        response.set_header(REQUEST_ID_HEADER, id.to_string());
        self.run_after_hooks(&requested_method, &request, matched.as_deref(), &mut response);

        recording.timings.stop(Phase::Global);
        info!(
            request_id = %id,
            status = response.status,
            latency_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }

    /// Verification, authentication and processing. A failing phase stops
    /// the pipeline and its error becomes the outcome.
    fn process(&self, ctx: &mut RequestContext<'_>, timings: &mut Timings) -> Outcome {
        if let Err(err) = timings.measure(Phase::Verification, || ctx.validate()) {
            debug!(request_id = %ctx.id(), error = %err, "Request validation failed");
            return Outcome::Exception(err.into());
        }

        let account = match timings.measure(Phase::Authentication, || authenticate(ctx)) {
            Ok(account) => account,
            Err(exception) => {
                debug!(
                    request_id = %ctx.id(),
                    error = %exception.name,
                    "Authentication failed"
                );
                return Outcome::Exception(exception);
            }
        };

        let endpoint = ctx.endpoint();
        timings.measure(Phase::Processing, || {
            endpoint.handler.invoke(ctx, account.as_ref())
        })
    }

    /// Normalize and render under the formatting timer, attaching the debug
    /// block in debug mode.
    fn finish(
        &self,
        outcome: Outcome,
        json: bool,
        hints: &FormatHints,
        recording: &mut Recording,
        snapshot: &Snapshot,
    ) -> OutgoingResponse {
        recording.timings.start(Phase::Formatting);
        let response = match normalize(outcome, self.config.debug) {
            Prepared::Raw(response) => response,
            Prepared::Normalized(normalized) => {
                if let Some(error) = &normalized.error {
                    debug!(code = normalized.code, error = %error, "Request ended with an error");
                }
                let block = self
                    .config
                    .debug
                    .then(|| recording.debug_block(snapshot));
                render(normalized, hints, json, block)
            }
        };
        recording.timings.stop(Phase::Formatting);
        response
    }

    /// Matcher and transport level failures: best-effort envelope, no debug
    /// block.
    fn pass_through(&self, exception: &Exception, hints: &FormatHints) -> OutgoingResponse {
        debug!(code = exception.code, error = %exception.name, "Request rejected");
        let normalized = Normalized::from_exception(exception, self.config.debug);
        render(normalized, hints, true, None)
    }

    fn run_after_hooks(
        &self,
        method: &Method,
        request: &IncomingRequest,
        endpoint: Option<&Endpoint>,
        response: &mut OutgoingResponse,
    ) {
        let after = AfterRequest {
            method,
            origin: request.get_header("origin"),
            endpoint,
            debug: self.config.debug,
        };
        for hook in &self.middleware {
            match catch_unwind(AssertUnwindSafe(|| hook.after(&after, response))) {
                Ok(Ok(())) => {}
                Ok(Err(exception)) => warn!(
                    error = %exception.name,
                    message = %exception.message,
                    "After-request hook failed"
                ),
                Err(_) => error!("After-request hook panicked"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Handler;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, Vec<Method>)>>);

    impl Transport for Arc<Recorder> {
        fn register(&self, path: &str, methods: &[Method]) {
            self.0
                .lock()
                .unwrap()
                .push((path.to_string(), methods.to_vec()));
        }
    }

    fn ok() -> Handler {
        Handler::from_fn(|_ctx| "ok")
    }

    #[test]
    fn test_transport_is_informed() {
        let recorder = Arc::new(Recorder::default());
        let mut app = App::new(Config::default()).with_transport(Arc::clone(&recorder));
        app.route(
            Endpoint::builder()
                .path("/pages/<int:page>")
                .methods(["GET"])
                .handler(ok()),
        )
        .unwrap();
        let registered = recorder.0.lock().unwrap();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].0, "/pages/<int:page>");
        assert_eq!(registered[0].1, vec![Method::GET]);
    }

    #[test]
    fn test_star_expands_to_all_verbs() {
        let mut app = App::new(Config::default());
        app.route(Endpoint::builder().path("/any").handler(ok())).unwrap();
        let routes = app.transport_routes(TransportStyle::Brace);
        assert_eq!(routes[0].1.len(), crate::models::HTTP_VERBS.len());
    }

    #[test]
    fn test_route_replaces_same_path() {
        let mut app = App::new(Config::default());
        app.route(Endpoint::builder().path("/a").name("first").handler(ok()))
            .unwrap();
        app.route(Endpoint::builder().path("/a").name("second").handler(ok()))
            .unwrap();
        let names: Vec<_> = app.endpoints().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["second".to_string()]);
    }

    #[test]
    fn test_declaration_error_surfaces() {
        let mut app = App::new(Config::default());
        let err = app
            .route(Endpoint::builder().path("/a").methods(["BAD METHOD"]).handler(ok()))
            .unwrap_err();
        assert_eq!(err.error_name(), "CONVERSION_ERROR");
        assert_eq!(app.endpoints().count(), 0);
    }

    #[test]
    fn test_server_header_rendered() {
        let app = App::new(Config::named("Demo"));
        assert_eq!(
            app.server_header(),
            format!("Demo/{} (nasse)", env!("CARGO_PKG_VERSION"))
        );
    }
}
