mod common;

use common::{app, body_json, User};
use http::Method;
use nasse::dispatcher::Slot;
use nasse::prelude::*;
use nasse::security::Account;
use serde_json::{json, Value};

#[handler]
fn greet(params: &MultiMap) -> Value {
    json!({ "hello": params.get_str("name").unwrap_or("world") })
}

#[handler]
fn describe(method: &Method, endpoint: &Endpoint, _headers: &MultiMap) -> Value {
    json!({ "method": method.as_str(), "endpoint": endpoint.name })
}

#[handler]
fn profile(account: Option<&Account>) -> Result<Value, Exception> {
    let user = account
        .and_then(|a| a.downcast_ref::<User>())
        .ok_or_else(|| Exception::new("NO_USER", "No user", 401))?;
    Ok(json!({ "name": user.name, "kind": user.kind }))
}

#[handler]
fn parse_number(args: &MultiMap) -> Result<Value, Exception> {
    let raw = args.get_str("n").unwrap_or_default();
    let n: i64 = raw.parse()?;
    Ok(json!({ "n": n }))
}

mod health {
    use nasse::handler;

    #[handler]
    pub fn status() -> &'static str {
        "up"
    }
}

#[test]
fn test_macro_binds_named_arguments() {
    let handler = greet();
    assert_eq!(handler.name(), Some("greet"));
    assert!(handler.plan().contains(Slot::Params));
    assert!(!handler.plan().contains(Slot::Account));

    let mut app = app();
    app.route(Endpoint::builder().path("/greet").handler(handler))
        .unwrap();
    let body = body_json(&app.handle(IncomingRequest::get("/greet?name=nasse")));
    assert_eq!(body["data"], json!({"hello": "nasse"}));
}

#[test]
fn test_macro_with_several_arguments() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/describe")
            .name("Describe")
            .methods(["GET", "POST"])
            .handler(describe()),
    )
    .unwrap();

    let body = body_json(&app.handle(IncomingRequest::post("/describe")));
    assert_eq!(body["data"], json!({"method": "POST", "endpoint": "Describe"}));
}

#[test]
fn test_macro_account_argument() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/profile")
            .login(Login::required())
            .handler(profile()),
    )
    .unwrap();

    let res = app.handle(IncomingRequest::get("/profile").header("Authorization", "admin-token"));
    assert_eq!(body_json(&res)["data"], json!({"name": "root", "kind": "admin"}));
}

#[test]
fn test_account_is_none_without_login() {
    let mut app = app();
    app.route(Endpoint::builder().path("/profile").handler(profile()))
        .unwrap();

    let res = app.handle(IncomingRequest::get("/profile"));
    assert_eq!(res.status, 401);
    assert_eq!(body_json(&res)["error"], "NO_USER");
}

#[test]
fn test_question_mark_in_handler() {
    let mut app = app();
    app.route(Endpoint::builder().path("/n").handler(parse_number()))
        .unwrap();

    let res = app.handle(IncomingRequest::get("/n?n=12"));
    assert_eq!(body_json(&res)["data"], json!({"n": 12}));

    let res = app.handle(IncomingRequest::get("/n?n=twelve"));
    assert_eq!(res.status, 500);
    assert_eq!(body_json(&res)["error"], "PARSE_INT_ERROR");
}

#[test]
fn test_path_derived_from_handler_location() {
    let mut app = app();
    let endpoint = app.route(Endpoint::builder().handler(health::status())).unwrap();
    assert_eq!(endpoint.path.as_str(), "/health/status");
    assert_eq!(endpoint.name, "status");

    let res = app.handle(IncomingRequest::get("/health/status"));
    assert_eq!(body_json(&res)["data"], json!({"message": "up"}));
}

#[test]
fn test_unplanned_slot_is_missing_context() {
    let handler = Handler::new(&["params"], |args| {
        Outcome::from(args.account().map(|_| "unreachable"))
    });
    let mut app = app();
    app.route(Endpoint::builder().path("/broken").handler(handler))
        .unwrap();

    let res = app.handle(IncomingRequest::get("/broken"));
    assert_eq!(res.status, 500);
    let body = body_json(&res);
    assert_eq!(body["error"], "MISSING_CONTEXT");
    assert!(body["message"].as_str().unwrap().contains("account"));
}

#[test]
fn test_unknown_slot_names_are_ignored() {
    let handler = Handler::new(&["params", "telepathy"], |args| {
        Outcome::from(args.params().map(|p| p.to_json()))
    });
    assert_eq!(handler.plan().slots(), &[Slot::Params]);

    let mut app = app();
    app.route(Endpoint::builder().path("/echo").handler(handler))
        .unwrap();
    let body = body_json(&app.handle(IncomingRequest::get("/echo?a=1")));
    assert_eq!(body["data"], json!({"a": "1"}));
}

#[test]
fn test_endpoint_inherits_from_base() {
    let mut app = app();
    let base = app
        .route(
            Endpoint::builder()
                .path("/v1/items")
                .section("Items")
                .methods(["GET"])
                .param(Parameter::new("page").coercion(Coercion::int()))
                .handler(greet()),
        )
        .unwrap();

    let v2 = app
        .route(Endpoint::builder().base(&base).path("/v2/items"))
        .unwrap();
    assert_eq!(v2.section, "Items");
    assert_eq!(v2.params.len(), 1);
    assert!(v2.methods.applies_to("GET"));
    assert_eq!(app.handle(IncomingRequest::get("/v2/items")).status, 400);
    assert_eq!(app.handle(IncomingRequest::get("/v2/items?page=2")).status, 200);
}

#[test]
fn test_derived_endpoint_drops_base_path_segments() {
    let mut app = app();
    let user = app
        .route(
            Endpoint::builder()
                .path("/users/<int:id>")
                .methods(["GET"])
                .handler(Handler::from_fn(|ctx| ctx.dynamics().to_json())),
        )
        .unwrap();
    assert_eq!(user.dynamics[0].name, "id");

    let me = app
        .route(Endpoint::builder().base(&user).path("/me"))
        .unwrap();
    assert!(me.dynamics.is_empty());

    let res = app.handle(IncomingRequest::get("/me"));
    assert_eq!(res.status, 200);
    assert_eq!(body_json(&res)["data"], json!({}));

    let res = app.handle(IncomingRequest::get("/users/7"));
    assert_eq!(body_json(&res)["data"], json!({"id": 7}));
}

#[test]
fn test_missing_handler_is_a_declaration_error() {
    let mut app = app();
    let err = app.route(Endpoint::builder().path("/nothing")).unwrap_err();
    assert_eq!(err.error_name(), "CONVERSION_ERROR");
}
