//! End-to-end request handling through `App::handle`.

mod common;

use common::{app, body_json, body_text, debug_app};
use nasse::prelude::*;
use nasse::response::{FileLike, REDACTED_MESSAGE};
use serde_json::json;
use std::io::Cursor;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct RuntimeError(String);

fn hello() -> Handler {
    Handler::from_fn(|_ctx| json!({"hello": "world"}))
}

#[test]
fn test_hello_world_envelope() {
    let mut app = app();
    app.route(Endpoint::builder().path("/hello").handler(hello()))
        .unwrap();

    let res = app.handle(IncomingRequest::get("/hello"));
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type(), Some("application/json"));
    assert_eq!(
        body_text(&res),
        r#"{"success":true,"error":null,"data":{"hello":"world"}}"#
    );
}

#[test]
fn test_framework_headers_are_set() {
    let mut app = app();
    app.route(Endpoint::builder().path("/hello").handler(hello()))
        .unwrap();

    let res = app.handle(IncomingRequest::get("/hello"));
    assert_eq!(
        res.get_header("server"),
        Some(format!("Demo/{} (nasse)", env!("CARGO_PKG_VERSION")).as_str())
    );
    let id = res.get_header("x-request-id").unwrap();
    assert!(ulid::Ulid::from_string(id).is_ok());
}

#[test]
fn test_request_id_is_propagated() {
    let mut app = app();
    app.route(Endpoint::builder().path("/hello").handler(hello()))
        .unwrap();

    let given = ulid::Ulid::new().to_string();
    let res = app.handle(IncomingRequest::get("/hello").header("X-Request-Id", given.clone()));
    assert_eq!(res.get_header("x-request-id"), Some(given.as_str()));
}

#[test]
fn test_internal_error_is_redacted() {
    let mut app = app();
    app.route(Endpoint::builder().path("/boom").handler(Handler::from_fn(|_ctx| {
        Err::<&str, _>(RuntimeError("database password is hunter2".into()))
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/boom"));
    assert_eq!(res.status, 500);
    let body = body_json(&res);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "RUNTIME_ERROR");
    assert_eq!(body["message"], REDACTED_MESSAGE);
    assert!(body.get("debug").is_none());
    assert!(!body_text(&res).contains("hunter2"));
}

#[test]
fn test_internal_error_in_debug_mode() {
    let mut app = debug_app();
    app.route(Endpoint::builder().path("/boom").handler(Handler::from_fn(|_ctx| {
        Err::<&str, _>(RuntimeError("disk full".into()))
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/boom"));
    assert_eq!(res.status, 500);
    let body = body_json(&res);
    assert_eq!(body["message"], "RuntimeError: disk full");
    assert!(body["debug"].is_object());
}

#[test]
fn test_panicking_handler_becomes_server_error() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/panic")
            .handler(Handler::from_fn(|_ctx| -> &'static str { panic!("oops") })),
    )
    .unwrap();

    let res = app.handle(IncomingRequest::get("/panic"));
    assert_eq!(res.status, 500);
    let body = body_json(&res);
    assert_eq!(body["error"], "SERVER_ERROR");
    assert_eq!(body["message"], REDACTED_MESSAGE);
}

#[test]
fn test_bytes_are_base64_encoded() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/bytes")
            .handler(Handler::from_fn(|_ctx| vec![0u8, 1u8])),
    )
    .unwrap();

    let body = body_json(&app.handle(IncomingRequest::get("/bytes")));
    assert_eq!(body["data"], json!({"base64": "AAE="}));
}

#[test]
fn test_xml_format_hint() {
    let mut app = app();
    app.route(Endpoint::builder().path("/hello").handler(hello()))
        .unwrap();

    let res = app.handle(IncomingRequest::get("/hello?format=xml"));
    assert_eq!(res.status, 200);
    assert_eq!(res.content_type(), Some("application/xml"));
    let body = body_text(&res);
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<success>true</success>"));
    assert!(body.contains("<data><hello>world</hello></data>"));
}

#[test]
fn test_minify_hint() {
    let mut app = app();
    app.route(Endpoint::builder().path("/hello").handler(hello()))
        .unwrap();

    let compact = body_text(&app.handle(IncomingRequest::get("/hello")));
    let pretty = body_text(&app.handle(IncomingRequest::get("/hello?minify=0")));
    assert!(!compact.contains('\n'));
    assert!(pretty.contains('\n'));
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&compact).unwrap(),
        serde_json::from_str::<serde_json::Value>(&pretty).unwrap()
    );
}

#[test]
fn test_data_shapes() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/text")
            .handler(Handler::from_fn(|_ctx| "plain")),
    )
    .unwrap();
    app.route(
        Endpoint::builder()
            .path("/list")
            .handler(Handler::from_fn(|_ctx| json!([1, 2, 3]))),
    )
    .unwrap();
    app.route(
        Endpoint::builder()
            .path("/nothing")
            .handler(Handler::from_fn(|_ctx| ())),
    )
    .unwrap();
    app.route(
        Endpoint::builder()
            .path("/number")
            .handler(Handler::from_fn(|_ctx| json!(42))),
    )
    .unwrap();

    let data = |path: &str| body_json(&app.handle(IncomingRequest::get(path)))["data"].clone();
    assert_eq!(data("/text"), json!({"message": "plain"}));
    assert_eq!(data("/list"), json!({"array": [1, 2, 3]}));
    assert_eq!(data("/nothing"), json!({}));
    assert_eq!(data("/number"), json!({"message": "42"}));
}

#[test]
fn test_tuple_sets_the_code() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/items")
            .methods(["POST"])
            .handler(Handler::from_fn(|_ctx| (json!({"id": 7}), 201u16))),
    )
    .unwrap();

    let res = app.handle(IncomingRequest::post("/items"));
    assert_eq!(res.status, 201);
    assert_eq!(body_json(&res)["data"], json!({"id": 7}));
}

#[test]
fn test_mapping_of_response_fields() {
    let mut app = app();
    app.route(Endpoint::builder().path("/made").handler(Handler::from_fn(|_ctx| {
        json!({"data": {"id": 1}, "code": 202, "headers": {"X-Trace": "abc"}})
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/made"));
    assert_eq!(res.status, 202);
    assert_eq!(res.get_header("x-trace"), Some("abc"));
    assert_eq!(body_json(&res)["data"], json!({"id": 1}));
}

#[test]
fn test_explicit_response_headers_and_cookies() {
    use nasse::response::ResponseCookie;

    let mut app = app();
    app.route(Endpoint::builder().path("/login").handler(Handler::from_fn(|_ctx| {
        Response::new(json!({"ok": true}))
            .code(201)
            .message("Logged in")
            .header("Location", "/me")
            .cookie(ResponseCookie::new("session", "abc").http_only(true))
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/login"));
    assert_eq!(res.status, 201);
    assert_eq!(res.get_header("location"), Some("/me"));
    let cookie = res.get_header("set-cookie").unwrap();
    assert!(cookie.starts_with("session=abc"));
    assert!(cookie.contains("HttpOnly"));
    let body = body_json(&res);
    assert_eq!(body["message"], "Logged in");
    assert_eq!(body["success"], true);
}

#[test]
fn test_response_exception_overrides_code() {
    let mut app = app();
    app.route(Endpoint::builder().path("/dup").handler(Handler::from_fn(|_ctx| {
        Response::new(json!({"existing": 3}))
            .exception(Exception::new("CONFLICT", "Already exists", 409))
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/dup"));
    assert_eq!(res.status, 409);
    let body = body_json(&res);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "CONFLICT");
    assert_eq!(body["message"], "Already exists");
    assert_eq!(body["data"], json!({"existing": 3}));
}

#[test]
fn test_http_exception_keeps_status() {
    let mut app = app();
    app.route(Endpoint::builder().path("/tea").handler(Handler::from_fn(|_ctx| {
        Err::<&str, _>(HttpException::new(http::StatusCode::IM_A_TEAPOT).with_description("Short and stout"))
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/tea"));
    assert_eq!(res.status, 418);
    let body = body_json(&res);
    assert_eq!(body["error"], "I_M_A_TEAPOT");
    assert_eq!(body["message"], "Short and stout");
}

#[test]
fn test_file_like_content() {
    let mut app = app();
    app.route(Endpoint::builder().path("/notes").handler(Handler::from_fn(|_ctx| {
        FileLike::text(Cursor::new(b"remember the milk".to_vec()))
    })))
    .unwrap();

    let body = body_json(&app.handle(IncomingRequest::get("/notes")));
    assert_eq!(body["data"], json!({"content": "remember the milk"}));
}

#[test]
fn test_raw_endpoint_skips_envelope() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/robots.txt")
            .raw()
            .handler(Handler::from_fn(|_ctx| {
                Response::new("User-agent: *").content_type("text/plain")
            })),
    )
    .unwrap();

    let res = app.handle(IncomingRequest::get("/robots.txt"));
    assert_eq!(res.status, 200);
    assert_eq!(body_text(&res), "User-agent: *");
    assert_eq!(res.content_type(), Some("text/plain"));
}

#[test]
fn test_raw_outgoing_response_passes_through() {
    let mut app = app();
    app.route(Endpoint::builder().path("/legacy").handler(Handler::from_fn(|_ctx| {
        nasse::response::OutgoingResponse::text(299, "untouched")
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/legacy"));
    assert_eq!(res.status, 299);
    assert_eq!(body_text(&res), "untouched");
}

#[test]
fn test_not_found() {
    let app = app();
    let res = app.handle(IncomingRequest::get("/nowhere"));
    assert_eq!(res.status, 404);
    let body = body_json(&res);
    assert_eq!(body["error"], "NOT_FOUND");
    assert!(body.get("debug").is_none());
}

#[test]
fn test_not_found_has_no_debug_block_in_debug_mode() {
    let app = debug_app();
    let body = body_json(&app.handle(IncomingRequest::get("/nowhere")));
    assert_eq!(body["error"], "NOT_FOUND");
    assert!(body.get("debug").is_none());
}

#[test]
fn test_method_not_allowed() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/hello")
            .methods(["GET"])
            .handler(hello()),
    )
    .unwrap();

    let res = app.handle(IncomingRequest::post("/hello"));
    assert_eq!(res.status, 405);
    assert_eq!(body_json(&res)["error"], "METHOD_NOT_ALLOWED");
}

#[test]
fn test_head_uses_get_without_body() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/hello")
            .methods(["GET"])
            .handler(hello()),
    )
    .unwrap();

    let res = app.handle(IncomingRequest::new(http::Method::HEAD, "/hello"));
    assert_eq!(res.status, 200);
    assert!(res.body.is_empty());
    assert_eq!(res.content_type(), Some("application/json"));
}

#[test]
fn test_automatic_options_response() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/hello")
            .methods(["GET", "POST"])
            .handler(hello()),
    )
    .unwrap();

    let res = app.handle(
        IncomingRequest::new(http::Method::OPTIONS, "/hello")
            .header("Origin", "https://client.example"),
    );
    assert_eq!(res.status, 204);
    assert!(res.body.is_empty());
    assert_eq!(res.get_header("access-control-allow-methods"), Some("GET, POST"));
}

#[test]
fn test_payload_too_large() {
    let config = Config {
        max_request_size: 8,
        ..Config::named("Demo")
    };
    let mut app = App::new(config);
    app.route(
        Endpoint::builder()
            .path("/upload")
            .methods(["POST"])
            .handler(Handler::from_fn(|_ctx| "stored")),
    )
    .unwrap();

    let res = app.handle(IncomingRequest::post("/upload").body(vec![b'x'; 9]));
    assert_eq!(res.status, 413);
    assert_eq!(body_json(&res)["error"], "PAYLOAD_TOO_LARGE");

    let res = app.handle(IncomingRequest::post("/upload").body(vec![b'x'; 8]));
    assert_eq!(res.status, 200);
}

#[test]
fn test_most_specific_route_wins() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/users/<id>")
            .handler(Handler::from_fn(|ctx| {
                json!({"route": "dynamic", "id": ctx.dynamics().get_str("id")})
            })),
    )
    .unwrap();
    app.route(
        Endpoint::builder()
            .path("/users/me")
            .handler(Handler::from_fn(|_ctx| json!({"route": "static"}))),
    )
    .unwrap();

    let me = body_json(&app.handle(IncomingRequest::get("/users/me")));
    assert_eq!(me["data"]["route"], "static");
    let other = body_json(&app.handle(IncomingRequest::get("/users/42")));
    assert_eq!(other["data"], json!({"route": "dynamic", "id": "42"}));
}

#[test]
fn test_envelope_shape() {
    let mut app = app();
    app.route(Endpoint::builder().path("/hello").handler(hello()))
        .unwrap();
    app.route(
        Endpoint::builder()
            .path("/greet")
            .param(Parameter::new("name"))
            .handler(hello()),
    )
    .unwrap();

    for target in ["/hello", "/greet", "/nowhere", "/hello?format=json"] {
        let body = body_json(&app.handle(IncomingRequest::get(target)));
        let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["success", "error", "data"] {
            assert!(keys.contains(&key), "{target}: missing {key}");
        }
        assert!(keys
            .iter()
            .all(|k| ["success", "error", "data", "message", "debug"].contains(k)));
        assert_eq!(body["success"].as_bool().unwrap(), body["error"].is_null());
    }
}

#[test]
fn test_many_query_keys_resolve_quickly() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/count")
            .handler(Handler::from_fn(|ctx| json!({"keys": ctx.values().len()}))),
    )
    .unwrap();

    let query: Vec<String> = (0..40_000).map(|i| format!("k{i}=v")).collect();
    let target = format!("/count?{}", query.join("&"));

    let started = std::time::Instant::now();
    let res = app.handle(IncomingRequest::get(&target));
    let elapsed = started.elapsed();

    assert_eq!(res.status, 200);
    assert_eq!(body_json(&res)["data"]["keys"], 40_000);
    assert!(elapsed.as_secs() < 5, "took {elapsed:?}");
}
