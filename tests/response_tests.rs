mod common;

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex};

use common::{app, body_json};
use nasse::prelude::*;
use nasse::response::FileLike;
use serde_json::json;

#[test]
fn test_file_cursor_is_preserved() {
    let mut tmp = tempfile::tempfile().unwrap();
    tmp.write_all(&[9, 9, 0, 1]).unwrap();
    tmp.seek(SeekFrom::Start(2)).unwrap();
    // A cloned handle shares the cursor with the original.
    let shared: Arc<Mutex<File>> = Arc::new(Mutex::new(tmp));

    let mut app = app();
    let for_handler = Arc::clone(&shared);
    app.route(Endpoint::builder().path("/blob").handler(Handler::from_fn(move |_ctx| {
        let handle = for_handler.lock().unwrap().try_clone()?;
        Ok::<_, Exception>(FileLike::binary(handle))
    })))
    .unwrap();

    let body = body_json(&app.handle(IncomingRequest::get("/blob")));
    assert_eq!(body["data"], json!({"base64": "AAE="}));
    let position = shared.lock().unwrap().stream_position().unwrap();
    assert_eq!(position, 2);

    // Reading again yields the same content.
    let body = body_json(&app.handle(IncomingRequest::get("/blob")));
    assert_eq!(body["data"], json!({"base64": "AAE="}));
}

#[test]
fn test_text_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "line one\nline two").unwrap();

    let mut app = app();
    app.route(Endpoint::builder().path("/notes").handler(Handler::from_fn(move |_ctx| {
        Ok::<_, Exception>(FileLike::text(File::open(&path)?))
    })))
    .unwrap();

    let body = body_json(&app.handle(IncomingRequest::get("/notes")));
    assert_eq!(body["data"], json!({"content": "line one\nline two"}));
}

#[test]
fn test_unreadable_file_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.bin");

    let mut app = app();
    app.route(Endpoint::builder().path("/absent").handler(Handler::from_fn(move |_ctx| {
        Ok::<_, Exception>(FileLike::binary(File::open(&missing)?))
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/absent"));
    assert_eq!(res.status, 500);
    assert_eq!(body_json(&res)["error"], "ERROR");
}

#[test]
fn test_mapping_with_cookie_list() {
    let mut app = app();
    app.route(Endpoint::builder().path("/prefs").handler(Handler::from_fn(|_ctx| {
        json!({
            "data": {"saved": true},
            "cookies": {"theme": "dark", "lang": "fr"}
        })
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/prefs"));
    let cookies: Vec<&str> = res.get_all_headers("set-cookie").collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().any(|c| c.starts_with("theme=dark")));
    assert!(cookies.iter().any(|c| c.starts_with("lang=fr")));
}

#[test]
fn test_iterable_outcome() {
    use nasse::response::Item;

    let mut app = app();
    app.route(Endpoint::builder().path("/items").handler(Handler::from_fn(|_ctx| {
        vec![Item::from(json!({"queued": 3})), Item::Code(202)]
    })))
    .unwrap();

    let res = app.handle(IncomingRequest::get("/items"));
    assert_eq!(res.status, 202);
    assert_eq!(body_json(&res)["data"], json!({"queued": 3}));
}

#[test]
fn test_into_http_response() {
    let mut app = app();
    app.route(
        Endpoint::builder()
            .path("/hello")
            .handler(Handler::from_fn(|_ctx| "hi")),
    )
    .unwrap();

    let res = app.handle(IncomingRequest::get("/hello")).into_http().unwrap();
    assert_eq!(res.status(), http::StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/json");
}
