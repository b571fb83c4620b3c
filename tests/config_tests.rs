use std::io::Write;

use nasse::config::Config;
use nasse::prelude::*;
use tempfile::NamedTempFile;

#[test]
fn test_config_from_yaml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "name: Pet Shop\nport: 9000\ndebug: false\ncors:\n  - shop.example\n  - http://localhost:8080/\nmax_request_size: 1024\nserver_header: \"{{{{ id }}}}\""
    )
    .unwrap();

    let config = Config::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.name, "Pet Shop");
    assert_eq!(config.id, "petshop");
    assert_eq!(config.port, 9000);
    assert_eq!(
        config.cors,
        vec!["https://shop.example", "http://localhost:8080"]
    );
    assert_eq!(config.max_request_size, 1024);

    let app = App::new(config);
    assert_eq!(app.server_header(), "petshop");
}

#[test]
fn test_cors_boolean_forms() {
    assert_eq!(Config::from_yaml_str("cors: true").unwrap().cors, vec!["*"]);
    assert!(Config::from_yaml_str("cors: false").unwrap().cors.is_empty());
    assert_eq!(
        Config::from_yaml_str("cors: api.example").unwrap().cors,
        vec!["https://api.example"]
    );
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_yaml_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read configuration file"));
}

#[test]
fn test_debug_mode_from_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = format!("debug: true\nbase_dir: {}\n", dir.path().display());
    let config = Config::from_yaml_str(&yaml).unwrap();
    assert!(config.debug);
    assert_eq!(config.log_level, "DEBUG");
    assert_eq!(config.log_file, Some(dir.path().join("nasse.debug.log")));
}

#[test]
fn test_invalid_server_header_falls_back() {
    let config = Config {
        server_header: "{{ unclosed".into(),
        ..Config::named("Demo")
    };
    let app = App::new(config);
    assert_eq!(
        app.server_header(),
        format!("Demo/{}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_sanitize_flag_from_yaml() {
    let config = Config::from_yaml_str("name: Raw\nsanitize: false").unwrap();
    let mut app = App::new(config);
    app.route(
        Endpoint::builder()
            .path("/echo")
            .handler(Handler::from_fn(|ctx| ctx.values().to_json())),
    )
    .unwrap();

    let res = app.handle(IncomingRequest::get("/echo?x=%3Cu%3Ex%3C%2Fu%3E"));
    let body: serde_json::Value = serde_json::from_slice(&res.body).unwrap();
    assert_eq!(body["data"]["x"], "<u>x</u>");
}
