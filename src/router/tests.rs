use super::{Converter, PathPattern, Router, Segment, TransportStyle};
use crate::error::NasseError;
use serde_json::{json, Value};

fn router(patterns: &[&str]) -> Router<usize> {
    let mut router = Router::new();
    for (idx, p) in patterns.iter().enumerate() {
        router.insert(PathPattern::parse(p).unwrap(), idx);
    }
    router
}

#[test]
fn test_root_path() {
    let router = router(&["/"]);
    let m = router.resolve("/").unwrap();
    assert_eq!(*m.value, 0);
    assert!(m.captures.is_empty());
}

#[test]
fn test_segment_parsing() {
    let pattern = PathPattern::parse("/users/<id>/pages/<int:page>").unwrap();
    assert_eq!(pattern.dynamic_count(), 2);
    assert_eq!(
        pattern.segments()[1],
        Segment::Dynamic {
            name: "id".into(),
            kind: "str".into()
        }
    );
    assert_eq!(pattern.dynamic_names().collect::<Vec<_>>(), vec!["id", "page"]);
}

#[test]
fn test_pattern_must_start_with_slash() {
    let err = PathPattern::parse("hello").unwrap_err();
    assert_eq!(err.error_name(), "CONVERSION_ERROR");
}

#[test]
fn test_typed_captures() {
    let router = router(&["/pages/<int:page>", "/ratio/<float:value>"]);
    assert_eq!(router.resolve("/pages/42").unwrap().captures["page"], json!(42));
    assert_eq!(router.resolve("/ratio/0.5").unwrap().captures["value"], json!(0.5));
}

#[test]
fn test_cast_failure_is_validation_error() {
    let router = router(&["/pages/<int:page>"]);
    let err = router.resolve("/pages/x").unwrap_err();
    assert!(matches!(err, NasseError::Validation { ref name, .. } if name == "page"));
    assert_eq!(err.code(), 400);
}

#[test]
fn test_segment_count_mismatch_is_not_found() {
    let router = router(&["/pages/<int:page>"]);
    let err = router.resolve("/pages/1/2").unwrap_err();
    assert!(matches!(err, NasseError::NotFound { .. }));
}

#[test]
fn test_literal_beats_dynamic() {
    let router = router(&["/pages/<page>", "/pages/latest"]);
    assert_eq!(*router.resolve("/pages/latest").unwrap().value, 1);
    assert_eq!(*router.resolve("/pages/first").unwrap().value, 0);
}

#[test]
fn test_ties_go_to_registration_order() {
    let router = router(&["/a/<x>", "/a/<int:y>"]);
    assert_eq!(*router.resolve("/a/3").unwrap().value, 0);
}

#[test]
fn test_successful_match_beats_cast_failure() {
    let router = router(&["/a/<int:y>", "/a/<name>"]);
    let m = router.resolve("/a/bob").unwrap();
    assert_eq!(*m.value, 1);
}

#[test]
fn test_unknown_type_falls_back_to_str() {
    let router = router(&["/files/<uuid:id>"]);
    assert_eq!(router.resolve("/files/abc").unwrap().captures["id"], json!("abc"));
}

#[test]
fn test_user_extensible_converter() {
    let mut router = router(&["/flags/<bool:on>"]);
    router.register_converter(
        "bool",
        Converter::new("bool", |raw| match raw {
            "yes" => Ok(Value::Bool(true)),
            "no" => Ok(Value::Bool(false)),
            _ => Err(format!("'{raw}' is not yes/no")),
        }),
    );
    assert_eq!(router.resolve("/flags/yes").unwrap().captures["on"], json!(true));
    assert!(router.resolve("/flags/maybe").is_err());
}

#[test]
fn test_replacing_pattern_keeps_single_entry() {
    let mut router = router(&["/hello"]);
    let previous = router.insert(PathPattern::parse("/hello").unwrap(), 7);
    assert_eq!(previous, Some(0));
    assert_eq!(router.len(), 1);
    assert_eq!(*router.resolve("/hello/").unwrap().value, 7);
}

#[test]
fn test_transport_projection() {
    let router = router(&["/users/<id>/pages/<int:page>"]);
    assert_eq!(
        router.transport_paths(TransportStyle::Angle),
        vec!["/users/<string:id>/pages/<int:page>".to_string()]
    );
    assert_eq!(
        router.transport_paths(TransportStyle::Brace),
        vec!["/users/{id}/pages/{page}".to_string()]
    );
}

#[test]
fn test_render_round_trip() {
    let router = router(&["/users/<id>/pages/<int:page>"]);
    let (pattern, _) = router.iter().next().unwrap();
    let mut values = serde_json::Map::new();
    values.insert("id".into(), json!("alice"));
    values.insert("page".into(), json!(3));
    let path = pattern.render(&values).unwrap();
    assert_eq!(path, "/users/alice/pages/3");
    assert_eq!(router.resolve(&path).unwrap().captures, values);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_render_then_resolve_round_trips(
            name in "[a-z][a-z0-9-]{0,12}",
            page in any::<i64>(),
            ratio in -1.0e6f64..1.0e6f64,
        ) {
            let router = router(&["/u/<name>/p/<int:page>/r/<float:ratio>"]);
            let (pattern, _) = router.iter().next().unwrap();
            let mut values = serde_json::Map::new();
            values.insert("name".into(), json!(name));
            values.insert("page".into(), json!(page));
            values.insert("ratio".into(), json!(ratio));
            let path = pattern.render(&values).unwrap();
            prop_assert_eq!(router.resolve(&path).unwrap().captures, values);
        }

        #[test]
        fn prop_fewest_dynamic_segments_wins(word in "[a-z]{1,8}", order in 0usize..6) {
            let mut patterns = vec![
                "/<a>/<b>".to_string(),
                format!("/{word}/<b>"),
                format!("/{word}/fixed"),
            ];
            patterns.rotate_left(order % 3);
            let refs: Vec<&str> = patterns.iter().map(String::as_str).collect();
            let router = router(&refs);
            let m = router.resolve(&format!("/{word}/fixed")).unwrap();
            prop_assert_eq!(m.pattern.dynamic_count(), 0);
            let m = router.resolve(&format!("/{word}/other")).unwrap();
            prop_assert_eq!(m.pattern.dynamic_count(), 1);
        }
    }
}
