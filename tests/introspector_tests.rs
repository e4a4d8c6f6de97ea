//! Schema introspection, the metadata cache and JSON-loaded schemas

use fieldpath::model::{Cardinality, Kind};
use fieldpath::{ErrorKind, FieldPathParser, SchemaCache, SchemaRegistry, introspect, testing};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;
use std::thread;

const LIBRARY: &str = r#"[
    {
        "name": "library.Shelf",
        "fields": [
            {"name": "name", "kind": "string", "behaviors": ["IDENTIFIER"]},
            {"name": "theme", "kind": "string", "behaviors": ["OPTIONAL"]},
            {"name": "books", "kind": "message", "cardinality": "repeated", "message_type": "library.Book"},
            {"name": "labels", "kind": "string", "cardinality": "map", "map_key": "string"},
            {"name": "create_time", "kind": "message", "message_type": "google.protobuf.Timestamp",
             "behaviors": ["OUTPUT_ONLY"]}
        ]
    },
    {
        "name": "library.Book",
        "fields": [
            {"name": "title", "kind": "string", "query": {"weight": 3}},
            {"name": "pages", "kind": "int32", "query": {"ordering_forbidden": true}}
        ]
    }
]"#;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_metadata_covers_reachable_types() {
    let registry = testing::registry();
    let metadata = introspect(&registry, testing::MESSAGE).unwrap();
    assert_eq!(metadata.root_name(), testing::MESSAGE);
    let mut names: Vec<&str> = metadata.message_names().collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "google.protobuf.Duration",
            "google.protobuf.Timestamp",
            testing::MESSAGE,
            testing::NODE,
            testing::POINT,
            testing::SUB,
        ]
    );
}

#[rstest]
#[case::singular_message("sub", true)]
#[case::required_message("required_point", false)]
#[case::explicit("nullable_str", true)]
#[case::plain_scalar("str", false)]
#[case::repeated_message("rp_sub", true)]
#[case::message_map("map_str_msg", true)]
#[case::repeated_scalar("rp_str", false)]
#[case::scalar_map("map_str_str", false)]
#[case::immutable("immutable_str", false)]
fn test_nullability(#[case] field: &str, #[case] nullable: bool) {
    let registry = testing::registry();
    let metadata = introspect(&registry, testing::MESSAGE).unwrap();
    let info = metadata.field(testing::MESSAGE, field).unwrap();
    assert_eq!(info.flags.nullable, nullable);
}

#[test]
fn test_oneof_members_are_flagged() {
    let registry = testing::registry();
    let metadata = introspect(&registry, testing::MESSAGE).unwrap();
    let member = metadata.field(testing::MESSAGE, "one_str").unwrap();
    assert!(member.flags.is_oneof);
    assert_eq!(member.oneof.as_deref(), Some("choice"));
}

#[test]
fn test_unknown_root_is_internal_error() {
    let registry = testing::registry();
    let err = introspect(&registry, "test.Missing").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InternalError);
}

#[test]
fn test_dangling_message_reference() {
    let registry = SchemaRegistry::from_json(
        r#"[{"name": "a.A", "fields": [{"name": "b", "kind": "message", "message_type": "a.B"}]}]"#,
    )
    .unwrap();
    let err = introspect(&registry, "a.A").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InternalError);
}

#[test]
fn test_json_schema_drives_every_parser() {
    init_logger();
    let registry = SchemaRegistry::from_json(LIBRARY).unwrap();
    let metadata = introspect(&registry, "library.Shelf").unwrap();
    let books = metadata.field("library.Shelf", "books").unwrap();
    assert_eq!(books.cardinality, Cardinality::Repeated);
    assert_eq!(books.kind, Kind::Message);
    assert!(metadata.field("library.Shelf", "theme").unwrap().flags.nullable);

    let mut parser = FieldPathParser::new(&registry, "library.Shelf").unwrap();
    let select = parser.parse_select(&["books.*.title", "labels.fiction"]).unwrap().unwrap();
    assert_eq!(select.paths(), vec!["books.title", "labels.fiction"]);
    assert_eq!(select.total_complexity(), 1 + 3 + 1);

    let err = parser.parse_order_by("books").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidField);
    assert_eq!(parser.parse_order_by("name desc").unwrap().to_string(), "name desc");

    let shelf = fieldpath::MessageValue::new("library.Shelf").with("name", "shelves/1");
    let err = parser.parse_update(&shelf, &["create_time"]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidField);
}

#[test]
fn test_invalid_json_schema() {
    let err = SchemaRegistry::from_json("{not json").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InternalError);
}

#[test]
fn test_cache_shared_across_threads() {
    init_logger();
    let registry = Arc::new(testing::registry());
    let cache = SchemaCache::new();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let cache = cache.clone();
            thread::spawn(move || {
                let mut parser =
                    FieldPathParser::with_cache(registry.as_ref(), testing::MESSAGE, cache).unwrap();
                parser.parse_select(&["sub.name"]).unwrap().unwrap().paths()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec!["sub.name"]);
    }
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().hits() + cache.stats().misses(), 4);
}
