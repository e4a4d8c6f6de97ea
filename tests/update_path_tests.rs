//! Update-mask parsing and value extraction

use chrono::{DateTime, TimeDelta};
use fieldpath::ast::{ArrayExpr, MapEntryExpr, MapValueExpr};
use fieldpath::{
    ErrorKind, FieldPathParser, MessageValue, ParserConfig, UpdateExpr, UpdateValue, Value,
    ValueExpr, testing,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn update_with(
    config: ParserConfig,
    message: &MessageValue,
    paths: &[&str],
) -> fieldpath::Result<UpdateExpr> {
    let registry = testing::registry();
    FieldPathParser::new(&registry, testing::MESSAGE)?
        .with_config(config)
        .parse_update(message, paths)
}

fn update(paths: &[&str]) -> fieldpath::Result<UpdateExpr> {
    update_with(ParserConfig::default(), &testing::message(), paths)
}

fn value_at(expr: &UpdateExpr, path: &str) -> UpdateValue {
    expr.get(path)
        .unwrap_or_else(|| panic!("no element for {path}"))
        .value
        .clone()
}

fn scalar(value: ValueExpr) -> UpdateValue {
    UpdateValue::Value(value)
}

#[test]
fn test_string_field() {
    let expr = update(&["str"]).unwrap();
    assert_eq!(expr.len(), 1);
    assert_eq!(value_at(&expr, "str"), scalar(ValueExpr::String("test".into())));
}

#[test]
fn test_nested_fields_keep_mask_order() {
    let expr = update(&["point.y", "point.x"]).unwrap();
    let paths: Vec<String> = expr.iter().map(|e| e.field.to_string()).collect();
    assert_eq!(paths, vec!["point.y", "point.x"]);
    assert!(expr.iter().all(|e| e.field.field == "point" && e.field.next().is_some()));
    assert_eq!(value_at(&expr, "point.x"), scalar(ValueExpr::Int32(42)));
    assert_eq!(value_at(&expr, "point.y"), scalar(ValueExpr::Double(43.24)));
}

#[rstest]
#[case("i32", ValueExpr::Int32(42))]
#[case("i64", ValueExpr::Int64(-7))]
#[case("u32", ValueExpr::Uint32(7))]
#[case("u64", ValueExpr::Uint64(8))]
#[case("float", ValueExpr::Float(1.5))]
#[case("double", ValueExpr::Double(2.25))]
#[case("bool", ValueExpr::Bool(true))]
#[case("bytes", ValueExpr::Bytes(b"raw".to_vec()))]
#[case("enum", ValueExpr::Enum(2))]
fn test_scalar_kinds(#[case] path: &str, #[case] expected: ValueExpr) {
    let expr = update(&[path]).unwrap();
    assert_eq!(value_at(&expr, path), scalar(expected));
}

#[test]
fn test_map_entry_by_key() {
    let expr = update(&["sub.map_i32_str.653"]).unwrap();
    assert_eq!(
        value_at(&expr, "sub.map_i32_str.653"),
        scalar(ValueExpr::String("six".into()))
    );
}

#[rstest]
#[case::integer("map_str_str.653", "map_str_str.\"653\"", "six")]
#[case::boolean("map_str_str.true", "map_str_str.\"true\"", "yes")]
fn test_string_map_key_spelled_as_literal(
    #[case] path: &str,
    #[case] element: &str,
    #[case] expected: &str,
) {
    let message = MessageValue::new(testing::MESSAGE)
        .with("map_str_str", Value::map([("653", "six"), ("true", "yes")]));
    let expr = update_with(ParserConfig::default(), &message, &[path]).unwrap();
    assert_eq!(value_at(&expr, element), scalar(ValueExpr::String(expected.into())));
}

#[test]
fn test_missing_map_key_is_rejected() {
    let err = update(&["sub.map_i32_str.2"]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidField);
}

#[test]
fn test_message_map_value_sub_path() {
    let expr = update(&["map_str_msg.key.name"]).unwrap();
    assert_eq!(
        value_at(&expr, "map_str_msg.key.name"),
        scalar(ValueExpr::String("k".into()))
    );
}

#[test]
fn test_whole_map() {
    let expr = update(&["map_str_str"]).unwrap();
    assert_eq!(
        value_at(&expr, "map_str_str"),
        UpdateValue::Map(MapValueExpr {
            entries: vec![MapEntryExpr {
                key: ValueExpr::String("a".into()),
                value: scalar(ValueExpr::String("b".into())),
            }],
        })
    );
}

#[test]
fn test_scalar_list() {
    let expr = update(&["rp_i64"]).unwrap();
    assert_eq!(
        value_at(&expr, "rp_i64"),
        UpdateValue::Array(ArrayExpr {
            values: vec![Some(ValueExpr::Int64(1)), Some(ValueExpr::Int64(2))],
        })
    );
}

#[test]
fn test_message_list() {
    let expr = update(&["rp_sub"]).unwrap();
    let UpdateValue::ArrayUpdate(array) = value_at(&expr, "rp_sub") else {
        panic!("expected array of updates");
    };
    assert_eq!(array.values.len(), 2);
    let first = array.values[0].as_ref().unwrap();
    assert_eq!(value_at(first, "name"), scalar(ValueExpr::String("a".into())));
}

#[test]
fn test_time_types() {
    let expr = update(&["ts", "dur"]).unwrap();
    let expected = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    assert_eq!(value_at(&expr, "ts"), scalar(ValueExpr::Timestamp(expected)));
    assert_eq!(
        value_at(&expr, "dur"),
        scalar(ValueExpr::Duration(TimeDelta::seconds(5)))
    );
}

#[test]
fn test_unset_nullable_ancestor_is_null() {
    let expr = update(&["node.name"]).unwrap();
    assert_eq!(value_at(&expr, "node.name"), scalar(ValueExpr::Null));
}

#[test]
fn test_unset_fields() {
    let expr = update(&["nullable_str", "one_i32"]).unwrap();
    assert_eq!(value_at(&expr, "nullable_str"), scalar(ValueExpr::Null));
    assert_eq!(value_at(&expr, "one_i32"), scalar(ValueExpr::Int32(0)));

    let empty = MessageValue::new(testing::MESSAGE);
    let expr = update_with(ParserConfig::default(), &empty, &["rp_str", "map_str_str", "str"]).unwrap();
    assert_eq!(value_at(&expr, "rp_str"), UpdateValue::Array(ArrayExpr::default()));
    assert_eq!(value_at(&expr, "map_str_str"), UpdateValue::Map(MapValueExpr::default()));
    assert_eq!(value_at(&expr, "str"), scalar(ValueExpr::String(String::new())));
}

#[test]
fn test_unset_message_collections_are_null() {
    let empty = MessageValue::new(testing::MESSAGE);
    let expr = update_with(ParserConfig::default(), &empty, &["rp_sub", "map_str_msg"]).unwrap();
    assert_eq!(value_at(&expr, "rp_sub"), scalar(ValueExpr::Null));
    assert_eq!(value_at(&expr, "map_str_msg"), scalar(ValueExpr::Null));
}

#[test]
fn test_unset_required_message() {
    let empty = MessageValue::new(testing::MESSAGE);
    let err = update_with(ParserConfig::default(), &empty, &["required_point.x"]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidField);
}

#[test]
fn test_message_wildcard_enumerates_updatable_fields() {
    let expr = update(&["sub.*"]).unwrap();
    let UpdateValue::Update(sub) = value_at(&expr, "sub") else {
        panic!("expected nested update");
    };
    let names: Vec<String> = sub.iter().map(|e| e.field.to_string()).collect();
    assert_eq!(names, vec!["name", "i32", "map_i32_str", "no_order"]);
}

#[test]
fn test_root_wildcard() {
    let expr = update(&["*"]).unwrap();
    assert!(expr.get("str").is_some());
    assert!(expr.get("one_str").is_some());
    assert!(expr.get("one_i32").is_none());
    assert!(expr.get("output_only_str").is_none());
    assert!(expr.get("immutable_str").is_none());
    assert_eq!(value_at(&expr, "node"), scalar(ValueExpr::Null));
}

#[test]
fn test_duplicate_paths_are_idempotent() {
    assert_eq!(update(&["str", "str"]).unwrap(), update(&["str"]).unwrap());
}

#[rstest]
#[case::output_only("output_only_str")]
#[case::immutable("immutable_str")]
#[case::nested_output_only("sub.output_only_i64")]
fn test_non_updatable_fields(#[case] path: &str) {
    let err = update(&[path]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidField);

    let lenient = ParserConfig::new().with_ignore_non_updatable(true);
    let expr = update_with(lenient, &testing::message(), &[path, "str"]).unwrap();
    assert_eq!(expr.len(), 1);
    assert!(expr.get("str").is_some());
}

#[rstest]
#[case::unknown_field("nope", ErrorKind::InvalidField)]
#[case::repeated_not_last("rp_sub.name", ErrorKind::InvalidSyntax)]
#[case::scalar_has_no_children("str.x", ErrorKind::InvalidSyntax)]
#[case::wrong_key_kind("map_bool_i32.x", ErrorKind::InvalidSyntax)]
#[case::wildcard_not_last("*.str", ErrorKind::InvalidSyntax)]
fn test_rejected_paths(#[case] path: &str, #[case] kind: ErrorKind) {
    let err = update(&[path]).unwrap_err();
    assert_eq!(err.kind, kind, "{err}");
    assert_eq!(err.path.as_deref(), Some(path));
}

#[test]
fn test_message_of_another_type() {
    let err = update_with(ParserConfig::default(), &testing::point(1, 2.0), &["str"]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InternalError);
}

#[test]
fn test_free_function_uses_message_type() {
    let registry = testing::registry();
    let expr = fieldpath::parse_update(&registry, &testing::point(3, 4.5), &["x"]).unwrap();
    assert_eq!(value_at(&expr, "x"), scalar(ValueExpr::Int32(3)));
}
