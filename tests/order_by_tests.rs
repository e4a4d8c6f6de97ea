//! Order-by clause parsing

use fieldpath::{ErrorKind, FieldPathParser, OrderByExpr, SortOrder, testing};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn order_by(text: &str) -> fieldpath::Result<OrderByExpr> {
    let registry = testing::registry();
    FieldPathParser::new(&registry, testing::MESSAGE)?.parse_order_by(text)
}

#[test]
fn test_two_keys_with_directions() {
    let expr = order_by("i64 ASC, float DESC").unwrap();
    assert_eq!(expr.len(), 2);
    assert_eq!(expr.fields[0].field.field, "i64");
    assert_eq!(expr.fields[0].order, SortOrder::Asc);
    assert_eq!(expr.fields[1].field.field, "float");
    assert_eq!(expr.fields[1].order, SortOrder::Desc);
}

#[rstest]
#[case("i64", "i64 asc")]
#[case("str", "str asc")]
#[case("str desc", "str desc")]
#[case("  str   Desc ,i32", "str desc, i32 asc")]
#[case("sub.name desc", "sub.name desc")]
#[case("point", "point asc")]
#[case("one_str", "one_str asc")]
#[case("desc", "desc asc")]
#[case("desc asc", "desc asc")]
fn test_normalized_clause(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(order_by(text).unwrap().to_string(), expected);
}

#[test]
fn test_nested_selector_chain() {
    let expr = order_by("sub.i32").unwrap();
    let sub = &expr.fields[0].field;
    assert_eq!(sub.message, testing::MESSAGE);
    let i32_field = sub.next().unwrap();
    assert_eq!(i32_field.message, testing::SUB);
    assert!(i32_field.is_leaf());
}

#[test]
fn test_complexity() {
    let expr = order_by("weighted, sub.name").unwrap();
    assert_eq!(expr.total_complexity(), 7);
}

#[rstest]
#[case::empty("", ErrorKind::InvalidSyntax)]
#[case::blank("   ", ErrorKind::InvalidSyntax)]
#[case::trailing_comma("str,", ErrorKind::InvalidSyntax)]
#[case::two_directions("str asc desc", ErrorKind::InvalidSyntax)]
#[case::missing_comma("str i32", ErrorKind::InvalidSyntax)]
#[case::scalar_has_no_children("str.x", ErrorKind::InvalidSyntax)]
#[case::wildcard("*", ErrorKind::InvalidSyntax)]
#[case::unknown_field("nope", ErrorKind::InvalidField)]
#[case::repeated("rp_str", ErrorKind::InvalidField)]
#[case::map("map_str_str", ErrorKind::InvalidField)]
#[case::forbidden("no_order", ErrorKind::SortingForbidden)]
#[case::nested_forbidden("sub.no_order desc", ErrorKind::SortingForbidden)]
fn test_rejected_clauses(#[case] text: &str, #[case] kind: ErrorKind) {
    let err = order_by(text).unwrap_err();
    assert_eq!(err.kind, kind, "{err}");
}

#[test]
fn test_error_code_is_stable() {
    let err = order_by("no_order").unwrap_err();
    assert_eq!(err.code.to_string(), "FP0004");
}
