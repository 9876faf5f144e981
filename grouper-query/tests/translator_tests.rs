use grouper_model::{Column, Filter, ObjectClassSchema, Scalar, TableSchema};
use grouper_query::{FilterTranslator, QueryError, ResourceQuery};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn group_schema() -> ObjectClassSchema {
    ObjectClassSchema::group("gr", vec!["level".into()])
}

fn group_tables(schema: &ObjectClassSchema) -> TableSchema {
    TableSchema::new()
        .with_table(schema.primary_table(), schema.primary_columns())
        .with_table(schema.membership_table(), schema.membership_columns())
}

fn translate(filter: &Filter) -> Result<String, QueryError> {
    let schema = group_schema();
    let tables = group_tables(&schema);
    FilterTranslator::new(&schema, &tables)
        .translate(filter, ResourceQuery::new())
        .map(|q| q.into_fragment().unwrap_or_default())
}

// ── leaves ───────────────────────────────────────────────────────

#[test]
fn equals_on_uid_is_unquoted() {
    assert_eq!(translate(&Filter::equals("__UID__", "34")).unwrap(), "gr_mp_groups.id_index = 34");
}

#[test]
fn equals_on_name_is_quoted() {
    assert_eq!(
        translate(&Filter::equals("__NAME__", "staff")).unwrap(),
        "gr_mp_groups.group_name = 'staff'"
    );
}

#[test]
fn text_values_escape_quotes() {
    assert_eq!(
        translate(&Filter::equals("description", "o'brien")).unwrap(),
        "gr_mp_groups.description = 'o''brien'"
    );
}

#[test]
fn like_variants_place_wildcards_and_cast() {
    assert_eq!(
        translate(&Filter::contains("__UID__", "4")).unwrap(),
        "gr_mp_groups.id_index::TEXT LIKE '%4%'"
    );
    assert_eq!(
        translate(&Filter::starts_with("__NAME__", "ab")).unwrap(),
        "gr_mp_groups.group_name::TEXT LIKE 'ab%'"
    );
    assert_eq!(
        translate(&Filter::ends_with("__NAME__", "yz")).unwrap(),
        "gr_mp_groups.group_name::TEXT LIKE '%yz'"
    );
}

#[test]
fn like_wildcards_in_values_are_escaped() {
    assert_eq!(
        translate(&Filter::contains("__NAME__", "a_b")).unwrap(),
        r"gr_mp_groups.group_name::TEXT LIKE '%a\_b%' ESCAPE '\'"
    );
    assert_eq!(
        translate(&Filter::starts_with("__NAME__", r"50%\")).unwrap(),
        r"gr_mp_groups.group_name::TEXT LIKE '50\%\\%' ESCAPE '\'"
    );
}

#[test]
fn ordering_operators() {
    assert_eq!(translate(&Filter::greater_than("last_modified", 5_i64)).unwrap(), "gr_mp_groups.last_modified > 5");
    assert_eq!(translate(&Filter::greater_or_equal("last_modified", 5_i64)).unwrap(), "gr_mp_groups.last_modified >= 5");
    assert_eq!(translate(&Filter::less_than("last_modified", 5_i64)).unwrap(), "gr_mp_groups.last_modified < 5");
    assert_eq!(translate(&Filter::less_or_equal("last_modified", 5_i64)).unwrap(), "gr_mp_groups.last_modified <= 5");
}

#[test]
fn membership_attribute_maps_to_native_column() {
    assert_eq!(
        translate(&Filter::equals("members", "12")).unwrap(),
        "gr_mp_memberships.subject_id_index = 12"
    );
}

#[test]
fn qualified_names_only_match_their_table() {
    assert_eq!(
        translate(&Filter::greater_than("gr_mp_memberships.last_modified", 0_i64)).unwrap(),
        "gr_mp_memberships.last_modified > 0"
    );
    assert!(matches!(
        translate(&Filter::equals("gr_mp_memberships.group_name", "x")),
        Err(QueryError::UnknownAttribute(_))
    ));
}

// ── composites ───────────────────────────────────────────────────

#[test]
fn and_parenthesizes_each_child() {
    let filter = Filter::and(vec![Filter::contains("__UID__", "4"), Filter::contains("__UID__", "3")]);
    assert_eq!(
        translate(&filter).unwrap(),
        "(gr_mp_groups.id_index::TEXT LIKE '%4%') AND (gr_mp_groups.id_index::TEXT LIKE '%3%')"
    );
}

#[test]
fn nested_composites_keep_precedence() {
    let filter = Filter::or(vec![
        Filter::equals("__UID__", "1"),
        Filter::and(vec![Filter::equals("__UID__", "2"), Filter::equals("__NAME__", "b")]),
    ]);
    assert_eq!(
        translate(&filter).unwrap(),
        "(gr_mp_groups.id_index = 1) OR ((gr_mp_groups.id_index = 2) AND (gr_mp_groups.group_name = 'b'))"
    );
}

#[test]
fn single_child_and_is_unwrapped() {
    let filter = Filter::and(vec![Filter::equals("__UID__", "1")]);
    assert_eq!(translate(&filter).unwrap(), "gr_mp_groups.id_index = 1");
}

#[test]
fn not_wraps_child() {
    let filter = Filter::not(Filter::equals("__UID__", "1"));
    assert_eq!(translate(&filter).unwrap(), "NOT (gr_mp_groups.id_index = 1)");
}

#[test]
fn translate_ands_onto_existing_query() {
    let schema = group_schema();
    let tables = group_tables(&schema);
    let existing = ResourceQuery::leaf("gr_mp_groups.deleted = 'F'");
    let out = FilterTranslator::new(&schema, &tables)
        .translate(&Filter::equals("__UID__", "1"), existing)
        .unwrap();
    assert_eq!(out.fragment(), Some("(gr_mp_groups.deleted = 'F') AND (gr_mp_groups.id_index = 1)"));
}

// ── errors ───────────────────────────────────────────────────────

#[test]
fn unknown_attribute_fails() {
    assert!(matches!(translate(&Filter::equals("shoe_size", "9")), Err(QueryError::UnknownAttribute(n)) if n == "shoe_size"));
}

#[test]
fn unsupported_filters_fail() {
    let ignore_case = Filter::EqualsIgnoreCase(grouper_model::FilterAttribute::new("__NAME__", "a"));
    assert!(matches!(translate(&ignore_case), Err(QueryError::NotImplemented(_))));
    assert!(matches!(translate(&Filter::Extended("x".into())), Err(QueryError::NotImplemented(_))));
}

#[test]
fn non_numeric_value_for_integer_column_fails() {
    assert!(matches!(
        translate(&Filter::equals("__UID__", "abc")),
        Err(QueryError::InvalidValue { .. })
    ));
}

#[test]
fn leaf_needs_exactly_one_value() {
    let filter = Filter::contains_all_values("members", vec![Scalar::from("1"), Scalar::from("2")]);
    assert!(matches!(translate(&filter), Err(QueryError::InvalidValue { .. })));
    let empty = Filter::contains_all_values("members", vec![]);
    assert!(matches!(translate(&empty), Err(QueryError::InvalidValue { .. })));
}

#[test]
fn empty_composite_fails() {
    assert!(matches!(translate(&Filter::and(vec![])), Err(QueryError::InvalidValue { .. })));
}

#[test]
fn subject_kind_uses_its_own_columns() {
    let schema = ObjectClassSchema::subject("gr", vec![]);
    let tables = TableSchema::new()
        .with_table(schema.primary_table(), schema.primary_columns())
        .with_table(schema.membership_table(), vec![Column::integer("group_id_index")]);
    let out = FilterTranslator::new(&schema, &tables)
        .translate(
            &Filter::and(vec![Filter::equals("__UID__", "3"), Filter::equals("member_of", "9")]),
            ResourceQuery::new(),
        )
        .unwrap();
    assert_eq!(
        out.fragment(),
        Some("(gr_mp_subjects.subject_id_index = 3) AND (gr_mp_memberships.group_id_index = 9)")
    );
}

// ── properties ───────────────────────────────────────────────────

fn leaf_strategy() -> impl Strategy<Value = Filter> {
    let value = "[a-z0-9]{1,6}";
    prop_oneof![
        value.prop_map(|v| Filter::equals("__NAME__", v)),
        value.prop_map(|v| Filter::contains("description", v)),
        value.prop_map(|v| Filter::starts_with("display_name", v)),
        value.prop_map(|v| Filter::ends_with("__NAME__", v)),
        any::<i64>().prop_map(|v| Filter::greater_than("last_modified", v)),
        any::<i64>().prop_map(|v| Filter::less_or_equal("__UID__", v)),
    ]
}

fn filter_strategy() -> impl Strategy<Value = Filter> {
    leaf_strategy().prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Filter::and),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Filter::or),
            inner.prop_map(Filter::not),
        ]
    })
}

mod translation_properties {
    use super::*;

    proptest! {
        #[test]
        fn fragments_have_balanced_parentheses(filter in filter_strategy()) {
            let sql = translate(&filter).unwrap();
            let mut depth = 0_i32;
            for c in sql.chars() {
                match c {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
                prop_assert!(depth >= 0);
            }
            prop_assert_eq!(depth, 0);
        }

        #[test]
        fn equals_text_value_is_recoverable(value in "[ -~]{0,20}") {
            let sql = translate(&Filter::equals("__NAME__", value.as_str())).unwrap();
            let literal = sql.strip_prefix("gr_mp_groups.group_name = '").unwrap();
            let literal = literal.strip_suffix('\'').unwrap();
            prop_assert_eq!(literal.replace("''", "'"), value);
        }
    }
}
