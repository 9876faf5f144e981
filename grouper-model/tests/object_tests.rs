use std::collections::BTreeSet;

use grouper_model::{AttributeValue, GrouperObject, ModelError, Scalar};
use grouper_types::{ObjectKind, SyncToken};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn set(values: &[&str]) -> BTreeSet<Scalar> {
    values.iter().map(|v| Scalar::from(*v)).collect()
}

// ── identifier ───────────────────────────────────────────────────

#[test]
fn identifier_is_immutable_once_set() {
    let mut obj = GrouperObject::with_identifier(ObjectKind::Group, "34");
    assert!(obj.set_identifier("34").is_ok());
    let err = obj.set_identifier("35").unwrap_err();
    assert!(matches!(err, ModelError::IdentifierMismatch { .. }));
    assert_eq!(obj.identifier(), Some("34"));
}

#[test]
fn new_object_has_defaults() {
    let obj = GrouperObject::new(ObjectKind::Subject);
    assert_eq!(obj.identifier(), None);
    assert_eq!(obj.kind(), ObjectKind::Subject);
    assert!(!obj.is_deleted());
    assert_eq!(obj.latest_timestamp(), None);
    assert!(obj.attributes().is_empty());
}

// ── add_attribute ────────────────────────────────────────────────

#[test]
fn multi_valued_attribute_accumulates() {
    let mut obj = GrouperObject::new(ObjectKind::Group);
    obj.add_attribute("members", Some("1".into()), true);
    obj.add_attribute("members", Some("2".into()), true);
    obj.add_attribute("members", Some("1".into()), true);
    assert_eq!(obj.attribute("members"), Some(&AttributeValue::Multi(set(&["1", "2"]))));
}

#[test]
fn multi_valued_attribute_ignores_nulls() {
    let mut obj = GrouperObject::new(ObjectKind::Group);
    obj.add_attribute("members", None, true);
    assert_eq!(obj.attribute("members"), Some(&AttributeValue::Multi(BTreeSet::new())));
}

#[test]
fn single_valued_attribute_is_replaced() {
    let mut obj = GrouperObject::new(ObjectKind::Group);
    obj.add_attribute("description", Some("old".into()), false);
    obj.add_attribute("description", Some("new".into()), false);
    assert_eq!(obj.attribute("description").and_then(AttributeValue::as_single), Some(&Scalar::from("new")));
}

#[test]
fn attributes_keep_insertion_order() {
    let mut obj = GrouperObject::new(ObjectKind::Group);
    obj.add_attribute("display_name", Some("b".into()), false);
    obj.add_attribute("description", Some("a".into()), false);
    obj.add_attribute("last_modified", Some(Scalar::Integer(5)), false);
    let keys: Vec<_> = obj.attributes().keys().cloned().collect();
    assert_eq!(keys, vec!["display_name", "description", "last_modified"]);
}

// ── absorb ───────────────────────────────────────────────────────

#[test]
fn absorb_merges_name_and_attributes_but_keeps_state() {
    let mut base = GrouperObject::with_identifier(ObjectKind::Group, "7");
    base.set_latest_timestamp(100);
    base.add_values("members", [Scalar::from("1")]);

    let mut full = GrouperObject::with_identifier(ObjectKind::Group, "7");
    full.set_name("staff");
    full.set_latest_timestamp(5);
    full.add_values("members", [Scalar::from("2")]);
    full.add_attribute("description", Some("people".into()), false);

    base.absorb(full).unwrap();
    assert_eq!(base.name(), Some("staff"));
    assert_eq!(base.latest_timestamp(), Some(100));
    assert_eq!(base.sync_token(), Some(SyncToken::new(100)));
    assert_eq!(base.attribute("members").and_then(AttributeValue::as_multi), Some(&set(&["1", "2"])));
    assert!(base.attribute("description").is_some());
}

#[test]
fn absorb_rejects_other_identifier() {
    let mut base = GrouperObject::with_identifier(ObjectKind::Group, "7");
    let other = GrouperObject::with_identifier(ObjectKind::Group, "8");
    assert!(base.absorb(other).is_err());
}

#[test]
fn object_serializes_to_json() {
    let mut obj = GrouperObject::with_identifier(ObjectKind::Group, "1");
    obj.add_values("members", [Scalar::from("3")]);
    obj.add_attribute("last_modified", Some(Scalar::Integer(12)), false);
    let json = serde_json::to_value(&obj).unwrap();
    assert_eq!(json["identifier"], "1");
    assert_eq!(json["kind"], "group");
    assert_eq!(json["attributes"]["members"], serde_json::json!(["3"]));
    assert_eq!(json["attributes"]["last_modified"], 12);
}

// ── properties ───────────────────────────────────────────────────

mod accumulation_properties {
    use super::*;

    proptest! {
        #[test]
        fn membership_set_is_order_independent(values in prop::collection::vec("[0-9]{1,3}", 0..20)) {
            let mut forward = GrouperObject::new(ObjectKind::Group);
            for v in &values {
                forward.add_attribute("members", Some(Scalar::from(v.as_str())), true);
            }
            let mut backward = GrouperObject::new(ObjectKind::Group);
            for v in values.iter().rev() {
                backward.add_attribute("members", Some(Scalar::from(v.as_str())), true);
            }
            prop_assert_eq!(forward.attribute("members"), backward.attribute("members"));
        }
    }
}
