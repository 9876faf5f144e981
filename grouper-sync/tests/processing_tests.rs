use grouper_model::{AttributeName, Filter, ObjectClassSchema, Scalar};
use grouper_sync::{ObjectProcessing, ProcessingConfig, chunk_offsets};
use grouper_types::SyncToken;
use pretty_assertions::assert_eq;

fn groups() -> ObjectClassSchema {
    ObjectClassSchema::group("gr", vec!["level".into()])
}

fn attrs(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

// ── Chunking ────────────────────────────────────────────────────

#[test]
fn chunk_offsets_cover_the_count() {
    assert_eq!(chunk_offsets(10, 4).collect::<Vec<_>>(), vec![0, 4, 8]);
    assert_eq!(chunk_offsets(8, 4).collect::<Vec<_>>(), vec![0, 4]);
    assert_eq!(chunk_offsets(0, 4).count(), 0);
}

#[test]
fn chunk_size_depends_on_caller_page() {
    let schema = groups();
    let config = ProcessingConfig {
        max_page_size: Some(50),
        ..ProcessingConfig::default()
    };
    let p = ObjectProcessing::new(&schema, &config);
    assert_eq!(p.chunk_size(None), Some(50));
    assert_eq!(p.chunk_size(Some(80)), Some(50));
    assert_eq!(p.chunk_size(Some(20)), None);

    let unbounded = ProcessingConfig::default();
    assert_eq!(ObjectProcessing::new(&schema, &unbounded).chunk_size(None), None);
}

// ── Projections ─────────────────────────────────────────────────

#[test]
fn watermark_projection_joins_only_requested_tables() {
    let schema = groups();
    let config = ProcessingConfig::default();
    let p = ObjectProcessing::new(&schema, &config);

    let bare = p.watermark_projection(&[]);
    assert_eq!(bare.tables.len(), 1);
    assert!(bare.joins.is_empty());

    let full = p.watermark_projection(&attrs(&["members", "level"]));
    let tables: Vec<_> = full.tables.tables().map(|(t, _)| t.to_string()).collect();
    assert_eq!(tables, vec!["gr_mp_groups", "gr_mp_memberships", "gr_mp_group_attributes"]);
    assert_eq!(full.joins.len(), 2);
}

#[test]
fn membership_filter_adds_a_filter_only_table() {
    let schema = groups();
    let config = ProcessingConfig::default();
    let p = ObjectProcessing::new(&schema, &config);
    let filter = Filter::equals("members", "5");

    let hidden = p.projection(&[], Some(&filter), true);
    assert!(hidden.filter_tables.contains_table("gr_mp_memberships"));
    assert!(!hidden.tables.contains_table("gr_mp_memberships"));

    let shown = p.projection(&attrs(&["members"]), Some(&filter), true);
    assert!(shown.filter_tables.is_empty());
    assert!(shown.tables.contains_table("gr_mp_memberships"));
}

#[test]
fn watermark_filter_ors_every_table() {
    let schema = groups();
    let config = ProcessingConfig::default();
    let p = ObjectProcessing::new(&schema, &config);

    let single = p.watermark_filter(SyncToken::new(5), &p.watermark_projection(&[]).tables);
    assert_eq!(single, Filter::greater_than("gr_mp_groups.last_modified", 5_i64));

    let joined = p.watermark_filter(SyncToken::new(5), &p.watermark_projection(&attrs(&["members"])).tables);
    assert_eq!(
        joined,
        Filter::or(vec![
            Filter::greater_than("gr_mp_groups.last_modified", 5_i64),
            Filter::greater_than("gr_mp_memberships.last_modified", 5_i64),
        ])
    );
}

// ── Deleted exclusion ───────────────────────────────────────────

#[test]
fn exclude_deleted_augments_filters() {
    let schema = groups();
    let config = ProcessingConfig::default();
    let p = ObjectProcessing::new(&schema, &config);
    let live = Filter::equals("gr_mp_groups.deleted", "F");

    assert_eq!(p.exclude_deleted(None), Some(live.clone()));

    let uid = Filter::equals(AttributeName::UID, "1");
    assert_eq!(p.exclude_deleted(Some(uid.clone())), Some(Filter::and(vec![live.clone(), uid])));

    let all = Filter::contains_all_values("members", vec![Scalar::from("2")]);
    assert_eq!(
        p.exclude_deleted(Some(all.clone())),
        Some(Filter::and(vec![
            live,
            Filter::equals("gr_mp_memberships.deleted", "F"),
            all,
        ]))
    );
}

#[test]
fn including_deleted_leaves_filters_alone() {
    let schema = groups();
    let config = ProcessingConfig {
        exclude_deleted_objects: false,
        ..ProcessingConfig::default()
    };
    let p = ObjectProcessing::new(&schema, &config);
    assert_eq!(p.exclude_deleted(None), None);
    let uid = Filter::equals(AttributeName::UID, "1");
    assert_eq!(p.exclude_deleted(Some(uid.clone())), Some(uid));
}
