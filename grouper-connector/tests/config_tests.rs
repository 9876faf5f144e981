use std::io::Write;
use std::path::PathBuf;

use grouper_connector::{ConfigError, GrouperConfiguration};
use grouper_storage::ErrorKind;
use pretty_assertions::assert_eq;

fn invalid_parameters(config: &GrouperConfiguration) -> Vec<String> {
    match config.validate() {
        Err(ConfigError::Invalid { parameters }) => parameters,
        other => panic!("expected invalid configuration, got {other:?}"),
    }
}

// ── Defaults ────────────────────────────────────────────────────

#[test]
fn defaults_match_the_documented_values() {
    let config = GrouperConfiguration::default();
    assert_eq!(config.table_prefix, "gr");
    assert_eq!(config.connection_valid_timeout, 10);
    assert!(config.exclude_deleted_objects);
    assert!(!config.enable_id_based_paging);
    assert_eq!(config.max_page_size, None);
    assert!(config.validate().is_ok());
}

#[test]
fn derived_processing_config_and_schemas() {
    let config = GrouperConfiguration {
        table_prefix: "xy".into(),
        extended_group_properties: vec!["level".into()],
        enable_id_based_paging: true,
        max_page_size: Some(100),
        ..GrouperConfiguration::default()
    };
    let processing = config.processing_config();
    assert_eq!(processing.max_page_size, Some(100));
    assert!(processing.enable_id_based_paging);
    assert_eq!(config.group_schema().primary_table(), "xy_mp_groups");
    assert_eq!(config.group_schema().extension_attributes(), ["level".to_string()]);
    assert_eq!(config.subject_schema().primary_table(), "xy_mp_subjects");
    assert_eq!(config.connection_timeout().as_secs(), 10);
}

// ── Validation ──────────────────────────────────────────────────

#[test]
fn max_page_size_needs_id_based_paging() {
    let config = GrouperConfiguration {
        max_page_size: Some(50),
        ..GrouperConfiguration::default()
    };
    assert_eq!(
        invalid_parameters(&config),
        vec!["max_page_size".to_string(), "enable_id_based_paging".to_string()]
    );
}

#[test]
fn every_problem_is_reported_together() {
    let config = GrouperConfiguration {
        table_prefix: "  ".into(),
        max_page_size: Some(0),
        enable_id_based_paging: true,
        ..GrouperConfiguration::default()
    };
    assert_eq!(
        invalid_parameters(&config),
        vec!["table_prefix".to_string(), "max_page_size".to_string()]
    );
}

#[test]
fn invalid_configuration_is_a_configuration_error() {
    let err = GrouperConfiguration {
        table_prefix: String::new(),
        ..GrouperConfiguration::default()
    }
    .validate()
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("table_prefix"));
}

// ── Loading ─────────────────────────────────────────────────────

#[test]
fn load_fills_missing_fields_with_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"database_path": "/tmp/grouper.duckdb", "extended_group_properties": ["level"], "max_page_size": 25, "enable_id_based_paging": true}}"#
    )
    .unwrap();

    let config = GrouperConfiguration::load(file.path()).unwrap();
    assert_eq!(config.database_path, Some(PathBuf::from("/tmp/grouper.duckdb")));
    assert_eq!(config.table_prefix, "gr");
    assert_eq!(config.extended_group_properties, vec!["level".to_string()]);
    assert_eq!(config.max_page_size, Some(25));
    assert!(config.exclude_deleted_objects);
    assert!(config.validate().is_ok());
}

#[test]
fn load_rejects_malformed_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(matches!(GrouperConfiguration::load(file.path()), Err(ConfigError::Parse(_))));
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    match GrouperConfiguration::load(&missing) {
        Err(ConfigError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected io error, got {other:?}"),
    }
}

#[test]
fn configuration_round_trips_through_json() {
    let config = GrouperConfiguration {
        attrs_to_have_in_all_search: vec!["members".into(), "member_of".into()],
        ..GrouperConfiguration::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: GrouperConfiguration = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
