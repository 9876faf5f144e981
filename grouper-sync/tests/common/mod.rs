#![allow(dead_code)]

use std::cell::RefCell;

use grouper_model::ObjectClassSchema;
use grouper_storage::{DbError, DuckDbConnection, Row, SqlConnection};
use grouper_sync::ProcessingConfig;

pub const PREFIX: &str = "gr";

pub const SCHEMA_SQL: &str = "
CREATE TABLE gr_mp_groups (id_index BIGINT, group_name VARCHAR, display_name VARCHAR, description VARCHAR, last_modified BIGINT, deleted VARCHAR);
CREATE TABLE gr_mp_subjects (subject_id_index BIGINT, subject_id VARCHAR, last_modified BIGINT, deleted VARCHAR);
CREATE TABLE gr_mp_memberships (group_id_index BIGINT, subject_id_index BIGINT, last_modified BIGINT, deleted VARCHAR);
CREATE TABLE gr_mp_group_attributes (group_id_index BIGINT, attribute_name VARCHAR, attribute_value VARCHAR, last_modified BIGINT, deleted VARCHAR);
CREATE TABLE gr_mp_subject_attributes (subject_id_index BIGINT, attribute_name VARCHAR, attribute_value VARCHAR, last_modified BIGINT, deleted VARCHAR);
";

/// Ten groups, five subjects. Group 50 and subject 4 are tombstoned. Every
/// object has at least one membership and one extension row. The membership
/// (80, 5) is the newest change in the database.
pub const DATA_SQL: &str = "
INSERT INTO gr_mp_groups VALUES
  (3, 'g3', 'Group 3', 'three', 1010, 'F'),
  (4, 'g4', 'Group 4', 'four', 1020, 'F'),
  (13, 'g13', 'Group 13', 'thirteen', 1030, 'F'),
  (14, 'g14', 'Group 14', 'fourteen', 1040, 'F'),
  (34, 'g34', 'Group 34', 'thirty-four', 1050, 'F'),
  (43, 'g43', 'Group 43', 'forty-three', 1060, 'F'),
  (50, 'g50', 'Group 50', 'fifty', 1070, 'T'),
  (60, 'g60', 'Group 60', 'sixty', 1080, 'F'),
  (70, 'g70', 'Group 70', 'seventy', 1090, 'F'),
  (80, 'g80', 'Group 80', 'eighty', 1100, 'F');
INSERT INTO gr_mp_subjects VALUES
  (1, 'alice', 1005, 'F'),
  (2, 'bob', 1015, 'F'),
  (3, 'carol', 1025, 'F'),
  (4, 'dave', 1035, 'T'),
  (5, 'erin', 1045, 'F');
INSERT INTO gr_mp_memberships VALUES
  (3, 1, 500, 'F'), (3, 2, 500, 'F'),
  (4, 2, 500, 'F'), (4, 3, 500, 'T'),
  (13, 1, 500, 'F'), (14, 1, 500, 'F'),
  (34, 3, 500, 'F'), (43, 3, 500, 'F'),
  (50, 1, 500, 'F'),
  (60, 2, 500, 'F'), (60, 4, 500, 'F'),
  (70, 5, 500, 'F'), (80, 5, 2000, 'F');
INSERT INTO gr_mp_group_attributes VALUES
  (3, 'level', '1', 400, 'F'), (3, 'owner', 'alice', 400, 'T'),
  (4, 'level', '2', 400, 'F'), (13, 'level', '3', 400, 'F'),
  (14, 'level', '4', 400, 'F'), (34, 'level', '5', 400, 'F'),
  (43, 'level', '6', 400, 'F'), (50, 'level', '7', 400, 'F'),
  (60, 'level', '8', 400, 'F'), (70, 'level', '9', 400, 'F'),
  (80, 'level', '10', 400, 'F'), (80, 'owner', 'erin', 400, 'F');
INSERT INTO gr_mp_subject_attributes VALUES
  (1, 'email', 'alice@example.org', 300, 'F'),
  (2, 'email', 'bob@example.org', 300, 'F'),
  (3, 'email', 'carol@example.org', 300, 'F'),
  (4, 'email', 'dave@example.org', 300, 'F'),
  (5, 'email', 'erin@example.org', 300, 'F');
";

pub const GROUP_IDS: [&str; 10] = ["3", "4", "13", "14", "34", "43", "50", "60", "70", "80"];
pub const GROUP_NAMES: [&str; 10] = ["g3", "g4", "g13", "g14", "g34", "g43", "g50", "g60", "g70", "g80"];
pub const DELETED_GROUP: &str = "50";

pub fn seeded() -> DuckDbConnection {
    let conn = DuckDbConnection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA_SQL).unwrap();
    conn.execute_batch(DATA_SQL).unwrap();
    conn
}

pub fn empty() -> DuckDbConnection {
    let conn = DuckDbConnection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA_SQL).unwrap();
    conn
}

pub fn groups() -> ObjectClassSchema {
    ObjectClassSchema::group(PREFIX, vec!["level".into(), "owner".into()])
}

pub fn subjects() -> ObjectClassSchema {
    ObjectClassSchema::subject(PREFIX, vec!["email".into()])
}

pub fn config() -> ProcessingConfig {
    ProcessingConfig::default()
}

pub fn attrs(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_string()).collect()
}

/// Records every statement before running it on the wrapped connection.
pub struct RecordingConnection<'a> {
    inner: &'a DuckDbConnection,
    statements: RefCell<Vec<String>>,
}

impl<'a> RecordingConnection<'a> {
    pub fn new(inner: &'a DuckDbConnection) -> Self {
        Self {
            inner,
            statements: RefCell::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    pub fn count_matching(&self, needle: &str) -> usize {
        self.statements.borrow().iter().filter(|s| s.contains(needle)).count()
    }
}

impl SqlConnection for RecordingConnection<'_> {
    fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.statements.borrow_mut().push(sql.to_string());
        self.inner.query(sql)
    }
}
