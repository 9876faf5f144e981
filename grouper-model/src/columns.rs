//! Column names shared by every Grouper table.

/// Modification timestamp in milliseconds, present on every table.
pub const LAST_MODIFIED: &str = "last_modified";

/// Tombstone column, present on every table.
pub const DELETED: &str = "deleted";

/// Extension attribute name column.
pub const ATTRIBUTE_NAME: &str = "attribute_name";

/// Extension attribute value column.
pub const ATTRIBUTE_VALUE: &str = "attribute_value";

/// Group key in the membership and group extension tables.
pub const GROUP_ID_INDEX: &str = "group_id_index";

/// Subject key in the membership and subject extension tables, and the
/// subject table's own primary key.
pub const SUBJECT_ID_INDEX: &str = "subject_id_index";

/// Derived column holding the greatest `last_modified` of a grouped row.
pub const LATEST_TIMESTAMP: &str = "latest_timestamp";

/// Value of [`DELETED`] marking a tombstoned row.
pub const TOMBSTONE: &str = "T";

/// Value of [`DELETED`] marking a live row.
pub const LIVE: &str = "F";

/// Separator between table and column in full-alias result columns.
pub const ALIAS_SEPARATOR: char = '$';

/// Returns true when a `deleted` column value marks a tombstone.
///
/// Anything other than [`TOMBSTONE`], NULL included, is live.
#[must_use]
pub fn is_tombstone(value: Option<&str>) -> bool {
    value == Some(TOMBSTONE)
}
