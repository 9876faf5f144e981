use grouper_types::ObjectKind;
use serde::{Deserialize, Serialize};

use crate::columns::{
    ATTRIBUTE_NAME, ATTRIBUTE_VALUE, DELETED, GROUP_ID_INDEX, LAST_MODIFIED, SUBJECT_ID_INDEX,
};
use crate::error::{ModelError, ModelResult};
use crate::filter::AttributeName;

/// SQL type of a column, as far as value quoting and conversion care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    /// Shorthand for a text column.
    pub fn text(name: &str) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::Text,
        }
    }

    /// Shorthand for a 64-bit integer column.
    pub fn integer(name: &str) -> Self {
        Self {
            name: name.into(),
            column_type: ColumnType::Integer64,
        }
    }
}

/// Tables and columns taking part in one query, in projection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    tables: Vec<(String, Vec<Column>)>,
}

impl TableSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table, replacing the columns of an existing table of that name.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>, columns: Vec<Column>) -> Self {
        self.insert(table, columns);
        self
    }

    pub fn insert(&mut self, table: impl Into<String>, columns: Vec<Column>) {
        let table = table.into();
        match self.tables.iter_mut().find(|(name, _)| *name == table) {
            Some((_, existing)) => *existing = columns,
            None => self.tables.push((table, columns)),
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &[Column])> {
        self.tables.iter().map(|(name, cols)| (name.as_str(), cols.as_slice()))
    }

    #[must_use]
    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.iter().any(|(name, _)| name == table)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Type of `table.column`, if both exist.
    #[must_use]
    pub fn column_type(&self, table: &str, column: &str) -> Option<ColumnType> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .and_then(|(_, cols)| cols.iter().find(|c| c.name == column))
            .map(|c| c.column_type)
    }
}

/// A join from the primary table to another table on one key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// The joined table.
    pub table: String,
    /// Key column in the joined table.
    pub column: String,
    /// Primary table column the key equals.
    pub primary_column: String,
}

/// One attribute as exposed in the resource schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInfo {
    pub name: String,
    pub native_name: String,
    pub value_type: ColumnType,
    pub multi_valued: bool,
    pub returned_by_default: bool,
}

/// Table and column naming for one concrete object kind.
///
/// Built per connector instance from the configured table prefix and the
/// configured extension attribute names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectClassSchema {
    kind: ObjectKind,
    primary_table: String,
    extension_table: String,
    membership_table: String,
    uid_column: &'static str,
    name_column: &'static str,
    own_key_column: &'static str,
    membership_attribute: &'static str,
    membership_column: &'static str,
    detail_columns: Vec<Column>,
    extension_attributes: Vec<String>,
}

impl ObjectClassSchema {
    /// Schema of the group tables.
    pub fn group(prefix: &str, extension_attributes: Vec<String>) -> Self {
        Self {
            kind: ObjectKind::Group,
            primary_table: format!("{prefix}_mp_groups"),
            extension_table: format!("{prefix}_mp_group_attributes"),
            membership_table: format!("{prefix}_mp_memberships"),
            uid_column: "id_index",
            name_column: "group_name",
            own_key_column: GROUP_ID_INDEX,
            membership_attribute: "members",
            membership_column: SUBJECT_ID_INDEX,
            detail_columns: vec![Column::text("display_name"), Column::text("description")],
            extension_attributes,
        }
    }

    /// Schema of the subject tables.
    pub fn subject(prefix: &str, extension_attributes: Vec<String>) -> Self {
        Self {
            kind: ObjectKind::Subject,
            primary_table: format!("{prefix}_mp_subjects"),
            extension_table: format!("{prefix}_mp_subject_attributes"),
            membership_table: format!("{prefix}_mp_memberships"),
            uid_column: SUBJECT_ID_INDEX,
            name_column: "subject_id",
            own_key_column: SUBJECT_ID_INDEX,
            membership_attribute: "member_of",
            membership_column: GROUP_ID_INDEX,
            detail_columns: Vec::new(),
            extension_attributes,
        }
    }

    /// Schema for a concrete kind. `All` has no tables.
    pub fn for_kind(kind: ObjectKind, prefix: &str, extension_attributes: Vec<String>) -> ModelResult<Self> {
        match kind {
            ObjectKind::Group => Ok(Self::group(prefix, extension_attributes)),
            ObjectKind::Subject => Ok(Self::subject(prefix, extension_attributes)),
            ObjectKind::All => Err(ModelError::NoSchemaForKind(kind)),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    #[must_use]
    pub fn primary_table(&self) -> &str {
        &self.primary_table
    }

    #[must_use]
    pub fn extension_table(&self) -> &str {
        &self.extension_table
    }

    #[must_use]
    pub fn membership_table(&self) -> &str {
        &self.membership_table
    }

    #[must_use]
    pub const fn uid_column(&self) -> &'static str {
        self.uid_column
    }

    #[must_use]
    pub const fn name_column(&self) -> &'static str {
        self.name_column
    }

    /// Name of the multi-valued membership attribute (`members` or `member_of`).
    #[must_use]
    pub const fn membership_attribute(&self) -> &'static str {
        self.membership_attribute
    }

    /// Membership table column holding the other side of the relation.
    #[must_use]
    pub const fn membership_column(&self) -> &'static str {
        self.membership_column
    }

    #[must_use]
    pub fn extension_attributes(&self) -> &[String] {
        &self.extension_attributes
    }

    /// Qualified primary key, `table.column`.
    #[must_use]
    pub fn qualified_uid(&self) -> String {
        format!("{}.{}", self.primary_table, self.uid_column)
    }

    /// All primary table columns.
    #[must_use]
    pub fn primary_columns(&self) -> Vec<Column> {
        let mut columns = vec![Column::integer(self.uid_column), Column::text(self.name_column)];
        columns.extend(self.detail_columns.iter().cloned());
        columns.push(Column::integer(LAST_MODIFIED));
        columns.push(Column::text(DELETED));
        columns
    }

    /// Primary table columns needed to classify a change.
    #[must_use]
    pub fn primary_sync_columns(&self) -> Vec<Column> {
        vec![
            Column::text(DELETED),
            Column::integer(self.uid_column),
            Column::integer(LAST_MODIFIED),
        ]
    }

    #[must_use]
    pub fn membership_columns(&self) -> Vec<Column> {
        vec![
            Column::integer(GROUP_ID_INDEX),
            Column::integer(SUBJECT_ID_INDEX),
            Column::integer(LAST_MODIFIED),
            Column::text(DELETED),
        ]
    }

    #[must_use]
    pub fn extension_columns(&self) -> Vec<Column> {
        vec![
            Column::integer(self.own_key_column),
            Column::text(ATTRIBUTE_NAME),
            Column::text(ATTRIBUTE_VALUE),
            Column::integer(LAST_MODIFIED),
            Column::text(DELETED),
        ]
    }

    /// Only the modification timestamp, for joins that feed the watermark.
    #[must_use]
    pub fn modification_columns() -> Vec<Column> {
        vec![Column::integer(LAST_MODIFIED)]
    }

    #[must_use]
    pub fn membership_join(&self) -> JoinSpec {
        JoinSpec {
            table: self.membership_table.clone(),
            column: self.own_key_column.to_string(),
            primary_column: self.uid_column.to_string(),
        }
    }

    #[must_use]
    pub fn extension_join(&self) -> JoinSpec {
        JoinSpec {
            table: self.extension_table.clone(),
            column: self.own_key_column.to_string(),
            primary_column: self.uid_column.to_string(),
        }
    }

    /// Recognizes the generic attribute names of this kind.
    #[must_use]
    pub fn attribute_name(&self, name: &str) -> AttributeName {
        match name {
            AttributeName::UID => AttributeName::Uid,
            AttributeName::NAME => AttributeName::Name,
            n if n == self.membership_attribute => AttributeName::Membership,
            n => AttributeName::Column(n.to_string()),
        }
    }

    /// Native column an attribute name refers to.
    #[must_use]
    pub fn native_column<'a>(&self, name: &'a AttributeName) -> &'a str {
        match name {
            AttributeName::Uid => self.uid_column,
            AttributeName::Name => self.name_column,
            AttributeName::Membership => self.membership_column,
            AttributeName::Column(column) => column,
        }
    }

    #[must_use]
    pub fn is_multi_valued(&self, attribute: &str) -> bool {
        attribute == self.membership_attribute
    }

    #[must_use]
    pub fn is_extension_attribute(&self, attribute: &str) -> bool {
        self.extension_attributes.iter().any(|a| a == attribute)
    }

    /// True when any requested attribute is the membership attribute.
    #[must_use]
    pub fn wants_membership(&self, attributes: &[String]) -> bool {
        attributes.iter().any(|a| self.is_multi_valued(a))
    }

    /// True when any requested attribute is a configured extension attribute.
    #[must_use]
    pub fn wants_extension(&self, attributes: &[String]) -> bool {
        attributes.iter().any(|a| self.is_extension_attribute(a))
    }

    /// Attributes this kind exposes to callers.
    #[must_use]
    pub fn attribute_infos(&self) -> Vec<AttributeInfo> {
        let mut infos = vec![
            AttributeInfo {
                name: AttributeName::UID.into(),
                native_name: self.uid_column.into(),
                value_type: ColumnType::Text,
                multi_valued: false,
                returned_by_default: true,
            },
            AttributeInfo {
                name: AttributeName::NAME.into(),
                native_name: self.name_column.into(),
                value_type: ColumnType::Text,
                multi_valued: false,
                returned_by_default: true,
            },
        ];
        infos.extend(self.detail_columns.iter().map(|c| AttributeInfo {
            name: c.name.clone(),
            native_name: c.name.clone(),
            value_type: c.column_type,
            multi_valued: false,
            returned_by_default: true,
        }));
        infos.push(AttributeInfo {
            name: LAST_MODIFIED.into(),
            native_name: LAST_MODIFIED.into(),
            value_type: ColumnType::Integer64,
            multi_valued: false,
            returned_by_default: true,
        });
        infos.push(AttributeInfo {
            name: self.membership_attribute.into(),
            native_name: self.membership_column.into(),
            value_type: ColumnType::Text,
            multi_valued: true,
            returned_by_default: false,
        });
        infos.extend(self.extension_attributes.iter().map(|a| AttributeInfo {
            name: a.clone(),
            native_name: a.clone(),
            value_type: ColumnType::Text,
            multi_valued: false,
            returned_by_default: false,
        }));
        infos
    }
}
