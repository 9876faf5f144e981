//! Folding joined rows into logical objects.
//!
//! A query joining the primary table with membership or extension rows
//! returns one row per joined row, so one object spans many rows. Each row is
//! first parsed into a [`RowContribution`], which is then applied to the
//! object of its identifier.

use grouper_model::columns::{
    ALIAS_SEPARATOR, ATTRIBUTE_NAME, ATTRIBUTE_VALUE, DELETED, LAST_MODIFIED, LATEST_TIMESTAMP,
    is_tombstone,
};
use grouper_model::{GrouperObject, ObjectClassSchema, Scalar};
use indexmap::IndexMap;
use tracing::trace;

use crate::connection::{Row, SqlValue};
use crate::error::{StorageError, StorageResult};

/// Objects by identifier, in the order their first row arrived.
pub type ObjectMap = IndexMap<String, GrouperObject>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableRole {
    Primary,
    Membership,
    Extension,
    Other,
}

/// Everything one row says about its object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowContribution {
    pub identifier: Option<String>,
    pub name: Option<String>,
    /// Primary row tombstone, when the `deleted` column was projected.
    pub deleted: Option<bool>,
    pub latest_timestamp: Option<i64>,
    /// Primary table attributes in column order.
    pub attributes: Vec<(String, Option<Scalar>)>,
    pub extension_name: Option<String>,
    pub extension_value: Option<String>,
    pub extension_tombstoned: bool,
    pub membership_value: Option<Scalar>,
    pub membership_tombstoned: bool,
}

/// Turns rows of one object kind into [`GrouperObject`]s.
#[derive(Debug, Clone, Copy)]
pub struct RowMaterializer<'a> {
    schema: &'a ObjectClassSchema,
    exclude_deleted: bool,
}

impl<'a> RowMaterializer<'a> {
    /// `exclude_deleted` drops tombstoned membership and extension rows from
    /// the object instead of importing them.
    #[must_use]
    pub const fn new(schema: &'a ObjectClassSchema, exclude_deleted: bool) -> Self {
        Self {
            schema,
            exclude_deleted,
        }
    }

    fn role(&self, table: &str) -> TableRole {
        if table == self.schema.primary_table() {
            TableRole::Primary
        } else if table == self.schema.membership_table() {
            TableRole::Membership
        } else if table == self.schema.extension_table() {
            TableRole::Extension
        } else {
            TableRole::Other
        }
    }

    /// Parses one row.
    ///
    /// Columns are either `table$column` or, for single-table queries, bare
    /// primary table column names.
    pub fn parse_row(&self, row: &Row) -> RowContribution {
        let mut c = RowContribution::default();
        for (name, value) in row.iter() {
            let (role, column) = match name.split_once(ALIAS_SEPARATOR) {
                Some((table, column)) => (self.role(table), column),
                None => (TableRole::Primary, name),
            };
            if column == LATEST_TIMESTAMP {
                c.latest_timestamp = value.as_i64();
                continue;
            }
            match role {
                TableRole::Primary => self.primary_column(column, value, &mut c),
                TableRole::Membership => {
                    if column == DELETED {
                        c.membership_tombstoned = is_tombstone(value.as_text().as_deref());
                    } else if column == self.schema.membership_column() {
                        c.membership_value = value.to_text_scalar();
                    }
                }
                TableRole::Extension => match column {
                    ATTRIBUTE_NAME => c.extension_name = value.as_text(),
                    ATTRIBUTE_VALUE => c.extension_value = value.as_text(),
                    DELETED => c.extension_tombstoned = is_tombstone(value.as_text().as_deref()),
                    _ => {}
                },
                TableRole::Other => trace!(column = name, "ignoring column of unrelated table"),
            }
        }
        c
    }

    fn primary_column(&self, column: &str, value: &SqlValue, c: &mut RowContribution) {
        if column == self.schema.uid_column() {
            c.identifier = value.as_text();
        } else if column == self.schema.name_column() {
            c.name = value.as_text();
        } else if column == DELETED {
            c.deleted = Some(is_tombstone(value.as_text().as_deref()));
        } else if column == LAST_MODIFIED {
            c.attributes.push((LAST_MODIFIED.to_string(), value.as_i64().map(Scalar::Integer)));
        } else {
            c.attributes.push((column.to_string(), value.to_text_scalar()));
        }
    }

    /// Applies a parsed row to its object.
    pub fn apply(&self, c: RowContribution, object: &mut GrouperObject) -> StorageResult<()> {
        match c.identifier {
            Some(id) => object.set_identifier(id)?,
            None if object.identifier().is_none() => {
                return Err(StorageError::InvalidData("row without identifier".into()));
            }
            None => {}
        }
        if let Some(name) = c.name {
            object.set_name(name);
        }
        if let Some(deleted) = c.deleted {
            object.set_deleted(deleted);
        }
        if let Some(ts) = c.latest_timestamp {
            object.set_latest_timestamp(ts);
        }
        for (name, value) in c.attributes {
            let multi = self.schema.is_multi_valued(&name);
            object.add_attribute(name, value, multi);
        }
        if let Some(name) = c.extension_name
            && !(self.exclude_deleted && c.extension_tombstoned)
        {
            object.add_attribute(name, c.extension_value.map(Scalar::Text), false);
        }
        if let Some(value) = c.membership_value
            && !(self.exclude_deleted && c.membership_tombstoned)
        {
            object.add_attribute(self.schema.membership_attribute(), Some(value), true);
        }
        Ok(())
    }

    /// Folds one row into `target`, or into a new object.
    pub fn fold(&self, row: &Row, target: Option<GrouperObject>) -> StorageResult<GrouperObject> {
        let mut object = target.unwrap_or_else(|| GrouperObject::new(self.schema.kind()));
        self.apply(self.parse_row(row), &mut object)?;
        Ok(object)
    }

    /// Folds a whole result set, grouping rows by identifier.
    pub fn materialize(&self, rows: &[Row]) -> StorageResult<ObjectMap> {
        let mut objects = ObjectMap::new();
        for row in rows {
            let contribution = self.parse_row(row);
            let id = contribution
                .identifier
                .clone()
                .ok_or_else(|| StorageError::InvalidData("row without identifier".into()))?;
            let object = objects
                .entry(id.clone())
                .or_insert_with(|| GrouperObject::with_identifier(self.schema.kind(), id));
            self.apply(contribution, object)?;
        }
        Ok(objects)
    }
}
