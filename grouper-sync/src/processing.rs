//! Per-kind statement planning and execution shared by search and sync.

use grouper_model::columns::{DELETED, LAST_MODIFIED, LIVE};
use grouper_model::{Filter, JoinSpec, ObjectClassSchema, Scalar, TableSchema};
use grouper_query::QueryBuilder;
use grouper_storage::{ObjectMap, Row, RowMaterializer, SqlConnection, SqlValue, StorageError};
use grouper_types::SyncToken;
use tracing::debug;

use crate::error::SyncResult;

/// Behaviour switches shared by search and sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingConfig {
    /// Hide tombstoned objects from searches and tombstoned joined rows from
    /// every object.
    pub exclude_deleted_objects: bool,
    /// Page searches by primary key and fetch full objects per page.
    pub enable_id_based_paging: bool,
    /// Largest number of objects fetched by one statement.
    pub max_page_size: Option<u64>,
    /// Attributes added to every combined (all kinds) sync.
    pub attrs_to_have_in_all_search: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            exclude_deleted_objects: true,
            enable_id_based_paging: false,
            max_page_size: None,
            attrs_to_have_in_all_search: Vec::new(),
        }
    }
}

/// Tables, filter-only tables and joins of one statement.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub tables: TableSchema,
    pub filter_tables: TableSchema,
    pub joins: Vec<JoinSpec>,
}

/// Offsets of the chunks covering `total` rows, `max` rows at a time.
pub fn chunk_offsets(total: u64, max: u64) -> impl Iterator<Item = u64> {
    let step = usize::try_from(max.max(1)).unwrap_or(usize::MAX);
    (0..total).step_by(step)
}

/// Planning and execution for one concrete object kind.
#[derive(Debug, Clone, Copy)]
pub struct ObjectProcessing<'a> {
    schema: &'a ObjectClassSchema,
    config: &'a ProcessingConfig,
}

impl<'a> ObjectProcessing<'a> {
    #[must_use]
    pub const fn new(schema: &'a ObjectClassSchema, config: &'a ProcessingConfig) -> Self {
        Self { schema, config }
    }

    #[must_use]
    pub const fn schema(&self) -> &'a ObjectClassSchema {
        self.schema
    }

    #[must_use]
    pub const fn config(&self) -> &'a ProcessingConfig {
        self.config
    }

    #[must_use]
    pub const fn materializer(&self) -> RowMaterializer<'a> {
        RowMaterializer::new(self.schema, self.config.exclude_deleted_objects)
    }

    /// Whether the filter has to see membership rows.
    fn references_membership(&self, filter: &Filter) -> bool {
        let qualified = format!("{}.", self.schema.membership_table());
        filter.any_attribute(&|name| self.schema.is_multi_valued(name) || name.starts_with(&qualified))
    }

    /// Tables for a search statement.
    ///
    /// With `joined` set, the membership and extension tables are projected
    /// when `attributes` asks for them. A filter on membership that is not
    /// projected still gets its join, as a filter-only table.
    #[must_use]
    pub fn projection(&self, attributes: &[String], filter: Option<&Filter>, joined: bool) -> Projection {
        let s = self.schema;
        let mut p = Projection {
            tables: TableSchema::new().with_table(s.primary_table(), s.primary_columns()),
            ..Projection::default()
        };
        let membership = joined && s.wants_membership(attributes);
        if membership {
            p.tables.insert(s.membership_table(), s.membership_columns());
            p.joins.push(s.membership_join());
        }
        if joined && s.wants_extension(attributes) {
            p.tables.insert(s.extension_table(), s.extension_columns());
            p.joins.push(s.extension_join());
        }
        if !membership && filter.is_some_and(|f| self.references_membership(f)) {
            p.filter_tables.insert(s.membership_table(), s.membership_columns());
            p.joins.push(s.membership_join());
        }
        p
    }

    /// Tables for the change detection statement of a sync: only what is
    /// needed to classify a change, plus the timestamps of every joined table
    /// the requested attributes depend on.
    #[must_use]
    pub fn watermark_projection(&self, attributes: &[String]) -> Projection {
        let s = self.schema;
        let mut p = Projection {
            tables: TableSchema::new().with_table(s.primary_table(), s.primary_sync_columns()),
            ..Projection::default()
        };
        if s.wants_membership(attributes) {
            p.tables.insert(s.membership_table(), ObjectClassSchema::modification_columns());
            p.joins.push(s.membership_join());
        }
        if s.wants_extension(attributes) {
            p.tables.insert(s.extension_table(), ObjectClassSchema::modification_columns());
            p.joins.push(s.extension_join());
        }
        p
    }

    /// Every table of the kind, timestamps only. Feeds the latest token.
    #[must_use]
    pub fn token_projection(&self) -> Projection {
        let s = self.schema;
        Projection {
            tables: TableSchema::new()
                .with_table(s.primary_table(), ObjectClassSchema::modification_columns())
                .with_table(s.membership_table(), ObjectClassSchema::modification_columns())
                .with_table(s.extension_table(), ObjectClassSchema::modification_columns()),
            filter_tables: TableSchema::new(),
            joins: vec![s.membership_join(), s.extension_join()],
        }
    }

    /// `t.last_modified > token` for every table of the projection, OR-ed.
    #[must_use]
    pub fn watermark_filter(&self, token: SyncToken, tables: &TableSchema) -> Filter {
        let mut parts: Vec<Filter> = tables
            .tables()
            .map(|(table, _)| Filter::greater_than(format!("{table}.{LAST_MODIFIED}"), token.value()))
            .collect();
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            Filter::or(parts)
        }
    }

    /// Adds the tombstone conditions to a search filter when deleted objects
    /// are excluded.
    #[must_use]
    pub fn exclude_deleted(&self, filter: Option<Filter>) -> Option<Filter> {
        if !self.config.exclude_deleted_objects {
            return filter;
        }
        let live = Filter::equals(format!("{}.{DELETED}", self.schema.primary_table()), LIVE);
        let Some(filter) = filter else {
            return Some(live);
        };
        let mut parts = vec![live];
        if filter.requires_inner_join() {
            parts.push(Filter::equals(
                format!("{}.{DELETED}", self.schema.membership_table()),
                LIVE,
            ));
        }
        parts.push(filter);
        Some(Filter::and(parts))
    }

    /// A builder with full aliases over the projection.
    pub fn builder(&self, projection: Projection, filter: Option<&Filter>) -> SyncResult<QueryBuilder> {
        Ok(
            QueryBuilder::with_filter_tables(self.schema, projection.tables, projection.filter_tables, filter)?
                .with_joins(projection.joins)
                .with_full_alias(true),
        )
    }

    /// Runs a statement, classifying database failures.
    pub fn run(&self, conn: &dyn SqlConnection, sql: &str, action: &str) -> SyncResult<Vec<Row>> {
        conn.query(sql)
            .map_err(|e| StorageError::database(e, format!("{action} {} rows", self.schema.kind())).into())
    }

    /// Number of rows the builder's statement returns.
    pub fn count(&self, conn: &dyn SqlConnection, builder: &QueryBuilder) -> SyncResult<u64> {
        let rows = self.run(conn, &builder.count_query()?, "counting")?;
        let total = rows
            .first()
            .and_then(|r| r.get(0))
            .and_then(SqlValue::as_i64)
            .unwrap_or(0);
        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// The page size to chunk with, when a statement may have to be split:
    /// a maximum is configured and the caller's page does not fit in it.
    #[must_use]
    pub fn chunk_size(&self, caller_page_size: Option<u64>) -> Option<u64> {
        let max = self.config.max_page_size?;
        match caller_page_size {
            Some(size) if size <= max => None,
            _ => Some(max),
        }
    }

    /// Fetches complete objects for a batch of identifiers, keyed by
    /// identifier.
    pub fn fetch_full_objects(
        &self,
        conn: &dyn SqlConnection,
        identifiers: Vec<String>,
        attributes: &[String],
    ) -> SyncResult<ObjectMap> {
        if identifiers.is_empty() {
            return Ok(ObjectMap::new());
        }
        debug!(count = identifiers.len(), kind = %self.schema.kind(), "fetching full objects");
        let builder = self
            .builder(self.projection(attributes, None, true), None)?
            .with_identifiers(identifiers.into_iter().map(Scalar::Text).collect());
        let rows = self.run(conn, &builder.build()?, "fetching full")?;
        Ok(self.materializer().materialize(&rows)?)
    }

    /// Completes objects with their full attributes, keeping their order,
    /// deleted flag and timestamp. Tombstoned objects are left as they are
    /// unless `include_deleted` is set.
    pub fn rehydrate(
        &self,
        conn: &dyn SqlConnection,
        objects: ObjectMap,
        attributes: &[String],
        include_deleted: bool,
    ) -> SyncResult<ObjectMap> {
        let wanted: Vec<String> = objects
            .iter()
            .filter(|(_, o)| include_deleted || !o.is_deleted())
            .map(|(id, _)| id.clone())
            .collect();
        let mut full = self.fetch_full_objects(conn, wanted, attributes)?;
        let mut out = ObjectMap::with_capacity(objects.len());
        for (id, mut object) in objects {
            if let Some(complete) = full.swap_remove(&id) {
                object.absorb(complete)?;
            }
            out.insert(id, object);
        }
        Ok(out)
    }
}
