//! SELECT statement assembly.

use grouper_model::columns::{LAST_MODIFIED, LATEST_TIMESTAMP};
use grouper_model::{ColumnType, Filter, JoinSpec, ObjectClassSchema, Scalar, TableSchema};
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::options::OperationOptions;
use crate::resource_query::ResourceQuery;
use crate::translator::{FilterTranslator, sql_literal};

/// Join flavour used for every join of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Left,
    Inner,
}

impl JoinKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Inner => "INNER",
        }
    }
}

/// Resolved paging of one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paging<'a> {
    Unpaged,
    Keyset { size: u64, cookie: &'a str, skip: u64 },
    Offset { size: u64, offset: u64 },
}

/// Builds one SELECT statement.
///
/// The builder is a plain value: `Clone` gives an independent copy, which is
/// how count statements and chunked pages are derived without touching the
/// original.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    primary_table: String,
    primary_key: String,
    primary_key_type: ColumnType,
    tables: TableSchema,
    joins: Vec<JoinSpec>,
    join_kind: JoinKind,
    fragment: Option<String>,
    options: OperationOptions,
    use_full_alias: bool,
    sync_mode: bool,
    count_mode: bool,
    distinct: bool,
    order_by: Vec<String>,
    identifiers: Option<Vec<Scalar>>,
    page_override: Option<(u64, u64)>,
    limit: Option<u64>,
}

impl QueryBuilder {
    /// Creates a builder over `tables` for the kind described by `schema`,
    /// translating `filter` right away.
    pub fn new(schema: &ObjectClassSchema, tables: TableSchema, filter: Option<&Filter>) -> QueryResult<Self> {
        Self::with_filter_tables(schema, tables, TableSchema::new(), filter)
    }

    /// Like [`QueryBuilder::new`], with extra tables the filter may reference
    /// but whose columns are not projected. Their joins still have to be
    /// given with [`QueryBuilder::with_joins`], and the statement selects
    /// DISTINCT rows.
    pub fn with_filter_tables(
        schema: &ObjectClassSchema,
        tables: TableSchema,
        filter_tables: TableSchema,
        filter: Option<&Filter>,
    ) -> QueryResult<Self> {
        let distinct = !filter_tables.is_empty();
        let fragment = match filter {
            Some(f) => {
                let mut resolvable = tables.clone();
                for (table, columns) in filter_tables.tables() {
                    if !resolvable.contains_table(table) {
                        resolvable.insert(table, columns.to_vec());
                    }
                }
                FilterTranslator::new(schema, &resolvable)
                    .translate(f, ResourceQuery::new())?
                    .into_fragment()
            }
            None => None,
        };
        let join_kind = if filter.is_some_and(Filter::requires_inner_join) {
            JoinKind::Inner
        } else {
            JoinKind::Left
        };
        Ok(Self {
            primary_table: schema.primary_table().to_string(),
            primary_key: schema.uid_column().to_string(),
            primary_key_type: ColumnType::Integer64,
            tables,
            joins: Vec::new(),
            join_kind,
            fragment,
            options: OperationOptions::default(),
            use_full_alias: false,
            sync_mode: false,
            count_mode: false,
            distinct,
            order_by: Vec::new(),
            identifiers: None,
            page_override: None,
            limit: None,
        })
    }

    /// `SELECT * FROM <table> LIMIT <limit>`.
    pub fn select_all(table: impl Into<String>, limit: u64) -> Self {
        Self {
            primary_table: table.into(),
            primary_key: String::new(),
            primary_key_type: ColumnType::Integer64,
            tables: TableSchema::new(),
            joins: Vec::new(),
            join_kind: JoinKind::Left,
            fragment: None,
            options: OperationOptions::default(),
            use_full_alias: false,
            sync_mode: false,
            count_mode: false,
            distinct: false,
            order_by: Vec::new(),
            identifiers: None,
            page_override: None,
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn with_joins(mut self, joins: Vec<JoinSpec>) -> Self {
        self.joins = joins;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: OperationOptions) -> Self {
        self.options = options;
        self
    }

    /// Alias every projected column as `"table$column"`.
    #[must_use]
    pub fn with_full_alias(mut self, enabled: bool) -> Self {
        self.use_full_alias = enabled;
        self
    }

    /// Fold `last_modified` columns into `latest_timestamp` and group by the
    /// rest.
    #[must_use]
    pub fn with_sync_mode(mut self, enabled: bool) -> Self {
        self.sync_mode = enabled;
        self
    }

    #[must_use]
    pub fn with_order_by(mut self, columns: Vec<String>) -> Self {
        self.order_by = columns;
        self
    }

    /// Restricts the statement to a batch of primary keys.
    #[must_use]
    pub fn with_identifiers(mut self, identifiers: Vec<Scalar>) -> Self {
        self.identifiers = Some(identifiers);
        self
    }

    /// Restricts the statement to a chunk of `size` rows starting `offset`
    /// rows (0-based) into the caller's page window.
    ///
    /// Without caller paging the chunk is taken from the whole result. A
    /// cookie keeps its `pk > cookie` condition, a caller offset shifts the
    /// chunk, and the chunk never reaches past the caller's page size.
    pub fn set_page(&mut self, size: u64, offset: u64) {
        self.page_override = Some((size, offset));
    }

    #[must_use]
    pub fn join_kind(&self) -> JoinKind {
        self.join_kind
    }

    #[must_use]
    pub fn options(&self) -> &OperationOptions {
        &self.options
    }

    /// A copy that wraps the statement in `SELECT COUNT(*)`.
    #[must_use]
    pub fn as_count(&self) -> Self {
        let mut counted = self.clone();
        counted.count_mode = true;
        counted
    }

    pub fn count_query(&self) -> QueryResult<String> {
        self.as_count().build()
    }

    /// `SELECT MAX(latest_timestamp)` over the (sync mode) statement.
    pub fn sync_token_query(&self) -> QueryResult<String> {
        let statement = self.build()?;
        Ok(format!("SELECT MAX({LATEST_TIMESTAMP}) FROM ({statement}) AS time_max"))
    }

    fn qualified_key(&self) -> String {
        format!("{}.{}", self.primary_table, self.primary_key)
    }

    fn paging(&self) -> QueryResult<Paging<'_>> {
        let window = self.caller_paging()?;
        let Some((size, offset)) = self.page_override else {
            return Ok(window);
        };
        Ok(match window {
            Paging::Unpaged => Paging::Offset { size, offset },
            Paging::Keyset { size: page, cookie, .. } => Paging::Keyset {
                size: size.min(page.saturating_sub(offset)),
                cookie,
                skip: offset,
            },
            Paging::Offset { size: page, offset: start } => Paging::Offset {
                size: size.min(page.saturating_sub(offset)),
                offset: start + offset,
            },
        })
    }

    fn caller_paging(&self) -> QueryResult<Paging<'_>> {
        let Some(size) = self.options.page_size else {
            return Ok(Paging::Unpaged);
        };
        if let Some(cookie) = self.options.cookie() {
            return Ok(Paging::Keyset { size, cookie, skip: 0 });
        }
        match self.options.paged_results_offset {
            Some(offset) => Ok(Paging::Offset {
                size,
                offset: offset.saturating_sub(1),
            }),
            None => Err(QueryError::InconsistentPaging(format!(
                "page size {size} given without offset or cookie"
            ))),
        }
    }

    fn projection(&self) -> (String, Vec<String>) {
        let qualify = self.tables.len() > 1 || !self.joins.is_empty();
        let mut select = Vec::new();
        let mut group_by = Vec::new();
        let mut modified = Vec::new();

        for (table, columns) in self.tables.tables() {
            for column in columns {
                let qualified = format!("{table}.{}", column.name);
                if self.sync_mode && column.name == LAST_MODIFIED {
                    modified.push(format!("MAX({qualified})"));
                    continue;
                }
                if self.sync_mode {
                    group_by.push(qualified.clone());
                }
                let projected = if qualify { qualified } else { column.name.clone() };
                if self.use_full_alias && qualify {
                    select.push(format!("{projected} AS \"{table}${}\"", column.name));
                } else {
                    select.push(projected);
                }
            }
        }

        match modified.len() {
            0 => {}
            1 => select.push(format!("{} AS {LATEST_TIMESTAMP}", modified[0])),
            _ => select.push(format!("GREATEST({}) AS {LATEST_TIMESTAMP}", modified.join(", "))),
        }

        let list = if select.is_empty() { "*".to_string() } else { select.join(", ") };
        (list, group_by)
    }

    /// Renders the statement.
    pub fn build(&self) -> QueryResult<String> {
        if !self.tables.is_empty() && !self.tables.contains_table(&self.primary_table) {
            return Err(QueryError::MissingTable(self.primary_table.clone()));
        }

        let (select_list, group_by) = self.projection();
        let distinct = if self.distinct && !self.sync_mode { "DISTINCT " } else { "" };
        let mut sql = format!("SELECT {distinct}{select_list} FROM {}", self.primary_table);

        for join in &self.joins {
            sql.push_str(&format!(
                " {} JOIN {} ON {}.{} = {}.{}",
                self.join_kind.keyword(),
                join.table,
                self.primary_table,
                join.primary_column,
                join.table,
                join.column
            ));
        }

        let key = self.qualified_key();
        let mut conditions = Vec::new();
        let mut order_by = self.order_by.clone();
        let mut limit = self.limit;
        let mut offset = None;

        match self.paging()? {
            Paging::Unpaged => {}
            Paging::Keyset { size, cookie, skip } => {
                let literal = sql_literal(&key, &Scalar::from(cookie), self.primary_key_type)?;
                conditions.push(format!("{key} > {literal}"));
                limit = Some(size);
                offset = (skip > 0).then_some(skip);
            }
            Paging::Offset { size, offset: o } => {
                limit = Some(size);
                offset = Some(o);
            }
        }
        if limit.is_some() && self.limit.is_none() && order_by.is_empty() {
            order_by.push(key.clone());
        }

        if let Some(fragment) = &self.fragment {
            conditions.push(fragment.clone());
        }

        if let Some(ids) = &self.identifiers {
            if ids.is_empty() {
                return Err(QueryError::EmptyIdentifierSet);
            }
            let literals = ids
                .iter()
                .map(|id| sql_literal(&key, id, self.primary_key_type))
                .collect::<QueryResult<Vec<_>>>()?;
            conditions.push(format!("{key} IN ({})", literals.join(", ")));
        }

        match conditions.as_slice() {
            [] => {}
            [only] => sql.push_str(&format!(" WHERE {only}")),
            many => {
                let parts: Vec<String> = many.iter().map(|c| format!("({c})")).collect();
                sql.push_str(&format!(" WHERE {}", parts.join(" AND ")));
            }
        }

        if !group_by.is_empty() {
            sql.push_str(&format!(" GROUP BY {}", group_by.join(", ")));
        }
        if !order_by.is_empty() {
            let columns: Vec<String> = order_by.iter().map(|c| format!("{c} ASC")).collect();
            sql.push_str(&format!(" ORDER BY {}", columns.join(", ")));
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        if self.count_mode {
            sql = format!("SELECT COUNT(*) FROM ( {sql} ) AS subquery");
        }

        debug!(sql = %sql, "built statement");
        Ok(sql)
    }
}
