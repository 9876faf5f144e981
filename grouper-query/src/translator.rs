//! Filter tree to WHERE fragment translation.

use grouper_model::{ColumnType, Filter, FilterAttribute, ObjectClassSchema, Scalar, TableSchema};
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::resource_query::ResourceQuery;

/// Where the `%` wildcards go for a LIKE comparison.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    Exact,
    Contains,
    StartsWith,
    EndsWith,
}

/// Renders a value as a SQL literal for a column of the given type.
///
/// Integer columns take the value unquoted and reject anything that does not
/// parse as an i64. Text values are single-quoted with embedded quotes doubled.
pub fn sql_literal(attribute: &str, value: &Scalar, column_type: ColumnType) -> QueryResult<String> {
    match (column_type, value) {
        (ColumnType::Integer64, Scalar::Integer(v)) => Ok(v.to_string()),
        (ColumnType::Integer64, Scalar::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(|v| v.to_string())
            .map_err(|_| QueryError::InvalidValue {
                attribute: attribute.to_string(),
                reason: format!("'{s}' is not an integer"),
            }),
        (ColumnType::Text, v) => Ok(quote(&v.to_string())),
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

const LIKE_ESCAPE: char = '\\';

/// Escapes LIKE wildcards so the value matches literally. The flag tells
/// whether anything was escaped, in which case the comparison needs an
/// `ESCAPE` clause.
fn like_escape(value: &str) -> (String, bool) {
    let mut escaped = false;
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
            escaped = true;
        }
        out.push(c);
    }
    (out, escaped)
}

/// Translates filters for one object kind against one set of tables.
#[derive(Debug, Clone, Copy)]
pub struct FilterTranslator<'a> {
    schema: &'a ObjectClassSchema,
    tables: &'a TableSchema,
}

impl<'a> FilterTranslator<'a> {
    #[must_use]
    pub const fn new(schema: &'a ObjectClassSchema, tables: &'a TableSchema) -> Self {
        Self { schema, tables }
    }

    /// Translates `filter` and AND-s it onto whatever `query` already holds.
    pub fn translate(&self, filter: &Filter, query: ResourceQuery) -> QueryResult<ResourceQuery> {
        let translated = self.node(filter)?;
        debug!(fragment = translated.fragment().unwrap_or_default(), "translated filter");
        if query.is_empty() {
            return Ok(translated);
        }
        Ok(ResourceQuery::combine(vec![query, translated], "AND"))
    }

    fn node(&self, filter: &Filter) -> QueryResult<ResourceQuery> {
        match filter {
            Filter::Equals(a) | Filter::ContainsAllValues(a) => self.comparison(a, "=", Pattern::Exact),
            Filter::Contains(a) => self.comparison(a, "LIKE", Pattern::Contains),
            Filter::StartsWith(a) => self.comparison(a, "LIKE", Pattern::StartsWith),
            Filter::EndsWith(a) => self.comparison(a, "LIKE", Pattern::EndsWith),
            Filter::GreaterThan(a) => self.comparison(a, ">", Pattern::Exact),
            Filter::GreaterOrEqual(a) => self.comparison(a, ">=", Pattern::Exact),
            Filter::LessThan(a) => self.comparison(a, "<", Pattern::Exact),
            Filter::LessOrEqual(a) => self.comparison(a, "<=", Pattern::Exact),
            Filter::EqualsIgnoreCase(_) => Err(QueryError::NotImplemented("equals ignore case")),
            Filter::Extended(_) => Err(QueryError::NotImplemented("extended match")),
            Filter::And(children) => self.composite(children, "AND"),
            Filter::Or(children) => self.composite(children, "OR"),
            Filter::Not(child) => Ok(ResourceQuery::negate(self.node(child)?)),
        }
    }

    fn composite(&self, children: &[Filter], operator: &'static str) -> QueryResult<ResourceQuery> {
        if children.is_empty() {
            return Err(QueryError::InvalidValue {
                attribute: operator.to_string(),
                reason: "composite filter without children".into(),
            });
        }
        let parts = children.iter().map(|c| self.node(c)).collect::<QueryResult<Vec<_>>>()?;
        Ok(ResourceQuery::combine(parts, operator))
    }

    fn comparison(&self, attribute: &FilterAttribute, operator: &str, pattern: Pattern) -> QueryResult<ResourceQuery> {
        let value = attribute.single_value().ok_or_else(|| QueryError::InvalidValue {
            attribute: attribute.name.clone(),
            reason: format!("expected exactly one value, got {}", attribute.values.len()),
        })?;
        let (column, column_type) = self.resolve(&attribute.name)?;
        let fragment = match pattern {
            Pattern::Exact => {
                let literal = sql_literal(&attribute.name, value, column_type)?;
                format!("{column} {operator} {literal}")
            }
            Pattern::Contains | Pattern::StartsWith | Pattern::EndsWith => {
                let (text, escaped) = like_escape(&value.to_string());
                let pattern = match pattern {
                    Pattern::Contains => format!("%{text}%"),
                    Pattern::StartsWith => format!("{text}%"),
                    _ => format!("%{text}"),
                };
                let escape = if escaped { format!(" ESCAPE '{LIKE_ESCAPE}'") } else { String::new() };
                format!("{column}::TEXT {operator} {}{escape}", quote(&pattern))
            }
        };
        Ok(ResourceQuery::leaf(fragment))
    }

    /// Finds the first table carrying the attribute's column.
    ///
    /// Returns the qualified `table.column` and its type.
    fn resolve(&self, name: &str) -> QueryResult<(String, ColumnType)> {
        let attribute = self.schema.attribute_name(name);
        let native = self.schema.native_column(&attribute);
        let (wanted_table, column) = match native.split_once('.') {
            Some((table, column)) => (Some(table), column),
            None => (None, native),
        };
        self.tables
            .tables()
            .filter(|(table, _)| wanted_table.is_none_or(|w| w == *table))
            .find_map(|(table, columns)| {
                columns
                    .iter()
                    .find(|c| c.name == column)
                    .map(|c| (format!("{table}.{column}"), c.column_type))
            })
            .ok_or_else(|| QueryError::UnknownAttribute(name.to_string()))
    }
}
