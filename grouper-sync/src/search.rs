//! Filtered, paged search over one object kind.

use grouper_model::{AttributeName, Filter, GrouperObject, ObjectClassSchema};
use grouper_query::{OperationOptions, QueryBuilder};
use grouper_storage::SqlConnection;
use grouper_types::ObjectKind;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::processing::{ObjectProcessing, ProcessingConfig, chunk_offsets};

/// Receives search results. Returning `false` stops the search.
pub trait ResultsHandler {
    fn handle(&mut self, object: GrouperObject) -> bool;
}

impl<F> ResultsHandler for F
where
    F: FnMut(GrouperObject) -> bool,
{
    fn handle(&mut self, object: GrouperObject) -> bool {
        self(object)
    }
}

/// Paging state handed back after a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Identifier of the last object handed to the handler.
    pub paged_results_cookie: Option<String>,
    /// Objects left unhandled when the handler stopped early, `-1` otherwise.
    pub remaining_paged_results: i64,
}

impl SearchResult {
    const fn complete(cookie: Option<String>) -> Self {
        Self {
            paged_results_cookie: cookie,
            remaining_paged_results: -1,
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.remaining_paged_results < 0
    }
}

/// Executes searches for groups and subjects.
#[derive(Debug, Clone, Copy)]
pub struct SearchEngine<'a> {
    config: &'a ProcessingConfig,
    groups: &'a ObjectClassSchema,
    subjects: &'a ObjectClassSchema,
}

impl<'a> SearchEngine<'a> {
    #[must_use]
    pub const fn new(
        config: &'a ProcessingConfig,
        groups: &'a ObjectClassSchema,
        subjects: &'a ObjectClassSchema,
    ) -> Self {
        Self {
            config,
            groups,
            subjects,
        }
    }

    /// Streams every object of `kind` matching `filter` to `handler`.
    ///
    /// Tombstoned objects are left out when deleted objects are excluded.
    /// Results larger than the configured maximum page size are fetched in
    /// chunks, and objects are always handed over complete.
    pub fn search(
        &self,
        conn: &dyn SqlConnection,
        kind: ObjectKind,
        filter: Option<&Filter>,
        options: &OperationOptions,
        handler: &mut dyn ResultsHandler,
    ) -> SyncResult<SearchResult> {
        let schema = match kind {
            ObjectKind::Group => self.groups,
            ObjectKind::Subject => self.subjects,
            ObjectKind::All => return Err(SyncError::Unsupported(format!("search over {kind} kinds"))),
        };
        let processing = ObjectProcessing::new(schema, self.config);
        info!(%kind, page_size = ?options.page_size, "executing search");

        let attributes = options.attributes();
        let paged = options.page_size.is_some() && self.config.enable_id_based_paging;
        let equals_uid = matches!(filter, Some(Filter::Equals(a)) if a.name == AttributeName::UID);
        let filter = processing.exclude_deleted(filter.cloned());
        let filter = filter.as_ref();

        if !equals_uid && let Some(max) = processing.chunk_size(options.page_size) {
            let primary = processing
                .builder(processing.projection(attributes, filter, false), filter)?
                .with_options(options.clone());
            let total = processing.count(conn, &primary)?;
            debug!(total, max, "counted search results");
            if total > max {
                return self.search_chunked(conn, &processing, primary, total, max, attributes, handler);
            }
        }

        let builder = processing
            .builder(processing.projection(attributes, filter, !paged), filter)?
            .with_options(options.clone());
        self.execute(conn, &processing, &builder, attributes, paged, handler)
    }

    #[allow(clippy::too_many_arguments)]
    fn search_chunked(
        &self,
        conn: &dyn SqlConnection,
        processing: &ObjectProcessing<'_>,
        primary: QueryBuilder,
        total: u64,
        max: u64,
        attributes: &[String],
        handler: &mut dyn ResultsHandler,
    ) -> SyncResult<SearchResult> {
        let mut last = SearchResult::complete(None);
        for offset in chunk_offsets(total, max) {
            debug!(offset, max, "fetching search chunk");
            let mut page = primary.clone();
            page.set_page(max, offset);
            let result = self.execute(conn, processing, &page, attributes, !attributes.is_empty(), handler)?;
            if !result.is_complete() {
                return Ok(result);
            }
            if result.paged_results_cookie.is_some() {
                last = result;
            }
        }
        Ok(last)
    }

    fn execute(
        &self,
        conn: &dyn SqlConnection,
        processing: &ObjectProcessing<'_>,
        builder: &QueryBuilder,
        attributes: &[String],
        rehydrate: bool,
        handler: &mut dyn ResultsHandler,
    ) -> SyncResult<SearchResult> {
        let rows = processing.run(conn, &builder.build()?, "searching")?;
        let mut objects = processing.materializer().materialize(&rows)?;
        if objects.is_empty() {
            debug!("search returned no objects");
            return Ok(SearchResult::complete(None));
        }
        if rehydrate {
            objects = processing.rehydrate(conn, objects, attributes, true)?;
        }

        let total = objects.len();
        let mut cookie = None;
        for (handled, (id, object)) in objects.into_iter().enumerate() {
            cookie = Some(id);
            if !handler.handle(object) {
                let remaining = i64::try_from(total - handled).unwrap_or(i64::MAX);
                warn!(remaining, "search stopped by results handler");
                return Ok(SearchResult {
                    paged_results_cookie: cookie,
                    remaining_paged_results: remaining,
                });
            }
        }
        Ok(SearchResult::complete(cookie))
    }
}
