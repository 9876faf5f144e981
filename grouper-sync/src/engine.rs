//! Incremental synchronization.

use grouper_model::columns::LATEST_TIMESTAMP;
use grouper_model::{GrouperObject, ObjectClassSchema};
use grouper_query::{OperationOptions, QueryBuilder};
use grouper_storage::{SqlConnection, SqlValue};
use grouper_types::{ObjectKind, SyncToken};
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};
use crate::merger::merge_by_timestamp;
use crate::processing::{ObjectProcessing, ProcessingConfig, chunk_offsets};
use crate::protocol::{SyncDelta, SyncResultsHandler, SyncSummary};

/// Turns objects into deltas for a handler and keeps the tally.
struct Emitter<'h> {
    handler: &'h mut dyn SyncResultsHandler,
    summary: SyncSummary,
}

impl<'h> Emitter<'h> {
    fn new(handler: &'h mut dyn SyncResultsHandler) -> Self {
        Self {
            handler,
            summary: SyncSummary::default(),
        }
    }

    fn emit(&mut self, object: GrouperObject) -> SyncResult<bool> {
        let delta = SyncDelta::from_object(object)?;
        let token = delta.token();
        let keep_going = self.handler.handle(delta);
        self.summary.emitted += 1;
        self.summary.last_token = Some(token);
        if !keep_going {
            warn!(emitted = self.summary.emitted, "sync stopped by results handler");
            self.summary.interrupted = true;
        }
        Ok(keep_going)
    }
}

/// Computes change streams from modification timestamps.
#[derive(Debug, Clone, Copy)]
pub struct SyncEngine<'a> {
    config: &'a ProcessingConfig,
    groups: &'a ObjectClassSchema,
    subjects: &'a ObjectClassSchema,
}

impl<'a> SyncEngine<'a> {
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

    fn processing(&self, kind: ObjectKind) -> SyncResult<ObjectProcessing<'a>> {
        match kind {
            ObjectKind::Group => Ok(ObjectProcessing::new(self.groups, self.config)),
            ObjectKind::Subject => Ok(ObjectProcessing::new(self.subjects, self.config)),
            ObjectKind::All => Err(SyncError::Unsupported(format!("no tables for {kind} kinds"))),
        }
    }

    /// Emits every change newer than `token`, oldest first.
    ///
    /// Without a token nothing is emitted and the summary carries the current
    /// latest token instead, so the caller can start from there.
    pub fn sync(
        &self,
        conn: &dyn SqlConnection,
        kind: ObjectKind,
        token: Option<SyncToken>,
        options: &OperationOptions,
        handler: &mut dyn SyncResultsHandler,
    ) -> SyncResult<SyncSummary> {
        let Some(token) = token else {
            let latest = self.latest_sync_token(conn, kind)?;
            info!(%kind, latest = ?latest, "sync without token, returning latest token");
            return Ok(SyncSummary {
                last_token: latest,
                ..SyncSummary::default()
            });
        };
        info!(%kind, %token, "starting sync");

        let mut emitter = Emitter::new(handler);
        match kind {
            ObjectKind::All => {
                let mut attributes = options.attributes().to_vec();
                for extra in &self.config.attrs_to_have_in_all_search {
                    if !attributes.contains(extra) {
                        attributes.push(extra.clone());
                    }
                }
                let groups = self.collect(conn, ObjectKind::Group, token, &attributes, options.page_size)?;
                let subjects = self.collect(conn, ObjectKind::Subject, token, &attributes, options.page_size)?;
                debug!(groups = groups.len(), subjects = subjects.len(), "merging change streams");
                for object in merge_by_timestamp(groups, subjects) {
                    if !emitter.emit(object)? {
                        break;
                    }
                }
            }
            concrete => {
                let processing = self.processing(concrete)?;
                self.stream_changes(
                    conn,
                    &processing,
                    token,
                    options.attributes(),
                    options.page_size,
                    &mut |object| emitter.emit(object),
                )?;
            }
        }

        let summary = emitter.summary;
        info!(%kind, emitted = summary.emitted, interrupted = summary.interrupted, "sync finished");
        Ok(summary)
    }

    fn collect(
        &self,
        conn: &dyn SqlConnection,
        kind: ObjectKind,
        token: SyncToken,
        attributes: &[String],
        page_size: Option<u64>,
    ) -> SyncResult<Vec<GrouperObject>> {
        let processing = self.processing(kind)?;
        let mut objects = Vec::new();
        self.stream_changes(conn, &processing, token, attributes, page_size, &mut |object| {
            objects.push(object);
            Ok(true)
        })?;
        Ok(objects)
    }

    /// Feeds the changes of one kind to `sink` until it returns `false`.
    /// Returns whether the stream was read to the end.
    fn stream_changes(
        &self,
        conn: &dyn SqlConnection,
        processing: &ObjectProcessing<'_>,
        token: SyncToken,
        attributes: &[String],
        page_size: Option<u64>,
        sink: &mut dyn FnMut(GrouperObject) -> SyncResult<bool>,
    ) -> SyncResult<bool> {
        let schema = processing.schema();
        let projection = processing.watermark_projection(attributes);
        let filter = processing.watermark_filter(token, &projection.tables);
        let builder = processing
            .builder(projection, Some(&filter))?
            .with_sync_mode(true)
            .with_order_by(vec![LATEST_TIMESTAMP.to_string(), schema.qualified_uid()]);

        if let Some(max) = processing.chunk_size(page_size) {
            let total = processing.count(conn, &builder)?;
            debug!(kind = %schema.kind(), total, max, "counted changes");
            if total > max {
                for offset in chunk_offsets(total, max) {
                    let mut page = builder.clone();
                    page.set_page(max, offset);
                    if !self.process_chunk(conn, processing, &page, attributes, sink)? {
                        return Ok(false);
                    }
                }
                return Ok(true);
            }
        }
        self.process_chunk(conn, processing, &builder, attributes, sink)
    }

    fn process_chunk(
        &self,
        conn: &dyn SqlConnection,
        processing: &ObjectProcessing<'_>,
        builder: &QueryBuilder,
        attributes: &[String],
        sink: &mut dyn FnMut(GrouperObject) -> SyncResult<bool>,
    ) -> SyncResult<bool> {
        let rows = processing.run(conn, &builder.build()?, "detecting changed")?;
        let changed = processing.materializer().materialize(&rows)?;
        debug!(kind = %processing.schema().kind(), changed = changed.len(), "fetched change chunk");
        let objects = processing.rehydrate(conn, changed, attributes, false)?;
        for object in objects.into_values() {
            if !sink(object)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The largest modification timestamp over every table of `kind`.
    ///
    /// `Ok(None)` means the tables hold no timestamps at all.
    pub fn latest_sync_token(&self, conn: &dyn SqlConnection, kind: ObjectKind) -> SyncResult<Option<SyncToken>> {
        if kind == ObjectKind::All {
            let groups = self.latest_sync_token(conn, ObjectKind::Group)?;
            let subjects = self.latest_sync_token(conn, ObjectKind::Subject)?;
            return Ok(SyncToken::latest(groups, subjects));
        }
        let processing = self.processing(kind)?;
        let builder = processing
            .builder(processing.token_projection(), None)?
            .with_sync_mode(true);
        let rows = processing.run(conn, &builder.sync_token_query()?, "fetching latest token of")?;
        let row = rows.first().ok_or(SyncError::LatestTokenUnavailable(kind))?;
        let latest = row.get(0).and_then(SqlValue::as_i64).map(SyncToken::new);
        debug!(%kind, latest = ?latest, "fetched latest sync token");
        Ok(latest)
    }
}
