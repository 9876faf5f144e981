//! Search and incremental sync for the Grouper connector.
//!
//! Both run against a [`grouper_storage::SqlConnection`] and hand complete
//! [`grouper_model::GrouperObject`]s to a caller supplied handler.
//!
//! ## Components
//!
//! - **Search**: filtered search of one kind, paged by offset or by primary
//!   key, split into chunks when a maximum page size is configured
//! - **Engine**: change detection from `last_modified` watermarks, emitting
//!   create-or-update and delete deltas in timestamp order
//! - **Merger**: interleaves the group and subject change streams for syncs
//!   over all kinds
//!
//! ## Sync process
//!
//! 1. **Detect**: select the identifier, tombstone and latest timestamp of
//!    every object changed after the token, grouped per object
//! 2. **Chunk**: count the changes and fetch them in pages of the maximum size
//! 3. **Rehydrate**: fetch full objects for the live changes of each chunk
//! 4. **Emit**: hand deltas to the handler until it asks to stop

mod engine;
mod error;
mod merger;
mod processing;
pub mod protocol;
mod search;

pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use merger::{MergeByTimestamp, merge_by_timestamp};
pub use processing::{ObjectProcessing, ProcessingConfig, Projection, chunk_offsets};
pub use protocol::{SyncDelta, SyncResultsHandler, SyncSummary};
pub use search::{ResultsHandler, SearchEngine, SearchResult};
