//! What a sync hands to its caller.

use grouper_model::GrouperObject;
use grouper_types::{ObjectKind, SyncToken};
use serde::Serialize;

use crate::error::{SyncError, SyncResult};

/// One change event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncDelta {
    CreateOrUpdate { token: SyncToken, object: GrouperObject },
    Delete { token: SyncToken, kind: ObjectKind, uid: String },
}

impl SyncDelta {
    /// Builds the delta for a changed object: tombstoned objects become
    /// deletes, everything else a create-or-update.
    pub fn from_object(object: GrouperObject) -> SyncResult<Self> {
        let token = object
            .sync_token()
            .ok_or_else(|| SyncError::InvalidChange("change without latest timestamp".into()))?;
        if object.is_deleted() {
            let uid = object
                .identifier()
                .ok_or_else(|| SyncError::InvalidChange("deleted object without identifier".into()))?
                .to_string();
            Ok(Self::Delete {
                token,
                kind: object.kind(),
                uid,
            })
        } else {
            Ok(Self::CreateOrUpdate { token, object })
        }
    }

    #[must_use]
    pub fn token(&self) -> SyncToken {
        match self {
            Self::CreateOrUpdate { token, .. } | Self::Delete { token, .. } => *token,
        }
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        match self {
            Self::CreateOrUpdate { object, .. } => object.identifier(),
            Self::Delete { uid, .. } => Some(uid),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::CreateOrUpdate { object, .. } => object.kind(),
            Self::Delete { kind, .. } => *kind,
        }
    }
}

/// Receives sync deltas. Returning `false` stops the sync.
pub trait SyncResultsHandler {
    fn handle(&mut self, delta: SyncDelta) -> bool;
}

impl<F> SyncResultsHandler for F
where
    F: FnMut(SyncDelta) -> bool,
{
    fn handle(&mut self, delta: SyncDelta) -> bool {
        self(delta)
    }
}

/// Outcome of a sync call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub emitted: usize,
    /// Token of the last emitted delta, or the current latest token when the
    /// call was made without one.
    pub last_token: Option<SyncToken>,
    pub interrupted: bool,
}
