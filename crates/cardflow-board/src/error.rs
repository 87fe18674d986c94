#![forbid(unsafe_code)]

use thiserror::Error;

use crate::model::{ItemId, ListId};
use crate::store::{CommitId, StoreError};

pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    #[error("unknown list: {0}")]
    UnknownList(ListId),

    #[error("position {position} out of range for {list} (len {len})")]
    PositionOutOfRange {
        list: ListId,
        position: usize,
        len: usize,
    },

    #[error("no pending commit with id {0}")]
    UnknownCommit(CommitId),

    #[error("commit {commit} rejected, optimistic order reverted: {error}")]
    CommitRejected { commit: CommitId, error: StoreError },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl BoardError {
    /// Whether this error reports a rejected commit (the board has already
    /// reverted its optimistic order).
    #[must_use]
    pub fn is_commit_rejection(&self) -> bool {
        matches!(self, Self::CommitRejected { .. })
    }
}
