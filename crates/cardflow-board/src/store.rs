#![forbid(unsafe_code)]

//! Boundary to the external board store.
//!
//! The engine never calls the store on its own. A drop produces one
//! [`CommitRequest`]; the host executes it (now or later, synchronously or
//! not) and reports the outcome back to the board.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{BoardModel, Column, Item, ItemId, ListId};

/// Failure reported by the external store.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StoreError {
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read model and mutation calls the engine relies on.
pub trait BoardStore {
    /// Columns in board order.
    fn read_columns(&self) -> Result<Vec<Column>, StoreError>;

    /// Items of one list in order.
    fn read_items(&self, list: ListId) -> Result<Vec<Item>, StoreError>;

    /// Move an item. Called at most once per drop.
    fn move_item(
        &mut self,
        item: ItemId,
        source: ListId,
        target: ListId,
        position: usize,
    ) -> Result<Item, StoreError>;

    fn delete_item(&mut self, item: ItemId) -> Result<(), StoreError>;
}

/// Identifier of one emitted commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(u64);

impl CommitId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "commit#{}", self.0)
    }
}

/// The store call a drop resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CommitOp {
    Move {
        item: ItemId,
        source: ListId,
        target: ListId,
        position: usize,
    },
    Delete {
        item: ItemId,
        list: ListId,
    },
}

/// One commit the host must execute and report back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    pub id: CommitId,
    pub op: CommitOp,
}

impl CommitRequest {
    /// Run this commit against `store`.
    pub fn execute<S: BoardStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        match self.op {
            CommitOp::Move {
                item,
                source,
                target,
                position,
            } => store.move_item(item, source, target, position).map(|_| ()),
            CommitOp::Delete { item, .. } => store.delete_item(item),
        }
    }
}

/// In-memory [`BoardStore`], for tests and offline hosts.
///
/// Failures can be scripted with [`MemoryStore::fail_next`]; the next
/// mutation returns that error and leaves the data untouched.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    model: BoardModel,
    fail_next: Option<StoreError>,
    calls: Vec<CommitOp>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(model: BoardModel) -> Self {
        Self {
            model,
            fail_next: None,
            calls: Vec::new(),
        }
    }

    /// Make the next mutation fail with `error`.
    pub fn fail_next(&mut self, error: StoreError) {
        self.fail_next = Some(error);
    }

    /// Every mutation call received, in order (including failed ones).
    #[must_use]
    pub fn calls(&self) -> &[CommitOp] {
        &self.calls
    }

    #[must_use]
    pub fn model(&self) -> &BoardModel {
        &self.model
    }
}

impl BoardStore for MemoryStore {
    fn read_columns(&self) -> Result<Vec<Column>, StoreError> {
        Ok(self.model.columns().cloned().collect())
    }

    fn read_items(&self, list: ListId) -> Result<Vec<Item>, StoreError> {
        self.model
            .items(list)
            .map(<[Item]>::to_vec)
            .ok_or_else(|| StoreError::NotFound(list.to_string()))
    }

    fn move_item(
        &mut self,
        item: ItemId,
        source: ListId,
        target: ListId,
        position: usize,
    ) -> Result<Item, StoreError> {
        self.calls.push(CommitOp::Move {
            item,
            source,
            target,
            position,
        });
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }
        match self.model.locate(item) {
            Some((list, _)) if list == source => {}
            Some((list, _)) => {
                return Err(StoreError::Rejected(format!("{item} is in {list}, not {source}")));
            }
            None => return Err(StoreError::NotFound(item.to_string())),
        }
        self.model
            .move_item(item, target, position)
            .map_err(|err| StoreError::Rejected(err.to_string()))?;
        self.model
            .item(item)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(item.to_string()))
    }

    fn delete_item(&mut self, item: ItemId) -> Result<(), StoreError> {
        let Some((list, _)) = self.model.locate(item) else {
            return Err(StoreError::NotFound(item.to_string()));
        };
        self.calls.push(CommitOp::Delete { item, list });
        if let Some(error) = self.fail_next.take() {
            return Err(error);
        }
        self.model
            .remove_item(item)
            .map(|_| ())
            .map_err(|_| StoreError::NotFound(item.to_string()))
    }
}
