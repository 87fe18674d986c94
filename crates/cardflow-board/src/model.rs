#![forbid(unsafe_code)]

//! Board data model: columns (lists) holding ordered cards (items).
//!
//! The engine only ever mutates an item's `list_id` and `order_index`.
//! Every mutation leaves each list's indices contiguous (`0..len`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::store::{BoardStore, CommitOp};

/// Stable identifier for an item (card).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// Stable identifier for a list (column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListId(u64);

impl ListId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list#{}", self.0)
    }
}

/// A card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub list_id: ListId,
    pub title: String,
    pub order_index: usize,
}

impl Item {
    #[must_use]
    pub fn new(id: ItemId, list_id: ListId, title: impl Into<String>, order_index: usize) -> Self {
        Self {
            id,
            list_id,
            title: title.into(),
            order_index,
        }
    }
}

/// A column on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ListId,
    pub name: String,
    pub order_index: usize,
}

impl Column {
    #[must_use]
    pub fn new(id: ListId, name: impl Into<String>, order_index: usize) -> Self {
        Self {
            id,
            name: name.into(),
            order_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnEntry {
    column: Column,
    items: Vec<Item>,
}

/// In-memory board: ordered columns, each holding an ordered item sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardModel {
    columns: Vec<ColumnEntry>,
}

impl BoardModel {
    /// Build a model from columns and their items.
    ///
    /// Columns are ordered by `order_index`, items within each column by
    /// `order_index`; both are then renumbered to be contiguous. Item
    /// `list_id`s are rewritten to the column they were handed in with.
    #[must_use]
    pub fn new(columns: Vec<(Column, Vec<Item>)>) -> Self {
        let mut entries: Vec<ColumnEntry> = columns
            .into_iter()
            .map(|(column, mut items)| {
                items.sort_by_key(|item| item.order_index);
                ColumnEntry { column, items }
            })
            .collect();
        entries.sort_by_key(|entry| entry.column.order_index);
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.column.order_index = index;
            let list_id = entry.column.id;
            for item in &mut entry.items {
                item.list_id = list_id;
            }
            renumber(&mut entry.items);
        }
        Self { columns: entries }
    }

    /// Read every column and its items through the store's read model.
    pub fn load<S: BoardStore + ?Sized>(store: &S) -> Result<Self, BoardError> {
        let columns = store.read_columns()?;
        let mut loaded = Vec::with_capacity(columns.len());
        for column in columns {
            let items = store.read_items(column.id)?;
            loaded.push((column, items));
        }
        Ok(Self::new(loaded))
    }

    /// Columns in board order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().map(|entry| &entry.column)
    }

    /// Column metadata by id.
    #[must_use]
    pub fn column(&self, list: ListId) -> Option<&Column> {
        self.entry(list).map(|entry| &entry.column)
    }

    /// Items of one list, in order.
    #[must_use]
    pub fn items(&self, list: ListId) -> Option<&[Item]> {
        self.entry(list).map(|entry| entry.items.as_slice())
    }

    /// Item ids of one list, in order.
    #[must_use]
    pub fn item_ids(&self, list: ListId) -> Vec<ItemId> {
        self.items(list)
            .map(|items| items.iter().map(|item| item.id).collect())
            .unwrap_or_default()
    }

    /// Find an item by id.
    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.columns
            .iter()
            .flat_map(|entry| entry.items.iter())
            .find(|item| item.id == id)
    }

    /// List and index currently holding `id`.
    #[must_use]
    pub fn locate(&self, id: ItemId) -> Option<(ListId, usize)> {
        self.columns.iter().find_map(|entry| {
            entry
                .items
                .iter()
                .position(|item| item.id == id)
                .map(|index| (entry.column.id, index))
        })
    }

    /// Number of items in `list`.
    #[must_use]
    pub fn len(&self, list: ListId) -> Option<usize> {
        self.entry(list).map(|entry| entry.items.len())
    }

    /// Whether the board has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Move `id` into `target` at `position`.
    ///
    /// `position` is interpreted against the target list *without* the
    /// moved item, so `0..=len` is valid and `len` appends.
    pub fn move_item(&mut self, id: ItemId, target: ListId, position: usize) -> Result<(), BoardError> {
        let (source, source_index) = self.locate(id).ok_or(BoardError::UnknownItem(id))?;
        let target_len = self.len(target).ok_or(BoardError::UnknownList(target))?;
        let len_without = if source == target {
            target_len - 1
        } else {
            target_len
        };
        if position > len_without {
            return Err(BoardError::PositionOutOfRange {
                list: target,
                position,
                len: len_without,
            });
        }

        let source_entry = self.entry_mut(source).ok_or(BoardError::UnknownList(source))?;
        let mut item = source_entry.items.remove(source_index);
        renumber(&mut source_entry.items);

        let target_entry = self.entry_mut(target).ok_or(BoardError::UnknownList(target))?;
        item.list_id = target;
        target_entry.items.insert(position, item);
        renumber(&mut target_entry.items);
        Ok(())
    }

    /// Remove `id` from whichever list holds it.
    pub fn remove_item(&mut self, id: ItemId) -> Result<Item, BoardError> {
        let (list, index) = self.locate(id).ok_or(BoardError::UnknownItem(id))?;
        let entry = self.entry_mut(list).ok_or(BoardError::UnknownList(list))?;
        let item = entry.items.remove(index);
        renumber(&mut entry.items);
        Ok(item)
    }

    /// Apply a committed operation. A move's position is clamped to the
    /// target's append slot.
    pub fn apply(&mut self, op: &CommitOp) -> Result<(), BoardError> {
        match *op {
            CommitOp::Move {
                item,
                target,
                position,
                ..
            } => {
                let (current, _) = self.locate(item).ok_or(BoardError::UnknownItem(item))?;
                let len = self.len(target).ok_or(BoardError::UnknownList(target))?;
                let slot = if current == target {
                    len.saturating_sub(1)
                } else {
                    len
                };
                self.move_item(item, target, position.min(slot))
            }
            CommitOp::Delete { item, .. } => self.remove_item(item).map(|_| ()),
        }
    }

    /// Lists whose item order differs from `other`.
    #[must_use]
    pub fn changed_lists(&self, other: &BoardModel) -> Vec<ListId> {
        self.columns
            .iter()
            .map(|entry| entry.column.id)
            .filter(|&list| self.item_ids(list) != other.item_ids(list))
            .collect()
    }

    /// Whether every list's indices are exactly `0..len` and every item
    /// carries its list's id.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        self.columns.iter().all(|entry| {
            entry
                .items
                .iter()
                .enumerate()
                .all(|(index, item)| item.order_index == index && item.list_id == entry.column.id)
        })
    }

    fn entry(&self, list: ListId) -> Option<&ColumnEntry> {
        self.columns.iter().find(|entry| entry.column.id == list)
    }

    fn entry_mut(&mut self, list: ListId) -> Option<&mut ColumnEntry> {
        self.columns.iter_mut().find(|entry| entry.column.id == list)
    }
}

fn renumber(items: &mut [Item]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.order_index = index;
    }
}
