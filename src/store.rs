#![allow(dead_code)]
//! Record-store seam for menu items.
//!
//! The editor only ever talks to this trait; production wires in the
//! Supabase client, tests and local development use [`InMemoryStore`].

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::schema::{InsertMenuItem, MenuItem, MenuItemPatch};

/// Failure surfaced by a record store. Backend details are opaque and
/// passed through; callers display them and let the admin retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    MissingRecord(String),
    #[error("store request failed: {0}")]
    Request(#[from] anyhow::Error),
}

/// Async CRUD over the `menu_items` table. All calls may fail with a
/// transport-or-server error; none are assumed to complete synchronously.
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Fetch the full flat record list.
    async fn list(&self) -> Result<Vec<MenuItem>, StoreError>;

    /// Insert a record; the store generates the id.
    async fn insert(&self, record: InsertMenuItem) -> Result<MenuItem, StoreError>;

    /// Apply a partial update to one record.
    async fn update(&self, id: &str, patch: &MenuItemPatch) -> Result<(), StoreError>;

    /// Delete one record. Deleting an id that no longer exists is a no-op,
    /// matching PostgREST's filtered-DELETE semantics.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// In-memory store backed by a `Vec` behind `Arc<RwLock>`.
///
/// List order is stable by `sort_order` (insertion order breaks ties) so
/// tests are deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    items: Arc<RwLock<Vec<MenuItem>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store with existing records.
    pub fn seed(items: Vec<MenuItem>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
        }
    }

    /// Number of records currently held. Handy for asserting that a failed
    /// operation wrote nothing.
    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }
}

#[async_trait]
impl MenuStore for InMemoryStore {
    async fn list(&self) -> Result<Vec<MenuItem>, StoreError> {
        let mut items = self.items.read().unwrap().clone();
        items.sort_by_key(|i| i.sort_order);
        Ok(items)
    }

    async fn insert(&self, record: InsertMenuItem) -> Result<MenuItem, StoreError> {
        let item = MenuItem {
            id: format!("mi_{}", Uuid::new_v4().simple()),
            title: record.title,
            link: record.link,
            location: record.location,
            parent_id: record.parent_id,
            sort_order: record.sort_order,
            is_active: record.is_active,
        };
        self.items.write().unwrap().push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: &str, patch: &MenuItemPatch) -> Result<(), StoreError> {
        let mut items = self.items.write().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StoreError::MissingRecord(id.to_string()))?;
        apply_patch(item, patch);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.items.write().unwrap().retain(|i| i.id != id);
        Ok(())
    }
}

fn apply_patch(item: &mut MenuItem, patch: &MenuItemPatch) {
    if let Some(title) = &patch.title {
        item.title = title.clone();
    }
    if let Some(link) = &patch.link {
        item.link = link.clone();
    }
    if let Some(location) = patch.location {
        item.location = location;
    }
    if let Some(parent_id) = &patch.parent_id {
        item.parent_id = parent_id.clone();
    }
    if let Some(sort_order) = patch.sort_order {
        item.sort_order = sort_order;
    }
    if let Some(is_active) = patch.is_active {
        item.is_active = is_active;
    }
}
