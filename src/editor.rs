//! Menu editing service.
//!
//! Each operation re-fetches the flat record list, plans the mutation on
//! that snapshot (`MenuTree`), then issues the writes. Nothing is mutated
//! optimistically: after a write the caller re-fetches, so the UI always
//! shows the store's actual state, even after a partially-applied
//! multi-row reorder.

use std::sync::Arc;

use tracing::{debug, info};

use crate::menu::{MenuError, MenuTree, MoveDirection, Placement};
use crate::schema::{InsertMenuItem, MenuItem, MenuItemPatch, MenuNode, MenuSlot, NewMenuItem};
use crate::store::MenuStore;

pub struct MenuEditor {
    store: Arc<dyn MenuStore>,
}

impl MenuEditor {
    pub fn new(store: Arc<dyn MenuStore>) -> Self {
        Self { store }
    }

    async fn snapshot(&self) -> Result<MenuTree, MenuError> {
        Ok(MenuTree::new(self.store.list().await?))
    }

    /// Flat admin listing, inactive items included.
    pub async fn list(&self) -> Result<Vec<MenuItem>, MenuError> {
        Ok(self.store.list().await?)
    }

    /// Nested public menu for one render slot, inactive items excluded.
    pub async fn render(&self, slot: MenuSlot) -> Result<Vec<MenuNode>, MenuError> {
        Ok(self.snapshot().await?.render(slot))
    }

    /// Create a root item or a submenu entry. The new record is appended
    /// to the end of its sibling group.
    pub async fn create(&self, input: NewMenuItem) -> Result<MenuItem, MenuError> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(MenuError::Validation("title must not be empty".into()));
        }
        let link = input.link.trim();
        if link.is_empty() {
            return Err(MenuError::Validation("link must not be empty".into()));
        }

        let tree = self.snapshot().await?;
        if let Some(parent_id) = &input.parent_id {
            if !tree.contains(parent_id) {
                return Err(MenuError::NotFound(parent_id.clone()));
            }
        }

        let sort_order = tree.sibling_count(input.parent_id.as_deref());
        let record = InsertMenuItem {
            title: title.to_string(),
            link: link.to_string(),
            location: input.location,
            parent_id: input.parent_id,
            sort_order,
            is_active: input.is_active,
        };
        let item = self.store.insert(record).await?;
        info!("Created menu item {} (\"{}\")", item.id, item.title);
        Ok(item)
    }

    /// Apply a field patch and return the refreshed record. A `parent_id`
    /// change keeps the item's existing `sort_order`, so it lands among
    /// its new siblings at its old position; the next drop reorder
    /// renumbers the group densely.
    pub async fn update(&self, id: &str, patch: MenuItemPatch) -> Result<MenuItem, MenuError> {
        let patch = normalize_patch(patch)?;

        let tree = self.snapshot().await?;
        if !tree.contains(id) {
            return Err(MenuError::NotFound(id.to_string()));
        }
        if let Some(Some(parent_id)) = &patch.parent_id {
            if !tree.contains(parent_id) {
                return Err(MenuError::NotFound(parent_id.clone()));
            }
            if tree.would_cycle(id, parent_id) {
                return Err(MenuError::Cycle {
                    id: id.to_string(),
                    parent_id: parent_id.clone(),
                });
            }
        }

        if !patch.is_empty() {
            self.store.update(id, &patch).await?;
            info!("Updated menu item {}", id);
        }

        // Hand back the authoritative row, re-fetched after the write.
        let items = self.store.list().await?;
        items
            .into_iter()
            .find(|i| i.id == id)
            .ok_or_else(|| MenuError::NotFound(id.to_string()))
    }

    /// Cascading delete: the whole subtree is removed, leaves first, so an
    /// interrupted cascade never leaves orphaned children behind. Returns
    /// the number of deleted records.
    pub async fn delete(&self, id: &str) -> Result<usize, MenuError> {
        let tree = self.snapshot().await?;
        if !tree.contains(id) {
            return Err(MenuError::NotFound(id.to_string()));
        }

        let order = tree.deletion_order(id);
        for victim in &order {
            self.store.delete(victim).await?;
        }
        info!("Deleted menu item {} ({} records incl. subtree)", id, order.len());
        Ok(order.len())
    }

    /// Drag-drop: move `dragged_id` to sit immediately after `target_id`
    /// in the target's sibling group, renumbering the group densely.
    pub async fn reorder_by_drop(&self, dragged_id: &str, target_id: &str) -> Result<(), MenuError> {
        let tree = self.snapshot().await?;
        let placements = tree.plan_drop(dragged_id, target_id)?;
        self.apply(placements).await
    }

    /// One-step up/down move within the sibling group. A boundary move is
    /// a successful no-op with no store write.
    pub async fn move_adjacent(&self, id: &str, direction: MoveDirection) -> Result<(), MenuError> {
        let tree = self.snapshot().await?;
        let placements = tree.plan_adjacent_move(id, direction)?;
        self.apply(placements).await
    }

    // The multi-row write is not atomic; a failure partway through is
    // surfaced and the admin retries against the re-fetched state.
    async fn apply(&self, placements: Vec<Placement>) -> Result<(), MenuError> {
        if placements.is_empty() {
            debug!("Reorder plan empty, nothing to write");
            return Ok(());
        }
        let count = placements.len();
        for placement in placements {
            let patch = MenuItemPatch {
                parent_id: Some(placement.parent_id),
                sort_order: Some(placement.sort_order),
                ..Default::default()
            };
            self.store.update(&placement.id, &patch).await?;
        }
        info!("Reorder wrote {} placements", count);
        Ok(())
    }
}

/// Trim patched text fields and reject empties before touching the store.
fn normalize_patch(mut patch: MenuItemPatch) -> Result<MenuItemPatch, MenuError> {
    // sort_order belongs to the reorder operations; a stray value here
    // would duplicate an ordering key that nothing renumbers.
    patch.sort_order = None;
    if let Some(title) = &patch.title {
        let title = title.trim();
        if title.is_empty() {
            return Err(MenuError::Validation("title must not be empty".into()));
        }
        patch.title = Some(title.to_string());
    }
    if let Some(link) = &patch.link {
        let link = link.trim();
        if link.is_empty() {
            return Err(MenuError::Validation("link must not be empty".into()));
        }
        patch.link = Some(link.to_string());
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MenuLocation;
    use crate::store::InMemoryStore;

    fn editor() -> (MenuEditor, InMemoryStore) {
        let store = InMemoryStore::new();
        (MenuEditor::new(Arc::new(store.clone())), store)
    }

    fn new_item(title: &str, link: &str, parent_id: Option<String>) -> NewMenuItem {
        NewMenuItem {
            title: title.to_string(),
            link: link.to_string(),
            location: MenuLocation::Header,
            parent_id,
            is_active: true,
        }
    }

    fn reparent(parent_id: Option<&str>) -> MenuItemPatch {
        MenuItemPatch {
            parent_id: Some(parent_id.map(str::to_string)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_appends_to_sibling_group() {
        let (editor, _) = editor();
        let home = editor.create(new_item("Home", "/", None)).await.unwrap();
        let about = editor.create(new_item("About", "/about", None)).await.unwrap();
        assert_eq!(home.sort_order, 0);
        assert_eq!(about.sort_order, 1);

        // children count independently per group
        let sub = editor
            .create(new_item("Team", "/about/team", Some(about.id.clone())))
            .await
            .unwrap();
        assert_eq!(sub.sort_order, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let (editor, store) = editor();
        let err = editor.create(new_item("   ", "/", None)).await.unwrap_err();
        assert!(matches!(err, MenuError::Validation(_)));
        let err = editor.create(new_item("Home", "  ", None)).await.unwrap_err();
        assert!(matches!(err, MenuError::Validation(_)));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_create_trims_fields() {
        let (editor, _) = editor();
        let item = editor.create(new_item("  Home ", " / ", None)).await.unwrap();
        assert_eq!(item.title, "Home");
        assert_eq!(item.link, "/");
    }

    #[tokio::test]
    async fn test_create_under_missing_parent() {
        let (editor, store) = editor();
        let err = editor
            .create(new_item("Sub", "/sub", Some("ghost".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, MenuError::NotFound(_)));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_self_parenting_rejected_without_write() {
        let (editor, _) = editor();
        let home = editor.create(new_item("Home", "/", None)).await.unwrap();

        let err = editor
            .update(&home.id, reparent(Some(&home.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, MenuError::Cycle { .. }));

        let items = editor.list().await.unwrap();
        assert_eq!(items[0].parent_id, None);
    }

    #[tokio::test]
    async fn test_cycle_rules_across_three_levels() {
        let (editor, _) = editor();
        let a = editor.create(new_item("A", "/a", None)).await.unwrap();
        let b = editor
            .create(new_item("B", "/b", Some(a.id.clone())))
            .await
            .unwrap();
        let c = editor
            .create(new_item("C", "/c", Some(b.id.clone())))
            .await
            .unwrap();

        // Pulling the grandchild up is legal.
        editor.update(&c.id, reparent(Some(&a.id))).await.unwrap();

        // Pushing the root under its (former) grandchild is not: c now
        // sits under a, so a under c is still a cycle.
        let err = editor.update(&a.id, reparent(Some(&c.id))).await.unwrap_err();
        assert!(matches!(err, MenuError::Cycle { .. }));
    }

    #[tokio::test]
    async fn test_reparent_preserves_sort_order() {
        let (editor, _) = editor();
        let a = editor.create(new_item("A", "/a", None)).await.unwrap();
        let _b = editor.create(new_item("B", "/b", None)).await.unwrap();
        let c = editor.create(new_item("C", "/c", None)).await.unwrap();
        assert_eq!(c.sort_order, 2);

        editor.update(&c.id, reparent(Some(&a.id))).await.unwrap();
        let items = editor.list().await.unwrap();
        let moved = items.iter().find(|i| i.id == c.id).unwrap();
        assert_eq!(moved.parent_id.as_deref(), Some(a.id.as_str()));
        // Existing behavior: no automatic renumber on re-parent.
        assert_eq!(moved.sort_order, 2);
    }

    #[tokio::test]
    async fn test_cascading_delete_leaves_no_orphans() {
        let (editor, _) = editor();
        let parent = editor.create(new_item("Parent", "/p", None)).await.unwrap();
        let child1 = editor
            .create(new_item("Child1", "/p/1", Some(parent.id.clone())))
            .await
            .unwrap();
        let _child2 = editor
            .create(new_item("Child2", "/p/2", Some(parent.id.clone())))
            .await
            .unwrap();
        let _grandchild = editor
            .create(new_item("Grand", "/p/1/g", Some(child1.id.clone())))
            .await
            .unwrap();
        let survivor = editor.create(new_item("Other", "/o", None)).await.unwrap();

        let deleted = editor.delete(&parent.id).await.unwrap();
        assert_eq!(deleted, 4);

        let items = editor.list().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, survivor.id);
        assert!(items.iter().all(|i| i.parent_id.is_none()));
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let (editor, _) = editor();
        let err = editor.delete("ghost").await.unwrap_err();
        assert!(matches!(err, MenuError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_drop_reorder_end_to_end() {
        let (editor, _) = editor();
        let home = editor.create(new_item("Home", "/", None)).await.unwrap();
        let about = editor.create(new_item("About", "/about", None)).await.unwrap();

        editor.reorder_by_drop(&home.id, &about.id).await.unwrap();

        let rendered = editor.render(MenuSlot::Header).await.unwrap();
        let titles: Vec<&str> = rendered.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, ["About", "Home"]);

        let items = editor.list().await.unwrap();
        let order_of = |id: &str| items.iter().find(|i| i.id == id).unwrap().sort_order;
        assert_eq!(order_of(&about.id), 0);
        assert_eq!(order_of(&home.id), 1);
    }

    #[tokio::test]
    async fn test_adjacent_move_boundary_writes_nothing() {
        let (editor, _) = editor();
        let first = editor.create(new_item("First", "/1", None)).await.unwrap();
        let last = editor.create(new_item("Last", "/2", None)).await.unwrap();

        editor.move_adjacent(&first.id, MoveDirection::Up).await.unwrap();
        editor.move_adjacent(&last.id, MoveDirection::Down).await.unwrap();

        let items = editor.list().await.unwrap();
        assert_eq!(items[0].id, first.id);
        assert_eq!(items[0].sort_order, 0);
        assert_eq!(items[1].id, last.id);
        assert_eq!(items[1].sort_order, 1);
    }

    #[tokio::test]
    async fn test_adjacent_move_swaps_neighbors() {
        let (editor, _) = editor();
        let first = editor.create(new_item("First", "/1", None)).await.unwrap();
        let second = editor.create(new_item("Second", "/2", None)).await.unwrap();

        editor.move_adjacent(&second.id, MoveDirection::Up).await.unwrap();

        let items = editor.list().await.unwrap();
        assert_eq!(items[0].id, second.id);
        assert_eq!(items[1].id, first.id);
    }

    #[tokio::test]
    async fn test_update_returns_refreshed_record() {
        let (editor, _) = editor();
        let home = editor.create(new_item("Home", "/", None)).await.unwrap();

        let patch = MenuItemPatch {
            title: Some("Start".to_string()),
            ..Default::default()
        };
        let updated = editor.update(&home.id, patch).await.unwrap();
        assert_eq!(updated.id, home.id);
        assert_eq!(updated.title, "Start");
        assert_eq!(updated.link, "/");
    }

    #[tokio::test]
    async fn test_empty_patch_on_missing_item_is_not_found() {
        let (editor, _) = editor();
        let err = editor
            .update("ghost", MenuItemPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MenuError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_patch_cannot_change_sort_order() {
        let (editor, _) = editor();
        let _first = editor.create(new_item("First", "/1", None)).await.unwrap();
        let second = editor.create(new_item("Second", "/2", None)).await.unwrap();

        // A stray sort_order in the patch must not create a duplicate
        // ordering key; only the reorder operations may renumber.
        let patch = MenuItemPatch {
            title: Some("Second again".to_string()),
            sort_order: Some(0),
            ..Default::default()
        };
        let updated = editor.update(&second.id, patch).await.unwrap();
        assert_eq!(updated.title, "Second again");
        assert_eq!(updated.sort_order, 1);

        let orders: Vec<i64> = editor
            .list()
            .await
            .unwrap()
            .iter()
            .map(|i| i.sort_order)
            .collect();
        assert_eq!(orders, [0, 1]);
    }

    #[tokio::test]
    async fn test_update_blank_title_rejected() {
        let (editor, _) = editor();
        let home = editor.create(new_item("Home", "/", None)).await.unwrap();
        let patch = MenuItemPatch {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        let err = editor.update(&home.id, patch).await.unwrap_err();
        assert!(matches!(err, MenuError::Validation(_)));
    }
}
