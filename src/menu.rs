//! Navigation menu tree logic.
//!
//! The menu is persisted as a flat list with `parent_id` links; this module
//! derives ordered views from a fetched snapshot and plans structural
//! mutations (re-parenting, drag-drop reindexing, adjacent swaps, cascading
//! deletes) as lists of record writes. Pure functions, no async — the
//! editor in `editor.rs` executes the plans against the store.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{MenuItem, MenuNode, MenuSlot};
use crate::store::StoreError;

/// Errors raised by menu operations. Validation and cycle errors are
/// detected before any store write.
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("{0}")]
    Validation(String),
    #[error("placing \"{id}\" under \"{parent_id}\" would create a cycle")]
    Cycle { id: String, parent_id: String },
    #[error("menu item not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Direction for a one-step sibling move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// One pending `parent_id` + `sort_order` write produced by a reorder plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub id: String,
    pub parent_id: Option<String>,
    pub sort_order: i64,
}

/// An immutable snapshot of the flat menu list with derived-view queries.
///
/// Rebuilt from a fresh fetch before every operation; never patched
/// incrementally.
#[derive(Debug, Clone)]
pub struct MenuTree {
    items: Vec<MenuItem>,
}

impl MenuTree {
    /// Build a snapshot. Items are stably sorted by `(sort_order, id)` so
    /// even corrupted duplicate orderings yield a deterministic view.
    pub fn new(mut items: Vec<MenuItem>) -> Self {
        items.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.id.cmp(&b.id))
        });
        Self { items }
    }

    pub fn get(&self, id: &str) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All items sharing the given parent (None = roots), ascending by
    /// `sort_order`. O(n) scan over the snapshot.
    pub fn children(&self, parent_id: Option<&str>) -> Vec<&MenuItem> {
        self.items
            .iter()
            .filter(|i| i.parent_id.as_deref() == parent_id)
            .collect()
    }

    /// Root items visible in the given render slot, ascending by
    /// `sort_order`. Children inherit visibility from their root, so only
    /// roots are filtered by location.
    pub fn roots_for_slot(&self, slot: MenuSlot) -> Vec<&MenuItem> {
        self.items
            .iter()
            .filter(|i| i.parent_id.is_none() && i.location.visible_in(slot))
            .collect()
    }

    pub fn sibling_count(&self, parent_id: Option<&str>) -> i64 {
        self.children(parent_id).len() as i64
    }

    /// Whether setting `candidate_parent` as the parent of `id` would make
    /// the parent graph cyclic.
    ///
    /// Walks the candidate's ancestor chain looking for `id`. The visited
    /// set guarantees termination even if the stored data already contains
    /// a cycle.
    pub fn would_cycle(&self, id: &str, candidate_parent: &str) -> bool {
        if id == candidate_parent {
            return true;
        }
        let mut visited = HashSet::new();
        let mut current = Some(candidate_parent);
        while let Some(ancestor) = current {
            if ancestor == id {
                return true;
            }
            if !visited.insert(ancestor) {
                // Pre-existing cycle in the stored data; the new edge is
                // not part of it.
                return false;
            }
            current = self
                .get(ancestor)
                .and_then(|item| item.parent_id.as_deref());
        }
        false
    }

    /// Ids of the subtree rooted at `id`, leaves first, `id` itself last.
    ///
    /// Deleting in this order means an interrupted cascade leaves a
    /// smaller but still internally-consistent subtree: no surviving
    /// record ever points at an already-deleted parent.
    pub fn deletion_order(&self, id: &str) -> Vec<String> {
        let mut order = Vec::new();
        self.collect_post_order(id, &mut order, &mut HashSet::new());
        order
    }

    fn collect_post_order<'a>(
        &'a self,
        id: &'a str,
        order: &mut Vec<String>,
        visited: &mut HashSet<&'a str>,
    ) {
        if !visited.insert(id) {
            return;
        }
        for child in self.children(Some(id)) {
            self.collect_post_order(&child.id, order, visited);
        }
        order.push(id.to_string());
    }

    /// Plan a drag-drop: `dragged` becomes a sibling of `target`,
    /// positioned immediately after it, and the whole resulting sibling
    /// group is renumbered densely from 0.
    ///
    /// Returns only the writes whose `parent_id` or `sort_order` actually
    /// change; an empty plan means nothing to persist. Dropping an item
    /// onto itself is a no-op; dropping it beside one of its own
    /// descendants is rejected, since that would write a cycle.
    pub fn plan_drop(&self, dragged_id: &str, target_id: &str) -> Result<Vec<Placement>, MenuError> {
        if dragged_id == target_id {
            return Ok(Vec::new());
        }
        let dragged = self
            .get(dragged_id)
            .ok_or_else(|| MenuError::NotFound(dragged_id.to_string()))?;
        let target = self
            .get(target_id)
            .ok_or_else(|| MenuError::NotFound(target_id.to_string()))?;

        let new_parent = target.parent_id.clone();
        if let Some(parent) = new_parent.as_deref() {
            if self.would_cycle(dragged_id, parent) {
                return Err(MenuError::Cycle {
                    id: dragged_id.to_string(),
                    parent_id: parent.to_string(),
                });
            }
        }

        // Target's sibling group without the dragged item, then splice the
        // dragged item back in right after the target.
        let mut group: Vec<&MenuItem> = self
            .children(new_parent.as_deref())
            .into_iter()
            .filter(|i| i.id != dragged_id)
            .collect();
        let target_index = group
            .iter()
            .position(|i| i.id == target_id)
            .ok_or_else(|| MenuError::NotFound(target_id.to_string()))?;
        group.insert(target_index + 1, dragged);

        let placements = group
            .iter()
            .enumerate()
            .filter(|(index, item)| {
                item.parent_id != new_parent || item.sort_order != *index as i64
            })
            .map(|(index, item)| Placement {
                id: item.id.clone(),
                parent_id: new_parent.clone(),
                sort_order: index as i64,
            })
            .collect();
        Ok(placements)
    }

    /// Plan a one-step up/down move: swap `sort_order` with the adjacent
    /// sibling. Returns an empty plan at either boundary (first item moving
    /// up, last item moving down).
    pub fn plan_adjacent_move(
        &self,
        id: &str,
        direction: MoveDirection,
    ) -> Result<Vec<Placement>, MenuError> {
        let item = self
            .get(id)
            .ok_or_else(|| MenuError::NotFound(id.to_string()))?;
        let siblings = self.children(item.parent_id.as_deref());
        let index = siblings
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| MenuError::NotFound(id.to_string()))?;

        let neighbor = match direction {
            MoveDirection::Up => {
                if index == 0 {
                    return Ok(Vec::new());
                }
                siblings[index - 1]
            }
            MoveDirection::Down => {
                if index + 1 >= siblings.len() {
                    return Ok(Vec::new());
                }
                siblings[index + 1]
            }
        };

        // Exchange two already-distinct values; no renumber needed.
        Ok(vec![
            Placement {
                id: item.id.clone(),
                parent_id: item.parent_id.clone(),
                sort_order: neighbor.sort_order,
            },
            Placement {
                id: neighbor.id.clone(),
                parent_id: neighbor.parent_id.clone(),
                sort_order: item.sort_order,
            },
        ])
    }

    /// Build the nested public view for one render slot. Inactive items
    /// are pruned together with their subtrees.
    pub fn render(&self, slot: MenuSlot) -> Vec<MenuNode> {
        self.roots_for_slot(slot)
            .into_iter()
            .filter(|i| i.is_active)
            .map(|i| self.render_node(i))
            .collect()
    }

    fn render_node(&self, item: &MenuItem) -> MenuNode {
        let children = self
            .children(Some(&item.id))
            .into_iter()
            .filter(|i| i.is_active)
            .map(|i| self.render_node(i))
            .collect();
        MenuNode {
            id: item.id.clone(),
            title: item.title.clone(),
            link: item.link.clone(),
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MenuLocation;

    fn item(id: &str, parent: Option<&str>, sort_order: i64) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            title: id.to_uppercase(),
            link: format!("/{}", id),
            location: MenuLocation::Header,
            parent_id: parent.map(str::to_string),
            sort_order,
            is_active: true,
        }
    }

    /// a ── b ── c, plus root sibling d.
    fn chain() -> MenuTree {
        MenuTree::new(vec![
            item("a", None, 0),
            item("b", Some("a"), 0),
            item("c", Some("b"), 0),
            item("d", None, 1),
        ])
    }

    #[test]
    fn test_children_sorted_by_sort_order() {
        let tree = MenuTree::new(vec![
            item("x", None, 2),
            item("y", None, 0),
            item("z", None, 1),
        ]);
        let ids: Vec<&str> = tree.children(None).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["y", "z", "x"]);
        let orders: Vec<i64> = tree.children(None).iter().map(|i| i.sort_order).collect();
        assert!(orders.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let tree = chain();
        assert!(tree.would_cycle("a", "a"));
    }

    #[test]
    fn test_transitive_cycle_detected() {
        let tree = chain();
        // a is an ancestor of c, so a under c is a cycle...
        assert!(tree.would_cycle("a", "c"));
        // ...but c under a just shortens the chain.
        assert!(!tree.would_cycle("c", "a"));
    }

    #[test]
    fn test_cycle_walk_terminates_on_corrupt_data() {
        // p and q already point at each other; checking an unrelated edge
        // must not loop.
        let tree = MenuTree::new(vec![
            item("p", Some("q"), 0),
            item("q", Some("p"), 1),
            item("r", None, 2),
        ]);
        assert!(!tree.would_cycle("r", "p"));
    }

    #[test]
    fn test_deletion_order_is_leaves_first() {
        let tree = MenuTree::new(vec![
            item("p", None, 0),
            item("c1", Some("p"), 0),
            item("c2", Some("p"), 1),
            item("g", Some("c1"), 0),
        ]);
        let order = tree.deletion_order("p");
        assert_eq!(order.len(), 4);
        assert_eq!(order.last().map(String::as_str), Some("p"));
        let pos = |id: &str| order.iter().position(|x| x == id).unwrap();
        assert!(pos("g") < pos("c1"));
        assert!(pos("c1") < pos("p"));
        assert!(pos("c2") < pos("p"));
    }

    #[test]
    fn test_plan_drop_renumbers_densely() {
        // Gapped orders on purpose; the plan must come out 0..n-1.
        let tree = MenuTree::new(vec![
            item("home", None, 0),
            item("services", None, 3),
            item("blog", None, 7),
        ]);
        let placements = tree.plan_drop("home", "blog").unwrap();
        // New order: services, blog, home.
        let find = |id: &str| placements.iter().find(|p| p.id == id).unwrap();
        assert_eq!(find("services").sort_order, 0);
        assert_eq!(find("blog").sort_order, 1);
        assert_eq!(find("home").sort_order, 2);
        assert!(placements.iter().all(|p| p.parent_id.is_none()));
    }

    #[test]
    fn test_plan_drop_after_target() {
        // [home(0), about(1)], drop home onto about.
        let tree = MenuTree::new(vec![item("home", None, 0), item("about", None, 1)]);
        let placements = tree.plan_drop("home", "about").unwrap();
        let find = |id: &str| placements.iter().find(|p| p.id == id).unwrap();
        assert_eq!(find("about").sort_order, 0);
        assert_eq!(find("home").sort_order, 1);
    }

    #[test]
    fn test_plan_drop_onto_self_is_noop() {
        let tree = chain();
        assert!(tree.plan_drop("a", "a").unwrap().is_empty());
    }

    #[test]
    fn test_plan_drop_adopts_target_parent() {
        let tree = MenuTree::new(vec![
            item("root", None, 0),
            item("child", Some("root"), 0),
            item("loose", None, 1),
        ]);
        let placements = tree.plan_drop("loose", "child").unwrap();
        let moved = placements.iter().find(|p| p.id == "loose").unwrap();
        assert_eq!(moved.parent_id.as_deref(), Some("root"));
        assert_eq!(moved.sort_order, 1);
    }

    #[test]
    fn test_plan_drop_into_own_subtree_rejected() {
        let tree = chain();
        // c lives under b, which lives under a; dropping a beside c would
        // make a a child of b.
        let err = tree.plan_drop("a", "c").unwrap_err();
        assert!(matches!(err, MenuError::Cycle { .. }));
    }

    #[test]
    fn test_plan_drop_unknown_ids() {
        let tree = chain();
        assert!(matches!(
            tree.plan_drop("ghost", "a").unwrap_err(),
            MenuError::NotFound(_)
        ));
        assert!(matches!(
            tree.plan_drop("a", "ghost").unwrap_err(),
            MenuError::NotFound(_)
        ));
    }

    #[test]
    fn test_adjacent_move_boundaries_are_noops() {
        let tree = MenuTree::new(vec![item("first", None, 0), item("last", None, 1)]);
        assert!(tree
            .plan_adjacent_move("first", MoveDirection::Up)
            .unwrap()
            .is_empty());
        assert!(tree
            .plan_adjacent_move("last", MoveDirection::Down)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_adjacent_move_swaps_two_orders() {
        let tree = MenuTree::new(vec![
            item("x", None, 0),
            item("y", None, 1),
            item("z", None, 2),
        ]);
        let placements = tree.plan_adjacent_move("y", MoveDirection::Up).unwrap();
        assert_eq!(placements.len(), 2);
        let find = |id: &str| placements.iter().find(|p| p.id == id).unwrap();
        assert_eq!(find("y").sort_order, 0);
        assert_eq!(find("x").sort_order, 1);
    }

    #[test]
    fn test_render_filters_slot_and_inactive() {
        let mut footer_only = item("imprint", None, 2);
        footer_only.location = MenuLocation::Footer;
        let mut everywhere = item("contact", None, 1);
        everywhere.location = MenuLocation::Both;
        let mut hidden = item("drafts", None, 3);
        hidden.is_active = false;
        let mut hidden_child = item("draft-child", Some("drafts"), 0);
        hidden_child.is_active = true;

        let tree = MenuTree::new(vec![
            item("home", None, 0),
            everywhere,
            footer_only,
            hidden,
            hidden_child,
            item("home-sub", Some("home"), 0),
        ]);

        let header: Vec<String> = tree
            .render(MenuSlot::Header)
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(header, ["home", "contact"]);

        let footer: Vec<String> = tree
            .render(MenuSlot::Footer)
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(footer, ["contact", "imprint"]);

        // nesting survives, inactive subtree does not
        let home = &tree.render(MenuSlot::Header)[0];
        assert_eq!(home.children.len(), 1);
        assert_eq!(home.children[0].id, "home-sub");
    }
}
