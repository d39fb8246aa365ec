//! Sibling ordering.
//!
//! Every ordered scope (steps in a document, hazards in a step,
//! controls in a hazard, actions in a document) keeps `order_index`
//! contiguous from zero. All mutation helpers renumber on the way out,
//! so a scope is never observed with gaps or duplicates.

use std::collections::HashSet;

use crate::error::DocumentError;
use crate::ids::EntityId;

/// An entity that lives in an ordered sibling scope.
pub trait Orderable {
    /// The entity's id, erased to the common form.
    fn entity_id(&self) -> EntityId;

    /// Current position in the scope.
    fn order_index(&self) -> u32;

    /// Overwrites the position. Callers renumber whole scopes at once.
    fn set_order_index(&mut self, index: u32);
}

/// Rewrites `order_index` to match the slice order, zero-based.
pub fn renumber<T: Orderable>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order_index(index as u32);
    }
}

/// True when positions run 0, 1, 2, ... with no gaps.
#[must_use]
pub fn is_contiguous<T: Orderable>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.order_index() == index as u32)
}

/// Where a new sibling lands relative to an optional anchor.
///
/// An anchor that matches nothing degrades to appending at the end, so
/// a stale id still makes forward progress instead of failing the edit.
#[must_use]
pub fn insertion_index<T: Orderable>(items: &[T], after: Option<EntityId>) -> usize {
    match after {
        Some(anchor) => items
            .iter()
            .position(|item| item.entity_id() == anchor)
            .map_or(items.len(), |found| found + 1),
        None => items.len(),
    }
}

/// Inserts at `index` (clamped to the scope) and renumbers.
pub fn insert_renumbered<T: Orderable>(items: &mut Vec<T>, index: usize, item: T) {
    let index = index.min(items.len());
    items.insert(index, item);
    renumber(items);
}

/// Removes the first sibling matching `id` and renumbers. Returns the
/// removed entity so callers can report cascade sizes.
pub fn remove_renumbered<T: Orderable>(items: &mut Vec<T>, id: EntityId) -> Option<T> {
    let index = items.iter().position(|item| item.entity_id() == id)?;
    let removed = items.remove(index);
    renumber(items);
    Some(removed)
}

/// Reorders a scope to match `ordered`.
///
/// Every listed id must name a sibling exactly once. Siblings missing
/// from the list keep their relative order after the listed ones, so a
/// lagging writer cannot silently drop entities.
pub fn apply_order<T: Orderable>(
    items: &mut Vec<T>,
    ordered: &[EntityId],
) -> Result<(), DocumentError> {
    let mut seen = HashSet::with_capacity(ordered.len());
    for id in ordered {
        if !seen.insert(*id) {
            return Err(DocumentError::DuplicateSibling { id: *id });
        }
        if !items.iter().any(|item| item.entity_id() == *id) {
            return Err(DocumentError::UnknownSibling { id: *id });
        }
    }

    // Stable sort keeps unlisted siblings in their prior relative order.
    items.sort_by_key(|item| {
        ordered
            .iter()
            .position(|id| *id == item.entity_id())
            .map_or((1, 0), |position| (0, position))
    });
    renumber(items);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EntityId;
    use uuid::Uuid;

    #[derive(Debug, PartialEq)]
    struct Sib {
        id: EntityId,
        order: u32,
        tag: &'static str,
    }

    impl Orderable for Sib {
        fn entity_id(&self) -> EntityId {
            self.id
        }

        fn order_index(&self) -> u32 {
            self.order
        }

        fn set_order_index(&mut self, index: u32) {
            self.order = index;
        }
    }

    fn sib(tag: &'static str) -> Sib {
        Sib {
            id: EntityId::from_uuid(Uuid::new_v4()),
            order: 0,
            tag,
        }
    }

    fn tags(items: &[Sib]) -> Vec<&'static str> {
        items.iter().map(|s| s.tag).collect()
    }

    #[test]
    fn insert_in_middle_renumbers() {
        let mut items = vec![sib("a"), sib("b")];
        renumber(&mut items);
        insert_renumbered(&mut items, 1, sib("x"));
        assert_eq!(tags(&items), vec!["a", "x", "b"]);
        assert!(is_contiguous(&items));
    }

    #[test]
    fn remove_closes_the_gap() {
        let mut items = vec![sib("a"), sib("b"), sib("c")];
        renumber(&mut items);
        let victim = items[1].id;
        let removed = remove_renumbered(&mut items, victim).unwrap();
        assert_eq!(removed.tag, "b");
        assert_eq!(tags(&items), vec!["a", "c"]);
        assert!(is_contiguous(&items));
    }

    #[test]
    fn unknown_anchor_appends() {
        let items = {
            let mut items = vec![sib("a"), sib("b")];
            renumber(&mut items);
            items
        };
        let stale = EntityId::from_uuid(Uuid::new_v4());
        assert_eq!(insertion_index(&items, Some(stale)), 2);
        assert_eq!(insertion_index(&items, Some(items[0].id)), 1);
        assert_eq!(insertion_index(&items, None), 2);
    }

    #[test]
    fn apply_order_rejects_unknown_and_duplicate_ids() {
        let mut items = vec![sib("a"), sib("b")];
        renumber(&mut items);
        let stranger = EntityId::from_uuid(Uuid::new_v4());
        assert_eq!(
            apply_order(&mut items, &[stranger]),
            Err(DocumentError::UnknownSibling { id: stranger })
        );
        let twice = items[0].id;
        assert_eq!(
            apply_order(&mut items, &[twice, twice]),
            Err(DocumentError::DuplicateSibling { id: twice })
        );
    }

    #[test]
    fn apply_order_keeps_unlisted_tail_stable() {
        let mut items = vec![sib("a"), sib("b"), sib("c"), sib("d")];
        renumber(&mut items);
        let order = [items[2].id, items[0].id];
        apply_order(&mut items, &order).unwrap();
        assert_eq!(tags(&items), vec!["c", "a", "b", "d"]);
        assert!(is_contiguous(&items));
    }
}
