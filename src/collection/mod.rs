//! Ordered two-level collection: the user's groups, and each group's bookmarks.
//!
//! Every scope is a `Vec` kept in rendered order. `order` fields are derived
//! from position by [`renumber`], never the other way round, so a scope that
//! went through any of these operations is dense (`0..n`).

use crate::models::{Bookmark, Dashboard, Group};

pub trait Ordered {
    fn id(&self) -> &str;
    fn order(&self) -> i32;
    fn set_order(&mut self, order: i32);
}

impl Ordered for Group {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> i32 {
        self.order
    }
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Ordered for Bookmark {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> i32 {
        self.order
    }
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    #[error("unknown group {0}")]
    UnknownGroup(String),
    #[error("unknown bookmark {0}")]
    UnknownBookmark(String),
}

/// Where an item lands in its destination scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insert {
    At(usize),
    End,
}

/// Remove `id` from the scope. Leaves the scope untouched when absent.
pub fn remove_from_scope<T: Ordered>(scope: &mut Vec<T>, id: &str) -> Option<T> {
    let idx = scope.iter().position(|x| x.id() == id)?;
    Some(scope.remove(idx))
}

/// Insert at `clamp(index, 0, len)`; returns the index actually used.
pub fn insert_into_scope<T: Ordered>(scope: &mut Vec<T>, item: T, at: Insert) -> usize {
    let idx = match at {
        Insert::At(i) => i.min(scope.len()),
        Insert::End => scope.len(),
    };
    scope.insert(idx, item);
    idx
}

/// Assign `order = position`. Returns whether anything changed.
pub fn renumber<T: Ordered>(scope: &mut [T]) -> bool {
    let mut changed = false;
    for (i, item) in scope.iter_mut().enumerate() {
        let want = i as i32;
        if item.order() != want {
            item.set_order(want);
            changed = true;
        }
    }
    changed
}

pub fn is_dense<T: Ordered>(scope: &[T]) -> bool {
    scope
        .iter()
        .enumerate()
        .all(|(i, item)| item.order() == i as i32)
}

/// Order for a newly created item: one past the current maximum, `0` when empty.
pub fn next_order<T: Ordered>(scope: &[T]) -> i32 {
    scope
        .iter()
        .map(|x| x.order())
        .max()
        .map(|m| m.saturating_add(1))
        .unwrap_or(0)
}

/// Move a group to `to_index` among the user's groups (array-move semantics:
/// remove, then insert at the target position).
pub fn move_group(d: &mut Dashboard, id: &str, to_index: usize) -> Result<(), CollectionError> {
    let group = remove_from_scope(&mut d.groups, id)
        .ok_or_else(|| CollectionError::UnknownGroup(id.to_string()))?;
    insert_into_scope(&mut d.groups, group, Insert::At(to_index));
    renumber(&mut d.groups);
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub from_group: String,
    pub to_group: String,
    pub index: usize,
}

impl MoveOutcome {
    pub fn crossed_groups(&self) -> bool {
        self.from_group != self.to_group
    }
}

/// Remove the bookmark from its group, point it at `to_group`, insert it there
/// and renumber every touched scope.
pub fn move_bookmark(
    d: &mut Dashboard,
    bookmark_id: &str,
    to_group: &str,
    at: Insert,
) -> Result<MoveOutcome, CollectionError> {
    if d.group(to_group).is_none() {
        return Err(CollectionError::UnknownGroup(to_group.to_string()));
    }
    let (src_idx, _) = d
        .locate_bookmark(bookmark_id)
        .ok_or_else(|| CollectionError::UnknownBookmark(bookmark_id.to_string()))?;

    let from_group = d.groups[src_idx].id.clone();
    let Some(mut bookmark) = remove_from_scope(&mut d.groups[src_idx].bookmarks, bookmark_id)
    else {
        return Err(CollectionError::UnknownBookmark(bookmark_id.to_string()));
    };
    renumber(&mut d.groups[src_idx].bookmarks);

    bookmark.group_id = to_group.to_string();
    let Some(dst) = d.group_mut(to_group) else {
        return Err(CollectionError::UnknownGroup(to_group.to_string()));
    };
    let index = insert_into_scope(&mut dst.bookmarks, bookmark, at);
    renumber(&mut dst.bookmarks);

    Ok(MoveOutcome {
        from_group,
        to_group: to_group.to_string(),
        index,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn bm(id: &str, group: &str, order: i32) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            title: id.to_uppercase(),
            url: format!("https://{id}.example"),
            order,
            group_id: group.to_string(),
        }
    }

    pub(crate) fn group(id: &str, bookmarks: &[&str]) -> Group {
        Group {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: id.to_uppercase(),
            order: 0,
            is_collapsed: false,
            bookmarks: bookmarks
                .iter()
                .enumerate()
                .map(|(i, b)| bm(b, id, i as i32))
                .collect(),
        }
    }

    pub(crate) fn board(mut groups: Vec<Group>) -> Dashboard {
        renumber(&mut groups);
        Dashboard {
            title: None,
            groups,
        }
    }

    pub(crate) fn ids(d: &Dashboard, group: &str) -> Vec<String> {
        d.group(group)
            .map(|g| g.bookmarks.iter().map(|b| b.id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_remove_missing_leaves_scope_unchanged() {
        let mut scope = group("g", &["a", "b"]).bookmarks;
        let before = scope.clone();
        assert!(remove_from_scope(&mut scope, "zzz").is_none());
        assert_eq!(scope, before);
    }

    #[test]
    fn test_insert_clamps_index() {
        let mut scope = group("g", &["a", "b"]).bookmarks;
        let idx = insert_into_scope(&mut scope, bm("c", "g", 9), Insert::At(99));
        assert_eq!(idx, 2);
        let idx = insert_into_scope(&mut scope, bm("d", "g", 9), Insert::At(0));
        assert_eq!(idx, 0);
        let ids: Vec<_> = scope.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["d", "a", "b", "c"]);
    }

    #[test]
    fn test_renumber_is_idempotent() {
        let mut scope = vec![bm("a", "g", 7), bm("b", "g", 3), bm("c", "g", 3)];
        assert!(renumber(&mut scope));
        let once = scope.clone();
        assert!(!renumber(&mut scope));
        assert_eq!(scope, once);
        assert!(is_dense(&scope));
    }

    #[test]
    fn test_next_order() {
        let empty: Vec<Bookmark> = vec![];
        assert_eq!(next_order(&empty), 0);
        let scope = vec![bm("a", "g", 0), bm("b", "g", 4)];
        assert_eq!(next_order(&scope), 5);
    }

    #[test]
    fn test_same_group_reorder_moves_first_to_last() {
        let mut d = board(vec![group("g", &["a", "b", "c"])]);
        let out = move_bookmark(&mut d, "a", "g", Insert::At(2)).expect("move");
        assert!(!out.crossed_groups());
        assert_eq!(ids(&d, "g"), ["b", "c", "a"]);
        assert!(is_dense(&d.groups[0].bookmarks));
        assert_eq!(d.bookmark("a").map(|b| b.order), Some(2));
    }

    #[test]
    fn test_cross_group_move_conserves_counts() {
        let mut d = board(vec![group("g1", &["a", "b"]), group("g2", &["c"])]);
        let total = d.bookmark_count();

        let out = move_bookmark(&mut d, "a", "g2", Insert::At(0)).expect("move");
        assert!(out.crossed_groups());
        assert_eq!(ids(&d, "g1"), ["b"]);
        assert_eq!(ids(&d, "g2"), ["a", "c"]);
        assert_eq!(d.bookmark_count(), total);
        assert_eq!(d.bookmark("a").map(|b| b.group_id.as_str()), Some("g2"));
        for g in &d.groups {
            assert!(is_dense(&g.bookmarks));
        }
    }

    #[test]
    fn test_move_into_unknown_group_fails_without_mutation() {
        let mut d = board(vec![group("g1", &["a"])]);
        let before = d.clone();
        let err = move_bookmark(&mut d, "a", "nope", Insert::End).unwrap_err();
        assert_eq!(err, CollectionError::UnknownGroup("nope".to_string()));
        assert_eq!(d, before);
    }

    #[test]
    fn test_move_group() {
        let mut d = board(vec![group("g1", &[]), group("g2", &[]), group("g3", &[])]);
        move_group(&mut d, "g3", 0).expect("move");
        let order: Vec<_> = d.groups.iter().map(|g| (g.id.as_str(), g.order)).collect();
        assert_eq!(order, [("g3", 0), ("g1", 1), ("g2", 2)]);
    }
}
