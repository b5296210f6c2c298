//! Drag placement: what a drag gesture means for the board, decided without
//! touching it.

mod collision;
mod session;

pub use collision::{detect_collision, intersection_ratio, Droppable, Point, Rect};
pub use session::{DragPhase, DragSession, DropDecision, HoverEffect};

use crate::collection::{move_bookmark, move_group, CollectionError, Insert};
use crate::models::{BookmarkId, Dashboard, GroupId};
use crate::util::is_tmp_id;

/// Anything that can be picked up or hovered on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoardItem {
    Group { id: GroupId },
    Bookmark { id: BookmarkId, group_id: GroupId },
}

pub type DragItem = BoardItem;
pub type DropTarget = BoardItem;

impl BoardItem {
    pub fn group(id: impl Into<String>) -> Self {
        BoardItem::Group { id: id.into() }
    }

    pub fn bookmark(id: impl Into<String>, group_id: impl Into<String>) -> Self {
        BoardItem::Bookmark {
            id: id.into(),
            group_id: group_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            BoardItem::Group { id } | BoardItem::Bookmark { id, .. } => id,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, BoardItem::Group { .. })
    }

    /// Parse the `data-drop-kind` / `data-id` / `data-group` attribute triple the
    /// board view stamps on droppable elements.
    pub fn from_attrs(kind: &str, id: &str, group_id: Option<&str>) -> Option<Self> {
        if id.trim().is_empty() {
            return None;
        }
        match kind {
            "group" => Some(BoardItem::group(id)),
            "bookmark" => {
                let group_id = group_id.filter(|g| !g.trim().is_empty())?;
                Some(BoardItem::bookmark(id, group_id))
            }
            _ => None,
        }
    }
}

/// A resolved target for the dragged item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Reorder among the user's groups.
    Group { id: GroupId, to_index: usize },
    /// Reorder within, or move into, `to_group`.
    Bookmark {
        id: BookmarkId,
        to_group: GroupId,
        at: Insert,
    },
}

impl Placement {
    /// Whether applying this to `d` takes a bookmark out of its current group.
    pub fn crosses_groups(&self, d: &Dashboard) -> bool {
        match self {
            Placement::Group { .. } => false,
            Placement::Bookmark { id, to_group, .. } => d
                .group_of_bookmark(id)
                .is_some_and(|g| &g.id != to_group),
        }
    }
}

/// Decide where `active` goes when released over `over`, given the board as it
/// is right now. `None` means the gesture changes nothing.
///
/// Items the store has not confirmed yet are never targets.
pub fn resolve_placement(d: &Dashboard, active: &DragItem, over: &DropTarget) -> Option<Placement> {
    if active.id() == over.id() && active.is_group() == over.is_group() {
        return None;
    }
    if is_tmp_id(over.id()) {
        return None;
    }

    match active {
        BoardItem::Group { id } => {
            let BoardItem::Group { id: over_id } = over else {
                // Groups only ever land on groups.
                return None;
            };
            let from = d.group_index(id)?;
            let to = d.group_index(over_id)?;
            if from == to {
                return None;
            }
            Some(Placement::Group {
                id: id.clone(),
                to_index: to,
            })
        }
        BoardItem::Bookmark { id, .. } => {
            // The board is authoritative for where the bookmark sits now; the
            // payload's group may be stale after a hover move.
            let (src_gi, _) = d.locate_bookmark(id)?;
            let src_group = &d.groups[src_gi].id;

            match over {
                BoardItem::Bookmark { id: over_id, .. } => {
                    let (dst_gi, dst_bi) = d.locate_bookmark(over_id)?;
                    Some(Placement::Bookmark {
                        id: id.clone(),
                        to_group: d.groups[dst_gi].id.clone(),
                        at: Insert::At(dst_bi),
                    })
                }
                BoardItem::Group { id: over_group } => {
                    if over_group == src_group {
                        return None;
                    }
                    d.group(over_group)?;
                    Some(Placement::Bookmark {
                        id: id.clone(),
                        to_group: over_group.clone(),
                        at: Insert::End,
                    })
                }
            }
        }
    }
}

pub fn apply_placement(d: &mut Dashboard, placement: &Placement) -> Result<(), CollectionError> {
    match placement {
        Placement::Group { id, to_index } => move_group(d, id, *to_index),
        Placement::Bookmark { id, to_group, at } => move_bookmark(d, id, to_group, *at).map(|_| ()),
    }
}
