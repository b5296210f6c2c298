use super::{resolve_placement, DragItem, DropTarget, Placement};
use crate::models::{Dashboard, GroupId};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        active: DragItem,
    },
    Hovering {
        active: DragItem,
        over: DropTarget,
    },
}

/// What a hover asks the board to do right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HoverEffect {
    None,
    /// Cross-group move applied locally for feedback only.
    Apply(Placement),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropDecision {
    /// No gesture in flight.
    Ignored,
    /// Put the board back as it was at drag start.
    Restore(Dashboard),
    Commit {
        active: DragItem,
        /// Final placement still to apply on top of the hover-mutated board.
        placement: Option<Placement>,
        /// Board at drag start.
        origin: Dashboard,
        /// Group the bookmark was in at drag start.
        origin_group: Option<GroupId>,
    },
}

/// One drag gesture: `Idle -> Dragging -> Hovering* -> Idle`.
///
/// Keeps the board as it was at drag start so a drop on nothing, a cancel, or
/// a failed commit can put it back exactly.
#[derive(Clone, Debug, Default)]
pub struct DragSession {
    phase: DragPhase,
    origin: Option<Dashboard>,
    origin_group: Option<GroupId>,
    /// Target whose cross-group placement was already applied by a hover.
    applied_over: Option<DropTarget>,
}

impl DragSession {
    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != DragPhase::Idle
    }

    pub fn active(&self) -> Option<&DragItem> {
        match &self.phase {
            DragPhase::Idle => None,
            DragPhase::Dragging { active } | DragPhase::Hovering { active, .. } => Some(active),
        }
    }

    pub fn start(&mut self, active: DragItem, board: &Dashboard) -> bool {
        if self.is_active() {
            return false;
        }
        let origin_group = match &active {
            DragItem::Group { id } => {
                if board.group(id).is_none() {
                    return false;
                }
                None
            }
            DragItem::Bookmark { id, .. } => match board.group_of_bookmark(id) {
                Some(g) => Some(g.id.clone()),
                None => return false,
            },
        };

        self.phase = DragPhase::Dragging { active };
        self.origin = Some(board.clone());
        self.origin_group = origin_group;
        self.applied_over = None;
        true
    }

    /// Pointer moved over `over` (or over nothing). Same-group and group
    /// reorders are left to the drop; only a bookmark entering another group
    /// changes the board during the drag.
    pub fn hover(&mut self, over: Option<DropTarget>, board: &Dashboard) -> HoverEffect {
        let Some(active) = self.active().cloned() else {
            return HoverEffect::None;
        };
        // Nothing under the pointer: keep the last valid target.
        let Some(over) = over else {
            return HoverEffect::None;
        };

        let effect = match (&active, resolve_placement(board, &active, &over)) {
            (DragItem::Bookmark { .. }, Some(p)) if p.crosses_groups(board) => {
                self.applied_over = Some(over.clone());
                HoverEffect::Apply(p)
            }
            _ => HoverEffect::None,
        };

        self.phase = DragPhase::Hovering { active, over };
        effect
    }

    /// Release over `over` inside the board. Always returns the session to
    /// `Idle`.
    ///
    /// A group released between cards lands where the last hover put it; a
    /// bookmark released over nothing goes back to where it started.
    pub fn finish(&mut self, over: Option<DropTarget>, board: &Dashboard) -> DropDecision {
        let Some(active) = self.active().cloned() else {
            return DropDecision::Ignored;
        };
        let last_over = match std::mem::take(&mut self.phase) {
            DragPhase::Hovering { over, .. } => Some(over),
            _ => None,
        };
        let origin = self.origin.take().unwrap_or_else(|| board.clone());
        let origin_group = self.origin_group.take();
        let applied_over = self.applied_over.take();

        let over = match (over, &active) {
            (Some(over), _) => over,
            (None, DragItem::Group { .. }) => match last_over {
                Some(last) => last,
                None => return DropDecision::Restore(origin),
            },
            (None, DragItem::Bookmark { .. }) => return DropDecision::Restore(origin),
        };

        // Dropping where the last hover already put the item keeps that result.
        let placement = if applied_over.as_ref() == Some(&over) {
            None
        } else {
            resolve_placement(board, &active, &over)
        };

        DropDecision::Commit {
            active,
            placement,
            origin,
            origin_group,
        }
    }

    /// Abandon the gesture; returns the board to restore, if one was in flight.
    pub fn cancel(&mut self) -> Option<Dashboard> {
        if !self.is_active() {
            return None;
        }
        self.phase = DragPhase::Idle;
        self.origin_group = None;
        self.applied_over = None;
        self.origin.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::tests::{board, group, ids};
    use crate::dnd::{apply_placement, BoardItem};

    fn sample() -> Dashboard {
        board(vec![group("g1", &["a", "b"]), group("g2", &["c"])])
    }

    #[test]
    fn test_lifecycle_phases() {
        let d = sample();
        let mut s = DragSession::default();
        assert_eq!(s.phase(), &DragPhase::Idle);

        assert!(s.start(BoardItem::bookmark("a", "g1"), &d));
        assert!(matches!(s.phase(), DragPhase::Dragging { .. }));
        // A second gesture cannot start while one is in flight.
        assert!(!s.start(BoardItem::group("g1"), &d));

        s.hover(Some(BoardItem::bookmark("b", "g1")), &d);
        assert!(matches!(s.phase(), DragPhase::Hovering { .. }));

        s.finish(Some(BoardItem::bookmark("b", "g1")), &d);
        assert_eq!(s.phase(), &DragPhase::Idle);
    }

    #[test]
    fn test_start_rejects_unknown_item() {
        let d = sample();
        let mut s = DragSession::default();
        assert!(!s.start(BoardItem::bookmark("zzz", "g1"), &d));
        assert!(!s.is_active());
    }

    #[test]
    fn test_hover_same_group_does_not_mutate() {
        let d = sample();
        let mut s = DragSession::default();
        s.start(BoardItem::bookmark("a", "g1"), &d);
        let effect = s.hover(Some(BoardItem::bookmark("b", "g1")), &d);
        assert_eq!(effect, HoverEffect::None);
    }

    #[test]
    fn test_hover_into_other_group_then_drop_there_keeps_hover_result() {
        let mut d = sample();
        let mut s = DragSession::default();
        s.start(BoardItem::bookmark("a", "g1"), &d);

        let over = BoardItem::bookmark("c", "g2");
        let HoverEffect::Apply(p) = s.hover(Some(over.clone()), &d) else {
            panic!("cross-group hover should apply");
        };
        apply_placement(&mut d, &p).expect("apply");
        assert_eq!(ids(&d, "g2"), ["a", "c"]);

        // Still over c: now a sibling, but nothing more should happen.
        assert_eq!(s.hover(Some(over.clone()), &d), HoverEffect::None);

        match s.finish(Some(over), &d) {
            DropDecision::Commit {
                placement,
                origin,
                origin_group,
                ..
            } => {
                assert!(placement.is_none());
                assert_eq!(origin_group.as_deref(), Some("g1"));
                assert_eq!(ids(&origin, "g1"), ["a", "b"]);
            }
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn test_hover_over_nothing_keeps_last_target() {
        let d = sample();
        let mut s = DragSession::default();
        s.start(BoardItem::group("g1"), &d);
        s.hover(Some(BoardItem::group("g2")), &d);
        s.hover(None, &d);
        assert_eq!(
            s.phase(),
            &DragPhase::Hovering {
                active: BoardItem::group("g1"),
                over: BoardItem::group("g2"),
            }
        );
    }

    #[test]
    fn test_drop_on_nothing_restores_origin() {
        let mut d = sample();
        let mut s = DragSession::default();
        s.start(BoardItem::bookmark("a", "g1"), &d);
        if let HoverEffect::Apply(p) = s.hover(Some(BoardItem::group("g2")), &d) {
            apply_placement(&mut d, &p).expect("apply");
        }
        assert_eq!(ids(&d, "g2"), ["c", "a"]);

        match s.finish(None, &d) {
            DropDecision::Restore(origin) => assert_eq!(origin, sample()),
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn test_group_released_between_cards_lands_on_last_hover() {
        let d = board(vec![group("g1", &[]), group("g2", &[]), group("g3", &[])]);
        let mut s = DragSession::default();
        s.start(BoardItem::group("g1"), &d);
        s.hover(Some(BoardItem::group("g3")), &d);
        s.hover(None, &d);

        match s.finish(None, &d) {
            DropDecision::Commit { placement, .. } => assert_eq!(
                placement,
                Some(Placement::Group {
                    id: "g1".to_string(),
                    to_index: 2
                })
            ),
            other => panic!("unexpected decision: {other:?}"),
        }
        assert!(!s.is_active());
    }

    #[test]
    fn test_group_released_before_any_hover_restores() {
        let d = sample();
        let mut s = DragSession::default();
        s.start(BoardItem::group("g1"), &d);
        assert_eq!(s.finish(None, &d), DropDecision::Restore(d));
    }

    #[test]
    fn test_cancel_and_finish_when_idle() {
        let d = sample();
        let mut s = DragSession::default();
        assert!(s.cancel().is_none());
        assert_eq!(s.finish(None, &d), DropDecision::Ignored);

        s.start(BoardItem::group("g2"), &d);
        assert_eq!(s.cancel(), Some(d));
        assert!(!s.is_active());
    }
}
