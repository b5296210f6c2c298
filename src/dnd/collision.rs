use super::{BoardItem, DragItem, DropTarget};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Client-space rectangle, as reported by `getBoundingClientRect`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Edges inclusive.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }

    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.left.max(other.left);
        let h = self.bottom().min(other.bottom()) - self.top.max(other.top);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }
}

/// Overlap relative to the union of both rects, in `[0, 1]`.
pub fn intersection_ratio(a: &Rect, b: &Rect) -> f64 {
    let inter = a.intersection_area(b);
    if inter <= 0.0 {
        return 0.0;
    }
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Droppable {
    pub target: DropTarget,
    pub rect: Rect,
}

/// Pick the drop target under a drag.
///
/// Group drags only see group containers, and only by pointer containment: no
/// group under the pointer means no target.
///
/// Bookmark drags try pointer containment first (a bookmark row under the
/// pointer, then the group container under it) so that an almost empty group
/// is an unambiguous target. Only when the pointer is inside nothing do they
/// fall back to the best rect-intersection score of the dragged rect.
pub fn detect_collision(
    active: &DragItem,
    pointer: Point,
    active_rect: Option<Rect>,
    droppables: &[Droppable],
) -> Option<DropTarget> {
    match active {
        BoardItem::Group { .. } => droppables
            .iter()
            .filter(|d| d.target.is_group())
            .find(|d| d.rect.contains(pointer))
            .map(|d| d.target.clone()),
        BoardItem::Bookmark { id, .. } => {
            let candidates = || {
                droppables
                    .iter()
                    .filter(move |d| d.target.is_group() || d.target.id() != id)
            };

            let under_pointer = candidates()
                .filter(|d| !d.target.is_group())
                .find(|d| d.rect.contains(pointer))
                .or_else(|| {
                    candidates()
                        .filter(|d| d.target.is_group())
                        .find(|d| d.rect.contains(pointer))
                });
            if let Some(d) = under_pointer {
                return Some(d.target.clone());
            }

            let active_rect = active_rect?;
            let mut best: Option<(&Droppable, f64)> = None;
            for d in candidates() {
                let score = intersection_ratio(&active_rect, &d.rect);
                if score <= 0.0 {
                    continue;
                }
                // Strictly greater: on ties the first droppable in DOM order wins.
                if best.map_or(true, |(_, s)| score > s) {
                    best = Some((d, score));
                }
            }
            best.map(|(d, _)| d.target.clone())
        }
    }
}
