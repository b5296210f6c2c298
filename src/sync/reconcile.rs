use crate::models::Dashboard;
use crate::util::is_tmp_id;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GroupOrder {
    pub id: String,
    pub order: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkOrder {
    pub id: String,
    pub order: i32,
    pub group_id: String,
}

/// Body of `POST /api/reorder`: `{"type": "group" | "bookmark", "items": [...]}`.
/// Applied by the store as one transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", content = "items", rename_all = "lowercase")]
pub enum ReorderBatch {
    Group(Vec<GroupOrder>),
    Bookmark(Vec<BookmarkOrder>),
}

impl ReorderBatch {
    pub fn len(&self) -> usize {
        match self {
            ReorderBatch::Group(items) => items.len(),
            ReorderBatch::Bookmark(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReorderBatch::Group(_) => "group",
            ReorderBatch::Bookmark(_) => "bookmark",
        }
    }
}

/// Every saved group at its rendered position. Placeholders of creates still
/// in flight are left out; the store has no row for them yet.
pub fn group_batch(d: &Dashboard) -> ReorderBatch {
    ReorderBatch::Group(
        d.groups
            .iter()
            .filter(|g| !is_tmp_id(&g.id))
            .enumerate()
            .map(|(i, g)| GroupOrder {
                id: g.id.clone(),
                order: i as i32,
            })
            .collect(),
    )
}

/// Every bookmark of `dest_group` at its rendered position, preceded by the
/// remaining bookmarks of `source_group` when the move crossed groups. Only one
/// item moved, but both scopes end up dense. Unsaved bookmarks are skipped.
pub fn bookmark_batch(d: &Dashboard, source_group: &str, dest_group: &str) -> ReorderBatch {
    let mut items = Vec::new();
    let mut push_scope = |group_id: &str| {
        if let Some(g) = d.group(group_id) {
            let saved = g.bookmarks.iter().filter(|b| !is_tmp_id(&b.id));
            items.extend(saved.enumerate().map(|(i, b)| BookmarkOrder {
                id: b.id.clone(),
                order: i as i32,
                group_id: g.id.clone(),
            }));
        }
    };

    if source_group != dest_group {
        push_scope(source_group);
    }
    push_scope(dest_group);

    ReorderBatch::Bookmark(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::tests::{board, group};
    use crate::collection::{move_bookmark, Insert};

    fn orders(batch: &ReorderBatch) -> Vec<(String, i32, String)> {
        match batch {
            ReorderBatch::Bookmark(items) => items
                .iter()
                .map(|i| (i.id.clone(), i.order, i.group_id.clone()))
                .collect(),
            ReorderBatch::Group(_) => panic!("expected a bookmark batch"),
        }
    }

    fn row(id: &str, order: i32, group: &str) -> (String, i32, String) {
        (id.to_string(), order, group.to_string())
    }

    #[test]
    fn test_same_group_batch_covers_whole_group() {
        let mut d = board(vec![group("g", &["a", "b", "c"])]);
        move_bookmark(&mut d, "a", "g", Insert::At(2)).expect("move");

        let batch = bookmark_batch(&d, "g", "g");
        let mut got = orders(&batch);
        got.sort();
        assert_eq!(got, [row("a", 2, "g"), row("b", 0, "g"), row("c", 1, "g")]);
    }

    #[test]
    fn test_cross_group_batch_covers_source_and_destination() {
        let mut d = board(vec![group("g1", &["a", "b"]), group("g2", &["c"])]);
        move_bookmark(&mut d, "a", "g2", Insert::At(0)).expect("move");

        let batch = bookmark_batch(&d, "g1", "g2");
        assert_eq!(
            orders(&batch),
            [row("b", 0, "g1"), row("a", 0, "g2"), row("c", 1, "g2")]
        );
    }

    #[test]
    fn test_group_batch_is_positional() {
        let mut d = board(vec![group("g1", &[]), group("g2", &[])]);
        d.groups.reverse();
        assert_eq!(
            group_batch(&d),
            ReorderBatch::Group(vec![
                GroupOrder {
                    id: "g2".to_string(),
                    order: 0
                },
                GroupOrder {
                    id: "g1".to_string(),
                    order: 1
                },
            ])
        );
    }

    #[test]
    fn test_batches_skip_unsaved_items() {
        let d = board(vec![
            group("g1", &["a", "tmp-3-0000beef", "b"]),
            group("tmp-4-0000cafe", &[]),
            group("g2", &[]),
        ]);

        assert_eq!(
            orders(&bookmark_batch(&d, "g1", "g1")),
            [row("a", 0, "g1"), row("b", 1, "g1")]
        );
        let ReorderBatch::Group(groups) = group_batch(&d) else {
            panic!("expected a group batch");
        };
        let ids: Vec<_> = groups.iter().map(|g| (g.id.as_str(), g.order)).collect();
        assert_eq!(ids, [("g1", 0), ("g2", 1)]);
    }

    #[test]
    fn test_wire_shape() {
        let batch = ReorderBatch::Bookmark(vec![BookmarkOrder {
            id: "b1".to_string(),
            order: 3,
            group_id: "g1".to_string(),
        }]);
        let v = serde_json::to_value(&batch).expect("should serialize");
        assert_eq!(
            v,
            serde_json::json!({
                "type": "bookmark",
                "items": [{"id": "b1", "order": 3, "groupId": "g1"}]
            })
        );

        let parsed: ReorderBatch =
            serde_json::from_str(r#"{"type":"group","items":[{"id":"g1","order":0}]}"#)
                .expect("should parse");
        assert_eq!(parsed.kind(), "group");
        assert_eq!(parsed.len(), 1);
    }
}
