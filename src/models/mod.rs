use serde::{Deserialize, Serialize};

pub type UserId = String;
pub type GroupId = String;
pub type BookmarkId = String;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: BookmarkId,
    pub title: String,
    pub url: String,
    /// Position among the bookmarks of `group_id`.
    pub order: i32,
    pub group_id: GroupId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub user_id: UserId,
    pub name: String,
    /// Position among the owner's groups.
    pub order: i32,
    #[serde(default)]
    pub is_collapsed: bool,
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
}

/// Everything the board renders: the user's title plus their groups, each
/// carrying its bookmarks. Both levels are kept sorted by `order`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub title: Option<String>,
    pub groups: Vec<Group>,
}

impl Dashboard {
    /// Build from server rows, sorting both levels by `order` (stable, so equal
    /// orders keep their arrival position).
    pub fn from_groups(title: Option<String>, mut groups: Vec<Group>) -> Self {
        groups.sort_by_key(|g| g.order);
        for g in groups.iter_mut() {
            g.bookmarks.sort_by_key(|b| b.order);
        }
        Self { title, groups }
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn group_index(&self, id: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.id == id)
    }

    /// `(group index, bookmark index)` of a bookmark.
    pub fn locate_bookmark(&self, id: &str) -> Option<(usize, usize)> {
        self.groups.iter().enumerate().find_map(|(gi, g)| {
            g.bookmarks
                .iter()
                .position(|b| b.id == id)
                .map(|bi| (gi, bi))
        })
    }

    pub fn bookmark(&self, id: &str) -> Option<&Bookmark> {
        self.locate_bookmark(id)
            .map(|(gi, bi)| &self.groups[gi].bookmarks[bi])
    }

    pub fn bookmark_mut(&mut self, id: &str) -> Option<&mut Bookmark> {
        let (gi, bi) = self.locate_bookmark(id)?;
        Some(&mut self.groups[gi].bookmarks[bi])
    }

    pub fn group_of_bookmark(&self, id: &str) -> Option<&Group> {
        self.locate_bookmark(id).map(|(gi, _)| &self.groups[gi])
    }

    pub fn bookmark_count(&self) -> usize {
        self.groups.iter().map(|g| g.bookmarks.len()).sum()
    }

    pub fn all_collapsed(&self) -> bool {
        !self.groups.is_empty() && self.groups.iter().all(|g| g.is_collapsed)
    }
}

/// `GET /api/user` body. Both fields are optional on the wire.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub dashboard_title: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub group_id: GroupId,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_collapsed: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
}

impl GroupPatch {
    pub fn apply_to(&self, g: &mut Group) {
        if let Some(name) = &self.name {
            g.name = name.clone();
        }
        if let Some(order) = self.order {
            g.order = order;
        }
        if let Some(c) = self.is_collapsed {
            g.is_collapsed = c;
        }
    }
}

impl BookmarkPatch {
    pub fn apply_to(&self, b: &mut Bookmark) {
        if let Some(title) = &self.title {
            b.title = title.clone();
        }
        if let Some(url) = &self.url {
            b.url = url.clone();
        }
        if let Some(order) = self.order {
            b.order = order;
        }
        if let Some(group_id) = &self.group_id {
            b.group_id = group_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_response_contract_deserialize() {
        // Shape of `GET /api/groups`: groups with nested bookmarks, camelCase keys.
        let json = r#"[
            {
                "id": "g2", "userId": "u1", "name": "Work", "order": 1,
                "isCollapsed": true, "createdAt": "2025-01-01T00:00:00Z",
                "bookmarks": [
                    {"id": "b2", "title": "CI", "url": "https://ci", "order": 1, "groupId": "g2"},
                    {"id": "b1", "title": "Docs", "url": "https://docs", "order": 0, "groupId": "g2"}
                ]
            },
            {"id": "g1", "userId": "u1", "name": "Home", "order": 0}
        ]"#;
        let groups: Vec<Group> = serde_json::from_str(json).expect("groups should parse");
        let d = Dashboard::from_groups(None, groups);

        assert_eq!(d.groups[0].id, "g1");
        assert!(!d.groups[0].is_collapsed);
        assert!(d.groups[0].bookmarks.is_empty());
        assert_eq!(d.groups[1].bookmarks[0].id, "b1");
        assert!(d.groups[1].is_collapsed);
    }

    #[test]
    fn test_locate_bookmark() {
        let json = r#"[
            {"id": "g1", "userId": "u", "name": "A", "order": 0, "bookmarks": [
                {"id": "b1", "title": "t", "url": "u", "order": 0, "groupId": "g1"}
            ]},
            {"id": "g2", "userId": "u", "name": "B", "order": 1, "bookmarks": [
                {"id": "b2", "title": "t", "url": "u", "order": 0, "groupId": "g2"},
                {"id": "b3", "title": "t", "url": "u", "order": 1, "groupId": "g2"}
            ]}
        ]"#;
        let d = Dashboard::from_groups(None, serde_json::from_str(json).expect("parse"));
        assert_eq!(d.locate_bookmark("b3"), Some((1, 1)));
        assert_eq!(d.group_of_bookmark("b1").map(|g| g.id.as_str()), Some("g1"));
        assert!(d.locate_bookmark("nope").is_none());
        assert_eq!(d.bookmark_count(), 3);
    }

    #[test]
    fn test_patch_serialization_skips_unset_fields() {
        let patch = GroupPatch {
            is_collapsed: Some(true),
            ..Default::default()
        };
        let v = serde_json::to_value(&patch).expect("should serialize");
        assert_eq!(v, serde_json::json!({ "isCollapsed": true }));

        let patch = BookmarkPatch {
            title: Some("New".to_string()),
            group_id: Some("g9".to_string()),
            ..Default::default()
        };
        let v = serde_json::to_value(&patch).expect("should serialize");
        assert_eq!(v, serde_json::json!({ "title": "New", "groupId": "g9" }));
    }
}
