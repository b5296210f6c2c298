//! In-process store with the same contract as the HTTP backend.
//!
//! Every call takes the table lock once, validates everything it is about to
//! touch, and only then writes, so a rejected call leaves no trace.

use super::DashboardStore;
use crate::api::{ApiError, ApiErrorKind, ApiResult};
use crate::auth::IdentityGate;
use crate::models::{
    Bookmark, BookmarkPatch, Dashboard, Group, GroupPatch, NewBookmark, UserId,
};
use crate::sync::reconcile::ReorderBatch;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

#[derive(Clone, Debug)]
struct GroupRow {
    id: String,
    user_id: UserId,
    name: String,
    order: i32,
    is_collapsed: bool,
}

#[derive(Clone, Debug)]
struct BookmarkRow {
    id: String,
    group_id: String,
    title: String,
    url: String,
    order: i32,
}

impl BookmarkRow {
    fn to_model(&self) -> Bookmark {
        Bookmark {
            id: self.id.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
            order: self.order,
            group_id: self.group_id.clone(),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct UserRow {
    dashboard_title: Option<String>,
}

#[derive(Debug)]
struct Tables {
    users: BTreeMap<UserId, UserRow>,
    groups: BTreeMap<String, GroupRow>,
    bookmarks: BTreeMap<String, BookmarkRow>,
    next_id: u64,
    reachable: bool,
    fail_next: Option<ApiError>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            groups: BTreeMap::new(),
            bookmarks: BTreeMap::new(),
            next_id: 1,
            reachable: true,
            fail_next: None,
        }
    }
}

impl Tables {
    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}{}", self.next_id);
        self.next_id += 1;
        id
    }

    /// Simulated transport: unreachable store or an injected one-shot failure.
    fn admit(&mut self) -> ApiResult<()> {
        if !self.reachable {
            return Err(ApiError::new(ApiErrorKind::Network, "store unreachable"));
        }
        match self.fail_next.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn owned_group(&self, user: &str, id: &str) -> ApiResult<&GroupRow> {
        let g = self
            .groups
            .get(id)
            .ok_or_else(|| ApiError::not_found("Group"))?;
        if g.user_id != user {
            return Err(ApiError::unauthorized());
        }
        Ok(g)
    }

    fn owned_bookmark(&self, user: &str, id: &str) -> ApiResult<&BookmarkRow> {
        let b = self
            .bookmarks
            .get(id)
            .ok_or_else(|| ApiError::not_found("Bookmark"))?;
        self.owned_group(user, &b.group_id)?;
        Ok(b)
    }

    fn group_model(&self, row: &GroupRow) -> Group {
        let mut bookmarks: Vec<Bookmark> = self
            .bookmarks
            .values()
            .filter(|b| b.group_id == row.id)
            .map(BookmarkRow::to_model)
            .collect();
        bookmarks.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Group {
            id: row.id.clone(),
            user_id: row.user_id.clone(),
            name: row.name.clone(),
            order: row.order,
            is_collapsed: row.is_collapsed,
            bookmarks,
        }
    }

    fn dashboard(&self, user: &str) -> Dashboard {
        let mut groups: Vec<&GroupRow> = self.groups.values().filter(|g| g.user_id == user).collect();
        groups.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        let title = self.users.get(user).and_then(|u| u.dashboard_title.clone());
        Dashboard {
            title,
            groups: groups.into_iter().map(|g| self.group_model(g)).collect(),
        }
    }
}

fn required(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        Err(ApiError::invalid(format!("{field} is required")))
    } else {
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_user(&self, user_id: impl Into<UserId>) {
        self.lock().users.entry(user_id.into()).or_default();
    }

    /// Open a session for whoever `credential` identifies.
    pub fn connect(&self, gate: &impl IdentityGate, credential: &str) -> ApiResult<MemorySession> {
        let user_id = gate.identify(credential).map_err(|e| {
            warn!(error = %e, "identity denied");
            ApiError::unauthorized()
        })?;
        if !self.lock().users.contains_key(&user_id) {
            return Err(ApiError::unauthorized());
        }
        Ok(MemorySession {
            store: self.clone(),
            user_id,
        })
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.lock().reachable = reachable;
    }

    /// Make the next call through any session fail with `err`.
    pub fn fail_next(&self, err: ApiError) {
        self.lock().fail_next = Some(err);
    }

    /// What a fresh fetch would return for `user`, ignoring reachability.
    pub fn dashboard_of(&self, user_id: &str) -> Dashboard {
        self.lock().dashboard(user_id)
    }

    pub fn bookmarks_in_group(&self, group_id: &str) -> usize {
        self.lock()
            .bookmarks
            .values()
            .filter(|b| b.group_id == group_id)
            .count()
    }
}

/// A [`MemoryStore`] seen through one user's identity.
#[derive(Clone, Debug)]
pub struct MemorySession {
    store: MemoryStore,
    user_id: UserId,
}

impl DashboardStore for MemorySession {
    async fn fetch_dashboard(&self) -> ApiResult<Dashboard> {
        let mut t = self.store.lock();
        t.admit()?;
        Ok(t.dashboard(&self.user_id))
    }

    async fn create_group(&self, name: &str) -> ApiResult<Group> {
        let mut t = self.store.lock();
        t.admit()?;
        required("Name", name)?;

        let order = t
            .groups
            .values()
            .filter(|g| g.user_id == self.user_id)
            .map(|g| g.order + 1)
            .max()
            .unwrap_or(0);
        let row = GroupRow {
            id: t.next_id("g"),
            user_id: self.user_id.clone(),
            name: name.to_string(),
            order,
            is_collapsed: false,
        };
        let group = t.group_model(&row);
        t.groups.insert(row.id.clone(), row);
        debug!(group = %group.id, order, "group created");
        Ok(group)
    }

    async fn update_group(&self, id: &str, patch: &GroupPatch) -> ApiResult<Group> {
        let mut t = self.store.lock();
        t.admit()?;
        t.owned_group(&self.user_id, id)?;
        if let Some(name) = &patch.name {
            required("Name", name)?;
        }

        let Some(row) = t.groups.get_mut(id) else {
            return Err(ApiError::not_found("Group"));
        };
        if let Some(name) = &patch.name {
            row.name = name.clone();
        }
        if let Some(order) = patch.order {
            row.order = order;
        }
        if let Some(c) = patch.is_collapsed {
            row.is_collapsed = c;
        }
        let row = row.clone();
        Ok(t.group_model(&row))
    }

    async fn delete_group(&self, id: &str) -> ApiResult<()> {
        let mut t = self.store.lock();
        t.admit()?;
        t.owned_group(&self.user_id, id)?;

        // Bookmarks and their group go in the same critical section.
        t.bookmarks.retain(|_, b| b.group_id != id);
        t.groups.remove(id);
        debug!(group = %id, "group deleted with its bookmarks");
        Ok(())
    }

    async fn set_all_collapsed(&self, collapsed: bool) -> ApiResult<()> {
        let mut t = self.store.lock();
        t.admit()?;
        for g in t.groups.values_mut().filter(|g| g.user_id == self.user_id) {
            g.is_collapsed = collapsed;
        }
        Ok(())
    }

    async fn create_bookmark(&self, new: &NewBookmark) -> ApiResult<Bookmark> {
        let mut t = self.store.lock();
        t.admit()?;
        required("Title", &new.title)?;
        required("URL", &new.url)?;
        required("Group", &new.group_id)?;
        t.owned_group(&self.user_id, &new.group_id)?;

        let order = t
            .bookmarks
            .values()
            .filter(|b| b.group_id == new.group_id)
            .map(|b| b.order + 1)
            .max()
            .unwrap_or(0);
        let row = BookmarkRow {
            id: t.next_id("b"),
            group_id: new.group_id.clone(),
            title: new.title.clone(),
            url: new.url.clone(),
            order,
        };
        let bookmark = row.to_model();
        t.bookmarks.insert(row.id.clone(), row);
        Ok(bookmark)
    }

    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> ApiResult<Bookmark> {
        let mut t = self.store.lock();
        t.admit()?;
        t.owned_bookmark(&self.user_id, id)?;
        if let Some(group_id) = &patch.group_id {
            t.owned_group(&self.user_id, group_id)?;
        }
        if let Some(title) = &patch.title {
            required("Title", title)?;
        }
        if let Some(url) = &patch.url {
            required("URL", url)?;
        }

        let Some(row) = t.bookmarks.get_mut(id) else {
            return Err(ApiError::not_found("Bookmark"));
        };
        let mut model = row.to_model();
        patch.apply_to(&mut model);
        row.title = model.title.clone();
        row.url = model.url.clone();
        row.order = model.order;
        row.group_id = model.group_id.clone();
        Ok(model)
    }

    async fn delete_bookmark(&self, id: &str) -> ApiResult<()> {
        let mut t = self.store.lock();
        t.admit()?;
        t.owned_bookmark(&self.user_id, id)?;
        t.bookmarks.remove(id);
        Ok(())
    }

    async fn reorder(&self, batch: &ReorderBatch) -> ApiResult<()> {
        let mut t = self.store.lock();
        t.admit()?;

        // Validate the whole batch before writing any of it.
        let validated = match batch {
            ReorderBatch::Group(items) => items
                .iter()
                .try_for_each(|i| t.owned_group(&self.user_id, &i.id).map(|_| ())),
            ReorderBatch::Bookmark(items) => items.iter().try_for_each(|i| {
                t.owned_bookmark(&self.user_id, &i.id)?;
                t.owned_group(&self.user_id, &i.group_id).map(|_| ())
            }),
        };
        if let Err(e) = validated {
            warn!(kind = batch.kind(), items = batch.len(), error = %e, "reorder batch rejected");
            return Err(e);
        }

        match batch {
            ReorderBatch::Group(items) => {
                for i in items {
                    if let Some(g) = t.groups.get_mut(&i.id) {
                        g.order = i.order;
                    }
                }
            }
            ReorderBatch::Bookmark(items) => {
                for i in items {
                    if let Some(b) = t.bookmarks.get_mut(&i.id) {
                        b.order = i.order;
                        b.group_id = i.group_id.clone();
                    }
                }
            }
        }
        debug!(kind = batch.kind(), items = batch.len(), "reorder batch applied");
        Ok(())
    }

    async fn update_title(&self, title: &str) -> ApiResult<()> {
        let mut t = self.store.lock();
        t.admit()?;
        let user = t.users.entry(self.user_id.clone()).or_default();
        user.dashboard_title = Some(title.to_string());
        Ok(())
    }
}
