pub mod reconcile;

use crate::api::ApiResult;
use crate::collection::{self, next_order, renumber};
use crate::connectivity::{Action, ConnectivityGate, Gate, Transition};
use crate::dnd::{apply_placement, DragItem, DragSession, DropDecision, DropTarget, HoverEffect};
use crate::error::{SyncError, SyncResult};
use crate::models::{Bookmark, BookmarkPatch, Dashboard, Group, GroupId, GroupPatch, NewBookmark};
use crate::store::DashboardStore;
use crate::util::{is_tmp_id, make_tmp_id};
use reconcile::{bookmark_batch, group_batch, ReorderBatch};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Where the canonical local board lives. Reads and writes are synchronous so
/// the optimistic step never waits on I/O.
pub trait ModelCell: Clone {
    fn snapshot(&self) -> Dashboard;
    fn replace(&self, next: Dashboard);

    fn modify(&self, f: impl FnOnce(&mut Dashboard)) {
        let mut d = self.snapshot();
        f(&mut d);
        self.replace(d);
    }
}

impl ModelCell for Arc<Mutex<Dashboard>> {
    fn snapshot(&self) -> Dashboard {
        self.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace(&self, next: Dashboard) {
        *self.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Synced,
    /// A store call is in flight.
    Reconciling,
    /// Local changes made offline that were never sent.
    LocalOnly,
    /// The last refresh failed; the board may be stale.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-blocking message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    Status(SyncStatus),
    Notice(Notice),
}

pub type SyncListener = Arc<dyn Fn(&SyncEvent) + Send + Sync>;

/// Owns the local board and runs every mutation through the same
/// apply → reconcile → revert-on-failure path.
#[derive(Clone)]
pub struct DashboardController<S, M> {
    store: S,
    model: M,
    gate: ConnectivityGate,
    drag: Arc<Mutex<DragSession>>,
    status: Arc<Mutex<SyncStatus>>,
    listener: SyncListener,
}

impl<S: DashboardStore, M: ModelCell> DashboardController<S, M> {
    pub fn new(store: S, model: M, gate: ConnectivityGate) -> Self {
        Self {
            store,
            model,
            gate,
            drag: Arc::new(Mutex::new(DragSession::default())),
            status: Arc::new(Mutex::new(SyncStatus::Synced)),
            listener: Arc::new(|_| {}),
        }
    }

    pub fn with_listener(mut self, listener: impl Fn(&SyncEvent) + Send + Sync + 'static) -> Self {
        self.listener = Arc::new(listener);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_status(&self, status: SyncStatus) {
        let changed = {
            let mut s = self.status.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *s, status) != status
        };
        if changed {
            (self.listener)(&SyncEvent::Status(status));
        }
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        (self.listener)(&SyncEvent::Notice(Notice {
            level,
            message: message.into(),
        }));
    }

    fn drag(&self) -> MutexGuard<'_, DragSession> {
        self.drag.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Report `err` to the user and hand it back.
    fn reject(&self, err: SyncError) -> SyncError {
        let level = match err {
            SyncError::Store(_) => NoticeLevel::Error,
            _ => NoticeLevel::Warning,
        };
        self.notify(level, err.to_string());
        err
    }

    fn deny(&self, action: Action) -> SyncError {
        warn!(%action, "action denied while offline");
        self.reject(SyncError::Offline(action))
    }

    /// Replace the local board with the store's.
    pub async fn refresh(&self) -> SyncResult<()> {
        self.set_status(SyncStatus::Reconciling);
        match self.store.fetch_dashboard().await {
            Ok(d) => {
                debug!(groups = d.groups.len(), bookmarks = d.bookmark_count(), "board refreshed");
                self.model.replace(d);
                self.set_status(SyncStatus::Synced);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "refresh failed");
                self.set_status(SyncStatus::Failed);
                Err(e.into())
            }
        }
    }

    /// Discard local divergence by re-fetching the authoritative board.
    pub async fn revert(&self) -> SyncResult<()> {
        info!("reverting to store state");
        self.refresh().await
    }

    /// Revert; when the store cannot be read either, fall back to `snapshot`
    /// so nothing uncommitted stays on screen.
    async fn revert_to(&self, snapshot: Dashboard) {
        if self.revert().await.is_err() {
            warn!("refetch failed, restoring pre-action snapshot");
            self.model.replace(snapshot);
        }
    }

    /// Apply `apply` to the local board right away, then run `reconcile`
    /// against the store. On store failure the board is reverted and the
    /// error returned.
    ///
    /// `Ok(None)` means the action was kept local because it is allowed
    /// offline. A denied action or a failing `apply` leaves the board as it was.
    pub async fn optimistic<T, F, Fut>(
        &self,
        action: Action,
        apply: impl FnOnce(&mut Dashboard) -> SyncResult<()>,
        reconcile: F,
    ) -> SyncResult<Option<T>>
    where
        F: FnOnce(S) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let before = self.model.snapshot();
        self.optimistic_from(action, before, apply, reconcile).await
    }

    async fn optimistic_from<T, F, Fut>(
        &self,
        action: Action,
        fallback: Dashboard,
        apply: impl FnOnce(&mut Dashboard) -> SyncResult<()>,
        reconcile: F,
    ) -> SyncResult<Option<T>>
    where
        F: FnOnce(S) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let gate = self.gate.guard(action);
        if gate == Gate::Deny {
            return Err(self.deny(action));
        }

        let mut next = self.model.snapshot();
        apply(&mut next).map_err(|e| self.reject(e))?;
        self.model.replace(next);

        if gate == Gate::LocalOnly {
            debug!(%action, "kept local while offline");
            self.set_status(SyncStatus::LocalOnly);
            return Ok(None);
        }

        self.set_status(SyncStatus::Reconciling);
        match reconcile(self.store.clone()).await {
            Ok(v) => {
                self.set_status(SyncStatus::Synced);
                Ok(Some(v))
            }
            Err(e) => {
                warn!(%action, kind = ?e.kind, error = %e, "reconcile failed");
                self.revert_to(fallback).await;
                Err(self.reject(SyncError::Store(e)))
            }
        }
    }

    /// Feed a browser `online`/`offline` event. Coming back online reloads
    /// the whole board; nothing is queued while offline.
    pub async fn handle_connectivity(&self, online: bool) -> Option<Transition> {
        let transition = self.gate.transition(online)?;
        match transition {
            Transition::CameOnline => {
                info!("back online, refreshing board");
                self.notify(NoticeLevel::Info, "Back online");
                if self.refresh().await.is_err() {
                    self.notify(
                        NoticeLevel::Warning,
                        "Back online, but the board could not be reloaded",
                    );
                }
            }
            Transition::WentOffline => {
                info!("went offline");
                self.notify(
                    NoticeLevel::Warning,
                    "You are offline. Changes other than collapsing groups are disabled.",
                );
            }
        }
        Some(transition)
    }

    /// The placeholder of a confirmed create was replaced while the call was
    /// in flight, so the new row is only in the store.
    async fn reload_after_create(&self) {
        if self.refresh().await.is_err() {
            self.notify(
                NoticeLevel::Warning,
                "Saved, but the board could not be reloaded",
            );
        }
    }

    /// Send the renumber batch that follows a confirmed delete. The delete
    /// stands even when this fails; the board is reloaded to show what the
    /// store kept.
    async fn close_gap(&self, batch: Option<ReorderBatch>) -> SyncResult<()> {
        let Some(batch) = batch.filter(|b| !b.is_empty()) else {
            return Ok(());
        };
        self.set_status(SyncStatus::Reconciling);
        match self.store.reorder(&batch).await {
            Ok(()) => {
                self.set_status(SyncStatus::Synced);
                Ok(())
            }
            Err(e) => {
                warn!(kind = batch.kind(), error = %e, "renumber after delete failed");
                if self.refresh().await.is_err() {
                    warn!("refetch failed, keeping local board");
                }
                self.notify(
                    NoticeLevel::Warning,
                    format!("Deleted, but the remaining items could not be renumbered: {e}"),
                );
                Err(SyncError::Store(e))
            }
        }
    }

    fn known_group(&self, id: &str) -> SyncResult<Group> {
        if is_tmp_id(id) {
            return Err(self.reject(SyncError::PendingCreate(id.to_string())));
        }
        self.model
            .snapshot()
            .group(id)
            .cloned()
            .ok_or_else(|| self.reject(SyncError::UnknownItem(id.to_string())))
    }

    fn known_bookmark(&self, id: &str) -> SyncResult<Bookmark> {
        if is_tmp_id(id) {
            return Err(self.reject(SyncError::PendingCreate(id.to_string())));
        }
        self.model
            .snapshot()
            .bookmark(id)
            .cloned()
            .ok_or_else(|| self.reject(SyncError::UnknownItem(id.to_string())))
    }

    fn required(&self, field: &str, value: &str) -> SyncResult<String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(self.reject(SyncError::Validation(format!("{field} is required"))));
        }
        Ok(value.to_string())
    }

    /// Returns the id the store assigned.
    pub async fn create_group(&self, name: &str) -> SyncResult<GroupId> {
        let name = self.required("Group name", name)?;
        let tmp_id = make_tmp_id();

        let placeholder = Group {
            id: tmp_id.clone(),
            user_id: String::new(),
            name: name.clone(),
            order: 0,
            is_collapsed: false,
            bookmarks: Vec::new(),
        };
        let created = self
            .optimistic(
                Action::Create,
                |d| {
                    let mut g = placeholder;
                    g.order = next_order(&d.groups);
                    d.groups.push(g);
                    Ok(())
                },
                move |s| async move { s.create_group(&name).await },
            )
            .await?;

        let Some(group) = created else {
            return Ok(tmp_id);
        };
        let id = group.id.clone();
        let mut swapped = false;
        self.model.modify(|d| {
            if let Some(g) = d.group_mut(&tmp_id) {
                *g = group;
                swapped = true;
            }
        });
        debug!(tmp = %tmp_id, group = %id, swapped, "group created");
        if !swapped {
            self.reload_after_create().await;
        }
        Ok(id)
    }

    pub async fn rename_group(&self, id: &str, name: &str) -> SyncResult<()> {
        let name = self.required("Group name", name)?;
        self.known_group(id)?;
        let id = id.to_string();
        let patch = GroupPatch {
            name: Some(name),
            ..Default::default()
        };
        let (key, local) = (id.clone(), patch.clone());

        self.optimistic(
            Action::Edit,
            |d| {
                if let Some(g) = d.group_mut(&id) {
                    local.apply_to(g);
                }
                Ok(())
            },
            move |s| async move { s.update_group(&key, &patch).await },
        )
        .await
        .map(|_| ())
    }

    pub async fn toggle_collapse(&self, id: &str) -> SyncResult<()> {
        let collapsed = !self.known_group(id)?.is_collapsed;
        let id = id.to_string();
        let patch = GroupPatch {
            is_collapsed: Some(collapsed),
            ..Default::default()
        };
        let key = id.clone();

        self.optimistic(
            Action::ToggleCollapse,
            |d| {
                if let Some(g) = d.group_mut(&id) {
                    g.is_collapsed = collapsed;
                }
                Ok(())
            },
            move |s| async move { s.update_group(&key, &patch).await },
        )
        .await
        .map(|_| ())
    }

    /// Collapse or expand every group at once.
    pub async fn set_all_collapsed(&self, collapsed: bool) -> SyncResult<()> {
        self.optimistic(
            Action::ToggleCollapse,
            |d| {
                for g in d.groups.iter_mut() {
                    g.is_collapsed = collapsed;
                }
                Ok(())
            },
            |s| async move { s.set_all_collapsed(collapsed).await },
        )
        .await
        .map(|_| ())
    }

    /// Deletes the group with all its bookmarks, then closes the gap it
    /// leaves in the group order.
    pub async fn delete_group(&self, id: &str) -> SyncResult<()> {
        self.known_group(id)?;
        let id = id.to_string();

        let mut next = self.model.snapshot();
        collection::remove_from_scope(&mut next.groups, &id);
        let gap = renumber(&mut next.groups);
        let follow_up = gap.then(|| group_batch(&next));

        let deleted = self
            .optimistic(
                Action::Delete,
                |d| {
                    *d = next;
                    Ok(())
                },
                |s| async move { s.delete_group(&id).await },
            )
            .await?;
        if deleted.is_some() {
            self.close_gap(follow_up).await?;
        }
        Ok(())
    }

    /// Returns the id the store assigned.
    pub async fn create_bookmark(
        &self,
        group_id: &str,
        title: &str,
        url: &str,
    ) -> SyncResult<String> {
        let title = self.required("Title", title)?;
        let url = self.required("URL", url)?;
        self.known_group(group_id)?;

        let tmp_id = make_tmp_id();
        let new = NewBookmark {
            title: title.clone(),
            url: url.clone(),
            group_id: group_id.to_string(),
        };
        let placeholder = Bookmark {
            id: tmp_id.clone(),
            title,
            url,
            order: 0,
            group_id: group_id.to_string(),
        };

        let created = self
            .optimistic(
                Action::Create,
                |d| {
                    let g = d
                        .group_mut(&placeholder.group_id)
                        .ok_or_else(|| SyncError::UnknownItem(placeholder.group_id.clone()))?;
                    let mut b = placeholder;
                    b.order = next_order(&g.bookmarks);
                    g.bookmarks.push(b);
                    Ok(())
                },
                move |s| async move { s.create_bookmark(&new).await },
            )
            .await?;

        let Some(bookmark) = created else {
            return Ok(tmp_id);
        };
        let id = bookmark.id.clone();
        let mut swapped = false;
        self.model.modify(|d| {
            if let Some(b) = d.bookmark_mut(&tmp_id) {
                *b = bookmark;
                swapped = true;
            }
        });
        debug!(tmp = %tmp_id, bookmark = %id, swapped, "bookmark created");
        if !swapped {
            self.reload_after_create().await;
        }
        Ok(id)
    }

    pub async fn update_bookmark(&self, id: &str, title: &str, url: &str) -> SyncResult<()> {
        let title = self.required("Title", title)?;
        let url = self.required("URL", url)?;
        self.known_bookmark(id)?;
        let id = id.to_string();
        let patch = BookmarkPatch {
            title: Some(title),
            url: Some(url),
            ..Default::default()
        };
        let (key, local) = (id.clone(), patch.clone());

        self.optimistic(
            Action::Edit,
            |d| {
                if let Some(b) = d.bookmark_mut(&id) {
                    local.apply_to(b);
                }
                Ok(())
            },
            move |s| async move { s.update_bookmark(&key, &patch).await },
        )
        .await
        .map(|_| ())
    }

    pub async fn delete_bookmark(&self, id: &str) -> SyncResult<()> {
        let bookmark = self.known_bookmark(id)?;
        let id = id.to_string();
        let group_id = bookmark.group_id;

        let mut next = self.model.snapshot();
        let mut gap = false;
        if let Some(g) = next.group_mut(&group_id) {
            collection::remove_from_scope(&mut g.bookmarks, &id);
            gap = renumber(&mut g.bookmarks);
        }
        let follow_up = gap.then(|| bookmark_batch(&next, &group_id, &group_id));

        let deleted = self
            .optimistic(
                Action::Delete,
                |d| {
                    *d = next;
                    Ok(())
                },
                |s| async move { s.delete_bookmark(&id).await },
            )
            .await?;
        if deleted.is_some() {
            self.close_gap(follow_up).await?;
        }
        Ok(())
    }

    pub async fn update_title(&self, title: &str) -> SyncResult<()> {
        let title = self.required("Title", title)?;
        let local = title.clone();

        self.optimistic(
            Action::Edit,
            |d| {
                d.title = Some(local);
                Ok(())
            },
            |s| async move { s.update_title(&title).await },
        )
        .await
        .map(|_| ())
    }

    pub fn is_dragging(&self) -> bool {
        self.drag().is_active()
    }

    /// Begin a gesture. Refused while offline, for unsaved items and while
    /// another gesture is in flight.
    pub fn drag_start(&self, item: DragItem) -> bool {
        if self.gate.guard(Action::Reorder) == Gate::Deny {
            self.deny(Action::Reorder);
            return false;
        }
        if is_tmp_id(item.id()) {
            self.reject(SyncError::PendingCreate(item.id().to_string()));
            return false;
        }

        let board = self.model.snapshot();
        let started = self.drag().start(item.clone(), &board);
        if started {
            debug!(item = ?item, "drag started");
        }
        started
    }

    /// Pointer moved. Only a bookmark entering another group changes the
    /// board mid-gesture.
    pub fn drag_over(&self, over: Option<DropTarget>) {
        let board = self.model.snapshot();
        let effect = self.drag().hover(over, &board);
        if let HoverEffect::Apply(placement) = effect {
            let mut next = board;
            match apply_placement(&mut next, &placement) {
                Ok(()) => {
                    debug!(placement = ?placement, "hover placement applied");
                    self.model.replace(next);
                }
                Err(e) => warn!(error = %e, "hover placement failed"),
            }
        }
    }

    /// Release inside the board. Commits the final placement and sends one
    /// batch for it. A release outside the board goes through `drag_cancel`.
    pub async fn drag_end(&self, over: Option<DropTarget>) -> SyncResult<()> {
        let board = self.model.snapshot();
        let decision = self.drag().finish(over, &board);

        let (active, placement, origin, origin_group) = match decision {
            DropDecision::Ignored => return Ok(()),
            DropDecision::Restore(origin) => {
                debug!("drop without target, board restored");
                self.model.replace(origin);
                return Ok(());
            }
            DropDecision::Commit {
                active,
                placement,
                origin,
                origin_group,
            } => (active, placement, origin, origin_group),
        };

        if self.gate.guard(Action::Reorder) == Gate::Deny {
            self.model.replace(origin);
            return Err(self.deny(Action::Reorder));
        }

        let mut next = board;
        if let Some(p) = &placement {
            if let Err(e) = apply_placement(&mut next, p) {
                self.model.replace(origin);
                return Err(self.reject(e.into()));
            }
        }
        if next == origin {
            self.model.replace(origin);
            return Ok(());
        }

        let batch = match &active {
            DragItem::Group { .. } => group_batch(&next),
            DragItem::Bookmark { id, .. } => {
                let Some(dest) = next.group_of_bookmark(id).map(|g| g.id.clone()) else {
                    self.model.replace(origin);
                    return Err(self.reject(SyncError::UnknownItem(id.clone())));
                };
                let source = origin_group.unwrap_or_else(|| dest.clone());
                bookmark_batch(&next, &source, &dest)
            }
        };
        info!(kind = batch.kind(), items = batch.len(), "committing drop");

        self.optimistic_from(
            Action::Reorder,
            origin,
            |d| {
                *d = next;
                Ok(())
            },
            |s| async move { s.reorder(&batch).await },
        )
        .await
        .map(|_| ())
    }

    /// Abandon the gesture and put the board back.
    pub fn drag_cancel(&self) {
        let origin = self.drag().cancel();
        if let Some(origin) = origin {
            debug!("drag cancelled, board restored");
            self.model.replace(origin);
        }
    }
}
