pub mod memory;

pub use memory::{MemorySession, MemoryStore};

use crate::api::ApiResult;
use crate::models::{Bookmark, BookmarkPatch, Dashboard, Group, GroupPatch, NewBookmark};
use crate::sync::reconcile::ReorderBatch;

/// The persistence side of the board, scoped to one signed-in user.
///
/// Every call is a single all-or-nothing unit on the store. Reads and writes
/// only ever see the caller's own groups and bookmarks; touching anything else
/// fails the whole call.
#[allow(async_fn_in_trait)]
pub trait DashboardStore: Clone {
    /// Title plus groups with nested bookmarks, both ordered ascending.
    async fn fetch_dashboard(&self) -> ApiResult<Dashboard>;

    async fn create_group(&self, name: &str) -> ApiResult<Group>;
    async fn update_group(&self, id: &str, patch: &GroupPatch) -> ApiResult<Group>;
    /// Removes the group and every bookmark in it.
    async fn delete_group(&self, id: &str) -> ApiResult<()>;
    async fn set_all_collapsed(&self, collapsed: bool) -> ApiResult<()>;

    async fn create_bookmark(&self, new: &NewBookmark) -> ApiResult<Bookmark>;
    async fn update_bookmark(&self, id: &str, patch: &BookmarkPatch) -> ApiResult<Bookmark>;
    async fn delete_bookmark(&self, id: &str) -> ApiResult<()>;

    async fn reorder(&self, batch: &ReorderBatch) -> ApiResult<()>;

    async fn update_title(&self, title: &str) -> ApiResult<()>;
}
