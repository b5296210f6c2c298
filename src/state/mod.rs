mod dashboard_sync;

pub(crate) use dashboard_sync::DashboardSync;

use crate::api::ApiClient;
use crate::models::Dashboard;
use crate::sync::{ModelCell, Notice, SyncStatus};
use leptos::prelude::*;

/// Most recent notices kept on screen.
const MAX_NOTICES: usize = 3;

#[derive(Clone)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Canonical local board; the sync controller writes it, views read it.
    pub dashboard: RwSignal<Dashboard>,
    pub loading: RwSignal<bool>,

    /// Browser connectivity, mirrored from the controller's gate.
    pub online: RwSignal<bool>,
    pub sync_status: RwSignal<SyncStatus>,
    pub notices: RwSignal<Vec<Notice>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::load_from_storage()),
            dashboard: RwSignal::new(Dashboard::default()),
            loading: RwSignal::new(false),
            online: RwSignal::new(true),
            sync_status: RwSignal::new(SyncStatus::Synced),
            notices: RwSignal::new(vec![]),
        }
    }

    pub fn push_notice(&self, notice: Notice) {
        self.notices.update(|xs| {
            xs.push(notice);
            if xs.len() > MAX_NOTICES {
                let extra = xs.len() - MAX_NOTICES;
                xs.drain(..extra);
            }
        });
    }

    pub fn dismiss_notice(&self, index: usize) {
        self.notices.update(|xs| {
            if index < xs.len() {
                xs.remove(index);
            }
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

impl ModelCell for RwSignal<Dashboard> {
    fn snapshot(&self) -> Dashboard {
        self.get_untracked()
    }

    fn replace(&self, next: Dashboard) {
        self.set(next);
    }
}
