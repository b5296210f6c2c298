use crate::api::{ApiClient, ApiErrorKind};
use crate::dnd::{DragItem, DropTarget};
use crate::error::{SyncError, SyncResult};
use crate::models::Dashboard;
use crate::state::AppContext;
use crate::sync::{DashboardController, SyncEvent};
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::{window_event_listener, WindowListenerHandle};
use std::future::Future;
use tracing::{debug, info};

pub(crate) type BoardController = DashboardController<ApiClient, RwSignal<Dashboard>>;

/// Page-scoped owner of the board controller.
///
/// - wires controller events into `AppState` signals
/// - subscribes to window `online`/`offline` while the board is mounted
/// - runs controller futures on the local executor
#[derive(Clone)]
pub(crate) struct DashboardSync {
    app_state: AppContext,
    controller: BoardController,

    /// Window listeners; removed by `detach`.
    online_handle: StoredValue<Option<WindowListenerHandle>>,
    offline_handle: StoredValue<Option<WindowListenerHandle>>,
}

fn browser_online() -> bool {
    web_sys::window()
        .map(|w| w.navigator().on_line())
        .unwrap_or(true)
}

impl DashboardSync {
    pub fn new(app_state: AppContext) -> Self {
        let online = browser_online();
        app_state.0.online.set(online);

        let state = app_state.0.clone();
        let controller = DashboardController::new(
            app_state.0.api_client.get_untracked(),
            app_state.0.dashboard,
            crate::connectivity::ConnectivityGate::new(online),
        )
        .with_listener(move |event| match event {
            SyncEvent::Status(s) => state.sync_status.set(*s),
            SyncEvent::Notice(n) => {
                debug!(level = ?n.level, message = %n.message, "notice");
                state.push_notice(n.clone());
            }
        });

        Self {
            app_state,
            controller,
            online_handle: StoredValue::new(None),
            offline_handle: StoredValue::new(None),
        }
    }

    /// Subscribe to connectivity transitions. Call once on mount.
    pub fn attach(&self) {
        let s = self.clone();
        let online = window_event_listener(ev::online, move |_ev: web_sys::Event| {
            s.set_online(true);
        });
        self.online_handle.set_value(Some(online));

        let s = self.clone();
        let offline = window_event_listener(ev::offline, move |_ev: web_sys::Event| {
            s.set_online(false);
        });
        self.offline_handle.set_value(Some(offline));
    }

    /// Drop the window listeners. Call on unmount.
    pub fn detach(&self) {
        for handle in [self.online_handle, self.offline_handle] {
            handle.update_value(|h| {
                if let Some(h) = h.take() {
                    h.remove();
                }
            });
        }
    }

    fn set_online(&self, online: bool) {
        info!(online, "connectivity event");
        self.app_state.0.online.set(online);
        let c = self.controller.clone();
        spawn_local(async move {
            c.handle_connectivity(online).await;
        });
    }

    /// Initial fetch of the board.
    pub fn load(&self) {
        let state = self.app_state.0.clone();
        let c = self.controller.clone();
        state.loading.set(true);
        spawn_local(async move {
            if let Err(SyncError::Store(e)) = c.refresh().await {
                if e.kind == ApiErrorKind::Unauthorized {
                    state.api_client.update(|api| api.logout());
                }
            }
            state.loading.set(false);
        });
    }

    /// Run a controller action in the background. Failures were already
    /// reported through the notice channel.
    pub fn run<T, F, Fut>(&self, f: F)
    where
        T: 'static,
        F: FnOnce(BoardController) -> Fut,
        Fut: Future<Output = SyncResult<T>> + 'static,
    {
        let fut = f(self.controller.clone());
        spawn_local(async move {
            if let Err(e) = fut.await {
                debug!(error = %e, "board action failed");
            }
        });
    }

    pub fn drag_start(&self, item: DragItem) -> bool {
        self.controller.drag_start(item)
    }

    pub fn drag_over(&self, over: Option<DropTarget>) {
        self.controller.drag_over(over);
    }

    pub fn drop_on(&self, over: Option<DropTarget>) {
        self.run(move |c| async move { c.drag_end(over).await });
    }

    pub fn drag_cancel(&self) {
        self.controller.drag_cancel();
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.is_dragging()
    }
}
