use crate::dnd::{detect_collision, BoardItem, DragItem, DropTarget, Droppable, Point, Rect};
use crate::models::{Bookmark, Group};
use crate::state::{AppContext, DashboardSync};
use crate::sync::{NoticeLevel, SyncStatus};
use crate::util::is_tmp_id;
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::{window_event_listener, WindowListenerHandle};
use leptos_router::hooks::use_navigate;
use wasm_bindgen::JsCast;

const DEFAULT_TITLE: &str = "My Dashboard";
const DROP_SELECTOR: &str = "[data-drop-kind]";

/// Where the dragged element was when the gesture began.
#[derive(Clone, Debug)]
struct DragGeometry {
    item: DragItem,
    rect: Rect,
    start: Point,
}

fn dom_rect(el: &web_sys::Element) -> Rect {
    let r = el.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.width(), r.height())
}

fn pointer(ev: &web_sys::DragEvent) -> Point {
    Point {
        x: ev.client_x() as f64,
        y: ev.client_y() as f64,
    }
}

fn item_of(el: &web_sys::Element) -> Option<BoardItem> {
    let kind = el.get_attribute("data-drop-kind")?;
    let id = el.get_attribute("data-id")?;
    let group = el.get_attribute("data-group");
    BoardItem::from_attrs(&kind, &id, group.as_deref())
}

/// Innermost droppable element the event started on.
fn drag_source(ev: &web_sys::DragEvent) -> Option<web_sys::Element> {
    ev.target()?
        .dyn_into::<web_sys::Element>()
        .ok()?
        .closest(DROP_SELECTOR)
        .ok()
        .flatten()
}

/// Every droppable on the page with its current client rect, in DOM order.
fn collect_droppables() -> Vec<Droppable> {
    let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
        return vec![];
    };
    let Ok(nodes) = doc.query_selector_all(DROP_SELECTOR) else {
        return vec![];
    };

    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|n| n.dyn_into::<web_sys::Element>().ok())
        .filter_map(|el| {
            item_of(&el).map(|target| Droppable {
                target,
                rect: dom_rect(&el),
            })
        })
        .collect()
}

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

fn notice_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "notice notice--info",
        NoticeLevel::Warning => "notice notice--warning",
        NoticeLevel::Error => "notice notice--error",
    }
}

fn status_label(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Synced => "",
        SyncStatus::Reconciling => "Saving…",
        SyncStatus::LocalOnly => "Some changes are only on this device",
        SyncStatus::Failed => "Could not reach the server",
    }
}

#[component]
pub fn SignInPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let token: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let navigate = use_navigate();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let value = token.get_untracked().trim().to_string();
        if value.is_empty() {
            error.set(Some("Access token is required".to_string()));
            return;
        }
        app_state.0.api_client.update(|c| {
            c.set_token(value);
            c.save_to_storage();
        });
        navigate("/", Default::default());
    };

    view! {
        <main class="mx-auto max-w-sm space-y-4 px-4 py-16">
            <h1 class="text-xl font-semibold">"Sign in"</h1>
            <p class="text-sm text-muted-foreground">
                "Only registered accounts can use the dashboard."
            </p>
            <form class="space-y-3" on:submit=on_submit>
                <input
                    class="w-full rounded-md border px-3 py-1 text-sm"
                    type="password"
                    placeholder="Access token"
                    prop:value=move || token.get()
                    on:input=move |ev| token.set(event_target_value(&ev))
                />
                <Show when=move || error.get().is_some()>
                    <p class="text-sm text-destructive">{move || error.get().unwrap_or_default()}</p>
                </Show>
                <button class="rounded-md bg-primary px-4 py-1 text-sm text-primary-foreground" type="submit">
                    "Continue"
                </button>
            </form>
        </main>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let sync = DashboardSync::new(app_state.clone());
    sync.attach();
    sync.load();
    provide_context(sync.clone());
    {
        let sync = sync.clone();
        on_cleanup(move || sync.detach());
    }

    let state = app_state.0.clone();
    let dashboard = state.dashboard;
    let online = state.online;
    let loading = state.loading;
    let sync_status = state.sync_status;
    let notices = state.notices;
    let api_client = state.api_client;

    let editing_title = RwSignal::new(false);
    let title_draft = RwSignal::new(String::new());
    let new_group = RwSignal::new(String::new());
    let geometry: StoredValue<Option<DragGeometry>> = StoredValue::new(None);

    let title = move || {
        dashboard
            .with(|d| d.title.clone())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    };
    let all_collapsed = move || dashboard.with(|d| d.all_collapsed());

    let target_at = move |p: Point| -> Option<DropTarget> {
        let g = geometry.get_value()?;
        let rect = g.rect.translate(p.x - g.start.x, p.y - g.start.y);
        detect_collision(&g.item, p, Some(rect), &collect_droppables())
    };

    let on_title_submit = {
        let s = sync.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let t = title_draft.get_untracked();
            editing_title.set(false);
            s.run(move |c| async move { c.update_title(&t).await });
        }
    };

    let on_toggle_all = {
        let s = sync.clone();
        move |_| {
            let collapse = !dashboard.with_untracked(|d| d.all_collapsed());
            s.run(move |c| async move { c.set_all_collapsed(collapse).await });
        }
    };

    let on_add_group = {
        let s = sync.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let name = new_group.get_untracked();
            new_group.set(String::new());
            s.run(move |c| async move { c.create_group(&name).await });
        }
    };

    // A full reload drops the controller along with the token it captured.
    let on_sign_out = move |_| {
        api_client.update(|c| c.logout());
        if let Some(w) = web_sys::window() {
            let _ = w.location().set_href("/sign-in");
        }
    };

    let on_dragstart = {
        let s = sync.clone();
        move |ev: web_sys::DragEvent| {
            // A gesture whose source element was re-rendered away never sees
            // its dragend; clear it before starting another.
            if s.is_dragging() {
                s.drag_cancel();
            }
            let Some(el) = drag_source(&ev) else {
                return;
            };
            let Some(item) = item_of(&el) else {
                return;
            };
            ev.stop_propagation();
            if !s.drag_start(item.clone()) {
                ev.prevent_default();
                return;
            }
            if let Some(dt) = ev.data_transfer() {
                let _ = dt.set_data("text/plain", item.id());
                dt.set_effect_allowed("move");
            }
            geometry.set_value(Some(DragGeometry {
                item,
                rect: dom_rect(&el),
                start: pointer(&ev),
            }));
        }
    };

    let on_dragover = {
        let s = sync.clone();
        move |ev: web_sys::DragEvent| {
            if geometry.with_value(|g| g.is_none()) {
                return;
            }
            ev.prevent_default();
            if let Some(dt) = ev.data_transfer() {
                dt.set_drop_effect("move");
            }
            s.drag_over(target_at(pointer(&ev)));
        }
    };

    let on_drop = {
        let s = sync.clone();
        move |ev: web_sys::DragEvent| {
            if geometry.with_value(|g| g.is_none()) {
                return;
            }
            ev.prevent_default();
            let over = target_at(pointer(&ev));
            geometry.set_value(None);
            s.drop_on(over);
        }
    };

    // Fires after `drop`; only a gesture released outside the board is left.
    let on_dragend = {
        let s = sync.clone();
        move |_ev: web_sys::DragEvent| {
            if geometry.with_value(|g| g.is_some()) {
                geometry.set_value(None);
                s.drag_cancel();
            }
        }
    };

    // A hover move re-renders the source element away, and its `dragend`
    // then never reaches the board. Accepting the drop anywhere on the page
    // lets a release outside the board still put the board back.
    let off_board: StoredValue<Vec<WindowListenerHandle>> = StoredValue::new(Vec::new());
    {
        let over = window_event_listener(ev::dragover, move |ev: web_sys::DragEvent| {
            if geometry.with_value(|g| g.is_some()) {
                ev.prevent_default();
            }
        });
        let s = sync.clone();
        let dropped = window_event_listener(ev::drop, move |ev: web_sys::DragEvent| {
            // The board's own `drop` has already cleared the geometry.
            if geometry.with_value(|g| g.is_none()) {
                return;
            }
            ev.prevent_default();
            geometry.set_value(None);
            s.drag_cancel();
        });
        off_board.set_value(vec![over, dropped]);
        on_cleanup(move || {
            off_board.update_value(|handles| {
                for h in handles.drain(..) {
                    h.remove();
                }
            });
        });
    }

    view! {
        <main class="mx-auto max-w-6xl space-y-4 px-4 py-6">
            <header class="flex flex-wrap items-center gap-3">
                {move || {
                    if editing_title.get() {
                        view! {
                            <form class="flex items-center gap-2" on:submit=on_title_submit.clone()>
                                <input
                                    class="rounded-md border px-2 py-1 text-lg"
                                    prop:value=move || title_draft.get()
                                    on:input=move |ev| title_draft.set(event_target_value(&ev))
                                />
                                <button class="text-sm" type="submit">"Save"</button>
                                <button class="text-sm" type="button" on:click=move |_| editing_title.set(false)>
                                    "Cancel"
                                </button>
                            </form>
                        }
                        .into_any()
                    } else {
                        view! {
                            <h1
                                class="cursor-text text-2xl font-semibold"
                                title="Double-click to rename"
                                on:dblclick=move |_| {
                                    title_draft.set(title());
                                    editing_title.set(true);
                                }
                            >
                                {title}
                            </h1>
                        }
                        .into_any()
                    }
                }}

                <span class="text-xs text-muted-foreground">{move || status_label(sync_status.get())}</span>

                <div class="ml-auto flex items-center gap-2">
                    <button class="rounded-md border px-3 py-1 text-sm" on:click=on_toggle_all>
                        {move || if all_collapsed() { "Expand all" } else { "Collapse all" }}
                    </button>
                    <Show
                        when=move || api_client.with(|c| c.is_authenticated())
                        fallback=|| view! { <a class="text-sm underline" href="/sign-in">"Sign in"</a> }
                    >
                        <button class="text-sm text-muted-foreground" on:click=on_sign_out>
                            "Sign out"
                        </button>
                    </Show>
                </div>
            </header>

            <Show when=move || !online.get()>
                <div class="rounded-md border border-warning px-3 py-2 text-sm" role="status">
                    "You are offline. Collapsing works locally; other changes are disabled until the connection returns."
                </div>
            </Show>

            <div class="space-y-2">
                {move || {
                    let st = state.clone();
                    notices
                        .get()
                        .into_iter()
                        .enumerate()
                        .map(|(i, n)| {
                            let st = st.clone();
                            view! {
                                <div class=notice_class(n.level) role="alert">
                                    <span>{n.message}</span>
                                    <button class="ml-2" on:click=move |_| st.dismiss_notice(i)>"×"</button>
                                </div>
                            }
                        })
                        .collect_view()
                }}
            </div>

            <form class="flex items-center gap-2" on:submit=on_add_group>
                <input
                    class="rounded-md border px-3 py-1 text-sm"
                    placeholder="New group"
                    prop:value=move || new_group.get()
                    on:input=move |ev| new_group.set(event_target_value(&ev))
                />
                <button class="rounded-md border px-3 py-1 text-sm" type="submit" disabled=move || !online.get()>
                    "Add group"
                </button>
            </form>

            <Show when=move || loading.get()>
                <div class="text-sm text-muted-foreground">"Loading…"</div>
            </Show>

            <div
                class="grid gap-4 sm:grid-cols-2 lg:grid-cols-3"
                on:dragstart=on_dragstart
                on:dragover=on_dragover
                on:drop=on_drop
                on:dragend=on_dragend
            >
                {move || {
                    let groups = dashboard.with(|d| d.groups.clone());
                    if groups.is_empty() && !loading.get() {
                        return view! {
                            <p class="text-sm text-muted-foreground">"No groups yet."</p>
                        }
                        .into_any();
                    }
                    groups
                        .into_iter()
                        .map(|g| view! { <GroupCard group=g /> })
                        .collect_view()
                        .into_any()
                }}
            </div>
        </main>
    }
}

#[component]
fn GroupCard(group: Group) -> impl IntoView {
    let sync = expect_context::<DashboardSync>();
    let Group {
        id,
        name,
        is_collapsed,
        bookmarks,
        ..
    } = group;
    let pending = is_tmp_id(&id);

    let renaming = RwSignal::new(false);
    let name_draft = RwSignal::new(name.clone());
    let title_draft = RwSignal::new(String::new());
    let url_draft = RwSignal::new(String::new());

    let on_toggle = {
        let (s, id) = (sync.clone(), id.clone());
        move |_| {
            let id = id.clone();
            s.run(move |c| async move { c.toggle_collapse(&id).await });
        }
    };

    let on_rename = {
        let (s, id) = (sync.clone(), id.clone());
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let (id, name) = (id.clone(), name_draft.get_untracked());
            renaming.set(false);
            s.run(move |c| async move { c.rename_group(&id, &name).await });
        }
    };

    let on_delete = {
        let (s, id, name) = (sync.clone(), id.clone(), name.clone());
        move |_| {
            if !confirm(&format!("Delete \"{name}\" and all its bookmarks?")) {
                return;
            }
            let id = id.clone();
            s.run(move |c| async move { c.delete_group(&id).await });
        }
    };

    let on_add_bookmark = {
        let (s, id) = (sync.clone(), id.clone());
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let (id, title, url) = (id.clone(), title_draft.get_untracked(), url_draft.get_untracked());
            title_draft.set(String::new());
            url_draft.set(String::new());
            s.run(move |c| async move { c.create_bookmark(&id, &title, &url).await });
        }
    };

    let header_name = name.clone();

    view! {
        <section
            class="rounded-xl border bg-card p-3 shadow-sm"
            class:opacity-60=pending
            data-drop-kind="group"
            data-id=id.clone()
            draggable=if pending { "false" } else { "true" }
        >
            <header class="flex items-center gap-2">
                <button class="text-xs" title="Collapse" on:click=on_toggle>
                    {if is_collapsed { "▸" } else { "▾" }}
                </button>
                {move || {
                    if renaming.get() {
                        view! {
                            <form class="flex-1" on:submit=on_rename.clone()>
                                <input
                                    class="w-full rounded-md border px-2 py-0.5 text-sm"
                                    prop:value=move || name_draft.get()
                                    on:input=move |ev| name_draft.set(event_target_value(&ev))
                                />
                            </form>
                        }
                        .into_any()
                    } else {
                        view! {
                            <h2
                                class="flex-1 truncate text-sm font-semibold"
                                on:dblclick=move |_| renaming.set(true)
                            >
                                {header_name.clone()}
                            </h2>
                        }
                        .into_any()
                    }
                }}
                <button class="text-xs text-muted-foreground" title="Delete group" on:click=on_delete>
                    "✕"
                </button>
            </header>

            {(!is_collapsed).then(|| {
                view! {
                    <ul class="mt-2 space-y-1">
                        {bookmarks
                            .into_iter()
                            .map(|b| view! { <BookmarkRow bookmark=b /> })
                            .collect_view()}
                    </ul>
                    <form class="mt-2 flex flex-col gap-1" on:submit=on_add_bookmark>
                        <input
                            class="rounded-md border px-2 py-0.5 text-xs"
                            placeholder="Title"
                            prop:value=move || title_draft.get()
                            on:input=move |ev| title_draft.set(event_target_value(&ev))
                        />
                        <input
                            class="rounded-md border px-2 py-0.5 text-xs"
                            placeholder="https://"
                            prop:value=move || url_draft.get()
                            on:input=move |ev| url_draft.set(event_target_value(&ev))
                        />
                        <button class="self-end text-xs" type="submit" disabled=pending>
                            "Add bookmark"
                        </button>
                    </form>
                }
            })}
        </section>
    }
}

#[component]
fn BookmarkRow(bookmark: Bookmark) -> impl IntoView {
    let sync = expect_context::<DashboardSync>();
    let Bookmark {
        id,
        title,
        url,
        group_id,
        ..
    } = bookmark;
    let pending = is_tmp_id(&id);

    let editing = RwSignal::new(false);
    let title_draft = RwSignal::new(title.clone());
    let url_draft = RwSignal::new(url.clone());

    let on_save = {
        let (s, id) = (sync.clone(), id.clone());
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let (id, title, url) = (id.clone(), title_draft.get_untracked(), url_draft.get_untracked());
            editing.set(false);
            s.run(move |c| async move { c.update_bookmark(&id, &title, &url).await });
        }
    };

    let on_delete = {
        let (s, id) = (sync.clone(), id.clone());
        move |_| {
            let id = id.clone();
            s.run(move |c| async move { c.delete_bookmark(&id).await });
        }
    };

    view! {
        <li
            class="flex items-center gap-2 rounded-md px-2 py-1 text-sm hover:bg-surface-hover"
            class:opacity-60=pending
            data-drop-kind="bookmark"
            data-id=id.clone()
            data-group=group_id
            draggable=if pending { "false" } else { "true" }
        >
            {move || {
                if editing.get() {
                    view! {
                        <form class="flex flex-1 flex-col gap-1" on:submit=on_save.clone()>
                            <input
                                class="rounded-md border px-2 py-0.5 text-xs"
                                prop:value=move || title_draft.get()
                                on:input=move |ev| title_draft.set(event_target_value(&ev))
                            />
                            <input
                                class="rounded-md border px-2 py-0.5 text-xs"
                                prop:value=move || url_draft.get()
                                on:input=move |ev| url_draft.set(event_target_value(&ev))
                            />
                            <div class="flex gap-2 self-end">
                                <button class="text-xs" type="submit">"Save"</button>
                                <button class="text-xs" type="button" on:click=move |_| editing.set(false)>
                                    "Cancel"
                                </button>
                            </div>
                        </form>
                    }
                    .into_any()
                } else {
                    view! {
                        <a class="flex-1 truncate" href=url.clone() target="_blank" rel="noopener noreferrer">
                            {title.clone()}
                        </a>
                        <button class="text-xs text-muted-foreground" title="Edit" on:click=move |_| editing.set(true)>
                            "✎"
                        </button>
                    }
                    .into_any()
                }
            }}
            <button class="text-xs text-muted-foreground" title="Delete bookmark" on:click=on_delete>
                "✕"
            </button>
        </li>
    }
}
