use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// User actions, by what they need from the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Create,
    Edit,
    Delete,
    Reorder,
    ToggleCollapse,
}

impl Action {
    /// Collapse state is idempotent and meaningful locally, so it may stay
    /// local-only while offline. Everything else must reach the store.
    pub fn allowed_offline(self) -> bool {
        matches!(self, Action::ToggleCollapse)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Reorder => "reorder",
            Action::ToggleCollapse => "collapse",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Allow,
    /// Apply locally, skip reconciliation.
    LocalOnly,
    Deny,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    CameOnline,
    WentOffline,
}

/// Process-wide online flag. Clones share the same flag.
#[derive(Clone, Debug)]
pub struct ConnectivityGate {
    online: Arc<AtomicBool>,
}

impl ConnectivityGate {
    pub fn new(initially_online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(initially_online)),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Record a transition event. Returns `None` when the flag did not change
    /// (browsers may repeat `online`).
    pub fn transition(&self, online: bool) -> Option<Transition> {
        let was = self.online.swap(online, Ordering::SeqCst);
        match (was, online) {
            (false, true) => Some(Transition::CameOnline),
            (true, false) => Some(Transition::WentOffline),
            _ => None,
        }
    }

    pub fn guard(&self, action: Action) -> Gate {
        if self.is_online() {
            Gate::Allow
        } else if action.allowed_offline() {
            Gate::LocalOnly
        } else {
            Gate::Deny
        }
    }
}

impl Default for ConnectivityGate {
    fn default() -> Self {
        Self::new(true)
    }
}
