//! # Component state tracker with sequence-based ordering.
//!
//! Maintains authoritative state of which components are currently active,
//! using event sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! Cells ──► Bus ──► Conductor listener ──► ActiveTracker::update()
//!                                                  │
//!                                                  ▼
//!                                     HashMap<String, ComponentState>
//!                                          (name → {seq, active})
//! ```
//!
//! ## Rules
//! - Only `ComponentActive` / `ComponentInactive` / `SetupFailed` change state
//! - Read operations (`snapshot`, `is_active`) are **eventually consistent**
//! - Other events **update seq** but don't affect active status
//! - Events with `seq <= last_seq` are **rejected** (stale)

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

/// Per-component state for ordering validation.
#[derive(Debug, Clone)]
struct ComponentState {
    /// Last seen sequence number for this component.
    last_seq: u64,
    /// Current status (true = active, false = dormant).
    active: bool,
}

/// Thread-safe tracker of active components.
///
/// ### Responsibilities
/// - Maintains authoritative state of which components are active
/// - Provides snapshots for diagnostics ([`Conductor::active`](crate::Conductor::active))
/// - Rejects stale events using sequence numbers
pub struct ActiveTracker {
    state: RwLock<HashMap<String, ComponentState>>,
}

impl ActiveTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Updates component state if the event is newer than the last seen one.
    ///
    /// ### State transitions
    /// - `ComponentActive` → active=true, update seq
    /// - `ComponentInactive` → active=false, update seq
    /// - `SetupFailed` → active=false, update seq
    /// - Other events → no state change, update seq only
    ///
    /// Returns true if the active status changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let name = match ev.component.as_deref() {
            Some(n) => n,
            None => return false,
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(ComponentState {
            last_seq: 0,
            active: false,
        });

        if ev.seq <= entry.last_seq {
            return false;
        }
        match ev.kind {
            EventKind::ComponentActive => {
                entry.last_seq = ev.seq;
                entry.active = true;
                true
            }
            EventKind::ComponentInactive | EventKind::SetupFailed => {
                entry.last_seq = ev.seq;
                entry.active = false;
                true
            }
            _ => {
                entry.last_seq = ev.seq;
                false
            }
        }
    }

    /// Returns a sorted list of currently active component names.
    pub async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut active: Vec<String> = state
            .iter()
            .filter(|(_, cs)| cs.active)
            .map(|(name, _)| name.clone())
            .collect();
        active.sort_unstable();
        active
    }

    /// Returns true if the named component is currently active.
    pub async fn is_active(&self, name: &str) -> bool {
        self.state
            .read()
            .await
            .get(name)
            .map(|cs| cs.active)
            .unwrap_or(false)
    }
}

impl Default for ActiveTracker {
    fn default() -> Self {
        Self::new()
    }
}
