//! # Lifecycle events emitted by the conductor and component cells.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Registry events**: component construction ([`EventKind::ComponentRegistered`]).
//! - **Lifecycle events**: per-component setup/shutdown flow.
//! - **Pass events**: whole-graph milestones and the serve-loop shutdown trigger.
//!
//! The [`Event`] struct carries optional metadata: the component's role name
//! and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use conductor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::SetupFailed)
//!     .with_component("db")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::SetupFailed);
//! assert_eq!(ev.component.as_deref(), Some("db"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Registry events ===
    /// A component singleton was constructed and stored in the registry.
    ///
    /// Sets:
    /// - `component`: role name (the registry key)
    /// - `reason`: `constructed as <type>` when a patch substituted the type
    ComponentRegistered,

    // === Component lifecycle events ===
    /// A component's setup call started (it may still suspend on its
    /// dependencies' active latches before the startup hook runs).
    ///
    /// Sets:
    /// - `component`: role name
    SetupStarting,

    /// A component finished its startup hook and is now active.
    ///
    /// Sets:
    /// - `component`: role name
    ComponentActive,

    /// A component's setup failed; its edges were rolled back and it stays
    /// inactive.
    ///
    /// Sets:
    /// - `component`: role name
    /// - `reason`: failure message
    SetupFailed,

    /// A component's shutdown call started (it may still suspend on its
    /// released latch until every dependent has detached).
    ///
    /// Sets:
    /// - `component`: role name
    ShutdownStarting,

    /// A component finished its shutdown hook and returned to dormant.
    ///
    /// Sets:
    /// - `component`: role name
    ComponentInactive,

    /// A component's shutdown hook failed. The component detached from its
    /// dependencies and returned to dormant; its own resources are undefined.
    ///
    /// Sets:
    /// - `component`: role name
    /// - `reason`: failure message
    ShutdownFailed,

    // === Pass events ===
    /// A setup pass completed: every reachable component is active.
    AllActive,

    /// A shutdown pass completed: every registered component is inactive.
    AllInactive,

    /// Shutdown requested (OS signal observed or serve token cancelled).
    ShutdownRequested,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Role name of the component, if applicable.
    pub component: Option<Arc<str>>,
    /// Human-readable reason (hook errors, patch substitutions).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: None,
            reason: None,
        }
    }

    /// Attaches a component role name.
    #[inline]
    pub fn with_component(mut self, component: impl Into<Arc<str>>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
