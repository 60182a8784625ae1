//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the conductor, the
//! registry, and component cells.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Conductor` (pass events), `Registry` (construction),
//!   `ComponentCell` (per-component lifecycle).
//! - **Consumers**: the conductor's listener task, which updates the
//!   `ActiveTracker` and fans out to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
