//! Event subscribers for the conductor runtime.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling lifecycle events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Cells/Registry ── publish(Event) ──► Bus ──► Conductor listener
//!                                                    │
//!                                                    ├──► ActiveTracker (internal state)
//!                                                    │
//!                                                    └──► SubscriberSet::emit(&Event)
//!                                                              │
//!                                                        ┌─────┴─────┬────────┐
//!                                                        ▼           ▼        ▼
//!                                                    LogWriter    Metrics   Custom
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** - observe and react to events (logging, metrics, alerts)
//! - **Stateful subscribers** - maintain internal state based on events (ActiveTracker)

mod active;
#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

pub use active::ActiveTracker;
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
