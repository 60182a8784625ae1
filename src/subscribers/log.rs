//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [registered] component=db
//! [setup-starting] component=db
//! [active] component=db
//! [setup-failed] component=db err="connection refused"
//! [shutdown-starting] component=db
//! [inactive] component=db
//! [all-active]
//! [all-inactive]
//! [shutdown-requested]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use - implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ComponentRegistered => {
                if let Some(component) = &e.component {
                    match &e.reason {
                        Some(reason) => println!("[registered] component={component} ({reason})"),
                        None => println!("[registered] component={component}"),
                    }
                }
            }
            EventKind::SetupStarting => {
                if let Some(component) = &e.component {
                    println!("[setup-starting] component={component}");
                }
            }
            EventKind::ComponentActive => {
                if let Some(component) = &e.component {
                    println!("[active] component={component}");
                }
            }
            EventKind::SetupFailed => {
                println!(
                    "[setup-failed] component={:?} err={:?}",
                    e.component, e.reason
                );
            }
            EventKind::ShutdownStarting => {
                if let Some(component) = &e.component {
                    println!("[shutdown-starting] component={component}");
                }
            }
            EventKind::ComponentInactive => {
                if let Some(component) = &e.component {
                    println!("[inactive] component={component}");
                }
            }
            EventKind::ShutdownFailed => {
                println!(
                    "[shutdown-failed] component={:?} err={:?}",
                    e.component, e.reason
                );
            }
            EventKind::AllActive => {
                println!("[all-active]");
            }
            EventKind::AllInactive => {
                println!("[all-inactive]");
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
