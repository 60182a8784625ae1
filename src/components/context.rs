//! # Construction context injected into component factories.
//!
//! Every component is built with a [`Context`] supplied uniformly by the
//! conductor: the component's own type token, its configuration value
//! (resolved through the conductor's [`ResolveConfig`](crate::ResolveConfig)
//! policy), a per-component `log` target, and a handle to the event [`Bus`].
//!
//! The context is read-only for the instance's lifetime; components clone the
//! pieces they need into their own fields at construction.
//!
//! # Example
//! ```
//! use conductor::{Component, Context};
//!
//! struct Db {
//!     url: String,
//!     log_target: String,
//! }
//!
//! impl Db {
//!     fn new(ctx: Context) -> Self {
//!         let url = ctx.config()["url"].as_str().unwrap_or("sqlite::memory:").to_string();
//!         Self { url, log_target: ctx.log_target().to_string() }
//!     }
//! }
//!
//! impl Component for Db {}
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::components::naming::camel_to_snake;
use crate::components::spec::ComponentType;
use crate::events::Bus;

/// Shared construction inputs of one component.
#[derive(Clone)]
pub struct Context {
    ty: ComponentType,
    config: Value,
    log_target: Arc<str>,
    bus: Bus,
}

impl Context {
    pub(crate) fn new(ty: ComponentType, config: Value, bus: Bus) -> Self {
        let log_target: Arc<str> =
            format!("conductor::{}", camel_to_snake(ty.name())).into();
        Self {
            ty,
            config,
            log_target,
            bus,
        }
    }

    /// The type token this component was registered under.
    pub fn ty(&self) -> ComponentType {
        self.ty
    }

    /// The configuration value resolved for this component.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Per-component logging target (`conductor::<snake_case_name>`), for use
    /// with the `log` macros: `log::info!(target: ctx.log_target(), ...)`.
    pub fn log_target(&self) -> &str {
        &self.log_target
    }

    /// Handle to the lifecycle event bus.
    ///
    /// Components may publish their own diagnostics or subscribe to peer
    /// lifecycle events; the conductor's own events flow through it regardless.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}
