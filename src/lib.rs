//! # conductor
//!
//! **Conductor** is an in-process orchestrator for the asynchronous startup
//! and shutdown of long-lived service components.
//!
//! Components declare which other components they require; the conductor
//! guarantees a component's startup logic runs only after all of its
//! dependencies are fully active, and its shutdown logic runs only after
//! every component depending on it has released it — while the actual hook
//! invocations run concurrently, in no caller-imposed order.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Component   │   │  Component   │   │  Component   │
//!     │   "db"       │   │   "cache"    │   │   "api"      │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Conductor (orchestrator)                                         │
//! │  - Registry (recipes, patch table, singleton cells)               │
//! │  - Graph walker (transitive expansion, cycle detection)           │
//! │  - Bus (broadcast lifecycle events)                               │
//! │  - ActiveTracker (authoritative active set)                       │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ComponentCell │   │ComponentCell │   │ComponentCell │
//!     │ active       │◄──│ depends_on   │◄──│ depends_on   │
//!     │ released     │   │ required_by  │   │ required_by  │
//!     └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Conductor::add(root) ──► Registry ──► ComponentCell (dormant)
//!
//! Conductor::setup():
//!   ├─► walk the graph from every registered root
//!   │     ├─ resolve dependencies lazily (patch table applied)
//!   │     ├─ cycle on the current recursion path ─► CircularDependency
//!   │     └─ schedule each reachable cell exactly once
//!   └─► run every scheduled cell.setup(..) concurrently
//!         ├─ suspend until all dependencies are active
//!         ├─ on_setup() hook
//!         └─ active = true
//!
//! Conductor::shutdown():
//!   └─► run every cell.shutdown() concurrently, no pre-ordering
//!         ├─ suspend until released (all dependents detached)
//!         ├─ on_shutdown() hook
//!         └─ detach from dependencies, active = false
//! ```
//!
//! ## Features
//! | Area              | Description                                                             | Key types / traits                        |
//! |-------------------|-------------------------------------------------------------------------|-------------------------------------------|
//! | **Components**    | Declare dependencies and lifecycle hooks.                               | [`Component`], [`DependencySpec`]         |
//! | **Orchestration** | Dependency-ordered concurrent setup/shutdown, scoped `run`/`serve`.     | [`Conductor`]                             |
//! | **Patching**      | Substitute one component type for another at construction time.         | [`Conductor::patch`]                      |
//! | **Configuration** | Pluggable per-component config resolution.                              | [`ResolveConfig`], [`SectionConfig`]      |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom subscribers).      | [`Subscribe`], [`Event`]                  |
//! | **Errors**        | Typed errors for orchestration and hooks.                               | [`OrchestrationError`], [`HookError`]     |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, OnceLock};
//!
//! use async_trait::async_trait;
//! use conductor::{
//!     Component, ComponentType, Conductor, Config, Dependencies, DependencySpec, HookError,
//! };
//!
//! const DB: ComponentType = ComponentType::new("db");
//! const API: ComponentType = ComponentType::new("api");
//!
//! struct Db;
//!
//! #[async_trait]
//! impl Component for Db {
//!     async fn on_setup(&self, _deps: &Dependencies) -> Result<(), HookError> {
//!         // open connection pools...
//!         Ok(())
//!     }
//!
//!     async fn on_shutdown(&self) -> Result<(), HookError> {
//!         // drain and close...
//!         Ok(())
//!     }
//! }
//!
//! struct Api {
//!     db: OnceLock<Arc<Db>>,
//! }
//!
//! #[async_trait]
//! impl Component for Api {
//!     fn depends_on(&self) -> DependencySpec {
//!         DependencySpec::new().require("db", DB)
//!     }
//!
//!     async fn on_setup(&self, deps: &Dependencies) -> Result<(), HookError> {
//!         // The db is guaranteed to be active here.
//!         let _ = self.db.set(deps.require_as::<Db>("db")?);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), conductor::OrchestrationError> {
//!     let conductor = Conductor::builder(Config::default()).build();
//!
//!     conductor.register(DB, |_ctx| Db);
//!     conductor.register(API, |_ctx| Api { db: OnceLock::new() });
//!
//!     // Registering the root is enough; dependencies resolve lazily.
//!     conductor.add(API)?;
//!
//!     conductor.run(async {
//!         // both components are active here
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

mod components;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use components::{
    Component, ComponentCell, ComponentRef, ComponentType, Context, Dependencies, DependencySpec,
};
pub use core::{Conductor, ConductorBuilder, Config, ResolveConfig, SectionConfig, SharedConfig};
pub use error::{HookError, OrchestrationError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{ActiveTracker, Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
