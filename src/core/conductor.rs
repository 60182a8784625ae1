//! # Conductor: the orchestrator's external entry points.
//!
//! The [`Conductor`] owns the registry (recipes, patches, singleton cells),
//! the event [`Bus`], the [`SubscriberSet`], and the [`ActiveTracker`]. It
//! drives whole-graph setup and shutdown passes and exposes the scoped
//! process entry points `run` and `serve`.
//!
//! ## Key responsibilities
//! - lazily construct component singletons via the registry/patch resolver
//! - expand each root's transitive dependencies, detecting cycles
//! - run every scheduled setup (or shutdown) operation **concurrently** and
//!   wait for all of them to settle before returning
//! - subscribe to the [`Bus`] and fan out events to subscribers + tracker
//!
//! ## High-level architecture
//! ```text
//! caller ──► Conductor::add(root type)          (lazy singleton construction)
//!               │
//!               ▼
//!          Conductor::setup()
//!               ├─► walker::plan()              (DFS expansion, cycle check,
//!               │                                lazy add() of dependencies)
//!               └─► join_all(cell.setup(..))    (concurrent; cells order
//!                                                themselves via latches)
//!
//!          Conductor::shutdown()
//!               └─► join_all(cell.shutdown())   (no pre-ordering; released
//!                                                latches enforce the order)
//!
//! Event flow:
//!   Cells/Registry ── publish ──► Bus ──► listener ──► ActiveTracker
//!                                              └─────► SubscriberSet
//! ```
//!
//! Ordering between unrelated branches of the graph is unspecified; ordering
//! along any dependency chain is strictly enforced by the cells' wait
//! conditions, not by scheduling order.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::components::{
    Component, ComponentCell, ComponentRef, ComponentType, Context,
};
use crate::core::config::{Config, ResolveConfig};
use crate::core::registry::Registry;
use crate::core::{signal, walker};
use crate::error::OrchestrationError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{ActiveTracker, SubscriberSet};

const LOG_TARGET: &str = "conductor";

/// Coordinates component construction, dependency-ordered startup/shutdown,
/// and event delivery.
///
/// Create one with [`Conductor::builder`]; construction must happen within a
/// Tokio runtime (worker tasks are spawned for subscribers and the bus
/// listener).
pub struct Conductor {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    tracker: Arc<ActiveTracker>,
    registry: Registry,
}

impl Conductor {
    /// Starts building a conductor with the given runtime configuration.
    pub fn builder(cfg: Config) -> super::builder::ConductorBuilder {
        super::builder::ConductorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        tracker: Arc<ActiveTracker>,
        config_policy: Arc<dyn ResolveConfig>,
    ) -> Self {
        let registry = Registry::new(bus.clone(), config_policy);
        Self {
            cfg,
            bus,
            subs,
            tracker,
            registry,
        }
    }

    /// Records the construction recipe for a component type.
    ///
    /// Every type reachable from a registered root — including patch
    /// replacements — needs a recipe before `setup()` expands the graph.
    pub fn register<T, F>(&self, ty: ComponentType, factory: F)
    where
        T: Component,
        F: Fn(Context) -> T + Send + Sync + 'static,
    {
        self.registry.register(ty, factory);
    }

    /// Substitutes `replacement` for `ty` at construction time.
    ///
    /// Must be called before the first lookup of `ty`; the last call for a
    /// given `ty` wins. The instance is stored under `ty`, so all dependents
    /// observe the same singleton regardless of the patch.
    pub fn patch(
        &self,
        ty: ComponentType,
        replacement: ComponentType,
    ) -> Result<(), OrchestrationError> {
        self.registry.patch(ty, replacement)
    }

    /// Returns the singleton cell for `ty`, constructing it on first lookup.
    ///
    /// Cells added before `setup()` act as the roots of the pass; dependencies
    /// are added lazily during graph expansion.
    pub fn add(&self, ty: ComponentType) -> Result<Arc<ComponentCell>, OrchestrationError> {
        self.registry.add(ty)
    }

    /// Returns the cell for `ty` if it has been constructed.
    pub fn cell(&self, ty: ComponentType) -> Option<Arc<ComponentCell>> {
        self.registry.get(ty)
    }

    /// Returns the component instance for `ty` as a trait object, if constructed.
    pub fn component(&self, ty: ComponentType) -> Option<ComponentRef> {
        self.registry.get(ty).map(|cell| cell.component())
    }

    /// Returns the component instance for `ty` downcast to its concrete type.
    ///
    /// `None` if the type was never constructed or the instance is not a `T`
    /// (e.g. it was patched with a different concrete type).
    pub fn component_as<T: Component>(&self, ty: ComponentType) -> Option<Arc<T>> {
        self.registry
            .get(ty)
            .and_then(|cell| cell.instance().downcast::<T>())
    }

    /// Sorted names of the components that are currently active, as observed
    /// through the event stream (eventually consistent).
    pub async fn active(&self) -> Vec<String> {
        self.tracker.snapshot().await
    }

    /// The lifecycle event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Sets up the whole reachable graph.
    ///
    /// Expands the transitive dependencies of every registered root, then runs
    /// all scheduled setup operations concurrently and waits for every one of
    /// them to settle. Each component's startup hook runs only after all of
    /// its dependencies are active.
    ///
    /// Fails with [`OrchestrationError::CircularDependency`] — before any
    /// hook runs — if the reachable graph contains a cycle; otherwise returns
    /// the first failed operation's error (in scheduling order), if any.
    /// Idempotent on an already-active graph.
    pub async fn setup(&self) -> Result<(), OrchestrationError> {
        log::info!(target: LOG_TARGET, "setting up components");

        let plan = match walker::plan(&self.registry) {
            Ok(plan) => plan,
            Err(err) => {
                log::warn!(target: LOG_TARGET, "setup aborted: {err}");
                return Err(err);
            }
        };

        // Clear stale faults synchronously before anything launches, so a
        // retried pass can never observe a fault from a previous one.
        for scheduled in &plan {
            scheduled.cell.clear_fault();
        }

        let results = join_all(plan.into_iter().map(|scheduled| {
            let walker::ScheduledSetup { cell, resolved } = scheduled;
            async move { cell.setup(resolved).await }
        }))
        .await;

        for result in results {
            if let Err(err) = result {
                log::warn!(target: LOG_TARGET, "setup pass failed: {err}");
                return Err(err);
            }
        }

        self.bus.publish(Event::new(EventKind::AllActive));
        log::info!(target: LOG_TARGET, "all components are active");
        Ok(())
    }

    /// Shuts down every registered component.
    ///
    /// All shutdown operations run concurrently with no pre-ordering;
    /// each cell's released latch guarantees its shutdown hook only runs once
    /// every dependent has detached. Waits for every operation to settle.
    /// Idempotent on an already-dormant graph.
    pub async fn shutdown(&self) -> Result<(), OrchestrationError> {
        log::info!(target: LOG_TARGET, "shutting down components");

        let cells = self.registry.snapshot();
        let results = join_all(cells.iter().map(|cell| cell.shutdown())).await;

        for result in results {
            if let Err(err) = result {
                log::warn!(target: LOG_TARGET, "shutdown pass failed: {err}");
                return Err(err);
            }
        }

        self.bus.publish(Event::new(EventKind::AllInactive));
        log::info!(target: LOG_TARGET, "all components are inactive");
        Ok(())
    }

    /// Runs `future` inside an active graph.
    ///
    /// Performs a full `setup()` before polling the future and a full
    /// `shutdown()` after it completes, successfully or not. A setup failure
    /// returns immediately without polling the future.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, OrchestrationError>
    where
        F: Future,
    {
        self.setup().await?;
        let output = future.await;
        self.shutdown().await?;
        Ok(output)
    }

    /// Serves until the process receives a termination signal.
    ///
    /// Equivalent to [`Conductor::serve_until`] with a token nobody cancels.
    pub async fn serve(&self) -> Result<(), OrchestrationError> {
        self.serve_until(CancellationToken::new()).await
    }

    /// Serves until the process receives a termination signal or `token` is
    /// cancelled.
    ///
    /// Performs a full `setup()`, waits, then performs a full `shutdown()` —
    /// on every exit path, including setup failure (mirroring scoped
    /// acquisition of the active graph). The setup error, if any, takes
    /// precedence over a shutdown error.
    pub async fn serve_until(&self, token: CancellationToken) -> Result<(), OrchestrationError> {
        let served = match self.setup().await {
            Ok(()) => {
                log::info!(target: LOG_TARGET, "serving");
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = signal::wait_for_shutdown_signal() => {}
                }
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                Ok(())
            }
            Err(err) => Err(err),
        };

        let stopped = self.shutdown().await;
        served.and(stopped)
    }

    /// Subscribes to the bus, updates the tracker, and fans events out to the
    /// subscriber set. Spawned once at build time.
    pub(crate) fn spawn_listener(&self) {
        let mut rx = self.bus.subscribe();
        let subs = Arc::clone(&self.subs);
        let tracker = Arc::clone(&self.tracker);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        tracker.update(&ev).await;
                        subs.emit(&ev);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::warn!(
                            target: LOG_TARGET,
                            "event listener lagged, skipped {skipped} events"
                        );
                    }
                }
            }
        });
    }
}
