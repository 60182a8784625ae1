//! # Per-component lifecycle cell: state machine and edge protocol.
//!
//! A [`ComponentCell`] wraps one component singleton with the state that
//! makes concurrent, order-independent scheduling safe:
//!
//! - the **active** latch — false until the startup hook completes, true
//!   until the shutdown hook completes;
//! - the **released** latch — true iff no other component currently depends
//!   on this one (also true in the dormant pre-setup state);
//! - the **faulted** latch — set when a setup attempt fails, so dependents
//!   suspended on `active` are woken with an error instead of suspending
//!   forever;
//! - the **edge sets** — `field -> dependency cell` bindings and the set of
//!   dependent types, kept mirror-symmetric under a per-cell mutex.
//!
//! ## Lifecycle
//! ```text
//! Dormant (active=false, released=true, no edges)
//!    │ setup(resolved):
//!    │   ├─► bind fields + register edges both ways
//!    │   ├─► suspend until every dependency is active
//!    │   │     └─ dependency faulted ─► roll back edges, fault self, error
//!    │   ├─► on_setup()
//!    │   │     └─ Err ─► roll back edges, fault self, error
//!    │   └─► active = true
//!    ▼
//! Active (released mirrors the dependent count)
//!    │ shutdown():
//!    │   ├─► suspend until released (every dependent detached)
//!    │   ├─► on_shutdown()          (an error still detaches, see below)
//!    │   └─► detach from each dependency, clear bindings, active = false
//!    ▼
//! Dormant
//! ```
//!
//! ## Rules
//! - `setup`/`shutdown` are idempotent: a call in the target state returns
//!   immediately with no side effects.
//! - A dependent's startup hook never begins before its dependency's hook has
//!   finished; a component's shutdown hook never runs while something still
//!   depends on it. Both are enforced here, not by scheduling order.
//! - Edge sets are mutated from *other* cells' setup/shutdown calls, so every
//!   mutation goes through one per-cell mutex with O(1) critical sections.
//! - A shutdown-hook failure propagates, but the cell still detaches and
//!   returns to dormant: edges must not outlive the pass or the components
//!   this one depends on could never be released.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::components::component::{Dependencies, ComponentRef, Instance};
use crate::components::latch::Latch;
use crate::components::spec::{ComponentType, DependencySpec};
use crate::error::OrchestrationError;
use crate::events::{Bus, Event, EventKind};

/// Edge bookkeeping of one cell.
#[derive(Default)]
struct Edges {
    /// Resolved dependency cells, keyed by declared field name.
    bindings: Vec<(&'static str, Arc<ComponentCell>)>,
    /// Types of the components currently depending on this one.
    required_by: HashSet<ComponentType>,
}

/// One component singleton plus its activation/release state machine.
///
/// Created by the registry on first lookup of the component's type and alive
/// for the conductor's lifetime; cycles dormant → active → dormant across
/// setup/shutdown passes.
pub struct ComponentCell {
    ty: ComponentType,
    instance: Instance,
    spec: DependencySpec,
    bus: Bus,
    active: Latch,
    released: Latch,
    faulted: Latch,
    /// Serializes setup/shutdown calls on this cell (idempotency under
    /// concurrent calls from different graph branches).
    lifecycle: tokio::sync::Mutex<()>,
    edges: Mutex<Edges>,
}

impl ComponentCell {
    pub(crate) fn new(ty: ComponentType, instance: Instance, bus: Bus) -> Self {
        let spec = instance.component().depends_on();
        Self {
            ty,
            instance,
            spec,
            bus,
            active: Latch::new(false),
            released: Latch::new(true),
            faulted: Latch::new(false),
            lifecycle: tokio::sync::Mutex::new(()),
            edges: Mutex::new(Edges::default()),
        }
    }

    /// The type token this cell is registered under (the original type, even
    /// when a patch substituted the constructed component).
    pub fn ty(&self) -> ComponentType {
        self.ty
    }

    /// The component instance as a trait object.
    pub fn component(&self) -> ComponentRef {
        self.instance.component()
    }

    /// The component's cached dependency declarations.
    pub fn spec(&self) -> &DependencySpec {
        &self.spec
    }

    /// True once the startup hook completed, until the shutdown hook completes.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// True iff no component currently depends on this one.
    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    /// The instance bound to `field` during setup, if any.
    pub fn dependency(&self, field: &str) -> Option<ComponentRef> {
        self.edges()
            .bindings
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, dep)| dep.component())
    }

    /// Sorted types of the components this cell currently holds references to.
    pub fn depends_on(&self) -> Vec<ComponentType> {
        let mut types: Vec<_> = self.edges().bindings.iter().map(|(_, dep)| dep.ty).collect();
        types.sort_unstable();
        types
    }

    /// Sorted types of the components currently depending on this cell.
    pub fn required_by(&self) -> Vec<ComponentType> {
        let mut types: Vec<_> = self.edges().required_by.iter().copied().collect();
        types.sort_unstable();
        types
    }

    pub(crate) fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Clears a fault left by a previous pass. Called synchronously for every
    /// scheduled cell before a setup pass launches, so a stale fault can never
    /// race a retry.
    pub(crate) fn clear_fault(&self) {
        self.faulted.set(false);
    }

    /// Runs the setup protocol with the given resolved dependencies.
    ///
    /// Suspends until every dependency is active; regardless of which cell's
    /// setup task the conductor happens to run first, this wait is what keeps
    /// startup hooks ordered along dependency chains.
    pub(crate) async fn setup(
        &self,
        resolved: Vec<(&'static str, Arc<ComponentCell>)>,
    ) -> Result<(), OrchestrationError> {
        let _guard = self.lifecycle.lock().await;
        if self.active.get() {
            // Reached through another graph branch in an earlier pass step.
            return Ok(());
        }

        self.bus
            .publish(Event::new(EventKind::SetupStarting).with_component(self.ty.name()));

        // Register the edge in both directions for every declared dependency,
        // even ones with trivial custom logic.
        for (field, dep) in &resolved {
            self.edges().bindings.push((*field, Arc::clone(dep)));
            dep.attach(self.ty);
        }

        // Suspend until every dependency reports active. A faulted dependency
        // wakes us with an error; this call's edges are rolled back and the
        // fault propagates to our own dependents.
        for (_, dep) in &resolved {
            if let Err(err) = dep.wait_active(self.ty).await {
                self.rollback(&resolved);
                self.fault(err.as_message());
                return Err(err);
            }
        }

        let deps = Dependencies::new(
            resolved
                .iter()
                .map(|(field, dep)| (*field, dep.instance.clone()))
                .collect(),
        );

        match self.instance.component().on_setup(&deps).await {
            Ok(()) => {
                self.active.set(true);
                self.bus
                    .publish(Event::new(EventKind::ComponentActive).with_component(self.ty.name()));
                Ok(())
            }
            Err(err) => {
                self.rollback(&resolved);
                self.fault(err.as_message());
                Err(OrchestrationError::SetupFailed {
                    component: self.ty,
                    source: err,
                })
            }
        }
    }

    /// Runs the shutdown protocol.
    ///
    /// Suspends until every current dependent has detached, so the shutdown
    /// hook never runs while something still depends on this component.
    pub(crate) async fn shutdown(&self) -> Result<(), OrchestrationError> {
        let _guard = self.lifecycle.lock().await;
        if !self.active.get() {
            return Ok(());
        }

        self.bus
            .publish(Event::new(EventKind::ShutdownStarting).with_component(self.ty.name()));

        self.released.wait().await;

        let result = self.instance.component().on_shutdown().await;

        // Detach on both outcomes: a dependency of this cell must not wait on
        // its released latch forever because our hook failed.
        let bindings = std::mem::take(&mut self.edges().bindings);
        for (_, dep) in &bindings {
            dep.detach(self.ty);
        }
        self.active.set(false);

        match result {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::ComponentInactive).with_component(self.ty.name()));
                Ok(())
            }
            Err(err) => {
                self.bus.publish(
                    Event::new(EventKind::ShutdownFailed)
                        .with_component(self.ty.name())
                        .with_reason(err.as_message()),
                );
                Err(OrchestrationError::ShutdownFailed {
                    component: self.ty,
                    source: err,
                })
            }
        }
    }

    /// Suspends until this cell is active, or fails if its setup faulted.
    async fn wait_active(&self, waiter: ComponentType) -> Result<(), OrchestrationError> {
        tokio::select! {
            _ = self.active.wait() => Ok(()),
            _ = self.faulted.wait() => Err(OrchestrationError::DependencyFailed {
                component: waiter,
                dependency: self.ty,
            }),
        }
    }

    /// Registers `dependent` as requiring this cell.
    fn attach(&self, dependent: ComponentType) {
        let mut edges = self.edges();
        edges.required_by.insert(dependent);
        self.released.set(false);
    }

    /// Removes `dependent`; releases this cell if it was the last one.
    fn detach(&self, dependent: ComponentType) {
        let mut edges = self.edges();
        edges.required_by.remove(&dependent);
        if edges.required_by.is_empty() {
            self.released.set(true);
        }
    }

    /// Rolls back the edges registered by the current setup call, leaving the
    /// cell inactive with no new edges.
    fn rollback(&self, resolved: &[(&'static str, Arc<ComponentCell>)]) {
        self.edges().bindings.clear();
        for (_, dep) in resolved {
            dep.detach(self.ty);
        }
    }

    /// Marks this setup attempt as failed and publishes the failure.
    fn fault(&self, reason: String) {
        self.faulted.set(true);
        self.bus.publish(
            Event::new(EventKind::SetupFailed)
                .with_component(self.ty.name())
                .with_reason(reason),
        );
    }

    fn edges(&self) -> MutexGuard<'_, Edges> {
        self.edges.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ComponentCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentCell")
            .field("ty", &self.ty.name())
            .field("active", &self.active.get())
            .field("released", &self.released.get())
            .finish()
    }
}
