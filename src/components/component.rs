//! # Component abstraction and resolved-dependency view.
//!
//! This module defines the [`Component`] trait — the sole user customization
//! point of the orchestrator — and [`Dependencies`], the typed view of the
//! resolved dependency instances handed to a startup hook.
//!
//! A component declares *what it needs* ([`Component::depends_on`]) and *what
//! to do* around activation ([`Component::on_setup`]) and release
//! ([`Component::on_shutdown`]). Everything else — construction order, edge
//! bookkeeping, suspension until dependencies are active — is driven by the
//! conductor and the per-instance cell.
//!
//! # Example
//! ```
//! use std::sync::{Arc, OnceLock};
//! use async_trait::async_trait;
//! use conductor::{Component, ComponentType, Dependencies, DependencySpec, HookError};
//!
//! const DB: ComponentType = ComponentType::new("db");
//!
//! struct Db;
//!
//! #[async_trait]
//! impl Component for Db {}
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
//!         let db = deps.require_as::<Db>("db")?;
//!         let _ = self.db.set(db);
//!         Ok(())
//!     }
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::components::spec::DependencySpec;
use crate::error::HookError;

/// Shared handle to a component instance.
pub type ComponentRef = Arc<dyn Component>;

/// # Long-lived service component with lifecycle hooks.
///
/// Implementations are held as singletons by the conductor (one instance per
/// [`ComponentType`](crate::ComponentType)) and stay alive for the
/// conductor's lifetime, cycling dormant → active → dormant across setup and
/// shutdown passes.
///
/// All methods have defaults: a dependency-free component with no custom
/// startup/shutdown logic is an empty impl.
///
/// Hooks must not touch the orchestrator's edge bookkeeping; they run inside
/// the cell's lifecycle protocol, which owns it.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Declares this component's dependencies as an ordered
    /// `field name -> component type` table.
    ///
    /// Read once at construction and cached; later changes are never observed.
    fn depends_on(&self) -> DependencySpec {
        DependencySpec::new()
    }

    /// Custom startup logic.
    ///
    /// Runs after every declared dependency is fully active; `deps` holds the
    /// resolved instances keyed by field name. An error aborts this
    /// component's activation (its edges are rolled back) and propagates out
    /// of the setup pass.
    async fn on_setup(&self, deps: &Dependencies) -> Result<(), HookError> {
        let _ = deps;
        Ok(())
    }

    /// Custom shutdown logic.
    ///
    /// Runs only once every component depending on this one has released it.
    async fn on_shutdown(&self) -> Result<(), HookError> {
        Ok(())
    }
}

/// A constructed component held under two views of the same allocation:
/// the trait object the lifecycle protocol drives, and an `Any` handle so
/// dependents can recover the concrete type.
#[derive(Clone)]
pub(crate) struct Instance {
    component: ComponentRef,
    any: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub(crate) fn new<T: Component>(component: T) -> Self {
        let component = Arc::new(component);
        let any: Arc<dyn Any + Send + Sync> = component.clone();
        Self { component, any }
    }

    pub(crate) fn component(&self) -> ComponentRef {
        Arc::clone(&self.component)
    }

    pub(crate) fn downcast<T: Component>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.any).downcast::<T>().ok()
    }
}

/// Resolved dependency instances of one component, keyed by field name.
///
/// Passed to [`Component::on_setup`]. Entries follow the declaration order of
/// the component's [`DependencySpec`].
pub struct Dependencies {
    entries: Vec<(&'static str, Instance)>,
}

impl Dependencies {
    pub(crate) fn new(entries: Vec<(&'static str, Instance)>) -> Self {
        Self { entries }
    }

    /// Returns the instance bound to `field` as a trait object.
    pub fn get(&self, field: &str) -> Option<ComponentRef> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, instance)| instance.component())
    }

    /// Returns the instance bound to `field` downcast to its concrete type.
    ///
    /// `None` if the field is absent or the instance is not a `T` (e.g. the
    /// type was patched with a replacement of a different concrete type).
    pub fn get_as<T: Component>(&self, field: &str) -> Option<Arc<T>> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, instance)| instance.downcast::<T>())
    }

    /// Like [`Dependencies::get_as`], but failure is a [`HookError`] ready to
    /// propagate out of a startup hook with `?`.
    pub fn require_as<T: Component>(&self, field: &str) -> Result<Arc<T>, HookError> {
        self.get_as::<T>(field)
            .ok_or_else(|| HookError::MissingDependency {
                field: field.to_string(),
            })
    }

    /// Iterates the bound field names in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    /// Number of resolved dependencies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if this component has no dependencies.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
