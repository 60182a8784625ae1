//! # Component registry: recipes, patches, and singleton cells.
//!
//! The registry owns three maps keyed by [`ComponentType`]:
//! - **recipes** — how to construct a component of a type;
//! - **patches** — one-level type substitutions applied at construction;
//! - **cells** — the constructed singletons, in registration order.
//!
//! ## Rules
//! - Cells are **monotonic**: created at most once per type, never replaced,
//!   never removed while the conductor exists.
//! - A patched type is constructed from the *replacement's* recipe but stored
//!   under the **original** key, so every dependent — patched or not —
//!   observes the same singleton.
//! - Patches are write-once-before-use: recording one after the type was
//!   constructed is an error (it could never be observed).
//! - Factories run **outside** the registry lock; they may be arbitrarily
//!   heavy and must not be able to deadlock the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::components::{Component, ComponentCell, ComponentType, Context, Instance};
use crate::core::config::ResolveConfig;
use crate::error::OrchestrationError;
use crate::events::{Bus, Event, EventKind};

/// Construction recipe of one component type.
type Recipe = Arc<dyn Fn(Context) -> Instance + Send + Sync>;

#[derive(Default)]
struct Inner {
    recipes: HashMap<ComponentType, Recipe>,
    patches: HashMap<ComponentType, ComponentType>,
    cells: HashMap<ComponentType, Arc<ComponentCell>>,
    /// Registration order of `cells`, for deterministic snapshots.
    order: Vec<ComponentType>,
}

/// Maps component types to their singleton cells, applying the patch table
/// for types that have been overridden.
pub(crate) struct Registry {
    bus: Bus,
    config: Arc<dyn ResolveConfig>,
    inner: Mutex<Inner>,
}

impl Registry {
    pub(crate) fn new(bus: Bus, config: Arc<dyn ResolveConfig>) -> Self {
        Self {
            bus,
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Records the construction recipe for `ty`. A later call replaces the
    /// recipe (only observable before the type's first lookup).
    pub(crate) fn register<T, F>(&self, ty: ComponentType, factory: F)
    where
        T: Component,
        F: Fn(Context) -> T + Send + Sync + 'static,
    {
        let recipe: Recipe = Arc::new(move |ctx| Instance::new(factory(ctx)));
        self.inner().recipes.insert(ty, recipe);
    }

    /// Records a one-level substitution: constructing `ty` will run the
    /// recipe of `replacement` instead. Last call for a given `ty` wins.
    ///
    /// Not validated for cycles here; the graph walk validates implicitly.
    pub(crate) fn patch(
        &self,
        ty: ComponentType,
        replacement: ComponentType,
    ) -> Result<(), OrchestrationError> {
        let mut inner = self.inner();
        if inner.cells.contains_key(&ty) {
            return Err(OrchestrationError::PatchAfterConstruction { ty });
        }
        inner.patches.insert(ty, replacement);
        Ok(())
    }

    /// Returns the singleton cell for `ty`, constructing it on first lookup.
    pub(crate) fn add(&self, ty: ComponentType) -> Result<Arc<ComponentCell>, OrchestrationError> {
        let (recipe, actual) = {
            let inner = self.inner();
            if let Some(cell) = inner.cells.get(&ty) {
                return Ok(Arc::clone(cell));
            }
            let actual = inner.patches.get(&ty).copied().unwrap_or(ty);
            let recipe = inner
                .recipes
                .get(&actual)
                .cloned()
                .ok_or(OrchestrationError::UnknownComponent { ty: actual })?;
            (recipe, actual)
        };

        let context = Context::new(ty, self.config.resolve(ty), self.bus.clone());
        let instance = recipe(context);
        let cell = Arc::new(ComponentCell::new(ty, instance, self.bus.clone()));

        let mut inner = self.inner();
        if let Some(existing) = inner.cells.get(&ty) {
            // Lost a construction race: the singleton map is monotonic, keep
            // the first entry and drop ours.
            return Ok(Arc::clone(existing));
        }
        inner.cells.insert(ty, Arc::clone(&cell));
        inner.order.push(ty);
        drop(inner);

        let mut ev = Event::new(EventKind::ComponentRegistered).with_component(ty.name());
        if actual != ty {
            ev = ev.with_reason(format!("constructed as {actual}"));
        }
        self.bus.publish(ev);

        Ok(cell)
    }

    /// Returns the cell for `ty` if it has been constructed.
    pub(crate) fn get(&self, ty: ComponentType) -> Option<Arc<ComponentCell>> {
        self.inner().cells.get(&ty).map(Arc::clone)
    }

    /// Returns the constructed cells in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<ComponentCell>> {
        let inner = self.inner();
        inner
            .order
            .iter()
            .filter_map(|ty| inner.cells.get(ty).map(Arc::clone))
            .collect()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SharedConfig;
    use serde_json::Value;

    const A: ComponentType = ComponentType::new("a");
    const A_STUB: ComponentType = ComponentType::new("a_stub");

    struct Plain;
    impl Component for Plain {}

    struct Stub;
    impl Component for Stub {}

    fn registry() -> Registry {
        Registry::new(Bus::new(8), SharedConfig::new(Value::Null))
    }

    #[test]
    fn test_add_is_a_singleton() {
        let registry = registry();
        registry.register(A, |_| Plain);

        let first = registry.add(A).unwrap();
        let second = registry.add(A).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn test_patch_constructs_replacement_under_original_key() {
        let registry = registry();
        registry.register(A, |_| Plain);
        registry.register(A_STUB, |_| Stub);
        registry.patch(A, A_STUB).unwrap();

        let cell = registry.add(A).unwrap();
        assert_eq!(cell.ty(), A);
        assert!(cell.instance().downcast::<Stub>().is_some());
        assert!(cell.instance().downcast::<Plain>().is_none());
        // The registry key is the original type.
        assert!(registry.get(A).is_some());
        assert!(registry.get(A_STUB).is_none());
    }

    #[test]
    fn test_last_patch_wins() {
        let registry = registry();
        registry.register(A, |_| Plain);
        registry.register(A_STUB, |_| Stub);
        registry.patch(A, A).unwrap();
        registry.patch(A, A_STUB).unwrap();

        let cell = registry.add(A).unwrap();
        assert!(cell.instance().downcast::<Stub>().is_some());
    }

    #[test]
    fn test_patch_after_construction_is_refused() {
        let registry = registry();
        registry.register(A, |_| Plain);
        registry.add(A).unwrap();

        let err = registry.patch(A, A_STUB).unwrap_err();
        assert_eq!(err.as_label(), "patch_after_construction");
    }

    #[test]
    fn test_unknown_component() {
        let registry = registry();
        let err = registry.add(A).unwrap_err();
        assert_eq!(err.as_label(), "unknown_component");
    }
}
