//! # Graph walker: transitive expansion and cycle detection.
//!
//! Produces the set of setup operations for one pass. For each root (every
//! cell registered at the time the pass starts), the walker expands the
//! transitive dependency set depth-first:
//!
//! - the **path** holds the cells on the *current recursion branch only*, so
//!   legitimate diamonds reached via independent branches are not flagged;
//!   a dependency already on the path is a cycle and aborts the pass;
//! - the **visited** set (global across the pass) guarantees each cell is
//!   scheduled at most once even when reached via multiple branches;
//! - unregistered dependencies are constructed lazily through
//!   [`Registry::add`], which applies the patch table — which is also where
//!   a patched cycle surfaces.
//!
//! Scheduling order is dependencies-first, but correctness does not rely on
//! it: the scheduled operations run concurrently and synchronize through the
//! cells' latches.

use std::collections::HashSet;
use std::sync::Arc;

use crate::components::{ComponentCell, ComponentType};
use crate::core::registry::Registry;
use crate::error::OrchestrationError;

/// One planned setup operation: a cell plus its resolved dependencies,
/// keyed by field name from the cell's dependency spec.
#[derive(Debug)]
pub(crate) struct ScheduledSetup {
    pub(crate) cell: Arc<ComponentCell>,
    pub(crate) resolved: Vec<(&'static str, Arc<ComponentCell>)>,
}

/// Expands every registered root and returns the pass's setup operations,
/// dependencies first. Fails without scheduling anything if the reachable
/// graph contains a cycle.
pub(crate) fn plan(registry: &Registry) -> Result<Vec<ScheduledSetup>, OrchestrationError> {
    let roots = registry.snapshot();
    let mut visited: HashSet<ComponentType> = HashSet::new();
    let mut scheduled: Vec<ScheduledSetup> = Vec::new();

    for root in roots {
        expand(registry, root, &mut Vec::new(), &mut visited, &mut scheduled)?;
    }
    Ok(scheduled)
}

fn expand(
    registry: &Registry,
    cell: Arc<ComponentCell>,
    path: &mut Vec<ComponentType>,
    visited: &mut HashSet<ComponentType>,
    scheduled: &mut Vec<ScheduledSetup>,
) -> Result<(), OrchestrationError> {
    if visited.contains(&cell.ty()) {
        return Ok(());
    }
    path.push(cell.ty());

    let mut resolved = Vec::with_capacity(cell.spec().len());
    for (field, dep_ty) in cell.spec().entries() {
        let dep = registry.add(dep_ty)?;
        if path.contains(&dep.ty()) {
            let mut cycle = path.clone();
            cycle.push(dep.ty());
            return Err(OrchestrationError::CircularDependency { path: cycle });
        }
        expand(registry, Arc::clone(&dep), path, visited, scheduled)?;
        resolved.push((field, dep));
    }

    visited.insert(cell.ty());
    scheduled.push(ScheduledSetup { cell, resolved });
    path.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Component, DependencySpec};
    use crate::core::config::SharedConfig;
    use crate::events::Bus;
    use serde_json::Value;

    const A: ComponentType = ComponentType::new("a");
    const B: ComponentType = ComponentType::new("b");
    const C: ComponentType = ComponentType::new("c");
    const D: ComponentType = ComponentType::new("d");

    struct Node {
        deps: DependencySpec,
    }

    impl Component for Node {
        fn depends_on(&self) -> DependencySpec {
            self.deps.clone()
        }
    }

    fn registry() -> Registry {
        Registry::new(Bus::new(8), SharedConfig::new(Value::Null))
    }

    fn node(deps: DependencySpec) -> impl Fn(crate::components::Context) -> Node {
        move |_| Node { deps: deps.clone() }
    }

    #[test]
    fn test_diamond_schedules_each_node_once() {
        let registry = registry();
        registry.register(A, node(DependencySpec::new()));
        registry.register(B, node(DependencySpec::new().require("a", A)));
        registry.register(C, node(DependencySpec::new().require("a", A)));
        registry.register(
            D,
            node(DependencySpec::new().require("b", B).require("c", C)),
        );
        registry.add(D).unwrap();

        let scheduled = plan(&registry).unwrap();
        let order: Vec<&str> = scheduled.iter().map(|s| s.cell.ty().name()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let registry = registry();
        registry.register(A, node(DependencySpec::new().require("me", A)));
        registry.add(A).unwrap();

        let err = plan(&registry).unwrap_err();
        match err {
            OrchestrationError::CircularDependency { path } => {
                assert_eq!(path, vec![A, A]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_path_is_root_to_repeat() {
        let registry = registry();
        registry.register(A, node(DependencySpec::new().require("c", C)));
        registry.register(B, node(DependencySpec::new().require("a", A)));
        registry.register(C, node(DependencySpec::new().require("b", B)));
        registry.add(A).unwrap();

        let err = plan(&registry).unwrap_err();
        match err {
            OrchestrationError::CircularDependency { path } => {
                assert_eq!(path, vec![A, C, B, A]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
