//! # Component type tokens and dependency declarations.
//!
//! [`ComponentType`] is the identity of a role in the dependency graph: a
//! cheap `Copy` token used as the key of the instance registry, the patch
//! table, and every edge set. Two tokens are the same component type iff
//! their names are equal — the name *is* the identity, independent of any
//! Rust type identity.
//!
//! [`DependencySpec`] is the static declaration table of a component type:
//! an ordered `field name -> required component type` mapping with
//! dict-merge semantics, so a more specific component can layer its own
//! declarations over a base table and override same-named fields in place.
//!
//! # Example
//! ```
//! use conductor::{ComponentType, DependencySpec};
//!
//! const DB: ComponentType = ComponentType::new("db");
//! const CACHE: ComponentType = ComponentType::new("cache");
//!
//! let spec = DependencySpec::new()
//!     .require("db", DB)
//!     .require("cache", CACHE);
//!
//! assert_eq!(spec.get("db"), Some(DB));
//! assert_eq!(spec.len(), 2);
//! ```

use std::fmt;

/// Identity token for a role in the dependency graph.
///
/// Used as the unique key of the registry, the patch table, and the
/// per-instance edge sets. Declare tokens as constants next to the component
/// they name:
///
/// ```
/// use conductor::ComponentType;
///
/// const MESSAGE_QUEUE: ComponentType = ComponentType::new("message_queue");
/// assert_eq!(MESSAGE_QUEUE.name(), "message_queue");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentType {
    name: &'static str,
}

impl ComponentType {
    /// Creates a token for the given role name.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Returns the role name (the token's identity).
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

/// Ordered `field name -> required component type` table.
///
/// Computed once per component (the cell caches it at construction) and
/// immutable thereafter. [`DependencySpec::require`] overrides a same-named
/// entry **in place** (keeping its original position) or appends a new one,
/// which gives ancestor-table merging for free:
///
/// ```
/// use conductor::{ComponentType, DependencySpec};
///
/// const A: ComponentType = ComponentType::new("a");
/// const B: ComponentType = ComponentType::new("b");
/// const C: ComponentType = ComponentType::new("c");
///
/// let base = DependencySpec::new().require("one", A).require("two", B);
/// // A more specific component keeps "one", retargets "two" to C:
/// let child = base.extend(&DependencySpec::new().require("two", C));
///
/// assert_eq!(child.get("one"), Some(A));
/// assert_eq!(child.get("two"), Some(C));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencySpec {
    entries: Vec<(&'static str, ComponentType)>,
}

impl DependencySpec {
    /// Creates an empty declaration table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that the field `field` requires a component of type `ty`.
    ///
    /// If `field` is already declared, its target type is replaced and the
    /// entry keeps its position; otherwise the entry is appended.
    pub fn require(mut self, field: &'static str, ty: ComponentType) -> Self {
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = ty,
            None => self.entries.push((field, ty)),
        }
        self
    }

    /// Merges `overrides` over this table: same-named fields are retargeted
    /// in place, new fields are appended in `overrides` order.
    pub fn extend(mut self, overrides: &DependencySpec) -> Self {
        for (field, ty) in &overrides.entries {
            self = self.require(field, *ty);
        }
        self
    }

    /// Returns the required type for `field`, if declared.
    pub fn get(&self, field: &str) -> Option<ComponentType> {
        self.entries
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, ty)| *ty)
    }

    /// Iterates the declarations in order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, ComponentType)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of declared dependencies.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no dependencies are declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ComponentType = ComponentType::new("a");
    const B: ComponentType = ComponentType::new("b");
    const C: ComponentType = ComponentType::new("c");

    #[test]
    fn test_identity_is_the_name() {
        assert_eq!(ComponentType::new("a"), A);
        assert_ne!(A, B);
        assert_eq!(A.to_string(), "a");
    }

    #[test]
    fn test_require_appends_in_order() {
        let spec = DependencySpec::new()
            .require("component_1", A)
            .require("component_2", B);
        let entries: Vec<_> = spec.entries().collect();
        assert_eq!(entries, vec![("component_1", A), ("component_2", B)]);
    }

    #[test]
    fn test_override_keeps_position() {
        // Mirrors declaration inheritance: the more specific table retargets
        // "component_2" without disturbing the declaration order.
        let base = DependencySpec::new()
            .require("component_1", A)
            .require("component_2", B);
        let child = base.extend(&DependencySpec::new().require("component_2", C));

        let entries: Vec<_> = child.entries().collect();
        assert_eq!(entries, vec![("component_1", A), ("component_2", C)]);
    }

    #[test]
    fn test_extend_appends_new_fields() {
        let base = DependencySpec::new().require("one", A);
        let child = base.extend(&DependencySpec::new().require("two", B));
        assert_eq!(child.len(), 2);
        assert_eq!(child.get("two"), Some(B));
    }

    #[test]
    fn test_empty() {
        let spec = DependencySpec::new();
        assert!(spec.is_empty());
        assert_eq!(spec.get("anything"), None);
    }
}
