//! # Runtime configuration and per-component config resolution.
//!
//! Two concerns live here:
//!
//! 1. [`Config`] — settings of the conductor runtime itself.
//! 2. [`ResolveConfig`] — the pluggable policy that maps a component type to
//!    the opaque configuration value injected into its factory, with two
//!    built-in policies: [`SharedConfig`] (every component sees the same
//!    value) and [`SectionConfig`] (every component sees its own section of a
//!    root object).
//!
//! ## Sentinel values
//! - `bus_capacity` is clamped to a minimum of 1 by the bus.

use std::sync::Arc;

use serde_json::Value;

use crate::components::ComponentType;

/// Global configuration for the conductor runtime.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024` (good baseline)
    fn default() -> Self {
        Self { bus_capacity: 1024 }
    }
}

/// Maps a component type to the configuration value injected at construction.
///
/// Resolution happens once per component, at first registry lookup; the
/// resolved value is read-only for the instance's lifetime.
pub trait ResolveConfig: Send + Sync + 'static {
    /// Produces the configuration value for the given component type.
    fn resolve(&self, ty: ComponentType) -> Value;
}

/// Hands the same configuration value to every component.
///
/// # Example
/// ```
/// use conductor::{ComponentType, ResolveConfig, SharedConfig};
/// use serde_json::json;
///
/// let policy = SharedConfig::new(json!({"env": "test"}));
/// let a = policy.resolve(ComponentType::new("a"));
/// let b = policy.resolve(ComponentType::new("b"));
/// assert_eq!(a, b);
/// ```
pub struct SharedConfig {
    value: Value,
}

impl SharedConfig {
    /// Creates a policy sharing `value` with every component.
    pub fn new(value: Value) -> Arc<Self> {
        Arc::new(Self { value })
    }
}

impl ResolveConfig for SharedConfig {
    fn resolve(&self, _ty: ComponentType) -> Value {
        self.value.clone()
    }
}

/// Hands each component its own section of a root object, keyed by role name.
///
/// Components without a section receive `Value::Null`.
///
/// # Example
/// ```
/// use conductor::{ComponentType, ResolveConfig, SectionConfig};
/// use serde_json::json;
///
/// let policy = SectionConfig::new(json!({
///     "db": {"url": "postgres://localhost"},
/// }));
/// assert_eq!(
///     policy.resolve(ComponentType::new("db"))["url"],
///     "postgres://localhost"
/// );
/// assert!(policy.resolve(ComponentType::new("cache")).is_null());
/// ```
pub struct SectionConfig {
    root: Value,
}

impl SectionConfig {
    /// Creates a policy slicing `root` per component role name.
    pub fn new(root: Value) -> Arc<Self> {
        Arc::new(Self { root })
    }
}

impl ResolveConfig for SectionConfig {
    fn resolve(&self, ty: ComponentType) -> Value {
        self.root.get(ty.name()).cloned().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const A: ComponentType = ComponentType::new("a");
    const B: ComponentType = ComponentType::new("b");

    #[test]
    fn test_shared_config_is_uniform() {
        let config = json!({"dsn": "sqlite::memory:"});
        let policy = SharedConfig::new(config.clone());
        assert_eq!(policy.resolve(A), config);
        assert_eq!(policy.resolve(B), config);
    }

    #[test]
    fn test_section_config_slices_by_name() {
        let policy = SectionConfig::new(json!({
            "a": {"workers": 4},
            "b": {"workers": 8},
        }));
        assert_eq!(policy.resolve(A)["workers"], 4);
        assert_eq!(policy.resolve(B)["workers"], 8);
        assert!(policy.resolve(ComponentType::new("missing")).is_null());
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = Config { bus_capacity: 0 };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(Config::default().bus_capacity, 1024);
    }
}
