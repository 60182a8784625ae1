//! Error types used by the conductor runtime and component hooks.
//!
//! This module defines two main error enums:
//!
//! - [`OrchestrationError`] — errors raised by the orchestration passes themselves
//!   (graph defects, registry misuse, failed lifecycle operations).
//! - [`HookError`] — errors raised by user-supplied startup/shutdown hooks.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

use crate::components::ComponentType;

/// # Errors produced by the orchestration runtime.
///
/// These represent failures of a whole setup or shutdown pass: an untrusted
/// graph (cycle), a misused registry, or a component whose lifecycle operation
/// did not reach its target state.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// The graph walk revisited an instance already on the current recursion path.
    ///
    /// The path is ordered root → innermost, with the offending component
    /// appended once more at the end. Fatal to the whole setup pass: no hook
    /// runs once a cycle is found.
    #[error("circular dependency: {}", join_path(.path))]
    CircularDependency {
        /// Recursion path from the outermost root down to the repeated component.
        path: Vec<ComponentType>,
    },

    /// Construction was requested for a type with no registered recipe.
    #[error("unknown component type: {ty}")]
    UnknownComponent {
        /// The type that could not be constructed.
        ty: ComponentType,
    },

    /// A patch was recorded after the patched type had already been constructed.
    ///
    /// Patches are write-once-before-use: once the singleton exists, a
    /// substitution could never be observed and is refused instead of ignored.
    #[error("component {ty} is already constructed; patch has no effect")]
    PatchAfterConstruction {
        /// The type whose instance already exists.
        ty: ComponentType,
    },

    /// A startup hook failed; the component's edges were rolled back and it
    /// remains inactive.
    #[error("setup of component {component} failed: {source}")]
    SetupFailed {
        /// The component whose startup hook failed.
        component: ComponentType,
        /// The hook error.
        source: HookError,
    },

    /// A shutdown hook failed; the component detached from its dependencies
    /// and returned to dormant, but its own resources are in an undefined state.
    #[error("shutdown of component {component} failed: {source}")]
    ShutdownFailed {
        /// The component whose shutdown hook failed.
        component: ComponentType,
        /// The hook error.
        source: HookError,
    },

    /// A dependency's setup failed, so this component's setup could not proceed.
    ///
    /// Raised instead of suspending forever on the dependency's active latch;
    /// propagates transitively through the dependent chain.
    #[error("component {component} depends on {dependency}, which failed to start")]
    DependencyFailed {
        /// The component that was waiting.
        component: ComponentType,
        /// The dependency that failed.
        dependency: ComponentType,
    },
}

impl OrchestrationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use conductor::{ComponentType, OrchestrationError};
    ///
    /// let err = OrchestrationError::UnknownComponent { ty: ComponentType::new("db") };
    /// assert_eq!(err.as_label(), "unknown_component");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OrchestrationError::CircularDependency { .. } => "circular_dependency",
            OrchestrationError::UnknownComponent { .. } => "unknown_component",
            OrchestrationError::PatchAfterConstruction { .. } => "patch_after_construction",
            OrchestrationError::SetupFailed { .. } => "setup_failed",
            OrchestrationError::ShutdownFailed { .. } => "shutdown_failed",
            OrchestrationError::DependencyFailed { .. } => "dependency_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// # Errors produced by component hooks.
///
/// Returned by user-supplied [`on_setup`](crate::Component::on_setup) and
/// [`on_shutdown`](crate::Component::on_shutdown) implementations. The
/// orchestrator propagates them unchanged inside
/// [`OrchestrationError::SetupFailed`] / [`OrchestrationError::ShutdownFailed`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The hook's own logic failed.
    #[error("{error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// A hook asked for a dependency binding that was not resolved.
    ///
    /// Raised by [`Dependencies::require_as`](crate::Dependencies::require_as)
    /// when the field is absent or of a different concrete type.
    #[error("missing dependency binding: {field}")]
    MissingDependency {
        /// The field name that was requested.
        field: String,
    },
}

impl HookError {
    /// Wraps a failure message.
    ///
    /// # Example
    /// ```
    /// use conductor::HookError;
    ///
    /// let err = HookError::failed("connection refused");
    /// assert_eq!(err.as_label(), "hook_failed");
    /// ```
    pub fn failed(error: impl Into<String>) -> Self {
        HookError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Failed { .. } => "hook_failed",
            HookError::MissingDependency { .. } => "hook_missing_dependency",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}

/// Renders a cycle path as `root -> ... -> repeat`.
fn join_path(path: &[ComponentType]) -> String {
    path.iter()
        .map(|ty| ty.name())
        .collect::<Vec<_>>()
        .join(" -> ")
}
