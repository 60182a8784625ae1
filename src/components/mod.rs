//! Components: user abstraction, lifecycle cells, and declarations.
//!
//! This module groups everything that describes *one* component:
//! - [`Component`] the user trait (dependency declarations + lifecycle hooks)
//! - [`ComponentCell`] the per-instance state machine and edge protocol
//! - [`ComponentType`], [`DependencySpec`] identity tokens and declaration tables
//! - [`Context`] construction inputs injected by the conductor
//! - [`Dependencies`] the resolved-instance view handed to startup hooks

mod cell;
mod component;
mod context;
mod latch;
mod naming;
mod spec;

pub use cell::ComponentCell;
pub use component::{Component, ComponentRef, Dependencies};
pub use context::Context;
pub use spec::{ComponentType, DependencySpec};

pub(crate) use component::Instance;
