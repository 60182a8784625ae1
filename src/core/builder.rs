use std::sync::Arc;

use serde_json::Value;

use crate::core::config::{Config, ResolveConfig, SharedConfig};
use crate::core::conductor::Conductor;
use crate::events::Bus;
use crate::subscribers::{ActiveTracker, Subscribe, SubscriberSet};

/// Builder for constructing a [`Conductor`] with optional collaborators.
pub struct ConductorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    config_policy: Arc<dyn ResolveConfig>,
}

impl ConductorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            config_policy: SharedConfig::new(Value::Null),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events (setup/shutdown flow, failures)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Sets the policy resolving each component's configuration value.
    ///
    /// Defaults to [`SharedConfig`] over `Value::Null`.
    pub fn with_config(mut self, policy: Arc<dyn ResolveConfig>) -> Self {
        self.config_policy = policy;
        self
    }

    /// Builds and returns the conductor.
    ///
    /// This consumes the builder and initializes all runtime collaborators:
    /// - event bus for broadcasting
    /// - subscriber workers
    /// - active-component tracker and the bus listener feeding it
    ///
    /// Must be called within a Tokio runtime.
    pub fn build(self) -> Arc<Conductor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers));
        let tracker = Arc::new(ActiveTracker::new());

        let conductor = Arc::new(Conductor::new_internal(
            self.cfg,
            bus,
            subs,
            tracker,
            self.config_policy,
        ));
        conductor.spawn_listener();
        conductor
    }
}
