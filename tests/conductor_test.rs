//! Whole-graph integration tests: dependency-ordered startup/shutdown,
//! patching, cycle detection, failure propagation, and the process entry
//! points.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use conductor::{
    Component, ComponentType, Conductor, Config, Dependencies, DependencySpec, Event, EventKind,
    HookError, OrchestrationError, SectionConfig, Subscribe,
};

const A: ComponentType = ComponentType::new("a");
const B: ComponentType = ComponentType::new("b");
const C: ComponentType = ComponentType::new("c");
const D: ComponentType = ComponentType::new("d");
const E: ComponentType = ComponentType::new("e");

type HookLog = Arc<Mutex<Vec<&'static str>>>;

/// Test component recording its hook invocations.
struct Probe {
    name: &'static str,
    deps: DependencySpec,
    setup_log: HookLog,
    shutdown_log: HookLog,
}

#[async_trait]
impl Component for Probe {
    fn depends_on(&self) -> DependencySpec {
        self.deps.clone()
    }

    async fn on_setup(&self, _deps: &Dependencies) -> Result<(), HookError> {
        self.setup_log.lock().unwrap().push(self.name);
        Ok(())
    }

    async fn on_shutdown(&self) -> Result<(), HookError> {
        self.shutdown_log.lock().unwrap().push(self.name);
        Ok(())
    }
}

struct ProbeSet {
    setup_log: HookLog,
    shutdown_log: HookLog,
}

impl ProbeSet {
    fn new() -> Self {
        Self {
            setup_log: Arc::new(Mutex::new(Vec::new())),
            shutdown_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn probe(&self, name: &'static str, deps: DependencySpec) -> impl Fn(conductor::Context) -> Probe {
        let setup_log = Arc::clone(&self.setup_log);
        let shutdown_log = Arc::clone(&self.shutdown_log);
        move |_ctx| Probe {
            name,
            deps: deps.clone(),
            setup_log: Arc::clone(&setup_log),
            shutdown_log: Arc::clone(&shutdown_log),
        }
    }

    fn setup_order(&self) -> Vec<&'static str> {
        self.setup_log.lock().unwrap().clone()
    }

    fn shutdown_order(&self) -> Vec<&'static str> {
        self.shutdown_log.lock().unwrap().clone()
    }
}

fn position(order: &[&str], name: &str) -> usize {
    order
        .iter()
        .position(|n| *n == name)
        .unwrap_or_else(|| panic!("{name} not found in {order:?}"))
}

/// Diamond graph used by most tests: A; B{a}; C{a}; D{b, c}.
fn register_diamond(conductor: &Conductor, probes: &ProbeSet) {
    conductor.register(A, probes.probe("a", DependencySpec::new()));
    conductor.register(B, probes.probe("b", DependencySpec::new().require("a", A)));
    conductor.register(C, probes.probe("c", DependencySpec::new().require("a", A)));
    conductor.register(
        D,
        probes.probe("d", DependencySpec::new().require("b", B).require("c", C)),
    );
}

#[tokio::test]
async fn test_setup_and_shutdown_order() {
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    register_diamond(&conductor, &probes);

    // Registering the root is enough; B, C, A resolve lazily.
    let d = conductor.add(D).unwrap();
    assert!(!d.is_active());
    assert!(d.is_released());

    conductor.setup().await.unwrap();

    let order = probes.setup_order();
    assert_eq!(order.len(), 4);
    assert!(position(&order, "a") < position(&order, "b"));
    assert!(position(&order, "a") < position(&order, "c"));
    assert!(position(&order, "b") < position(&order, "d"));
    assert!(position(&order, "c") < position(&order, "d"));

    conductor.shutdown().await.unwrap();

    let order = probes.shutdown_order();
    assert_eq!(order.len(), 4);
    assert!(position(&order, "d") < position(&order, "b"));
    assert!(position(&order, "d") < position(&order, "c"));
    assert!(position(&order, "b") < position(&order, "a"));
    assert!(position(&order, "c") < position(&order, "a"));
}

#[tokio::test]
async fn test_edges_and_latches_across_the_lifecycle() {
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    register_diamond(&conductor, &probes);
    conductor.add(D).unwrap();

    conductor.setup().await.unwrap();

    let a = conductor.cell(A).unwrap();
    let b = conductor.cell(B).unwrap();
    let c = conductor.cell(C).unwrap();
    let d = conductor.cell(D).unwrap();

    assert!(a.is_active());
    assert!(!a.is_released());
    assert_eq!(a.depends_on(), vec![]);
    assert_eq!(a.required_by(), vec![B, C]);

    assert!(b.is_active());
    assert!(!b.is_released());
    assert_eq!(b.depends_on(), vec![A]);
    assert_eq!(b.required_by(), vec![D]);

    assert!(d.is_active());
    assert!(d.is_released());
    assert_eq!(d.depends_on(), vec![B, C]);
    assert_eq!(d.required_by(), vec![]);

    // The bound field resolves to the dependency's singleton.
    let a_component = conductor.component(A).unwrap();
    let b_view_of_a = b.dependency("a").unwrap();
    assert!(Arc::ptr_eq(&a_component, &b_view_of_a));
    let c_view_of_a = c.dependency("a").unwrap();
    assert!(Arc::ptr_eq(&a_component, &c_view_of_a));

    conductor.shutdown().await.unwrap();

    for cell in [&a, &b, &c, &d] {
        assert!(!cell.is_active());
        assert!(cell.is_released());
        assert_eq!(cell.depends_on(), vec![]);
        assert_eq!(cell.required_by(), vec![]);
    }
}

#[tokio::test]
async fn test_second_setup_triggers_no_duplicate_hooks() {
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    register_diamond(&conductor, &probes);
    conductor.add(D).unwrap();

    conductor.setup().await.unwrap();
    conductor.setup().await.unwrap();

    assert_eq!(probes.setup_order().len(), 4);
}

struct PatchedA;

#[async_trait]
impl Component for PatchedA {}

#[tokio::test]
async fn test_patch_substitutes_the_constructed_type() {
    const A_PATCHED: ComponentType = ComponentType::new("a_patched");

    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    conductor.register(A, probes.probe("a", DependencySpec::new()));
    conductor.register(A_PATCHED, |_ctx| PatchedA);
    conductor.register(B, probes.probe("b", DependencySpec::new().require("a", A)));

    conductor.patch(A, A_PATCHED).unwrap();
    conductor.add(B).unwrap();
    conductor.setup().await.unwrap();

    // The instance is a PatchedA, registered under the original key.
    let a = conductor.component_as::<PatchedA>(A).unwrap();
    assert!(conductor.component_as::<Probe>(A).is_none());
    assert!(conductor.cell(A_PATCHED).is_none());

    // The dependent observes the same singleton.
    let b = conductor.cell(B).unwrap();
    let bound = b.dependency("a").unwrap();
    assert_eq!(Arc::as_ptr(&a) as *const (), Arc::as_ptr(&bound) as *const ());

    // Only "b" ran a recorded hook; PatchedA's hooks are the defaults.
    assert_eq!(probes.setup_order(), vec!["b"]);
}

#[tokio::test]
async fn test_patch_induced_cycle_is_detected() {
    // patch A -> D where D{c: C}, C{b: B}, B{a: A}, E{c: C}; root E.
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    conductor.register(A, probes.probe("a", DependencySpec::new()));
    conductor.register(B, probes.probe("b", DependencySpec::new().require("a", A)));
    conductor.register(C, probes.probe("c", DependencySpec::new().require("b", B)));
    conductor.register(D, probes.probe("d", DependencySpec::new().require("c", C)));
    conductor.register(E, probes.probe("e", DependencySpec::new().require("c", C)));

    conductor.patch(A, D).unwrap();
    conductor.add(E).unwrap();

    let err = conductor.setup().await.unwrap_err();
    match err {
        OrchestrationError::CircularDependency { path } => {
            // D-as-A is identified by its registry key.
            assert_eq!(path, vec![E, C, B, A, C]);
        }
        other => panic!("unexpected error: {other}"),
    }

    // No hook inside the cycle executed.
    assert!(probes.setup_order().is_empty());
}

/// Fails its startup hook until `healed` is flipped.
struct Flaky {
    deps: DependencySpec,
    healed: Arc<AtomicBool>,
    setups: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Component for Flaky {
    fn depends_on(&self) -> DependencySpec {
        self.deps.clone()
    }

    async fn on_setup(&self, _deps: &Dependencies) -> Result<(), HookError> {
        if self.healed.load(Ordering::SeqCst) {
            self.setups.lock().unwrap().push("b");
            Ok(())
        } else {
            Err(HookError::failed("not ready"))
        }
    }
}

#[tokio::test]
async fn test_setup_failure_propagates_and_rolls_back_edges() {
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    let healed = Arc::new(AtomicBool::new(false));

    conductor.register(A, probes.probe("a", DependencySpec::new()));
    {
        let healed = Arc::clone(&healed);
        let setups = Arc::clone(&probes.setup_log);
        conductor.register(B, move |_ctx| Flaky {
            deps: DependencySpec::new().require("a", A),
            healed: Arc::clone(&healed),
            setups: Arc::clone(&setups),
        });
    }
    conductor.register(C, probes.probe("c", DependencySpec::new().require("b", B)));
    conductor.add(C).unwrap();

    let err = conductor.setup().await.unwrap_err();
    match &err {
        OrchestrationError::SetupFailed { component, source } => {
            assert_eq!(*component, B);
            assert_eq!(*source, HookError::failed("not ready"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let a = conductor.cell(A).unwrap();
    let b = conductor.cell(B).unwrap();
    let c = conductor.cell(C).unwrap();

    // The sibling branch that succeeded stays active; nothing rolls it back.
    assert!(a.is_active());
    // B's half-registered edge on A was rolled back.
    assert_eq!(a.required_by(), vec![]);
    assert!(a.is_released());

    assert!(!b.is_active());
    assert_eq!(b.depends_on(), vec![]);
    // C never ran its hook; it failed waiting on B.
    assert!(!c.is_active());
    assert_eq!(b.required_by(), vec![]);
    assert_eq!(probes.setup_order(), vec!["a"]);

    // A later pass retries the failed branch and completes the graph.
    healed.store(true, Ordering::SeqCst);
    conductor.setup().await.unwrap();

    assert!(b.is_active());
    assert!(c.is_active());
    // "a" was not set up twice.
    assert_eq!(probes.setup_order(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_dependency_failure_reaches_transitive_dependents() {
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();

    {
        let setups = Arc::clone(&probes.setup_log);
        conductor.register(A, move |_ctx| Flaky {
            deps: DependencySpec::new(),
            healed: Arc::new(AtomicBool::new(false)),
            setups: Arc::clone(&setups),
        });
    }
    conductor.register(B, probes.probe("b", DependencySpec::new().require("a", A)));
    conductor.register(C, probes.probe("c", DependencySpec::new().require("b", B)));
    conductor.add(C).unwrap();

    let err = conductor.setup().await.unwrap_err();
    assert_eq!(err.as_label(), "setup_failed");

    // Neither dependent ran its hook, and the graph holds no half-edges.
    assert!(probes.setup_order().is_empty());
    for ty in [A, B, C] {
        let cell = conductor.cell(ty).unwrap();
        assert!(!cell.is_active());
        assert!(cell.is_released());
        assert_eq!(cell.depends_on(), vec![]);
        assert_eq!(cell.required_by(), vec![]);
    }
}

/// Fails its shutdown hook, always.
struct StuckValve {
    deps: DependencySpec,
}

#[async_trait]
impl Component for StuckValve {
    fn depends_on(&self) -> DependencySpec {
        self.deps.clone()
    }

    async fn on_shutdown(&self) -> Result<(), HookError> {
        Err(HookError::failed("valve stuck"))
    }
}

#[tokio::test]
async fn test_shutdown_failure_still_releases_dependencies() {
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    conductor.register(A, probes.probe("a", DependencySpec::new()));
    conductor.register(B, |_ctx| StuckValve {
        deps: DependencySpec::new().require("a", A),
    });
    conductor.add(B).unwrap();
    conductor.setup().await.unwrap();

    let err = conductor.shutdown().await.unwrap_err();
    match err {
        OrchestrationError::ShutdownFailed { component, .. } => assert_eq!(component, B),
        other => panic!("unexpected error: {other}"),
    }

    // B detached despite the failure, so A's shutdown completed.
    let a = conductor.cell(A).unwrap();
    let b = conductor.cell(B).unwrap();
    assert!(!a.is_active());
    assert!(a.is_released());
    assert!(!b.is_active());
    assert_eq!(a.required_by(), vec![]);
    assert_eq!(probes.shutdown_order(), vec!["a"]);
}

#[tokio::test]
async fn test_run_scopes_the_active_graph() {
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    register_diamond(&conductor, &probes);
    conductor.add(D).unwrap();

    let d = conductor.cell(D).unwrap();
    let output = conductor
        .run({
            let d = Arc::clone(&d);
            async move {
                assert!(d.is_active());
                42
            }
        })
        .await
        .unwrap();

    assert_eq!(output, 42);
    assert!(!d.is_active());
    assert_eq!(probes.setup_order().len(), 4);
    assert_eq!(probes.shutdown_order().len(), 4);
}

#[tokio::test]
async fn test_serve_until_token_cancellation() {
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    register_diamond(&conductor, &probes);
    conductor.add(D).unwrap();

    let token = CancellationToken::new();
    let serving = {
        let conductor = Arc::clone(&conductor);
        let token = token.clone();
        tokio::spawn(async move { conductor.serve_until(token).await })
    };

    let d = conductor.cell(D).unwrap();
    wait_until(|| d.is_active()).await;

    token.cancel();
    serving.await.unwrap().unwrap();

    assert!(!d.is_active());
    assert_eq!(probes.shutdown_order().len(), 4);
}

#[tokio::test]
async fn test_active_tracker_follows_the_event_stream() {
    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    register_diamond(&conductor, &probes);
    conductor.add(D).unwrap();

    conductor.setup().await.unwrap();
    wait_until_async(|| async {
        conductor.active().await == vec!["a", "b", "c", "d"]
    })
    .await;

    conductor.shutdown().await.unwrap();
    wait_until_async(|| async { conductor.active().await.is_empty() }).await;
}

/// Collects event kinds seen on the bus.
struct Collector {
    seen: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Collector {
    async fn on_event(&self, event: &Event) {
        self.seen.lock().unwrap().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

#[tokio::test]
async fn test_subscribers_observe_the_lifecycle() {
    let collector = Arc::new(Collector {
        seen: Mutex::new(Vec::new()),
    });
    let conductor = Conductor::builder(Config::default())
        .with_subscribers(vec![Arc::clone(&collector) as Arc<dyn Subscribe>])
        .build();

    let probes = ProbeSet::new();
    conductor.register(A, probes.probe("a", DependencySpec::new()));
    conductor.add(A).unwrap();

    conductor.setup().await.unwrap();
    conductor.shutdown().await.unwrap();

    wait_until(|| {
        let seen = collector.seen.lock().unwrap();
        [
            EventKind::ComponentRegistered,
            EventKind::SetupStarting,
            EventKind::ComponentActive,
            EventKind::AllActive,
            EventKind::ShutdownStarting,
            EventKind::ComponentInactive,
            EventKind::AllInactive,
        ]
        .iter()
        .all(|kind| seen.contains(kind))
    })
    .await;
}

/// Stashes the configuration value it was constructed with.
struct Configured {
    url: Option<String>,
    log_target: String,
}

#[async_trait]
impl Component for Configured {}

#[tokio::test]
async fn test_config_policy_resolves_per_component() {
    let conductor = Conductor::builder(Config::default())
        .with_config(SectionConfig::new(json!({
            "a": {"url": "postgres://localhost"},
        })))
        .build();

    conductor.register(A, |ctx: conductor::Context| Configured {
        url: ctx.config()["url"].as_str().map(String::from),
        log_target: ctx.log_target().to_string(),
    });
    conductor.register(B, |ctx: conductor::Context| Configured {
        url: ctx.config()["url"].as_str().map(String::from),
        log_target: ctx.log_target().to_string(),
    });

    conductor.add(A).unwrap();
    conductor.add(B).unwrap();

    let a = conductor.component_as::<Configured>(A).unwrap();
    let b = conductor.component_as::<Configured>(B).unwrap();
    assert_eq!(a.url.as_deref(), Some("postgres://localhost"));
    assert_eq!(b.url, None);
    assert_eq!(a.log_target, "conductor::a");
}

#[tokio::test]
async fn test_unknown_dependency_fails_the_walk() {
    const GHOST: ComponentType = ComponentType::new("ghost");

    let conductor = Conductor::builder(Config::default()).build();
    let probes = ProbeSet::new();
    conductor.register(A, probes.probe("a", DependencySpec::new().require("ghost", GHOST)));
    conductor.add(A).unwrap();

    let err = conductor.setup().await.unwrap_err();
    match err {
        OrchestrationError::UnknownComponent { ty } => assert_eq!(ty, GHOST),
        other => panic!("unexpected error: {other}"),
    }
    assert!(probes.setup_order().is_empty());
}

async fn wait_until(mut predicate: impl FnMut() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}

async fn wait_until_async<F, Fut>(mut predicate: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if predicate().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
