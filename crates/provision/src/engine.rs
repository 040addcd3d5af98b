//! Run-level orchestration over declared instances
//!
//! The engine walks the manifest in the order it was given - any
//! dependency ordering between instances is the front end's problem, and
//! arguments arrive fully resolved. Reconciliation is sequential and
//! synchronous end-to-end; a failed instance is reported and the run
//! moves on, leaving earlier successes committed.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::handle::{ApplyOutcome, DestroyOutcome, PluginHandle};
use crate::instance::{DeclaredInstance, InstanceKind};
use crate::reference::ResourceKind;
use crate::store::InstanceStore;
use crate::transport::{DockerRuntime, Runtime};

/// Result of reconciling one declared instance
#[derive(Debug)]
pub enum ReconcileResult {
    Created,
    Updated,
    Read,
    Skipped { reason: String },
    Failed { error: Error },
}

impl From<ApplyOutcome> for ReconcileResult {
    fn from(outcome: ApplyOutcome) -> Self {
        match outcome {
            ApplyOutcome::Created => Self::Created,
            ApplyOutcome::Updated => Self::Updated,
            ApplyOutcome::Read => Self::Read,
        }
    }
}

/// Per-instance record of a reconcile run
#[derive(Debug)]
pub struct InstanceReport {
    pub address: String,
    pub provider: String,
    pub result: ReconcileResult,
}

/// Counts over a reconcile run
#[derive(Debug, Default)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub read: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ReconcileSummary {
    pub fn of(reports: &[InstanceReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            summary.record(&report.result);
        }
        summary
    }

    pub fn record(&mut self, result: &ReconcileResult) {
        match result {
            ReconcileResult::Created => self.created += 1,
            ReconcileResult::Updated => self.updated += 1,
            ReconcileResult::Read => self.read += 1,
            ReconcileResult::Skipped { .. } => self.skipped += 1,
            ReconcileResult::Failed { .. } => self.failed += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Drives declared instances through their lifecycle against a store
pub struct Engine {
    runtime: Arc<dyn Runtime>,
}

impl Engine {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { runtime }
    }

    /// Engine over the conventional container transport.
    pub fn docker() -> Self {
        Self::new(Arc::new(DockerRuntime))
    }

    /// Reconcile declared instances in order, one at a time. A failure
    /// aborts that instance only; earlier successes stay committed.
    pub fn reconcile(
        &self,
        instances: &[DeclaredInstance],
        store: &mut InstanceStore,
    ) -> Vec<InstanceReport> {
        instances
            .iter()
            .map(|instance| InstanceReport {
                address: instance.address.clone(),
                provider: instance.provider.clone(),
                result: self.apply(instance, store),
            })
            .collect()
    }

    /// Reconcile a single declared instance.
    pub fn apply(&self, instance: &DeclaredInstance, store: &mut InstanceStore) -> ReconcileResult {
        if instance.kind == InstanceKind::Artifact {
            log::info!(
                "[{} ({})] skipped, artifact instances are published, not reconciled",
                instance.address,
                instance.provider
            );
            return ReconcileResult::Skipped {
                reason: "artifact instances are published, not reconciled".to_string(),
            };
        }

        let handle = match PluginHandle::resolve(&instance.provider, Arc::clone(&self.runtime)) {
            Ok(handle) => handle,
            Err(error) => return ReconcileResult::Failed { error },
        };

        if let Err(error) = check_kind(instance, &handle) {
            return ReconcileResult::Failed { error };
        }

        match handle.apply(&instance.address, &instance.argument, store) {
            Ok(outcome) => outcome.into(),
            Err(error) => ReconcileResult::Failed { error },
        }
    }

    /// Tear down one address, resolving the plugin from the provider
    /// reference recorded in its document. An absent address is
    /// already satisfied; a data-kind document is inert and left alone.
    pub fn destroy(&self, address: &str, store: &mut InstanceStore) -> Result<DestroyOutcome> {
        if !store.exists(address) {
            log::info!("[{address}] skipped, no instance recorded");
            return Ok(DestroyOutcome::Skipped {
                reason: "no instance recorded".to_string(),
            });
        }

        let provider = store.find(address)?.provider.clone();
        match PluginHandle::resolve(&provider, Arc::clone(&self.runtime))? {
            PluginHandle::Resource(handle) => handle.destroy(address, store),
            PluginHandle::Data(_) => {
                log::warn!("[{address} ({provider})] skipped, data instances are read-only");
                Ok(DestroyOutcome::Skipped {
                    reason: "data instances are read-only".to_string(),
                })
            }
        }
    }
}

/// The declared kind and the provider reference's kind must agree.
fn check_kind(instance: &DeclaredInstance, handle: &PluginHandle) -> Result<()> {
    let matches = match handle {
        PluginHandle::Resource(_) => instance.kind == InstanceKind::Resource,
        PluginHandle::Data(_) => instance.kind == InstanceKind::Data,
    };
    if matches {
        return Ok(());
    }
    let provider_kind = match handle {
        PluginHandle::Resource(_) => ResourceKind::Resource,
        PluginHandle::Data(_) => ResourceKind::Data,
    };
    Err(Error::InvalidReference {
        reference: instance.provider.clone(),
        reason: format!(
            "declared kind `{}` does not match provider kind `{provider_kind}`",
            instance.kind
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::ScriptedRuntime;
    use serde_json::json;

    fn engine_with(runtime: &Arc<ScriptedRuntime>) -> Engine {
        Engine::new(Arc::clone(runtime) as Arc<dyn Runtime>)
    }

    fn store() -> (tempfile::TempDir, InstanceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = InstanceStore::open(dir.path().join("state.json")).unwrap();
        (dir, store)
    }

    fn declared(address: &str, kind: InstanceKind, provider: &str, argument: serde_json::Value) -> DeclaredInstance {
        DeclaredInstance {
            address: address.to_string(),
            kind,
            provider: provider.to_string(),
            argument,
        }
    }

    #[test]
    fn reconcile_walks_the_manifest_in_order() {
        let runtime = Arc::new(ScriptedRuntime::new());
        runtime.push_output(json!({"id": "a"}));
        runtime.push_output(json!({"fact": 1}));
        let engine = engine_with(&runtime);
        let (_dir, mut store) = store();

        let instances = vec![
            declared("web", InstanceKind::Resource, "img/resource/run", json!({})),
            declared("lookup", InstanceKind::Data, "img/data/read", json!({})),
        ];
        let reports = engine.reconcile(&instances, &mut store);

        assert!(matches!(reports[0].result, ReconcileResult::Created));
        assert!(matches!(reports[1].result, ReconcileResult::Read));
        assert_eq!(runtime.operations(), vec!["create", "get"]);

        let summary = ReconcileSummary::of(&reports);
        assert!(summary.is_success());
        assert_eq!((summary.created, summary.read), (1, 1));
    }

    #[test]
    fn a_failed_instance_does_not_abort_the_rest() {
        let runtime = Arc::new(ScriptedRuntime::new());
        runtime.push_failure("boom");
        runtime.push_output(json!({"id": "b"}));
        let engine = engine_with(&runtime);
        let (_dir, mut store) = store();

        let instances = vec![
            declared("bad", InstanceKind::Resource, "img/resource/run", json!({})),
            declared("good", InstanceKind::Resource, "img/resource/run", json!({})),
        ];
        let reports = engine.reconcile(&instances, &mut store);

        assert!(matches!(reports[0].result, ReconcileResult::Failed { .. }));
        assert!(matches!(reports[1].result, ReconcileResult::Created));
        // The failed address was never committed; the later one was.
        assert!(!store.exists("bad"));
        assert!(store.exists("good"));
    }

    #[test]
    fn malformed_provider_reference_fails_without_plugin_calls() {
        let runtime = Arc::new(ScriptedRuntime::new());
        let engine = engine_with(&runtime);
        let (_dir, mut store) = store();

        let result = engine.apply(
            &declared("web", InstanceKind::Resource, "img/bogus/run", json!({})),
            &mut store,
        );
        assert!(matches!(
            result,
            ReconcileResult::Failed { error: Error::InvalidReference { .. } }
        ));
        assert!(runtime.calls().is_empty());
    }

    #[test]
    fn declared_kind_must_match_the_provider_kind() {
        let runtime = Arc::new(ScriptedRuntime::new());
        let engine = engine_with(&runtime);
        let (_dir, mut store) = store();

        let result = engine.apply(
            &declared("web", InstanceKind::Data, "img/resource/run", json!({})),
            &mut store,
        );
        assert!(matches!(
            result,
            ReconcileResult::Failed { error: Error::InvalidReference { .. } }
        ));
        assert!(runtime.calls().is_empty());
    }

    #[test]
    fn artifact_instances_are_skipped() {
        let runtime = Arc::new(ScriptedRuntime::new());
        let engine = engine_with(&runtime);
        let (_dir, mut store) = store();

        let result = engine.apply(
            &declared("release", InstanceKind::Artifact, "img/resource/push", json!({})),
            &mut store,
        );
        assert!(matches!(result, ReconcileResult::Skipped { .. }));
        assert!(runtime.calls().is_empty());
        assert!(!store.exists("release"));
    }

    #[test]
    fn destroy_resolves_the_provider_from_the_document() {
        let runtime = Arc::new(ScriptedRuntime::new());
        runtime.push_output(json!({"id": "live"}));
        runtime.push_output(json!(null));
        let engine = engine_with(&runtime);
        let (_dir, mut store) = store();

        engine.apply(
            &declared("web", InstanceKind::Resource, "org/img/resource/run", json!({})),
            &mut store,
        );
        let outcome = engine.destroy("web", &mut store).unwrap();

        assert_eq!(outcome, DestroyOutcome::Removed);
        assert!(!store.exists("web"));
        // Both lifecycle calls went to the image named by the document.
        assert!(runtime.calls().iter().all(|call| call.image == "org/img"));
    }

    #[test]
    fn destroy_of_an_absent_address_is_a_skip() {
        let runtime = Arc::new(ScriptedRuntime::new());
        let engine = engine_with(&runtime);
        let (_dir, mut store) = store();

        let outcome = engine.destroy("ghost", &mut store).unwrap();
        assert!(matches!(outcome, DestroyOutcome::Skipped { .. }));
        assert!(runtime.calls().is_empty());
    }

    #[test]
    fn destroy_of_a_data_instance_leaves_the_document_inert() {
        let runtime = Arc::new(ScriptedRuntime::new());
        runtime.push_output(json!({"fact": 1}));
        let engine = engine_with(&runtime);
        let (_dir, mut store) = store();

        engine.apply(
            &declared("lookup", InstanceKind::Data, "img/data/read", json!({})),
            &mut store,
        );
        let outcome = engine.destroy("lookup", &mut store).unwrap();

        assert!(matches!(outcome, DestroyOutcome::Skipped { .. }));
        assert!(store.exists("lookup"));
        assert_eq!(runtime.operations(), vec!["get"]);
    }
}
