//! Resolved plugin capabilities and the per-instance lifecycle
//!
//! Resolving a provider reference yields one of two handle variants:
//! a resource handle with the full create/update/delete lifecycle, or a
//! data handle whose only operation is a read. Callers branch on the
//! variant, never on runtime type inspection.
//!
//! The create-vs-update decision is store existence and nothing else;
//! individual attributes are never diffed. Every lifecycle operation is
//! append-only with respect to failure: a failed plugin invocation leaves
//! the store untouched at its last completed state.

use serde_json::Value;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::instance::Document;
use crate::paths;
use crate::reference::{ProviderRef, ResourceKind};
use crate::store::InstanceStore;
use crate::transport::{PluginInput, Runtime, run_plugin};

/// What an apply did to the instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    /// Data instance re-read
    Read,
}

/// What a destroy did to the instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyOutcome {
    Removed,
    /// Nothing to do; repeated destroys are safe
    Skipped { reason: String },
}

/// A callable capability bound to one provider reference
#[derive(Clone)]
pub enum PluginHandle {
    Resource(ResourceHandle),
    Data(DataHandle),
}

impl PluginHandle {
    /// Parse `reference` and bind the matching handle variant to `runtime`.
    pub fn resolve(reference: &str, runtime: Arc<dyn Runtime>) -> Result<Self> {
        let provider = ProviderRef::parse(reference)?;
        Ok(match provider.kind {
            ResourceKind::Resource => Self::Resource(ResourceHandle { provider, runtime }),
            ResourceKind::Data => Self::Data(DataHandle { provider, runtime }),
        })
    }

    pub fn provider(&self) -> &ProviderRef {
        match self {
            Self::Resource(handle) => &handle.provider,
            Self::Data(handle) => &handle.provider,
        }
    }

    pub fn apply(&self, address: &str, argument: &Value, store: &mut InstanceStore) -> Result<ApplyOutcome> {
        match self {
            Self::Resource(handle) => handle.apply(address, argument, store),
            Self::Data(handle) => handle.apply(address, argument, store),
        }
    }
}

/// Full-lifecycle handle for `resource` providers
#[derive(Clone)]
pub struct ResourceHandle {
    provider: ProviderRef,
    runtime: Arc<dyn Runtime>,
}

impl ResourceHandle {
    /// Converge `address` to `argument`: update if a document exists,
    /// create otherwise. The document is only written after the plugin
    /// succeeds.
    pub fn apply(&self, address: &str, argument: &Value, store: &mut InstanceStore) -> Result<ApplyOutcome> {
        if store.exists(address) {
            let document = store.find(address)?;
            let custom_state_dir = document.custom_state_dir.clone();
            // Ordered pair: new argument, then last output as state.
            let arguments = vec![argument.clone(), document.output.clone()];

            log::info!("[{address} ({})] updating", self.provider);
            let input = self.input("update", &custom_state_dir, arguments);
            let output = invoke(&*self.runtime, &self.provider, address, "update", &input)?;

            store.upsert(address, self.document(&custom_state_dir, argument, output))?;
            log::info!("[{address} ({})] updated", self.provider);
            Ok(ApplyOutcome::Updated)
        } else {
            let custom_state_dir = paths::custom_state_dir(address);

            log::info!("[{address} ({})] creating", self.provider);
            let input = self.input("create", &custom_state_dir, vec![argument.clone()]);
            let output = invoke(&*self.runtime, &self.provider, address, "create", &input)?;

            store.upsert(address, self.document(&custom_state_dir, argument, output))?;
            log::info!("[{address} ({})] created", self.provider);
            Ok(ApplyOutcome::Created)
        }
    }

    /// Tear down `address`. An absent address is already satisfied and
    /// short-circuits without touching the plugin. The document is only
    /// removed after the plugin succeeds, so a failed delete can be
    /// retried.
    pub fn destroy(&self, address: &str, store: &mut InstanceStore) -> Result<DestroyOutcome> {
        if !store.exists(address) {
            log::info!("[{address} ({})] skipped, no instance recorded", self.provider);
            return Ok(DestroyOutcome::Skipped {
                reason: "no instance recorded".to_string(),
            });
        }

        let document = store.find(address)?;
        let input = self.input(
            "delete",
            &document.custom_state_dir,
            vec![document.output.clone()],
        );

        log::info!("[{address} ({})] deleting", self.provider);
        invoke(&*self.runtime, &self.provider, address, "delete", &input)?;

        store.delete(address)?;
        log::info!("[{address} ({})] deleted", self.provider);
        Ok(DestroyOutcome::Removed)
    }

    fn input(&self, operation: &str, custom_state_dir: &str, arguments: Vec<Value>) -> PluginInput {
        PluginInput::new(
            self.provider.kind.as_str(),
            &self.provider.name,
            operation,
            custom_state_dir,
            arguments,
        )
    }

    fn document(&self, custom_state_dir: &str, argument: &Value, output: Value) -> Document {
        Document {
            provider: self.provider.reference.clone(),
            custom_state_dir: custom_state_dir.to_string(),
            argument: argument.clone(),
            output,
        }
    }
}

/// Read-only handle for `data` providers; never torn down by the engine
#[derive(Clone)]
pub struct DataHandle {
    provider: ProviderRef,
    runtime: Arc<dyn Runtime>,
}

impl DataHandle {
    /// Re-read the source unconditionally and record the result. Data
    /// instances are never diffed against a prior document.
    pub fn apply(&self, address: &str, argument: &Value, store: &mut InstanceStore) -> Result<ApplyOutcome> {
        let custom_state_dir = paths::custom_state_dir(address);

        log::info!("[{address} ({})] reading", self.provider);
        let input = PluginInput::new(
            self.provider.kind.as_str(),
            &self.provider.name,
            "get",
            &custom_state_dir,
            vec![argument.clone()],
        );
        let output = invoke(&*self.runtime, &self.provider, address, "get", &input)?;

        store.upsert(
            address,
            Document {
                provider: self.provider.reference.clone(),
                custom_state_dir,
                argument: argument.clone(),
                output,
            },
        )?;
        log::info!("[{address} ({})] read", self.provider);
        Ok(ApplyOutcome::Read)
    }
}

fn invoke(
    runtime: &dyn Runtime,
    provider: &ProviderRef,
    address: &str,
    operation: &str,
    input: &PluginInput,
) -> Result<Value> {
    run_plugin(runtime, &provider.identity, input).map_err(|source| Error::PluginExecution {
        address: address.to_string(),
        operation: operation.to_string(),
        source,
    })
}
