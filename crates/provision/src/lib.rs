//! # Provision
//!
//! A resource lifecycle engine: declare instances, reconcile them against
//! recorded state, and let out-of-process plugins do the provider-specific
//! work.
//!
//! The engine never knows how to create a container or a cloud resource.
//! It decides *whether* an instance needs a create, update, read, or
//! delete, addresses it, and speaks a small two-phase protocol to whatever
//! plugin implements it. Plugins are container images that take a single
//! base64-encoded JSON argument and answer on stdout.
//!
//! ## Core concepts
//!
//! - [`DeclaredInstance`]: one item the caller wants reconciled, with a
//!   fully-resolved argument
//! - [`InstanceStore`]: durable map of address to the document of the last
//!   completed operation
//! - [`ProviderRef`] / [`PluginHandle`]: a parsed provider reference and
//!   the resource- or data-lifecycle capability it resolves to
//! - [`Runtime`]: the transport seam; [`DockerRuntime`] is the
//!   conventional implementation
//! - [`Engine`]: walks a manifest and drives each instance through its
//!   lifecycle
//!
//! ## Example
//!
//! ```ignore
//! use provision::{paths, DeclaredInstance, Engine, InstanceKind, InstanceStore};
//!
//! let mut store = InstanceStore::open(paths::state_file())?;
//! let engine = Engine::docker();
//!
//! let instances = vec![DeclaredInstance {
//!     address: "web".into(),
//!     kind: InstanceKind::Resource,
//!     provider: "docker-container/resource/run".into(),
//!     argument: serde_json::json!({"image": "nginx", "port": "80:80"}),
//! }];
//!
//! for report in engine.reconcile(&instances, &mut store) {
//!     println!("{}: {:?}", report.address, report.result);
//! }
//! ```
//!
//! ## Guarantees and limits
//!
//! Every lifecycle operation is append-only with respect to failure: the
//! store is only written after the plugin succeeds, so a failed operation
//! leaves the last completed state intact. The store itself is flushed
//! synchronously on every mutation. There is no durable in-progress
//! state, however - a crash between a plugin's real-world side effect and
//! the store write leaves the two diverged, with no automatic detection.

pub mod engine;
pub mod error;
pub mod handle;
pub mod instance;
pub mod paths;
pub mod reference;
pub mod store;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export main types at crate root
pub use engine::{Engine, InstanceReport, ReconcileResult, ReconcileSummary};
pub use error::{Error, Result};
pub use handle::{ApplyOutcome, DataHandle, DestroyOutcome, PluginHandle, ResourceHandle};
pub use instance::{DeclaredInstance, Document, InstanceKind};
pub use reference::{DEFAULT_NAMESPACE, ProviderRef, ResourceKind, TransportIdentity};
pub use store::InstanceStore;
pub use transport::{
    DockerRuntime, PluginInput, PluginSettings, Runtime, TransportError, run_plugin,
};
