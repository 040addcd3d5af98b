//! Plugin transport: isolated execution of provider plugins
//!
//! A plugin is any container image that accepts a single base64-encoded
//! JSON argument and writes a JSON response to stdout. Every logical
//! operation is two sequential calls against the same image: a *preflight*
//! call through which the plugin declares its environment requirements,
//! then the *execution* call shaped by those requirements. The two-phase
//! shape keeps per-plugin mount logic out of the engine.
//!
//! There is no timeout: a plugin that never exits hangs the caller. A
//! bounded wait with forced termination would be an extension of this
//! contract, not part of it.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::reference::TransportIdentity;

/// Environment variable exporting the host working directory to the
/// plugin, so it can translate host paths to its own mount point.
pub const HOST_WORKING_DIR_ENV: &str = "HOST_WORKING_DIR";

/// Host side of the container-runtime control socket mount.
pub const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Failures of the plugin subprocess itself
#[derive(Error, Debug)]
pub enum TransportError {
    /// Call payload could not be serialized
    #[error("failed to encode plugin input: {0}")]
    Encode(#[source] serde_json::Error),

    /// Subprocess could not be started
    #[error("failed to launch plugin `{image}`: {source}")]
    Spawn {
        image: String,
        #[source]
        source: std::io::Error,
    },

    /// Subprocess exited non-zero; `output` is the captured stdout
    #[error("plugin `{image}` exited with code {}; captured output: {output}", .code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    Failed {
        image: String,
        code: Option<i32>,
        output: String,
    },

    /// Subprocess stdout was not a well-formed response
    #[error("plugin `{image}` returned malformed output: {source}; captured output: {output}")]
    Malformed {
        image: String,
        #[source]
        source: serde_json::Error,
        output: String,
    },
}

/// Wire payload for one plugin call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginInput {
    pub kind: String,
    pub name: String,
    /// `create`, `update`, `delete`, or `get`; blank for preflight
    pub operation: String,
    pub custom_state_dir: String,
    /// Ordered, fully-resolved call arguments
    pub arguments: Vec<Value>,
}

impl PluginInput {
    pub fn new(
        kind: &str,
        name: &str,
        operation: &str,
        custom_state_dir: &str,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            operation: operation.to_string(),
            custom_state_dir: custom_state_dir.to_string(),
            arguments,
        }
    }

    /// Handshake payload: `kind` is `preflight`, everything else blank.
    pub fn preflight() -> Self {
        Self::new("preflight", "", "", "", Vec::new())
    }

    pub fn is_preflight(&self) -> bool {
        self.kind == "preflight"
    }
}

/// Environment requirements a plugin declared during preflight
///
/// An absent field means the corresponding host resource is not shared
/// with the plugin. Unrecognized keys in the response are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Mount point for the host working directory inside the plugin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Mount point for the host container-runtime control socket,
    /// letting the plugin launch sibling containers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_host: Option<String>,
}

/// Executes plugin calls in a bounded environment and returns their stdout
///
/// The seam between the engine and arbitrary externally-authored code.
/// [`DockerRuntime`] is the conventional implementation; tests substitute
/// a scripted one.
pub trait Runtime: Send + Sync {
    fn call(
        &self,
        identity: &TransportIdentity,
        input: &PluginInput,
        settings: Option<&PluginSettings>,
    ) -> std::result::Result<Value, TransportError>;
}

/// Run one logical plugin operation: the preflight handshake, then the
/// execution call shaped by the declared settings. Both calls target the
/// same transport identity.
pub fn run_plugin(
    runtime: &dyn Runtime,
    identity: &TransportIdentity,
    input: &PluginInput,
) -> std::result::Result<Value, TransportError> {
    let response = runtime.call(identity, &PluginInput::preflight(), None)?;
    let settings = if response.is_null() {
        PluginSettings::default()
    } else {
        serde_json::from_value(response.clone()).map_err(|source| TransportError::Malformed {
            image: identity.image().to_string(),
            source,
            output: response.to_string(),
        })?
    };
    runtime.call(identity, input, Some(&settings))
}

/// Runs plugins as `docker run --rm` subprocesses
///
/// Stdout is the response channel; stderr passes straight through to the
/// operator and never participates in the contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct DockerRuntime;

impl Runtime for DockerRuntime {
    fn call(
        &self,
        identity: &TransportIdentity,
        input: &PluginInput,
        settings: Option<&PluginSettings>,
    ) -> std::result::Result<Value, TransportError> {
        let payload = encode_payload(input)?;
        let host_dir = std::env::current_dir().map_err(|source| TransportError::Spawn {
            image: identity.image().to_string(),
            source,
        })?;
        let args = docker_args(identity, settings, &payload, &host_dir);
        log::debug!("docker {}", args.join(" "));

        let output = Command::new("docker")
            .args(&args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| TransportError::Spawn {
                image: identity.image().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !output.status.success() {
            return Err(TransportError::Failed {
                image: identity.image().to_string(),
                code: output.status.code(),
                output: stdout,
            });
        }

        serde_json::from_str(&stdout).map_err(|source| TransportError::Malformed {
            image: identity.image().to_string(),
            source,
            output: stdout.clone(),
        })
    }
}

/// Serialize a call payload and make it transport-safe: JSON, then base64,
/// so it travels as a single opaque process argument.
pub fn encode_payload(input: &PluginInput) -> std::result::Result<String, TransportError> {
    let json = serde_json::to_vec(input).map_err(TransportError::Encode)?;
    Ok(STANDARD.encode(json))
}

/// Assemble the `docker run` argument list for one call.
///
/// `working_dir` in the settings bind-mounts the host working directory at
/// the plugin's requested path and exports the host path via
/// [`HOST_WORKING_DIR_ENV`]; `docker_host` bind-mounts the control socket.
fn docker_args(
    identity: &TransportIdentity,
    settings: Option<&PluginSettings>,
    payload: &str,
    host_dir: &Path,
) -> Vec<String> {
    let mut args = vec!["run".to_string(), "--rm".to_string()];

    if let Some(settings) = settings {
        if let Some(working_dir) = &settings.working_dir {
            args.push("-e".to_string());
            args.push(format!("{HOST_WORKING_DIR_ENV}={}", host_dir.display()));
            args.push("-v".to_string());
            args.push(format!("{}:{working_dir}", host_dir.display()));
        }
        if let Some(docker_host) = &settings.docker_host {
            args.push("-v".to_string());
            args.push(format!("{DOCKER_SOCKET}:{docker_host}"));
        }
    }

    args.push(identity.image().to_string());
    args.push(payload.to_string());
    args
}
