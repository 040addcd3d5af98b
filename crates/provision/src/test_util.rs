//! Scripted runtime shared by the transport, handle, and engine tests

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::reference::TransportIdentity;
use crate::transport::{PluginInput, PluginSettings, Runtime, TransportError};

/// One recorded [`Runtime::call`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub image: String,
    pub input: PluginInput,
    pub settings: Option<PluginSettings>,
}

/// A [`Runtime`] that answers preflight with a fixed response and
/// execution calls with a scripted queue, recording everything it sees.
pub struct ScriptedRuntime {
    preflight_response: Value,
    responses: Mutex<VecDeque<Result<Value, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for ScriptedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::with_settings(PluginSettings::default())
    }

    pub fn with_settings(settings: PluginSettings) -> Self {
        Self::with_preflight_response(serde_json::to_value(settings).expect("settings serialize"))
    }

    pub fn with_null_preflight() -> Self {
        Self::with_preflight_response(Value::Null)
    }

    pub fn with_preflight_response(response: Value) -> Self {
        Self {
            preflight_response: response,
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue the output of the next execution call.
    pub fn push_output(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    /// Queue a non-zero-exit failure for the next execution call.
    pub fn push_failure(&self, output: &str) {
        self.responses.lock().unwrap().push_back(Err(TransportError::Failed {
            image: "scripted".to_string(),
            code: Some(1),
            output: output.to_string(),
        }));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Execution calls only, preflights filtered out.
    pub fn executions(&self) -> Vec<PluginInput> {
        self.calls()
            .into_iter()
            .filter(|call| !call.input.is_preflight())
            .map(|call| call.input)
            .collect()
    }

    /// Operations of the execution calls, in order.
    pub fn operations(&self) -> Vec<String> {
        self.executions().into_iter().map(|input| input.operation).collect()
    }
}

impl Runtime for ScriptedRuntime {
    fn call(
        &self,
        identity: &TransportIdentity,
        input: &PluginInput,
        settings: Option<&PluginSettings>,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            image: identity.image().to_string(),
            input: input.clone(),
            settings: settings.cloned(),
        });
        if input.is_preflight() {
            return Ok(self.preflight_response.clone());
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }
}
