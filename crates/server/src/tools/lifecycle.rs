//! sw_install, sw_activate and sw_message.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{ActivationReport, Event, EventOutcome, LifecycleState, MessageOutcome, Worker};

use super::json_result;

/// Worker state after a lifecycle transition.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct LifecycleOutput {
    /// Generation owned by this worker.
    pub cache_name: String,
    pub state: LifecycleState,
    /// Present when the call ran an activation.
    pub activation: Option<ActivationReport>,
}

/// Parameters for the sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message posted by a client, e.g. `{"action": "skipWaiting"}`.
    pub message: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwMessageOutput {
    pub outcome: MessageOutcome,
    pub state: LifecycleState,
}

async fn lifecycle_output(worker: &Worker, activation: Option<ActivationReport>) -> LifecycleOutput {
    LifecycleOutput { cache_name: worker.cache_name().to_string(), state: worker.state().await, activation }
}

/// Install the manifest, then activate if skip-waiting is set.
pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let activation = match worker.dispatch(Event::Install).await? {
        EventOutcome::Installed { activation } => activation,
        _ => None,
    };
    json_result(&lifecycle_output(worker, activation).await)
}

pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    json_result(&lifecycle_output(worker, Some(report)).await)
}

pub async fn message_impl(worker: &Worker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let outcome = worker.handle_message(&params.message).await?;
    json_result(&SwMessageOutput { outcome, state: worker.state().await })
}
