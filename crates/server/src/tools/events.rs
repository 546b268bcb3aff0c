//! Out-of-band events: background sync, push and notification clicks.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::{NotificationClick, SyncReport, Worker};

use super::json_result;

/// Parameters for the sw_sync tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync tag (default: the configured tag).
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncOutput {
    pub tag: String,
    /// False when the tag is not one this worker handles.
    pub handled: bool,
    pub report: Option<SyncReport>,
}

/// Parameters for the sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push payload text; the notification body.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Parameters for the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Tag of the clicked notification.
    pub tag: String,
    /// "explore", "close", or absent for a click on the body.
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickOutput {
    pub closed: String,
    /// Window opened in response, if any.
    pub opened: Option<String>,
}

pub async fn sync_impl(worker: &Worker, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    let tag = params.tag.unwrap_or_else(|| worker.config().sync_tag.clone());
    let report = worker.handle_sync(&tag).await?;
    json_result(&SwSyncOutput { handled: report.is_some(), tag, report })
}

pub async fn push_impl(worker: &Worker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.handle_push(params.payload.as_deref()).await?;
    json_result(&notification)
}

pub async fn notification_click_impl(
    worker: &Worker, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let click = NotificationClick { tag: params.tag, action: params.action };
    let opened = worker.handle_notification_click(&click).await?;
    json_result(&SwNotificationClickOutput { closed: click.tag, opened: opened.map(|u| u.to_string()) })
}
