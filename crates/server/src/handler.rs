//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker and the cache.
use crate::tools::{
    cache::{CacheGetParams, CacheKeysParams, get_impl, keys_impl},
    events::{SwNotificationClickParams, SwPushParams, SwSyncParams, notification_click_impl, push_impl, sync_impl},
    fetch::{SwFetchParams, fetch_impl},
    lifecycle::{SwMessageParams, activate_impl, install_impl, message_impl},
    outbox::{OutboxEnqueueParams, enqueue_impl},
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use std::sync::Arc;
use swcache_client::Worker;
use swcache_core::CacheDb;

/// The main MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    worker: Arc<Worker>,
    db: CacheDb,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl SwCacheServer {
    /// Create a new server handler around a booted worker.
    pub fn new(worker: Arc<Worker>, db: CacheDb) -> Self {
        Self { worker, db, tool_router: Self::tool_router() }
    }

    #[tool(description = "Install the asset manifest into this version's cache generation, then activate it.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Activate an installed worker: delete every other cache generation and claim open clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Run a request through fetch interception.
    ///
    /// Cached GET responses are served without touching the network; misses
    /// are fetched and stored, and network failures fall back to the offline page.
    #[tool(description = "Fetch a URL through the offline cache. Returns status, body and where the response came from.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a background sync signal. The default tag replays queued offline writes.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push message and show the resulting notification.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Handle a click on a notification. The explore action opens the application root.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notification_click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a control message to the worker, e.g. {\"action\": \"skipWaiting\"}.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache generations and the request keys stored in one of them.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.db, self.worker.config(), params.0).await
    }

    #[tool(description = "Retrieve a stored response by URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.db, self.worker.config(), params.0).await
    }

    #[tool(description = "Queue a write made while offline. It is replayed on the next sync.")]
    async fn outbox_enqueue(&self, params: Parameters<OutboxEnqueueParams>) -> Result<CallToolResult, McpError> {
        enqueue_impl(&self.db, &self.worker, params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
