//! MCP tool surface (spec §4.8). Every tool argument struct carries its own
//! `session_id` rather than relying on rmcp's transport-level connection
//! identity — there's no server-side `rmcp` usage anywhere in the retrieval
//! pack to ground that plumbing against, so this keeps the session map's
//! contract explicit instead of guessing at `RequestContext` internals.

mod session_map;

pub use session_map::{SessionIdentity, SessionMap};

use crate::error::AppError;
use crate::models::{FeatureStatus, RegisterRequest};
use crate::state::AppState;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

fn ok_json(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(value.to_string())]))
}

fn err_json(message: impl std::fmt::Display) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::json!({"error": message.to_string()}).to_string(),
    )]))
}

fn app_err(e: AppError) -> Result<CallToolResult, McpError> {
    err_json(e)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegisterArgs {
    pub session_id: String,
    pub project_path: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DisconnectArgs {
    pub session_id: String,
    #[serde(default)]
    pub agent_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SendMessageArgs {
    pub session_id: String,
    pub channel: String,
    pub content: String,
    #[serde(default)]
    pub mentions: Option<Vec<String>>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetMessagesArgs {
    pub session_id: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateChannelArgs {
    pub session_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct JoinChannelArgs {
    pub session_id: String,
    pub channel: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetChannelTopicArgs {
    pub session_id: String,
    pub channel: String,
    pub topic: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionOnlyArgs {
    pub session_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateProfileArgs {
    pub session_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub current_task: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateFeatureRequestArgs {
    pub session_id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VoteFeatureArgs {
    pub session_id: String,
    pub feature_id: String,
    pub vote: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateFeatureStatusArgs {
    pub session_id: String,
    pub feature_id: String,
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteFeatureRequestArgs {
    pub session_id: String,
    pub feature_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchMessagesArgs {
    pub session_id: String,
    pub query: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditMessageArgs {
    pub session_id: String,
    pub channel: String,
    pub message_id: String,
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReactMessageArgs {
    pub session_id: String,
    pub channel: String,
    pub message_id: String,
    pub emoji: String,
}

#[derive(Clone)]
pub struct McpHub {
    state: AppState,
    sessions: Arc<SessionMap>,
    tool_router: ToolRouter<McpHub>,
}

#[tool_router]
impl McpHub {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            sessions: Arc::new(SessionMap::default()),
            tool_router: Self::tool_router(),
        }
    }

    fn identity(&self, session_id: &str) -> Result<SessionIdentity, McpError> {
        self.sessions
            .identity(session_id)
            .ok_or_else(|| McpError::invalid_params("session is not registered", None))
    }

    #[tool(description = "Register a new agent or reconnect an existing one, returning its onboarding prompts and project channel")]
    async fn register(&self, Parameters(args): Parameters<RegisterArgs>) -> Result<CallToolResult, McpError> {
        let req = RegisterRequest {
            session_id: args.session_id.clone(),
            project_path: args.project_path,
            agent_name: args.agent_name,
            server_url: args.server_url,
            agent_type: args.agent_type,
            workspace_id: None,
        };
        match self.state.registry.register_or_connect(&req) {
            Ok(resp) => {
                self.sessions
                    .bind(&args.session_id, &resp.agent_name, &resp.profile.workspace_id);
                ok_json(serde_json::to_value(&resp).unwrap_or_default())
            }
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Disconnect the calling agent (or a named one), marking it offline")]
    async fn disconnect(&self, Parameters(args): Parameters<DisconnectArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        let agent_name = args.agent_name.unwrap_or(identity.agent_name);
        match self.state.registry.disconnect(&agent_name) {
            Ok(()) => {
                self.sessions.remove(&args.session_id);
                ok_json(serde_json::json!({"status": "disconnected"}))
            }
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Send a message to a channel, triggering any @mention invocations")]
    async fn send_message(&self, Parameters(args): Parameters<SendMessageArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        let channel = match self.state.channels.find_by_name(&identity.workspace_id, &args.channel) {
            Ok(Some(c)) => c,
            Ok(None) => return err_json(format!("channel {} not found", args.channel)),
            Err(e) => return app_err(e),
        };
        let sender = match self.state.store.find_agent_by_name(&identity.agent_name) {
            Ok(Some(a)) => a,
            Ok(None) => return err_json("calling agent no longer exists"),
            Err(e) => return app_err(e),
        };
        let mentions = args.mentions.unwrap_or_default();
        match self.state.router.send(
            &channel.id,
            &channel.name,
            &sender.user_id,
            &identity.agent_name,
            &args.content,
            mentions,
            args.reply_to.as_deref(),
        ) {
            Ok(message) => ok_json(serde_json::to_value(&message).unwrap_or_default()),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Fetch priority-ranked unread messages for the calling agent (limit <= 10)")]
    async fn get_messages(&self, Parameters(args): Parameters<GetMessagesArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        if let Some(channel_name) = &args.channel {
            let channel = match self.state.channels.find_by_name(&identity.workspace_id, channel_name) {
                Ok(Some(c)) => c,
                Ok(None) => return err_json(format!("channel {channel_name} not found")),
                Err(e) => return app_err(e),
            };
            return match self
                .state
                .router
                .channel_messages(&channel.id, args.limit.unwrap_or(10).clamp(1, 10), None)
            {
                Ok(messages) => ok_json(serde_json::json!(messages)),
                Err(e) => app_err(e),
            };
        }
        match self
            .state
            .router
            .priority_fetch(&identity.agent_name, args.limit.unwrap_or(10))
        {
            Ok(messages) => ok_json(serde_json::json!(messages)),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Create a custom channel")]
    async fn create_channel(&self, Parameters(args): Parameters<CreateChannelArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        match self
            .state
            .channels
            .create_custom(&args.name, &identity.agent_name, &identity.workspace_id)
        {
            Ok(channel) => ok_json(serde_json::to_value(&channel).unwrap_or_default()),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Join an existing channel")]
    async fn join_channel(&self, Parameters(args): Parameters<JoinChannelArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        let channel = match self.state.channels.find_by_name(&identity.workspace_id, &args.channel) {
            Ok(Some(c)) => c,
            Ok(None) => return err_json(format!("channel {} not found", args.channel)),
            Err(e) => return app_err(e),
        };
        let agent = match self.state.store.find_agent_by_name(&identity.agent_name) {
            Ok(Some(a)) => a,
            Ok(None) => return err_json("calling agent no longer exists"),
            Err(e) => return app_err(e),
        };
        match self.state.channels.join(&channel.id, &agent.user_id) {
            Ok(resp) => ok_json(serde_json::to_value(&resp).unwrap_or_default()),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Set a channel's topic")]
    async fn set_channel_topic(&self, Parameters(args): Parameters<SetChannelTopicArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        let channel = match self.state.channels.find_by_name(&identity.workspace_id, &args.channel) {
            Ok(Some(c)) => c,
            Ok(None) => return err_json(format!("channel {} not found", args.channel)),
            Err(e) => return app_err(e),
        };
        match self.state.channels.set_topic(&channel.id, Some(&args.topic)) {
            Ok(()) => ok_json(serde_json::json!({"status": "ok"})),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "List all channels in the workspace")]
    async fn list_channels(&self, Parameters(args): Parameters<SessionOnlyArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        match self.state.channels.list(&identity.workspace_id) {
            Ok(channels) => ok_json(serde_json::json!(channels)),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "List all agents in the workspace, with ghost status")]
    async fn list_agents(&self, Parameters(args): Parameters<SessionOnlyArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        match self.state.registry.list(&identity.workspace_id) {
            Ok(agents) => {
                let views: Vec<_> = agents
                    .into_iter()
                    .map(|a| {
                        let is_ghost = self.state.registry.ghost_cache.is_ghost(&a.agent_name);
                        let invocable = a.is_invocable();
                        crate::models::AgentView {
                            agent: a,
                            is_ghost,
                            invocable,
                        }
                    })
                    .collect();
                ok_json(serde_json::json!(views))
            }
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Update the calling agent's profile fields")]
    async fn update_profile(&self, Parameters(args): Parameters<UpdateProfileArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        match self.state.registry.update_profile(
            &identity.agent_name,
            args.description.as_deref(),
            args.personality.as_deref(),
            args.current_task.as_deref(),
            args.gender.as_deref(),
        ) {
            Ok(agent) => ok_json(serde_json::to_value(&agent).unwrap_or_default()),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "List all feature requests, ordered by votes")]
    async fn get_feature_requests(&self, Parameters(args): Parameters<SessionOnlyArgs>) -> Result<CallToolResult, McpError> {
        if self.identity(&args.session_id).is_err() {
            return err_json("session is not registered");
        }
        match self.state.store.list_features() {
            Ok(features) => ok_json(serde_json::json!(features)),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Create a feature request")]
    async fn create_feature_request(&self, Parameters(args): Parameters<CreateFeatureRequestArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        match self
            .state
            .store
            .create_feature_request(&args.title, &args.description, &identity.agent_name)
        {
            Ok(feature) => ok_json(serde_json::to_value(&feature).unwrap_or_default()),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Vote +1 or -1 on a feature request; a second vote replaces the first")]
    async fn vote_feature(&self, Parameters(args): Parameters<VoteFeatureArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        if args.vote != 1 && args.vote != -1 {
            return err_json("vote must be +1 or -1");
        }
        let agent = match self.state.store.find_agent_by_name(&identity.agent_name) {
            Ok(Some(a)) => a,
            Ok(None) => return err_json("calling agent no longer exists"),
            Err(e) => return app_err(e),
        };
        match self
            .state
            .store
            .vote_feature(&args.feature_id, &agent.user_id, args.vote)
        {
            Ok(()) => ok_json(serde_json::json!({"status": "ok"})),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Update a feature request's status")]
    async fn update_feature_status(&self, Parameters(args): Parameters<UpdateFeatureStatusArgs>) -> Result<CallToolResult, McpError> {
        if self.identity(&args.session_id).is_err() {
            return err_json("session is not registered");
        }
        let status = match FeatureStatus::parse(&args.status) {
            Some(s) => s,
            None => return err_json(format!("unknown status {}", args.status)),
        };
        match self
            .state
            .store
            .set_feature_status(&args.feature_id, status, args.reason.as_deref())
        {
            Ok(()) => ok_json(serde_json::json!({"status": "ok"})),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Delete a feature request")]
    async fn delete_feature_request(&self, Parameters(args): Parameters<DeleteFeatureRequestArgs>) -> Result<CallToolResult, McpError> {
        if self.identity(&args.session_id).is_err() {
            return err_json("session is not registered");
        }
        match self.state.store.delete_feature(&args.feature_id) {
            Ok(()) => ok_json(serde_json::json!({"status": "ok"})),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Heartbeat: refresh the calling agent's liveness timestamp")]
    async fn heartbeat(&self, Parameters(args): Parameters<SessionOnlyArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        match self.state.registry.heartbeat(&identity.agent_name) {
            Ok(()) => ok_json(serde_json::json!({"status": "ok"})),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Full-text search messages (limit <= 50)")]
    async fn search_messages(&self, Parameters(args): Parameters<SearchMessagesArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        let channel_id = match &args.channel {
            Some(name) => match self.state.channels.find_by_name(&identity.workspace_id, name) {
                Ok(Some(c)) => Some(c.id),
                Ok(None) => return err_json(format!("channel {name} not found")),
                Err(e) => return app_err(e),
            },
            None => None,
        };
        match self.state.router.search(
            &args.query,
            channel_id.as_deref(),
            None,
            None,
            None,
            args.limit,
        ) {
            Ok(results) => ok_json(serde_json::json!({
                "query": args.query,
                "count": results.len(),
                "results": results,
            })),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Edit one of your own messages")]
    async fn edit_message(&self, Parameters(args): Parameters<EditMessageArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        match self
            .state
            .router
            .edit(&args.message_id, &identity.agent_name, &args.content)
        {
            Ok(message) => ok_json(serde_json::to_value(&message).unwrap_or_default()),
            Err(e) => app_err(e),
        }
    }

    #[tool(description = "Toggle an emoji reaction on a message")]
    async fn react_message(&self, Parameters(args): Parameters<ReactMessageArgs>) -> Result<CallToolResult, McpError> {
        let identity = match self.identity(&args.session_id) {
            Ok(i) => i,
            Err(e) => return Err(e),
        };
        let agent = match self.state.store.find_agent_by_name(&identity.agent_name) {
            Ok(Some(a)) => a,
            Ok(None) => return err_json("calling agent no longer exists"),
            Err(e) => return app_err(e),
        };
        match self.state.router.react(
            &args.message_id,
            &agent.user_id,
            &identity.agent_name,
            &args.emoji,
        ) {
            Ok(event) => ok_json(serde_json::to_value(&event).unwrap_or_default()),
            Err(e) => app_err(e),
        }
    }
}

#[tool_handler]
impl ServerHandler for McpHub {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "agent-hub".to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: Some("Multi-agent chat hub tool surface".to_string()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Call `register` first; every other tool requires the session_id it returns."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}
