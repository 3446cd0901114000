use serde::{Deserialize, Serialize};

// --- Users & Agents ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Human,
    Agent,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Opencode,
    ClaudeCode,
    Codex,
    System,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Opencode => "opencode",
            AgentType::ClaudeCode => "claude_code",
            AgentType::Codex => "codex",
            AgentType::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "opencode" => Some(AgentType::Opencode),
            "claude_code" => Some(AgentType::ClaudeCode),
            "codex" => Some(AgentType::Codex),
            "system" => Some(AgentType::System),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Online,
    Offline,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Online => "online",
            AgentStatus::Offline => "offline",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_instructions: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Agent {
    pub user_id: String,
    pub agent_name: String,
    pub agent_type: AgentType,
    pub project_path: String,
    pub project_name: String,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_session_id: Option<String>,
    pub workspace_id: String,
}

impl Agent {
    /// §3 invariant (b): an agent is invocable iff it has the credentials its
    /// provider type requires.
    pub fn is_invocable(&self) -> bool {
        match self.agent_type {
            AgentType::Opencode => self.server_url.is_some() && self.provider_session_id.is_some(),
            AgentType::ClaudeCode | AgentType::Codex => self.provider_session_id.is_some(),
            AgentType::System => false,
        }
    }
}

/// Read-model row combining `Agent` with the derived, non-persisted ghost flag.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: Agent,
    pub is_ghost: bool,
    pub invocable: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentSession {
    pub id: String,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tty: Option<String>,
    pub is_active: bool,
    pub started_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    pub last_heartbeat: String,
}

// --- Registration ---

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub session_id: String,
    pub project_path: String,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub agent_name: String,
    pub master_prompt: String,
    pub inject_prompt: String,
    pub project_channel: String,
    pub reconnected: bool,
    pub profile: Agent,
}

// --- Channels ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    General,
    Project,
    Custom,
    Dm,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub channel_type: ChannelType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub is_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
    pub workspace_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(default = "default_system")]
    pub created_by: String,
}

fn default_system() -> String {
    "system".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SetTopicRequest {
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct JoinChannelResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CreateDmRequest {
    pub agent_name: String,
    pub created_by: String,
}

// --- Messages ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_type: UserType,
    pub content: String,
    pub mentions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub is_pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<String>,
    pub created_at: String,
    pub seq: i64,
}

/// A priority-fetch result item, tagged with the bucket it matched (spec §4.5).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PriorityMessage {
    #[serde(flatten)]
    pub message: Message,
    pub priority: PriorityBucket,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriorityBucket {
    Mention,
    Project,
    Other,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub sender_name: String,
    pub content: String,
    #[serde(default)]
    pub mentions: Option<Vec<String>>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageRequest {
    pub sender_name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
    pub before: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriorityFetchQuery {
    pub agent_name: String,
    pub limit: Option<i64>,
}

// --- Reactions ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
    #[serde(rename = "added")]
    Add,
    #[serde(rename = "removed")]
    Remove,
}

#[derive(Debug, Deserialize)]
pub struct ReactRequest {
    pub user_name: String,
    pub emoji: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReactionEvent {
    pub message_id: String,
    pub channel_id: String,
    pub user_name: String,
    pub emoji: String,
    pub action: ReactionAction,
}

// --- Search ---

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub channel: Option<String>,
    pub sender: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<Message>,
    pub count: usize,
}

// --- Feature requests ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Open,
    Planned,
    InProgress,
    Shipped,
    Rejected,
}

impl FeatureStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "planned" => Some(Self::Planned),
            "in_progress" => Some(Self::InProgress),
            "shipped" => Some(Self::Shipped),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Shipped => "shipped",
            Self::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeatureRequest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: FeatureStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    pub created_by: String,
    pub created_at: String,
    pub votes: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateFeatureRequest {
    pub title: String,
    pub description: String,
    #[serde(default = "default_system")]
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteFeatureRequest {
    pub user_name: String,
    pub vote: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFeatureStatusRequest {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

// --- Workspaces ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceRole {
    Admin,
    Member,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkspaceMember {
    pub workspace_id: String,
    pub user_id: String,
    pub role: WorkspaceRole,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkspaceApiKey {
    pub id: String,
    pub workspace_id: String,
    pub token_prefix: String,
    pub created_by: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkspaceInvite {
    pub id: String,
    pub workspace_id: String,
    pub token: String,
    pub role: WorkspaceRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<i64>,
    pub use_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<String>,
    pub created_at: String,
}

/// Resolved by the auth request guard (spec §4.9): who is making this
/// request and under which workspace/role, if anyone.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Option<String>,
    pub workspace_id: String,
    pub role: WorkspaceRole,
}

// --- Profiles ---

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub current_task: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}
