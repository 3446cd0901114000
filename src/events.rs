use crate::models::{Agent, Channel, FeatureRequest, Message, ReactionEvent};
use tokio::sync::broadcast;

/// The canonical event set from `spec.md` §4.2. Carried over the WebSocket
/// hub (`src/ws.rs`) and filtered per-client by subscribed channel id.
#[derive(Debug, Clone)]
pub enum HubEvent {
    NewMessage(Message),
    MessageDeleted { id: String, channel_id: String },
    MessageEdited(Message),
    Reaction(ReactionEvent),
    AgentStatus { agent: Agent, is_ghost: bool },
    AgentTyping {
        agent_name: String,
        channel_id: String,
        typing: bool,
        error: Option<String>,
    },
    AgentStreaming {
        agent_name: String,
        channel_id: String,
        delta: String,
    },
    ChannelCreated(Channel),
    FeatureUpdate(FeatureRequest),
}

impl HubEvent {
    /// The channel id this event is scoped to, if any. Non-channel events
    /// (`agent_status`, `channel_created`, `feature_update`) are delivered to
    /// every client regardless of its subscription set (spec §4.2).
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            HubEvent::NewMessage(m) => Some(&m.channel_id),
            HubEvent::MessageDeleted { channel_id, .. } => Some(channel_id),
            HubEvent::MessageEdited(m) => Some(&m.channel_id),
            HubEvent::Reaction(r) => Some(&r.channel_id),
            HubEvent::AgentTyping { channel_id, .. } => Some(channel_id),
            HubEvent::AgentStreaming { channel_id, .. } => Some(channel_id),
            HubEvent::AgentStatus { .. }
            | HubEvent::ChannelCreated(_)
            | HubEvent::FeatureUpdate(_) => None,
        }
    }

    /// Render as the `{type, data}` envelope the WS/SSE wire format uses.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            HubEvent::NewMessage(m) => serde_json::json!({"type": "new_message", "data": m}),
            HubEvent::MessageDeleted { id, channel_id } => {
                serde_json::json!({"type": "message_deleted", "data": {"id": id, "channel_id": channel_id}})
            }
            HubEvent::MessageEdited(m) => serde_json::json!({"type": "message_edited", "data": m}),
            HubEvent::Reaction(r) => serde_json::json!({"type": "reaction", "data": r}),
            HubEvent::AgentStatus { agent, is_ghost } => serde_json::json!({
                "type": "agent_status",
                "data": {"agent_name": agent.agent_name, "status": agent.status.as_str(), "is_ghost": is_ghost}
            }),
            HubEvent::AgentTyping { agent_name, channel_id, typing, error } => serde_json::json!({
                "type": "agent_typing",
                "data": {"agent_name": agent_name, "channel_id": channel_id, "typing": typing, "error": error}
            }),
            HubEvent::AgentStreaming { agent_name, channel_id, delta } => serde_json::json!({
                "type": "agent_streaming",
                "data": {"agent_name": agent_name, "channel_id": channel_id, "delta": delta}
            }),
            HubEvent::ChannelCreated(c) => serde_json::json!({"type": "channel_created", "data": c}),
            HubEvent::FeatureUpdate(f) => serde_json::json!({"type": "feature_update", "data": f}),
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    pub sender: broadcast::Sender<HubEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        EventBus { sender }
    }

    pub fn publish(&self, event: HubEvent) {
        // Ignore send errors (no subscribers) — best-effort fan-out (spec §4.2).
        let _ = self.sender.send(event);
    }
}
