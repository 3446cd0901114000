//! Uniform interface over the coding-agent providers this hub can invoke.
//!
//! Every provider (`opencode`, `claude_code`, `codex`) implements
//! [`ProviderAdapter`] the same way regardless of whether it talks to a
//! long-lived HTTP session (OpenCode) or a CLI subprocess (Claude Code,
//! Codex). The Invoker never branches on `AgentType` itself; it dispatches
//! through [`adapter_for`].

mod claude_code;
mod codex;
mod opencode;

use crate::error::AppResult;
use crate::models::{Agent, AgentType};
use async_trait::async_trait;
use std::sync::Arc;

/// Extracted, fully concatenated provider response.
#[derive(Debug, Clone)]
pub struct PromptOutcome {
    pub text: String,
    pub cost: Option<f64>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
}

/// Streaming callbacks a caller supplies to `prompt`. `on_text_delta` may be
/// invoked many times; `on_error` at most once, and is terminal.
pub struct PromptCallbacks<'a> {
    pub on_typing_start: Box<dyn Fn() + Send + Sync + 'a>,
    pub on_text_delta: Box<dyn FnMut(&str) + Send + 'a>,
}

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn prompt(
        &self,
        agent: &Agent,
        text: &str,
        callbacks: PromptCallbacks<'_>,
    ) -> AppResult<Option<PromptOutcome>>;

    async fn is_session_busy(&self, agent: &Agent) -> bool;

    async fn is_session_alive(&self, agent: &Agent) -> bool;
}

pub fn adapter_for(agent_type: AgentType) -> Arc<dyn ProviderAdapter> {
    match agent_type {
        AgentType::Opencode => Arc::new(opencode::OpencodeAdapter::new()),
        AgentType::ClaudeCode => Arc::new(claude_code::ClaudeCodeAdapter::new()),
        AgentType::Codex => Arc::new(codex::CodexAdapter::new()),
        AgentType::System => Arc::new(claude_code::ClaudeCodeAdapter::new()),
    }
}

/// Marks a CLI-provider session alive in its in-process liveness map. A
/// no-op for OpenCode, which is probed remotely instead (spec §4.6).
pub fn mark_session_alive(agent_type: AgentType, session_id: &str) {
    match agent_type {
        AgentType::ClaudeCode | AgentType::System => claude_code::mark_alive(session_id),
        AgentType::Codex => codex::mark_alive(session_id),
        AgentType::Opencode => {}
    }
}

pub fn mark_session_dead(agent_type: AgentType, session_id: &str) {
    match agent_type {
        AgentType::ClaudeCode | AgentType::System => claude_code::mark_dead(session_id),
        AgentType::Codex => codex::mark_dead(session_id),
        AgentType::Opencode => {}
    }
}

/// Only text parts survive extraction; tool calls, reasoning, and other
/// structured fragments are dropped. Ignored parts (`ignored: true`) are
/// skipped. Empty extraction means "no response" (spec §4.6).
pub fn extract_text(parts: &[serde_json::Value]) -> Option<String> {
    let joined = parts
        .iter()
        .filter(|p| {
            p.get("type").and_then(|t| t.as_str()) == Some("text")
                && p.get("ignored").and_then(|i| i.as_bool()) != Some(true)
        })
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Longest-common-directory-prefix match, path-separator-normalized (spec
/// §4.6: OpenCode session-to-project matching).
pub fn longest_common_dir_prefix(a: &str, b: &str) -> usize {
    let na = a.replace('\\', "/");
    let nb = b.replace('\\', "/");
    let pa: Vec<&str> = na.split('/').collect();
    let pb: Vec<&str> = nb.split('/').collect();
    pa.iter().zip(pb.iter()).take_while(|(x, y)| x == y).count()
}
