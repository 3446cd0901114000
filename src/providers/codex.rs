use super::{PromptCallbacks, PromptOutcome, ProviderAdapter};
use crate::error::{AppError, AppResult};
use crate::models::Agent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use tokio::process::Command;

/// Same shape as the Claude Code adapter's liveness map (spec §4.6: "same
/// shape as Claude Code").
fn live_sessions() -> &'static Mutex<HashMap<String, bool>> {
    static MAP: OnceLock<Mutex<HashMap<String, bool>>> = OnceLock::new();
    MAP.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn mark_alive(session_id: &str) {
    live_sessions()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(session_id.to_string(), true);
}

pub fn mark_dead(session_id: &str) {
    live_sessions()
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(session_id.to_string(), false);
}

pub struct CodexAdapter;

impl CodexAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProviderAdapter for CodexAdapter {
    async fn prompt(
        &self,
        agent: &Agent,
        text: &str,
        mut callbacks: PromptCallbacks<'_>,
    ) -> AppResult<Option<PromptOutcome>> {
        let session_id = agent
            .provider_session_id
            .as_deref()
            .ok_or_else(|| AppError::AdapterFault("codex session not configured".into()))?;

        (callbacks.on_typing_start)();

        let output = Command::new("codex")
            .arg("exec")
            .arg("--session")
            .arg(session_id)
            .arg(text)
            .current_dir(&agent.project_path)
            .output()
            .await
            .map_err(|e| AppError::AdapterFault(e.to_string()))?;

        if !output.status.success() {
            return Err(AppError::AdapterFault(format!(
                "codex exited with {}",
                output.status
            )));
        }

        let full_text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if full_text.is_empty() {
            return Ok(None);
        }
        (callbacks.on_text_delta)(&full_text);

        Ok(Some(PromptOutcome {
            text: full_text,
            cost: None,
            input_tokens: None,
            output_tokens: None,
        }))
    }

    async fn is_session_busy(&self, _agent: &Agent) -> bool {
        false
    }

    async fn is_session_alive(&self, agent: &Agent) -> bool {
        let Some(session_id) = &agent.provider_session_id else {
            return false;
        };
        live_sessions()
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .copied()
            .unwrap_or(false)
    }
}
