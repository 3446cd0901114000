use super::{extract_text, PromptCallbacks, PromptOutcome, ProviderAdapter};
use crate::error::{AppError, AppResult};
use crate::models::Agent;
use async_trait::async_trait;
use std::time::Duration;

pub struct OpencodeAdapter {
    client: reqwest::Client,
}

impl OpencodeAdapter {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .expect("failed to build OpenCode HTTP client"),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpencodeAdapter {
    async fn prompt(
        &self,
        agent: &Agent,
        text: &str,
        mut callbacks: PromptCallbacks<'_>,
    ) -> AppResult<Option<PromptOutcome>> {
        let (server_url, session_id) = match (&agent.server_url, &agent.provider_session_id) {
            (Some(s), Some(id)) => (s, id),
            _ => return Err(AppError::AdapterFault("opencode session not configured".into())),
        };

        (callbacks.on_typing_start)();

        let resp = self
            .client
            .post(format!("{server_url}/session/{session_id}/message"))
            .json(&serde_json::json!({ "parts": [{ "type": "text", "text": text }] }))
            .send()
            .await
            .map_err(|e| AppError::AdapterFault(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(AppError::AdapterFault(format!(
                "opencode returned {}",
                resp.status()
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AppError::AdapterFault(e.to_string()))?;

        let parts: Vec<serde_json::Value> = body
            .get("parts")
            .and_then(|p| p.as_array())
            .cloned()
            .unwrap_or_default();

        let Some(full_text) = extract_text(&parts) else {
            return Ok(None);
        };
        (callbacks.on_text_delta)(&full_text);

        Ok(Some(PromptOutcome {
            text: full_text,
            cost: body.get("cost").and_then(|v| v.as_f64()),
            input_tokens: body.pointer("/tokens/input").and_then(|v| v.as_i64()),
            output_tokens: body.pointer("/tokens/output").and_then(|v| v.as_i64()),
        }))
    }

    async fn is_session_busy(&self, agent: &Agent) -> bool {
        let (Some(server_url), Some(session_id)) = (&agent.server_url, &agent.provider_session_id)
        else {
            return false;
        };
        let resp = match self
            .client
            .get(format!("{server_url}/session/{session_id}"))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(_) => return false,
        };
        let body = match resp.json::<serde_json::Value>().await {
            Ok(body) => body,
            Err(_) => return false,
        };
        body.get("busy").and_then(|b| b.as_bool()).unwrap_or(false)
    }

    /// Pings `GET {serverUrl}/session/{id}` with a short timeout; any 2xx
    /// counts as alive (spec §4.6).
    async fn is_session_alive(&self, agent: &Agent) -> bool {
        let (Some(server_url), Some(session_id)) = (&agent.server_url, &agent.provider_session_id)
        else {
            return false;
        };
        match self
            .client
            .get(format!("{server_url}/session/{session_id}"))
            .timeout(Duration::from_secs(3))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}
