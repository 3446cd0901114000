//! The Invoker: fire-and-forget orchestration of agent invocations,
//! including `@all` expansion, reply threading, the chain-depth cap, and
//! self-invocation guards (spec §4.7 — "the hardest subsystem").

use crate::config::AppConfig;
use crate::events::{EventBus, HubEvent};
use crate::models::AgentType;
use crate::providers::{self, PromptCallbacks};
use crate::store::Store;
use regex::Regex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::task::JoinHandle;

pub const MAX_CHAIN_DEPTH: u8 = 5;

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([\w-]+)").expect("valid mention regex"))
}

struct Target {
    agent_name: String,
    silent_until_confirmed: bool,
}

pub struct Invoker {
    store: Arc<Store>,
    events: EventBus,
    config: Arc<AppConfig>,
    tasks: Mutex<std::collections::HashMap<u64, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl Invoker {
    pub fn new(store: Arc<Store>, events: EventBus, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            events,
            config,
            tasks: Mutex::new(std::collections::HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Returns immediately; the actual work runs in a background task kept
    /// alive by `tasks` until it completes (spec §4.7 — fire-and-forget).
    #[allow(clippy::too_many_arguments)]
    pub fn invoke_for_message(
        self: &Arc<Self>,
        message_id: String,
        sender_name: String,
        channel_id: String,
        channel_name: String,
        content: String,
        mentions: Vec<String>,
        depth: u8,
    ) {
        if depth >= self.config.max_chain_depth {
            return;
        }
        let me = Arc::clone(self);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = tokio::spawn(async move {
            me.run(message_id, sender_name, channel_id, channel_name, content, mentions, depth)
                .await;
            me.tasks
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&id);
        });
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, handle);
    }

    #[allow(clippy::too_many_arguments)]
    async fn run(
        self: Arc<Self>,
        message_id: String,
        sender_name: String,
        channel_id: String,
        channel_name: String,
        content: String,
        mentions: Vec<String>,
        depth: u8,
    ) {
        let workspace_id = match self.store.find_channel_by_id(&channel_id) {
            Ok(Some(c)) => c.workspace_id,
            _ => return,
        };

        let targets = match self.resolve_targets(
            &sender_name,
            &channel_name,
            &mentions,
            &workspace_id,
        ) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("invoker: target resolution failed: {e}");
                return;
            }
        };

        let is_dm = channel_name.starts_with("#dm-");
        let recent = if is_dm {
            Vec::new()
        } else {
            // Excludes the triggering message itself — it is already
            // appended as the trailing line in `build_mention_prompt`.
            self.store
                .recent_channel_messages(&channel_id, 6)
                .unwrap_or_default()
                .into_iter()
                .filter(|m| m.id != message_id)
                .take(5)
                .collect()
        };

        let futures: Vec<_> = targets
            .into_iter()
            .map(|target| {
                let me = Arc::clone(&self);
                let sender_name = sender_name.clone();
                let channel_id = channel_id.clone();
                let channel_name = channel_name.clone();
                let content = content.clone();
                let recent = recent.clone();
                async move {
                    Self::invoke_one(me, target, sender_name, channel_id, channel_name, content, recent, depth)
                        .await;
                }
            })
            .collect();

        futures::future::join_all(futures).await;
    }

    fn resolve_targets(
        &self,
        sender_name: &str,
        channel_name: &str,
        mentions: &[String],
        workspace_id: &str,
    ) -> crate::error::AppResult<Vec<Target>> {
        let is_dm = channel_name.starts_with("#dm-");
        let dm_target = is_dm.then(|| channel_name["#dm-".len()..].to_string());

        let mut seen = HashSet::new();
        let mut targets = Vec::new();

        if let Some(dm) = &dm_target {
            if dm != sender_name {
                seen.insert(dm.clone());
                targets.push(Target {
                    agent_name: dm.clone(),
                    silent_until_confirmed: false,
                });
            }
        }

        for m in mentions.iter().filter(|m| m.as_str() != "all") {
            if m == sender_name {
                continue;
            }
            if dm_target.as_deref() == Some(m.as_str()) {
                continue;
            }
            if seen.insert(m.clone()) {
                targets.push(Target {
                    agent_name: m.clone(),
                    silent_until_confirmed: false,
                });
            }
        }

        if !is_dm && mentions.iter().any(|m| m == "all") {
            let slug_scope = channel_name
                .strip_prefix("#project-")
                .map(str::to_string);
            for agent in self.store.list_agents(workspace_id)? {
                if agent.agent_name == sender_name {
                    continue;
                }
                if agent.agent_type == AgentType::System || !agent.is_invocable() {
                    continue;
                }
                if let Some(slug) = &slug_scope {
                    if &crate::channel_manager::slugify(&agent.project_name) != slug {
                        continue;
                    }
                }
                if seen.insert(agent.agent_name.clone()) {
                    targets.push(Target {
                        agent_name: agent.agent_name,
                        silent_until_confirmed: true,
                    });
                }
            }
        }

        Ok(targets)
    }

    #[allow(clippy::too_many_arguments)]
    async fn invoke_one(
        this: Arc<Self>,
        target: Target,
        sender_name: String,
        channel_id: String,
        channel_name: String,
        content: String,
        recent: Vec<crate::models::Message>,
        depth: u8,
    ) {
        let agent = match this.store.find_agent_by_name(&target.agent_name) {
            Ok(Some(a)) if a.is_invocable() => a,
            _ => {
                if !target.silent_until_confirmed {
                    this.emit_typing_stop(
                        &target.agent_name,
                        &channel_id,
                        Some(format!("{} is not reachable", target.agent_name)),
                    );
                }
                return;
            }
        };

        let adapter = providers::adapter_for(agent.agent_type);

        if target.silent_until_confirmed {
            if !adapter.is_session_alive(&agent).await {
                return;
            }
        }
        this.emit_typing(&target.agent_name, &channel_id, true, None);

        if adapter.is_session_busy(&agent).await {
            tracing::warn!("invoker: {} session is busy, proceeding anyway", agent.agent_name);
        }

        let prompt_text = if channel_name.starts_with("#dm-") {
            content.clone()
        } else {
            build_mention_prompt(&sender_name, &channel_name, &content, &recent)
        };

        let events = this.events.clone();
        let typing_agent = target.agent_name.clone();
        let typing_channel = channel_id.clone();
        let callbacks = PromptCallbacks {
            on_typing_start: Box::new({
                let events = events.clone();
                let agent_name = typing_agent.clone();
                let channel_id = typing_channel.clone();
                move || {
                    events.publish(HubEvent::AgentTyping {
                        agent_name: agent_name.clone(),
                        channel_id: channel_id.clone(),
                        typing: true,
                        error: None,
                    });
                }
            }),
            on_text_delta: Box::new({
                let events = events.clone();
                let agent_name = typing_agent.clone();
                let channel_id = typing_channel.clone();
                move |delta: &str| {
                    events.publish(HubEvent::AgentStreaming {
                        agent_name: agent_name.clone(),
                        channel_id: channel_id.clone(),
                        delta: delta.to_string(),
                    });
                }
            }),
        };

        match adapter.prompt(&agent, &prompt_text, callbacks).await {
            Ok(Some(outcome)) => {
                let extracted = this.extract_response_mentions(&outcome.text, &agent.agent_name);
                let message = match this.store.insert_message(
                    &channel_id,
                    &agent.user_id,
                    &outcome.text,
                    &extracted,
                    None,
                ) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::error!("invoker: failed to persist response: {e}");
                        return;
                    }
                };
                this.events.publish(HubEvent::NewMessage(message));
                this.emit_typing(&target.agent_name, &channel_id, false, None);

                if !extracted.is_empty() {
                    if depth + 1 < this.config.max_chain_depth {
                        this.invoke_for_message(
                            message.id.clone(),
                            agent.agent_name.clone(),
                            channel_id.clone(),
                            channel_name.clone(),
                            outcome.text.clone(),
                            extracted,
                            depth + 1,
                        );
                    } else {
                        tracing::info!(
                            "invoker: chain depth cap reached for {} in {}",
                            agent.agent_name,
                            channel_name
                        );
                    }
                }
            }
            Ok(None) => {
                this.emit_typing(
                    &target.agent_name,
                    &channel_id,
                    false,
                    Some(format!("{} did not respond", agent.agent_name)),
                );
            }
            Err(e) => {
                tracing::error!("invoker: adapter error for {}: {e}", agent.agent_name);
                this.emit_typing(
                    &target.agent_name,
                    &channel_id,
                    false,
                    Some(format!("{} encountered an error", agent.agent_name)),
                );
            }
        }
    }

    fn emit_typing(&self, agent_name: &str, channel_id: &str, typing: bool, error: Option<String>) {
        self.events.publish(HubEvent::AgentTyping {
            agent_name: agent_name.to_string(),
            channel_id: channel_id.to_string(),
            typing,
            error,
        });
    }

    fn emit_typing_stop(&self, agent_name: &str, channel_id: &str, error: Option<String>) {
        self.emit_typing(agent_name, channel_id, false, error);
    }

    /// Scans for `@name` tokens, keeps only registered agent names, and
    /// drops the responding agent itself (spec §4.7).
    fn extract_response_mentions(&self, text: &str, responding_agent: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for cap in mention_regex().captures_iter(text) {
            let name = &cap[1];
            if name == responding_agent || !seen.insert(name.to_string()) {
                continue;
            }
            if matches!(self.store.find_agent_by_name(name), Ok(Some(_))) {
                out.push(name.to_string());
            }
        }
        out
    }

    pub async fn shutdown(&self) {
        let handles: Vec<_> = self
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .map(|(_, h)| h)
            .collect();
        for h in handles {
            h.abort();
        }
    }
}

/// `"[TalkTo] {sender} mentioned you in {channel}."` plus up to 5 lines of
/// recent channel context, then the triggering line (spec §4.7).
fn build_mention_prompt(
    sender_name: &str,
    channel_name: &str,
    content: &str,
    recent: &[crate::models::Message],
) -> String {
    let mut out = format!("[TalkTo] {sender_name} mentioned you in {channel_name}.\n\n");
    if !recent.is_empty() {
        out.push_str("Recent messages in the channel:\n");
        for m in recent.iter().rev() {
            out.push_str(&format!("  {}: {}\n", m.sender_name, m.content));
        }
        out.push('\n');
    }
    out.push_str(&format!("{sender_name}: {content}"));
    out
}
