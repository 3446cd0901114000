//! Agent Registry: register/reconnect, disconnect, heartbeat, profile
//! updates, and the ghost-liveness cache.

pub mod ghost;
pub mod names;

use crate::channel_manager::ChannelManager;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, HubEvent};
use crate::models::{Agent, AgentStatus, AgentType, RegisterRequest, RegisterResponse, UserType};
use crate::providers;
use crate::store::Store;
use ghost::GhostCache;
use std::path::Path;
use std::sync::Arc;

pub struct AgentRegistry {
    store: Arc<Store>,
    events: EventBus,
    channels: Arc<ChannelManager>,
    config: Arc<AppConfig>,
    pub ghost_cache: GhostCache,
}

impl AgentRegistry {
    pub fn new(
        store: Arc<Store>,
        events: EventBus,
        channels: Arc<ChannelManager>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            events,
            channels,
            config,
            ghost_cache: GhostCache::default(),
        }
    }

    pub fn spawn_ghost_sweep(&self) {
        ghost::spawn_ghost_sweep(
            self.store.clone(),
            self.ghost_cache.clone(),
            self.config.ghost_sweep_interval_secs,
        );
    }

    pub fn register_or_connect(&self, req: &RegisterRequest) -> AppResult<RegisterResponse> {
        let workspace_id = req
            .workspace_id
            .clone()
            .unwrap_or_else(|| crate::store::DEFAULT_WORKSPACE_ID.to_string());
        let project_name = derive_project_name(&req.project_path);

        if let Some(name) = &req.agent_name {
            if let Some(existing) = self.store.find_agent_by_name(name)? {
                return self.reconnect(existing, req, &project_name, &workspace_id);
            }
        }
        self.create(req, &project_name, &workspace_id)
    }

    fn reconnect(
        &self,
        existing: Agent,
        req: &RegisterRequest,
        project_name: &str,
        workspace_id: &str,
    ) -> AppResult<RegisterResponse> {
        let agent_type = existing.agent_type;
        let server_url = match agent_type {
            AgentType::Opencode => req.server_url.clone(),
            _ => None,
        };

        self.store.reconnect_agent(
            &existing.agent_name,
            &req.project_path,
            project_name,
            server_url.as_deref(),
            Some(&req.session_id),
        )?;
        self.store
            .start_session(&existing.user_id, None, None)?;
        providers::mark_session_alive(agent_type, &req.session_id);

        let profile = self
            .store
            .find_agent_by_name(&existing.agent_name)?
            .ok_or_else(|| AppError::NotFound("agent vanished mid-reconnect".to_string()))?;

        let project_channel = self.channels.ensure_project_channel(
            project_name,
            &req.project_path,
            &profile.user_id,
            workspace_id,
        )?;

        self.events.publish(HubEvent::AgentStatus {
            agent: profile.clone(),
            is_ghost: false,
        });

        let (master_prompt, inject_prompt) =
            self.render_prompts(&profile, &project_channel.name);

        Ok(RegisterResponse {
            agent_name: profile.agent_name.clone(),
            master_prompt,
            inject_prompt,
            project_channel: project_channel.name,
            reconnected: true,
            profile,
        })
    }

    fn create(
        &self,
        req: &RegisterRequest,
        project_name: &str,
        workspace_id: &str,
    ) -> AppResult<RegisterResponse> {
        let agent_type = resolve_agent_type(req);
        let agent_name = names::generate_agent_name(&self.store)?;

        let user = self.store.create_user(&agent_name, UserType::Agent)?;
        let server_url = match agent_type {
            AgentType::Opencode => req.server_url.clone(),
            _ => None,
        };
        let agent = self.store.create_agent(
            &user.id,
            &agent_name,
            agent_type,
            &req.project_path,
            project_name,
            server_url.as_deref(),
            Some(&req.session_id),
            workspace_id,
        )?;
        self.store.start_session(&user.id, None, None)?;
        providers::mark_session_alive(agent_type, &req.session_id);

        let project_channel = self.channels.ensure_project_channel(
            project_name,
            &req.project_path,
            &user.id,
            workspace_id,
        )?;
        self.channels.join(&project_channel.id, &user.id)?;

        if let Some(general) = self.channels.find_by_name(workspace_id, "#general")? {
            self.channels.join(&general.id, &user.id)?;
        }

        self.events.publish(HubEvent::AgentStatus {
            agent: agent.clone(),
            is_ghost: false,
        });

        let (master_prompt, inject_prompt) = self.render_prompts(&agent, &project_channel.name);

        Ok(RegisterResponse {
            agent_name,
            master_prompt,
            inject_prompt,
            project_channel: project_channel.name,
            reconnected: false,
            profile: agent,
        })
    }

    pub fn disconnect(&self, agent_name: &str) -> AppResult<()> {
        let agent = self
            .store
            .find_agent_by_name(agent_name)?
            .ok_or_else(|| AppError::NotFound(format!("agent {agent_name} not found")))?;
        self.store.set_agent_status(agent_name, AgentStatus::Offline)?;
        self.store.end_active_sessions(&agent.user_id)?;
        if let Some(session_id) = &agent.provider_session_id {
            providers::mark_session_dead(agent.agent_type, session_id);
        }
        let mut updated = agent;
        updated.status = AgentStatus::Offline;
        self.events.publish(HubEvent::AgentStatus {
            agent: updated,
            is_ghost: true,
        });
        Ok(())
    }

    pub fn heartbeat(&self, agent_name: &str) -> AppResult<()> {
        let agent = self
            .store
            .find_agent_by_name(agent_name)?
            .ok_or_else(|| AppError::NotFound(format!("agent {agent_name} not found")))?;
        self.store.heartbeat(&agent.user_id)
    }

    pub fn update_profile(
        &self,
        agent_name: &str,
        description: Option<&str>,
        personality: Option<&str>,
        current_task: Option<&str>,
        gender: Option<&str>,
    ) -> AppResult<Agent> {
        self.store
            .update_agent_profile(agent_name, description, personality, current_task, gender)?;
        self.store
            .find_agent_by_name(agent_name)?
            .ok_or_else(|| AppError::NotFound(format!("agent {agent_name} not found")))
    }

    pub fn list(&self, workspace_id: &str) -> AppResult<Vec<Agent>> {
        self.store.list_agents(workspace_id)
    }

    /// Renders the two onboarding prompt strings. Templating itself is an
    /// external concern (spec §1 Non-goals); this loads a file from
    /// `PROMPTS_DIR` if present and otherwise falls back to a minimal
    /// built-in template with `{agent_name}`/`{project_channel}` substituted.
    fn render_prompts(&self, agent: &Agent, project_channel: &str) -> (String, String) {
        let master = self
            .load_template("master_prompt.txt")
            .unwrap_or_else(|| {
                format!(
                    "You are {}, registered in the project channel {}.",
                    agent.agent_name, project_channel
                )
            });
        let inject = self.load_template("inject_prompt.txt").unwrap_or_else(|| {
            format!(
                "Welcome back, {}. Your project channel is {}.",
                agent.agent_name, project_channel
            )
        });
        (
            master
                .replace("{agent_name}", &agent.agent_name)
                .replace("{project_channel}", project_channel),
            inject
                .replace("{agent_name}", &agent.agent_name)
                .replace("{project_channel}", project_channel),
        )
    }

    fn load_template(&self, file_name: &str) -> Option<String> {
        let path = Path::new(&self.config.prompts_dir).join(file_name);
        std::fs::read_to_string(path).ok()
    }
}

fn derive_project_name(project_path: &str) -> String {
    Path::new(project_path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(project_path)
        .to_string()
}

/// `agentType="opencode"` auto-discovery probes a conventional local port
/// when omitted; absent a cheap synchronous probe here, an explicit hint (or
/// a supplied `server_url`) is required, else the subprocess-based
/// `claude_code` default applies (spec §4.3 provider hints).
fn resolve_agent_type(req: &RegisterRequest) -> AgentType {
    if let Some(hint) = &req.agent_type {
        if let Some(t) = AgentType::parse(hint) {
            return t;
        }
    }
    if req.server_url.is_some() {
        AgentType::Opencode
    } else {
        AgentType::ClaudeCode
    }
}
