//! Channel lifecycle: listing, joining, custom creation, topics, and the
//! DM/project naming conventions shared with the Agent Registry and Invoker.

use crate::error::{AppError, AppResult};
use crate::events::{EventBus, HubEvent};
use crate::models::{Channel, ChannelType, JoinChannelResponse};
use crate::store::Store;
use std::sync::Arc;

/// `{adjective}` → n/a here; lowercases and replaces `_`/space with `-`
/// (spec §3: project channel naming, §4.4/§4.7 reuse).
pub fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
        .collect()
}

pub struct ChannelManager {
    store: Arc<Store>,
    events: EventBus,
}

impl ChannelManager {
    pub fn new(store: Arc<Store>, events: EventBus) -> Self {
        Self { store, events }
    }

    pub fn list(&self, workspace_id: &str) -> AppResult<Vec<Channel>> {
        self.store.list_channels(workspace_id)
    }

    pub fn join(
        &self,
        channel_id: &str,
        user_id: &str,
    ) -> AppResult<JoinChannelResponse> {
        let joined = self.store.join_channel(channel_id, user_id)?;
        Ok(JoinChannelResponse {
            status: if joined { "joined" } else { "already_member" },
        })
    }

    pub fn create_custom(
        &self,
        name: &str,
        created_by: &str,
        workspace_id: &str,
    ) -> AppResult<Channel> {
        let name = if let Some(stripped) = name.strip_prefix('#') {
            format!("#{stripped}")
        } else {
            format!("#{name}")
        };
        if self.store.find_channel_by_name(workspace_id, &name)?.is_some() {
            return Err(AppError::Validation(format!(
                "channel {name} already exists"
            )));
        }
        let channel = self
            .store
            .create_channel(&name, ChannelType::Custom, None, created_by, workspace_id)?;
        self.events.publish(HubEvent::ChannelCreated(channel.clone()));
        Ok(channel)
    }

    pub fn set_topic(&self, channel_id: &str, topic: Option<&str>) -> AppResult<()> {
        let trimmed = topic.map(|t| t.trim()).filter(|t| !t.is_empty());
        if let Some(t) = trimmed {
            if t.len() > 500 {
                return Err(AppError::Validation(
                    "topic exceeds 500 characters".to_string(),
                ));
            }
        }
        self.store.set_channel_topic(channel_id, trimmed)
    }

    /// Ensures `#project-{slug}` exists for `project_name`, creating it (and
    /// broadcasting `channel_created`) if absent.
    pub fn ensure_project_channel(
        &self,
        project_name: &str,
        project_path: &str,
        created_by: &str,
        workspace_id: &str,
    ) -> AppResult<Channel> {
        let name = format!("#project-{}", slugify(project_name));
        if let Some(existing) = self.store.find_channel_by_name(workspace_id, &name)? {
            return Ok(existing);
        }
        let channel = self.store.create_channel(
            &name,
            ChannelType::Project,
            Some(project_path),
            created_by,
            workspace_id,
        )?;
        self.events.publish(HubEvent::ChannelCreated(channel.clone()));
        Ok(channel)
    }

    /// DM provisioning (spec §4.4): idempotent, auto-adds both parties.
    pub fn ensure_dm_channel(
        &self,
        agent_name: &str,
        initiating_user_id: &str,
        agent_user_id: &str,
        created_by: &str,
        workspace_id: &str,
    ) -> AppResult<Channel> {
        let name = format!("#dm-{agent_name}");
        let channel = match self.store.find_channel_by_name(workspace_id, &name)? {
            Some(c) => c,
            None => {
                let c = self.store.create_channel(
                    &name,
                    ChannelType::Dm,
                    None,
                    created_by,
                    workspace_id,
                )?;
                self.events.publish(HubEvent::ChannelCreated(c.clone()));
                c
            }
        };
        self.store.join_channel(&channel.id, initiating_user_id)?;
        self.store.join_channel(&channel.id, agent_user_id)?;
        Ok(channel)
    }

    pub fn find_by_name(&self, workspace_id: &str, name: &str) -> AppResult<Option<Channel>> {
        self.store.find_channel_by_name(workspace_id, name)
    }

    pub fn find_by_id(&self, id: &str) -> AppResult<Option<Channel>> {
        self.store.find_channel_by_id(id)
    }
}
