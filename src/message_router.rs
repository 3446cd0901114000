//! Message Router: persistence, priority fetch, edit/react/pin/search, and
//! the hand-off to the Invoker on send.

use crate::error::{AppError, AppResult};
use crate::events::{EventBus, HubEvent};
use crate::invoker::Invoker;
use crate::models::{
    Message, PriorityBucket, PriorityMessage, ReactionAction, ReactionEvent,
};
use crate::store::Store;
use std::collections::HashSet;
use std::sync::Arc;

pub struct MessageRouter {
    store: Arc<Store>,
    events: EventBus,
    invoker: Arc<Invoker>,
}

impl MessageRouter {
    pub fn new(store: Arc<Store>, events: EventBus, invoker: Arc<Invoker>) -> Self {
        Self {
            store,
            events,
            invoker,
        }
    }

    /// Persists the message, broadcasts it, then fires the Invoker off in
    /// the background. Reply-context prefixing (spec §4.5) only affects the
    /// text handed to invocations, never the persisted content.
    pub fn send(
        &self,
        channel_id: &str,
        channel_name: &str,
        sender_id: &str,
        sender_name: &str,
        content: &str,
        mentions: Vec<String>,
        parent_id: Option<&str>,
    ) -> AppResult<Message> {
        let message = self
            .store
            .insert_message(channel_id, sender_id, content, &mentions, parent_id)?;
        self.events.publish(HubEvent::NewMessage(message.clone()));

        let invocation_text = match parent_id {
            Some(parent_id) => match self.store.find_message(parent_id)? {
                Some(parent) => format_reply_context(&parent.sender_name, &parent.content, content),
                None => content.to_string(),
            },
            None => content.to_string(),
        };

        self.invoker.invoke_for_message(
            message.id.clone(),
            sender_name.to_string(),
            channel_id.to_string(),
            channel_name.to_string(),
            invocation_text,
            mentions,
            0,
        );

        Ok(message)
    }

    pub fn channel_messages(
        &self,
        channel_id: &str,
        limit: i64,
        before: Option<&str>,
    ) -> AppResult<Vec<Message>> {
        self.store.channel_messages(channel_id, limit, before)
    }

    /// Three tagged queries, application-level dedup (spec §4.5) rather than
    /// one `UNION`/`CASE WHEN` mega-query.
    pub fn priority_fetch(&self, agent_name: &str, limit: i64) -> AppResult<Vec<PriorityMessage>> {
        let limit = limit.clamp(1, 10);
        let agent = self
            .store
            .find_agent_by_name(agent_name)?
            .ok_or_else(|| AppError::NotFound(format!("agent {agent_name} not found")))?;

        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for m in self.store.messages_mentioning(agent_name, limit)? {
            if seen.insert(m.id.clone()) {
                out.push(tag(m, PriorityBucket::Mention));
            }
        }

        let project_channel_name = format!(
            "#project-{}",
            crate::channel_manager::slugify(&agent.project_name)
        );
        if let Some(project_channel) = self
            .store
            .find_channel_by_name(&agent.workspace_id, &project_channel_name)?
        {
            for m in self
                .store
                .recent_channel_messages(&project_channel.id, limit)?
            {
                if out.len() >= limit as usize {
                    break;
                }
                if seen.insert(m.id.clone()) {
                    out.push(tag(m, PriorityBucket::Project));
                }
            }
        }

        for channel_id in self.store.member_channel_ids(&agent.user_id)? {
            if out.len() >= limit as usize {
                break;
            }
            for m in self.store.recent_channel_messages(&channel_id, limit)? {
                if out.len() >= limit as usize {
                    break;
                }
                if seen.insert(m.id.clone()) {
                    out.push(tag(m, PriorityBucket::Other));
                }
            }
        }

        out.truncate(limit as usize);
        Ok(out)
    }

    pub fn edit(&self, message_id: &str, sender_name: &str, content: &str) -> AppResult<Message> {
        let existing = self
            .store
            .find_message(message_id)?
            .ok_or_else(|| AppError::NotFound("message not found".to_string()))?;
        if existing.sender_name != sender_name {
            return Err(AppError::Ownership);
        }
        let updated = self.store.edit_message(message_id, content)?;
        self.events.publish(HubEvent::MessageEdited(updated.clone()));
        Ok(updated)
    }

    pub fn react(
        &self,
        message_id: &str,
        user_id: &str,
        user_name: &str,
        emoji: &str,
    ) -> AppResult<ReactionEvent> {
        let message = self
            .store
            .find_message(message_id)?
            .ok_or_else(|| AppError::NotFound("message not found".to_string()))?;

        let existing = self
            .store
            .reactions_for_message(message_id)?
            .into_iter()
            .any(|(uid, e)| uid == user_id && e == emoji);

        let action = if existing {
            ReactionAction::Remove
        } else {
            ReactionAction::Add
        };
        self.store.react(message_id, user_id, emoji, action)?;

        let event = ReactionEvent {
            message_id: message_id.to_string(),
            channel_id: message.channel_id,
            user_name: user_name.to_string(),
            emoji: emoji.to_string(),
            action,
        };
        self.events.publish(HubEvent::Reaction(event.clone()));
        Ok(event)
    }

    pub fn set_pinned(
        &self,
        message_id: &str,
        pinned: bool,
        pinned_by: Option<&str>,
    ) -> AppResult<Message> {
        let updated = self.store.set_pinned(message_id, pinned, pinned_by)?;
        self.events.publish(HubEvent::MessageEdited(updated.clone()));
        Ok(updated)
    }

    pub fn list_pinned(&self, channel_id: &str) -> AppResult<Vec<Message>> {
        self.store.list_pinned(channel_id)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn search(
        &self,
        query: &str,
        channel_id: Option<&str>,
        sender_id: Option<&str>,
        after: Option<&str>,
        before: Option<&str>,
        limit: Option<i64>,
    ) -> AppResult<Vec<Message>> {
        let limit = limit.unwrap_or(50).clamp(1, 50);
        self.store
            .search_messages(query, channel_id, sender_id, after, before, limit)
    }

    pub fn delete(&self, message_id: &str, sender_name: &str) -> AppResult<()> {
        let existing = self
            .store
            .find_message(message_id)?
            .ok_or_else(|| AppError::NotFound("message not found".to_string()))?;
        if existing.sender_name != sender_name {
            return Err(AppError::Ownership);
        }
        self.store.delete_message(message_id)?;
        self.events.publish(HubEvent::MessageDeleted {
            id: message_id.to_string(),
            channel_id: existing.channel_id,
        });
        Ok(())
    }
}

fn tag(message: Message, priority: PriorityBucket) -> PriorityMessage {
    PriorityMessage { message, priority }
}

/// `[Replying to {sender}: "{first 200 chars}"]\n\n{content}` (spec §4.5).
fn format_reply_context(parent_sender: &str, parent_content: &str, content: &str) -> String {
    let truncated: String = parent_content.chars().take(200).collect();
    format!("[Replying to {parent_sender}: \"{truncated}\"]\n\n{content}")
}
