use super::{now, Store};
use crate::error::AppResult;
use crate::models::ReactionAction;
use rusqlite::params;

impl Store {
    /// Toggle a reaction: adding an existing `(message, user, emoji)` triple
    /// is a no-op, removing a missing one is a no-op. Returns the action that
    /// actually took effect, or `None` if nothing changed.
    pub fn react(
        &self,
        message_id: &str,
        user_id: &str,
        emoji: &str,
        action: ReactionAction,
    ) -> AppResult<Option<ReactionAction>> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM message_reactions WHERE message_id = ?1 AND user_id = ?2 AND emoji = ?3",
                params![message_id, user_id, emoji],
                |r| r.get::<_, i64>(0),
            )
            .unwrap_or(0)
            > 0;

        match action {
            ReactionAction::Add => {
                if exists {
                    return Ok(None);
                }
                conn.execute(
                    "INSERT INTO message_reactions (message_id, user_id, emoji, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![message_id, user_id, emoji, now()],
                )?;
                Ok(Some(ReactionAction::Add))
            }
            ReactionAction::Remove => {
                if !exists {
                    return Ok(None);
                }
                conn.execute(
                    "DELETE FROM message_reactions WHERE message_id = ?1 AND user_id = ?2 AND emoji = ?3",
                    params![message_id, user_id, emoji],
                )?;
                Ok(Some(ReactionAction::Remove))
            }
        }
    }

    pub fn reactions_for_message(
        &self,
        message_id: &str,
    ) -> AppResult<Vec<(String, String)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_id, emoji FROM message_reactions WHERE message_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt
            .query_map(params![message_id], |r| Ok((r.get(0)?, r.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}
