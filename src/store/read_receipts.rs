use super::{now, Store};
use crate::error::AppResult;
use rusqlite::{params, OptionalExtension};

impl Store {
    pub fn mark_read(&self, user_id: &str, channel_id: &str) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO read_receipts (user_id, channel_id, last_read_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id, channel_id) DO UPDATE SET last_read_at = excluded.last_read_at",
            params![user_id, channel_id, now()],
        )?;
        Ok(())
    }

    pub fn last_read_at(&self, user_id: &str, channel_id: &str) -> AppResult<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT last_read_at FROM read_receipts WHERE user_id = ?1 AND channel_id = ?2",
            params![user_id, channel_id],
            |r| r.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn unread_count(&self, user_id: &str, channel_id: &str) -> AppResult<i64> {
        let conn = self.conn();
        let last_read: Option<String> = conn
            .query_row(
                "SELECT last_read_at FROM read_receipts WHERE user_id = ?1 AND channel_id = ?2",
                params![user_id, channel_id],
                |r| r.get(0),
            )
            .optional()?;
        let count = match last_read {
            Some(ts) => conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE channel_id = ?1 AND created_at > ?2",
                params![channel_id, ts],
                |r| r.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE channel_id = ?1",
                params![channel_id],
                |r| r.get(0),
            )?,
        };
        Ok(count)
    }
}
