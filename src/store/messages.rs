use super::{new_id, now, upsert_fts, Store};
use crate::error::{AppError, AppResult};
use crate::models::{Message, UserType};
use rusqlite::{params, OptionalExtension, Row};

fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
    let mentions_json: String = row.get(6)?;
    let sender_type: String = row.get(4)?;
    Ok(Message {
        id: row.get(0)?,
        channel_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_name: row.get(3)?,
        sender_type: if sender_type == "human" {
            UserType::Human
        } else {
            UserType::Agent
        },
        content: row.get(5)?,
        mentions: serde_json::from_str(&mentions_json).unwrap_or_default(),
        parent_id: row.get(7)?,
        is_pinned: row.get::<_, i64>(8)? != 0,
        pinned_at: row.get(9)?,
        pinned_by: row.get(10)?,
        edited_at: row.get(11)?,
        created_at: row.get(12)?,
        seq: row.get(13)?,
    })
}

const SELECT_MESSAGE: &str = "SELECT m.id, m.channel_id, m.sender_id, u.name, u.type, m.content, \
     m.mentions, m.parent_id, m.is_pinned, m.pinned_at, m.pinned_by, m.edited_at, \
     m.created_at, m.seq FROM messages m JOIN users u ON m.sender_id = u.id";

impl Store {
    #[allow(clippy::too_many_arguments)]
    pub fn insert_message(
        &self,
        channel_id: &str,
        sender_id: &str,
        content: &str,
        mentions: &[String],
        parent_id: Option<&str>,
    ) -> AppResult<Message> {
        if let Some(parent) = parent_id {
            let conn = self.conn();
            let parent_channel: Option<String> = conn
                .query_row(
                    "SELECT channel_id FROM messages WHERE id = ?1",
                    params![parent],
                    |r| r.get(0),
                )
                .optional()?;
            match parent_channel {
                Some(pc) if pc == channel_id => {}
                Some(_) => {
                    return Err(AppError::Validation(
                        "parent message must be in the same channel".to_string(),
                    ))
                }
                None => return Err(AppError::NotFound("parent message not found".to_string())),
            }
        }

        let conn = self.conn();
        let id = new_id();
        let ts = now();
        let mentions_json = serde_json::to_string(mentions).unwrap_or_else(|_| "[]".to_string());
        let next_seq: i64 = conn
            .query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM messages", [], |r| {
                r.get(0)
            })
            .unwrap_or(1);

        conn.execute(
            "INSERT INTO messages (id, channel_id, sender_id, content, mentions, parent_id, \
             is_pinned, created_at, seq) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
            params![&id, channel_id, sender_id, content, &mentions_json, parent_id, &ts, next_seq],
        )?;
        upsert_fts(&conn, &id);

        let (sender_name, sender_type_str): (String, String) = conn.query_row(
            "SELECT name, type FROM users WHERE id = ?1",
            params![sender_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        Ok(Message {
            id,
            channel_id: channel_id.to_string(),
            sender_id: sender_id.to_string(),
            sender_name,
            sender_type: if sender_type_str == "human" {
                UserType::Human
            } else {
                UserType::Agent
            },
            content: content.to_string(),
            mentions: mentions.to_vec(),
            parent_id: parent_id.map(String::from),
            is_pinned: false,
            pinned_at: None,
            pinned_by: None,
            edited_at: None,
            created_at: ts,
            seq: next_seq,
        })
    }

    pub fn find_message(&self, id: &str) -> AppResult<Option<Message>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{SELECT_MESSAGE} WHERE m.id = ?1"),
            params![id],
            row_to_message,
        )
        .optional()
        .map_err(AppError::from)
    }

    /// Cursor-paginated channel read (spec §4.9: `before=messageId`).
    pub fn channel_messages(
        &self,
        channel_id: &str,
        limit: i64,
        before: Option<&str>,
    ) -> AppResult<Vec<Message>> {
        let conn = self.conn();
        let before_seq: Option<i64> = match before {
            Some(id) => Some(
                conn.query_row(
                    "SELECT seq FROM messages WHERE id = ?1",
                    params![id],
                    |r| r.get(0),
                )
                .optional()?
                .ok_or_else(|| AppError::NotFound("cursor message not found".to_string()))?,
            ),
            None => None,
        };

        let sql = match before_seq {
            Some(_) => format!(
                "{SELECT_MESSAGE} WHERE m.channel_id = ?1 AND m.seq < ?2 ORDER BY m.seq DESC LIMIT ?3"
            ),
            None => format!("{SELECT_MESSAGE} WHERE m.channel_id = ?1 ORDER BY m.seq DESC LIMIT ?2"),
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = if let Some(seq) = before_seq {
            stmt.query_map(params![channel_id, seq, limit], row_to_message)?
                .filter_map(|r| r.ok())
                .collect()
        } else {
            stmt.query_map(params![channel_id, limit], row_to_message)?
                .filter_map(|r| r.ok())
                .collect()
        };
        Ok(rows)
    }

    /// Messages whose `mentions` list contains `agent_name` (spec §4.5 bucket 1).
    pub fn messages_mentioning(&self, agent_name: &str, limit: i64) -> AppResult<Vec<Message>> {
        let conn = self.conn();
        let pattern = format!("%\"{}\"%", agent_name.replace('\\', "\\\\").replace('"', "\\\""));
        let mut stmt = conn.prepare(&format!(
            "{SELECT_MESSAGE} WHERE m.mentions LIKE ?1 ESCAPE '\\' ORDER BY m.seq DESC LIMIT ?2"
        ))?;
        let rows = stmt
            .query_map(params![pattern, limit], row_to_message)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn recent_channel_messages(&self, channel_id: &str, limit: i64) -> AppResult<Vec<Message>> {
        self.channel_messages(channel_id, limit, None)
    }

    /// Filtered read for export (spec §4.9 channel export): timestamp range and
    /// sender name, unpaginated aside from `limit`.
    pub fn export_messages(
        &self,
        channel_id: &str,
        after: Option<&str>,
        before: Option<&str>,
        sender: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<Message>> {
        let conn = self.conn();
        let mut conditions = vec!["m.channel_id = ?1".to_string()];
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(channel_id.to_string())];

        if let Some(after) = after {
            conditions.push(format!("m.created_at > ?{}", values.len() + 1));
            values.push(Box::new(after.to_string()));
        }
        if let Some(before) = before {
            conditions.push(format!("m.created_at < ?{}", values.len() + 1));
            values.push(Box::new(before.to_string()));
        }
        if let Some(sender) = sender {
            conditions.push(format!("u.name = ?{}", values.len() + 1));
            values.push(Box::new(sender.to_string()));
        }

        let sql = format!(
            "{SELECT_MESSAGE} WHERE {where} ORDER BY m.seq ASC LIMIT ?{limit_idx}",
            where = conditions.join(" AND "),
            limit_idx = values.len() + 1,
        );
        let bound: Vec<&dyn rusqlite::types::ToSql> = values
            .iter()
            .map(|v| v.as_ref())
            .chain(std::iter::once(&limit as &dyn rusqlite::types::ToSql))
            .collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(bound.as_slice(), row_to_message)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn edit_message(&self, id: &str, content: &str) -> AppResult<Message> {
        let conn = self.conn();
        conn.execute(
            "UPDATE messages SET content = ?1, edited_at = ?2 WHERE id = ?3",
            params![content, now(), id],
        )?;
        upsert_fts(&conn, id);
        drop(conn);
        self.find_message(id)?
            .ok_or_else(|| AppError::NotFound("message not found".to_string()))
    }

    pub fn delete_message(&self, id: &str) -> AppResult<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
        super::delete_fts(&conn, id);
        Ok(())
    }

    pub fn set_pinned(
        &self,
        id: &str,
        pinned: bool,
        pinned_by: Option<&str>,
    ) -> AppResult<Message> {
        let conn = self.conn();
        if pinned {
            conn.execute(
                "UPDATE messages SET is_pinned = 1, pinned_at = ?1, pinned_by = ?2 WHERE id = ?3",
                params![now(), pinned_by, id],
            )?;
        } else {
            conn.execute(
                "UPDATE messages SET is_pinned = 0, pinned_at = NULL, pinned_by = NULL WHERE id = ?1",
                params![id],
            )?;
        }
        drop(conn);
        self.find_message(id)?
            .ok_or_else(|| AppError::NotFound("message not found".to_string()))
    }

    pub fn list_pinned(&self, channel_id: &str) -> AppResult<Vec<Message>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{SELECT_MESSAGE} WHERE m.channel_id = ?1 AND m.is_pinned = 1 ORDER BY m.pinned_at DESC"
        ))?;
        let rows = stmt
            .query_map(params![channel_id], row_to_message)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Substring search (spec §4.5), capped at 50. Tries the FTS5 index
    /// first (fast, ranked) and falls back to a `LIKE` scan whenever FTS
    /// comes back empty or errors, since FTS5's token matching can't find a
    /// bare substring like "ell" inside "hello".
    #[allow(clippy::too_many_arguments)]
    pub fn search_messages(
        &self,
        query: &str,
        channel_id: Option<&str>,
        sender_id: Option<&str>,
        after: Option<&str>,
        before: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<Message>> {
        let fts = self.search_messages_fts(query, channel_id, sender_id, after, before, limit);
        match fts {
            Ok(rows) if !rows.is_empty() => Ok(rows),
            _ => self.search_messages_like(query, channel_id, sender_id, after, before, limit),
        }
    }

    fn search_messages_fts(
        &self,
        query: &str,
        channel_id: Option<&str>,
        sender_id: Option<&str>,
        after: Option<&str>,
        before: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<Message>> {
        let conn = self.conn();
        let mut sql = format!(
            "{SELECT_MESSAGE} JOIN messages_fts f ON f.message_id = m.id WHERE f.content MATCH ?1"
        );
        let mut idx = 2;
        let mut values: Vec<String> = vec![fts_query(query)];

        if let Some(c) = channel_id {
            sql.push_str(&format!(" AND m.channel_id = ?{idx}"));
            values.push(c.to_string());
            idx += 1;
        }
        if let Some(s) = sender_id {
            sql.push_str(&format!(" AND m.sender_id = ?{idx}"));
            values.push(s.to_string());
            idx += 1;
        }
        if let Some(a) = after {
            sql.push_str(&format!(" AND m.created_at > ?{idx}"));
            values.push(a.to_string());
            idx += 1;
        }
        if let Some(b) = before {
            sql.push_str(&format!(" AND m.created_at < ?{idx}"));
            values.push(b.to_string());
            idx += 1;
        }
        sql.push_str(&format!(" ORDER BY rank LIMIT ?{idx}"));
        values.push(limit.to_string());

        let mut stmt = conn.prepare(&sql)?;
        let refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(|v| v as &dyn rusqlite::types::ToSql).collect();
        let rows = stmt
            .query_map(refs.as_slice(), row_to_message)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    /// Plain substring fallback (teacher's `routes/search.rs` LIKE path),
    /// escaping `%`/`_` so user input can't inject wildcard semantics.
    fn search_messages_like(
        &self,
        query: &str,
        channel_id: Option<&str>,
        sender_id: Option<&str>,
        after: Option<&str>,
        before: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<Message>> {
        let conn = self.conn();
        let escaped = query.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let mut sql = format!("{SELECT_MESSAGE} WHERE m.content LIKE ?1 ESCAPE '\\'");
        let mut idx = 2;
        let mut values: Vec<String> = vec![format!("%{escaped}%")];

        if let Some(c) = channel_id {
            sql.push_str(&format!(" AND m.channel_id = ?{idx}"));
            values.push(c.to_string());
            idx += 1;
        }
        if let Some(s) = sender_id {
            sql.push_str(&format!(" AND m.sender_id = ?{idx}"));
            values.push(s.to_string());
            idx += 1;
        }
        if let Some(a) = after {
            sql.push_str(&format!(" AND m.created_at > ?{idx}"));
            values.push(a.to_string());
            idx += 1;
        }
        if let Some(b) = before {
            sql.push_str(&format!(" AND m.created_at < ?{idx}"));
            values.push(b.to_string());
            idx += 1;
        }
        sql.push_str(&format!(" ORDER BY m.created_at DESC LIMIT ?{idx}"));
        values.push(limit.to_string());

        let mut stmt = conn.prepare(&sql)?;
        let refs: Vec<&dyn rusqlite::types::ToSql> =
            values.iter().map(|v| v as &dyn rusqlite::types::ToSql).collect();
        let rows = stmt
            .query_map(refs.as_slice(), row_to_message)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}

/// FTS5 MATCH needs plain substring tokens quoted to avoid query-syntax
/// characters in user input being parsed as FTS operators.
fn fts_query(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}
