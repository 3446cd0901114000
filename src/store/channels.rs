use super::{new_id, now, Store};
use crate::error::{AppError, AppResult};
use crate::models::{Channel, ChannelType};
use rusqlite::{params, OptionalExtension, Row};

fn row_to_channel(row: &Row) -> rusqlite::Result<Channel> {
    let channel_type: String = row.get(2)?;
    Ok(Channel {
        id: row.get(0)?,
        name: row.get(1)?,
        channel_type: match channel_type.as_str() {
            "project" => ChannelType::Project,
            "custom" => ChannelType::Custom,
            "dm" => ChannelType::Dm,
            _ => ChannelType::General,
        },
        topic: row.get(3)?,
        project_path: row.get(4)?,
        created_by: row.get(5)?,
        created_at: row.get(6)?,
        is_archived: row.get::<_, i64>(7)? != 0,
        archived_at: row.get(8)?,
        workspace_id: row.get(9)?,
    })
}

const SELECT_CHANNEL: &str = "SELECT id, name, channel_type, topic, project_path, created_by, \
     created_at, is_archived, archived_at, workspace_id FROM channels";

fn channel_type_str(t: ChannelType) -> &'static str {
    match t {
        ChannelType::General => "general",
        ChannelType::Project => "project",
        ChannelType::Custom => "custom",
        ChannelType::Dm => "dm",
    }
}

impl Store {
    pub fn find_channel_by_name(
        &self,
        workspace_id: &str,
        name: &str,
    ) -> AppResult<Option<Channel>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{SELECT_CHANNEL} WHERE workspace_id = ?1 AND name = ?2"),
            params![workspace_id, name],
            row_to_channel,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn find_channel_by_id(&self, id: &str) -> AppResult<Option<Channel>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{SELECT_CHANNEL} WHERE id = ?1"),
            params![id],
            row_to_channel,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn list_channels(&self, workspace_id: &str) -> AppResult<Vec<Channel>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{SELECT_CHANNEL} WHERE workspace_id = ?1 AND is_archived = 0 ORDER BY name"
        ))?;
        let rows = stmt
            .query_map(params![workspace_id], row_to_channel)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn create_channel(
        &self,
        name: &str,
        channel_type: ChannelType,
        project_path: Option<&str>,
        created_by: &str,
        workspace_id: &str,
    ) -> AppResult<Channel> {
        let conn = self.conn();
        let id = new_id();
        let ts = now();
        conn.execute(
            "INSERT INTO channels (id, name, channel_type, project_path, created_by, created_at, is_archived, workspace_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
            params![&id, name, channel_type_str(channel_type), project_path, created_by, &ts, workspace_id],
        )?;
        Ok(Channel {
            id,
            name: name.to_string(),
            channel_type,
            topic: None,
            project_path: project_path.map(String::from),
            created_by: created_by.to_string(),
            created_at: ts,
            is_archived: false,
            archived_at: None,
            workspace_id: workspace_id.to_string(),
        })
    }

    pub fn set_channel_topic(&self, channel_id: &str, topic: Option<&str>) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE channels SET topic = ?1 WHERE id = ?2",
            params![topic, channel_id],
        )?;
        Ok(())
    }

    pub fn join_channel(&self, channel_id: &str, user_id: &str) -> AppResult<bool> {
        let conn = self.conn();
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM channel_members WHERE channel_id = ?1 AND user_id = ?2",
                params![channel_id, user_id],
                |r| r.get::<_, i64>(0),
            )
            .unwrap_or(0)
            > 0;
        if already {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO channel_members (channel_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
            params![channel_id, user_id, now()],
        )?;
        Ok(true)
    }

    pub fn is_channel_member(&self, channel_id: &str, user_id: &str) -> AppResult<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM channel_members WHERE channel_id = ?1 AND user_id = ?2",
            params![channel_id, user_id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn member_channel_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT channel_id FROM channel_members WHERE user_id = ?1")?;
        let rows = stmt
            .query_map(params![user_id], |r| r.get(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}
