use super::Store;
use crate::error::{AppError, AppResult};
use crate::models::{Agent, AgentStatus, AgentType};
use rusqlite::{params, OptionalExtension, Row};

fn row_to_agent(row: &Row) -> rusqlite::Result<Agent> {
    let agent_type: String = row.get(2)?;
    let status: String = row.get(5)?;
    Ok(Agent {
        user_id: row.get(0)?,
        agent_name: row.get(1)?,
        agent_type: AgentType::parse(&agent_type).unwrap_or(AgentType::System),
        project_path: row.get(3)?,
        project_name: row.get(4)?,
        status: if status == "online" {
            AgentStatus::Online
        } else {
            AgentStatus::Offline
        },
        description: row.get(6)?,
        personality: row.get(7)?,
        current_task: row.get(8)?,
        gender: row.get(9)?,
        server_url: row.get(10)?,
        provider_session_id: row.get(11)?,
        workspace_id: row.get(12)?,
    })
}

const SELECT_AGENT: &str = "SELECT user_id, agent_name, agent_type, project_path, project_name, \
     status, description, personality, current_task, gender, server_url, \
     provider_session_id, workspace_id FROM agents";

impl Store {
    pub fn find_agent_by_name(&self, agent_name: &str) -> AppResult<Option<Agent>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{SELECT_AGENT} WHERE agent_name = ?1"),
            params![agent_name],
            row_to_agent,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn find_agent_by_user_id(&self, user_id: &str) -> AppResult<Option<Agent>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{SELECT_AGENT} WHERE user_id = ?1"),
            params![user_id],
            row_to_agent,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn agent_name_exists(&self, agent_name: &str) -> AppResult<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM agents WHERE agent_name = ?1",
            params![agent_name],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn list_agents(&self, workspace_id: &str) -> AppResult<Vec<Agent>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("{SELECT_AGENT} WHERE workspace_id = ?1 ORDER BY agent_name"))?;
        let rows = stmt
            .query_map(params![workspace_id], row_to_agent)?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_agent(
        &self,
        user_id: &str,
        agent_name: &str,
        agent_type: AgentType,
        project_path: &str,
        project_name: &str,
        server_url: Option<&str>,
        provider_session_id: Option<&str>,
        workspace_id: &str,
    ) -> AppResult<Agent> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO agents (user_id, agent_name, agent_type, project_path, project_name, \
             status, server_url, provider_session_id, workspace_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, 'online', ?6, ?7, ?8)",
            params![
                user_id,
                agent_name,
                agent_type.as_str(),
                project_path,
                project_name,
                server_url,
                provider_session_id,
                workspace_id
            ],
        )?;
        Ok(Agent {
            user_id: user_id.to_string(),
            agent_name: agent_name.to_string(),
            agent_type,
            project_path: project_path.to_string(),
            project_name: project_name.to_string(),
            status: AgentStatus::Online,
            description: None,
            personality: None,
            current_task: None,
            gender: None,
            server_url: server_url.map(String::from),
            provider_session_id: provider_session_id.map(String::from),
            workspace_id: workspace_id.to_string(),
        })
    }

    /// Reconnect: update session credentials and bring the agent online
    /// (spec §4.3 point 1).
    pub fn reconnect_agent(
        &self,
        agent_name: &str,
        project_path: &str,
        project_name: &str,
        server_url: Option<&str>,
        provider_session_id: Option<&str>,
    ) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE agents SET project_path = ?1, project_name = ?2, server_url = ?3, \
             provider_session_id = ?4, status = 'online' WHERE agent_name = ?5",
            params![
                project_path,
                project_name,
                server_url,
                provider_session_id,
                agent_name
            ],
        )?;
        Ok(())
    }

    pub fn set_agent_status(&self, agent_name: &str, status: AgentStatus) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE agents SET status = ?1 WHERE agent_name = ?2",
            params![status.as_str(), agent_name],
        )?;
        Ok(())
    }

    pub fn update_agent_profile(
        &self,
        agent_name: &str,
        description: Option<&str>,
        personality: Option<&str>,
        current_task: Option<&str>,
        gender: Option<&str>,
    ) -> AppResult<()> {
        let conn = self.conn();
        if let Some(v) = description {
            conn.execute(
                "UPDATE agents SET description = ?1 WHERE agent_name = ?2",
                params![v, agent_name],
            )?;
        }
        if let Some(v) = personality {
            conn.execute(
                "UPDATE agents SET personality = ?1 WHERE agent_name = ?2",
                params![v, agent_name],
            )?;
        }
        if let Some(v) = current_task {
            conn.execute(
                "UPDATE agents SET current_task = ?1 WHERE agent_name = ?2",
                params![v, agent_name],
            )?;
        }
        if let Some(v) = gender {
            conn.execute(
                "UPDATE agents SET gender = ?1 WHERE agent_name = ?2",
                params![v, agent_name],
            )?;
        }
        Ok(())
    }
}
