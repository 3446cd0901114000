use super::{new_id, now, Store};
use crate::error::{AppError, AppResult};
use crate::models::{Workspace, WorkspaceApiKey, WorkspaceInvite, WorkspaceRole};
use rusqlite::{params, OptionalExtension, Row};

fn role_str(role: WorkspaceRole) -> &'static str {
    match role {
        WorkspaceRole::Admin => "admin",
        WorkspaceRole::Member => "member",
    }
}

fn role_parse(s: &str) -> WorkspaceRole {
    if s == "admin" {
        WorkspaceRole::Admin
    } else {
        WorkspaceRole::Member
    }
}

fn row_to_workspace(row: &Row) -> rusqlite::Result<Workspace> {
    Ok(Workspace {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn row_to_api_key(row: &Row) -> rusqlite::Result<WorkspaceApiKey> {
    Ok(WorkspaceApiKey {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        token_prefix: row.get(2)?,
        created_by: row.get(3)?,
        created_at: row.get(4)?,
        revoked_at: row.get(5)?,
    })
}

fn row_to_invite(row: &Row) -> rusqlite::Result<WorkspaceInvite> {
    let role: String = row.get(3)?;
    Ok(WorkspaceInvite {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        token: row.get(2)?,
        role: role_parse(&role),
        max_uses: row.get(4)?,
        use_count: row.get(5)?,
        expires_at: row.get(6)?,
        revoked_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl Store {
    pub fn create_workspace(&self, name: &str) -> AppResult<Workspace> {
        let conn = self.conn();
        let id = new_id();
        let ts = now();
        conn.execute(
            "INSERT INTO workspaces (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![&id, name, &ts],
        )?;
        Ok(Workspace {
            id,
            name: name.to_string(),
            created_at: ts,
        })
    }

    pub fn find_workspace(&self, id: &str) -> AppResult<Option<Workspace>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, created_at FROM workspaces WHERE id = ?1",
            params![id],
            row_to_workspace,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn add_workspace_member(
        &self,
        workspace_id: &str,
        user_id: &str,
        role: WorkspaceRole,
    ) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO workspace_members (workspace_id, user_id, role) VALUES (?1, ?2, ?3) \
             ON CONFLICT(workspace_id, user_id) DO UPDATE SET role = excluded.role",
            params![workspace_id, user_id, role_str(role)],
        )?;
        Ok(())
    }

    pub fn member_role(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> AppResult<Option<WorkspaceRole>> {
        let conn = self.conn();
        let role: Option<String> = conn
            .query_row(
                "SELECT role FROM workspace_members WHERE workspace_id = ?1 AND user_id = ?2",
                params![workspace_id, user_id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(role.map(|r| role_parse(&r)))
    }

    pub fn create_api_key(
        &self,
        workspace_id: &str,
        token_hash: &str,
        token_prefix: &str,
        created_by: &str,
    ) -> AppResult<WorkspaceApiKey> {
        let conn = self.conn();
        let id = new_id();
        let ts = now();
        conn.execute(
            "INSERT INTO workspace_api_keys (id, workspace_id, token_hash, token_prefix, created_by, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![&id, workspace_id, token_hash, token_prefix, created_by, &ts],
        )?;
        Ok(WorkspaceApiKey {
            id,
            workspace_id: workspace_id.to_string(),
            token_prefix: token_prefix.to_string(),
            created_by: created_by.to_string(),
            created_at: ts,
            revoked_at: None,
        })
    }

    /// Looks up a live (non-revoked) API key by its hashed token and returns
    /// the workspace it authorizes.
    pub fn find_active_api_key(&self, token_hash: &str) -> AppResult<Option<WorkspaceApiKey>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, workspace_id, token_prefix, created_by, created_at, revoked_at \
             FROM workspace_api_keys WHERE token_hash = ?1 AND revoked_at IS NULL",
            params![token_hash],
            row_to_api_key,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn revoke_api_key(&self, id: &str) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE workspace_api_keys SET revoked_at = ?1 WHERE id = ?2",
            params![now(), id],
        )?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_invite(
        &self,
        workspace_id: &str,
        token: &str,
        role: WorkspaceRole,
        max_uses: Option<i64>,
        expires_at: Option<&str>,
    ) -> AppResult<WorkspaceInvite> {
        let conn = self.conn();
        let id = new_id();
        let ts = now();
        conn.execute(
            "INSERT INTO workspace_invites (id, workspace_id, token, role, max_uses, use_count, expires_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
            params![&id, workspace_id, token, role_str(role), max_uses, expires_at, &ts],
        )?;
        Ok(WorkspaceInvite {
            id,
            workspace_id: workspace_id.to_string(),
            token: token.to_string(),
            role,
            max_uses,
            use_count: 0,
            expires_at: expires_at.map(String::from),
            revoked_at: None,
            created_at: ts,
        })
    }

    pub fn find_invite_by_token(&self, token: &str) -> AppResult<Option<WorkspaceInvite>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, workspace_id, token, role, max_uses, use_count, expires_at, revoked_at, created_at \
             FROM workspace_invites WHERE token = ?1",
            params![token],
            row_to_invite,
        )
        .optional()
        .map_err(AppError::from)
    }

    /// Increments `use_count` for a still-valid invite. Caller is expected to
    /// have already checked expiry/revocation/max_uses via
    /// `find_invite_by_token`.
    pub fn redeem_invite(&self, id: &str) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE workspace_invites SET use_count = use_count + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    pub fn revoke_invite(&self, id: &str) -> AppResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE workspace_invites SET revoked_at = ?1 WHERE id = ?2",
            params![now(), id],
        )?;
        Ok(())
    }
}
