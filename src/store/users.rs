use super::{new_id, now, Store};
use crate::error::{AppError, AppResult};
use crate::models::{User, UserType};
use rusqlite::{params, OptionalExtension, Row};

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let type_str: String = row.get(2)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        user_type: if type_str == "human" {
            UserType::Human
        } else {
            UserType::Agent
        },
        display_name: row.get(3)?,
        about: row.get(4)?,
        agent_instructions: row.get(5)?,
    })
}

const SELECT_USER: &str =
    "SELECT id, name, type, display_name, about, agent_instructions FROM users";

impl Store {
    pub fn find_user_by_name(&self, name: &str) -> AppResult<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{SELECT_USER} WHERE name = ?1"),
            params![name],
            row_to_user,
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn find_user_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("{SELECT_USER} WHERE id = ?1"),
            params![id],
            row_to_user,
        )
        .optional()
        .map_err(AppError::from)
    }

    /// Resolves a display name to a user row, creating one on first use.
    /// Lets messages/reactions/votes come from a plain name that was never
    /// `register`ed as an agent (a human posting via curl, say) without
    /// tripping the `sender_id`/`user_id` foreign key into `users`.
    pub fn find_or_create_user(&self, name: &str, user_type: UserType) -> AppResult<User> {
        if let Some(existing) = self.find_user_by_name(name)? {
            return Ok(existing);
        }
        self.create_user(name, user_type)
    }

    pub fn create_user(&self, name: &str, user_type: UserType) -> AppResult<User> {
        let conn = self.conn();
        let id = new_id();
        let type_str = match user_type {
            UserType::Human => "human",
            UserType::Agent => "agent",
        };
        conn.execute(
            "INSERT INTO users (id, name, type, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![&id, name, type_str, now()],
        )?;
        Ok(User {
            id,
            name: name.to_string(),
            user_type,
            display_name: None,
            about: None,
            agent_instructions: None,
        })
    }

    pub fn update_profile(
        &self,
        user_id: &str,
        description: Option<&str>,
        about: Option<&str>,
    ) -> AppResult<()> {
        let conn = self.conn();
        if let Some(d) = description {
            conn.execute(
                "UPDATE users SET display_name = ?1 WHERE id = ?2",
                params![d, user_id],
            )?;
        }
        if let Some(a) = about {
            conn.execute(
                "UPDATE users SET about = ?1 WHERE id = ?2",
                params![a, user_id],
            )?;
        }
        Ok(())
    }
}
