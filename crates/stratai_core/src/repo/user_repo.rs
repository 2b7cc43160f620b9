//! Users and groups.
//!
//! Identity is owned by the upstream auth layer; these writes exist for
//! provisioning hooks and tests.
//!
//! # Invariants
//! - A group and its initial members are stored together or not at all.

use crate::model::user::{Group, GroupId, User, UserId};
use crate::repo::{conflict_or, parse_uuid, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

pub trait UserRepository {
    fn create_user(&self, email: &str, display_name: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Creates a group with its initial members; unknown users abort the write.
    fn create_group(&self, name: &str, members: &[UserId]) -> RepoResult<Group>;
    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>>;
}

impl UserRepository for SqliteStore<'_> {
    fn create_user(&self, email: &str, display_name: &str) -> RepoResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.trim().to_string(),
            display_name: display_name.trim().to_string(),
        };
        self.conn
            .execute(
                "INSERT INTO users (id, email, display_name) VALUES (?1, ?2, ?3);",
                params![user.id.to_string(), user.email, user.display_name],
            )
            .map_err(|err| conflict_or(err, || format!("email already registered: {email}")))?;
        Ok(user)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, email, display_name FROM users WHERE id = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn create_group(&self, name: &str, members: &[UserId]) -> RepoResult<Group> {
        let group = Group {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
        };
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO user_groups (id, name) VALUES (?1, ?2);",
            params![group.id.to_string(), group.name],
        )
        .map_err(|err| conflict_or(err, || format!("group already exists: {name}")))?;

        let mut user_exists = tx.prepare("SELECT 1 FROM users WHERE id = ?1;")?;
        let mut insert_member = tx.prepare(
            "INSERT OR IGNORE INTO group_members (group_id, user_id) VALUES (?1, ?2);",
        )?;
        for user_id in members {
            if !user_exists.exists([user_id.to_string()])? {
                return Err(RepoError::NotFound {
                    entity: "user",
                    id: *user_id,
                });
            }
            insert_member.execute(params![group.id.to_string(), user_id.to_string()])?;
        }
        drop(user_exists);
        drop(insert_member);

        tx.commit()?;
        Ok(group)
    }

    fn get_group(&self, id: GroupId) -> RepoResult<Option<Group>> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM user_groups WHERE id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name.map(|name| Group { id, name }))
    }
}

pub(crate) fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
    })
}
