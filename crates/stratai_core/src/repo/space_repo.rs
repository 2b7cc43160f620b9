//! Space persistence and space-level membership.
//!
//! # Invariants
//! - A space row is never written without its owner membership and its
//!   General area; all three are inserted in one transaction.

use crate::model::area::{Area, GENERAL_AREA_NAME};
use crate::model::member::Role;
use crate::model::space::{Space, SpaceId, SpaceMember};
use crate::model::user::UserId;
use crate::repo::area_repo::load_area;
use crate::repo::{conflict_or, parse_uuid, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const SPACE_SELECT_SQL: &str = "SELECT
    s.id AS id,
    s.name AS name,
    s.owner_id AS owner_id,
    s.created_at AS created_at,
    s.updated_at AS updated_at
FROM spaces s";

pub trait SpaceRepository {
    /// Creates a space, its owner membership and its General area.
    fn create_space(&self, name: &str, owner_id: UserId) -> RepoResult<(Space, Area)>;
    fn get_space(&self, id: SpaceId) -> RepoResult<Option<Space>>;
    /// Spaces the user is a member of, ordered by name.
    fn list_spaces_for_user(&self, user_id: UserId) -> RepoResult<Vec<Space>>;
    fn space_role(&self, space_id: SpaceId, user_id: UserId) -> RepoResult<Option<Role>>;
    fn add_space_member(
        &self,
        space_id: SpaceId,
        user_id: UserId,
        role: Role,
    ) -> RepoResult<SpaceMember>;
}

impl SpaceRepository for SqliteStore<'_> {
    fn create_space(&self, name: &str, owner_id: UserId) -> RepoResult<(Space, Area)> {
        let space_id = Uuid::new_v4();
        let general_id = Uuid::new_v4();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO spaces (id, name, owner_id) VALUES (?1, ?2, ?3);",
            params![space_id.to_string(), name, owner_id.to_string()],
        )?;
        tx.execute(
            "INSERT INTO space_members (space_id, user_id, role) VALUES (?1, ?2, 'owner');",
            params![space_id.to_string(), owner_id.to_string()],
        )?;
        tx.execute(
            "INSERT INTO areas (id, space_id, name, is_general, is_restricted, created_by)
             VALUES (?1, ?2, ?3, 1, 0, ?4);",
            params![
                general_id.to_string(),
                space_id.to_string(),
                GENERAL_AREA_NAME,
                owner_id.to_string(),
            ],
        )?;
        tx.execute(
            "INSERT INTO area_members (id, area_id, user_id, role) VALUES (?1, ?2, ?3, 'owner');",
            params![
                Uuid::new_v4().to_string(),
                general_id.to_string(),
                owner_id.to_string(),
            ],
        )?;
        tx.commit()?;

        let space = load_space(self.conn, space_id)?.ok_or(RepoError::NotFound {
            entity: "space",
            id: space_id,
        })?;
        let general = load_area(self.conn, general_id)?.ok_or(RepoError::NotFound {
            entity: "area",
            id: general_id,
        })?;
        Ok((space, general))
    }

    fn get_space(&self, id: SpaceId) -> RepoResult<Option<Space>> {
        load_space(self.conn, id)
    }

    fn list_spaces_for_user(&self, user_id: UserId) -> RepoResult<Vec<Space>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SPACE_SELECT_SQL}
             INNER JOIN space_members m ON m.space_id = s.id
             WHERE m.user_id = ?1
             ORDER BY s.name COLLATE NOCASE ASC, s.id ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut spaces = Vec::new();
        while let Some(row) = rows.next()? {
            spaces.push(parse_space_row(row)?);
        }
        Ok(spaces)
    }

    fn space_role(&self, space_id: SpaceId, user_id: UserId) -> RepoResult<Option<Role>> {
        let role: Option<String> = self
            .conn
            .query_row(
                "SELECT role FROM space_members WHERE space_id = ?1 AND user_id = ?2;",
                params![space_id.to_string(), user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        role.map(|value| parse_role(&value, "space_members.role"))
            .transpose()
    }

    fn add_space_member(
        &self,
        space_id: SpaceId,
        user_id: UserId,
        role: Role,
    ) -> RepoResult<SpaceMember> {
        self.conn
            .execute(
                "INSERT INTO space_members (space_id, user_id, role) VALUES (?1, ?2, ?3);",
                params![space_id.to_string(), user_id.to_string(), role.as_str()],
            )
            .map_err(|err| conflict_or(err, || format!("user {user_id} is already a space member")))?;

        let created_at: i64 = self.conn.query_row(
            "SELECT created_at FROM space_members WHERE space_id = ?1 AND user_id = ?2;",
            params![space_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(SpaceMember {
            space_id,
            user_id,
            role,
            created_at,
        })
    }
}

fn load_space(conn: &Connection, id: SpaceId) -> RepoResult<Option<Space>> {
    let mut stmt = conn.prepare(&format!("{SPACE_SELECT_SQL} WHERE s.id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_space_row(row)?));
    }
    Ok(None)
}

fn parse_space_row(row: &Row<'_>) -> RepoResult<Space> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    Ok(Space {
        id: parse_uuid(&id_text, "spaces.id")?,
        name: row.get("name")?,
        owner_id: parse_uuid(&owner_text, "spaces.owner_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

pub(crate) fn parse_role(value: &str, column: &'static str) -> RepoResult<Role> {
    value
        .parse::<Role>()
        .map_err(|_| RepoError::InvalidData(format!("invalid role `{value}` in {column}")))
}
