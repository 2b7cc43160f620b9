//! Area membership persistence and candidate search.
//!
//! # Invariants
//! - At most one row per `(area, user)` and per `(area, group)`.
//! - Owner rows are never updated or deleted through this repository.
//! - Member listing is deterministic: role rank descending, then name.

use crate::model::area::AreaId;
use crate::model::member::{
    AreaMember, AreaMemberId, AreaMemberView, MemberCandidate, MemberTarget, Role,
};
use crate::model::space::SpaceId;
use crate::model::user::UserId;
use crate::repo::space_repo::parse_role;
use crate::repo::{conflict_or, contains_folded, parse_uuid, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const MEMBER_SELECT_SQL: &str = "SELECT
    m.id AS id,
    m.area_id AS area_id,
    m.user_id AS user_id,
    m.group_id AS group_id,
    m.role AS role,
    m.created_at AS created_at
FROM area_members m";

pub trait MemberRepository {
    fn list_area_members(&self, area_id: AreaId) -> RepoResult<Vec<AreaMemberView>>;
    fn get_area_member(
        &self,
        area_id: AreaId,
        member_id: AreaMemberId,
    ) -> RepoResult<Option<AreaMember>>;
    fn add_area_member(
        &self,
        area_id: AreaId,
        target: MemberTarget,
        role: Role,
    ) -> RepoResult<AreaMember>;
    fn update_area_member_role(&self, member_id: AreaMemberId, role: Role) -> RepoResult<()>;
    fn remove_area_member(&self, member_id: AreaMemberId) -> RepoResult<()>;
    /// Roles granted to the user on the area, directly or through groups.
    fn area_roles_for_user(&self, area_id: AreaId, user_id: UserId) -> RepoResult<Vec<Role>>;
    /// Space members and groups matching `query`, excluding current members.
    fn search_member_candidates(
        &self,
        space_id: SpaceId,
        area_id: AreaId,
        query: &str,
        limit: u32,
    ) -> RepoResult<Vec<MemberCandidate>> {
        // LIKE folds ASCII only; match on lowercased text instead.
        let needle = query.to_lowercase();
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut candidates = Vec::new();

        let mut users = self.conn.prepare(
            "SELECT u.id, u.display_name, u.email
             FROM users u
             INNER JOIN space_members sm ON sm.user_id = u.id
             WHERE sm.space_id = ?1
               AND NOT EXISTS (
                 SELECT 1 FROM area_members m
                 WHERE m.area_id = ?2 AND m.user_id = u.id
               )
             ORDER BY u.display_name COLLATE NOCASE ASC, u.id ASC;",
        )?;
        let mut rows = users.query(params![space_id.to_string(), area_id.to_string()])?;
        while candidates.len() < limit {
            let Some(row) = rows.next()? else {
                break;
            };
            let display_name: String = row.get(1)?;
            let email: String = row.get(2)?;
            if !contains_folded(&display_name, &needle) && !contains_folded(&email, &needle) {
                continue;
            }
            let id_text: String = row.get(0)?;
            candidates.push(MemberCandidate {
                target: MemberTarget::User(parse_uuid(&id_text, "users.id")?),
                display_name,
                email: Some(email),
            });
        }
        if candidates.len() >= limit {
            return Ok(candidates);
        }

        let mut groups = self.conn.prepare(
            "SELECT g.id, g.name
             FROM user_groups g
             WHERE NOT EXISTS (
                 SELECT 1 FROM area_members m
                 WHERE m.area_id = ?1 AND m.group_id = g.id
               )
             ORDER BY g.name COLLATE NOCASE ASC, g.id ASC;",
        )?;
        let mut rows = groups.query([area_id.to_string()])?;
        while candidates.len() < limit {
            let Some(row) = rows.next()? else {
                break;
            };
            let name: String = row.get(1)?;
            if !contains_folded(&name, &needle) {
                continue;
            }
            let id_text: String = row.get(0)?;
            candidates.push(MemberCandidate {
                target: MemberTarget::Group(parse_uuid(&id_text, "user_groups.id")?),
                display_name: name,
                email: None,
            });
        }

        Ok(candidates)
    }
}

fn load_member(conn: &Connection, member_id: AreaMemberId) -> RepoResult<Option<AreaMember>> {
    let mut stmt = conn.prepare(&format!("{MEMBER_SELECT_SQL} WHERE m.id = ?1;"))?;
    let mut rows = stmt.query([member_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_member_row(row)?));
    }
    Ok(None)
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<AreaMember> {
    let id_text: String = row.get("id")?;
    let area_text: String = row.get("area_id")?;
    let user_id = row
        .get::<_, Option<String>>("user_id")?
        .map(|value| parse_uuid(&value, "area_members.user_id"))
        .transpose()?;
    let group_id = row
        .get::<_, Option<String>>("group_id")?
        .map(|value| parse_uuid(&value, "area_members.group_id"))
        .transpose()?;

    let target = match (user_id, group_id) {
        (Some(user_id), None) => MemberTarget::User(user_id),
        (None, Some(group_id)) => MemberTarget::Group(group_id),
        _ => {
            return Err(RepoError::InvalidData(format!(
                "area member {id_text} must target exactly one user or group"
            )));
        }
    };

    let role_text: String = row.get("role")?;
    Ok(AreaMember {
        id: parse_uuid(&id_text, "area_members.id")?,
        area_id: parse_uuid(&area_text, "area_members.area_id")?,
        target,
        role: parse_role(&role_text, "area_members.role")?,
        created_at: row.get("created_at")?,
    })
}
