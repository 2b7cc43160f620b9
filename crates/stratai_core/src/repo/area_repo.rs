//! Area persistence.
//!
//! # Invariants
//! - Only active (`is_deleted=0`) areas are returned.
//! - Listing is deterministic: General first, then `name COLLATE NOCASE`.
//! - Deleting an area drops its share rows; documents left with no shared
//!   area fall back to `private` in the same transaction.

use crate::model::area::{Area, AreaId, NewArea};
use crate::model::document::DocumentId;
use crate::model::space::SpaceId;
use crate::model::user::UserId;
use crate::repo::{
    bool_to_int, conflict_or, parse_flag, parse_uuid, RepoError, RepoResult, SqliteStore,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use uuid::Uuid;

const AREA_SELECT_SQL: &str = "SELECT
    id,
    space_id,
    name,
    is_general,
    is_restricted,
    color,
    context,
    created_by,
    is_deleted,
    created_at,
    updated_at
FROM areas";

pub trait AreaRepository {
    /// Inserts a non-General area and grants `created_by` the owner role.
    fn create_area(
        &self,
        space_id: SpaceId,
        area: &NewArea,
        created_by: UserId,
    ) -> RepoResult<Area>;
    fn get_area(&self, id: AreaId) -> RepoResult<Option<Area>>;
    fn list_areas(&self, space_id: SpaceId) -> RepoResult<Vec<Area>>;
    /// Persists mutable attributes and replaces context documents.
    fn update_area(&self, area: &Area) -> RepoResult<()>;
    fn soft_delete_area(&self, id: AreaId) -> RepoResult<()>;
    /// Subset of `ids` that are active areas of `space_id`.
    fn active_area_ids(&self, space_id: SpaceId, ids: &[AreaId]) -> RepoResult<HashSet<AreaId>>;
}

impl AreaRepository for SqliteStore<'_> {
    fn create_area(
        &self,
        space_id: SpaceId,
        area: &NewArea,
        created_by: UserId,
    ) -> RepoResult<Area> {
        let area_id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO areas (
                id,
                space_id,
                name,
                is_general,
                is_restricted,
                color,
                context,
                created_by
            ) VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7);",
            params![
                area_id.to_string(),
                space_id.to_string(),
                area.name,
                bool_to_int(area.is_restricted),
                area.color,
                area.context,
                created_by.to_string(),
            ],
        )
        .map_err(|err| conflict_or(err, || format!("area name already in use: {}", area.name)))?;
        tx.execute(
            "INSERT INTO area_members (id, area_id, user_id, role) VALUES (?1, ?2, ?3, 'owner');",
            params![
                Uuid::new_v4().to_string(),
                area_id.to_string(),
                created_by.to_string(),
            ],
        )?;
        tx.commit()?;

        load_area(self.conn, area_id)?.ok_or(RepoError::NotFound {
            entity: "area",
            id: area_id,
        })
    }

    fn get_area(&self, id: AreaId) -> RepoResult<Option<Area>> {
        load_area(self.conn, id)
    }

    fn list_areas(&self, space_id: SpaceId) -> RepoResult<Vec<Area>> {
        let mut stmt = self.conn.prepare(&format!(
            "{AREA_SELECT_SQL}
             WHERE space_id = ?1
               AND is_deleted = 0
             ORDER BY is_general DESC, name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([space_id.to_string()])?;
        let mut areas = Vec::new();
        while let Some(row) = rows.next()? {
            areas.push(parse_area_row(row)?);
        }
        for area in &mut areas {
            area.context_document_ids = load_context_document_ids(self.conn, area.id)?;
        }
        Ok(areas)
    }

    fn update_area(&self, area: &Area) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx
            .execute(
                "UPDATE areas
                 SET name = ?2,
                     is_restricted = ?3,
                     color = ?4,
                     context = ?5,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND is_deleted = 0;",
                params![
                    area.id.to_string(),
                    area.name,
                    bool_to_int(area.is_restricted),
                    area.color,
                    area.context,
                ],
            )
            .map_err(|err| conflict_or(err, || format!("area name already in use: {}", area.name)))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "area",
                id: area.id,
            });
        }

        tx.execute(
            "DELETE FROM area_context_documents WHERE area_id = ?1;",
            [area.id.to_string()],
        )?;
        for (position, document_id) in area.context_document_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO area_context_documents (area_id, document_id, position)
                 VALUES (?1, ?2, ?3);",
                params![area.id.to_string(), document_id.to_string(), position as i64],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn soft_delete_area(&self, id: AreaId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE areas
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_general = 0
               AND is_deleted = 0;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "area", id });
        }

        tx.execute(
            "DELETE FROM document_shared_areas WHERE area_id = ?1;",
            [id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM area_context_documents WHERE area_id = ?1;",
            [id.to_string()],
        )?;
        tx.execute(
            "UPDATE documents
             SET visibility = 'private',
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE visibility = 'areas'
               AND NOT EXISTS (
                 SELECT 1
                 FROM document_shared_areas s
                 WHERE s.document_id = documents.id
               );",
            [],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn active_area_ids(&self, space_id: SpaceId, ids: &[AreaId]) -> RepoResult<HashSet<AreaId>> {
        let mut stmt = self.conn.prepare(
            "SELECT 1
             FROM areas
             WHERE id = ?1
               AND space_id = ?2
               AND is_deleted = 0;",
        )?;
        let mut found = HashSet::new();
        for id in ids {
            if stmt.exists(params![id.to_string(), space_id.to_string()])? {
                found.insert(*id);
            }
        }
        Ok(found)
    }
}

pub(crate) fn load_area(conn: &Connection, id: AreaId) -> RepoResult<Option<Area>> {
    let mut stmt = conn.prepare(&format!(
        "{AREA_SELECT_SQL}
         WHERE id = ?1
           AND is_deleted = 0;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        let mut area = parse_area_row(row)?;
        area.context_document_ids = load_context_document_ids(conn, area.id)?;
        return Ok(Some(area));
    }
    Ok(None)
}

fn load_context_document_ids(conn: &Connection, area_id: AreaId) -> RepoResult<Vec<DocumentId>> {
    let mut stmt = conn.prepare(
        "SELECT c.document_id
         FROM area_context_documents c
         INNER JOIN documents d ON d.id = c.document_id
         WHERE c.area_id = ?1
           AND d.is_deleted = 0
           AND (
             d.visibility = 'space'
             OR EXISTS (
               SELECT 1
               FROM document_shared_areas s
               WHERE s.document_id = d.id
                 AND s.area_id = c.area_id
             )
           )
         ORDER BY c.position ASC;",
    )?;
    let mut rows = stmt.query([area_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "area_context_documents.document_id")?);
    }
    Ok(ids)
}

fn parse_area_row(row: &Row<'_>) -> RepoResult<Area> {
    let id_text: String = row.get("id")?;
    let space_text: String = row.get("space_id")?;
    let created_by_text: String = row.get("created_by")?;
    Ok(Area {
        id: parse_uuid(&id_text, "areas.id")?,
        space_id: parse_uuid(&space_text, "areas.space_id")?,
        name: row.get("name")?,
        is_general: parse_flag(row.get("is_general")?, "areas.is_general")?,
        is_restricted: parse_flag(row.get("is_restricted")?, "areas.is_restricted")?,
        color: row.get("color")?,
        context: row.get("context")?,
        context_document_ids: Vec::new(),
        created_by: parse_uuid(&created_by_text, "areas.created_by")?,
        is_deleted: parse_flag(row.get("is_deleted")?, "areas.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
