//! Document persistence and area sharing rows.
//!
//! # Invariants
//! - Only active (`is_deleted=0`) documents are returned.
//! - A visibility change and its share-row replacement commit together or
//!   not at all.
//! - Narrowing visibility drops the document from the context of every area
//!   it no longer reaches, in the same transaction.

use crate::model::area::AreaId;
use crate::model::document::{
    Document, DocumentId, NewDocument, SharedArea, Visibility, VisibilityChange,
};
use crate::model::space::SpaceId;
use crate::model::user::UserId;
use crate::repo::{parse_flag, parse_uuid, RepoError, RepoResult, SqliteStore};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT
    id,
    space_id,
    owner_id,
    filename,
    title,
    file_size,
    char_count,
    visibility,
    is_deleted,
    created_at,
    updated_at
FROM documents";

pub trait DocumentRepository {
    /// Stores a normalized upload with `private` visibility.
    fn create_document(
        &self,
        space_id: SpaceId,
        owner_id: UserId,
        document: &NewDocument,
    ) -> RepoResult<Document>;
    fn get_document(&self, id: DocumentId) -> RepoResult<Option<Document>>;
    fn document_content(&self, id: DocumentId) -> RepoResult<Option<String>>;
    /// Active documents of a space, newest first.
    fn list_space_documents(&self, space_id: SpaceId) -> RepoResult<Vec<Document>>;
    /// Active areas the document is shared into, ordered by name.
    fn shared_areas(&self, id: DocumentId) -> RepoResult<Vec<SharedArea>>;
    /// Updates visibility and replaces share rows atomically.
    fn set_visibility(
        &self,
        id: DocumentId,
        change: &VisibilityChange,
        shared_by: UserId,
    ) -> RepoResult<()>;
    fn soft_delete_document(&self, id: DocumentId) -> RepoResult<()>;
}

impl DocumentRepository for SqliteStore<'_> {
    fn create_document(
        &self,
        space_id: SpaceId,
        owner_id: UserId,
        document: &NewDocument,
    ) -> RepoResult<Document> {
        let id = Uuid::new_v4();
        let title = document
            .title
            .clone()
            .unwrap_or_else(|| document.filename.clone());
        self.conn.execute(
            "INSERT INTO documents (
                id,
                space_id,
                owner_id,
                filename,
                title,
                file_size,
                char_count,
                content,
                visibility
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'private');",
            params![
                id.to_string(),
                space_id.to_string(),
                owner_id.to_string(),
                document.filename,
                title,
                document.file_size(),
                document.char_count(),
                document.content,
            ],
        )?;
        load_document(self.conn, id)?.ok_or(RepoError::NotFound {
            entity: "document",
            id,
        })
    }

    fn get_document(&self, id: DocumentId) -> RepoResult<Option<Document>> {
        load_document(self.conn, id)
    }

    fn document_content(&self, id: DocumentId) -> RepoResult<Option<String>> {
        let content = self
            .conn
            .query_row(
                "SELECT content FROM documents WHERE id = ?1 AND is_deleted = 0;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(content)
    }

    fn list_space_documents(&self, space_id: SpaceId) -> RepoResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL}
             WHERE space_id = ?1
               AND is_deleted = 0
             ORDER BY created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([space_id.to_string()])?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    fn shared_areas(&self, id: DocumentId) -> RepoResult<Vec<SharedArea>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.name, a.color
             FROM document_shared_areas s
             INNER JOIN areas a ON a.id = s.area_id
             WHERE s.document_id = ?1
               AND a.is_deleted = 0
             ORDER BY a.name COLLATE NOCASE ASC, a.id ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut areas = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            areas.push(SharedArea {
                id: parse_uuid(&id_text, "areas.id")?,
                name: row.get(1)?,
                color: row.get(2)?,
            });
        }
        Ok(areas)
    }

    fn set_visibility(
        &self,
        id: DocumentId,
        change: &VisibilityChange,
        shared_by: UserId,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE documents
             SET visibility = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            params![id.to_string(), change.visibility().as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "document",
                id,
            });
        }

        tx.execute(
            "DELETE FROM document_shared_areas WHERE document_id = ?1;",
            [id.to_string()],
        )?;
        for area_id in change.area_ids() {
            insert_share_row(&tx, id, *area_id, shared_by)?;
        }
        if change.visibility() != Visibility::Space {
            tx.execute(
                "DELETE FROM area_context_documents
                 WHERE document_id = ?1
                   AND area_id NOT IN (
                     SELECT area_id FROM document_shared_areas WHERE document_id = ?1
                   );",
                [id.to_string()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn soft_delete_document(&self, id: DocumentId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE documents
             SET is_deleted = 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND is_deleted = 0;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "document",
                id,
            });
        }
        tx.execute(
            "DELETE FROM document_shared_areas WHERE document_id = ?1;",
            [id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM area_context_documents WHERE document_id = ?1;",
            [id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn insert_share_row(
    conn: &Connection,
    document_id: DocumentId,
    area_id: AreaId,
    shared_by: UserId,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO document_shared_areas (document_id, area_id, shared_by)
         VALUES (?1, ?2, ?3);",
        params![
            document_id.to_string(),
            area_id.to_string(),
            shared_by.to_string(),
        ],
    )?;
    Ok(())
}

fn load_document(conn: &Connection, id: DocumentId) -> RepoResult<Option<Document>> {
    let mut stmt = conn.prepare(&format!(
        "{DOCUMENT_SELECT_SQL}
         WHERE id = ?1
           AND is_deleted = 0;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_document_row(row)?));
    }
    Ok(None)
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<Document> {
    let id_text: String = row.get("id")?;
    let space_text: String = row.get("space_id")?;
    let owner_text: String = row.get("owner_id")?;
    let visibility_text: String = row.get("visibility")?;
    let visibility = visibility_text.parse::<Visibility>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid visibility `{visibility_text}` in documents.visibility"
        ))
    })?;

    Ok(Document {
        id: parse_uuid(&id_text, "documents.id")?,
        space_id: parse_uuid(&space_text, "documents.space_id")?,
        owner_id: parse_uuid(&owner_text, "documents.owner_id")?,
        filename: row.get("filename")?,
        title: row.get("title")?,
        file_size: row.get("file_size")?,
        char_count: row.get("char_count")?,
        visibility,
        is_deleted: parse_flag(row.get("is_deleted")?, "documents.is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
