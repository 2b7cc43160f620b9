//! Document use-case service.

use crate::model::document::{Document, DocumentId, NewDocument, MAX_FILENAME_CHARS};
use crate::model::space::SpaceId;
use crate::model::user::UserId;
use crate::repo::area_repo::AreaRepository;
use crate::repo::document_repo::DocumentRepository;
use crate::repo::member_repo::MemberRepository;
use crate::repo::space_repo::SpaceRepository;
use crate::service::access::can_view_document;
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub const MAX_TITLE_CHARS: usize = 200;

pub struct DocumentService<R>
where
    R: DocumentRepository + AreaRepository + SpaceRepository + MemberRepository,
{
    repo: R,
}

impl<R> DocumentService<R>
where
    R: DocumentRepository + AreaRepository + SpaceRepository + MemberRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores a document in the space as `private` to its uploader.
    pub fn create_document(
        &self,
        actor: UserId,
        space_id: SpaceId,
        input: &NewDocument,
    ) -> ServiceResult<Document> {
        self.repo
            .space_role(space_id, actor)?
            .ok_or(ServiceError::not_found("space", space_id))?;

        let normalized = NewDocument {
            filename: normalize_filename(&input.filename)?,
            title: normalize_title(input.title.as_deref())?,
            content: input.content.clone(),
        };
        let document = self.repo.create_document(space_id, actor, &normalized)?;
        info!(
            "event=document_create module=service status=ok space_id={} document_id={} size={}",
            space_id, document.id, document.file_size
        );
        Ok(document)
    }

    /// Metadata plus content of a document the actor can view.
    pub fn get_document(
        &self,
        actor: UserId,
        document_id: DocumentId,
    ) -> ServiceResult<(Document, String)> {
        let document = self
            .repo
            .get_document(document_id)?
            .ok_or(ServiceError::not_found("document", document_id))?;
        if !can_view_document(&self.repo, &document, actor)? {
            return Err(ServiceError::not_found("document", document_id));
        }
        let content = self
            .repo
            .document_content(document_id)?
            .ok_or(ServiceError::not_found("document", document_id))?;
        Ok((document, content))
    }

    pub fn list_documents(&self, actor: UserId, space_id: SpaceId) -> ServiceResult<Vec<Document>> {
        self.repo
            .space_role(space_id, actor)?
            .ok_or(ServiceError::not_found("space", space_id))?;

        let mut visible = Vec::new();
        for document in self.repo.list_space_documents(space_id)? {
            if can_view_document(&self.repo, &document, actor)? {
                visible.push(document);
            }
        }
        Ok(visible)
    }

    /// Soft-deletes a document. Only its owner may do so.
    pub fn delete_document(&self, actor: UserId, document_id: DocumentId) -> ServiceResult<()> {
        match self.repo.get_document(document_id)? {
            Some(document) if document.owner_id == actor => {}
            _ => return Err(ServiceError::not_found("document", document_id)),
        }
        self.repo.soft_delete_document(document_id)?;
        info!(
            "event=document_delete module=service status=ok document_id={}",
            document_id
        );
        Ok(())
    }
}

fn normalize_filename(value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("filename must not be blank"));
    }
    if trimmed.chars().count() > MAX_FILENAME_CHARS {
        return Err(ServiceError::validation(format!(
            "filename must be at most {MAX_FILENAME_CHARS} characters"
        )));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(ServiceError::validation("filename must not contain path separators"));
    }
    Ok(trimmed.to_string())
}

fn normalize_title(value: Option<&str>) -> ServiceResult<Option<String>> {
    let Some(trimmed) = value.map(str::trim).filter(|title| !title.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > MAX_TITLE_CHARS {
        return Err(ServiceError::validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{normalize_filename, normalize_title};

    #[test]
    fn filename_is_trimmed_and_must_be_plain() {
        assert_eq!(normalize_filename("  notes.md ").unwrap(), "notes.md");
        assert!(normalize_filename("   ").is_err());
        assert!(normalize_filename("../etc/passwd").is_err());
        assert!(normalize_filename(&"a".repeat(256)).is_err());
    }

    #[test]
    fn blank_title_falls_back_to_none() {
        assert_eq!(normalize_title(Some("  ")).unwrap(), None);
        assert_eq!(normalize_title(None).unwrap(), None);
        assert_eq!(
            normalize_title(Some(" Q3 plan ")).unwrap().as_deref(),
            Some("Q3 plan")
        );
    }
}
