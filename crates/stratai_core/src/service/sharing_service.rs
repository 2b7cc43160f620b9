//! Document visibility transitions.
//!
//! # Responsibility
//! - Translate a requested visibility into a validated [`VisibilityChange`].
//! - Persist the change through one atomic repository call.
//!
//! # Invariants
//! - Only the document owner reads or changes sharing; everyone else gets
//!   `NotFound`.
//! - `private` and `space` leave no share rows behind.
//! - `areas` needs at least one active area of the document's own space.

use crate::model::area::AreaId;
use crate::model::document::{Document, DocumentId, DocumentSharing, Visibility, VisibilityChange};
use crate::model::user::UserId;
use crate::repo::area_repo::AreaRepository;
use crate::repo::document_repo::DocumentRepository;
use crate::service::{ServiceError, ServiceResult};
use log::{info, warn};
use std::collections::BTreeSet;

pub struct SharingService<R: DocumentRepository + AreaRepository> {
    repo: R,
}

impl<R: DocumentRepository + AreaRepository> SharingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn get_sharing(&self, actor: UserId, document_id: DocumentId) -> ServiceResult<DocumentSharing> {
        let document = self.owned_document(actor, document_id)?;
        self.sharing_of(&document)
    }

    /// Replaces the document's visibility and share rows.
    ///
    /// Repeating the same request leaves the stored state unchanged.
    pub fn set_sharing(
        &self,
        actor: UserId,
        document_id: DocumentId,
        visibility: &str,
        area_ids: Option<&[AreaId]>,
    ) -> ServiceResult<DocumentSharing> {
        let document = self.owned_document(actor, document_id)?;
        let change = match visibility.parse::<Visibility>()? {
            Visibility::Private => VisibilityChange::Private,
            Visibility::Space => VisibilityChange::Space,
            Visibility::Areas => {
                let requested: BTreeSet<AreaId> =
                    area_ids.unwrap_or_default().iter().copied().collect();
                if requested.is_empty() {
                    return Err(ServiceError::validation(
                        "areaIds must name at least one area when visibility is `areas`",
                    ));
                }
                let ids: Vec<AreaId> = requested.iter().copied().collect();
                let active = self.repo.active_area_ids(document.space_id, &ids)?;
                if let Some(unknown) = ids.iter().find(|id| !active.contains(*id)) {
                    warn!(
                        "event=document_share module=service status=error document_id={} reason=unknown_area area_id={}",
                        document_id, unknown
                    );
                    return Err(ServiceError::validation(format!(
                        "area {unknown} is not an active area of this space"
                    )));
                }
                VisibilityChange::Areas(requested)
            }
        };

        self.repo.set_visibility(document_id, &change, actor)?;
        info!(
            "event=document_share module=service status=ok document_id={} visibility={} areas={}",
            document_id,
            change.visibility().as_str(),
            change.area_ids().count()
        );

        let document = self
            .repo
            .get_document(document_id)?
            .ok_or(ServiceError::not_found("document", document_id))?;
        self.sharing_of(&document)
    }

    fn owned_document(&self, actor: UserId, document_id: DocumentId) -> ServiceResult<Document> {
        match self.repo.get_document(document_id)? {
            Some(document) if document.owner_id == actor => Ok(document),
            _ => Err(ServiceError::not_found("document", document_id)),
        }
    }

    fn sharing_of(&self, document: &Document) -> ServiceResult<DocumentSharing> {
        let shared_areas = match document.visibility {
            Visibility::Areas => self.repo.shared_areas(document.id)?,
            Visibility::Private | Visibility::Space => Vec::new(),
        };
        Ok(DocumentSharing {
            document_id: document.id,
            visibility: document.visibility,
            shared_areas,
        })
    }
}
