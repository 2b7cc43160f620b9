//! Area use-case service.
//!
//! # Responsibility
//! - Create, list, update and delete areas inside a space.
//! - Validate attribute patches against General-area invariants.
//!
//! # Invariants
//! - Restricted areas are listed only for users with an effective role.
//! - Changing one area never touches the General area of the space.
//! - Context documents belong to the same space as the area, are readable
//!   by the actor, and are visible to every member of the area.

use crate::model::area::{
    normalize_area_name, normalize_color, normalize_context, Area, AreaId, AreaPatch,
    AreaValidationError, NewArea,
};
use crate::model::space::SpaceId;
use crate::model::user::UserId;
use crate::repo::area_repo::AreaRepository;
use crate::repo::document_repo::DocumentRepository;
use crate::repo::member_repo::MemberRepository;
use crate::repo::space_repo::SpaceRepository;
use crate::service::access::{
    can_view_document, document_reaches_area, effective_area_role, managed_area, visible_area,
};
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub struct AreaService<R>
where
    R: AreaRepository + SpaceRepository + MemberRepository + DocumentRepository,
{
    repo: R,
}

impl<R> AreaService<R>
where
    R: AreaRepository + SpaceRepository + MemberRepository + DocumentRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates an area; the actor becomes its owner.
    pub fn create_area(
        &self,
        actor: UserId,
        space_id: SpaceId,
        input: &NewArea,
    ) -> ServiceResult<Area> {
        self.repo
            .space_role(space_id, actor)?
            .ok_or(ServiceError::not_found("space", space_id))?;

        let normalized = NewArea {
            name: normalize_area_name(&input.name)?,
            color: input.color.as_deref().map(normalize_color).transpose()?.flatten(),
            context: input
                .context
                .as_deref()
                .map(normalize_context)
                .transpose()?
                .flatten(),
            is_restricted: input.is_restricted,
        };

        let area = self.repo.create_area(space_id, &normalized, actor)?;
        info!(
            "event=area_create module=service status=ok space_id={} area_id={} restricted={}",
            space_id, area.id, area.is_restricted
        );
        Ok(area)
    }

    /// Lists the areas of a space visible to the actor, General first.
    pub fn list_areas(&self, actor: UserId, space_id: SpaceId) -> ServiceResult<Vec<Area>> {
        self.repo
            .space_role(space_id, actor)?
            .ok_or(ServiceError::not_found("space", space_id))?;

        let mut visible = Vec::new();
        for area in self.repo.list_areas(space_id)? {
            if effective_area_role(&self.repo, &area, actor)?.is_some() {
                visible.push(area);
            }
        }
        Ok(visible)
    }

    pub fn get_area(&self, actor: UserId, area_id: AreaId) -> ServiceResult<Area> {
        visible_area(&self.repo, area_id, actor).map(|(area, _)| area)
    }

    /// Applies a partial update. Requires `admin` or `owner` on the area.
    pub fn update_area(
        &self,
        actor: UserId,
        area_id: AreaId,
        patch: &AreaPatch,
    ) -> ServiceResult<Area> {
        let mut area = managed_area(&self.repo, area_id, actor)?;
        if patch.is_empty() {
            return Ok(area);
        }

        area.apply_patch(patch)?;

        if patch.context_document_ids.is_some() {
            for document_id in &area.context_document_ids {
                let available = match self.repo.get_document(*document_id)? {
                    Some(document) if document.space_id == area.space_id => {
                        can_view_document(&self.repo, &document, actor)?
                            && document_reaches_area(&self.repo, &document, area.id)?
                    }
                    _ => false,
                };
                if !available {
                    return Err(ServiceError::validation(format!(
                        "context document {document_id} is not available to this area"
                    )));
                }
            }
        }

        self.repo.update_area(&area)?;
        info!(
            "event=area_update module=service status=ok area_id={} restricted={}",
            area.id, area.is_restricted
        );
        self.repo
            .get_area(area_id)?
            .ok_or(ServiceError::not_found("area", area_id))
    }

    /// Soft-deletes a non-General area. Requires `admin` or `owner`.
    pub fn delete_area(&self, actor: UserId, area_id: AreaId) -> ServiceResult<()> {
        let area = managed_area(&self.repo, area_id, actor)?;
        if area.is_general {
            return Err(AreaValidationError::GeneralDelete.into());
        }
        self.repo.soft_delete_area(area_id)?;
        info!(
            "event=area_delete module=service status=ok area_id={} space_id={}",
            area_id, area.space_id
        );
        Ok(())
    }
}
