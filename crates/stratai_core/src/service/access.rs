//! Effective-role resolution shared by the area, document and arena services.
//!
//! # Invariants
//! - Users outside a space have no role on anything inside it.
//! - The space owner holds `owner` on every area of the space.
//! - Open areas grant every space member their space role as a floor;
//!   restricted areas grant only explicit (user or group) memberships.
//! - A document reaches an area only through `space` visibility or an
//!   explicit share row; `private` documents reach no area.

use crate::model::area::{Area, AreaId};
use crate::model::document::{Document, Visibility};
use crate::model::member::Role;
use crate::model::user::UserId;
use crate::repo::area_repo::AreaRepository;
use crate::repo::document_repo::DocumentRepository;
use crate::repo::member_repo::MemberRepository;
use crate::repo::space_repo::SpaceRepository;
use crate::service::{ServiceError, ServiceResult};

/// Highest role the user holds on the area, if any.
pub fn effective_area_role<R>(repo: &R, area: &Area, user_id: UserId) -> ServiceResult<Option<Role>>
where
    R: SpaceRepository + MemberRepository,
{
    let Some(space_role) = repo.space_role(area.space_id, user_id)? else {
        return Ok(None);
    };
    if space_role == Role::Owner {
        return Ok(Some(Role::Owner));
    }

    let explicit = repo.area_roles_for_user(area.id, user_id)?.into_iter().max();
    let floor = (!area.is_restricted).then_some(space_role);
    Ok(explicit.max(floor))
}

/// Loads an active area the user can see, with their role on it.
pub fn visible_area<R>(repo: &R, area_id: AreaId, user_id: UserId) -> ServiceResult<(Area, Role)>
where
    R: AreaRepository + SpaceRepository + MemberRepository,
{
    let area = repo
        .get_area(area_id)?
        .ok_or(ServiceError::not_found("area", area_id))?;
    match effective_area_role(repo, &area, user_id)? {
        Some(role) => Ok((area, role)),
        None => Err(ServiceError::not_found("area", area_id)),
    }
}

/// Like [`visible_area`] but requires a managing role (`admin` or `owner`).
pub fn managed_area<R>(repo: &R, area_id: AreaId, user_id: UserId) -> ServiceResult<Area>
where
    R: AreaRepository + SpaceRepository + MemberRepository,
{
    let (area, role) = visible_area(repo, area_id, user_id)?;
    if !role.can_manage() {
        return Err(ServiceError::not_found("area", area_id));
    }
    Ok(area)
}

/// Whether the user may read the document.
pub fn can_view_document<R>(repo: &R, document: &Document, user_id: UserId) -> ServiceResult<bool>
where
    R: AreaRepository + SpaceRepository + MemberRepository + DocumentRepository,
{
    if document.owner_id == user_id {
        return Ok(true);
    }
    match document.visibility {
        Visibility::Private => Ok(false),
        Visibility::Space => Ok(repo.space_role(document.space_id, user_id)?.is_some()),
        Visibility::Areas => {
            for shared in repo.shared_areas(document.id)? {
                let Some(area) = repo.get_area(shared.id)? else {
                    continue;
                };
                if effective_area_role(repo, &area, user_id)?.is_some() {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Whether every member of the area may read the document.
pub fn document_reaches_area<R>(repo: &R, document: &Document, area_id: AreaId) -> ServiceResult<bool>
where
    R: DocumentRepository,
{
    match document.visibility {
        Visibility::Private => Ok(false),
        Visibility::Space => Ok(true),
        Visibility::Areas => Ok(repo
            .shared_areas(document.id)?
            .iter()
            .any(|shared| shared.id == area_id)),
    }
}
