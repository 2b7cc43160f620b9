//! Area membership use-case service.
//!
//! # Invariants
//! - The `owner` role is never granted, changed, or removed here.
//! - User targets must already belong to the area's space.
//! - Candidate search returns nothing for queries under two characters.

use crate::model::area::AreaId;
use crate::model::member::{AreaMember, AreaMemberId, AreaMemberView, MemberCandidate, MemberTarget, Role};
use crate::model::user::UserId;
use crate::repo::area_repo::AreaRepository;
use crate::repo::member_repo::MemberRepository;
use crate::repo::space_repo::SpaceRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::access::{managed_area, visible_area};
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Shortest trimmed query that triggers a candidate search.
pub const MIN_SEARCH_CHARS: usize = 2;
pub const SEARCH_LIMIT: u32 = 10;

pub struct MemberService<R>
where
    R: AreaRepository + SpaceRepository + MemberRepository + UserRepository,
{
    repo: R,
}

impl<R> MemberService<R>
where
    R: AreaRepository + SpaceRepository + MemberRepository + UserRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_members(&self, actor: UserId, area_id: AreaId) -> ServiceResult<Vec<AreaMemberView>> {
        visible_area(&self.repo, area_id, actor)?;
        Ok(self.repo.list_area_members(area_id)?)
    }

    pub fn add_member(
        &self,
        actor: UserId,
        area_id: AreaId,
        target: MemberTarget,
        role: &str,
    ) -> ServiceResult<AreaMember> {
        let area = managed_area(&self.repo, area_id, actor)?;
        let role = grantable_role(role)?;

        match target {
            MemberTarget::User(user_id) => {
                self.repo
                    .get_user(user_id)?
                    .ok_or(ServiceError::not_found("user", user_id))?;
                if self.repo.space_role(area.space_id, user_id)?.is_none() {
                    return Err(ServiceError::validation(
                        "user must be a member of the space first",
                    ));
                }
            }
            MemberTarget::Group(group_id) => {
                self.repo
                    .get_group(group_id)?
                    .ok_or(ServiceError::not_found("group", group_id))?;
            }
        }

        let member = self.repo.add_area_member(area_id, target, role)?;
        info!(
            "event=area_member_add module=service status=ok area_id={} member_id={} role={}",
            area_id, member.id, role
        );
        Ok(member)
    }

    pub fn update_member_role(
        &self,
        actor: UserId,
        area_id: AreaId,
        member_id: AreaMemberId,
        role: &str,
    ) -> ServiceResult<AreaMember> {
        managed_area(&self.repo, area_id, actor)?;
        let role = grantable_role(role)?;
        let existing = self.mutable_member(area_id, member_id)?;
        if existing.role == role {
            return Ok(existing);
        }

        self.repo.update_area_member_role(member_id, role)?;
        info!(
            "event=area_member_update module=service status=ok area_id={} member_id={} role={}",
            area_id, member_id, role
        );
        Ok(AreaMember { role, ..existing })
    }

    pub fn remove_member(
        &self,
        actor: UserId,
        area_id: AreaId,
        member_id: AreaMemberId,
    ) -> ServiceResult<()> {
        managed_area(&self.repo, area_id, actor)?;
        self.mutable_member(area_id, member_id)?;
        self.repo.remove_area_member(member_id)?;
        info!(
            "event=area_member_remove module=service status=ok area_id={} member_id={}",
            area_id, member_id
        );
        Ok(())
    }

    /// Autocomplete over space members and groups not yet in the area.
    pub fn search_candidates(
        &self,
        actor: UserId,
        area_id: AreaId,
        query: &str,
    ) -> ServiceResult<Vec<MemberCandidate>> {
        let area = managed_area(&self.repo, area_id, actor)?;
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Ok(Vec::new());
        }
        Ok(self
            .repo
            .search_member_candidates(area.space_id, area_id, query, SEARCH_LIMIT)?)
    }

    fn mutable_member(&self, area_id: AreaId, member_id: AreaMemberId) -> ServiceResult<AreaMember> {
        let member = self
            .repo
            .get_area_member(area_id, member_id)?
            .ok_or(ServiceError::not_found("area member", member_id))?;
        if member.is_owner() {
            return Err(ServiceError::validation("the area owner cannot be changed or removed"));
        }
        Ok(member)
    }
}

fn grantable_role(value: &str) -> ServiceResult<Role> {
    let role = value.parse::<Role>()?;
    if role == Role::Owner {
        return Err(ServiceError::validation("the owner role cannot be granted"));
    }
    Ok(role)
}

#[cfg(test)]
mod tests {
    use super::grantable_role;
    use crate::model::member::Role;
    use crate::service::ServiceError;

    #[test]
    fn owner_is_not_grantable() {
        assert_eq!(grantable_role(" Admin ").unwrap(), Role::Admin);
        assert!(matches!(
            grantable_role("owner"),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            grantable_role("superuser"),
            Err(ServiceError::Validation(_))
        ));
    }
}
