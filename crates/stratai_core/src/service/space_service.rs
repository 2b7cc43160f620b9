//! Space use-case service.
//!
//! # Invariants
//! - A new space always comes with its owner membership and General area.
//! - The `owner` role cannot be granted after creation.

use crate::model::area::Area;
use crate::model::member::Role;
use crate::model::space::{Space, SpaceId, SpaceMember, MAX_SPACE_NAME_CHARS};
use crate::model::user::UserId;
use crate::repo::space_repo::SpaceRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

pub struct SpaceService<R: SpaceRepository + UserRepository> {
    repo: R,
}

impl<R: SpaceRepository + UserRepository> SpaceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a space owned by `actor` together with its General area.
    pub fn create_space(&self, actor: UserId, name: &str) -> ServiceResult<(Space, Area)> {
        let name = normalize_space_name(name)?;
        let (space, general) = self.repo.create_space(&name, actor)?;
        info!(
            "event=space_create module=service status=ok space_id={} general_area_id={}",
            space.id, general.id
        );
        Ok((space, general))
    }

    pub fn list_spaces(&self, actor: UserId) -> ServiceResult<Vec<Space>> {
        Ok(self.repo.list_spaces_for_user(actor)?)
    }

    /// Loads a space the actor belongs to, with their role.
    pub fn get_space(&self, actor: UserId, space_id: SpaceId) -> ServiceResult<(Space, Role)> {
        let role = self
            .repo
            .space_role(space_id, actor)?
            .ok_or(ServiceError::not_found("space", space_id))?;
        let space = self
            .repo
            .get_space(space_id)?
            .ok_or(ServiceError::not_found("space", space_id))?;
        Ok((space, role))
    }

    /// Adds a user to the space. Requires `admin` or `owner` on the space.
    pub fn add_space_member(
        &self,
        actor: UserId,
        space_id: SpaceId,
        user_id: UserId,
        role: &str,
    ) -> ServiceResult<SpaceMember> {
        let (_, actor_role) = self.get_space(actor, space_id)?;
        if !actor_role.can_manage() {
            return Err(ServiceError::not_found("space", space_id));
        }

        let role = role.parse::<Role>()?;
        if role == Role::Owner {
            return Err(ServiceError::validation("the owner role cannot be granted"));
        }
        self.repo
            .get_user(user_id)?
            .ok_or(ServiceError::not_found("user", user_id))?;

        let member = self.repo.add_space_member(space_id, user_id, role)?;
        info!(
            "event=space_member_add module=service status=ok space_id={} user_id={} role={}",
            space_id, user_id, role
        );
        Ok(member)
    }
}

fn normalize_space_name(value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation("space name must not be blank"));
    }
    if trimmed.chars().count() > MAX_SPACE_NAME_CHARS {
        return Err(ServiceError::validation(format!(
            "space name must be at most {MAX_SPACE_NAME_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}
