//! Space records: the top-level tenant container.

use crate::model::member::Role;
use crate::model::user::UserId;
use serde::Serialize;
use uuid::Uuid;

pub type SpaceId = Uuid;

/// Maximum length of a space name after trimming.
pub const MAX_SPACE_NAME_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One user's membership in a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceMember {
    pub space_id: SpaceId,
    pub user_id: UserId,
    pub role: Role,
    pub created_at: i64,
}
