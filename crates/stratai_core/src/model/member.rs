//! Roles and area membership records.
//!
//! # Invariants
//! - A membership targets exactly one user or one group ([`MemberTarget`]).
//! - `owner` rows are created with the area and never change afterwards.

use crate::model::area::AreaId;
use crate::model::user::{GroupId, UserId};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type AreaMemberId = Uuid;

/// Access role, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Member,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Whether this role may change attributes and membership.
    pub fn can_manage(self) -> bool {
        self >= Self::Admin
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRole(pub String);

impl Display for InvalidRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid role `{}`; expected owner|admin|member|viewer",
            self.0
        )
    }
}

impl Error for InvalidRole {}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Self::Viewer),
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            _ => Err(InvalidRole(value.to_string())),
        }
    }
}

/// Who a membership row grants access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum MemberTarget {
    User(UserId),
    Group(GroupId),
}

impl MemberTarget {
    pub fn user_id(self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(id),
            Self::Group(_) => None,
        }
    }

    pub fn group_id(self) -> Option<GroupId> {
        match self {
            Self::User(_) => None,
            Self::Group(id) => Some(id),
        }
    }
}

/// Persisted area membership row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaMember {
    pub id: AreaMemberId,
    pub area_id: AreaId,
    pub target: MemberTarget,
    pub role: Role,
    pub created_at: i64,
}

impl AreaMember {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

/// Membership row joined with the target's display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaMemberView {
    #[serde(flatten)]
    pub member: AreaMember,
    /// User display name or group name.
    pub display_name: String,
    /// Set for user targets only.
    pub email: Option<String>,
}

/// Autocomplete hit for the "add member" dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCandidate {
    pub target: MemberTarget,
    pub display_name: String,
    pub email: Option<String>,
}
