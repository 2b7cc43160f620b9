//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce authorization and cross-record invariants above storage.
//! - Keep the HTTP layer decoupled from storage details.
//!
//! # Invariants
//! - Every operation takes the acting user explicitly.
//! - Records the actor may not see are reported as `NotFound`, never as a
//!   permission failure, so existence does not leak.

use crate::model::area::AreaValidationError;
use crate::model::arena::ArenaError;
use crate::model::document::InvalidVisibility;
use crate::model::member::InvalidRole;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod access;
pub mod arena_service;
pub mod area_service;
pub mod document_service;
pub mod member_service;
pub mod sharing_service;
pub mod space_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any write.
    Validation(String),
    /// Record missing, deleted, or not accessible to the actor.
    NotFound { entity: &'static str, id: Uuid },
    /// Write collides with an existing record.
    Conflict(String),
    Repo(RepoError),
}

impl ServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "{message}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::Repo(other),
        }
    }
}

impl From<AreaValidationError> for ServiceError {
    fn from(value: AreaValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<ArenaError> for ServiceError {
    fn from(value: ArenaError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<InvalidRole> for ServiceError {
    fn from(value: InvalidRole) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<InvalidVisibility> for ServiceError {
    fn from(value: InvalidVisibility) -> Self {
        Self::Validation(value.to_string())
    }
}
