//! Area domain model.
//!
//! # Responsibility
//! - Define the access-control and AI-context unit inside a space.
//! - Normalize and validate user-supplied area attributes.
//!
//! # Invariants
//! - Each space owns exactly one General area.
//! - The General area is never restricted, renamed, or deleted.
//! - `color`, when set, is a `#rrggbb` hex string.

use crate::model::document::DocumentId;
use crate::model::space::SpaceId;
use crate::model::user::UserId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type AreaId = Uuid;

/// Name given to the default area of every space.
pub const GENERAL_AREA_NAME: &str = "General";
pub const MAX_AREA_NAME_CHARS: usize = 60;
/// Upper bound for prompt context text.
pub const MAX_AREA_CONTEXT_CHARS: usize = 20_000;

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid hex color regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: AreaId,
    pub space_id: SpaceId,
    pub name: String,
    pub is_general: bool,
    pub is_restricted: bool,
    pub color: Option<String>,
    /// Free text injected into AI prompts for conversations in this area.
    pub context: Option<String>,
    pub context_document_ids: Vec<DocumentId>,
    pub created_by: UserId,
    #[serde(skip)]
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation input for a non-General area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArea {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub is_restricted: bool,
}

/// Partial update. `None` leaves a field unchanged; an empty `color` or
/// `context` string clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub context: Option<String>,
    pub is_restricted: Option<bool>,
    pub context_document_ids: Option<Vec<DocumentId>>,
}

impl AreaPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.context.is_none()
            && self.is_restricted.is_none()
            && self.context_document_ids.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaValidationError {
    BlankName,
    NameTooLong { max_chars: usize },
    InvalidColor(String),
    ContextTooLong { max_chars: usize },
    GeneralRename,
    GeneralRestrict,
    GeneralDelete,
}

impl Display for AreaValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "area name must not be blank"),
            Self::NameTooLong { max_chars } => {
                write!(f, "area name must be at most {max_chars} characters")
            }
            Self::InvalidColor(value) => {
                write!(f, "invalid area color `{value}`; expected #rrggbb")
            }
            Self::ContextTooLong { max_chars } => {
                write!(f, "area context must be at most {max_chars} characters")
            }
            Self::GeneralRename => write!(f, "the General area cannot be renamed"),
            Self::GeneralRestrict => write!(f, "the General area is always open"),
            Self::GeneralDelete => write!(f, "the General area cannot be deleted"),
        }
    }
}

impl Error for AreaValidationError {}

impl Area {
    /// Applies a patch in memory, enforcing General-area invariants.
    ///
    /// Context document ids are copied as given; the caller checks that they
    /// belong to the same space.
    pub fn apply_patch(&mut self, patch: &AreaPatch) -> Result<(), AreaValidationError> {
        if let Some(name) = &patch.name {
            let name = normalize_area_name(name)?;
            if self.is_general && name != self.name {
                return Err(AreaValidationError::GeneralRename);
            }
            self.name = name;
        }
        if let Some(restricted) = patch.is_restricted {
            if self.is_general && restricted {
                return Err(AreaValidationError::GeneralRestrict);
            }
            self.is_restricted = restricted;
        }
        if let Some(color) = &patch.color {
            self.color = normalize_color(color)?;
        }
        if let Some(context) = &patch.context {
            self.context = normalize_context(context)?;
        }
        if let Some(ids) = &patch.context_document_ids {
            self.context_document_ids = dedup_preserving_order(ids);
        }
        Ok(())
    }
}

/// Trims and bounds an area name.
pub fn normalize_area_name(value: &str) -> Result<String, AreaValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AreaValidationError::BlankName);
    }
    if trimmed.chars().count() > MAX_AREA_NAME_CHARS {
        return Err(AreaValidationError::NameTooLong {
            max_chars: MAX_AREA_NAME_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// Lowercases a `#rrggbb` color; blank input clears it.
pub fn normalize_color(value: &str) -> Result<Option<String>, AreaValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !HEX_COLOR_RE.is_match(trimmed) {
        return Err(AreaValidationError::InvalidColor(trimmed.to_string()));
    }
    Ok(Some(trimmed.to_ascii_lowercase()))
}

/// Bounds prompt context; whitespace-only input clears it.
pub fn normalize_context(value: &str) -> Result<Option<String>, AreaValidationError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    if value.chars().count() > MAX_AREA_CONTEXT_CHARS {
        return Err(AreaValidationError::ContextTooLong {
            max_chars: MAX_AREA_CONTEXT_CHARS,
        });
    }
    Ok(Some(value.to_string()))
}

pub(crate) fn dedup_preserving_order(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
