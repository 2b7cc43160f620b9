//! Document records and sharing scope.
//!
//! # Invariants
//! - `file_size` is the UTF-8 byte length of the stored content.
//! - `char_count` counts Unicode scalar values, not bytes.
//! - Share rows exist only while `visibility == Visibility::Areas`.

use crate::model::area::AreaId;
use crate::model::space::SpaceId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type DocumentId = Uuid;

pub const MAX_FILENAME_CHARS: usize = 255;

/// Who besides the owner can see a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Areas,
    Space,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Areas => "areas",
            Self::Space => "space",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVisibility(pub String);

impl Display for InvalidVisibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid visibility `{}`; expected private|areas|space",
            self.0
        )
    }
}

impl Error for InvalidVisibility {}

impl FromStr for Visibility {
    type Err = InvalidVisibility;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "private" => Ok(Self::Private),
            "areas" => Ok(Self::Areas),
            "space" => Ok(Self::Space),
            other => Err(InvalidVisibility(other.to_string())),
        }
    }
}

/// Validated visibility transition. `Areas` always carries at least one id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityChange {
    Private,
    Space,
    Areas(BTreeSet<AreaId>),
}

impl VisibilityChange {
    pub fn visibility(&self) -> Visibility {
        match self {
            Self::Private => Visibility::Private,
            Self::Space => Visibility::Space,
            Self::Areas(_) => Visibility::Areas,
        }
    }

    pub fn area_ids(&self) -> impl Iterator<Item = &AreaId> {
        let ids = match self {
            Self::Areas(ids) => Some(ids),
            Self::Private | Self::Space => None,
        };
        ids.into_iter().flatten()
    }
}

/// Document metadata. Content is stored alongside but loaded separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub space_id: SpaceId,
    pub owner_id: UserId,
    pub filename: String,
    pub title: String,
    pub file_size: i64,
    pub char_count: i64,
    pub visibility: Visibility,
    #[serde(skip)]
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Upload input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
}

impl NewDocument {
    pub fn file_size(&self) -> i64 {
        self.content.len() as i64
    }

    pub fn char_count(&self) -> i64 {
        self.content.chars().count() as i64
    }
}

/// Area a document is shared into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedArea {
    pub id: AreaId,
    pub name: String,
    pub color: Option<String>,
}

/// Sharing state of one document as exposed to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSharing {
    pub document_id: DocumentId,
    pub visibility: Visibility,
    pub shared_areas: Vec<SharedArea>,
}

#[cfg(test)]
mod tests {
    use super::{NewDocument, Visibility, VisibilityChange};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    #[test]
    fn visibility_parse_is_exact() {
        assert_eq!("areas".parse::<Visibility>().unwrap(), Visibility::Areas);
        assert!("Areas".parse::<Visibility>().is_err());
        assert!("public".parse::<Visibility>().is_err());
    }

    #[test]
    fn size_counts_bytes_and_chars_separately() {
        let doc = NewDocument {
            filename: "notes.md".to_string(),
            title: None,
            content: "héllo".to_string(),
        };
        assert_eq!(doc.file_size(), 6);
        assert_eq!(doc.char_count(), 5);
    }

    #[test]
    fn only_areas_change_yields_area_ids() {
        let id = Uuid::new_v4();
        let change = VisibilityChange::Areas(BTreeSet::from([id]));
        assert_eq!(change.area_ids().copied().collect::<Vec<_>>(), vec![id]);
        assert_eq!(VisibilityChange::Space.area_ids().count(), 0);
    }
}
