// Shared domain types
use serde::{Deserialize, Serialize};

// =============================================================================
// Core Domain Types
// =============================================================================

/// Row of the external images side table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalImageEntry {
    pub id: Option<i64>,
    pub item_id: i64,
    pub thumbnail_uri: String,
    pub full_uri: String,
    pub linkto_uri: String,
    pub width: u32,
    pub height: u32,
}

/// Kind of host record owning element texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Item,
    Collection,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Item => "Item",
            RecordKind::Collection => "Collection",
        }
    }
}

/// Host record reference passed to filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub kind: RecordKind,
    pub id: i64,
}

impl RecordRef {
    pub fn item(id: i64) -> Self {
        Self {
            kind: RecordKind::Item,
            id,
        }
    }

    pub fn collection(id: i64) -> Self {
        Self {
            kind: RecordKind::Collection,
            id,
        }
    }
}

/// Theme a fragment is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayContext {
    Admin,
    Public,
}

// =============================================================================
// Configuration Form
// =============================================================================

/// Submitted configuration form. Widths arrive as raw text and are validated
/// before anything is stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigForm {
    pub thumb_tag: Option<String>,
    pub full_image_tag: Option<String>,
    pub linkto_tag: Option<String>,
    pub embed_admin: bool,
    pub width_admin: String,
    pub embed_public: bool,
    pub width_public: String,
    pub items_width: Option<String>,
}
