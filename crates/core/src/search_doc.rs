//! The canonical indexed record
//!
//! A [`SearchDoc`] is the uniform projection of any domain entity. The
//! Search Document Store keeps exactly one per [`DocKey`]; the indexer
//! diffs against it to compute posting deltas.

use crate::entity_type::EntityType;
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Identity of a search document: `(entityType, entityId)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocKey {
    /// Kind of entity
    pub entity_type: EntityType,
    /// Opaque id, unique within `entity_type`
    pub entity_id: String,
}

impl DocKey {
    /// Create a document key
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        DocKey {
            entity_type,
            entity_id: entity_id.into(),
        }
    }
}

impl std::fmt::Display for DocKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.entity_id)
    }
}

/// Normalized, indexed projection of a domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDoc {
    /// Opaque id, unique within `entity_type`
    pub entity_id: String,
    /// Kind of entity
    pub entity_type: EntityType,
    /// Primary text
    pub title: String,
    /// Opaque image reference, never indexed
    #[serde(default)]
    pub image: String,
    /// Secondary text
    #[serde(default)]
    pub description: String,
    /// Creation time; the posting-list score
    pub created_at: Timestamp,
}

impl SearchDoc {
    /// Create a document with an empty image reference
    pub fn new(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        SearchDoc {
            entity_id: entity_id.into(),
            entity_type,
            title: title.into(),
            image: String::new(),
            description: description.into(),
            created_at,
        }
    }

    /// Builder: set the image reference
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Store identity of this document
    pub fn key(&self) -> DocKey {
        DocKey::new(self.entity_type, self.entity_id.clone())
    }

    /// Text fed to the tokenizer: `title + " " + description`
    pub fn indexed_text(&self) -> String {
        let mut text = String::with_capacity(self.title.len() + self.description.len() + 1);
        text.push_str(&self.title);
        text.push(' ');
        text.push_str(&self.description);
        text
    }

    /// Whether both indexed fields are blank
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.description.trim().is_empty()
    }
}
