//! Change notifications consumed by the indexer
//!
//! The only cross-subsystem input is `{entityType, entityId, method}`. It
//! arrives either as an in-process call or as a JSON pub/sub payload; both
//! paths end up as a typed [`ChangeEvent`].

use crate::entity_type::EntityType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Mutation kind carried by a change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Entity created
    Post,
    /// Entity replaced
    Put,
    /// Entity partially updated; same effect as `Put`
    Patch,
    /// Entity removed
    Delete,
}

impl Method {
    /// Wire name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// `PUT` and `PATCH` both re-index an existing entity
    pub const fn is_update(&self) -> bool {
        matches!(self, Method::Put | Method::Patch)
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untyped change event as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChangeEvent {
    /// Entity type id, e.g. `"events"`
    pub entity_type: String,
    /// Opaque entity id
    pub entity_id: String,
    /// HTTP-style method name
    pub method: String,
}

/// Typed change event
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    /// Kind of the changed entity
    pub entity_type: EntityType,
    /// Opaque entity id
    pub entity_id: String,
    /// What happened to it
    pub method: Method,
}

impl ChangeEvent {
    /// Create a typed change event
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>, method: Method) -> Self {
        ChangeEvent {
            entity_type,
            entity_id: entity_id.into(),
            method,
        }
    }

    /// Parse loosely typed fields, validating type and method.
    pub fn parse(entity_type: &str, entity_id: &str, method: &str) -> Result<Self> {
        let method: Method = method.parse()?;
        let entity_type: EntityType = entity_type.parse()?;
        if entity_id.trim().is_empty() {
            return Err(Error::InvalidEvent("entityId is empty".to_string()));
        }
        Ok(ChangeEvent::new(entity_type, entity_id, method))
    }

    /// Decode a pub/sub JSON payload.
    ///
    /// ```
    /// use agora_core::{ChangeEvent, EntityType, Method};
    ///
    /// let ev = ChangeEvent::from_json(
    ///     br#"{"entityType":"events","entityId":"e1","method":"PUT"}"#,
    /// ).unwrap();
    /// assert_eq!(ev.entity_type, EntityType::Events);
    /// assert_eq!(ev.method, Method::Put);
    /// ```
    pub fn from_json(payload: &[u8]) -> Result<Self> {
        let raw: RawChangeEvent = serde_json::from_slice(payload)?;
        ChangeEvent::try_from(raw)
    }
}

impl TryFrom<RawChangeEvent> for ChangeEvent {
    type Error = Error;

    fn try_from(raw: RawChangeEvent) -> Result<Self> {
        ChangeEvent::parse(&raw.entity_type, &raw.entity_id, &raw.method)
    }
}

impl From<&ChangeEvent> for RawChangeEvent {
    fn from(ev: &ChangeEvent) -> Self {
        RawChangeEvent {
            entity_type: ev.entity_type.id().to_string(),
            entity_id: ev.entity_id.clone(),
            method: ev.method.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.method, self.entity_type, self.entity_id)
    }
}
