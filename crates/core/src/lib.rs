//! Core types for the agora search core
//!
//! This crate defines the foundational types shared by storage and search:
//! - EntityType: closed set of indexed domain entity kinds
//! - ChangeEvent / Method: inbound change notifications
//! - SearchDoc / DocKey: the canonical indexed record and its identity
//! - Timestamp: nanosecond-precision creation time (posting score)
//! - DomainRecord: JSON-shaped domain entity
//! - OpContext: cancellation handle plus deadline
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change_event;
pub mod context;
pub mod entity_type;
pub mod error;
pub mod record;
pub mod search_doc;
pub mod timestamp;

pub use change_event::{ChangeEvent, Method, RawChangeEvent};
pub use context::{CancelHandle, OpContext};
pub use entity_type::EntityType;
pub use error::{Error, Result};
pub use record::DomainRecord;
pub use search_doc::{DocKey, SearchDoc};
pub use timestamp::Timestamp;
