//! Projection of domain records into search documents
//!
//! One rule per [`EntityType`] names the record fields feeding `title`,
//! `description` and `created_at`:
//!
//! | entity type  | title    | description      | created at |
//! |--------------|----------|------------------|------------|
//! | events       | Title    | Description      | Date       |
//! | places       | Name     | Description      | CreatedAt  |
//! | feedposts    | Text     | Content          | CreatedAt  |
//! | blogposts    | Title    | first text block | CreatedAt  |
//! | recipes      | Title    | Description      | CreatedAt  |
//! | products     | Name     | Description      | CreatedAt  |
//! | artists      | Name     | Bio              | CreatedAt  |
//! | songs        | Title    | Description      | UploadedAt |
//! | media        | Caption  | Caption          | CreatedAt  |
//! | merch        | Name     | Category         | CreatedAt  |
//! | menu         | Name     | Description      | CreatedAt  |
//! | farms        | Name     | Description      | CreatedAt  |
//! | crops        | Name     | Category         | CreatedAt  |
//! | users        | Username | Bio              | CreatedAt  |
//! | baitos       | Title    | Description      | CreatedAt  |
//! | baitoworkers | Name     | Bio              | CreatedAt  |
//!
//! Absent text fields become empty strings. Timestamps may be epoch
//! milliseconds (number or numeric string) or RFC3339 strings; a missing or
//! unreadable timestamp falls back to the current time with a warning.

use agora_core::{DomainRecord, EntityType, Result, SearchDoc, Timestamp};
use serde_json::Value;
use tracing::warn;

/// Where a document's description comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescriptionSource {
    Field(&'static str),
    FirstTextBlock,
}

/// Field mapping for one entity type
#[derive(Debug, Clone, Copy)]
struct Rule {
    title: &'static str,
    description: DescriptionSource,
    created_at: &'static str,
}

const fn rule(title: &'static str, description: &'static str, created_at: &'static str) -> Rule {
    Rule {
        title,
        description: DescriptionSource::Field(description),
        created_at,
    }
}

fn rule_for(entity_type: EntityType) -> Rule {
    use EntityType::*;
    match entity_type {
        Events => rule("Title", "Description", "Date"),
        Places => rule("Name", "Description", "CreatedAt"),
        FeedPosts => rule("Text", "Content", "CreatedAt"),
        BlogPosts => Rule {
            title: "Title",
            description: DescriptionSource::FirstTextBlock,
            created_at: "CreatedAt",
        },
        Recipes => rule("Title", "Description", "CreatedAt"),
        Products => rule("Name", "Description", "CreatedAt"),
        Artists => rule("Name", "Bio", "CreatedAt"),
        Songs => rule("Title", "Description", "UploadedAt"),
        Media => rule("Caption", "Caption", "CreatedAt"),
        Merch => rule("Name", "Category", "CreatedAt"),
        Menu => rule("Name", "Description", "CreatedAt"),
        Farms => rule("Name", "Description", "CreatedAt"),
        Crops => rule("Name", "Category", "CreatedAt"),
        Users => rule("Username", "Bio", "CreatedAt"),
        Baitos => rule("Title", "Description", "CreatedAt"),
        BaitoWorkers => rule("Name", "Bio", "CreatedAt"),
    }
}

const IMAGE_FIELDS: &[&str] = &["Image", "ImageUrl", "Thumbnail", "Banner", "Avatar", "Photo"];
const BLOCK_FIELDS: &[&str] = &["Blocks", "Content"];
const BLOCK_TEXT_FIELDS: &[&str] = &["Text", "Content", "Value"];

/// Project a domain record of a known type into a [`SearchDoc`].
///
/// `entity_id` is the id the record is stored under; it is authoritative
/// over anything the record body says.
pub fn normalize(entity_type: EntityType, entity_id: &str, record: &DomainRecord) -> SearchDoc {
    let rule = rule_for(entity_type);
    let entity_id = entity_id.to_string();

    let title = record.text(rule.title).unwrap_or_default();
    let description = match rule.description {
        DescriptionSource::Field(name) => record.text(name).unwrap_or_default(),
        DescriptionSource::FirstTextBlock => first_text_block(record).unwrap_or_default(),
    };
    let created_at = match record.field(rule.created_at).and_then(parse_timestamp) {
        Some(ts) => ts,
        None => {
            warn!(
                target: "agora::normalize",
                entity_type = %entity_type,
                entity_id = %entity_id,
                field = rule.created_at,
                "missing or unreadable creation time, defaulting to now"
            );
            Timestamp::now()
        }
    };

    let doc = SearchDoc {
        entity_id,
        entity_type,
        title,
        image: image_of(record),
        description,
        created_at,
    };
    if doc.is_blank() {
        warn!(
            target: "agora::normalize",
            entity_type = %entity_type,
            entity_id = %doc.entity_id,
            "record has neither title nor description text"
        );
    }
    doc
}

/// Like [`normalize`], for an entity type given by wire name.
///
/// Fails with `UnsupportedEntity` for names outside the closed set.
pub fn normalize_named(entity_type: &str, entity_id: &str, record: &DomainRecord) -> Result<SearchDoc> {
    let entity_type: EntityType = entity_type.parse()?;
    Ok(normalize(entity_type, entity_id, record))
}

/// Interpret a timestamp field value.
///
/// Integers (and numeric strings) are epoch milliseconds; other strings are
/// RFC3339.
pub fn parse_timestamp(value: &Value) -> Option<Timestamp> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(Timestamp::from_millis),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(millis) => Some(Timestamp::from_millis(millis)),
                Err(_) => Timestamp::parse_rfc3339(s),
            }
        }
        _ => None,
    }
}

fn first_text_block(record: &DomainRecord) -> Option<String> {
    BLOCK_FIELDS
        .iter()
        .find_map(|name| match record.field(name)? {
            Value::Array(blocks) => blocks.iter().find_map(block_text),
            // A bare string is one text block
            Value::String(text) => Some(text.clone()),
            _ => None,
        })
}

fn block_text(block: &Value) -> Option<String> {
    match block {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => {
            let block = DomainRecord::from_value(block.clone()).ok()?;
            if let Some(kind) = block.text("Type") {
                if !kind.eq_ignore_ascii_case("text") {
                    return None;
                }
            }
            BLOCK_TEXT_FIELDS.iter().find_map(|name| {
                block
                    .field(name)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
        }
        _ => None,
    }
}

fn image_of(record: &DomainRecord) -> String {
    IMAGE_FIELDS
        .iter()
        .find_map(|name| record.field(name).and_then(Value::as_str))
        .or_else(|| {
            record
                .field("Images")
                .and_then(Value::as_array)
                .and_then(|imgs| imgs.iter().find_map(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_default()
}
