//! Entity type enumeration
//!
//! The closed set of domain entity kinds the search core indexes. Each
//! variant has exactly one normalization rule; adding an entity kind means
//! adding a variant here and a rule in the normalizer.
//!
//! | EntityType   | id             |
//! |--------------|----------------|
//! | Events       | `events`       |
//! | Places       | `places`       |
//! | FeedPosts    | `feedposts`    |
//! | BlogPosts    | `blogposts`    |
//! | Recipes      | `recipes`      |
//! | Products     | `products`     |
//! | Artists      | `artists`      |
//! | Songs        | `songs`        |
//! | Media        | `media`        |
//! | Merch        | `merch`        |
//! | Menu         | `menu`         |
//! | Farms        | `farms`        |
//! | Crops        | `crops`        |
//! | Users        | `users`        |
//! | Baitos       | `baitos`       |
//! | BaitoWorkers | `baitoworkers` |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported domain entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// Scheduled events
    Events,
    /// Venues and locations
    Places,
    /// Short social feed posts
    FeedPosts,
    /// Long-form posts made of blocks
    BlogPosts,
    /// Cooking recipes
    Recipes,
    /// Marketplace products
    Products,
    /// Artist profiles
    Artists,
    /// Uploaded songs
    Songs,
    /// Photo and video uploads
    Media,
    /// Artist merchandise
    Merch,
    /// Restaurant menu items
    Menu,
    /// Farm listings
    Farms,
    /// Crops offered by farms
    Crops,
    /// User profiles
    Users,
    /// Part-time job listings
    Baitos,
    /// Worker profiles for part-time jobs
    #[serde(rename = "baitoworkers")]
    BaitoWorkers,
}

impl EntityType {
    /// All entity types (for iteration)
    pub const ALL: [EntityType; 16] = [
        EntityType::Events,
        EntityType::Places,
        EntityType::FeedPosts,
        EntityType::BlogPosts,
        EntityType::Recipes,
        EntityType::Products,
        EntityType::Artists,
        EntityType::Songs,
        EntityType::Media,
        EntityType::Merch,
        EntityType::Menu,
        EntityType::Farms,
        EntityType::Crops,
        EntityType::Users,
        EntityType::Baitos,
        EntityType::BaitoWorkers,
    ];

    /// Wire identifier, also the domain collection name
    pub const fn id(&self) -> &'static str {
        match self {
            EntityType::Events => "events",
            EntityType::Places => "places",
            EntityType::FeedPosts => "feedposts",
            EntityType::BlogPosts => "blogposts",
            EntityType::Recipes => "recipes",
            EntityType::Products => "products",
            EntityType::Artists => "artists",
            EntityType::Songs => "songs",
            EntityType::Media => "media",
            EntityType::Merch => "merch",
            EntityType::Menu => "menu",
            EntityType::Farms => "farms",
            EntityType::Crops => "crops",
            EntityType::Users => "users",
            EntityType::Baitos => "baitos",
            EntityType::BaitoWorkers => "baitoworkers",
        }
    }

    /// Parse from wire identifier (case-insensitive)
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.id().eq_ignore_ascii_case(id))
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        EntityType::from_id(s).ok_or_else(|| Error::UnsupportedEntity(s.to_string()))
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}
