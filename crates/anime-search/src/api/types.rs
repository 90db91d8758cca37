//! Jikan API v4 response types.
//!
//! These types represent the JSON responses from the Jikan API. Nullable or
//! missing upstream fields deserialize to `None` or an empty list so a sparse
//! entry never fails the whole page.

use serde::{Deserialize, Serialize};

/// Paginated search response (`GET /anime`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeSearchResponse {
    pub data: Vec<Anime>,
    pub pagination: Pagination,
}

/// Single entry response (`GET /anime/{id}/full`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeFullResponse {
    pub data: AnimeFull,
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub last_visible_page: u32,
    pub has_next_page: bool,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default)]
    pub items: Option<PaginationItems>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationItems {
    pub count: u32,
    pub total: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Total number of matching entries, if the service reported it
    pub fn total_items(&self) -> Option<u32> {
        self.items.as_ref().map(|items| items.total)
    }

    /// Whether `page` exists according to this metadata
    pub fn contains_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.last_visible_page
    }
}

/// Search result entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    pub mal_id: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub images: AnimeImages,
    #[serde(default)]
    pub trailer: Option<Trailer>,
    #[serde(default)]
    pub approved: bool,

    // Titles
    #[serde(default)]
    pub titles: Vec<Title>,
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,

    // Type and status
    #[serde(rename = "type", default)]
    pub anime_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub airing: bool,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,

    // Scores and rankings
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub scored_by: Option<u32>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub popularity: Option<u32>,
    #[serde(default)]
    pub members: Option<u32>,
    #[serde(default)]
    pub favorites: Option<u32>,

    // Synopsis
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub background: Option<String>,

    // Season
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,

    // Genres, themes, demographics
    #[serde(default)]
    pub genres: Vec<MalEntity>,
    #[serde(default)]
    pub themes: Vec<MalEntity>,
    #[serde(default)]
    pub demographics: Vec<MalEntity>,
}

/// Full entry with relations, studios and producers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeFull {
    #[serde(flatten)]
    pub anime: Anime,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub theme: Option<ThemeSongs>,
    #[serde(default)]
    pub external: Vec<ExternalLink>,
    #[serde(default)]
    pub streaming: Vec<ExternalLink>,
    #[serde(default)]
    pub producers: Vec<MalEntity>,
    #[serde(default)]
    pub licensors: Vec<MalEntity>,
    #[serde(default)]
    pub studios: Vec<MalEntity>,
}

/// Anime images
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimeImages {
    #[serde(default)]
    pub jpg: ImageSet,
    #[serde(default)]
    pub webp: Option<ImageSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
    pub small_image_url: Option<String>,
    pub large_image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trailer {
    pub youtube_id: Option<String>,
    pub url: Option<String>,
    pub embed_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    #[serde(rename = "type")]
    pub title_type: String,
    pub title: String,
}

/// MAL entity (genre, studio, producer, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalEntity {
    pub mal_id: u32,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub name: String,
    pub url: String,
}

/// Related entries grouped by relation kind ("Sequel", "Adaptation", ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub relation: String,
    pub entry: Vec<MalEntity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSongs {
    #[serde(default)]
    pub openings: Vec<String>,
    #[serde(default)]
    pub endings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub name: String,
    pub url: String,
}

/// Error response from Jikan API
///
/// Every field is optional: proxies and gateways in front of the service do
/// not always answer with the Jikan shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JikanError {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
