//! Display helpers shared by the result card and the detail sheet.

use crate::api::{Anime, MalEntity};

impl Anime {
    /// Large poster when available, otherwise the regular one
    pub fn preferred_image(&self) -> Option<&str> {
        let jpg = &self.images.jpg;
        [&jpg.large_image_url, &jpg.image_url]
            .into_iter()
            .filter_map(|url| url.as_deref())
            .find(|url| !url.is_empty())
    }

    /// English title, only when it adds something to the main title
    pub fn english_title(&self) -> Option<&str> {
        self.title_english
            .as_deref()
            .filter(|english| !english.is_empty() && *english != self.title)
    }

    pub fn score_label(&self) -> Option<String> {
        self.score.map(|score| format!("{:.2}", score))
    }

    /// e.g. `spring 1998`; needs both halves
    pub fn season_label(&self) -> Option<String> {
        match (&self.season, self.year) {
            (Some(season), Some(year)) => Some(format!("{} {}", season, year)),
            _ => None,
        }
    }

    pub fn genre_names(&self) -> String {
        join_names(&self.genres)
    }
}

/// Comma separated entity names
pub fn join_names(entities: &[MalEntity]) -> String {
    entities
        .iter()
        .map(|entity| entity.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn anime(value: serde_json::Value) -> Anime {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_preferred_image_falls_back_to_regular() {
        let both = anime(json!({
            "mal_id": 1,
            "title": "Cowboy Bebop",
            "images": { "jpg": { "image_url": "small.jpg", "large_image_url": "large.jpg" } }
        }));
        assert_eq!(both.preferred_image(), Some("large.jpg"));

        let regular = anime(json!({
            "mal_id": 1,
            "title": "Cowboy Bebop",
            "images": { "jpg": { "image_url": "small.jpg", "large_image_url": null } }
        }));
        assert_eq!(regular.preferred_image(), Some("small.jpg"));

        let blank_large = anime(json!({
            "mal_id": 1,
            "title": "Cowboy Bebop",
            "images": { "jpg": { "image_url": "small.jpg", "large_image_url": "" } }
        }));
        assert_eq!(blank_large.preferred_image(), Some("small.jpg"));

        let none = anime(json!({ "mal_id": 1, "title": "Cowboy Bebop" }));
        assert_eq!(none.preferred_image(), None);
    }

    #[test]
    fn test_english_title_hidden_when_same() {
        let same = anime(json!({ "mal_id": 1, "title": "Monster", "title_english": "Monster" }));
        assert_eq!(same.english_title(), None);

        let different = anime(json!({
            "mal_id": 20,
            "title": "Shingeki no Kyojin",
            "title_english": "Attack on Titan"
        }));
        assert_eq!(different.english_title(), Some("Attack on Titan"));
    }

    #[test]
    fn test_labels() {
        let entry = anime(json!({
            "mal_id": 1,
            "title": "Cowboy Bebop",
            "score": 8.75,
            "season": "spring",
            "year": 1998,
            "genres": [
                { "mal_id": 1, "type": "anime", "name": "Action", "url": "u" },
                { "mal_id": 24, "type": "anime", "name": "Sci-Fi", "url": "u" }
            ]
        }));
        assert_eq!(entry.score_label().as_deref(), Some("8.75"));
        assert_eq!(entry.season_label().as_deref(), Some("spring 1998"));
        assert_eq!(entry.genre_names(), "Action, Sci-Fi");

        let sparse = anime(json!({ "mal_id": 2, "title": "Untitled", "score": 7.0, "year": 2001 }));
        assert_eq!(sparse.score_label().as_deref(), Some("7.00"));
        assert_eq!(sparse.season_label(), None);
        assert_eq!(sparse.genre_names(), "");
    }
}
