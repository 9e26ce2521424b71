use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::genres;

/// Service-assigned movie identifier.
pub type MovieId = u32;

pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/original";

/// Catalogue record produced by discovery. Only English-language movies
/// with a backdrop make it this far, so `backdrop_path` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub backdrop_path: String,
    pub genre_ids: Vec<u32>,
    pub popularity: f64,
    pub release_date: String,
    pub vote_average: f64,
    pub vote_count: u32,
    pub original_language: String,
}

impl MovieSummary {
    pub fn backdrop_url(&self) -> String {
        let path = self.backdrop_path.trim_start_matches('/');
        format!("{IMAGE_BASE}/{path}")
    }

    /// Names for the known genre codes, in the order the service listed them.
    pub fn genre_names(&self) -> Vec<&'static str> {
        self.genre_ids
            .iter()
            .filter_map(|id| genres::genre_name(*id))
            .collect()
    }

    pub fn has_genre(&self, genre_id: u32) -> bool {
        self.genre_ids.contains(&genre_id)
    }
}

/// Optional genre restriction for discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreFilter {
    pub id: u32,
    pub name: String,
}

impl GenreFilter {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Builds a filter for a known TMDB genre code.
    pub fn from_id(id: u32) -> Option<Self> {
        genres::genre_name(id).map(|name| Self::new(id, name))
    }
}

/// Secondary record fetched on demand and cached per movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetail {
    pub id: MovieId,
    pub runtime_minutes: u32,
    /// US certification; empty when the service has none.
    pub content_rating: String,
    pub directors: Vec<String>,
    /// Currency units; 0 when unknown.
    pub budget: u64,
}

impl MovieDetail {
    pub fn directors_joined(&self) -> String {
        self.directors.join(", ")
    }
}

/// What the presentation layer renders per list item: the summary it
/// already has, whether the user favorited it, and the enrichment outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCard {
    #[serde(flatten)]
    pub summary: MovieSummary,
    pub backdrop_url: String,
    pub genre_names: Vec<&'static str>,
    pub favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Arc<MovieDetail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_error: Option<String>,
}

impl MovieCard {
    /// A card with no enrichment attempted yet.
    pub fn new(summary: MovieSummary, favorite: bool) -> Self {
        Self {
            backdrop_url: summary.backdrop_url(),
            genre_names: summary.genre_names(),
            summary,
            favorite,
            detail: None,
            detail_error: None,
        }
    }
}
