use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalogue::{CatalogueApi, PopularPage, RawMovie};
use crate::error::FetchResult;
use crate::models::{GenreFilter, MovieSummary};

/// Number of `/movie/popular` pages merged per discovery.
pub const DISCOVERY_PAGES: u32 = 5;

const ENGLISH: &str = "en";

/// Fetches the popular pages concurrently and merges them into one list.
pub struct Discovery {
    api: Arc<dyn CatalogueApi>,
}

impl Discovery {
    pub fn new(api: Arc<dyn CatalogueApi>) -> Self {
        Self { api }
    }

    /// Returns a fresh snapshot: page 1 through 5 in order, each page in the
    /// order the service returned it, filtered by [`is_included`].
    ///
    /// Every page request is awaited before anything is merged. If any page
    /// failed, the first failure in page order is returned and no partial
    /// list is produced.
    pub async fn discover(&self, genre: Option<&GenreFilter>) -> FetchResult<Vec<MovieSummary>> {
        let requests = (1..=DISCOVERY_PAGES).map(|page| self.api.fetch_page(page));
        let settled = join_all(requests).await;

        let mut pages = Vec::with_capacity(settled.len());
        let mut first_error = None;
        for (idx, outcome) in settled.into_iter().enumerate() {
            match outcome {
                Ok(page) => pages.push(page),
                Err(e) => {
                    warn!(page = idx + 1, "Popular page fetch failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        let movies = merge_pages(pages, genre);
        info!(
            count = movies.len(),
            genre = genre.map(|g| g.name.as_str()),
            "Discovery finished"
        );
        Ok(movies)
    }
}

/// Concatenates pages in the given order, keeping only included results.
pub fn merge_pages(pages: Vec<PopularPage>, genre: Option<&GenreFilter>) -> Vec<MovieSummary> {
    let mut out = Vec::new();
    for page in pages {
        let before = out.len();
        let raw_count = page.results.len();
        out.extend(
            page.results
                .into_iter()
                .filter(|m| is_included(m, genre))
                .filter_map(into_summary),
        );
        debug!(
            page = page.page,
            kept = out.len() - before,
            dropped = raw_count - (out.len() - before),
            "Merged page"
        );
    }
    out
}

/// A result is kept when it has a backdrop, is English-language, and
/// carries the filter's genre code when a filter is given.
pub fn is_included(movie: &RawMovie, genre: Option<&GenreFilter>) -> bool {
    let has_backdrop = movie
        .backdrop_path
        .as_deref()
        .is_some_and(|p| !p.trim().is_empty());
    if !has_backdrop || movie.original_language != ENGLISH {
        return false;
    }
    match genre {
        Some(g) => movie.genre_ids.contains(&g.id),
        None => true,
    }
}

fn into_summary(raw: RawMovie) -> Option<MovieSummary> {
    Some(MovieSummary {
        id: raw.id,
        title: raw.title,
        original_title: raw.original_title,
        overview: raw.overview,
        backdrop_path: raw.backdrop_path?,
        genre_ids: raw.genre_ids,
        popularity: raw.popularity,
        release_date: raw.release_date,
        vote_average: raw.vote_average,
        vote_count: raw.vote_count,
        original_language: raw.original_language,
    })
}
