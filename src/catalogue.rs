use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::models::MovieId;

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";

/// Raw access to the metadata service. Implementations never retry and
/// never recover errors locally.
#[async_trait]
pub trait CatalogueApi: Send + Sync {
    /// One page of `/movie/popular`; pages are 1-indexed.
    async fn fetch_page(&self, page: u32) -> FetchResult<PopularPage>;
    /// The detail record plus the credits and release-date sub-resources.
    async fn fetch_detail(&self, id: MovieId) -> FetchResult<RawDetail>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TmdbClient {
    pub fn new(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            bail!("API_TOKEN must not be empty");
        }
        let user_agent = format!("reelscout/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_env() -> Result<Self> {
        let token = env::var("API_TOKEN").context("API_TOKEN not set")?;
        let base_url = env::var("TMDB_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| TMDB_BASE.to_string());
        Self::new(token, base_url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> FetchResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::transport(&url, e))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| FetchError::transport(&url, e))?;
        if !status.is_success() {
            return Err(FetchError::Http {
                url,
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text)
            .map_err(|e| FetchError::Malformed(format!("{url}: {e}")))
    }
}

#[async_trait]
impl CatalogueApi for TmdbClient {
    async fn fetch_page(&self, page: u32) -> FetchResult<PopularPage> {
        debug!(page, "Fetching popular page");
        self.get_json(
            "/movie/popular",
            &[("language", "en".to_string()), ("page", page.to_string())],
        )
        .await
    }

    async fn fetch_detail(&self, id: MovieId) -> FetchResult<RawDetail> {
        debug!(movie_id = id, "Fetching movie detail");
        let lang = [("language", "en-US".to_string())];
        let path_detail = format!("/movie/{id}");
        let path_credits = format!("/movie/{id}/credits");
        let path_release_dates = format!("/movie/{id}/release_dates");

        let (movie, credits, release_dates) = tokio::try_join!(
            self.get_json::<MovieRecord>(&path_detail, &lang),
            self.get_json::<Credits>(&path_credits, &[]),
            self.get_json::<ReleaseDates>(&path_release_dates, &[]),
        )
        .map_err(|e| match e {
            FetchError::Http { status: 404, .. } => FetchError::NotFound(id),
            other => other,
        })?;
        Ok(RawDetail {
            movie,
            credits,
            release_dates,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PopularPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<RawMovie>,
}

/// A `/movie/popular` result as the service sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMovie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub original_language: String,
}

#[derive(Debug, Clone)]
pub struct RawDetail {
    pub movie: MovieRecord,
    pub credits: Credits,
    pub release_dates: ReleaseDates,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieRecord {
    pub id: MovieId,
    pub runtime: Option<u32>,
    pub budget: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credits {
    pub crew: Option<Vec<CrewMember>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrewMember {
    pub job: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDates {
    pub results: Option<Vec<ReleaseEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseEntry {
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseCert>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseCert {
    #[serde(default)]
    pub certification: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_backdrop_deserializes_as_none() {
        let page: PopularPage = serde_json::from_value(json!({
            "page": 1,
            "results": [
                { "id": 1, "title": "A", "backdrop_path": null, "original_language": "en" },
                { "id": 2, "title": "B", "backdrop_path": "/b.jpg", "genre_ids": [18] }
            ]
        }))
        .expect("page deserialize");
        assert_eq!(page.results.len(), 2);
        assert!(page.results[0].backdrop_path.is_none());
        assert_eq!(page.results[1].genre_ids, vec![18]);
        assert_eq!(page.results[1].original_language, "");
    }

    #[test]
    fn missing_runtime_stays_absent() {
        let record: MovieRecord =
            serde_json::from_value(json!({ "id": 7, "runtime": null, "budget": 10 }))
                .expect("record deserialize");
        assert_eq!(record.runtime, None);
        assert_eq!(record.budget, Some(10));
    }

    #[test]
    fn rejects_blank_token() {
        assert!(TmdbClient::new("  ", TMDB_BASE).is_err());
    }
}
