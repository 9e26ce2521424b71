#![allow(dead_code)]

use async_trait::async_trait;
use reelscout::catalogue::{CatalogueApi, PopularPage, RawDetail};
use reelscout::error::{FetchError, FetchResult};
use reelscout::models::MovieId;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scriptable catalogue: canned pages and details, per-page delays and
/// failures, and call counters.
#[derive(Default)]
pub struct FakeCatalogue {
    pub pages: HashMap<u32, Value>,
    pub failing_pages: HashSet<u32>,
    pub page_delays_ms: HashMap<u32, u64>,
    pub details: HashMap<MovieId, Value>,
    pub detail_delay_ms: u64,
    pub detail_failures: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub pages_settled: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub completion_order: Mutex<Vec<u32>>,
    pub detail_calls: AtomicUsize,
}

impl FakeCatalogue {
    pub fn with_pages(pages: Vec<Value>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .enumerate()
                .map(|(i, p)| (i as u32 + 1, p))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_detail(mut self, id: MovieId, detail: Value) -> Self {
        self.details.insert(id, detail);
        self
    }

    pub fn fail_details(self, times: usize) -> Self {
        self.detail_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogueApi for FakeCatalogue {
    async fn fetch_page(&self, page: u32) -> FetchResult<PopularPage> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.page_delays_ms.get(&page).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.pages_settled.fetch_add(1, Ordering::SeqCst);
        self.completion_order.lock().unwrap().push(page);

        if self.failing_pages.contains(&page) {
            return Err(FetchError::Http {
                url: format!("fake://movie/popular?page={page}"),
                status: 500,
                body: "boom".to_string(),
            });
        }
        let value = self
            .pages
            .get(&page)
            .cloned()
            .unwrap_or_else(|| json!({ "page": page, "results": [] }));
        Ok(serde_json::from_value(value).expect("fake page"))
    }

    async fn fetch_detail(&self, id: MovieId) -> FetchResult<RawDetail> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(self.detail_delay_ms)).await;

        let failing = self
            .detail_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(FetchError::Http {
                url: format!("fake://movie/{id}"),
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let value = self.details.get(&id).ok_or(FetchError::NotFound(id))?;
        Ok(RawDetail {
            movie: serde_json::from_value(value["movie"].clone()).expect("fake movie"),
            credits: serde_json::from_value(value["credits"].clone()).expect("fake credits"),
            release_dates: serde_json::from_value(value["release_dates"].clone())
                .expect("fake release dates"),
        })
    }
}

pub fn raw_movie(id: u32, backdrop: Option<&str>, lang: &str, genres: &[u32]) -> Value {
    json!({
        "id": id,
        "title": format!("Movie {id}"),
        "original_title": format!("Movie {id}"),
        "overview": "An overview.",
        "backdrop_path": backdrop,
        "genre_ids": genres,
        "popularity": 10.5,
        "release_date": "2024-05-01",
        "vote_average": 7.1,
        "vote_count": 321,
        "original_language": lang
    })
}

/// Five pages of 20 results each, ids `page * 100 + index`. Page 1 holds
/// one result without a backdrop (index 3) and one French result (index 7).
/// Every even index carries genre 28, every index divisible by 3 genre 35.
pub fn five_pages() -> Vec<Value> {
    (1..=5u32)
        .map(|page| {
            let results: Vec<Value> = (0..20u32)
                .map(|i| {
                    let id = page * 100 + i;
                    let mut genres = Vec::new();
                    if i % 2 == 0 {
                        genres.push(28);
                    }
                    if i % 3 == 0 {
                        genres.push(35);
                    }
                    let backdrop = if page == 1 && i == 3 {
                        None
                    } else {
                        Some("/backdrop.jpg")
                    };
                    let lang = if page == 1 && i == 7 { "fr" } else { "en" };
                    raw_movie(id, backdrop, lang, &genres)
                })
                .collect();
            json!({ "page": page, "results": results })
        })
        .collect()
}

pub fn matrix_detail() -> Value {
    json!({
        "movie": { "id": 603, "runtime": 136, "budget": 63000000 },
        "credits": { "crew": [
            { "job": "Director", "name": "Lana Wachowski" },
            { "job": "Director of Photography", "name": "Bill Pope" },
            { "job": "Director", "name": "Lilly Wachowski" }
        ]},
        "release_dates": { "results": [
            { "iso_3166_1": "US", "release_dates": [{ "certification": "R" }] }
        ]}
    })
}

pub fn plain_detail(id: MovieId) -> Value {
    json!({
        "movie": { "id": id, "runtime": 100, "budget": 0 },
        "credits": { "crew": [] },
        "release_dates": { "results": [] }
    })
}
