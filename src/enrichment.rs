//! Per-movie detail cache.
//!
//! Each movie id maps either to a finished [`MovieDetail`] or to the single
//! fetch currently running for it. Callers arriving while a fetch is running
//! await that same fetch. A failed fetch is never served from the map: the
//! next call starts over.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalogue::{CatalogueApi, RawDetail, ReleaseDates};
use crate::error::{FetchError, FetchResult};
use crate::models::{MovieDetail, MovieId};

type DetailFuture = Shared<BoxFuture<'static, FetchResult<Arc<MovieDetail>>>>;

enum Slot {
    Ready(Arc<MovieDetail>),
    Pending(DetailFuture),
}

impl Slot {
    /// The finished record, including a pending fetch that already
    /// succeeded but whose waiters never got back to the map.
    fn settled(&self) -> Option<Arc<MovieDetail>> {
        match self {
            Slot::Ready(detail) => Some(Arc::clone(detail)),
            Slot::Pending(fetch) => match fetch.peek() {
                Some(Ok(detail)) => Some(Arc::clone(detail)),
                _ => None,
            },
        }
    }
}

pub struct EnrichmentCache {
    api: Arc<dyn CatalogueApi>,
    slots: Mutex<HashMap<MovieId, Slot>>,
}

impl EnrichmentCache {
    pub fn new(api: Arc<dyn CatalogueApi>) -> Self {
        Self {
            api,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the detail record for `id`, fetching it at most once.
    pub async fn get_detail(&self, id: MovieId) -> FetchResult<Arc<MovieDetail>> {
        let fetch = {
            let mut slots = self.slots.lock().await;
            if let Some(detail) = slots.get(&id).and_then(Slot::settled) {
                debug!(movie_id = id, "Detail cache hit");
                slots.insert(id, Slot::Ready(Arc::clone(&detail)));
                return Ok(detail);
            }
            // a pending fetch that already failed is replaced, not joined
            match slots.get(&id) {
                Some(Slot::Pending(fetch)) if fetch.peek().is_none() => {
                    debug!(movie_id = id, "Joining in-flight detail fetch");
                    fetch.clone()
                }
                _ => {
                    debug!(movie_id = id, "Detail cache miss");
                    let fetch = self.start_fetch(id);
                    slots.insert(id, Slot::Pending(fetch.clone()));
                    fetch
                }
            }
        };

        let outcome = fetch.clone().await;

        let mut slots = self.slots.lock().await;
        let still_ours = matches!(slots.get(&id), Some(Slot::Pending(p)) if p.ptr_eq(&fetch));
        if still_ours {
            match &outcome {
                Ok(detail) => {
                    slots.insert(id, Slot::Ready(Arc::clone(detail)));
                }
                Err(e) => {
                    warn!(movie_id = id, "Detail fetch failed: {}", e);
                    slots.remove(&id);
                }
            }
        }
        outcome
    }

    /// The cached record for `id`, without any I/O.
    pub async fn cached(&self, id: MovieId) -> Option<Arc<MovieDetail>> {
        self.slots.lock().await.get(&id).and_then(Slot::settled)
    }

    /// Number of finished records held.
    pub async fn len(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|s| s.settled().is_some())
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn start_fetch(&self, id: MovieId) -> DetailFuture {
        let api = Arc::clone(&self.api);
        async move {
            let raw = api.fetch_detail(id).await?;
            let detail = normalize_detail(id, raw)?;
            info!(
                movie_id = id,
                runtime = detail.runtime_minutes,
                "Enriched movie"
            );
            Ok::<_, FetchError>(Arc::new(detail))
        }
        .boxed()
        .shared()
    }
}

/// Maps the raw detail payloads onto a [`MovieDetail`].
///
/// Runtime, budget, the crew list and the release-date list must all be
/// present; a missing one is reported as [`FetchError::Malformed`]. A movie
/// with no US certification gets an empty content rating.
pub fn normalize_detail(id: MovieId, raw: RawDetail) -> FetchResult<MovieDetail> {
    let RawDetail {
        movie,
        credits,
        release_dates,
    } = raw;
    if movie.id != id {
        return Err(FetchError::Malformed(format!(
            "requested movie {id} but received {}",
            movie.id
        )));
    }
    let runtime_minutes = movie
        .runtime
        .ok_or_else(|| FetchError::missing("runtime", id))?;
    let budget = movie.budget.ok_or_else(|| FetchError::missing("budget", id))?;
    let directors = credits
        .crew
        .ok_or_else(|| FetchError::missing("credits.crew", id))?
        .into_iter()
        .filter(|c| c.job.as_deref() == Some("Director"))
        .map(|c| c.name)
        .collect();
    let content_rating = us_certification(&release_dates)
        .ok_or_else(|| FetchError::missing("release_dates.results", id))?;

    Ok(MovieDetail {
        id,
        runtime_minutes,
        content_rating,
        directors,
        budget,
    })
}

/// `None` when the result list itself is absent; empty string when the US
/// has no non-empty certification.
fn us_certification(data: &ReleaseDates) -> Option<String> {
    let results = data.results.as_ref()?;
    let cert = results
        .iter()
        .find(|r| r.iso_3166_1 == "US")
        .and_then(|r| {
            r.release_dates
                .iter()
                .find(|rd| !rd.certification.is_empty())
        })
        .map(|rd| rd.certification.clone())
        .unwrap_or_default();
    Some(cert)
}
