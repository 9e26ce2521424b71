use async_trait::async_trait;
use std::collections::BTreeSet;
use tokio::sync::Mutex;

use crate::models::MovieId;

/// The user's favorited movies, keyed by the same id as summaries and details.
#[async_trait]
pub trait Favorites: Send + Sync {
    async fn is_favorite(&self, id: MovieId) -> bool;
    /// Flips membership and returns the new state.
    async fn toggle(&self, id: MovieId) -> bool;
    async fn list(&self) -> Vec<MovieId>;
}

/// Session-scoped favorites; nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemoryFavorites {
    ids: Mutex<BTreeSet<MovieId>>,
}

impl InMemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Favorites for InMemoryFavorites {
    async fn is_favorite(&self, id: MovieId) -> bool {
        self.ids.lock().await.contains(&id)
    }

    async fn toggle(&self, id: MovieId) -> bool {
        let mut ids = self.ids.lock().await;
        if ids.remove(&id) {
            false
        } else {
            ids.insert(id);
            true
        }
    }

    async fn list(&self) -> Vec<MovieId> {
        self.ids.lock().await.iter().copied().collect()
    }
}
