use crate::catalogue::{CatalogueApi, TmdbClient};
use crate::discovery::Discovery;
use crate::enrichment::EnrichmentCache;
use crate::error::FetchError;
use crate::favorites::{Favorites, InMemoryFavorites};
use crate::genres::GENRES;
use crate::models::{GenreFilter, MovieCard, MovieId, MovieSummary};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::json;
use std::{env, net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const DEFAULT_BIND: &str = "0.0.0.0:3146";
const RESULTS_UNAVAILABLE: &str = "results unavailable, try again";
const DETAILS_UNAVAILABLE: &str = "details unavailable";

/// Everything a request needs. The enrichment cache lives as long as the
/// state does, so every handler shares one set of cached details.
#[derive(Clone)]
pub struct AppState {
    pub discovery: Arc<Discovery>,
    pub enrichment: Arc<EnrichmentCache>,
    pub favorites: Arc<dyn Favorites>,
}

impl AppState {
    pub fn new(api: Arc<dyn CatalogueApi>, favorites: Arc<dyn Favorites>) -> Self {
        Self {
            discovery: Arc::new(Discovery::new(Arc::clone(&api))),
            enrichment: Arc::new(EnrichmentCache::new(api)),
            favorites,
        }
    }
}

pub async fn run_server() -> Result<()> {
    let api: Arc<dyn CatalogueApi> = Arc::new(TmdbClient::from_env()?);
    let state = AppState::new(api, Arc::new(InMemoryFavorites::new()));

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let bind = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid BIND_ADDR '{}'", bind))?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/genres", get(list_genres))
        .route("/movies", get(list_movies))
        .route("/movies/:id", get(movie_detail))
        .route("/favorites", get(list_favorites))
        .route("/favorites/:id", post(toggle_favorite))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn list_genres() -> Json<serde_json::Value> {
    Json(json!(GENRES))
}

#[derive(Debug, Deserialize)]
struct MoviesQuery {
    genre: Option<u32>,
    #[serde(default)]
    enrich: bool,
}

async fn list_movies(State(state): State<AppState>, Query(query): Query<MoviesQuery>) -> Response {
    let genre = match query.genre {
        Some(id) => match GenreFilter::from_id(id) {
            Some(g) => Some(g),
            None => {
                warn!("Rejecting unknown genre id {}", id);
                return error_response(StatusCode::BAD_REQUEST, "unknown genre");
            }
        },
        None => None,
    };

    let movies = match state.discovery.discover(genre.as_ref()).await {
        Ok(m) => m,
        Err(e) => {
            warn!("Discovery failed: {}", e);
            return error_response(StatusCode::SERVICE_UNAVAILABLE, RESULTS_UNAVAILABLE);
        }
    };

    let cards = if query.enrich {
        join_all(movies.into_iter().map(|m| enriched_card(&state, m))).await
    } else {
        let mut cards = Vec::with_capacity(movies.len());
        for summary in movies {
            let favorite = state.favorites.is_favorite(summary.id).await;
            cards.push(MovieCard::new(summary, favorite));
        }
        cards
    };
    Json(cards).into_response()
}

/// A failed enrichment keeps the summary and only reports the detail as
/// unavailable.
async fn enriched_card(state: &AppState, summary: MovieSummary) -> MovieCard {
    let favorite = state.favorites.is_favorite(summary.id).await;
    let id = summary.id;
    let mut card = MovieCard::new(summary, favorite);
    match state.enrichment.get_detail(id).await {
        Ok(d) => card.detail = Some(d),
        Err(e) => {
            warn!("Enrichment failed for movie {}: {}", id, e);
            card.detail_error = Some(DETAILS_UNAVAILABLE.to_string());
        }
    }
    card
}

async fn movie_detail(State(state): State<AppState>, Path(id): Path<MovieId>) -> Response {
    match state.enrichment.get_detail(id).await {
        Ok(detail) => Json(detail.as_ref().clone()).into_response(),
        Err(FetchError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "movie not found"),
        Err(e) => {
            warn!("Detail lookup failed for movie {}: {}", id, e);
            error_response(StatusCode::BAD_GATEWAY, DETAILS_UNAVAILABLE)
        }
    }
}

async fn list_favorites(State(state): State<AppState>) -> Json<Vec<MovieId>> {
    Json(state.favorites.list().await)
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
) -> Json<serde_json::Value> {
    let favorite = state.favorites.toggle(id).await;
    info!("Movie {} favorite -> {}", id, favorite);
    Json(json!({ "id": id, "favorite": favorite }))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
