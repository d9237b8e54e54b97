use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::error;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, ServerConfig};
use crate::favorites::{FavoritePatch, FavoritesError, FavoritesStore, ListOrder, NewFavorite};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub favorites_count: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn error_response(err: FavoritesError) -> Response {
    match err {
        FavoritesError::NotFound(_) => StatusCode::NOT_FOUND.into_response(),
        FavoritesError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        other => {
            error!("Favorites operation failed: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn home(State(state): State<ServerState>) -> Response {
    match state.favorites.max_rank() {
        Ok(count) => Json(ServerStats {
            uptime: format_uptime(state.start_time.elapsed()),
            favorites_count: count as usize,
        })
        .into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Deserialize, Default)]
struct ListQuery {
    #[serde(default)]
    order: ListOrder,
}

async fn list_favorites(
    State(favorites): State<GuardedFavoritesStore>,
    Query(query): Query<ListQuery>,
) -> Response {
    match favorites.list(query.order) {
        Ok(tracks) => Json(tracks).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_max_rank(State(favorites): State<GuardedFavoritesStore>) -> Response {
    match favorites.max_rank() {
        Ok(max_rank) => Json(serde_json::json!({ "max_rank": max_rank })).into_response(),
        Err(err) => error_response(err),
    }
}

async fn get_favorite(
    State(favorites): State<GuardedFavoritesStore>,
    Path(id): Path<i64>,
) -> Response {
    match favorites.get(id) {
        Ok(Some(track)) => Json(track).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => error_response(err),
    }
}

async fn create_favorite(
    State(favorites): State<GuardedFavoritesStore>,
    Json(body): Json<NewFavorite>,
) -> Response {
    match favorites.insert(body) {
        Ok(track) => (StatusCode::CREATED, Json(track)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn update_favorite(
    State(favorites): State<GuardedFavoritesStore>,
    Path(id): Path<i64>,
    Json(patch): Json<FavoritePatch>,
) -> Response {
    match favorites.update(id, patch) {
        Ok(track) => Json(track).into_response(),
        Err(err) => error_response(err),
    }
}

async fn delete_favorite(
    State(favorites): State<GuardedFavoritesStore>,
    Path(id): Path<i64>,
) -> Response {
    match favorites.delete(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

async fn mark_played(
    State(favorites): State<GuardedFavoritesStore>,
    Path(id): Path<i64>,
) -> Response {
    let today = chrono::Local::now().date_naive();
    match favorites.mark_played(id, today) {
        Ok(track) => Json(track).into_response(),
        Err(err) => error_response(err),
    }
}

fn make_app(favorites: Arc<dyn FavoritesStore>, config: ServerConfig) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        favorites,
    };

    let favorites_routes: Router = Router::new()
        .route("/", get(list_favorites))
        .route("/", post(create_favorite))
        .route("/max_rank", get(get_max_rank))
        .route("/{id}", get(get_favorite))
        .route("/{id}", patch(update_favorite))
        .route("/{id}", delete(delete_favorite))
        .route("/{id}/played", post(mark_played))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/v1/favorites", favorites_routes)
        .layer(axum::middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(favorites: Arc<dyn FavoritesStore>, config: ServerConfig) -> Result<()> {
    let port = config.port;
    let app = make_app(favorites, config);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
