use axum::extract::FromRef;

use crate::favorites::FavoritesStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedFavoritesStore = Arc<dyn FavoritesStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub favorites: GuardedFavoritesStore,
}

impl FromRef<ServerState> for GuardedFavoritesStore {
    fn from_ref(input: &ServerState) -> Self {
        input.favorites.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
