mod models;
mod sqlite_favorites_store;
mod store;

pub use models::{FavoritePatch, FavoriteTrack, ListOrder, NewFavorite};
pub use sqlite_favorites_store::SqliteFavoritesStore;
pub use store::{FavoritesError, FavoritesStore};
