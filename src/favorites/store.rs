use thiserror::Error;

use super::models::{FavoritePatch, FavoriteTrack, ListOrder, NewFavorite};

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("favorite {0} not found")]
    NotFound(i64),

    #[error("{0}")]
    InvalidInput(String),

    /// A rank uniqueness violation surfaced from the storage layer while a
    /// renumbering protocol was in flight. This never happens when the
    /// temp-offset protocol is followed correctly; it is not retryable.
    #[error("rank constraint violated during renumbering: {0}")]
    RankConstraint(#[source] rusqlite::Error),

    #[error("rank integrity violated: {0}")]
    Integrity(String),

    #[error("storage error: {0}")]
    Storage(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for FavoritesError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                FavoritesError::RankConstraint(err)
            }
            _ => FavoritesError::Storage(err),
        }
    }
}

/// Storage backend for the favorites list.
///
/// Implementations must keep the rank invariant (live ranks are exactly
/// {1..N}, no duplicates) across every mutation, and must apply each
/// mutation atomically so a reader only ever observes the pre- or
/// post-state of it.
pub trait FavoritesStore: Send + Sync {
    fn list(&self, order: ListOrder) -> Result<Vec<FavoriteTrack>, FavoritesError>;

    fn get(&self, id: i64) -> Result<Option<FavoriteTrack>, FavoritesError>;

    /// Highest live rank, 0 when the list is empty. Equals the record count.
    fn max_rank(&self) -> Result<i64, FavoritesError>;

    /// Insert at `new.rank` (must be in [1, N+1]), shifting every record at
    /// that rank or above up by one.
    fn insert(&self, new: NewFavorite) -> Result<FavoriteTrack, FavoritesError>;

    /// Apply field edits and, if `patch.rank` differs from the record's
    /// current rank, move it there (target must be in [1, N]), renumbering
    /// the records in between. All in one transaction.
    fn update(&self, id: i64, patch: FavoritePatch) -> Result<FavoriteTrack, FavoritesError>;

    /// Delete the record and compact every higher rank down by one.
    fn delete(&self, id: i64) -> Result<(), FavoritesError>;

    /// Set `last_played` to the given date. No rank interaction.
    fn mark_played(
        &self,
        id: i64,
        date: chrono::NaiveDate,
    ) -> Result<FavoriteTrack, FavoritesError>;
}
