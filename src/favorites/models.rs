use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry of the favorites list. `rank` is the 1-based position in the
/// primary ordering; live ranks are always exactly {1..N}.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteTrack {
    pub id: i64,
    pub rank: i64,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub last_played: Option<NaiveDate>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewFavorite {
    pub rank: i64,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub last_played: Option<NaiveDate>,
}

/// Partial update. Absent fields are left unchanged; there is no way to
/// clear `year` or `last_played` through a patch.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FavoritePatch {
    pub rank: Option<i64>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub last_played: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    Rank,
    Recent,
}

impl Default for ListOrder {
    fn default() -> Self {
        Self::Rank
    }
}
