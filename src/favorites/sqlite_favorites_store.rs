use crate::sqlite_persistence::{Table, VersionedSchema, BASE_DB_VERSION};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tracing::{debug, info};

use super::models::{FavoritePatch, FavoriteTrack, ListOrder, NewFavorite};
use super::store::{FavoritesError, FavoritesStore};

/// Added to a contiguous block of ranks to park it outside the live
/// numbering space while rows are renumbered. Must stay above any
/// plausible list size so parked ranks never collide with live ones.
const TEMP_RANK_OFFSET: i64 = 30_000;

/// Rank a row is moved to while its old slot is handed over during a move.
/// Live ranks are always positive, so -1 can never collide.
const MOVING_RANK: i64 = -1;

/// V 0
const FAVORITE_TABLE_V_0: Table = Table {
    name: "favorite",
    schema: "CREATE TABLE favorite (id INTEGER PRIMARY KEY, rank INTEGER NOT NULL UNIQUE, title TEXT NOT NULL, artist TEXT NOT NULL, year INTEGER, last_played TEXT, created INTEGER DEFAULT (cast(strftime('%s','now') as int)));",
    indices: &["CREATE INDEX idx_favorite_last_played ON favorite (last_played);"],
};

fn create_v0(conn: &Connection, schema: &VersionedSchema) -> Result<()> {
    for table in schema.tables {
        conn.execute(table.schema, [])?;
        for index in table.indices {
            conn.execute(index, [])?;
        }
    }
    conn.execute(
        &format!("PRAGMA user_version = {}", BASE_DB_VERSION + schema.version),
        [],
    )?;
    Ok(())
}

fn validate_schema_0(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", FAVORITE_TABLE_V_0.name))?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(1))?
        .collect::<Result<_, _>>()?;

    if columns != ["id", "rank", "title", "artist", "year", "last_played", "created"] {
        bail!(
            "Schema validation failed for favorite table. found {:?}",
            columns
        );
    }
    Ok(())
}

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[FAVORITE_TABLE_V_0],
    create: create_v0,
    migration: None,
    validate: validate_schema_0,
}];

#[derive(Clone)]
pub struct SqliteFavoritesStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFavoritesStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            Self::create_schema(&conn)?;
            conn
        };

        let version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, usize>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION;

        if version >= VERSIONED_SCHEMAS.len() {
            bail!("Database version {} is too new", version);
        } else {
            (VERSIONED_SCHEMAS
                .get(version)
                .context("Failed to get schema")?
                .validate)(&conn)?;
        }

        Self::migrate_if_needed(&conn, version)?;

        Ok(SqliteFavoritesStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn create_schema(conn: &Connection) -> Result<()> {
        let latest_version = VERSIONED_SCHEMAS.last().unwrap();
        let create_fn = latest_version.create;
        create_fn(conn, latest_version)
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;

        Ok(())
    }

    /// Verifies that the live rank set is exactly {1..N}. Cheap for the
    /// list sizes this store is meant for, so it runs on every startup
    /// unless the `no_checks` feature is enabled.
    pub fn check_rank_integrity(&self) -> Result<(), FavoritesError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT rank FROM {} ORDER BY rank",
            FAVORITE_TABLE_V_0.name
        ))?;
        let ranks = stmt
            .query_map([], |row| row.get::<usize, i64>(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        for (index, rank) in ranks.iter().enumerate() {
            let expected = index as i64 + 1;
            if *rank != expected {
                return Err(FavoritesError::Integrity(format!(
                    "expected rank {} at position {}, found {}",
                    expected,
                    index + 1,
                    rank
                )));
            }
        }
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), FavoritesError> {
    if value.trim().is_empty() {
        return Err(FavoritesError::InvalidInput(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn row_to_track(row: &rusqlite::Row) -> rusqlite::Result<FavoriteTrack> {
    let last_played: Option<String> = row.get(5)?;
    let last_played = match last_played {
        Some(text) => Some(NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };
    Ok(FavoriteTrack {
        id: row.get(0)?,
        rank: row.get(1)?,
        title: row.get(2)?,
        artist: row.get(3)?,
        year: row.get(4)?,
        last_played,
    })
}

const TRACK_COLUMNS: &str = "id, rank, title, artist, year, last_played";

fn get_track(conn: &Connection, id: i64) -> Result<Option<FavoriteTrack>, FavoritesError> {
    let track = conn
        .query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                TRACK_COLUMNS, FAVORITE_TABLE_V_0.name
            ),
            params![id],
            row_to_track,
        )
        .optional()?;
    Ok(track)
}

fn count_tracks(conn: &Connection) -> Result<i64, FavoritesError> {
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", FAVORITE_TABLE_V_0.name),
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Renumbers the rows between a move's source and destination rank.
///
/// The rank column is UNIQUE and SQLite checks the constraint per row
/// while an UPDATE runs, so the affected range is first parked above
/// `TEMP_RANK_OFFSET` (disjoint from every live rank), then dropped back
/// onto its shifted positions once the moved row has landed.
fn move_rank(
    tx: &rusqlite::Transaction,
    id: i64,
    current: i64,
    target: i64,
) -> Result<(), FavoritesError> {
    let table = FAVORITE_TABLE_V_0.name;
    debug!("move_rank({id}) {current} -> {target}");

    // Vacate the source slot first so the range shift below never has to
    // step over the moving row itself.
    tx.execute(
        &format!("UPDATE {table} SET rank = ?1 WHERE id = ?2"),
        params![MOVING_RANK, id],
    )?;

    if target < current {
        // Toward the front: [target, current) steps up by one.
        tx.execute(
            &format!("UPDATE {table} SET rank = rank + ?1 WHERE rank >= ?2 AND rank < ?3"),
            params![TEMP_RANK_OFFSET, target, current],
        )?;
        tx.execute(
            &format!("UPDATE {table} SET rank = ?1 WHERE id = ?2"),
            params![target, id],
        )?;
        tx.execute(
            &format!("UPDATE {table} SET rank = rank - ?1 WHERE rank > ?2"),
            params![TEMP_RANK_OFFSET - 1, TEMP_RANK_OFFSET],
        )?;
    } else {
        // Toward the back: (current, target] steps down by one.
        tx.execute(
            &format!("UPDATE {table} SET rank = rank + ?1 WHERE rank > ?2 AND rank <= ?3"),
            params![TEMP_RANK_OFFSET, current, target],
        )?;
        tx.execute(
            &format!("UPDATE {table} SET rank = ?1 WHERE id = ?2"),
            params![target, id],
        )?;
        tx.execute(
            &format!("UPDATE {table} SET rank = rank - ?1 WHERE rank > ?2"),
            params![TEMP_RANK_OFFSET + 1, TEMP_RANK_OFFSET],
        )?;
    }
    Ok(())
}

impl FavoritesStore for SqliteFavoritesStore {
    fn list(&self, order: ListOrder) -> Result<Vec<FavoriteTrack>, FavoritesError> {
        let conn = self.conn.lock().unwrap();
        let order_clause = match order {
            ListOrder::Rank => "rank",
            // ISO dates compare correctly as text; never-played rows go last.
            ListOrder::Recent => "last_played IS NULL, last_played DESC, rank",
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY {}",
            TRACK_COLUMNS, FAVORITE_TABLE_V_0.name, order_clause
        ))?;
        let tracks = stmt
            .query_map([], row_to_track)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn get(&self, id: i64) -> Result<Option<FavoriteTrack>, FavoritesError> {
        let conn = self.conn.lock().unwrap();
        get_track(&conn, id)
    }

    fn max_rank(&self) -> Result<i64, FavoritesError> {
        let conn = self.conn.lock().unwrap();
        let max = conn.query_row(
            &format!(
                "SELECT COALESCE(MAX(rank), 0) FROM {}",
                FAVORITE_TABLE_V_0.name
            ),
            [],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    fn insert(&self, new: NewFavorite) -> Result<FavoriteTrack, FavoritesError> {
        require_non_empty("title", &new.title)?;
        require_non_empty("artist", &new.artist)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let table = FAVORITE_TABLE_V_0.name;

        let count = count_tracks(&tx)?;
        if new.rank < 1 || new.rank > count + 1 {
            return Err(FavoritesError::InvalidInput(format!(
                "rank {} out of range [1, {}]",
                new.rank,
                count + 1
            )));
        }
        debug!("insert() at rank {} of {}", new.rank, count);

        // Park everything at the target rank and above, insert, then drop
        // the parked block back one slot above where it started.
        tx.execute(
            &format!("UPDATE {table} SET rank = rank + ?1 WHERE rank >= ?2"),
            params![TEMP_RANK_OFFSET, new.rank],
        )?;
        tx.execute(
            &format!(
                "INSERT INTO {table} (rank, title, artist, year, last_played) VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![
                new.rank,
                new.title,
                new.artist,
                new.year,
                new.last_played.map(|d| d.to_string())
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            &format!("UPDATE {table} SET rank = rank - ?1 WHERE rank > ?2"),
            params![TEMP_RANK_OFFSET - 1, TEMP_RANK_OFFSET],
        )?;

        let track = get_track(&tx, id)?.ok_or(FavoritesError::NotFound(id))?;
        tx.commit()?;
        Ok(track)
    }

    fn update(&self, id: i64, patch: FavoritePatch) -> Result<FavoriteTrack, FavoritesError> {
        if let Some(title) = &patch.title {
            require_non_empty("title", title)?;
        }
        if let Some(artist) = &patch.artist {
            require_non_empty("artist", artist)?;
        }

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let table = FAVORITE_TABLE_V_0.name;

        let current = match get_track(&tx, id)? {
            Some(track) => track,
            None => return Err(FavoritesError::NotFound(id)),
        };

        if let Some(target) = patch.rank {
            let count = count_tracks(&tx)?;
            if target < 1 || target > count {
                return Err(FavoritesError::InvalidInput(format!(
                    "rank {} out of range [1, {}]",
                    target, count
                )));
            }
            if target != current.rank {
                move_rank(&tx, id, current.rank, target)?;
            }
        }

        if let Some(title) = &patch.title {
            tx.execute(
                &format!("UPDATE {table} SET title = ?1 WHERE id = ?2"),
                params![title, id],
            )?;
        }
        if let Some(artist) = &patch.artist {
            tx.execute(
                &format!("UPDATE {table} SET artist = ?1 WHERE id = ?2"),
                params![artist, id],
            )?;
        }
        if let Some(year) = patch.year {
            tx.execute(
                &format!("UPDATE {table} SET year = ?1 WHERE id = ?2"),
                params![year, id],
            )?;
        }
        if let Some(last_played) = patch.last_played {
            tx.execute(
                &format!("UPDATE {table} SET last_played = ?1 WHERE id = ?2"),
                params![last_played.to_string(), id],
            )?;
        }

        let track = get_track(&tx, id)?.ok_or(FavoritesError::NotFound(id))?;
        tx.commit()?;
        Ok(track)
    }

    fn delete(&self, id: i64) -> Result<(), FavoritesError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let table = FAVORITE_TABLE_V_0.name;

        let current = match get_track(&tx, id)? {
            Some(track) => track,
            None => return Err(FavoritesError::NotFound(id)),
        };
        debug!("delete({id}) at rank {}", current.rank);

        tx.execute(
            &format!("DELETE FROM {table} WHERE id = ?1"),
            params![id],
        )?;
        // Compaction also goes through the parking range: SQLite applies
        // UPDATE row-by-row in unspecified scan order, so a bare
        // rank = rank - 1 can trip the UNIQUE constraint between siblings.
        tx.execute(
            &format!("UPDATE {table} SET rank = rank + ?1 WHERE rank > ?2"),
            params![TEMP_RANK_OFFSET, current.rank],
        )?;
        tx.execute(
            &format!("UPDATE {table} SET rank = rank - ?1 WHERE rank > ?2"),
            params![TEMP_RANK_OFFSET + 1, TEMP_RANK_OFFSET],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn mark_played(&self, id: i64, date: NaiveDate) -> Result<FavoriteTrack, FavoritesError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET last_played = ?1 WHERE id = ?2",
                FAVORITE_TABLE_V_0.name
            ),
            params![date.to_string(), id],
        )?;
        if updated == 0 {
            return Err(FavoritesError::NotFound(id));
        }
        get_track(&conn, id)?.ok_or(FavoritesError::NotFound(id))
    }
}

#[cfg(test)]
impl SqliteFavoritesStore {
    /// Performs only the first shift of an insert and then abandons the
    /// transaction, simulating a crash mid-protocol.
    fn insert_interrupted(&self, rank: i64) -> Result<(), FavoritesError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "UPDATE {} SET rank = rank + ?1 WHERE rank >= ?2",
                FAVORITE_TABLE_V_0.name
            ),
            params![TEMP_RANK_OFFSET, rank],
        )?;
        // tx dropped here without commit
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteFavoritesStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let temp_file_path = temp_dir.path().join("test.db");
        let store = SqliteFavoritesStore::new(&temp_file_path).unwrap();
        (store, temp_dir)
    }

    fn new_favorite(rank: i64, title: &str) -> NewFavorite {
        NewFavorite {
            rank,
            title: title.to_string(),
            artist: "Artist".to_string(),
            year: None,
            last_played: None,
        }
    }

    fn seed(store: &SqliteFavoritesStore, titles: &[&str]) -> Vec<i64> {
        titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                store
                    .insert(new_favorite(i as i64 + 1, title))
                    .unwrap()
                    .id
            })
            .collect()
    }

    fn titles_by_rank(store: &SqliteFavoritesStore) -> Vec<String> {
        store
            .list(ListOrder::Rank)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect()
    }

    #[test]
    fn inserts_append_and_reopen_preserves_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.db");
        {
            let store = SqliteFavoritesStore::new(&path).unwrap();
            seed(&store, &["A", "B"]);
        }
        let store = SqliteFavoritesStore::new(&path).unwrap();
        assert_eq!(titles_by_rank(&store), ["A", "B"]);
        store.check_rank_integrity().unwrap();
    }

    #[test]
    fn insert_in_the_middle_shifts_the_tail() {
        let (store, _temp_dir) = create_tmp_store();
        seed(&store, &["A", "B", "C"]);

        store.insert(new_favorite(2, "D")).unwrap();

        assert_eq!(titles_by_rank(&store), ["A", "D", "B", "C"]);
        store.check_rank_integrity().unwrap();
    }

    #[test]
    fn insert_at_the_front_and_past_the_end() {
        let (store, _temp_dir) = create_tmp_store();
        seed(&store, &["A", "B"]);

        store.insert(new_favorite(1, "front")).unwrap();
        store.insert(new_favorite(4, "back")).unwrap();

        assert_eq!(titles_by_rank(&store), ["front", "A", "B", "back"]);
        store.check_rank_integrity().unwrap();
    }

    #[test]
    fn insert_rejects_out_of_range_rank() {
        let (store, _temp_dir) = create_tmp_store();
        seed(&store, &["A"]);

        for rank in [0, -3, 3] {
            let result = store.insert(new_favorite(rank, "X"));
            assert!(matches!(result, Err(FavoritesError::InvalidInput(_))));
        }
        assert_eq!(titles_by_rank(&store), ["A"]);
    }

    #[test]
    fn insert_rejects_blank_text_fields() {
        let (store, _temp_dir) = create_tmp_store();

        let mut blank_title = new_favorite(1, "  ");
        assert!(matches!(
            store.insert(blank_title.clone()),
            Err(FavoritesError::InvalidInput(_))
        ));

        blank_title.title = "ok".to_string();
        blank_title.artist = "".to_string();
        assert!(matches!(
            store.insert(blank_title),
            Err(FavoritesError::InvalidInput(_))
        ));

        assert_eq!(store.max_rank().unwrap(), 0);
    }

    #[test]
    fn move_toward_the_front() {
        let (store, _temp_dir) = create_tmp_store();
        let ids = seed(&store, &["A", "B", "C"]);

        let patch = FavoritePatch {
            rank: Some(1),
            ..Default::default()
        };
        store.update(ids[2], patch).unwrap();

        assert_eq!(titles_by_rank(&store), ["C", "A", "B"]);
        store.check_rank_integrity().unwrap();
    }

    #[test]
    fn move_toward_the_back() {
        let (store, _temp_dir) = create_tmp_store();
        let ids = seed(&store, &["A", "B", "C"]);

        let patch = FavoritePatch {
            rank: Some(3),
            ..Default::default()
        };
        store.update(ids[0], patch).unwrap();

        assert_eq!(titles_by_rank(&store), ["B", "C", "A"]);
        store.check_rank_integrity().unwrap();
    }

    #[test]
    fn move_result_does_not_depend_on_the_path() {
        let (direct, _dir_a) = create_tmp_store();
        let (stepped, _dir_b) = create_tmp_store();
        let direct_ids = seed(&direct, &["A", "B", "C", "D", "E"]);
        let stepped_ids = seed(&stepped, &["A", "B", "C", "D", "E"]);

        let to = |rank| FavoritePatch {
            rank: Some(rank),
            ..Default::default()
        };
        direct.update(direct_ids[2], to(1)).unwrap();
        stepped.update(stepped_ids[2], to(2)).unwrap();
        stepped.update(stepped_ids[2], to(1)).unwrap();

        assert_eq!(titles_by_rank(&direct), titles_by_rank(&stepped));
        direct.check_rank_integrity().unwrap();
        stepped.check_rank_integrity().unwrap();
    }

    #[test]
    fn move_to_own_rank_only_applies_field_edits() {
        let (store, _temp_dir) = create_tmp_store();
        let ids = seed(&store, &["A", "B", "C"]);

        let patch = FavoritePatch {
            rank: Some(2),
            title: Some("B2".to_string()),
            year: Some(1999),
            ..Default::default()
        };
        let updated = store.update(ids[1], patch).unwrap();

        assert_eq!(updated.rank, 2);
        assert_eq!(updated.title, "B2");
        assert_eq!(updated.year, Some(1999));
        assert_eq!(titles_by_rank(&store), ["A", "B2", "C"]);
    }

    #[test]
    fn move_rejects_out_of_range_target() {
        let (store, _temp_dir) = create_tmp_store();
        let ids = seed(&store, &["A", "B"]);

        for rank in [0, 3] {
            let patch = FavoritePatch {
                rank: Some(rank),
                ..Default::default()
            };
            assert!(matches!(
                store.update(ids[0], patch),
                Err(FavoritesError::InvalidInput(_))
            ));
        }
        assert_eq!(titles_by_rank(&store), ["A", "B"]);
    }

    #[test]
    fn update_missing_id_reports_not_found() {
        let (store, _temp_dir) = create_tmp_store();
        seed(&store, &["A"]);

        let result = store.update(999, FavoritePatch::default());
        assert!(matches!(result, Err(FavoritesError::NotFound(999))));
    }

    #[test]
    fn delete_compacts_higher_ranks() {
        let (store, _temp_dir) = create_tmp_store();
        let ids = seed(&store, &["A", "B", "C", "D"]);

        store.delete(ids[1]).unwrap();

        let tracks = store.list(ListOrder::Rank).unwrap();
        let ranked: Vec<(i64, &str)> = tracks
            .iter()
            .map(|t| (t.rank, t.title.as_str()))
            .collect();
        assert_eq!(ranked, [(1, "A"), (2, "C"), (3, "D")]);
        store.check_rank_integrity().unwrap();
    }

    #[test]
    fn delete_missing_id_reports_not_found() {
        let (store, _temp_dir) = create_tmp_store();
        seed(&store, &["A"]);

        assert!(matches!(
            store.delete(42),
            Err(FavoritesError::NotFound(42))
        ));
        assert_eq!(store.max_rank().unwrap(), 1);
    }

    #[test]
    fn ranks_stay_contiguous_across_a_mixed_sequence() {
        let (store, _temp_dir) = create_tmp_store();
        let ids = seed(&store, &["A", "B", "C", "D", "E"]);
        store.check_rank_integrity().unwrap();

        store.insert(new_favorite(3, "F")).unwrap();
        store.check_rank_integrity().unwrap();

        let to = |rank| FavoritePatch {
            rank: Some(rank),
            ..Default::default()
        };
        store.update(ids[4], to(1)).unwrap();
        store.check_rank_integrity().unwrap();

        store.delete(ids[0]).unwrap();
        store.check_rank_integrity().unwrap();

        store.update(ids[1], to(5)).unwrap();
        store.check_rank_integrity().unwrap();

        assert_eq!(store.max_rank().unwrap(), 5);
    }

    #[test]
    fn abandoned_transaction_leaves_no_trace() {
        let (store, _temp_dir) = create_tmp_store();
        seed(&store, &["A", "B", "C"]);

        store.insert_interrupted(2).unwrap();

        let tracks = store.list(ListOrder::Rank).unwrap();
        let ranked: Vec<(i64, &str)> = tracks
            .iter()
            .map(|t| (t.rank, t.title.as_str()))
            .collect();
        assert_eq!(ranked, [(1, "A"), (2, "B"), (3, "C")]);
        store.check_rank_integrity().unwrap();
    }

    #[test]
    fn mark_played_sets_the_date_and_drives_recency_order() {
        let (store, _temp_dir) = create_tmp_store();
        let ids = seed(&store, &["A", "B", "C"]);

        let earlier = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        store.mark_played(ids[0], earlier).unwrap();
        let marked = store.mark_played(ids[2], later).unwrap();
        assert_eq!(marked.last_played, Some(later));

        let recent = store.list(ListOrder::Recent).unwrap();
        let titles: Vec<&str> = recent.iter().map(|t| t.title.as_str()).collect();
        // never-played B sorts after both played tracks
        assert_eq!(titles, ["C", "A", "B"]);
    }

    #[test]
    fn recency_ties_break_by_rank() {
        let (store, _temp_dir) = create_tmp_store();
        let ids = seed(&store, &["A", "B", "C"]);

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        store.mark_played(ids[2], date).unwrap();
        store.mark_played(ids[1], date).unwrap();

        let recent = store.list(ListOrder::Recent).unwrap();
        let titles: Vec<&str> = recent.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["B", "C", "A"]);
    }

    #[test]
    fn mark_played_missing_id_reports_not_found() {
        let (store, _temp_dir) = create_tmp_store();

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            store.mark_played(7, date),
            Err(FavoritesError::NotFound(7))
        ));
    }

    #[test]
    fn max_rank_tracks_the_list_size() {
        let (store, _temp_dir) = create_tmp_store();
        assert_eq!(store.max_rank().unwrap(), 0);

        let ids = seed(&store, &["A", "B"]);
        assert_eq!(store.max_rank().unwrap(), 2);

        store.delete(ids[0]).unwrap();
        assert_eq!(store.max_rank().unwrap(), 1);
    }
}
