use anyhow::Result;
use rusqlite::Connection;

/// Offset added to the schema version stored in `PRAGMA user_version`, so
/// that a database created by an unrelated tool is not mistaken for ours.
pub const BASE_DB_VERSION: usize = 417;

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
    pub create: fn(&Connection, &VersionedSchema) -> Result<()>,
    pub migration: Option<fn(&Connection) -> Result<()>>,
    pub validate: fn(&Connection) -> Result<()>,
}
