mod versioned_schema;

pub use versioned_schema::{Table, VersionedSchema, BASE_DB_VERSION};
