// Core infrastructure modules
pub mod sqlite_database; // SQLite storage, DDL and the object graph loader
pub mod traits;          // Infrastructure traits

pub use sqlite_database::{create_table_sql, QueryRow, SqliteStore};
pub use traits::PointLookup;
