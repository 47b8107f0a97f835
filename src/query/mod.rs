// Query layer - expression trees, SQLite rendering and entity queries

pub mod ent_query;
pub mod expr;
pub mod render;

pub use ent_query::{EntQuery, Order, OWNER_ALIAS};
pub use expr::{CompareOp, Expr, SubSelect, TableRef};
pub use render::{to_sql, SqlSink};
