// Core types and primitives shared by the schema, evaluation and storage layers

pub mod strong_types;
pub mod value;

pub use strong_types::{is_identifier, EntityId, EntityType, ObjectKey};
pub use value::Value;
