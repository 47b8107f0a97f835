// Ent Framework - entity schemas, the in-memory object graph and derived properties

pub mod derived;
pub mod ent_object;
pub mod ent_schema;

// Re-export all ent framework types for convenience
pub use derived::{
    Condition, DerivedProperties, DerivedValue, FilterCondition, PropertyConfig,
    PropertyDefinition, PropertyRegistry,
};
pub use ent_object::{EntObject, Related};
pub use ent_schema::*;
