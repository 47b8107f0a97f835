// Derived properties - existence, counting and status facts synthesized from relationships,
// evaluated both on loaded objects and inside SQL queries

pub mod condition;
pub mod config;
pub mod counting;
pub mod existence;
pub mod foreign_key;
pub mod global;
pub mod path;
pub mod property;
pub mod registry;
pub mod status;

pub use config::{
    Condition, FilterCondition, Operator, PropertyConfig, PropertyDefinition,
};
pub use foreign_key::{find_fk, ForeignKeyMatch, ForeignKeyStrategy};
pub use global::{install_registry, property_expr, registry, DerivedProperties};
pub use property::{DerivedProperty, DerivedValue, PropertyKind};
pub use registry::{DeferredCheck, PropertyRegistry, RegistrationReport, RegistrationState};
