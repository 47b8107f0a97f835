// Derived Ent - relationship-derived properties on top of an entity schema system

// Ent Framework - entity schemas, the object graph and derived properties
pub mod ent_framework;

// Core types and primitives
pub mod core;

// Query expressions and SQL rendering
pub mod query;

// Infrastructure - SQLite storage and point lookups
pub mod infrastructure;

// Schema Definitions - the tabletop journal domain
pub mod schemas;

// Common utilities
pub mod config;
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
