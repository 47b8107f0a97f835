// Schema definitions module - centralized schema catalog and derived property registry

pub mod act_schema;
pub mod dice_roll_schema;
pub mod event_schema;
pub mod game_schema;
pub mod interpretation_schema;
pub mod scene_schema;

use tracing::info;

use crate::config::DerivedConfig;
use crate::ent_framework::{PropertyRegistry, SchemaCatalog};
use crate::error::AppResult;

pub use act_schema::ActSchema;
pub use dice_roll_schema::DiceRollSchema;
pub use event_schema::{EventSchema, EventSourceSchema};
pub use game_schema::GameSchema;
pub use interpretation_schema::{InterpretationSchema, InterpretationSetSchema};
pub use scene_schema::SceneSchema;

/// Declare all schemas. The catalog is left unsealed so callers can add overrides.
pub fn create_schema_catalog() -> AppResult<SchemaCatalog> {
    let mut catalog = SchemaCatalog::new();

    // Register all entity schemas
    catalog.register::<GameSchema>()?;
    catalog.register::<ActSchema>()?;
    catalog.register::<SceneSchema>()?;
    catalog.register::<EventSourceSchema>()?;
    catalog.register::<EventSchema>()?;
    catalog.register::<InterpretationSetSchema>()?;
    catalog.register::<InterpretationSchema>()?;
    catalog.register::<DiceRollSchema>()?;

    Ok(catalog)
}

/// Validate all declared schemas
pub fn validate_schemas() -> Result<(), Vec<String>> {
    let catalog = create_schema_catalog().map_err(|e| vec![e.to_string()])?;
    catalog.validate()
}

/// Startup sequence: declare, register every entity's derived properties, seal, then confirm
/// the foreign keys that were only found by naming fallback.
pub fn build_registry(config: &DerivedConfig) -> AppResult<(SchemaCatalog, PropertyRegistry)> {
    let mut catalog = create_schema_catalog()?;
    for (entity, column) in &config.foreign_key_overrides {
        catalog.override_foreign_key(entity.clone(), column);
    }

    let mut registry = PropertyRegistry::with_lookup_policy(config.lookup_policy);
    let reports = registry.register_all(&catalog)?;
    catalog.seal()?;
    registry.finalize(&catalog)?;

    info!(
        "Derived properties ready: {} entity types, {} properties",
        reports.len(),
        reports.iter().map(|r| r.properties.len()).sum::<usize>()
    );
    Ok((catalog, registry))
}
