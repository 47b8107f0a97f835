use crate::core::EntityType;
use crate::ent_framework::derived::property::DerivedValue;
use crate::ent_framework::derived::registry::PropertyRegistry;
use crate::ent_framework::ent_object::EntObject;
use crate::error::{AppError, AppResult};
use crate::query::expr::{Expr, TableRef};
use once_cell::sync::OnceCell;
use std::sync::Arc;

static PROPERTY_REGISTRY: OnceCell<Arc<PropertyRegistry>> = OnceCell::new();

/// Install the process-wide registry. Registration happens once at startup.
pub fn install_registry(registry: PropertyRegistry) -> AppResult<()> {
    PROPERTY_REGISTRY
        .set(Arc::new(registry))
        .map_err(|_| AppError::Internal("Global property registry already set".to_string()))
}

pub fn registry() -> AppResult<&'static Arc<PropertyRegistry>> {
    PROPERTY_REGISTRY
        .get()
        .ok_or_else(|| AppError::Internal("Global property registry not initialized".to_string()))
}

/// Query expression for a property from the global registry
pub fn property_expr(entity: &EntityType, name: &str, owner: &TableRef) -> AppResult<Expr> {
    registry()?.query(entity, name, owner)
}

/// `obj.derived("has_scenes")` through the global registry
pub trait DerivedProperties {
    fn derived(&self, name: &str) -> AppResult<DerivedValue>;
}

impl DerivedProperties for EntObject {
    fn derived(&self, name: &str) -> AppResult<DerivedValue> {
        registry()?.evaluate(self, name)
    }
}
