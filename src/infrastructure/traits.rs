use crate::core::{EntityId, EntityType};
use crate::ent_framework::ent_object::EntObject;
use crate::error::AppResult;
use async_trait::async_trait;

/// Fetch a single entity row by id, without relationships.
/// Used as the fallback when a referenced row was not loaded with its owner.
#[async_trait]
pub trait PointLookup: Send + Sync {
    async fn fetch_by_id(&self, entity_type: &EntityType, id: EntityId)
        -> AppResult<Option<EntObject>>;
}
