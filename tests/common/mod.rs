#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use derived_ent::{
    config::DerivedConfig,
    core::{EntityId, EntityType, Value},
    data_seeder::seed_event_sources,
    ent_framework::{DerivedValue, EntObject, PropertyRegistry},
    entity_type,
    infrastructure::SqliteStore,
    query::{EntQuery, Expr},
    schemas::build_registry,
};

pub const LOAD_DEPTH: usize = 4;

/// Fixture schemas registered and an empty in-memory database with the event sources in place
pub struct Fixture {
    pub store: SqliteStore,
    pub registry: PropertyRegistry,
    pub sources: BTreeMap<String, EntityId>,
}

impl Fixture {
    pub async fn new() -> Self {
        let (catalog, registry) = build_registry(&DerivedConfig::default()).unwrap();
        let store = SqliteStore::new_in_memory(Arc::new(catalog)).await.unwrap();
        let sources = seed_event_sources(&store).await.unwrap();
        Self {
            store,
            registry,
            sources,
        }
    }

    pub async fn game(&self, name: &str) -> EntityId {
        self.store
            .insert(&entity_type!("game"), &[("name", name.into())])
            .await
            .unwrap()
    }

    pub async fn act(&self, game: EntityId, status: &str, is_active: bool) -> EntityId {
        self.store
            .insert(
                &entity_type!("act"),
                &[
                    ("game_id", game.into()),
                    ("sequence", 1.into()),
                    ("status", status.into()),
                    ("is_active", is_active.into()),
                ],
            )
            .await
            .unwrap()
    }

    pub async fn scene(&self, act: EntityId, status: &str) -> EntityId {
        self.store
            .insert(
                &entity_type!("scene"),
                &[
                    ("act_id", act.into()),
                    ("sequence", 1.into()),
                    ("title", "scene".into()),
                    ("status", status.into()),
                ],
            )
            .await
            .unwrap()
    }

    pub async fn event(&self, scene: EntityId, source: &str) -> EntityId {
        self.store
            .insert(
                &entity_type!("event"),
                &[
                    ("scene_id", scene.into()),
                    ("description", "something happens".into()),
                    ("source_id", self.sources[source].into()),
                ],
            )
            .await
            .unwrap()
    }

    pub async fn dice_roll(&self, scene: EntityId, result: i64, reason: Option<&str>) -> EntityId {
        self.store
            .insert(
                &entity_type!("dice_roll"),
                &[
                    ("scene_id", scene.into()),
                    ("notation", "1d20".into()),
                    ("result", result.into()),
                    ("reason", reason.into()),
                ],
            )
            .await
            .unwrap()
    }

    pub async fn interpretation_set(&self, scene: EntityId) -> EntityId {
        self.store
            .insert(
                &entity_type!("interpretation_set"),
                &[("scene_id", scene.into()), ("context", "what now?".into())],
            )
            .await
            .unwrap()
    }

    pub async fn interpretation(&self, set: EntityId, selected: bool) -> EntityId {
        self.store
            .insert(
                &entity_type!("interpretation"),
                &[
                    ("set_id", set.into()),
                    ("title", "an option".into()),
                    ("is_selected", selected.into()),
                ],
            )
            .await
            .unwrap()
    }

    pub async fn load(&self, entity: &str, id: EntityId) -> EntObject {
        self.store
            .load(&entity_type!(entity), id, LOAD_DEPTH)
            .await
            .unwrap()
            .unwrap()
    }

    /// Instance context value of `name` on a freshly loaded object
    pub async fn instance(&self, entity: &str, id: EntityId, name: &str) -> DerivedValue {
        let obj = self.load(entity, id).await;
        self.registry.evaluate(&obj, name).unwrap()
    }

    /// Query context value of `name`, selected for the single row `id`
    pub async fn queried(&self, entity: &str, id: EntityId, name: &str) -> DerivedValue {
        let entity_type = entity_type!(entity);
        let query = EntQuery::new(self.store.catalog(), &entity_type).unwrap();
        let owner = query.owner().clone();
        let query = query
            .filter(owner.id().eq(Expr::literal(id)))
            .select(self.registry.query(&entity_type, name, &owner).unwrap())
            .unwrap();
        let rows = self.store.fetch(&query).await.unwrap();
        assert_eq!(rows.len(), 1, "{} {} not found", entity, id);
        self.registry
            .property(&entity_type, name)
            .unwrap()
            .decode(&rows[0].get(name))
    }

    /// Both contexts, asserting they agree
    pub async fn value(&self, entity: &str, id: EntityId, name: &str) -> DerivedValue {
        let instance = self.instance(entity, id, name).await;
        let queried = self.queried(entity, id, name).await;
        assert_eq!(
            instance, queried,
            "{}.{} on {} disagrees between contexts",
            entity, name, id
        );
        instance
    }

    /// Ids of `entity` rows for which `predicate` (built from the property expression) holds
    pub async fn ids_where(
        &self,
        entity: &str,
        name: &str,
        predicate: impl FnOnce(Expr) -> Expr,
    ) -> Vec<EntityId> {
        let entity_type = entity_type!(entity);
        let query = EntQuery::new(self.store.catalog(), &entity_type).unwrap();
        let expr = self
            .registry
            .query(&entity_type, name, query.owner())
            .unwrap();
        let query = query.filter(predicate(expr));
        self.store.fetch_ids(&query).await.unwrap()
    }

    /// Evaluate every registered property of every row in both contexts and count the
    /// comparisons made; panics on the first disagreement.
    pub async fn assert_all_consistent(&self) -> usize {
        let mut compared = 0;
        let entities: Vec<EntityType> = self.registry.registered_entities().cloned().collect();
        for entity_type in &entities {
            let properties: Vec<_> = self.registry.properties(entity_type).collect();
            if properties.is_empty() {
                continue;
            }
            let mut query = EntQuery::new(self.store.catalog(), entity_type).unwrap();
            let owner = query.owner().clone();
            for property in &properties {
                query = query.select(property.query(&owner)).unwrap();
            }
            let rows = self.store.fetch(&query).await.unwrap();
            let objects = self.store.load_all(entity_type, LOAD_DEPTH).await.unwrap();
            assert_eq!(rows.len(), objects.len());

            for (obj, row) in objects.iter().zip(&rows) {
                assert_eq!(obj.id, row.id);
                for property in &properties {
                    let instance = property.evaluate(obj);
                    let queried = property.decode(&row.get(property.name()));
                    assert_eq!(
                        instance,
                        queried,
                        "{}.{} on {} disagrees between contexts",
                        entity_type,
                        property.name(),
                        obj.id
                    );
                    compared += 1;
                }
            }
        }
        compared
    }
}

pub fn int(value: i64) -> Expr {
    Expr::literal(Value::Int(value))
}
