// In-memory entity graph
// An EntObject is one loaded row plus whichever relationships were loaded alongside it

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, EntityType, ObjectKey, Value};

/// Loaded contents of one relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Related {
    Many(Vec<EntObject>),
    One(Option<Box<EntObject>>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntObject {
    pub entity_type: EntityType,
    pub id: EntityId,
    fields: BTreeMap<String, Value>,
    relations: HashMap<String, Related>,
}

impl EntObject {
    pub fn new(entity_type: EntityType, id: impl Into<EntityId>) -> Self {
        Self {
            entity_type,
            id: id.into(),
            fields: BTreeMap::new(),
            relations: HashMap::new(),
        }
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.entity_type.clone(), self.id)
    }

    /// Builder-style field assignment
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Builder-style collection assignment
    pub fn with_many(mut self, relationship: &str, items: Vec<EntObject>) -> Self {
        self.set_many(relationship, items);
        self
    }

    /// Builder-style single reference assignment
    pub fn with_one(mut self, relationship: &str, item: Option<EntObject>) -> Self {
        self.set_one(relationship, item);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn set_many(&mut self, relationship: &str, items: Vec<EntObject>) {
        self.relations
            .insert(relationship.to_string(), Related::Many(items));
    }

    pub fn set_one(&mut self, relationship: &str, item: Option<EntObject>) {
        self.relations
            .insert(relationship.to_string(), Related::One(item.map(Box::new)));
    }

    /// Field value; `id` reads the identity, unknown fields read as `Null`.
    pub fn field(&self, name: &str) -> Value {
        if name == "id" {
            return Value::Int(self.id.value());
        }
        self.fields.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn is_loaded(&self, relationship: &str) -> bool {
        self.relations.contains_key(relationship)
    }

    /// Items of a collection relationship. A relationship that was never loaded reads as empty.
    pub fn related(&self, relationship: &str) -> &[EntObject] {
        match self.relations.get(relationship) {
            Some(Related::Many(items)) => items,
            _ => &[],
        }
    }

    /// Target of a single reference: `None` when not loaded, `Some(None)` when loaded and absent.
    pub fn related_one(&self, relationship: &str) -> Option<Option<&EntObject>> {
        match self.relations.get(relationship) {
            Some(Related::One(item)) => Some(item.as_deref()),
            _ => None,
        }
    }

    pub fn related_mut(&mut self, relationship: &str) -> Option<&mut Vec<EntObject>> {
        match self.relations.get_mut(relationship) {
            Some(Related::Many(items)) => Some(items),
            _ => None,
        }
    }
}
