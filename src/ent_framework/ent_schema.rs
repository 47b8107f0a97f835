// Ent Schema - declarative entity, field and edge definitions plus the schema catalog
// The catalog is the metadata source for foreign key discovery, path resolution and DDL

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{is_identifier, EntityType, Value};
use crate::ent_framework::derived::config::PropertyDefinition;
use crate::ent_framework::derived::foreign_key;
use crate::error::{AppError, AppResult};

/// Schema definition trait - one implementation per entity type
pub trait EntSchema: Send + Sync {
    /// Entity type this schema defines
    fn entity_type() -> EntityType
    where
        Self: Sized;

    /// Backing table, `{entity}s` unless overridden
    fn table_name() -> String
    where
        Self: Sized,
    {
        format!("{}s", Self::entity_type())
    }

    /// Define fields for this entity (the `id` column is implicit)
    fn fields() -> Vec<FieldDefinition>
    where
        Self: Sized;

    /// Define edges (relationships) for this entity
    fn edges() -> Vec<EdgeDefinition>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Derived properties synthesized from this entity's relationships
    fn properties() -> Vec<PropertyDefinition>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// Field types supported by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Enum(Vec<String>),
}

impl FieldType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::String | FieldType::Enum(_) => "TEXT",
            FieldType::Int | FieldType::Bool => "INTEGER",
            FieldType::Float => "REAL",
        }
    }

    /// Numeric storage class (booleans are stored as 0/1)
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float | FieldType::Bool)
    }

    /// Whether a value may be stored in or compared against a column of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (FieldType::Int | FieldType::Bool, Value::Int(_) | Value::Bool(_)) => true,
            (FieldType::Float, v) => v.is_numeric(),
            (FieldType::String, Value::Text(_)) => true,
            (FieldType::Enum(variants), Value::Text(v)) => variants.iter().any(|variant| variant == v),
            _ => false,
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub optional: bool,
    pub unique: bool,
    pub default: Option<Value>,
    /// Table this column references, recorded as a foreign key constraint
    pub references: Option<String>,
    pub primary_key: bool,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            optional: false,
            unique: false,
            default: None,
            references: None,
            primary_key: false,
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn int(name: &str) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn enumeration(name: &str, variants: &[&str]) -> Self {
        Self::new(
            name,
            FieldType::Enum(variants.iter().map(|v| v.to_string()).collect()),
        )
    }

    /// Integer column referencing `table(id)`
    pub fn foreign_key(name: &str, table: &str) -> Self {
        Self::int(name).references(table)
    }

    fn primary_key() -> Self {
        Self {
            primary_key: true,
            ..Self::int("id")
        }
    }

    /// Mark field as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark field as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Add default value
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn references(mut self, table: &str) -> Self {
        self.references = Some(table.to_string());
        self
    }
}

/// Edge cardinality - relationship multiplicity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeCardinality {
    /// Collection edge; the foreign key lives on the target
    OneToMany,
    /// Single reference; the foreign key lives on the owner
    ManyToOne,
}

/// Edge definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub name: String,
    pub target_entity: EntityType,
    pub cardinality: EdgeCardinality,
    /// Explicit join column; discovered from metadata when absent
    pub foreign_key: Option<String>,
}

impl EdgeDefinition {
    /// Create a collection edge to another entity (owner side)
    pub fn to(name: &str, target: EntityType) -> Self {
        Self {
            name: name.to_string(),
            target_entity: target,
            cardinality: EdgeCardinality::OneToMany,
            foreign_key: None,
        }
    }

    /// Create a reference edge to the entity this one belongs to
    pub fn from(name: &str, target: EntityType) -> Self {
        Self {
            name: name.to_string(),
            target_entity: target,
            cardinality: EdgeCardinality::ManyToOne,
            foreign_key: None,
        }
    }

    /// Pin the join column instead of discovering it
    pub fn foreign_key(mut self, column: &str) -> Self {
        self.foreign_key = Some(column.to_string());
        self
    }

    pub fn is_collection(&self) -> bool {
        self.cardinality == EdgeCardinality::OneToMany
    }
}

/// Everything the catalog knows about one entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub entity_type: EntityType,
    pub table: String,
    pub fields: Vec<FieldDefinition>,
    pub edges: Vec<EdgeDefinition>,
    pub properties: Vec<PropertyDefinition>,
}

impl EntityDescriptor {
    pub fn new(entity_type: EntityType, table: &str) -> Self {
        Self {
            entity_type,
            table: table.to_string(),
            fields: vec![FieldDefinition::primary_key()],
            edges: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn from_schema<S: EntSchema>() -> Self {
        let mut descriptor = Self::new(S::entity_type(), &S::table_name());
        descriptor.fields.extend(S::fields());
        descriptor.edges = S::edges();
        descriptor.properties = S::properties();
        descriptor
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn edge(mut self, edge: EdgeDefinition) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    pub fn get_edge(&self, name: &str) -> Option<&EdgeDefinition> {
        self.edges.iter().find(|e| e.name == name)
    }
}

/// Schema catalog - holds every declared entity type
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    entities: BTreeMap<EntityType, EntityDescriptor>,
    tables: HashMap<String, EntityType>,
    foreign_key_overrides: HashMap<EntityType, String>,
    sealed: bool,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema
    pub fn register<S: EntSchema + 'static>(&mut self) -> AppResult<()> {
        self.declare(EntityDescriptor::from_schema::<S>())
    }

    /// Add an entity descriptor, checking its names are usable as SQL identifiers
    pub fn declare(&mut self, descriptor: EntityDescriptor) -> AppResult<()> {
        if self.sealed {
            return Err(AppError::Validation(format!(
                "Catalog is sealed, cannot declare entity {}",
                descriptor.entity_type
            )));
        }
        let entity = descriptor.entity_type.clone();
        if !is_identifier(entity.as_str()) {
            return Err(AppError::Validation(format!(
                "Entity type '{}' is not a valid identifier",
                entity
            )));
        }
        if !is_identifier(&descriptor.table) {
            return Err(AppError::Validation(format!(
                "Table name '{}' of entity {} is not a valid identifier",
                descriptor.table, entity
            )));
        }
        if self.entities.contains_key(&entity) {
            return Err(AppError::Validation(format!(
                "Entity {} is already declared",
                entity
            )));
        }
        if let Some(owner) = self.tables.get(&descriptor.table) {
            return Err(AppError::Validation(format!(
                "Table '{}' is already used by entity {}",
                descriptor.table, owner
            )));
        }

        let mut names = HashSet::new();
        for field in &descriptor.fields {
            if !is_identifier(&field.name) {
                return Err(AppError::Validation(format!(
                    "Field '{}' on {} is not a valid identifier",
                    field.name, entity
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(AppError::Validation(format!(
                    "Field '{}' is declared twice on {}",
                    field.name, entity
                )));
            }
            if let Some(table) = &field.references {
                if !is_identifier(table) {
                    return Err(AppError::Validation(format!(
                        "Field '{}' on {} references invalid table '{}'",
                        field.name, entity, table
                    )));
                }
            }
        }
        for edge in &descriptor.edges {
            if !is_identifier(&edge.name) {
                return Err(AppError::Validation(format!(
                    "Edge '{}' on {} is not a valid identifier",
                    edge.name, entity
                )));
            }
            if !names.insert(edge.name.as_str()) {
                return Err(AppError::Validation(format!(
                    "Edge '{}' on {} collides with another field or edge",
                    edge.name, entity
                )));
            }
            if let Some(column) = &edge.foreign_key {
                if !is_identifier(column) {
                    return Err(AppError::Validation(format!(
                        "Edge '{}' on {} names invalid foreign key '{}'",
                        edge.name, entity, column
                    )));
                }
            }
        }

        debug!(
            "Declared entity {} (table '{}', {} fields, {} edges)",
            entity,
            descriptor.table,
            descriptor.fields.len(),
            descriptor.edges.len()
        );
        self.tables.insert(descriptor.table.clone(), entity.clone());
        self.entities.insert(entity, descriptor);
        Ok(())
    }

    /// Foreign key column to try for children of `parent` when the `{singular}_id` convention
    /// does not apply (e.g. interpretation sets are referenced through `set_id`).
    pub fn override_foreign_key(&mut self, parent: EntityType, column: &str) {
        self.foreign_key_overrides.insert(parent, column.to_string());
    }

    pub fn foreign_key_override(&self, parent: &EntityType) -> Option<&str> {
        self.foreign_key_overrides.get(parent).map(|s| s.as_str())
    }

    pub fn entity(&self, entity_type: &EntityType) -> Option<&EntityDescriptor> {
        self.entities.get(entity_type)
    }

    pub fn contains(&self, entity_type: &EntityType) -> bool {
        self.entities.contains_key(entity_type)
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.values()
    }

    /// Entity type stored in `table`
    pub fn entity_by_table(&self, table: &str) -> Option<&EntityType> {
        self.tables.get(table)
    }

    pub fn field(&self, entity_type: &EntityType, name: &str) -> Option<&FieldDefinition> {
        self.entity(entity_type)?.get_field(name)
    }

    pub fn has_field(&self, entity_type: &EntityType, name: &str) -> bool {
        self.field(entity_type, name).is_some()
    }

    pub fn edge(&self, entity_type: &EntityType, name: &str) -> Option<&EdgeDefinition> {
        self.entity(entity_type)?.get_edge(name)
    }

    /// Once sealed, declared reference metadata is authoritative for foreign key discovery.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Validate schema consistency
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for descriptor in self.entities.values() {
            let entity = &descriptor.entity_type;
            for field in &descriptor.fields {
                if let Some(table) = &field.references {
                    if self.entity_by_table(table).is_none() {
                        errors.push(format!(
                            "Field '{}' on {} references undeclared table '{}'",
                            field.name, entity, table
                        ));
                    }
                }
            }

            // Validate edge references
            for edge in &descriptor.edges {
                if !self.contains(&edge.target_entity) {
                    errors.push(format!(
                        "Entity {} has edge '{}' pointing to undefined entity {}",
                        entity, edge.name, edge.target_entity
                    ));
                    continue;
                }
                if foreign_key::resolve_edge(self, entity, edge).is_none() {
                    errors.push(format!(
                        "Edge '{}' on {} has no resolvable foreign key to {}",
                        edge.name, entity, edge.target_entity
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and freeze the catalog.
    pub fn seal(&mut self) -> AppResult<()> {
        if self.sealed {
            return Ok(());
        }
        self.validate()
            .map_err(|errors| AppError::Validation(errors.join("; ")))?;
        self.sealed = true;
        debug!("Schema catalog sealed with {} entities", self.entities.len());
        Ok(())
    }
}
