// Property registry
//
// Validates every property configuration of an entity type against the catalog and installs the
// synthesized properties all at once. A single bad configuration rejects the whole entity type.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::LookupFailurePolicy;
use crate::core::{EntityType, Value};
use crate::ent_framework::derived::config::{Condition, PropertyConfig};
use crate::ent_framework::derived::counting::CountPlan;
use crate::ent_framework::derived::existence::ExistencePlan;
use crate::ent_framework::derived::foreign_key;
use crate::ent_framework::derived::path::{self, Hop, PathError};
use crate::ent_framework::derived::property::{DerivedProperty, DerivedValue, PropertyPlan};
use crate::ent_framework::derived::status::{SourcePlan, StatusPlan, StatusVariant};
use crate::ent_framework::ent_object::EntObject;
use crate::ent_framework::ent_schema::{
    EdgeCardinality, EntityDescriptor, FieldDefinition, FieldType, SchemaCatalog,
};
use crate::error::{AppError, AppResult, RegistrationError};
use crate::infrastructure::traits::PointLookup;
use crate::query::expr::{Expr, TableRef};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RegistrationState {
    #[default]
    Unregistered,
    Validating,
    Registered,
    Rejected(RegistrationError),
}

/// A foreign key accepted through the naming fallback, to be confirmed once the catalog is sealed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeferredCheck {
    pub property: String,
    pub relationship: String,
    pub parent: EntityType,
    pub child: EntityType,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationReport {
    pub entity: EntityType,
    pub properties: Vec<String>,
    pub deferred: Vec<DeferredCheck>,
}

#[derive(Debug, Default)]
struct EntityRegistration {
    state: RegistrationState,
    properties: BTreeMap<String, DerivedProperty>,
    deferred: Vec<DeferredCheck>,
}

#[derive(Debug, Default)]
pub struct PropertyRegistry {
    entities: BTreeMap<EntityType, EntityRegistration>,
    lookup_policy: LookupFailurePolicy,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup_policy(lookup_policy: LookupFailurePolicy) -> Self {
        Self {
            lookup_policy,
            ..Self::default()
        }
    }

    pub fn lookup_policy(&self) -> LookupFailurePolicy {
        self.lookup_policy
    }

    pub fn state(&self, entity: &EntityType) -> RegistrationState {
        self.entities
            .get(entity)
            .map(|registration| registration.state.clone())
            .unwrap_or_default()
    }

    /// Validate and install every derived property declared on `entity`.
    pub fn register(
        &mut self,
        catalog: &SchemaCatalog,
        entity: &EntityType,
    ) -> Result<RegistrationReport, RegistrationError> {
        match self.state(entity) {
            RegistrationState::Registered => {
                return Err(RegistrationError::AlreadyRegistered {
                    entity: entity.clone(),
                })
            }
            RegistrationState::Rejected(_) => {
                return Err(RegistrationError::PreviouslyRejected {
                    entity: entity.clone(),
                })
            }
            RegistrationState::Unregistered | RegistrationState::Validating => {}
        }

        let registration = self.entities.entry(entity.clone()).or_default();
        registration.state = RegistrationState::Validating;

        let result = match catalog.entity(entity) {
            Some(descriptor) => build_properties(catalog, descriptor),
            None => Err(RegistrationError::UnknownEntity {
                entity: entity.clone(),
                property: None,
                missing: entity.clone(),
            }),
        };

        match result {
            Ok((properties, deferred)) => {
                let names: Vec<String> = properties.iter().map(|p| p.name().to_string()).collect();
                registration.properties = properties
                    .into_iter()
                    .map(|p| (p.name().to_string(), p))
                    .collect();
                for check in &deferred {
                    warn!(
                        "{}.{}: foreign key {}.{} for relationship '{}' found by naming fallback, re-checked on finalize",
                        entity, check.property, check.child, check.column, check.relationship
                    );
                }
                registration.deferred = deferred.clone();
                registration.state = RegistrationState::Registered;
                info!("Registered {} derived properties on {}", names.len(), entity);
                Ok(RegistrationReport {
                    entity: entity.clone(),
                    properties: names,
                    deferred,
                })
            }
            Err(e) => {
                error!("Rejected derived properties for {}: {}", entity, e);
                registration.properties.clear();
                registration.deferred.clear();
                registration.state = RegistrationState::Rejected(e.clone());
                Err(e)
            }
        }
    }

    /// Register every entity type in the catalog, stopping at the first rejection.
    pub fn register_all(
        &mut self,
        catalog: &SchemaCatalog,
    ) -> Result<Vec<RegistrationReport>, RegistrationError> {
        let entities: Vec<EntityType> = catalog.entities().map(|d| d.entity_type.clone()).collect();
        let mut reports = Vec::with_capacity(entities.len());
        for entity in &entities {
            if self.state(entity) == RegistrationState::Registered {
                continue;
            }
            reports.push(self.register(catalog, entity)?);
        }
        Ok(reports)
    }

    /// Confirm every deferred foreign key against the sealed catalog. Entity types whose
    /// fallback matches do not hold up are rejected and lose all of their properties.
    pub fn finalize(&mut self, catalog: &SchemaCatalog) -> AppResult<()> {
        if !catalog.is_sealed() {
            return Err(AppError::Validation(
                "Schema catalog must be sealed before derived properties are finalized".to_string(),
            ));
        }

        let mut first_failure = None;
        for (entity, registration) in self.entities.iter_mut() {
            if registration.state != RegistrationState::Registered {
                continue;
            }
            let failure = registration
                .deferred
                .iter()
                .find_map(|check| recheck(catalog, entity, check));
            match failure {
                Some(e) => {
                    error!("Rejected derived properties for {} on finalize: {}", entity, e);
                    registration.properties.clear();
                    registration.deferred.clear();
                    registration.state = RegistrationState::Rejected(e.clone());
                    first_failure.get_or_insert(e);
                }
                None => {
                    if !registration.deferred.is_empty() {
                        debug!(
                            "Confirmed {} deferred foreign keys on {}",
                            registration.deferred.len(),
                            entity
                        );
                    }
                    registration.deferred.clear();
                }
            }
        }

        match first_failure {
            Some(e) => Err(AppError::Registration(e)),
            None => Ok(()),
        }
    }

    /// Foreign keys still waiting for confirmation
    pub fn deferred(&self, entity: &EntityType) -> &[DeferredCheck] {
        self.entities
            .get(entity)
            .map(|registration| registration.deferred.as_slice())
            .unwrap_or(&[])
    }

    pub fn registered_entities(&self) -> impl Iterator<Item = &EntityType> {
        self.entities
            .iter()
            .filter(|(_, r)| r.state == RegistrationState::Registered)
            .map(|(entity, _)| entity)
    }

    /// Installed properties of `entity`, in name order
    pub fn properties(&self, entity: &EntityType) -> impl Iterator<Item = &DerivedProperty> {
        self.entities
            .get(entity)
            .into_iter()
            .flat_map(|registration| registration.properties.values())
    }

    pub fn property(&self, entity: &EntityType, name: &str) -> AppResult<&DerivedProperty> {
        let registration = self
            .entities
            .get(entity)
            .filter(|r| r.state == RegistrationState::Registered)
            .ok_or_else(|| {
                AppError::NotFound(format!("No derived properties registered for {}", entity))
            })?;
        registration.properties.get(name).ok_or_else(|| {
            AppError::NotFound(format!("Derived property {}.{} does not exist", entity, name))
        })
    }

    /// Instance context
    pub fn evaluate(&self, obj: &EntObject, name: &str) -> AppResult<DerivedValue> {
        Ok(self.property(&obj.entity_type, name)?.evaluate(obj))
    }

    /// Instance context with point-lookup fallback for unloaded lookup rows
    pub async fn evaluate_with_lookup(
        &self,
        obj: &EntObject,
        name: &str,
        lookup: &dyn PointLookup,
    ) -> AppResult<DerivedValue> {
        self.property(&obj.entity_type, name)?
            .evaluate_with_lookup(obj, lookup, self.lookup_policy)
            .await
    }

    /// Query context, correlated with `owner`
    pub fn query(&self, entity: &EntityType, name: &str, owner: &TableRef) -> AppResult<Expr> {
        Ok(self.property(entity, name)?.query(owner))
    }
}

fn recheck(
    catalog: &SchemaCatalog,
    entity: &EntityType,
    check: &DeferredCheck,
) -> Option<RegistrationError> {
    let resolved = catalog
        .edge(&check.parent, &check.relationship)
        .and_then(|edge| foreign_key::resolve_edge(catalog, &check.parent, edge));
    match resolved {
        Some(found) if found.column == check.column => None,
        Some(found) => Some(RegistrationError::ForeignKeyMismatch {
            entity: entity.clone(),
            property: check.property.clone(),
            relationship: check.relationship.clone(),
            declared: check.column.clone(),
            resolved: found.column,
        }),
        None => Some(RegistrationError::MissingForeignKey {
            entity: entity.clone(),
            property: check.property.clone(),
            parent: check.parent.clone(),
            child: check.child.clone(),
            column: Some(check.column.clone()),
        }),
    }
}

type Built = (Vec<DerivedProperty>, Vec<DeferredCheck>);

fn build_properties(
    catalog: &SchemaCatalog,
    descriptor: &EntityDescriptor,
) -> Result<Built, RegistrationError> {
    let mut properties = Vec::with_capacity(descriptor.properties.len());
    let mut deferred = Vec::new();
    let mut names = HashSet::new();

    for definition in &descriptor.properties {
        let mut ctx = ValidationContext {
            catalog,
            owner: descriptor,
            key: &definition.key,
            deferred: &mut deferred,
        };
        let plan = ctx.build_plan(&definition.config)?;
        let name = definition.property_name();
        if !names.insert(name.clone())
            || descriptor.has_field(&name)
            || descriptor.get_edge(&name).is_some()
        {
            return Err(RegistrationError::DuplicateProperty {
                entity: descriptor.entity_type.clone(),
                property: name,
            });
        }
        debug!(
            "{}.{}: {} from '{}'",
            descriptor.entity_type,
            name,
            definition.config.variant_name(),
            definition.key
        );
        properties.push(DerivedProperty::new(
            descriptor.entity_type.clone(),
            &definition.key,
            &name,
            definition.config.variant_name(),
            plan,
        ));
    }
    Ok((properties, deferred))
}

/// Validation of one property configuration against the catalog
struct ValidationContext<'a> {
    catalog: &'a SchemaCatalog,
    owner: &'a EntityDescriptor,
    key: &'a str,
    deferred: &'a mut Vec<DeferredCheck>,
}

impl<'a> ValidationContext<'a> {
    fn entity_type(&self) -> EntityType {
        self.owner.entity_type.clone()
    }

    fn build_plan(&mut self, config: &PropertyConfig) -> Result<PropertyPlan, RegistrationError> {
        Ok(match config {
            PropertyConfig::Existence(c) => {
                let hop = self.relationship_hop(
                    c.relationship_name.as_deref(),
                    &c.target,
                    &c.foreign_key,
                )?;
                PropertyPlan::Existence(ExistencePlan::new(hop))
            }
            PropertyConfig::DirectCount(c) => {
                let hop = self.relationship_hop(
                    c.relationship_name.as_deref(),
                    &c.target,
                    &c.foreign_key,
                )?;
                PropertyPlan::Count(CountPlan::direct(hop))
            }
            PropertyConfig::CrossTableCount(c) => {
                let hops = self.path(&c.relationship_path, &c.target, Some(&c.foreign_key))?;
                PropertyPlan::Count(CountPlan::cross_table(hops))
            }
            PropertyConfig::FilteredCount(c) => {
                let hop = self.relationship_hop(
                    c.relationship_name.as_deref(),
                    &c.target,
                    &c.foreign_key,
                )?;
                self.check_condition(&c.target, &c.filter.field, &c.filter.condition, false)?;
                PropertyPlan::Count(CountPlan::filtered(hop, c.filter.clone()))
            }
            PropertyConfig::FilteredCrossTableCount(c) => {
                let hops = self.path(&c.relationship_path, &c.target, Some(&c.foreign_key))?;
                self.check_condition(&c.target, &c.filter.field, &c.filter.condition, false)?;
                PropertyPlan::Count(CountPlan::filtered_cross_table(hops, c.filter.clone()))
            }
            PropertyConfig::FieldStatus(c) => {
                let hop = self.relationship_hop(
                    c.relationship_name.as_deref(),
                    &c.target,
                    &c.foreign_key,
                )?;
                self.check_condition(&c.target, &c.field, &c.condition, true)?;
                PropertyPlan::Status(StatusPlan::Related {
                    variant: StatusVariant::Field,
                    hops: vec![hop],
                    field: c.field.clone(),
                    condition: c.condition.clone(),
                })
            }
            PropertyConfig::SourceStatus(c) => {
                let lookup = self.declared(&c.lookup)?;
                let source = self.require_field(self.owner, &c.source_field)?;
                self.check_source_field(source, lookup)?;
                let name_field = self.require_field(lookup, &c.name_field)?;
                self.check_operand(name_field, &c.expected_value)?;
                let relationship = self.source_relationship(
                    c.relationship_name.as_deref(),
                    &c.source_field,
                    &c.lookup,
                )?;
                PropertyPlan::Status(StatusPlan::Source(SourcePlan {
                    relationship,
                    source_field: c.source_field.clone(),
                    lookup: c.lookup.clone(),
                    lookup_table: lookup.table.clone(),
                    name_field: c.name_field.clone(),
                    expected: c.expected_value.clone(),
                }))
            }
            PropertyConfig::CrossTableStatus(c) => {
                let hops = self.path(&c.relationship_path, &c.target, None)?;
                self.check_condition(&c.target, &c.field, &c.condition, true)?;
                PropertyPlan::Status(StatusPlan::Related {
                    variant: StatusVariant::CrossTable,
                    hops,
                    field: c.field.clone(),
                    condition: c.condition.clone(),
                })
            }
            PropertyConfig::RelationshipStatus(c) => {
                let owner = self.entity_type();
                self.check_condition(&owner, &c.field, &c.condition, true)?;
                PropertyPlan::Status(StatusPlan::OwnField {
                    field: c.field.clone(),
                    condition: c.condition.clone(),
                })
            }
            PropertyConfig::FilteredRelationshipStatus(c) => {
                let hop = self.relationship_hop(
                    c.relationship_name.as_deref(),
                    &c.target,
                    &c.foreign_key,
                )?;
                let condition = Condition::Equals(c.filter_value.clone());
                self.check_condition(&c.target, &c.filter_field, &condition, false)?;
                PropertyPlan::Status(StatusPlan::Related {
                    variant: StatusVariant::FilteredRelationship,
                    hops: vec![hop],
                    field: c.filter_field.clone(),
                    condition,
                })
            }
        })
    }

    fn declared(&self, entity: &EntityType) -> Result<&'a EntityDescriptor, RegistrationError> {
        self.catalog
            .entity(entity)
            .ok_or_else(|| RegistrationError::UnknownEntity {
                entity: self.entity_type(),
                property: Some(self.key.to_string()),
                missing: entity.clone(),
            })
    }

    fn path_error(&self, error: PathError, path: &[String]) -> RegistrationError {
        let entity = self.entity_type();
        let property = self.key.to_string();
        match error {
            PathError::Empty => RegistrationError::MissingRelationship {
                entity: entity.clone(),
                property,
                on: entity,
                relationship: "(empty path)".to_string(),
                path: Vec::new(),
            },
            PathError::UnknownEntity(missing) => RegistrationError::UnknownEntity {
                entity,
                property: Some(property),
                missing,
            },
            PathError::MissingRelationship { on, relationship } => {
                RegistrationError::MissingRelationship {
                    entity,
                    property,
                    on,
                    relationship,
                    path: path.to_vec(),
                }
            }
            PathError::SingleValued { on, relationship } => {
                RegistrationError::SingleValuedRelationship {
                    entity,
                    property,
                    on,
                    relationship,
                }
            }
            PathError::MissingForeignKey { parent, child } => RegistrationError::MissingForeignKey {
                entity,
                property,
                parent,
                child,
                column: None,
            },
        }
    }

    fn defer_if_provisional(&mut self, hop: &Hop) {
        if hop.foreign_key.provisional {
            self.deferred.push(DeferredCheck {
                property: self.key.to_string(),
                relationship: hop.relationship.clone(),
                parent: hop.from.clone(),
                child: hop.entity.clone(),
                column: hop.foreign_key.column.clone(),
            });
        }
    }

    /// The declared column must exist on the child and be the one the hop joins on.
    fn check_foreign_key(&self, hop: &Hop, declared: &str) -> Result<(), RegistrationError> {
        if !self.catalog.has_field(&hop.entity, declared) {
            return Err(RegistrationError::MissingForeignKey {
                entity: self.entity_type(),
                property: self.key.to_string(),
                parent: hop.from.clone(),
                child: hop.entity.clone(),
                column: Some(declared.to_string()),
            });
        }
        if hop.foreign_key.column != declared {
            return Err(RegistrationError::ForeignKeyMismatch {
                entity: self.entity_type(),
                property: self.key.to_string(),
                relationship: hop.relationship.clone(),
                declared: declared.to_string(),
                resolved: hop.foreign_key.column.clone(),
            });
        }
        Ok(())
    }

    fn check_target(&self, hop: &Hop, target: &EntityType) -> Result<(), RegistrationError> {
        if &hop.entity != target {
            return Err(RegistrationError::TargetMismatch {
                entity: self.entity_type(),
                property: self.key.to_string(),
                relationship: hop.relationship.clone(),
                expected: target.clone(),
                found: hop.entity.clone(),
            });
        }
        Ok(())
    }

    /// One collection relationship on the owner, named explicitly or after the config key.
    fn relationship_hop(
        &mut self,
        relationship: Option<&str>,
        target: &EntityType,
        foreign_key: &str,
    ) -> Result<Hop, RegistrationError> {
        self.declared(target)?;
        let relationship = relationship.unwrap_or(self.key);
        let hop = path::resolve_hop(self.catalog, &self.owner.entity_type, relationship)
            .map_err(|e| self.path_error(e, &[relationship.to_string()]))?;
        self.check_target(&hop, target)?;
        self.check_foreign_key(&hop, foreign_key)?;
        self.defer_if_provisional(&hop);
        Ok(hop)
    }

    /// A relationship path ending at `target`; `foreign_key` names the last hop's join column.
    fn path(
        &mut self,
        segments: &[String],
        target: &EntityType,
        foreign_key: Option<&str>,
    ) -> Result<Vec<Hop>, RegistrationError> {
        self.declared(target)?;
        let hops = path::resolve_hops(self.catalog, &self.owner.entity_type, segments)
            .map_err(|e| self.path_error(e, segments))?;
        if let Some(last) = hops.last() {
            self.check_target(last, target)?;
            if let Some(foreign_key) = foreign_key {
                self.check_foreign_key(last, foreign_key)?;
            }
        }
        for hop in &hops {
            self.defer_if_provisional(hop);
        }
        Ok(hops)
    }

    /// Reference relationship used to read a lookup row without I/O.
    fn source_relationship(
        &self,
        explicit: Option<&str>,
        source_field: &str,
        lookup: &EntityType,
    ) -> Result<Option<String>, RegistrationError> {
        let name = match explicit {
            Some(name) => name,
            None => source_field.strip_suffix("_id").unwrap_or(source_field),
        };
        let usable = self.owner.get_edge(name).and_then(|edge| {
            let joins_on_source = foreign_key::resolve_edge(self.catalog, &self.owner.entity_type, edge)
                .map_or(false, |found| found.column == source_field);
            (edge.cardinality == EdgeCardinality::ManyToOne
                && &edge.target_entity == lookup
                && joins_on_source)
                .then_some(edge)
        });
        match (usable, explicit) {
            (Some(edge), _) => Ok(Some(edge.name.clone())),
            (None, None) => {
                debug!(
                    "{}.{}: no reference relationship '{}', lookups go through the point lookup",
                    self.owner.entity_type, self.key, name
                );
                Ok(None)
            }
            (None, Some(name)) => Err(match self.owner.get_edge(name) {
                Some(edge) if &edge.target_entity != lookup => RegistrationError::TargetMismatch {
                    entity: self.entity_type(),
                    property: self.key.to_string(),
                    relationship: name.to_string(),
                    expected: lookup.clone(),
                    found: edge.target_entity.clone(),
                },
                Some(edge) if edge.cardinality == EdgeCardinality::ManyToOne => {
                    RegistrationError::ForeignKeyMismatch {
                        entity: self.entity_type(),
                        property: self.key.to_string(),
                        relationship: name.to_string(),
                        declared: source_field.to_string(),
                        resolved: foreign_key::resolve_edge(
                            self.catalog,
                            &self.owner.entity_type,
                            edge,
                        )
                        .map(|found| found.column)
                        .unwrap_or_default(),
                    }
                }
                _ => RegistrationError::MissingRelationship {
                    entity: self.entity_type(),
                    property: self.key.to_string(),
                    on: self.entity_type(),
                    relationship: name.to_string(),
                    path: vec![name.to_string()],
                },
            }),
        }
    }

    fn require_field(
        &self,
        descriptor: &'a EntityDescriptor,
        field: &str,
    ) -> Result<&'a FieldDefinition, RegistrationError> {
        descriptor
            .get_field(field)
            .ok_or_else(|| RegistrationError::MissingField {
                entity: self.entity_type(),
                property: self.key.to_string(),
                target: descriptor.entity_type.clone(),
                field: field.to_string(),
            })
    }

    /// The source field holds the lookup row's id: an integer column, referencing the lookup
    /// table when it declares a reference at all.
    fn check_source_field(
        &self,
        field: &FieldDefinition,
        lookup: &EntityDescriptor,
    ) -> Result<(), RegistrationError> {
        if field.field_type != FieldType::Int {
            return Err(self.invalid_operand(
                field,
                format!("{:?} column cannot hold a {} id", field.field_type, lookup.entity_type),
            ));
        }
        match &field.references {
            Some(table) if table != &lookup.table => Err(self.invalid_operand(
                field,
                format!("references '{}', not the {} table '{}'", table, lookup.entity_type, lookup.table),
            )),
            _ => Ok(()),
        }
    }

    fn invalid_operand(&self, field: &FieldDefinition, reason: String) -> RegistrationError {
        RegistrationError::InvalidOperand {
            entity: self.entity_type(),
            property: self.key.to_string(),
            field: field.name.clone(),
            reason,
        }
    }

    /// Operands must be non-null and comparable with the column in both contexts.
    fn check_operand(&self, field: &FieldDefinition, operand: &Value) -> Result<(), RegistrationError> {
        if operand.is_null() {
            return Err(self.invalid_operand(field, "null operand never matches".to_string()));
        }
        let compatible = match &field.field_type {
            FieldType::Int | FieldType::Float | FieldType::Bool => operand.is_numeric(),
            FieldType::String => operand.is_text(),
            FieldType::Enum(variants) => operand
                .as_str()
                .map_or(false, |v| variants.iter().any(|variant| variant == v)),
        };
        if !compatible {
            let reason = match &field.field_type {
                FieldType::Enum(variants) => format!(
                    "{} is not one of [{}]",
                    operand,
                    variants.join(", ")
                ),
                other => format!("{} cannot be compared with a {} column", operand, other.sql_type()),
            };
            return Err(self.invalid_operand(field, reason));
        }
        Ok(())
    }

    fn check_condition(
        &self,
        target: &EntityType,
        field: &str,
        condition: &Condition,
        allow_not_null: bool,
    ) -> Result<(), RegistrationError> {
        let descriptor = self.declared(target)?;
        let field = self.require_field(descriptor, field)?;
        let operator = condition.operator();
        if !allow_not_null && !operator.is_filter_operator() {
            return Err(RegistrationError::UnsupportedOperator {
                entity: self.entity_type(),
                property: self.key.to_string(),
                operator: operator.to_string(),
            });
        }
        if matches!(condition, Condition::InSet(_) | Condition::NotInSet(_))
            && condition.operands().is_empty()
        {
            return Err(self.invalid_operand(field, format!("empty set for '{}'", operator)));
        }
        for operand in condition.operands() {
            self.check_operand(field, operand)?;
        }
        Ok(())
    }
}
