// Relationship paths
// A path is a chain of one-to-many relationship names starting at the owner entity. Resolution
// checks every hop against the catalog; the resolved hops drive both the in-memory walk and the
// implicit-join subquery.

use serde::Serialize;

use crate::core::EntityType;
use crate::ent_framework::derived::foreign_key::{self, ForeignKeyMatch};
use crate::ent_framework::ent_object::EntObject;
use crate::ent_framework::ent_schema::SchemaCatalog;
use crate::query::expr::{SubSelect, TableRef};

/// One resolved relationship step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hop {
    pub relationship: String,
    pub from: EntityType,
    pub entity: EntityType,
    pub table: String,
    pub foreign_key: ForeignKeyMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    Empty,
    UnknownEntity(EntityType),
    MissingRelationship {
        on: EntityType,
        relationship: String,
    },
    SingleValued {
        on: EntityType,
        relationship: String,
    },
    MissingForeignKey {
        parent: EntityType,
        child: EntityType,
    },
}

/// Resolve one collection relationship declared on `from`.
pub fn resolve_hop(
    catalog: &SchemaCatalog,
    from: &EntityType,
    relationship: &str,
) -> Result<Hop, PathError> {
    let descriptor = catalog
        .entity(from)
        .ok_or_else(|| PathError::UnknownEntity(from.clone()))?;
    let edge = descriptor
        .get_edge(relationship)
        .ok_or_else(|| PathError::MissingRelationship {
            on: from.clone(),
            relationship: relationship.to_string(),
        })?;
    if !edge.is_collection() {
        return Err(PathError::SingleValued {
            on: from.clone(),
            relationship: relationship.to_string(),
        });
    }
    let target = catalog
        .entity(&edge.target_entity)
        .ok_or_else(|| PathError::UnknownEntity(edge.target_entity.clone()))?;
    let foreign_key = foreign_key::resolve_edge(catalog, from, edge).ok_or_else(|| {
        PathError::MissingForeignKey {
            parent: from.clone(),
            child: edge.target_entity.clone(),
        }
    })?;
    Ok(Hop {
        relationship: relationship.to_string(),
        from: from.clone(),
        entity: target.entity_type.clone(),
        table: target.table.clone(),
        foreign_key,
    })
}

pub fn resolve_hops(
    catalog: &SchemaCatalog,
    owner: &EntityType,
    path: &[String],
) -> Result<Vec<Hop>, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    let mut hops = Vec::with_capacity(path.len());
    let mut current = owner.clone();
    for relationship in path {
        let hop = resolve_hop(catalog, &current, relationship)?;
        current = hop.entity.clone();
        hops.push(hop);
    }
    Ok(hops)
}

/// Entity type reached after each segment of `path`.
pub fn resolve(
    catalog: &SchemaCatalog,
    owner: &EntityType,
    path: &[String],
) -> Result<Vec<EntityType>, PathError> {
    Ok(resolve_hops(catalog, owner, path)?
        .into_iter()
        .map(|hop| hop.entity)
        .collect())
}

/// Items reached by walking `hops` from `owner`, one entry per distinct path.
pub fn walk<'a>(owner: &'a EntObject, hops: &[Hop]) -> Vec<&'a EntObject> {
    let mut level = vec![owner];
    for hop in hops {
        level = level
            .into_iter()
            .flat_map(|item| item.related(&hop.relationship))
            .collect();
    }
    level
}

/// FROM list and join predicates for `hops`, correlated with `owner`.
/// Aliases are `{prefix}_{index}` so several derived expressions can share one query.
pub fn join_chain(owner: &TableRef, hops: &[Hop], prefix: &str) -> SubSelect {
    let mut select = SubSelect::new(Vec::with_capacity(hops.len()));
    let mut previous = owner.clone();
    for (i, hop) in hops.iter().enumerate() {
        let table = TableRef::new(&hop.table, &format!("{}_{}", prefix, i));
        select = select.filter(table.column(&hop.foreign_key.column).eq(previous.id()));
        select.from.push(table.clone());
        previous = table;
    }
    select
}
