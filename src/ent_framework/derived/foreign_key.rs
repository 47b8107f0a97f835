// Foreign key discovery between a parent entity type and a child entity type
//
// Declared reference metadata wins. Otherwise a per-parent override and then the
// `{singular parent table}_id` naming convention stand in for it. Fallback matches made while the
// catalog is still being assembled are provisional: the registry re-checks them after sealing.

use serde::Serialize;
use tracing::trace;

use crate::core::EntityType;
use crate::ent_framework::ent_schema::{EdgeCardinality, EdgeDefinition, SchemaCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForeignKeyStrategy {
    /// Pinned on the edge definition
    Declared,
    /// Found through the child's reference metadata
    Introspected,
    /// Per-parent override registered on the catalog
    Override,
    /// `{singular}_id` naming convention
    Convention,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyMatch {
    pub column: String,
    pub strategy: ForeignKeyStrategy,
    /// Derived without authoritative metadata; must be confirmed once the catalog is sealed.
    pub provisional: bool,
}

impl ForeignKeyMatch {
    fn new(column: &str, strategy: ForeignKeyStrategy, provisional: bool) -> Self {
        Self {
            column: column.to_string(),
            strategy,
            provisional,
        }
    }
}

/// Singular form of a table name: `stories` -> `story`, `acts` -> `act`, `glass` -> `glass`.
pub fn singularize(table: &str) -> String {
    if let Some(stem) = table.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    if table.ends_with("ss") {
        return table.to_string();
    }
    table.strip_suffix('s').unwrap_or(table).to_string()
}

/// Column on `child` referencing `parent`, or `None` when nothing links them.
pub fn find_fk(
    catalog: &SchemaCatalog,
    parent: &EntityType,
    child: &EntityType,
) -> Option<ForeignKeyMatch> {
    let parent_desc = catalog.entity(parent)?;
    let child_desc = catalog.entity(child)?;

    let mut unresolved = false;
    for field in &child_desc.fields {
        let Some(table) = &field.references else {
            continue;
        };
        match catalog.entity_by_table(table) {
            Some(target) if target == parent => {
                trace!("{} -> {}: introspected '{}'", parent, child, field.name);
                return Some(ForeignKeyMatch::new(
                    &field.name,
                    ForeignKeyStrategy::Introspected,
                    false,
                ));
            }
            Some(_) => {}
            None => unresolved = true,
        }
    }

    let provisional = unresolved || !catalog.is_sealed();
    if let Some(column) = catalog.foreign_key_override(parent) {
        if child_desc.has_field(column) {
            trace!("{} -> {}: override '{}'", parent, child, column);
            return Some(ForeignKeyMatch::new(
                column,
                ForeignKeyStrategy::Override,
                provisional,
            ));
        }
    }

    let column = format!("{}_id", singularize(&parent_desc.table));
    if child_desc.has_field(&column) {
        trace!("{} -> {}: convention '{}'", parent, child, column);
        return Some(ForeignKeyMatch::new(
            &column,
            ForeignKeyStrategy::Convention,
            provisional,
        ));
    }
    None
}

/// Join column behind `edge` declared on `owner`.
///
/// Collection edges keep the column on the target; reference edges keep it on the owner.
pub fn resolve_edge(
    catalog: &SchemaCatalog,
    owner: &EntityType,
    edge: &EdgeDefinition,
) -> Option<ForeignKeyMatch> {
    let (parent, child) = match edge.cardinality {
        EdgeCardinality::OneToMany => (owner, &edge.target_entity),
        EdgeCardinality::ManyToOne => (&edge.target_entity, owner),
    };
    match &edge.foreign_key {
        Some(column) => catalog
            .has_field(child, column)
            .then(|| ForeignKeyMatch::new(column, ForeignKeyStrategy::Declared, false)),
        None => find_fk(catalog, parent, child),
    }
}
