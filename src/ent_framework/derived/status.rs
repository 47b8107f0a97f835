// Status properties: `has_active_{key}` and `is_{key}` booleans over related or referenced data

use serde::Serialize;

use crate::core::{EntityId, EntityType, Value};
use crate::ent_framework::derived::condition;
use crate::ent_framework::derived::config::Condition;
use crate::ent_framework::derived::path::{join_chain, walk, Hop};
use crate::ent_framework::ent_object::EntObject;
use crate::query::expr::{Expr, SubSelect, TableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusVariant {
    Field,
    CrossTable,
    FilteredRelationship,
}

/// Owner references a lookup row through `source_field`; true when the row's `name_field`
/// equals `expected`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcePlan {
    /// Loaded reference to read before falling back to a point lookup
    pub relationship: Option<String>,
    pub source_field: String,
    pub lookup: EntityType,
    pub lookup_table: String,
    pub name_field: String,
    pub expected: Value,
}

/// Outcome of evaluating a source status from loaded data alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOutcome {
    Resolved(bool),
    NeedsLookup(EntityId),
}

impl SourcePlan {
    pub fn matches(&self, source: &EntObject) -> bool {
        source.field(&self.name_field).sql_eq(&self.expected)
    }

    pub fn resolve_local(&self, owner: &EntObject) -> SourceOutcome {
        let id = match owner.field(&self.source_field) {
            Value::Int(id) => EntityId::new(id),
            _ => return SourceOutcome::Resolved(false),
        };
        if let Some(relationship) = &self.relationship {
            match owner.related_one(relationship) {
                Some(Some(source)) => return SourceOutcome::Resolved(self.matches(source)),
                // Loaded and dangling
                Some(None) => return SourceOutcome::Resolved(false),
                None => {}
            }
        }
        SourceOutcome::NeedsLookup(id)
    }

    pub fn compile(&self, owner: &TableRef, prefix: &str) -> Expr {
        let source = TableRef::new(&self.lookup_table, &format!("{}_0", prefix));
        Expr::exists(
            SubSelect::new(vec![source.clone()])
                .filter(source.id().eq(owner.column(&self.source_field)))
                .filter(
                    source
                        .column(&self.name_field)
                        .eq(Expr::Literal(self.expected.clone())),
                ),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StatusPlan {
    /// Any item reached through `hops` satisfies `field <condition>`
    Related {
        variant: StatusVariant,
        hops: Vec<Hop>,
        field: String,
        condition: Condition,
    },
    Source(SourcePlan),
    /// Condition on one of the owner's own fields; unknown reads as false
    OwnField { field: String, condition: Condition },
}

impl StatusPlan {
    /// Evaluation over loaded data only. A source status whose reference is not loaded reads as
    /// false here; `SourcePlan::resolve_local` tells callers a lookup is needed.
    pub fn evaluate(&self, owner: &EntObject) -> bool {
        match self {
            StatusPlan::Related {
                hops,
                field,
                condition,
                ..
            } => walk(owner, hops)
                .into_iter()
                .any(|item| condition::item_matches(item, field, condition)),
            StatusPlan::Source(plan) => match plan.resolve_local(owner) {
                SourceOutcome::Resolved(value) => value,
                SourceOutcome::NeedsLookup(_) => false,
            },
            StatusPlan::OwnField { field, condition } => {
                condition::item_matches(owner, field, condition)
            }
        }
    }

    pub fn compile(&self, owner: &TableRef, prefix: &str) -> Expr {
        match self {
            StatusPlan::Related {
                hops,
                field,
                condition,
                ..
            } => {
                let select = join_chain(owner, hops, prefix);
                match select.terminal().cloned() {
                    Some(terminal) => Expr::exists(
                        select.filter(condition::compile(condition, terminal.column(field))),
                    ),
                    None => Expr::literal(false),
                }
            }
            StatusPlan::Source(plan) => plan.compile(owner, prefix),
            StatusPlan::OwnField { field, condition } => {
                condition::compile(condition, owner.column(field)).null_as_false()
            }
        }
    }
}
