// A synthesized derived property: one name, one plan, two evaluation contexts

use serde::Serialize;
use std::fmt;
use tracing::warn;

use crate::config::LookupFailurePolicy;
use crate::core::{EntityType, Value};
use crate::ent_framework::derived::counting::CountPlan;
use crate::ent_framework::derived::existence::ExistencePlan;
use crate::ent_framework::derived::status::{SourceOutcome, StatusPlan};
use crate::ent_framework::ent_object::EntObject;
use crate::error::{AppError, AppResult};
use crate::infrastructure::traits::PointLookup;
use crate::query::expr::{Expr, TableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropertyKind {
    Existence,
    Count,
    Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyPlan {
    Existence(ExistencePlan),
    Count(CountPlan),
    Status(StatusPlan),
}

/// Value of a derived property in the instance context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DerivedValue {
    Bool(bool),
    Count(i64),
}

impl DerivedValue {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            DerivedValue::Bool(v) => Some(v),
            DerivedValue::Count(_) => None,
        }
    }

    pub fn as_count(self) -> Option<i64> {
        match self {
            DerivedValue::Count(v) => Some(v),
            DerivedValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for DerivedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DerivedValue::Bool(v) => write!(f, "{}", v),
            DerivedValue::Count(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedProperty {
    owner: EntityType,
    key: String,
    name: String,
    variant: &'static str,
    plan: PropertyPlan,
}

impl DerivedProperty {
    pub fn new(
        owner: EntityType,
        key: &str,
        name: &str,
        variant: &'static str,
        plan: PropertyPlan,
    ) -> Self {
        Self {
            owner,
            key: key.to_string(),
            name: name.to_string(),
            variant,
            plan,
        }
    }

    pub fn owner(&self) -> &EntityType {
        &self.owner
    }

    /// Configuration key the property was generated from
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration variant, e.g. `filtered_cross_table_count`
    pub fn variant(&self) -> &'static str {
        self.variant
    }

    pub fn plan(&self) -> &PropertyPlan {
        &self.plan
    }

    pub fn kind(&self) -> PropertyKind {
        match self.plan {
            PropertyPlan::Existence(_) => PropertyKind::Existence,
            PropertyPlan::Count(_) => PropertyKind::Count,
            PropertyPlan::Status(_) => PropertyKind::Status,
        }
    }

    /// Instance context over loaded data only; never performs I/O.
    pub fn evaluate(&self, obj: &EntObject) -> DerivedValue {
        match &self.plan {
            PropertyPlan::Existence(plan) => DerivedValue::Bool(plan.evaluate(obj)),
            PropertyPlan::Count(plan) => DerivedValue::Count(plan.evaluate(obj)),
            PropertyPlan::Status(StatusPlan::Source(plan)) => match plan.resolve_local(obj) {
                SourceOutcome::Resolved(value) => DerivedValue::Bool(value),
                SourceOutcome::NeedsLookup(id) => {
                    warn!(
                        "{}.{} on {}: {} {} is not loaded, reading as false (use evaluate_with_lookup to fetch it)",
                        self.owner,
                        self.name,
                        obj.key(),
                        plan.lookup,
                        id
                    );
                    DerivedValue::Bool(false)
                }
            },
            PropertyPlan::Status(plan) => DerivedValue::Bool(plan.evaluate(obj)),
        }
    }

    /// Instance context that may fetch an unloaded lookup row through `lookup`.
    pub async fn evaluate_with_lookup(
        &self,
        obj: &EntObject,
        lookup: &dyn PointLookup,
        policy: LookupFailurePolicy,
    ) -> AppResult<DerivedValue> {
        let plan = match &self.plan {
            PropertyPlan::Status(StatusPlan::Source(plan)) => plan,
            _ => return Ok(self.evaluate(obj)),
        };
        let id = match plan.resolve_local(obj) {
            SourceOutcome::Resolved(value) => return Ok(DerivedValue::Bool(value)),
            SourceOutcome::NeedsLookup(id) => id,
        };
        match lookup.fetch_by_id(&plan.lookup, id).await {
            Ok(Some(source)) => Ok(DerivedValue::Bool(plan.matches(&source))),
            Ok(None) => Ok(DerivedValue::Bool(false)),
            Err(e) => match policy {
                LookupFailurePolicy::Lenient => {
                    warn!(
                        "{}.{} on {}: lookup of {} {} failed, reading as false: {}",
                        self.owner,
                        self.name,
                        obj.key(),
                        plan.lookup,
                        id,
                        e
                    );
                    Ok(DerivedValue::Bool(false))
                }
                LookupFailurePolicy::Strict => Err(AppError::Lookup(format!(
                    "{}.{} on {}: lookup of {} {} failed: {}",
                    self.owner,
                    self.name,
                    obj.key(),
                    plan.lookup,
                    id,
                    e
                ))),
            },
        }
    }

    /// Query context: an expression correlated with `owner`, labeled with the property name.
    pub fn query(&self, owner: &TableRef) -> Expr {
        let expr = match &self.plan {
            PropertyPlan::Existence(plan) => plan.compile(owner, &self.name),
            PropertyPlan::Count(plan) => plan.compile(owner, &self.name),
            PropertyPlan::Status(plan) => plan.compile(owner, &self.name),
        };
        expr.label(&self.name)
    }

    /// Interpret a value selected through `query` as this property's instance-context value.
    pub fn decode(&self, raw: &Value) -> DerivedValue {
        match self.kind() {
            PropertyKind::Count => DerivedValue::Count(raw.as_i64().unwrap_or(0)),
            PropertyKind::Existence | PropertyKind::Status => {
                DerivedValue::Bool(raw.as_bool().unwrap_or(false))
            }
        }
    }
}
