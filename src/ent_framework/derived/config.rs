// Declarative configuration for derived properties
// Each variant carries exactly what is needed to synthesize both the instance evaluator and the
// query expression; the registry validates it against the catalog before anything is generated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::{EntityType, Value};

/// Comparison operators shared by the instance evaluator and the query compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    In,
    NotIn,
    NotNull,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::NotNull => "not_null",
        }
    }

    /// Operators accepted in a filter condition (`not_null` only makes sense for status checks).
    pub fn is_filter_operator(&self) -> bool {
        !matches!(self, Operator::NotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" | "equals" => Ok(Operator::Eq),
            "ne" | "not_equals" => Ok(Operator::Ne),
            "gt" => Ok(Operator::Gt),
            "lt" => Ok(Operator::Lt),
            "gte" => Ok(Operator::Gte),
            "lte" => Ok(Operator::Lte),
            "in" => Ok(Operator::In),
            "not_in" => Ok(Operator::NotIn),
            "not_null" => Ok(Operator::NotNull),
            other => Err(format!(
                "Operator '{}' not supported. Supported operators: eq, ne, gt, lt, gte, lte, in, not_in, not_null",
                other
            )),
        }
    }
}

/// A single comparison against a field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Condition {
    Equals(Value),
    NotEquals(Value),
    Greater(Value),
    Less(Value),
    GreaterOrEqual(Value),
    LessOrEqual(Value),
    InSet(Vec<Value>),
    NotInSet(Vec<Value>),
    NotNull,
}

impl Condition {
    pub fn equals(value: impl Into<Value>) -> Self {
        Condition::Equals(value.into())
    }

    pub fn not_equals(value: impl Into<Value>) -> Self {
        Condition::NotEquals(value.into())
    }

    pub fn greater(value: impl Into<Value>) -> Self {
        Condition::Greater(value.into())
    }

    pub fn less(value: impl Into<Value>) -> Self {
        Condition::Less(value.into())
    }

    pub fn greater_or_equal(value: impl Into<Value>) -> Self {
        Condition::GreaterOrEqual(value.into())
    }

    pub fn less_or_equal(value: impl Into<Value>) -> Self {
        Condition::LessOrEqual(value.into())
    }

    pub fn in_set<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Condition::InSet(values.into_iter().map(Into::into).collect())
    }

    pub fn not_in_set<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Condition::NotInSet(values.into_iter().map(Into::into).collect())
    }

    pub fn not_null() -> Self {
        Condition::NotNull
    }

    /// Build a condition from an operator spelling such as `"gte"` or `"not_in"`.
    /// Set operators expect `operand` to hold the members; `not_null` ignores it.
    pub fn parse(operator: &str, operand: Vec<Value>) -> Result<Self, String> {
        let operator = Operator::from_str(operator)?;
        let single = |mut operand: Vec<Value>| -> Result<Value, String> {
            if operand.len() == 1 {
                Ok(operand.remove(0))
            } else {
                Err(format!(
                    "Operator '{}' expects exactly one operand, got {}",
                    operator,
                    operand.len()
                ))
            }
        };
        Ok(match operator {
            Operator::Eq => Condition::Equals(single(operand)?),
            Operator::Ne => Condition::NotEquals(single(operand)?),
            Operator::Gt => Condition::Greater(single(operand)?),
            Operator::Lt => Condition::Less(single(operand)?),
            Operator::Gte => Condition::GreaterOrEqual(single(operand)?),
            Operator::Lte => Condition::LessOrEqual(single(operand)?),
            Operator::In => Condition::InSet(operand),
            Operator::NotIn => Condition::NotInSet(operand),
            Operator::NotNull => Condition::NotNull,
        })
    }

    pub fn operator(&self) -> Operator {
        match self {
            Condition::Equals(_) => Operator::Eq,
            Condition::NotEquals(_) => Operator::Ne,
            Condition::Greater(_) => Operator::Gt,
            Condition::Less(_) => Operator::Lt,
            Condition::GreaterOrEqual(_) => Operator::Gte,
            Condition::LessOrEqual(_) => Operator::Lte,
            Condition::InSet(_) => Operator::In,
            Condition::NotInSet(_) => Operator::NotIn,
            Condition::NotNull => Operator::NotNull,
        }
    }

    /// Every operand the condition compares against.
    pub fn operands(&self) -> &[Value] {
        match self {
            Condition::Equals(v)
            | Condition::NotEquals(v)
            | Condition::Greater(v)
            | Condition::Less(v)
            | Condition::GreaterOrEqual(v)
            | Condition::LessOrEqual(v) => std::slice::from_ref(v),
            Condition::InSet(values) | Condition::NotInSet(values) => values,
            Condition::NotNull => &[],
        }
    }
}

/// Restricts which related rows are counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub condition: Condition,
}

impl FilterCondition {
    pub fn new(field: &str, condition: Condition) -> Self {
        Self {
            field: field.to_string(),
            condition,
        }
    }

    /// `field == value`, the most common filter.
    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, Condition::equals(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistenceConfig {
    pub target: EntityType,
    pub foreign_key: String,
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectCountConfig {
    pub target: EntityType,
    pub foreign_key: String,
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTableCountConfig {
    pub target: EntityType,
    pub foreign_key: String,
    pub relationship_path: Vec<String>,
    #[serde(default)]
    pub property_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredCountConfig {
    pub target: EntityType,
    pub foreign_key: String,
    pub filter: FilterCondition,
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredCrossTableCountConfig {
    pub target: EntityType,
    pub foreign_key: String,
    pub relationship_path: Vec<String>,
    pub filter: FilterCondition,
    #[serde(default)]
    pub property_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStatusConfig {
    pub target: EntityType,
    pub foreign_key: String,
    pub field: String,
    pub condition: Condition,
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
}

/// Owner holds `source_field` pointing at a row of `lookup`; true when that row's `name_field`
/// equals `expected_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatusConfig {
    pub lookup: EntityType,
    pub source_field: String,
    pub name_field: String,
    pub expected_value: Value,
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTableStatusConfig {
    pub target: EntityType,
    pub relationship_path: Vec<String>,
    pub field: String,
    pub condition: Condition,
    #[serde(default)]
    pub property_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipStatusConfig {
    pub field: String,
    pub condition: Condition,
    #[serde(default)]
    pub property_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredRelationshipStatusConfig {
    pub target: EntityType,
    pub foreign_key: String,
    pub filter_field: String,
    pub filter_value: Value,
    #[serde(default)]
    pub relationship_name: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
}

/// Closed set of derived property configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyConfig {
    Existence(ExistenceConfig),
    DirectCount(DirectCountConfig),
    CrossTableCount(CrossTableCountConfig),
    FilteredCount(FilteredCountConfig),
    FilteredCrossTableCount(FilteredCrossTableCountConfig),
    FieldStatus(FieldStatusConfig),
    SourceStatus(SourceStatusConfig),
    CrossTableStatus(CrossTableStatusConfig),
    RelationshipStatus(RelationshipStatusConfig),
    FilteredRelationshipStatus(FilteredRelationshipStatusConfig),
}

impl PropertyConfig {
    pub fn existence(target: EntityType, foreign_key: &str) -> Self {
        PropertyConfig::Existence(ExistenceConfig {
            target,
            foreign_key: foreign_key.to_string(),
            relationship_name: None,
            property_name: None,
        })
    }

    pub fn direct_count(target: EntityType, foreign_key: &str) -> Self {
        PropertyConfig::DirectCount(DirectCountConfig {
            target,
            foreign_key: foreign_key.to_string(),
            relationship_name: None,
            property_name: None,
        })
    }

    pub fn cross_table_count(target: EntityType, foreign_key: &str, path: &[&str]) -> Self {
        PropertyConfig::CrossTableCount(CrossTableCountConfig {
            target,
            foreign_key: foreign_key.to_string(),
            relationship_path: path.iter().map(|s| s.to_string()).collect(),
            property_name: None,
        })
    }

    pub fn filtered_count(target: EntityType, foreign_key: &str, filter: FilterCondition) -> Self {
        PropertyConfig::FilteredCount(FilteredCountConfig {
            target,
            foreign_key: foreign_key.to_string(),
            filter,
            relationship_name: None,
            property_name: None,
        })
    }

    pub fn filtered_cross_table_count(
        target: EntityType,
        foreign_key: &str,
        path: &[&str],
        filter: FilterCondition,
    ) -> Self {
        PropertyConfig::FilteredCrossTableCount(FilteredCrossTableCountConfig {
            target,
            foreign_key: foreign_key.to_string(),
            relationship_path: path.iter().map(|s| s.to_string()).collect(),
            filter,
            property_name: None,
        })
    }

    pub fn field_status(
        target: EntityType,
        foreign_key: &str,
        field: &str,
        condition: Condition,
    ) -> Self {
        PropertyConfig::FieldStatus(FieldStatusConfig {
            target,
            foreign_key: foreign_key.to_string(),
            field: field.to_string(),
            condition,
            relationship_name: None,
            property_name: None,
        })
    }

    pub fn source_status(
        lookup: EntityType,
        source_field: &str,
        name_field: &str,
        expected_value: impl Into<Value>,
    ) -> Self {
        PropertyConfig::SourceStatus(SourceStatusConfig {
            lookup,
            source_field: source_field.to_string(),
            name_field: name_field.to_string(),
            expected_value: expected_value.into(),
            relationship_name: None,
            property_name: None,
        })
    }

    pub fn cross_table_status(
        target: EntityType,
        path: &[&str],
        field: &str,
        condition: Condition,
    ) -> Self {
        PropertyConfig::CrossTableStatus(CrossTableStatusConfig {
            target,
            relationship_path: path.iter().map(|s| s.to_string()).collect(),
            field: field.to_string(),
            condition,
            property_name: None,
        })
    }

    pub fn relationship_status(field: &str, condition: Condition) -> Self {
        PropertyConfig::RelationshipStatus(RelationshipStatusConfig {
            field: field.to_string(),
            condition,
            property_name: None,
        })
    }

    pub fn filtered_relationship_status(
        target: EntityType,
        foreign_key: &str,
        filter_field: &str,
        filter_value: impl Into<Value>,
    ) -> Self {
        PropertyConfig::FilteredRelationshipStatus(FilteredRelationshipStatusConfig {
            target,
            foreign_key: foreign_key.to_string(),
            filter_field: filter_field.to_string(),
            filter_value: filter_value.into(),
            relationship_name: None,
            property_name: None,
        })
    }

    /// Use a relationship other than the one named by the config key.
    ///
    /// Path-based variants name their relationships in the path, and bare-field status has
    /// none; for those this is a no-op.
    pub fn relationship(mut self, name: &str) -> Self {
        let slot = match &mut self {
            PropertyConfig::Existence(c) => Some(&mut c.relationship_name),
            PropertyConfig::DirectCount(c) => Some(&mut c.relationship_name),
            PropertyConfig::FilteredCount(c) => Some(&mut c.relationship_name),
            PropertyConfig::FieldStatus(c) => Some(&mut c.relationship_name),
            PropertyConfig::SourceStatus(c) => Some(&mut c.relationship_name),
            PropertyConfig::FilteredRelationshipStatus(c) => Some(&mut c.relationship_name),
            PropertyConfig::CrossTableCount(_)
            | PropertyConfig::FilteredCrossTableCount(_)
            | PropertyConfig::CrossTableStatus(_)
            | PropertyConfig::RelationshipStatus(_) => None,
        };
        if let Some(slot) = slot {
            *slot = Some(name.to_string());
        }
        self
    }

    /// Override the generated property name.
    pub fn named(mut self, property_name: &str) -> Self {
        let slot = match &mut self {
            PropertyConfig::Existence(c) => &mut c.property_name,
            PropertyConfig::DirectCount(c) => &mut c.property_name,
            PropertyConfig::CrossTableCount(c) => &mut c.property_name,
            PropertyConfig::FilteredCount(c) => &mut c.property_name,
            PropertyConfig::FilteredCrossTableCount(c) => &mut c.property_name,
            PropertyConfig::FieldStatus(c) => &mut c.property_name,
            PropertyConfig::SourceStatus(c) => &mut c.property_name,
            PropertyConfig::CrossTableStatus(c) => &mut c.property_name,
            PropertyConfig::RelationshipStatus(c) => &mut c.property_name,
            PropertyConfig::FilteredRelationshipStatus(c) => &mut c.property_name,
        };
        *slot = Some(property_name.to_string());
        self
    }

    fn name_override(&self) -> Option<&str> {
        match self {
            PropertyConfig::Existence(c) => c.property_name.as_deref(),
            PropertyConfig::DirectCount(c) => c.property_name.as_deref(),
            PropertyConfig::CrossTableCount(c) => c.property_name.as_deref(),
            PropertyConfig::FilteredCount(c) => c.property_name.as_deref(),
            PropertyConfig::FilteredCrossTableCount(c) => c.property_name.as_deref(),
            PropertyConfig::FieldStatus(c) => c.property_name.as_deref(),
            PropertyConfig::SourceStatus(c) => c.property_name.as_deref(),
            PropertyConfig::CrossTableStatus(c) => c.property_name.as_deref(),
            PropertyConfig::RelationshipStatus(c) => c.property_name.as_deref(),
            PropertyConfig::FilteredRelationshipStatus(c) => c.property_name.as_deref(),
        }
    }

    /// Name of the generated property for config key `key`.
    pub fn property_name(&self, key: &str) -> String {
        if let Some(name) = self.name_override() {
            return name.to_string();
        }
        match self {
            PropertyConfig::Existence(_) => format!("has_{}", key),
            PropertyConfig::DirectCount(_)
            | PropertyConfig::CrossTableCount(_)
            | PropertyConfig::FilteredCount(_)
            | PropertyConfig::FilteredCrossTableCount(_) => format!("{}_count", key),
            PropertyConfig::SourceStatus(_) | PropertyConfig::RelationshipStatus(_) => {
                format!("is_{}", key)
            }
            PropertyConfig::FieldStatus(_)
            | PropertyConfig::CrossTableStatus(_)
            | PropertyConfig::FilteredRelationshipStatus(_) => format!("has_active_{}", key),
        }
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            PropertyConfig::Existence(_) => "existence",
            PropertyConfig::DirectCount(_) => "direct_count",
            PropertyConfig::CrossTableCount(_) => "cross_table_count",
            PropertyConfig::FilteredCount(_) => "filtered_count",
            PropertyConfig::FilteredCrossTableCount(_) => "filtered_cross_table_count",
            PropertyConfig::FieldStatus(_) => "field_status",
            PropertyConfig::SourceStatus(_) => "source_status",
            PropertyConfig::CrossTableStatus(_) => "cross_table_status",
            PropertyConfig::RelationshipStatus(_) => "relationship_status",
            PropertyConfig::FilteredRelationshipStatus(_) => "filtered_relationship_status",
        }
    }
}

/// A configured property on an entity schema: the config key plus its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub key: String,
    pub config: PropertyConfig,
}

impl PropertyDefinition {
    pub fn new(key: &str, config: PropertyConfig) -> Self {
        Self {
            key: key.to_string(),
            config,
        }
    }

    pub fn property_name(&self) -> String {
        self.config.property_name(&self.key)
    }
}
