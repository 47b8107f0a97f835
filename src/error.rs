use std::fmt;

use crate::core::strong_types::EntityType;

#[derive(Debug)]
pub enum AppError {
    Database(anyhow::Error),
    DatabaseError(String),
    NotFound(String),
    Internal(String),
    Validation(String),
    ConfigurationError(String),
    Registration(RegistrationError),
    Lookup(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(err) => write!(f, "Database error: {}", err),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Registration(err) => write!(f, "Registration error: {}", err),
            AppError::Lookup(msg) => write!(f, "Lookup error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Registration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        AppError::Registration(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Registration-time failures. All of them are fatal: the entity type is rejected and none of
/// its derived properties are installed.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// A relationship (or one segment of a relationship path) is not declared on `on`.
    MissingRelationship {
        entity: EntityType,
        property: String,
        on: EntityType,
        relationship: String,
        path: Vec<String>,
    },
    /// Path traversal and aggregation only work over one-to-many relationships.
    SingleValuedRelationship {
        entity: EntityType,
        property: String,
        on: EntityType,
        relationship: String,
    },
    /// No foreign key links `parent` to `child`, by declaration, introspection or convention.
    MissingForeignKey {
        entity: EntityType,
        property: String,
        parent: EntityType,
        child: EntityType,
        column: Option<String>,
    },
    ForeignKeyMismatch {
        entity: EntityType,
        property: String,
        relationship: String,
        declared: String,
        resolved: String,
    },
    MissingField {
        entity: EntityType,
        property: String,
        target: EntityType,
        field: String,
    },
    UnsupportedOperator {
        entity: EntityType,
        property: String,
        operator: String,
    },
    InvalidOperand {
        entity: EntityType,
        property: String,
        field: String,
        reason: String,
    },
    TargetMismatch {
        entity: EntityType,
        property: String,
        relationship: String,
        expected: EntityType,
        found: EntityType,
    },
    UnknownEntity {
        entity: EntityType,
        property: Option<String>,
        missing: EntityType,
    },
    DuplicateProperty {
        entity: EntityType,
        property: String,
    },
    AlreadyRegistered {
        entity: EntityType,
    },
    PreviouslyRejected {
        entity: EntityType,
    },
}

impl RegistrationError {
    /// Entity type whose registration failed.
    pub fn entity(&self) -> &EntityType {
        match self {
            RegistrationError::MissingRelationship { entity, .. }
            | RegistrationError::SingleValuedRelationship { entity, .. }
            | RegistrationError::MissingForeignKey { entity, .. }
            | RegistrationError::ForeignKeyMismatch { entity, .. }
            | RegistrationError::MissingField { entity, .. }
            | RegistrationError::UnsupportedOperator { entity, .. }
            | RegistrationError::InvalidOperand { entity, .. }
            | RegistrationError::TargetMismatch { entity, .. }
            | RegistrationError::UnknownEntity { entity, .. }
            | RegistrationError::DuplicateProperty { entity, .. }
            | RegistrationError::AlreadyRegistered { entity }
            | RegistrationError::PreviouslyRejected { entity } => entity,
        }
    }

    /// Property key at fault, when the failure is tied to one configuration.
    pub fn property(&self) -> Option<&str> {
        match self {
            RegistrationError::MissingRelationship { property, .. }
            | RegistrationError::SingleValuedRelationship { property, .. }
            | RegistrationError::MissingForeignKey { property, .. }
            | RegistrationError::ForeignKeyMismatch { property, .. }
            | RegistrationError::MissingField { property, .. }
            | RegistrationError::UnsupportedOperator { property, .. }
            | RegistrationError::InvalidOperand { property, .. }
            | RegistrationError::TargetMismatch { property, .. }
            | RegistrationError::DuplicateProperty { property, .. } => Some(property),
            RegistrationError::UnknownEntity { property, .. } => property.as_deref(),
            RegistrationError::AlreadyRegistered { .. }
            | RegistrationError::PreviouslyRejected { .. } => None,
        }
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::MissingRelationship { entity, property, on, relationship, path } => {
                if path.len() > 1 {
                    write!(
                        f,
                        "{}.{}: relationship '{}' not found on {} in relationship path [{}]",
                        entity, property, relationship, on, path.join(" -> ")
                    )
                } else {
                    write!(
                        f,
                        "{}.{}: entity {} has no relationship '{}'",
                        entity, property, on, relationship
                    )
                }
            }
            RegistrationError::SingleValuedRelationship { entity, property, on, relationship } => write!(
                f,
                "{}.{}: relationship '{}' on {} is single-valued, a one-to-many relationship is required",
                entity, property, relationship, on
            ),
            RegistrationError::MissingForeignKey { entity, property, parent, child, column } => match column {
                Some(column) => write!(
                    f,
                    "{}.{}: foreign key '{}' not found on {} (expected to reference {})",
                    entity, property, column, child, parent
                ),
                None => write!(
                    f,
                    "{}.{}: no foreign key on {} references {}",
                    entity, property, child, parent
                ),
            },
            RegistrationError::ForeignKeyMismatch { entity, property, relationship, declared, resolved } => write!(
                f,
                "{}.{}: declared foreign key '{}' does not match '{}' used by relationship '{}'",
                entity, property, declared, resolved, relationship
            ),
            RegistrationError::MissingField { entity, property, target, field } => write!(
                f,
                "{}.{}: field '{}' not found on {}",
                entity, property, field, target
            ),
            RegistrationError::UnsupportedOperator { entity, property, operator } => write!(
                f,
                "{}.{}: operator '{}' is not supported here",
                entity, property, operator
            ),
            RegistrationError::InvalidOperand { entity, property, field, reason } => write!(
                f,
                "{}.{}: invalid operand for field '{}': {}",
                entity, property, field, reason
            ),
            RegistrationError::TargetMismatch { entity, property, relationship, expected, found } => write!(
                f,
                "{}.{}: relationship '{}' leads to {}, but the configuration targets {}",
                entity, property, relationship, found, expected
            ),
            RegistrationError::UnknownEntity { entity, property, missing } => match property {
                Some(property) => write!(
                    f,
                    "{}.{}: entity type {} is not declared",
                    entity, property, missing
                ),
                None => write!(f, "{}: entity type {} is not declared", entity, missing),
            },
            RegistrationError::DuplicateProperty { entity, property } => write!(
                f,
                "{}: property '{}' is generated more than once",
                entity, property
            ),
            RegistrationError::AlreadyRegistered { entity } => {
                write!(f, "{}: derived properties are already registered", entity)
            }
            RegistrationError::PreviouslyRejected { entity } => write!(
                f,
                "{}: registration was rejected earlier, fix the schema and restart",
                entity
            ),
        }
    }
}

impl std::error::Error for RegistrationError {}
