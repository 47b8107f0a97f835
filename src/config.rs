use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::core::EntityType;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub derived: DerivedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// What to do when a point lookup fails while evaluating a source status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailurePolicy {
    /// Log a warning and read the property as false
    #[default]
    Lenient,
    /// Return the lookup error to the caller
    Strict,
}

impl FromStr for LookupFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(LookupFailurePolicy::Lenient),
            "strict" => Ok(LookupFailurePolicy::Strict),
            other => Err(format!(
                "Unknown lookup policy '{}', expected 'lenient' or 'strict'",
                other
            )),
        }
    }
}

impl fmt::Display for LookupFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailurePolicy::Lenient => write!(f, "lenient"),
            LookupFailurePolicy::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivedConfig {
    pub lookup_policy: LookupFailurePolicy,
    /// How many edge levels the object graph loader follows
    pub load_depth: usize,
    /// Irregular foreign key columns, `parent entity -> column on its children`
    pub foreign_key_overrides: Vec<(EntityType, String)>,
}

impl Default for DerivedConfig {
    fn default() -> Self {
        Self {
            lookup_policy: LookupFailurePolicy::Lenient,
            load_depth: 4,
            foreign_key_overrides: Vec::new(),
        }
    }
}

/// Parse `entity=column,entity=column`
pub fn parse_foreign_key_overrides(raw: &str) -> anyhow::Result<Vec<(EntityType, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (entity, column) = entry
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Expected entity=column, got '{}'", entry))?;
            let entity = EntityType::new(entity.trim())
                .map_err(|e| anyhow::anyhow!("Invalid entity '{}': {}", entity.trim(), e))?;
            let column = column.trim();
            if !crate::core::is_identifier(column) {
                anyhow::bail!("Invalid foreign key column '{}'", column);
            }
            Ok((entity, column.to_string()))
        })
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .unwrap_or(1),
            },
            derived: DerivedConfig {
                lookup_policy: env::var("DERIVED_LOOKUP_POLICY")
                    .unwrap_or_else(|_| "lenient".to_string())
                    .parse()
                    .map_err(anyhow::Error::msg)?,
                load_depth: env::var("DERIVED_LOAD_DEPTH")
                    .unwrap_or_else(|_| "4".to_string())
                    .parse()
                    .unwrap_or(4),
                foreign_key_overrides: parse_foreign_key_overrides(
                    &env::var("DERIVED_FK_OVERRIDES").unwrap_or_default(),
                )?,
            },
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.database.url.contains(":memory:")
    }
}
