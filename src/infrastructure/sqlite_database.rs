use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::{EntityId, EntityType, Value};
use crate::ent_framework::derived::foreign_key;
use crate::ent_framework::ent_object::EntObject;
use crate::ent_framework::ent_schema::{
    EdgeCardinality, EntityDescriptor, FieldDefinition, FieldType, SchemaCatalog,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::traits::PointLookup;
use crate::query::ent_query::EntQuery;
use crate::query::render::{literal_sql, quote_ident, SqlSink};

/// One result row of an `EntQuery`: the owner id plus every selected column.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    pub id: EntityId,
    pub values: BTreeMap<String, Value>,
}

impl QueryRow {
    pub fn get(&self, label: &str) -> Value {
        self.values.get(label).cloned().unwrap_or(Value::Null)
    }
}

/// SQLite storage for catalog-declared entities
pub struct SqliteStore {
    pool: SqlitePool,
    catalog: Arc<SchemaCatalog>,
}

impl SqliteStore {
    pub async fn new_in_memory(catalog: Arc<SchemaCatalog>) -> AppResult<Self> {
        let store = Self::connect(&DatabaseConfig::default(), catalog).await?;
        store.initialize().await?;
        Ok(store)
    }

    pub async fn connect(config: &DatabaseConfig, catalog: Arc<SchemaCatalog>) -> AppResult<Self> {
        let mut options = SqlitePoolOptions::new().max_connections(config.max_connections.max(1));
        if config.url.contains(":memory:") {
            // Every connection to :memory: is a separate database, keep the single one alive
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = options.connect(&config.url).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to SQLite at {}: {}", config.url, e))
        })?;
        info!("Connected to SQLite at {}", config.url);
        Ok(Self { pool, catalog })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    fn descriptor(&self, entity_type: &EntityType) -> AppResult<&EntityDescriptor> {
        self.catalog
            .entity(entity_type)
            .ok_or_else(|| AppError::NotFound(format!("Entity type {} is not declared", entity_type)))
    }

    /// Create a table for every declared entity
    pub async fn initialize(&self) -> AppResult<()> {
        for descriptor in self.catalog.entities() {
            let ddl = create_table_sql(descriptor);
            debug!("{}", ddl);
            sqlx::query(&ddl).execute(&self.pool).await.map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to create table {}: {}",
                    descriptor.table, e
                ))
            })?;
        }
        Ok(())
    }

    pub async fn insert(&self, entity_type: &EntityType, values: &[(&str, Value)]) -> AppResult<EntityId> {
        let descriptor = self.descriptor(entity_type)?;
        for (name, value) in values {
            check_value(descriptor, name, value)?;
        }

        let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO ");
        qb.push(quote_ident(&descriptor.table));
        if values.is_empty() {
            qb.push(" DEFAULT VALUES");
        } else {
            qb.push(" (");
            for (i, (name, _)) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push(quote_ident(name));
            }
            qb.push(") VALUES (");
            for (i, (_, value)) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push_value(value);
            }
            qb.push(")");
        }

        let result = qb.build().execute(&self.pool).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to insert {}: {}", entity_type, e))
        })?;
        Ok(EntityId::new(result.last_insert_rowid()))
    }

    pub async fn update_field(
        &self,
        entity_type: &EntityType,
        id: EntityId,
        field: &str,
        value: Value,
    ) -> AppResult<()> {
        let descriptor = self.descriptor(entity_type)?;
        check_value(descriptor, field, &value)?;

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
        qb.push(quote_ident(&descriptor.table));
        qb.push(" SET ");
        qb.push(quote_ident(field));
        qb.push(" = ");
        qb.push_value(&value);
        qb.push(" WHERE \"id\" = ");
        qb.push_bind(id.value());

        let result = qb.build().execute(&self.pool).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to update {} {}: {}", entity_type, id, e))
        })?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {} not found", entity_type, id)));
        }
        Ok(())
    }

    pub async fn delete(&self, entity_type: &EntityType, id: EntityId) -> AppResult<bool> {
        let descriptor = self.descriptor(entity_type)?;
        let sql = format!("DELETE FROM {} WHERE \"id\" = ?", quote_ident(&descriptor.table));
        let result = sqlx::query(&sql)
            .bind(id.value())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to delete {} {}: {}", entity_type, id, e))
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// A single row, without relationships
    pub async fn fetch_row(&self, entity_type: &EntityType, id: EntityId) -> AppResult<Option<EntObject>> {
        let descriptor = self.descriptor(entity_type)?;
        self.fetch_row_of(descriptor, id).await
    }

    async fn fetch_row_of(&self, descriptor: &EntityDescriptor, id: EntityId) -> AppResult<Option<EntObject>> {
        let sql = format!("SELECT * FROM {} WHERE \"id\" = ?", quote_ident(&descriptor.table));
        let row = sqlx::query(&sql)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to get {} {}: {}",
                    descriptor.entity_type, id, e
                ))
            })?;
        row.map(|row| decode_row(descriptor, &row)).transpose()
    }

    async fn fetch_children(
        &self,
        descriptor: &EntityDescriptor,
        column: &str,
        parent: EntityId,
    ) -> AppResult<Vec<EntObject>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ? ORDER BY \"id\"",
            quote_ident(&descriptor.table),
            quote_ident(column)
        );
        let rows = sqlx::query(&sql)
            .bind(parent.value())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to get {} rows for {} = {}: {}",
                    descriptor.entity_type, column, parent, e
                ))
            })?;
        rows.iter().map(|row| decode_row(descriptor, row)).collect()
    }

    /// Load one entity and its relationships, following collection edges `depth` levels deep.
    /// Reference edges are loaded as shallow rows.
    pub async fn load(
        &self,
        entity_type: &EntityType,
        id: EntityId,
        depth: usize,
    ) -> AppResult<Option<EntObject>> {
        let mut obj = match self.fetch_row(entity_type, id).await? {
            Some(obj) => obj,
            None => return Ok(None),
        };
        self.load_edges(&mut obj, depth).await?;
        Ok(Some(obj))
    }

    /// Load every row of `entity_type`, ordered by id
    pub async fn load_all(&self, entity_type: &EntityType, depth: usize) -> AppResult<Vec<EntObject>> {
        let descriptor = self.descriptor(entity_type)?;
        let sql = format!("SELECT * FROM {} ORDER BY \"id\"", quote_ident(&descriptor.table));
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to list {}: {}", entity_type, e))
            })?;
        let mut objects = rows
            .iter()
            .map(|row| decode_row(descriptor, row))
            .collect::<AppResult<Vec<_>>>()?;
        for obj in objects.iter_mut() {
            self.load_edges(obj, depth).await?;
        }
        Ok(objects)
    }

    fn load_edges<'a>(&'a self, obj: &'a mut EntObject, depth: usize) -> BoxFuture<'a, AppResult<()>> {
        async move {
            if depth == 0 {
                return Ok(());
            }
            let descriptor = self.descriptor(&obj.entity_type)?;
            for edge in &descriptor.edges {
                let Some(fk) = foreign_key::resolve_edge(&self.catalog, &descriptor.entity_type, edge)
                else {
                    debug!(
                        "Skipping edge {}.{}: no foreign key resolved",
                        descriptor.entity_type, edge.name
                    );
                    continue;
                };
                let target = self.descriptor(&edge.target_entity)?;
                match edge.cardinality {
                    EdgeCardinality::OneToMany => {
                        let mut children = self.fetch_children(target, &fk.column, obj.id).await?;
                        for child in children.iter_mut() {
                            self.load_edges(child, depth - 1).await?;
                        }
                        obj.set_many(&edge.name, children);
                    }
                    EdgeCardinality::ManyToOne => {
                        let parent = match obj.field(&fk.column) {
                            Value::Int(id) => self.fetch_row_of(target, EntityId::new(id)).await?,
                            _ => None,
                        };
                        obj.set_one(&edge.name, parent);
                    }
                }
            }
            Ok(())
        }
        .boxed()
    }

    /// Run an entity query, returning the owner id and every selected column per row.
    pub async fn fetch(&self, query: &EntQuery) -> AppResult<Vec<QueryRow>> {
        let mut qb = query.build();
        let rows = qb.build().fetch_all(&self.pool).await.map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to query {}: {}",
                query.entity_type(),
                e
            ))
        })?;

        let labels: Vec<&str> = query.selected_labels().collect();
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(|e| {
                AppError::DatabaseError(format!("Failed to read id column: {}", e))
            })?;
            let mut values = BTreeMap::new();
            for label in &labels {
                values.insert(label.to_string(), decode_any(&row, label)?);
            }
            results.push(QueryRow {
                id: EntityId::new(id),
                values,
            });
        }
        Ok(results)
    }

    pub async fn fetch_ids(&self, query: &EntQuery) -> AppResult<Vec<EntityId>> {
        Ok(self.fetch(query).await?.into_iter().map(|row| row.id).collect())
    }
}

#[async_trait]
impl PointLookup for SqliteStore {
    async fn fetch_by_id(&self, entity_type: &EntityType, id: EntityId) -> AppResult<Option<EntObject>> {
        self.fetch_row(entity_type, id).await
    }
}

fn check_value(descriptor: &EntityDescriptor, name: &str, value: &Value) -> AppResult<()> {
    let field = descriptor.get_field(name).ok_or_else(|| {
        AppError::Validation(format!("{} has no field '{}'", descriptor.entity_type, name))
    })?;
    if value.is_null() && !field.optional && !field.primary_key {
        return Err(AppError::Validation(format!(
            "{}.{} is required",
            descriptor.entity_type, name
        )));
    }
    if !field.field_type.accepts(value) {
        return Err(AppError::Validation(format!(
            "{}.{} cannot store {}",
            descriptor.entity_type, name, value
        )));
    }
    Ok(())
}

fn column_sql(field: &FieldDefinition) -> String {
    let name = quote_ident(&field.name);
    if field.primary_key {
        return format!("{} INTEGER PRIMARY KEY", name);
    }
    let mut sql = format!("{} {}", name, field.field_type.sql_type());
    if !field.optional {
        sql.push_str(" NOT NULL");
    }
    if field.unique {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = &field.default {
        sql.push_str(&format!(" DEFAULT {}", literal_sql(default)));
    }
    if let Some(table) = &field.references {
        sql.push_str(&format!(" REFERENCES {}(\"id\")", quote_ident(table)));
    }
    if let FieldType::Enum(variants) = &field.field_type {
        let allowed: Vec<String> = variants
            .iter()
            .map(|v| literal_sql(&Value::from(v.as_str())))
            .collect();
        sql.push_str(&format!(" CHECK ({} IN ({}))", name, allowed.join(", ")));
    }
    sql
}

/// `CREATE TABLE IF NOT EXISTS` statement for a declared entity
pub fn create_table_sql(descriptor: &EntityDescriptor) -> String {
    let columns: Vec<String> = descriptor.fields.iter().map(column_sql).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&descriptor.table),
        columns.join(", ")
    )
}

fn decode_row(descriptor: &EntityDescriptor, row: &SqliteRow) -> AppResult<EntObject> {
    let read_error = |name: &str, e: sqlx::Error| {
        AppError::DatabaseError(format!(
            "Failed to read {}.{}: {}",
            descriptor.entity_type, name, e
        ))
    };
    let id: i64 = row.try_get("id").map_err(|e| read_error("id", e))?;
    let mut obj = EntObject::new(descriptor.entity_type.clone(), id);
    for field in descriptor.fields.iter().filter(|f| !f.primary_key) {
        let name = field.name.as_str();
        let value = match field.field_type {
            FieldType::Int => Value::from(
                row.try_get::<Option<i64>, _>(name)
                    .map_err(|e| read_error(name, e))?,
            ),
            FieldType::Bool => Value::from(
                row.try_get::<Option<bool>, _>(name)
                    .map_err(|e| read_error(name, e))?,
            ),
            FieldType::Float => Value::from(
                row.try_get::<Option<f64>, _>(name)
                    .map_err(|e| read_error(name, e))?,
            ),
            FieldType::String | FieldType::Enum(_) => Value::from(
                row.try_get::<Option<String>, _>(name)
                    .map_err(|e| read_error(name, e))?,
            ),
        };
        obj.set(name, value);
    }
    Ok(obj)
}

/// Decode a computed column whose type is only known at runtime
fn decode_any(row: &SqliteRow, column: &str) -> AppResult<Value> {
    if let Ok(value) = row.try_get::<Option<i64>, _>(column) {
        return Ok(Value::from(value));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(column) {
        return Ok(Value::from(value));
    }
    row.try_get::<Option<String>, _>(column)
        .map(Value::from)
        .map_err(|e| AppError::DatabaseError(format!("Failed to read column {}: {}", column, e)))
}
