// Entity queries: select rows of one entity type, filtered, ordered and projected by expressions

use sqlx::{QueryBuilder, Sqlite};

use crate::core::EntityType;
use crate::ent_framework::ent_schema::SchemaCatalog;
use crate::error::{AppError, AppResult};
use crate::query::expr::{Expr, TableRef};
use crate::query::render::{quote_ident, render, render_table, InlineSql, SqlSink};

/// Alias of the queried entity's table inside every generated query
pub const OWNER_ALIAS: &str = "owner";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => " ASC",
            Order::Desc => " DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntQuery {
    entity_type: EntityType,
    owner: TableRef,
    selects: Vec<(String, Expr)>,
    filters: Vec<Expr>,
    order: Vec<(Expr, Order)>,
    limit: Option<i64>,
}

impl EntQuery {
    pub fn new(catalog: &SchemaCatalog, entity_type: &EntityType) -> AppResult<Self> {
        let descriptor = catalog.entity(entity_type).ok_or_else(|| {
            AppError::NotFound(format!("Entity type {} is not declared", entity_type))
        })?;
        Ok(Self {
            entity_type: entity_type.clone(),
            owner: TableRef::new(&descriptor.table, OWNER_ALIAS),
            selects: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        })
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// The queried table; derived property expressions correlate against it.
    pub fn owner(&self) -> &TableRef {
        &self.owner
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filters.push(expr.unlabeled());
        self
    }

    pub fn order_by(mut self, expr: Expr, order: Order) -> Self {
        self.order.push((expr.unlabeled(), order));
        self
    }

    /// Project a labeled expression as an extra result column.
    pub fn select(mut self, expr: Expr) -> AppResult<Self> {
        let label = expr
            .label_name()
            .ok_or_else(|| AppError::Validation("Selected expressions must be labeled".to_string()))?
            .to_string();
        if label == "id" || self.selects.iter().any(|(existing, _)| *existing == label) {
            return Err(AppError::Validation(format!(
                "Column '{}' is already selected",
                label
            )));
        }
        self.selects.push((label, expr.unlabeled()));
        Ok(self)
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn selected_labels(&self) -> impl Iterator<Item = &str> {
        self.selects.iter().map(|(label, _)| label.as_str())
    }

    fn push_sql<S: SqlSink>(&self, sink: &mut S) {
        sink.push_sql("SELECT ");
        render(&self.owner.id(), sink);
        sink.push_sql(" AS \"id\"");
        for (label, expr) in &self.selects {
            sink.push_sql(", ");
            render(expr, sink);
            sink.push_sql(" AS ");
            sink.push_sql(&quote_ident(label));
        }
        sink.push_sql(" FROM ");
        render_table(&self.owner, sink);
        if !self.filters.is_empty() {
            sink.push_sql(" WHERE ");
            for (i, filter) in self.filters.iter().enumerate() {
                if i > 0 {
                    sink.push_sql(" AND ");
                }
                render(filter, sink);
            }
        }
        sink.push_sql(" ORDER BY ");
        for (expr, order) in &self.order {
            render(expr, sink);
            sink.push_sql(order.as_sql());
            sink.push_sql(", ");
        }
        render(&self.owner.id(), sink);
        sink.push_sql(" ASC");
        if let Some(limit) = self.limit {
            sink.push_sql(&format!(" LIMIT {}", limit));
        }
    }

    pub fn build<'args>(&self) -> QueryBuilder<'args, Sqlite> {
        let mut qb = QueryBuilder::new("");
        self.push_sql(&mut qb);
        qb
    }

    /// SQL with literals inlined
    pub fn to_sql(&self) -> String {
        let mut sink = InlineSql::default();
        self.push_sql(&mut sink);
        sink.into_string()
    }
}
