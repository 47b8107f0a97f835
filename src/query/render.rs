// SQLite rendering for expression trees
// Values go out as bind parameters through sqlx's QueryBuilder, or inline for display.

use sqlx::{QueryBuilder, Sqlite};

use crate::core::Value;
use crate::query::expr::{Expr, SubSelect, TableRef};

/// Destination for rendered SQL.
pub trait SqlSink {
    fn push_sql(&mut self, sql: &str);
    fn push_value(&mut self, value: &Value);
}

impl<'args> SqlSink for QueryBuilder<'args, Sqlite> {
    fn push_sql(&mut self, sql: &str) {
        self.push(sql);
    }

    fn push_value(&mut self, value: &Value) {
        match value {
            Value::Null => {
                self.push("NULL");
            }
            Value::Bool(v) => {
                self.push_bind(*v);
            }
            Value::Int(v) => {
                self.push_bind(*v);
            }
            Value::Float(v) => {
                self.push_bind(*v);
            }
            Value::Text(v) => {
                self.push_bind(v.clone());
            }
        }
    }
}

/// Renders with literals inlined, for logging and `entc describe`.
#[derive(Debug, Default)]
pub struct InlineSql(String);

impl InlineSql {
    pub fn into_string(self) -> String {
        self.0
    }
}

impl SqlSink for InlineSql {
    fn push_sql(&mut self, sql: &str) {
        self.0.push_str(sql);
    }

    fn push_value(&mut self, value: &Value) {
        self.0.push_str(&literal_sql(value));
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite literal for a value
pub fn literal_sql(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(v) => if *v { "1" } else { "0" }.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Float(v) => format!("{:?}", v),
        Value::Text(v) => format!("'{}'", v.replace('\'', "''")),
    }
}

pub fn to_sql(expr: &Expr) -> String {
    let mut sink = InlineSql::default();
    render(expr, &mut sink);
    sink.into_string()
}

fn render_join<S: SqlSink>(parts: &[Expr], separator: &str, empty: &str, sink: &mut S) {
    if parts.is_empty() {
        sink.push_sql(empty);
        return;
    }
    sink.push_sql("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            sink.push_sql(separator);
        }
        render(part, sink);
    }
    sink.push_sql(")");
}

pub fn render_table<S: SqlSink>(table: &TableRef, sink: &mut S) {
    sink.push_sql(&quote_ident(&table.table));
    sink.push_sql(" AS ");
    sink.push_sql(&quote_ident(&table.alias));
}

fn render_from_where<S: SqlSink>(select: &SubSelect, sink: &mut S) {
    sink.push_sql(" FROM ");
    for (i, table) in select.from.iter().enumerate() {
        if i > 0 {
            sink.push_sql(", ");
        }
        render_table(table, sink);
    }
    if !select.filter.is_empty() {
        sink.push_sql(" WHERE ");
        for (i, part) in select.filter.iter().enumerate() {
            if i > 0 {
                sink.push_sql(" AND ");
            }
            render(part, sink);
        }
    }
}

pub fn render<S: SqlSink>(expr: &Expr, sink: &mut S) {
    match expr {
        Expr::Column { alias, column } => {
            sink.push_sql(&quote_ident(alias));
            sink.push_sql(".");
            sink.push_sql(&quote_ident(column));
        }
        Expr::Literal(value) => sink.push_value(value),
        Expr::Compare { left, op, right } => {
            sink.push_sql("(");
            render(left, sink);
            sink.push_sql(" ");
            sink.push_sql(op.as_sql());
            sink.push_sql(" ");
            render(right, sink);
            sink.push_sql(")");
        }
        Expr::InList {
            expr,
            values,
            negated,
        } => {
            sink.push_sql("(");
            render(expr, sink);
            sink.push_sql(if *negated { " NOT IN (" } else { " IN (" });
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    sink.push_sql(", ");
                }
                sink.push_value(value);
            }
            sink.push_sql("))");
        }
        Expr::IsNotNull(inner) => {
            sink.push_sql("(");
            render(inner, sink);
            sink.push_sql(" IS NOT NULL)");
        }
        Expr::And(parts) => render_join(parts, " AND ", "1", sink),
        Expr::Not(inner) => {
            sink.push_sql("(NOT ");
            render(inner, sink);
            sink.push_sql(")");
        }
        Expr::Exists(select) => {
            sink.push_sql("EXISTS (SELECT 1");
            render_from_where(select, sink);
            sink.push_sql(")");
        }
        Expr::Count(select) => {
            sink.push_sql("(SELECT COUNT(");
            match select.terminal() {
                Some(terminal) => render(&terminal.id(), sink),
                None => sink.push_sql("*"),
            }
            sink.push_sql(")");
            render_from_where(select, sink);
            sink.push_sql(")");
        }
        Expr::NullAsFalse(inner) => {
            sink.push_sql("COALESCE(");
            render(inner, sink);
            sink.push_sql(", 0)");
        }
        Expr::Labeled { expr, .. } => render(expr, sink),
    }
}
