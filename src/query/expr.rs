// Composable SQL expression tree
// Derived properties compile into these; the renderer turns them into SQLite text with binds.

use serde::Serialize;
use std::cmp::Ordering;

use crate::core::Value;

/// A table in a FROM list, always aliased so correlated subqueries can refer back to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRef {
    pub table: String,
    pub alias: String,
}

impl TableRef {
    pub fn new(table: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: alias.to_string(),
        }
    }

    pub fn column(&self, column: &str) -> Expr {
        Expr::column(&self.alias, column)
    }

    pub fn id(&self) -> Expr {
        self.column("id")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Gte => ">=",
            CompareOp::Lte => "<=",
        }
    }

    /// Whether `left <op> right` holds given the ordering of `left` relative to `right`.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// `SELECT ... FROM <from> WHERE <filter...>` used inside `EXISTS` and `COUNT` subqueries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubSelect {
    pub from: Vec<TableRef>,
    pub filter: Vec<Expr>,
}

impl SubSelect {
    pub fn new(from: Vec<TableRef>) -> Self {
        Self {
            from,
            filter: Vec::new(),
        }
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter.push(expr);
        self
    }

    /// Last table in the FROM list, the rows being counted
    pub fn terminal(&self) -> Option<&TableRef> {
        self.from.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Column { alias: String, column: String },
    Literal(Value),
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    InList {
        expr: Box<Expr>,
        values: Vec<Value>,
        negated: bool,
    },
    IsNotNull(Box<Expr>),
    And(Vec<Expr>),
    Not(Box<Expr>),
    Exists(Box<SubSelect>),
    /// `(SELECT COUNT(terminal.id) ...)`, zero when nothing matches
    Count(Box<SubSelect>),
    /// `COALESCE(expr, 0)`: unknown collapses to false
    NullAsFalse(Box<Expr>),
    /// A named expression; the label is used when it appears in a select list
    Labeled { expr: Box<Expr>, label: String },
}

impl Expr {
    pub fn column(alias: &str, column: &str) -> Self {
        Expr::Column {
            alias: alias.to_string(),
            column: column.to_string(),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn exists(select: SubSelect) -> Self {
        Expr::Exists(Box::new(select))
    }

    pub fn count(select: SubSelect) -> Self {
        Expr::Count(Box::new(select))
    }

    pub fn compare(self, op: CompareOp, right: Expr) -> Self {
        Expr::Compare {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(self, right: Expr) -> Self {
        self.compare(CompareOp::Eq, right)
    }

    pub fn gte(self, right: Expr) -> Self {
        self.compare(CompareOp::Gte, right)
    }

    pub fn not_in_list(self, values: Vec<Value>) -> Self {
        Expr::InList {
            expr: Box::new(self),
            values,
            negated: true,
        }
    }

    pub fn is_not_null(self) -> Self {
        Expr::IsNotNull(Box::new(self))
    }

    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut parts) => {
                parts.push(other);
                Expr::And(parts)
            }
            first => Expr::And(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn null_as_false(self) -> Self {
        Expr::NullAsFalse(Box::new(self))
    }

    pub fn label(self, label: &str) -> Self {
        Expr::Labeled {
            expr: Box::new(self.unlabeled()),
            label: label.to_string(),
        }
    }

    pub fn label_name(&self) -> Option<&str> {
        match self {
            Expr::Labeled { label, .. } => Some(label),
            _ => None,
        }
    }

    /// The expression without its label
    pub fn unlabeled(self) -> Self {
        match self {
            Expr::Labeled { expr, .. } => *expr,
            other => other,
        }
    }
}
