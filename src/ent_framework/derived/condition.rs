// Condition evaluation in both contexts
// Instance and query sides share one operator table so they cannot drift apart.

use crate::core::Value;
use crate::ent_framework::derived::config::Condition;
use crate::ent_framework::ent_object::EntObject;
use crate::query::expr::{CompareOp, Expr};

enum Predicate<'a> {
    Compare(CompareOp, &'a Value),
    Member { values: &'a [Value], negated: bool },
    NotNull,
}

fn predicate(condition: &Condition) -> Predicate<'_> {
    match condition {
        Condition::Equals(v) => Predicate::Compare(CompareOp::Eq, v),
        Condition::NotEquals(v) => Predicate::Compare(CompareOp::Ne, v),
        Condition::Greater(v) => Predicate::Compare(CompareOp::Gt, v),
        Condition::Less(v) => Predicate::Compare(CompareOp::Lt, v),
        Condition::GreaterOrEqual(v) => Predicate::Compare(CompareOp::Gte, v),
        Condition::LessOrEqual(v) => Predicate::Compare(CompareOp::Lte, v),
        Condition::InSet(values) => Predicate::Member {
            values,
            negated: false,
        },
        Condition::NotInSet(values) => Predicate::Member {
            values,
            negated: true,
        },
        Condition::NotNull => Predicate::NotNull,
    }
}

/// Whether `value` satisfies `condition`. Unknown (SQL NULL) results count as not satisfied.
pub fn matches(condition: &Condition, value: &Value) -> bool {
    match predicate(condition) {
        Predicate::Compare(op, operand) => value
            .sql_cmp(operand)
            .map_or(false, |ordering| op.holds(ordering)),
        Predicate::Member { values, negated } => {
            let mut found = false;
            for member in values {
                match value.sql_cmp(member) {
                    Some(ordering) if ordering.is_eq() => found = true,
                    Some(_) => {}
                    // x NOT IN (.., NULL, ..) is never true
                    None if negated => return false,
                    None => {}
                }
            }
            found != negated
        }
        Predicate::NotNull => !value.is_null(),
    }
}

/// Instance evaluation of `item.field <condition>`
pub fn item_matches(item: &EntObject, field: &str, condition: &Condition) -> bool {
    matches(condition, &item.field(field))
}

/// Query expression for `field <condition>`
pub fn compile(condition: &Condition, field: Expr) -> Expr {
    match predicate(condition) {
        Predicate::Compare(op, operand) => field.compare(op, Expr::Literal(operand.clone())),
        Predicate::Member { values, negated } => Expr::InList {
            expr: Box::new(field),
            values: values.to_vec(),
            negated,
        },
        Predicate::NotNull => field.is_not_null(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::render::to_sql;

    #[test]
    fn test_comparisons() {
        assert!(matches(&Condition::equals(true), &Value::Bool(true)));
        assert!(matches(&Condition::equals(true), &Value::Int(1)));
        assert!(!matches(&Condition::equals(true), &Value::Null));
        assert!(matches(&Condition::greater(2), &Value::Int(3)));
        assert!(!matches(&Condition::less_or_equal(2), &Value::Float(2.5)));
        assert!(matches(&Condition::not_equals("completed"), &Value::from("active")));
        assert!(!matches(&Condition::not_equals("completed"), &Value::Null));
    }

    #[test]
    fn test_set_membership() {
        let in_set = Condition::in_set(["oracle", "dice"]);
        assert!(matches(&in_set, &Value::from("dice")));
        assert!(!matches(&in_set, &Value::from("manual")));
        assert!(!matches(&in_set, &Value::Null));

        let not_in = Condition::not_in_set(["oracle", "dice"]);
        assert!(matches(&not_in, &Value::from("manual")));
        assert!(!matches(&not_in, &Value::from("oracle")));
        assert!(!matches(&not_in, &Value::Null));
    }

    #[test]
    fn test_not_null() {
        assert!(matches(&Condition::not_null(), &Value::Int(0)));
        assert!(!matches(&Condition::not_null(), &Value::Null));
    }

    #[test]
    fn test_compile_uses_same_operators() {
        let field = Expr::column("c", "status");
        assert_eq!(
            to_sql(&compile(&Condition::greater_or_equal(3), field.clone())),
            r#"("c"."status" >= 3)"#
        );
        assert_eq!(
            to_sql(&compile(&Condition::not_in_set(["a"]), field.clone())),
            r#"("c"."status" NOT IN ('a'))"#
        );
        assert_eq!(
            to_sql(&compile(&Condition::not_null(), field)),
            r#"("c"."status" IS NOT NULL)"#
        );
    }
}
