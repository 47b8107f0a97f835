// Counting properties: `{key}_count`
//
// All four variants are the same walk. Direct and filtered counts take a single hop; cross-table
// counts follow a relationship path and count the items at its end, once per distinct path.
// Filters apply to those terminal items only.

use serde::Serialize;

use crate::ent_framework::derived::condition;
use crate::ent_framework::derived::config::FilterCondition;
use crate::ent_framework::derived::path::{join_chain, walk, Hop};
use crate::ent_framework::ent_object::EntObject;
use crate::query::expr::{Expr, TableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CountVariant {
    Direct,
    CrossTable,
    Filtered,
    FilteredCrossTable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountPlan {
    pub variant: CountVariant,
    pub hops: Vec<Hop>,
    pub filter: Option<FilterCondition>,
}

impl CountPlan {
    pub fn direct(hop: Hop) -> Self {
        Self {
            variant: CountVariant::Direct,
            hops: vec![hop],
            filter: None,
        }
    }

    pub fn cross_table(hops: Vec<Hop>) -> Self {
        Self {
            variant: CountVariant::CrossTable,
            hops,
            filter: None,
        }
    }

    pub fn filtered(hop: Hop, filter: FilterCondition) -> Self {
        Self {
            variant: CountVariant::Filtered,
            hops: vec![hop],
            filter: Some(filter),
        }
    }

    pub fn filtered_cross_table(hops: Vec<Hop>, filter: FilterCondition) -> Self {
        Self {
            variant: CountVariant::FilteredCrossTable,
            hops,
            filter: Some(filter),
        }
    }

    fn keeps(&self, item: &EntObject) -> bool {
        match &self.filter {
            Some(filter) => condition::item_matches(item, &filter.field, &filter.condition),
            None => true,
        }
    }

    pub fn evaluate(&self, owner: &EntObject) -> i64 {
        walk(owner, &self.hops)
            .into_iter()
            .filter(|item| self.keeps(item))
            .count() as i64
    }

    pub fn compile(&self, owner: &TableRef, prefix: &str) -> Expr {
        let mut select = join_chain(owner, &self.hops, prefix);
        if let (Some(filter), Some(terminal)) = (&self.filter, select.terminal().cloned()) {
            select = select.filter(condition::compile(
                &filter.condition,
                terminal.column(&filter.field),
            ));
        }
        Expr::count(select)
    }
}
