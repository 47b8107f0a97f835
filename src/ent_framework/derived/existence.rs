// Existence properties: `has_{key}` is true when the owner has at least one related item

use serde::Serialize;
use std::slice;

use crate::ent_framework::derived::path::{join_chain, Hop};
use crate::ent_framework::ent_object::EntObject;
use crate::query::expr::{Expr, TableRef};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExistencePlan {
    pub hop: Hop,
}

impl ExistencePlan {
    pub fn new(hop: Hop) -> Self {
        Self { hop }
    }

    pub fn evaluate(&self, owner: &EntObject) -> bool {
        !owner.related(&self.hop.relationship).is_empty()
    }

    /// `EXISTS (SELECT 1 FROM child WHERE child.fk = owner.id)`
    pub fn compile(&self, owner: &TableRef, prefix: &str) -> Expr {
        Expr::exists(join_chain(owner, slice::from_ref(&self.hop), prefix))
    }
}
