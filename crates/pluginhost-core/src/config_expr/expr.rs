use std::rc::Rc;

use crate::resource::{ComparatorRegistry, ResourceId};

use super::ConfigExprError;

/// A relational operator between a resource's actual version and a required one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl RelOp {
    fn matches(self, cmp: i32) -> bool {
        match self {
            RelOp::Lt => cmp < 0,
            RelOp::Le => cmp <= 0,
            RelOp::Eq => cmp == 0,
            RelOp::Ne => cmp != 0,
            RelOp::Ge => cmp >= 0,
            RelOp::Gt => cmp > 0,
        }
    }
}

#[derive(Debug)]
enum Node {
    Exists(ResourceId),
    Rel(ResourceId, RelOp, String),
    Not(ConfigurationExpr),
    And(ConfigurationExpr, ConfigurationExpr),
    Or(ConfigurationExpr, ConfigurationExpr),
    Comma(ConfigurationExpr, ConfigurationExpr),
}

/// An immutable, cheaply-cloned configuration expression tree.
#[derive(Debug, Clone)]
pub struct ConfigurationExpr(Rc<Node>);

impl ConfigurationExpr {
    pub fn exists(resource: ResourceId) -> Self {
        Self(Rc::new(Node::Exists(resource)))
    }

    pub fn rel(resource: ResourceId, op: RelOp, version: impl Into<String>) -> Self {
        Self(Rc::new(Node::Rel(resource, op, version.into())))
    }

    pub fn not(&self) -> Self {
        Self(Rc::new(Node::Not(self.clone())))
    }

    pub fn and(&self, other: Self) -> Self {
        Self(Rc::new(Node::And(self.clone(), other)))
    }

    pub fn or(&self, other: Self) -> Self {
        Self(Rc::new(Node::Or(self.clone(), other)))
    }

    pub fn comma(&self, other: Self) -> Self {
        Self(Rc::new(Node::Comma(self.clone(), other)))
    }

    /// Evaluates `required` (`self` acting as `required`'s argument is
    /// reversed below — `self` is the *provided* side) against this
    /// provided configuration.
    pub fn satisfies(&self, required: &Self, registry: &ComparatorRegistry) -> Result<bool, ConfigExprError> {
        match &*required.0 {
            Node::Not(x) => Ok(!self.satisfies(x, registry)?),
            Node::And(l, r) => Ok(self.satisfies(l, registry)? && self.satisfies(r, registry)?),
            Node::Comma(l, r) => Ok(self.satisfies(l, registry)? && self.satisfies(r, registry)?),
            Node::Or(l, r) => Ok(self.satisfies(l, registry)? || self.satisfies(r, registry)?),
            Node::Exists(resource) => self.provided_has(*resource),
            Node::Rel(resource, op, version) => self.provided_rel(*resource, *op, version, registry),
        }
    }

    fn provided_has(&self, target: ResourceId) -> Result<bool, ConfigExprError> {
        match &*self.0 {
            Node::Comma(l, r) => Ok(l.provided_has(target)? || r.provided_has(target)?),
            Node::Exists(r) => Ok(*r == target),
            Node::Rel(r, RelOp::Eq, _) => Ok(*r == target),
            other => Err(ConfigExprError::MalformedProvided(format!("{:?}", other))),
        }
    }

    fn provided_rel(
        &self,
        target: ResourceId,
        op: RelOp,
        required_version: &str,
        registry: &ComparatorRegistry,
    ) -> Result<bool, ConfigExprError> {
        match &*self.0 {
            Node::Comma(l, r) => Ok(l.provided_rel(target, op, required_version, registry)?
                || r.provided_rel(target, op, required_version, registry)?),
            Node::Exists(r) if *r == target => Ok(false),
            Node::Exists(_) => Ok(false),
            Node::Rel(r, RelOp::Eq, v) if *r == target => {
                let cmp = registry.compare(target, v, required_version)?;
                Ok(op.matches(cmp))
            }
            Node::Rel(_, RelOp::Eq, _) => Ok(false),
            other => Err(ConfigExprError::MalformedProvided(format!("{:?}", other))),
        }
    }
}
