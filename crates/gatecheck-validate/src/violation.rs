//! Constraint violations and violation sets.

use crate::constraint::{Constraint, RuleError};
use crate::path::{PathNode, PropertyPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Evidence that one value failed one constraint at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// Interpolated, human-readable message
    pub message: String,
    /// Message before interpolation
    pub message_template: String,
    /// Location of the violating element
    pub property_path: PropertyPath,
    /// The validated root object; absent when validating constructor parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_bean: Option<Value>,
    /// The value that failed the constraint
    pub invalid_value: Value,
    /// The violated constraint
    pub constraint: Constraint,
}

impl ConstraintViolation {
    /// Build a violation from a failed rule check.
    pub fn from_rule_error(
        error: &RuleError,
        constraint: &Constraint,
        property_path: PropertyPath,
        root_bean: Option<Value>,
        invalid_value: Value,
    ) -> Self {
        Self {
            message: error.interpolate_message(),
            message_template: error.message.clone(),
            property_path,
            root_bean,
            invalid_value,
            constraint: constraint.clone(),
        }
    }

    /// The last node of the path, if any.
    pub fn leaf(&self) -> Option<&PathNode> {
        self.property_path.iter().last()
    }
}

/// The violations produced by one validation call.
///
/// Violations are unique by value: inserting an equal violation a second
/// time is a no-op. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationSet {
    violations: Vec<ConstraintViolation>,
}

impl ViolationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a violation. Returns `false` if an equal one was already present.
    pub fn insert(&mut self, violation: ConstraintViolation) -> bool {
        if self.violations.contains(&violation) {
            return false;
        }
        self.violations.push(violation);
        true
    }

    /// Move all violations of `other` into this set.
    pub fn merge(&mut self, other: ViolationSet) {
        for violation in other {
            self.insert(violation);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ConstraintViolation> {
        self.violations.iter()
    }

    /// Convert to Result - Ok if no violations, Err otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ViolationSet {
    type Item = ConstraintViolation;
    type IntoIter = std::vec::IntoIter<ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a ConstraintViolation;
    type IntoIter = std::slice::Iter<'a, ConstraintViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl FromIterator<ConstraintViolation> for ViolationSet {
    fn from_iter<I: IntoIterator<Item = ConstraintViolation>>(iter: I) -> Self {
        let mut set = ViolationSet::new();
        for violation in iter {
            set.insert(violation);
        }
        set
    }
}

impl Extend<ConstraintViolation> for ViolationSet {
    fn extend<I: IntoIterator<Item = ConstraintViolation>>(&mut self, iter: I) {
        for violation in iter {
            self.insert(violation);
        }
    }
}
