//! Builders for canned violations.

use gatecheck_validate::{Constraint, ConstraintViolation, PathNode, PropertyPath};
use serde_json::Value;

/// Start building a violation of `constraint`.
///
/// ```rust,ignore
/// let v = violation(Constraint::positive())
///     .at([PathNode::method("transfer"), PathNode::parameter("amount", 0)])
///     .value(json!(-5))
///     .build();
/// ```
pub fn violation(constraint: Constraint) -> ViolationBuilder {
    ViolationBuilder {
        constraint,
        message: None,
        property_path: PropertyPath::new(),
        root_bean: None,
        invalid_value: Value::Null,
    }
}

#[derive(Debug, Clone)]
pub struct ViolationBuilder {
    constraint: Constraint,
    message: Option<String>,
    property_path: PropertyPath,
    root_bean: Option<Value>,
    invalid_value: Value,
}

impl ViolationBuilder {
    /// Replace the path with these nodes, root first.
    pub fn at(mut self, nodes: impl IntoIterator<Item = PathNode>) -> Self {
        self.property_path = nodes.into_iter().collect();
        self
    }

    pub fn path(mut self, path: PropertyPath) -> Self {
        self.property_path = path;
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn root(mut self, root: Value) -> Self {
        self.root_bean = Some(root);
        self
    }

    pub fn value(mut self, value: Value) -> Self {
        self.invalid_value = value;
        self
    }

    /// Finish the violation. Without an explicit message, the constraint's
    /// own message for the invalid value is used, falling back to its code.
    pub fn build(self) -> ConstraintViolation {
        let (message, message_template) = match self.message {
            Some(message) => (message.clone(), message),
            None => match self.constraint.check(&self.invalid_value) {
                Err(error) => (error.interpolate_message(), error.message),
                Ok(()) => {
                    let code = self.constraint.code().to_string();
                    (code.clone(), code)
                }
            },
        };

        ConstraintViolation {
            message,
            message_template,
            property_path: self.property_path,
            root_bean: self.root_bean,
            invalid_value: self.invalid_value,
            constraint: self.constraint,
        }
    }
}

impl From<ViolationBuilder> for ConstraintViolation {
    fn from(builder: ViolationBuilder) -> Self {
        builder.build()
    }
}
