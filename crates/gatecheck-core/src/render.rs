//! Diagnostic text for constraint violation failures.

use crate::context::Arguments;
use crate::leaf::leaf_node;
use gatecheck_validate::{ElementKind, PathNode, ViolationSet};
use std::fmt::{Display, Write};

/// A violation whose property path cannot be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("constraint violation ({ordinal}) {defect}")]
pub struct MalformedPathError {
    /// 1-based position of the offending violation
    pub ordinal: usize,
    pub defect: PathDefect,
}

/// What is wrong with a violation's property path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathDefect {
    #[error("has an empty property path")]
    Empty,
    #[error("has a PARAMETER leaf without a parameter index")]
    MissingParameterIndex,
}

struct Leaf {
    kind: ElementKind,
    parameter_index: Option<usize>,
}

fn check_leaf(node: Option<&PathNode>) -> Result<Leaf, PathDefect> {
    let node = node.ok_or(PathDefect::Empty)?;
    let parameter_index = match node.kind() {
        ElementKind::Parameter => Some(
            node.parameter_index()
                .ok_or(PathDefect::MissingParameterIndex)?,
        ),
        _ => None,
    };
    Ok(Leaf {
        kind: node.kind(),
        parameter_index,
    })
}

/// Render the diagnostic message for `violations` raised around a call to
/// `executable` with `arguments`.
///
/// Violations are listed in the set's iteration order with 1-based
/// ordinals:
///
/// ```text
/// 1 constraint violation(s) occurred during method invocation.
/// Method: Bank::transfer(i64) -> Receipt
/// Argument values: [-5]
/// Constraint violations:
///  (1) Kind: PARAMETER
///  parameter index: 0
///  message: must be greater than 0
///  root bean: {"id":7}
///  property path: transfer.amount
///  constraint: #[validate(positive)]
/// ```
///
/// Nothing is rendered if any violation lacks a leaf node, or has a
/// `PARAMETER` leaf without a parameter index.
pub fn render_message(
    executable: &impl Display,
    arguments: &Arguments,
    violations: &ViolationSet,
) -> Result<String, MalformedPathError> {
    let leaves = violations
        .iter()
        .enumerate()
        .map(|(i, violation)| {
            check_leaf(leaf_node(&violation.property_path)).map_err(|defect| MalformedPathError {
                ordinal: i + 1,
                defect,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut message = String::new();
    // Writing into a String cannot fail
    let _ = write!(
        message,
        "{} constraint violation(s) occurred during method invocation.\n\
         Method: {}\n\
         Argument values: {}\n\
         Constraint violations:",
        violations.len(),
        executable,
        arguments
    );

    for (i, (violation, leaf)) in violations.iter().zip(leaves).enumerate() {
        let _ = write!(message, "\n ({}) Kind: {}", i + 1, leaf.kind);
        if let Some(index) = leaf.parameter_index {
            let _ = write!(message, "\n parameter index: {}", index);
        }
        let _ = write!(message, "\n message: {}\n root bean: ", violation.message);
        match &violation.root_bean {
            Some(root) => {
                let _ = write!(message, "{}", root);
            }
            None => message.push_str("null"),
        }
        let _ = write!(
            message,
            "\n property path: {}\n constraint: {}",
            violation.property_path, violation.constraint
        );
    }

    Ok(message)
}
