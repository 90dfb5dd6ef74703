//! Error types for intercepted invocations.

use crate::leaf::leaf_node;
use crate::render::MalformedPathError;
use gatecheck_validate::{ElementKind, ExecutableId, ViolationSet};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Which side of the underlying call produced the violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Arguments were rejected; the call never ran
    Parameters,
    /// The result was rejected; the call already ran
    ReturnValue,
}

impl Phase {
    /// Whether the underlying call (and its side effects) already happened.
    pub fn call_executed(&self) -> bool {
        matches!(self, Phase::ReturnValue)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Parameters => "parameters",
            Phase::ReturnValue => "return value",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated failure raised when an invocation violates constraints.
///
/// The message is the full diagnostic text; the violations stay attached
/// for programmatic inspection.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ConstraintViolationError {
    message: String,
    violations: ViolationSet,
    phase: Phase,
    executable: ExecutableId,
}

impl ConstraintViolationError {
    pub fn new(
        message: impl Into<String>,
        violations: ViolationSet,
        phase: Phase,
        executable: ExecutableId,
    ) -> Self {
        Self {
            message: message.into(),
            violations,
            phase,
            executable,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn violations(&self) -> &ViolationSet {
        &self.violations
    }

    pub fn into_violations(self) -> ViolationSet {
        self.violations
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn executable(&self) -> &ExecutableId {
        &self.executable
    }

    /// Structured form of this error for logs and API responses.
    pub fn to_report(&self) -> ViolationReport {
        let violations = self
            .violations
            .iter()
            .map(|violation| {
                let leaf = leaf_node(&violation.property_path);
                ReportedViolation {
                    kind: leaf.map(|node| node.kind()),
                    parameter_index: leaf.and_then(|node| node.parameter_index()),
                    path: violation.property_path.to_string(),
                    message: violation.message.clone(),
                    constraint: violation.constraint.to_string(),
                    invalid_value: violation.invalid_value.clone(),
                }
            })
            .collect();

        ViolationReport {
            error: ReportBody {
                error_type: "constraint_violation".to_string(),
                message: format!(
                    "{} constraint violation(s) in {}",
                    self.violations.len(),
                    self.phase
                ),
                executable: self.executable.to_string(),
                phase: self.phase,
                violations,
            },
        }
    }
}

/// Serializable report of a [`ConstraintViolationError`].
#[derive(Debug, Clone, Serialize)]
pub struct ViolationReport {
    pub error: ReportBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub executable: String,
    pub phase: Phase,
    pub violations: Vec<ReportedViolation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportedViolation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_index: Option<usize>,
    pub path: String,
    pub message: String,
    pub constraint: String,
    pub invalid_value: Value,
}

/// Failure of an intercepted invocation.
///
/// `E` is the error type of the underlying call, which is passed through
/// untouched as [`InterceptError::Invocation`].
#[derive(Debug)]
pub enum InterceptError<E> {
    /// Arguments or result violated constraints
    ConstraintViolation(ConstraintViolationError),
    /// The underlying call failed on its own
    Invocation(E),
    /// The engine reported a violation without a location
    MalformedViolation {
        executable: ExecutableId,
        phase: Phase,
        source: MalformedPathError,
    },
    /// A target, result or instance could not be snapshotted for validation
    Capture {
        executable: ExecutableId,
        subject: &'static str,
        source: serde_json::Error,
    },
}

impl<E> InterceptError<E> {
    pub fn is_violation(&self) -> bool {
        matches!(self, InterceptError::ConstraintViolation(_))
    }

    pub fn violation(&self) -> Option<&ConstraintViolationError> {
        match self {
            InterceptError::ConstraintViolation(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_violation(self) -> Option<ConstraintViolationError> {
        match self {
            InterceptError::ConstraintViolation(e) => Some(e),
            _ => None,
        }
    }

    /// The underlying call's own error, if that is what failed.
    pub fn into_invocation(self) -> Option<E> {
        match self {
            InterceptError::Invocation(e) => Some(e),
            _ => None,
        }
    }

    pub fn map_invocation<E2>(self, f: impl FnOnce(E) -> E2) -> InterceptError<E2> {
        match self {
            InterceptError::ConstraintViolation(e) => InterceptError::ConstraintViolation(e),
            InterceptError::Invocation(e) => InterceptError::Invocation(f(e)),
            InterceptError::MalformedViolation {
                executable,
                phase,
                source,
            } => InterceptError::MalformedViolation {
                executable,
                phase,
                source,
            },
            InterceptError::Capture {
                executable,
                subject,
                source,
            } => InterceptError::Capture {
                executable,
                subject,
                source,
            },
        }
    }
}

impl<E> From<ConstraintViolationError> for InterceptError<E> {
    fn from(err: ConstraintViolationError) -> Self {
        InterceptError::ConstraintViolation(err)
    }
}

impl<E: fmt::Display> fmt::Display for InterceptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptError::ConstraintViolation(e) => fmt::Display::fmt(e, f),
            InterceptError::Invocation(e) => fmt::Display::fmt(e, f),
            InterceptError::MalformedViolation {
                executable,
                phase,
                source,
            } => write!(
                f,
                "malformed violation during {} validation of {}: {}",
                phase, executable, source
            ),
            InterceptError::Capture {
                executable,
                subject,
                source,
            } => write!(f, "failed to capture {} of {}: {}", subject, executable, source),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for InterceptError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InterceptError::ConstraintViolation(_) => None,
            InterceptError::Invocation(e) => e.source(),
            InterceptError::MalformedViolation { source, .. } => Some(source),
            InterceptError::Capture { source, .. } => Some(source),
        }
    }
}
