//! # gatecheck validation model
//!
//! Types shared between validation engines and the interception layer:
//! violation paths, violations, callable identities, and the
//! [`ExecutableValidator`] facade an interceptor calls around each
//! method or constructor invocation.
//!
//! A table-driven reference engine, [`ConstraintRegistry`], validates
//! `serde_json::Value` snapshots against registered [`Constraint`]s.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gatecheck_validate::prelude::*;
//! use serde_json::json;
//!
//! let transfer = ExecutableId::method("Bank", "transfer").param("i64");
//! let registry = ConstraintRegistry::new().executable(
//!     transfer.clone(),
//!     ExecutableConstraints::new().parameter(0, "amount", [Constraint::positive()]),
//! );
//!
//! let violations = registry.validate_parameters(&json!({}), &transfer, &[json!(-5)]);
//! for violation in &violations {
//!     println!("{}: {}", violation.property_path, violation.message);
//! }
//! ```

mod constraint;
mod engine;
mod executable;
mod path;
mod registry;
mod violation;

pub use constraint::{Constraint, Pattern, RuleError};
pub use engine::ExecutableValidator;
pub use executable::{ExecutableId, ExecutableKind};
pub use path::{ContainerPosition, ElementKind, PathNode, PropertyPath};
pub use registry::{BeanConstraints, Cascade, ConstraintRegistry, ExecutableConstraints};
pub use violation::{ConstraintViolation, ViolationSet};

/// Prelude module for validation
pub mod prelude {
    pub use crate::constraint::{Constraint, RuleError};
    pub use crate::engine::ExecutableValidator;
    pub use crate::executable::{ExecutableId, ExecutableKind};
    pub use crate::path::{ContainerPosition, ElementKind, PathNode, PropertyPath};
    pub use crate::registry::{BeanConstraints, Cascade, ConstraintRegistry, ExecutableConstraints};
    pub use crate::violation::{ConstraintViolation, ViolationSet};
    pub use serde_json::Value;
}
