//! # gatecheck
//!
//! Executable validation for Rust: constraints on method and constructor
//! parameters and results, enforced around each call.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gatecheck::prelude::*;
//!
//! let transfer = ExecutableId::method("Bank", "transfer").param("i64").returns("Receipt");
//! let registry = ConstraintRegistry::new().executable(
//!     transfer.clone(),
//!     ExecutableConstraints::new()
//!         .parameter(0, "amount", [Constraint::positive()])
//!         .return_value([Constraint::not_null()]),
//! );
//!
//! let bank = Validated::new(ValidationInterceptor::new(registry), Bank::default());
//! match bank.call(&transfer, Arguments::new().with(&-5)?, |b| b.transfer(-5)) {
//!     Err(InterceptError::ConstraintViolation(e)) => eprintln!("{}", e),
//!     other => println!("{:?}", other),
//! }
//! ```
//!
//! ## Features
//!
//! - **Exactly once**: the underlying call runs at most once, and only
//!   with valid arguments
//! - **Precise diagnostics**: every violation is located down to the
//!   parameter index or nested container element
//! - **Pluggable engines**: anything implementing `ExecutableValidator`
//!
//! ## Optional Features
//!
//! - `tracing` - structured log events for each validation phase (default)
//! - `testing` - `MockValidator` with expectations and call recording
//! - `full` - All optional features enabled

// Re-export core functionality
pub use gatecheck_core::*;

// Re-export the validation model
pub use gatecheck_validate::{
    BeanConstraints, Cascade, Constraint, ConstraintRegistry, ConstraintViolation,
    ContainerPosition, ElementKind, ExecutableConstraints, ExecutableId, ExecutableKind, PathNode,
    Pattern, PropertyPath, RuleError, ViolationSet,
};

#[cfg(feature = "testing")]
pub use gatecheck_testing as testing;

// Re-export commonly used external types
pub use serde;
pub use serde_json;

/// Prelude module - import everything you need with `use gatecheck::prelude::*`
pub mod prelude {
    pub use gatecheck_core::prelude::*;
    pub use gatecheck_core::{render_message, ConfigError, MalformedPathError, PathDefect};

    #[cfg(feature = "testing")]
    pub use gatecheck_testing::{violation, MockValidator, ValidationMatcher, ValidationPhase};

    pub use serde::{Deserialize, Serialize};
    pub use serde_json::json;
}
