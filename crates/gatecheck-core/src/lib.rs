//! # gatecheck core
//!
//! Enforces executable constraints at invocation boundaries. A
//! [`ValidationInterceptor`] validates the arguments of a method or
//! constructor call before it runs, lets the call proceed exactly once,
//! and validates the returned value or constructed instance afterwards.
//! Violations from either phase surface as a single
//! [`ConstraintViolationError`] with a diagnostic message that locates
//! every violating element.
//!
//! The interceptor decides *when* validation runs and *how* failures are
//! reported; *what* is valid is up to the [`ExecutableValidator`] it is
//! given.

#[macro_use]
mod tracing_macros;

pub mod config;
mod context;
mod error;
mod interceptor;
mod leaf;
mod proxy;
mod render;

// Public API
pub use config::{ConfigError, ExecutableType, InterceptorConfig};
pub use context::{Arguments, ConstructorInvocation, MethodInvocation};
pub use error::{
    ConstraintViolationError, InterceptError, Phase, ReportBody, ReportedViolation,
    ViolationReport,
};
pub use gatecheck_validate::ExecutableValidator;
pub use interceptor::{ValidationInterceptor, Verdict};
pub use leaf::{leaf_kind, leaf_node};
pub use proxy::Validated;
pub use render::{render_message, MalformedPathError, PathDefect};

/// Prelude module for interception
pub mod prelude {
    pub use crate::config::{ExecutableType, InterceptorConfig};
    pub use crate::context::{Arguments, ConstructorInvocation, MethodInvocation};
    pub use crate::error::{ConstraintViolationError, InterceptError, Phase};
    pub use crate::interceptor::{ValidationInterceptor, Verdict};
    pub use crate::proxy::Validated;
    pub use gatecheck_validate::prelude::*;
}
