//! The validation engine facade consumed by interceptors.

use crate::executable::ExecutableId;
use crate::violation::ViolationSet;
use serde_json::Value;
use std::sync::Arc;

/// Validates the parameters and results of methods and constructors.
///
/// Implementations are shared between concurrent calls, so each call must
/// build its own [`ViolationSet`] and keep no per-call state on `self`.
///
/// Values are `serde_json::Value` snapshots of the real arguments, results
/// and targets.
///
/// ## Example
///
/// ```rust,ignore
/// use gatecheck_validate::prelude::*;
///
/// struct AcceptAll;
///
/// impl ExecutableValidator for AcceptAll {
///     fn validate_parameters(&self, _: &Value, _: &ExecutableId, _: &[Value]) -> ViolationSet {
///         ViolationSet::new()
///     }
///     // ...
/// }
/// ```
pub trait ExecutableValidator: Send + Sync {
    /// Validate the arguments of a method call on `target`.
    fn validate_parameters(
        &self,
        target: &Value,
        method: &ExecutableId,
        arguments: &[Value],
    ) -> ViolationSet;

    /// Validate the value returned by a method call on `target`.
    fn validate_return_value(
        &self,
        target: &Value,
        method: &ExecutableId,
        return_value: &Value,
    ) -> ViolationSet;

    /// Validate the arguments of a constructor call.
    fn validate_constructor_parameters(
        &self,
        constructor: &ExecutableId,
        arguments: &[Value],
    ) -> ViolationSet;

    /// Validate a freshly constructed instance.
    fn validate_constructor_return_value(
        &self,
        constructor: &ExecutableId,
        instance: &Value,
    ) -> ViolationSet;
}

impl<V: ExecutableValidator + ?Sized> ExecutableValidator for Arc<V> {
    fn validate_parameters(
        &self,
        target: &Value,
        method: &ExecutableId,
        arguments: &[Value],
    ) -> ViolationSet {
        (**self).validate_parameters(target, method, arguments)
    }

    fn validate_return_value(
        &self,
        target: &Value,
        method: &ExecutableId,
        return_value: &Value,
    ) -> ViolationSet {
        (**self).validate_return_value(target, method, return_value)
    }

    fn validate_constructor_parameters(
        &self,
        constructor: &ExecutableId,
        arguments: &[Value],
    ) -> ViolationSet {
        (**self).validate_constructor_parameters(constructor, arguments)
    }

    fn validate_constructor_return_value(
        &self,
        constructor: &ExecutableId,
        instance: &Value,
    ) -> ViolationSet {
        (**self).validate_constructor_return_value(constructor, instance)
    }
}
