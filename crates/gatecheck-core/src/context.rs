//! Invocation contexts handed to the interceptor.
//!
//! A context carries snapshots of everything the validation engine needs
//! (target, executable identity, arguments) together with the continuation
//! that performs the real call. The continuation is an `FnOnce`, and
//! running it consumes the context, so it can execute at most once.

use gatecheck_validate::ExecutableId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Snapshots of the arguments of an intercepted call, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot of `value`.
    pub fn with<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.0.push(serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn push(&mut self, value: Value) {
        self.0.push(value);
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Arguments {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Renders as a list literal, e.g. `[-5, "EUR"]`.
impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str("]")
    }
}

/// An intercepted method call.
pub struct MethodInvocation<F> {
    target: Value,
    method: ExecutableId,
    arguments: Arguments,
    proceed: F,
}

impl<F> MethodInvocation<F> {
    pub fn new(target: Value, method: ExecutableId, arguments: Arguments, proceed: F) -> Self {
        Self {
            target,
            method,
            arguments,
            proceed,
        }
    }

    /// Build an invocation, snapshotting `target` first.
    pub fn capture<S: Serialize + ?Sized>(
        target: &S,
        method: ExecutableId,
        arguments: Arguments,
        proceed: F,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            serde_json::to_value(target)?,
            method,
            arguments,
            proceed,
        ))
    }

    pub fn target(&self) -> &Value {
        &self.target
    }

    pub fn method(&self) -> &ExecutableId {
        &self.method
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Run the underlying call, bypassing validation.
    pub fn proceed<R, E>(self) -> Result<R, E>
    where
        F: FnOnce() -> Result<R, E>,
    {
        (self.proceed)()
    }

    pub(crate) fn into_parts(self) -> (Value, ExecutableId, Arguments, F) {
        (self.target, self.method, self.arguments, self.proceed)
    }
}

impl<F> fmt::Debug for MethodInvocation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInvocation")
            .field("target", &self.target)
            .field("method", &self.method)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// An intercepted constructor call. There is no target yet.
pub struct ConstructorInvocation<F> {
    constructor: ExecutableId,
    arguments: Arguments,
    proceed: F,
}

impl<F> ConstructorInvocation<F> {
    pub fn new(constructor: ExecutableId, arguments: Arguments, proceed: F) -> Self {
        Self {
            constructor,
            arguments,
            proceed,
        }
    }

    pub fn constructor(&self) -> &ExecutableId {
        &self.constructor
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Run the constructor, bypassing validation.
    pub fn proceed<T, E>(self) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        (self.proceed)()
    }

    pub(crate) fn into_parts(self) -> (ExecutableId, Arguments, F) {
        (self.constructor, self.arguments, self.proceed)
    }
}

impl<F> fmt::Debug for ConstructorInvocation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInvocation")
            .field("constructor", &self.constructor)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}
