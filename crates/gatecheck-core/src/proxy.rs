//! A service wrapper that routes calls through a [`ValidationInterceptor`].

use crate::context::{Arguments, ConstructorInvocation, MethodInvocation};
use crate::error::InterceptError;
use crate::interceptor::ValidationInterceptor;
use gatecheck_validate::ExecutableId;
use serde::Serialize;

/// A service whose construction and method calls are validated.
///
/// The service is snapshotted as the target before every call, so its
/// current state is visible to class-level and property constraints.
///
/// ```rust,ignore
/// let bank = Validated::construct(
///     interceptor,
///     ExecutableId::constructor("Bank").param("String"),
///     Arguments::new().with("main")?,
///     || Ok::<_, BankError>(Bank::open("main")),
/// )?;
///
/// let receipt = bank.call(&transfer, Arguments::new().with(&amount)?, |bank| {
///     bank.transfer(amount)
/// })?;
/// ```
#[derive(Debug, Clone)]
pub struct Validated<S> {
    inner: S,
    interceptor: ValidationInterceptor,
}

impl<S: Serialize> Validated<S> {
    /// Wrap an already constructed service.
    pub fn new(interceptor: ValidationInterceptor, inner: S) -> Self {
        Self { inner, interceptor }
    }

    /// Construct the service through the interceptor.
    pub fn construct<F, E>(
        interceptor: ValidationInterceptor,
        constructor: ExecutableId,
        arguments: Arguments,
        build: F,
    ) -> Result<Self, InterceptError<E>>
    where
        F: FnOnce() -> Result<S, E>,
    {
        let invocation = ConstructorInvocation::new(constructor, arguments, build);
        let inner = interceptor.around_construct(invocation)?;
        Ok(Self { inner, interceptor })
    }

    /// Call a method that only reads the service.
    pub fn call<F, R, E>(
        &self,
        method: &ExecutableId,
        arguments: Arguments,
        op: F,
    ) -> Result<R, InterceptError<E>>
    where
        F: FnOnce(&S) -> Result<R, E>,
        R: Serialize,
    {
        let inner = &self.inner;
        let invocation = self.snapshot(method, arguments, move || op(inner))?;
        self.interceptor.around_invoke(invocation)
    }

    /// Call a method that mutates the service.
    pub fn call_mut<F, R, E>(
        &mut self,
        method: &ExecutableId,
        arguments: Arguments,
        op: F,
    ) -> Result<R, InterceptError<E>>
    where
        F: FnOnce(&mut S) -> Result<R, E>,
        R: Serialize,
    {
        let target = capture_target(method, &self.inner)?;
        let inner = &mut self.inner;
        let invocation =
            MethodInvocation::new(target, method.clone(), arguments, move || op(inner));
        self.interceptor.around_invoke(invocation)
    }

    fn snapshot<F, E>(
        &self,
        method: &ExecutableId,
        arguments: Arguments,
        proceed: F,
    ) -> Result<MethodInvocation<F>, InterceptError<E>> {
        let target = capture_target(method, &self.inner)?;
        Ok(MethodInvocation::new(target, method.clone(), arguments, proceed))
    }
}

impl<S> Validated<S> {
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    pub fn interceptor(&self) -> &ValidationInterceptor {
        &self.interceptor
    }
}

fn capture_target<S: Serialize, E>(
    method: &ExecutableId,
    inner: &S,
) -> Result<serde_json::Value, InterceptError<E>> {
    serde_json::to_value(inner).map_err(|source| InterceptError::Capture {
        executable: method.clone(),
        subject: "target",
        source,
    })
}
