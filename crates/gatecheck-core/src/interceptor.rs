//! Validation around method and constructor invocations.
//!
//! # Execution Order
//!
//! For a covered executable the interceptor runs:
//!
//! 1. parameter validation (the call is aborted on violations),
//! 2. the underlying call, exactly once,
//! 3. return value validation (the call has already happened).
//!
//! Failures of the underlying call are passed through untouched and skip
//! step 3.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatecheck_core::prelude::*;
//!
//! let interceptor = ValidationInterceptor::new(registry);
//! let invocation = MethodInvocation::capture(
//!     &bank,
//!     ExecutableId::method("Bank", "transfer").param("i64").returns("Receipt"),
//!     Arguments::new().with(&amount)?,
//!     || bank.transfer(amount),
//! )?;
//!
//! match interceptor.around_invoke(invocation) {
//!     Ok(receipt) => println!("{:?}", receipt),
//!     Err(InterceptError::ConstraintViolation(e)) => eprintln!("{}", e),
//!     Err(other) => return Err(other.into()),
//! }
//! ```

use crate::config::InterceptorConfig;
use crate::context::{Arguments, ConstructorInvocation, MethodInvocation};
use crate::error::{ConstraintViolationError, InterceptError, Phase};
use crate::render::render_message;
use gatecheck_validate::{ExecutableId, ExecutableValidator, ViolationSet};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Outcome of one validation phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Passed,
    Violated(ViolationSet),
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    /// The violations, if the phase failed.
    pub fn into_violations(self) -> Option<ViolationSet> {
        match self {
            Verdict::Passed => None,
            Verdict::Violated(violations) => Some(violations),
        }
    }
}

impl From<ViolationSet> for Verdict {
    fn from(violations: ViolationSet) -> Self {
        if violations.is_empty() {
            Verdict::Passed
        } else {
            Verdict::Violated(violations)
        }
    }
}

/// Validates parameters before and results after an intercepted call.
///
/// Cloning is cheap; clones share the validation engine. The interceptor
/// keeps no per-call state, so one instance can serve concurrent calls.
#[derive(Clone)]
pub struct ValidationInterceptor {
    validator: Arc<dyn ExecutableValidator>,
    config: Arc<InterceptorConfig>,
}

impl ValidationInterceptor {
    /// Position in an interceptor chain. Runs after application-level
    /// interceptors (lower values run first).
    pub const PRIORITY: i32 = 3090;

    pub fn new(validator: impl ExecutableValidator + 'static) -> Self {
        Self::from_arc(Arc::new(validator))
    }

    /// Use an engine that is already shared elsewhere.
    pub fn from_arc(validator: Arc<dyn ExecutableValidator>) -> Self {
        Self {
            validator,
            config: Arc::new(InterceptorConfig::default()),
        }
    }

    pub fn with_config(mut self, config: InterceptorConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    pub fn validator(&self) -> &Arc<dyn ExecutableValidator> {
        &self.validator
    }

    pub fn verdict_for_parameters(
        &self,
        target: &Value,
        method: &ExecutableId,
        arguments: &Arguments,
    ) -> Verdict {
        self.validator
            .validate_parameters(target, method, arguments.as_slice())
            .into()
    }

    pub fn verdict_for_return_value(
        &self,
        target: &Value,
        method: &ExecutableId,
        return_value: &Value,
    ) -> Verdict {
        self.validator
            .validate_return_value(target, method, return_value)
            .into()
    }

    pub fn verdict_for_constructor_parameters(
        &self,
        constructor: &ExecutableId,
        arguments: &Arguments,
    ) -> Verdict {
        self.validator
            .validate_constructor_parameters(constructor, arguments.as_slice())
            .into()
    }

    pub fn verdict_for_constructed(&self, constructor: &ExecutableId, instance: &Value) -> Verdict {
        self.validator
            .validate_constructor_return_value(constructor, instance)
            .into()
    }

    /// Run a method invocation with parameter and return value validation.
    ///
    /// # Errors
    ///
    /// - [`InterceptError::ConstraintViolation`] with phase
    ///   [`Phase::Parameters`] if the arguments are invalid; the call is not
    ///   made.
    /// - [`InterceptError::Invocation`] with the call's own error.
    /// - [`InterceptError::ConstraintViolation`] with phase
    ///   [`Phase::ReturnValue`] if the result is invalid; the call was made.
    pub fn around_invoke<F, R, E>(
        &self,
        invocation: MethodInvocation<F>,
    ) -> Result<R, InterceptError<E>>
    where
        F: FnOnce() -> Result<R, E>,
        R: Serialize,
    {
        let (target, method, arguments, proceed) = invocation.into_parts();

        if !self.config.covers(&method) {
            log_debug!(executable = %method, "executable not covered, skipping validation");
            return proceed().map_err(InterceptError::Invocation);
        }

        if self.config.validate_parameters {
            log_debug!(executable = %method, phase = %Phase::Parameters, "validating");
            if let Verdict::Violated(violations) =
                self.verdict_for_parameters(&target, &method, &arguments)
            {
                return Err(reject(method, &arguments, violations, Phase::Parameters));
            }
        }

        let result = proceed().map_err(InterceptError::Invocation)?;

        if self.config.validate_return_values {
            log_debug!(executable = %method, phase = %Phase::ReturnValue, "validating");
            let snapshot = capture(&method, "result", &result)?;
            if let Verdict::Violated(violations) =
                self.verdict_for_return_value(&target, &method, &snapshot)
            {
                return Err(reject(method, &arguments, violations, Phase::ReturnValue));
            }
        }

        Ok(result)
    }

    /// Run a constructor invocation with parameter and instance validation.
    ///
    /// Errors mirror [`around_invoke`](Self::around_invoke); an instance
    /// that fails validation is dropped and never returned.
    pub fn around_construct<F, T, E>(
        &self,
        invocation: ConstructorInvocation<F>,
    ) -> Result<T, InterceptError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        T: Serialize,
    {
        let (constructor, arguments, proceed) = invocation.into_parts();

        if !self.config.covers(&constructor) {
            log_debug!(executable = %constructor, "executable not covered, skipping validation");
            return proceed().map_err(InterceptError::Invocation);
        }

        if self.config.validate_parameters {
            log_debug!(executable = %constructor, phase = %Phase::Parameters, "validating");
            if let Verdict::Violated(violations) =
                self.verdict_for_constructor_parameters(&constructor, &arguments)
            {
                return Err(reject(constructor, &arguments, violations, Phase::Parameters));
            }
        }

        let instance = proceed().map_err(InterceptError::Invocation)?;

        if self.config.validate_return_values {
            log_debug!(executable = %constructor, phase = %Phase::ReturnValue, "validating");
            let snapshot = capture(&constructor, "instance", &instance)?;
            if let Verdict::Violated(violations) =
                self.verdict_for_constructed(&constructor, &snapshot)
            {
                return Err(reject(constructor, &arguments, violations, Phase::ReturnValue));
            }
        }

        Ok(instance)
    }
}

impl fmt::Debug for ValidationInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationInterceptor")
            .field("priority", &Self::PRIORITY)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn capture<T: Serialize, E>(
    executable: &ExecutableId,
    subject: &'static str,
    value: &T,
) -> Result<Value, InterceptError<E>> {
    serde_json::to_value(value).map_err(|source| InterceptError::Capture {
        executable: executable.clone(),
        subject,
        source,
    })
}

fn reject<E>(
    executable: ExecutableId,
    arguments: &Arguments,
    violations: ViolationSet,
    phase: Phase,
) -> InterceptError<E> {
    match render_message(&executable, arguments, &violations) {
        Ok(message) => {
            log_warn!(
                executable = %executable,
                phase = %phase,
                count = violations.len(),
                "constraint violations"
            );
            ConstraintViolationError::new(message, violations, phase, executable).into()
        }
        Err(source) => {
            log_error!(
                executable = %executable,
                phase = %phase,
                call_executed = phase.call_executed(),
                ordinal = source.ordinal,
                defect = %source.defect,
                "engine reported a violation with a malformed property path"
            );
            InterceptError::MalformedViolation {
                executable,
                phase,
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutableType;
    use crate::render::PathDefect;
    use gatecheck_validate::{
        BeanConstraints, Constraint, ConstraintRegistry, ConstraintViolation, ElementKind,
        ExecutableConstraints, PropertyPath,
    };
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq, Serialize)]
    struct Receipt {
        amount: i64,
    }

    #[derive(Debug, PartialEq, Serialize)]
    struct Customer {
        name: String,
        email: String,
    }

    fn transfer() -> ExecutableId {
        ExecutableId::method("Bank", "transfer")
            .param("i64")
            .returns("Receipt")
    }

    fn lookup() -> ExecutableId {
        ExecutableId::method("Bank", "lookup")
            .param("String")
            .returns("Option<String>")
    }

    fn new_customer() -> ExecutableId {
        ExecutableId::constructor("Customer").params(["String", "String"])
    }

    fn registry() -> ConstraintRegistry {
        ConstraintRegistry::new()
            .bean(
                "Customer",
                BeanConstraints::new().property("email", [Constraint::email()]),
            )
            .executable(
                transfer(),
                ExecutableConstraints::new()
                    .parameter(0, "amount", [Constraint::positive()])
                    .return_value([Constraint::not_null()]),
            )
            .executable(
                lookup(),
                ExecutableConstraints::new().return_value([Constraint::not_null()]),
            )
            .executable(
                new_customer(),
                ExecutableConstraints::new().parameter(0, "name", [Constraint::required()]),
            )
    }

    fn interceptor() -> ValidationInterceptor {
        ValidationInterceptor::new(registry())
    }

    fn transfer_call<'a>(
        amount: i64,
        calls: &'a AtomicUsize,
    ) -> MethodInvocation<impl FnOnce() -> Result<Receipt, String> + 'a> {
        MethodInvocation::new(
            json!({"id": 7}),
            transfer(),
            Arguments::from(vec![json!(amount)]),
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Receipt { amount })
            },
        )
    }

    /// Counts return value validations on top of the registry.
    struct CountingValidator {
        inner: ConstraintRegistry,
        returns: AtomicUsize,
    }

    impl ExecutableValidator for CountingValidator {
        fn validate_parameters(&self, t: &Value, m: &ExecutableId, a: &[Value]) -> ViolationSet {
            self.inner.validate_parameters(t, m, a)
        }

        fn validate_return_value(&self, t: &Value, m: &ExecutableId, r: &Value) -> ViolationSet {
            self.returns.fetch_add(1, Ordering::SeqCst);
            self.inner.validate_return_value(t, m, r)
        }

        fn validate_constructor_parameters(&self, c: &ExecutableId, a: &[Value]) -> ViolationSet {
            self.inner.validate_constructor_parameters(c, a)
        }

        fn validate_constructor_return_value(&self, c: &ExecutableId, i: &Value) -> ViolationSet {
            self.returns.fetch_add(1, Ordering::SeqCst);
            self.inner.validate_constructor_return_value(c, i)
        }
    }

    fn pathless() -> ViolationSet {
        std::iter::once(ConstraintViolation {
            message: "must not be null".into(),
            message_template: "must not be null".into(),
            property_path: PropertyPath::new(),
            root_bean: None,
            invalid_value: Value::Null,
            constraint: Constraint::not_null(),
        })
        .collect()
    }

    /// Reports one violation with an empty path, for parameter checks or,
    /// with `on_return`, for return value checks.
    struct PathlessValidator {
        on_return: bool,
    }

    impl ExecutableValidator for PathlessValidator {
        fn validate_parameters(&self, _: &Value, _: &ExecutableId, _: &[Value]) -> ViolationSet {
            if self.on_return {
                ViolationSet::new()
            } else {
                pathless()
            }
        }

        fn validate_return_value(&self, _: &Value, _: &ExecutableId, _: &Value) -> ViolationSet {
            if self.on_return {
                pathless()
            } else {
                ViolationSet::new()
            }
        }

        fn validate_constructor_parameters(&self, _: &ExecutableId, _: &[Value]) -> ViolationSet {
            ViolationSet::new()
        }

        fn validate_constructor_return_value(&self, _: &ExecutableId, _: &Value) -> ViolationSet {
            ViolationSet::new()
        }
    }

    #[test]
    fn valid_call_returns_result_once() {
        let calls = AtomicUsize::new(0);
        let receipt = interceptor()
            .around_invoke(transfer_call(10, &calls))
            .unwrap();

        assert_eq!(receipt, Receipt { amount: 10 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_argument_blocks_the_call() {
        let calls = AtomicUsize::new(0);
        let err = interceptor()
            .around_invoke(transfer_call(-5, &calls))
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let violation = err.into_violation().unwrap();
        assert_eq!(violation.phase(), Phase::Parameters);
        assert!(violation.message().contains("1 constraint violation(s)"));
        assert!(violation.message().contains("parameter index: 0"));

        let expected = registry().validate_parameters(&json!({"id": 7}), &transfer(), &[json!(-5)]);
        assert_eq!(violation.violations(), &expected);
    }

    #[test]
    fn invalid_result_fails_after_the_call() {
        let calls = AtomicUsize::new(0);
        let invocation = MethodInvocation::new(
            json!({}),
            lookup(),
            Arguments::from(vec![json!("ada")]),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<Option<String>, String>(None)
            },
        );

        let err = interceptor().around_invoke(invocation).unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let violation = err.into_violation().unwrap();
        assert_eq!(violation.phase(), Phase::ReturnValue);
        assert!(violation.phase().call_executed());
        assert!(violation.message().contains("Kind: RETURN_VALUE"));
        assert!(violation.message().contains(r#"Argument values: ["ada"]"#));
    }

    #[test]
    fn underlying_failure_skips_return_validation() {
        let validator = Arc::new(CountingValidator {
            inner: registry(),
            returns: AtomicUsize::new(0),
        });
        let interceptor = ValidationInterceptor::from_arc(validator.clone());
        let invocation = MethodInvocation::new(
            json!({}),
            transfer(),
            Arguments::from(vec![json!(10)]),
            || Err::<Receipt, _>("insufficient funds".to_string()),
        );

        let err = interceptor.around_invoke(invocation).unwrap_err();
        assert_eq!(err.into_invocation().as_deref(), Some("insufficient funds"));
        assert_eq!(validator.returns.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn constructor_with_empty_name_is_never_built() {
        let built = AtomicUsize::new(0);
        let invocation = ConstructorInvocation::new(
            new_customer(),
            Arguments::from(vec![json!(""), json!("ada@example.com")]),
            || {
                built.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(Customer {
                    name: String::new(),
                    email: "ada@example.com".into(),
                })
            },
        );

        let err = interceptor().around_construct(invocation).unwrap_err();
        assert_eq!(built.load(Ordering::SeqCst), 0);

        let violation = err.into_violation().unwrap();
        assert_eq!(violation.phase(), Phase::Parameters);
        assert!(violation.message().contains("root bean: null"));
        assert!(violation.message().contains("property path: Customer.name"));
    }

    #[test]
    fn constructed_instance_is_validated() {
        let invocation = ConstructorInvocation::new(
            new_customer(),
            Arguments::from(vec![json!("Ada"), json!("not-an-email")]),
            || {
                Ok::<_, String>(Customer {
                    name: "Ada".into(),
                    email: "not-an-email".into(),
                })
            },
        );

        let err = interceptor().around_construct(invocation).unwrap_err();
        let violation = err.into_violation().unwrap();
        assert_eq!(violation.phase(), Phase::ReturnValue);
        let leaf = violation.violations().iter().next().unwrap().leaf().unwrap();
        assert_eq!(leaf.kind(), ElementKind::Property);
        assert!(violation
            .message()
            .contains("property path: Customer.<return value>.email"));
    }

    #[test]
    fn valid_constructor_returns_instance() {
        let invocation = ConstructorInvocation::new(
            new_customer(),
            Arguments::from(vec![json!("Ada"), json!("ada@example.com")]),
            || {
                Ok::<_, String>(Customer {
                    name: "Ada".into(),
                    email: "ada@example.com".into(),
                })
            },
        );

        let customer = interceptor().around_construct(invocation).unwrap();
        assert_eq!(customer.name, "Ada");
    }

    #[test]
    fn getters_are_skipped_by_default() {
        let balance = ExecutableId::method("Bank", "get_balance").returns("Option<i64>");
        let registry = ConstraintRegistry::new().executable(
            balance.clone(),
            ExecutableConstraints::new().return_value([Constraint::not_null()]),
        );
        let call = || {
            MethodInvocation::new(json!({}), balance.clone(), Arguments::new(), || {
                Ok::<Option<i64>, String>(None)
            })
        };

        let default = ValidationInterceptor::new(registry.clone());
        assert_eq!(default.around_invoke(call()).unwrap(), None);

        let all = ValidationInterceptor::new(registry)
            .with_config(InterceptorConfig::default().with_executable_types([ExecutableType::All]));
        assert!(all.around_invoke(call()).unwrap_err().is_violation());
    }

    #[test]
    fn zero_argument_methods_are_validated_by_default() {
        let next_ticket = ExecutableId::method("Queue", "next_ticket").returns("Option<u64>");
        let interceptor = ValidationInterceptor::new(ConstraintRegistry::new().executable(
            next_ticket.clone(),
            ExecutableConstraints::new().return_value([Constraint::not_null()]),
        ));
        let calls = AtomicUsize::new(0);
        let invocation = MethodInvocation::new(json!({}), next_ticket, Arguments::new(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<Option<u64>, String>(None)
        });

        let error = interceptor
            .around_invoke(invocation)
            .unwrap_err()
            .into_violation()
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(error.phase(), Phase::ReturnValue);
        assert!(error.message().contains("Kind: RETURN_VALUE"));
        assert!(error.message().contains("Argument values: []"));
    }

    #[test]
    fn disabled_phases_are_not_run() {
        let calls = AtomicUsize::new(0);
        let interceptor = interceptor().with_config(InterceptorConfig::default().with_parameters(false));
        let receipt = interceptor
            .around_invoke(transfer_call(-5, &calls))
            .unwrap();

        assert_eq!(receipt.amount, -5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pathless_violation_is_an_internal_error() {
        let calls = AtomicUsize::new(0);
        let err = ValidationInterceptor::new(PathlessValidator { on_return: false })
            .around_invoke(transfer_call(10, &calls))
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        match err {
            InterceptError::MalformedViolation { phase, source, .. } => {
                assert_eq!(phase, Phase::Parameters);
                assert!(!phase.call_executed());
                assert_eq!(source.ordinal, 1);
                assert_eq!(source.defect, PathDefect::Empty);
            }
            other => panic!("expected malformed violation, got {:?}", other),
        }
    }

    #[cfg(feature = "tracing")]
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    #[cfg(feature = "tracing")]
    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn malformed_result_violation_logs_that_the_call_ran() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let calls = AtomicUsize::new(0);
        let err = tracing::subscriber::with_default(subscriber, || {
            ValidationInterceptor::new(PathlessValidator { on_return: true })
                .around_invoke(transfer_call(10, &calls))
                .unwrap_err()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            err,
            InterceptError::MalformedViolation {
                phase: Phase::ReturnValue,
                ..
            }
        ));
        let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("call_executed=true"), "{}", logged);
        assert!(logged.contains("has an empty property path"), "{}", logged);
    }

    #[test]
    fn verdicts() {
        let interceptor = interceptor();
        let args = Arguments::from(vec![json!(3)]);
        assert!(interceptor
            .verdict_for_parameters(&json!({}), &transfer(), &args)
            .is_passed());

        let verdict =
            interceptor.verdict_for_return_value(&json!({}), &transfer(), &Value::Null);
        assert_eq!(verdict.into_violations().map(|v| v.len()), Some(1));
        assert_eq!(ValidationInterceptor::PRIORITY, 3090);
    }

    #[test]
    fn shared_across_threads() {
        let interceptor = interceptor();
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8i64)
            .map(|i| {
                let interceptor = interceptor.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    let amount = if i % 2 == 0 { i + 1 } else { -i };
                    let invocation = MethodInvocation::new(
                        json!({"id": i}),
                        transfer(),
                        Arguments::from(vec![json!(amount)]),
                        move || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, String>(Receipt { amount })
                        },
                    );
                    (amount, interceptor.around_invoke(invocation))
                })
            })
            .collect();

        for handle in handles {
            let (amount, result) = handle.join().unwrap();
            if amount > 0 {
                assert_eq!(result.unwrap(), Receipt { amount });
            } else {
                let violation = result.unwrap_err().into_violation().unwrap();
                assert!(violation.message().contains(&format!("[{}]", amount)));
            }
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    // For any amount, the underlying call runs exactly once when the amount
    // is valid and never otherwise.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_call_runs_iff_arguments_valid(amount in -1_000i64..1_000) {
            let calls = AtomicUsize::new(0);
            let result = interceptor().around_invoke(transfer_call(amount, &calls));

            if amount > 0 {
                prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
                prop_assert_eq!(result.unwrap(), Receipt { amount });
            } else {
                prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
                let violation = result.unwrap_err().into_violation().unwrap();
                prop_assert_eq!(violation.violations().len(), 1);
            }
        }
    }
}
