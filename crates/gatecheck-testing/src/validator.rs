use super::expectation::{Expectation, Times};
use super::matcher::{ValidationMatcher, ValidationPhase};
use gatecheck_validate::{ConstraintViolation, ExecutableId, ExecutableValidator, ViolationSet};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A scripted validation engine
///
/// Calls are answered by the most recently added matching expectation;
/// calls nothing matches get an empty [`ViolationSet`] and are kept for
/// [`unmatched`](MockValidator::unmatched). Clones share expectations and
/// recordings.
#[derive(Debug, Clone, Default)]
pub struct MockValidator {
    state: Arc<Mutex<ValidatorState>>,
}

#[derive(Debug, Default)]
struct ValidatorState {
    expectations: Vec<Expectation>,
    recorded: Vec<RecordedValidation>,
    unmatched: Vec<RecordedValidation>,
}

/// One call into the mock engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedValidation {
    pub phase: ValidationPhase,
    pub executable: ExecutableId,
    /// Absent for constructor calls
    pub target: Option<Value>,
    /// The arguments, or the single returned value or instance
    pub values: Vec<Value>,
}

impl MockValidator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ValidatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an expectation
    pub fn expect(&self, matcher: ValidationMatcher) -> ExpectationBuilder {
        ExpectationBuilder {
            validator: self.state.clone(),
            expectation: Some(Expectation::new(matcher)),
        }
    }

    /// Every call so far, in call order
    pub fn recorded(&self) -> Vec<RecordedValidation> {
        self.state().recorded.clone()
    }

    /// Calls that didn't match any expectation
    pub fn unmatched(&self) -> Vec<RecordedValidation> {
        self.state().unmatched.clone()
    }

    /// Number of calls through `phase`
    pub fn calls(&self, phase: ValidationPhase) -> usize {
        self.state()
            .recorded
            .iter()
            .filter(|r| r.phase == phase)
            .count()
    }

    /// Verify that all expectations were met
    ///
    /// # Panics
    ///
    /// Panics on the first expectation whose call count does not satisfy
    /// its [`Times`].
    pub fn verify(&self) {
        let state = self.state();
        for exp in &state.expectations {
            if let Some(message) = exp.unmet() {
                panic!("{}", message);
            }
        }
    }

    fn answer(
        &self,
        phase: ValidationPhase,
        executable: &ExecutableId,
        target: Option<&Value>,
        values: &[Value],
    ) -> ViolationSet {
        let record = RecordedValidation {
            phase,
            executable: executable.clone(),
            target: target.cloned(),
            values: values.to_vec(),
        };

        let mut state = self.state();
        state.recorded.push(record.clone());

        // Later expectations override earlier ones
        let matching = state
            .expectations
            .iter()
            .rposition(|exp| exp.matcher.matches(phase, executable, values));

        match matching {
            Some(idx) => {
                let exp = &mut state.expectations[idx];
                exp.call_count += 1;
                exp.violations.clone()
            }
            None => {
                tracing::debug!(
                    target: "gatecheck::testing",
                    executable = %executable,
                    phase = %phase,
                    "no expectation matched"
                );
                state.unmatched.push(record);
                ViolationSet::new()
            }
        }
    }
}

impl ExecutableValidator for MockValidator {
    fn validate_parameters(
        &self,
        target: &Value,
        method: &ExecutableId,
        arguments: &[Value],
    ) -> ViolationSet {
        self.answer(ValidationPhase::Parameters, method, Some(target), arguments)
    }

    fn validate_return_value(
        &self,
        target: &Value,
        method: &ExecutableId,
        return_value: &Value,
    ) -> ViolationSet {
        self.answer(
            ValidationPhase::ReturnValue,
            method,
            Some(target),
            std::slice::from_ref(return_value),
        )
    }

    fn validate_constructor_parameters(
        &self,
        constructor: &ExecutableId,
        arguments: &[Value],
    ) -> ViolationSet {
        self.answer(
            ValidationPhase::ConstructorParameters,
            constructor,
            None,
            arguments,
        )
    }

    fn validate_constructor_return_value(
        &self,
        constructor: &ExecutableId,
        instance: &Value,
    ) -> ViolationSet {
        self.answer(
            ValidationPhase::ConstructorReturnValue,
            constructor,
            None,
            std::slice::from_ref(instance),
        )
    }
}

/// Registers its expectation with the validator when dropped.
pub struct ExpectationBuilder {
    validator: Arc<Mutex<ValidatorState>>,
    expectation: Option<Expectation>,
}

impl ExpectationBuilder {
    pub fn respond_with(
        mut self,
        violations: impl IntoIterator<Item = ConstraintViolation>,
    ) -> Self {
        if let Some(exp) = self.expectation.take() {
            self.expectation = Some(exp.respond_with(violations));
        }
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::Exactly(n);
        }
        self
    }

    pub fn once(mut self) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::Once;
        }
        self
    }

    pub fn at_least_once(mut self) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::AtLeast(1);
        }
        self
    }

    pub fn at_most(mut self, n: usize) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::AtMost(n);
        }
        self
    }

    pub fn never(mut self) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::Exactly(0);
        }
        self
    }
}

impl Drop for ExpectationBuilder {
    fn drop(&mut self) {
        if let Some(exp) = self.expectation.take() {
            let mut state = self.validator.lock().unwrap_or_else(PoisonError::into_inner);
            state.expectations.push(exp);
        }
    }
}
