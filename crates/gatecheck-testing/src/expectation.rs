use super::matcher::ValidationMatcher;
use gatecheck_validate::{ConstraintViolation, ViolationSet};

/// An expectation for a validation call
#[derive(Debug, Clone)]
pub struct Expectation {
    pub(crate) matcher: ValidationMatcher,
    pub(crate) violations: ViolationSet,
    pub(crate) times: Times,
    pub(crate) call_count: usize,
}

impl Expectation {
    /// Create a new expectation answering with no violations
    pub fn new(matcher: ValidationMatcher) -> Self {
        Self {
            matcher,
            violations: ViolationSet::new(),
            times: Times::Any,
            call_count: 0,
        }
    }

    /// Answer matching calls with these violations
    pub fn respond_with(mut self, violations: impl IntoIterator<Item = ConstraintViolation>) -> Self {
        self.violations = violations.into_iter().collect();
        self
    }

    /// Expect the call exactly once
    pub fn once(mut self) -> Self {
        self.times = Times::Once;
        self
    }

    /// Expect the call exactly n times
    pub fn times(mut self, n: usize) -> Self {
        self.times = Times::Exactly(n);
        self
    }

    /// Expect the call at least once
    pub fn at_least_once(mut self) -> Self {
        self.times = Times::AtLeast(1);
        self
    }

    /// Expect the call never to happen
    pub fn never(mut self) -> Self {
        self.times = Times::Exactly(0);
        self
    }

    pub fn matcher(&self) -> &ValidationMatcher {
        &self.matcher
    }

    pub fn call_count(&self) -> usize {
        self.call_count
    }

    /// Describe the mismatch between expected and actual call counts, if any
    pub(crate) fn unmet(&self) -> Option<String> {
        let n = self.call_count;
        let expected = match self.times {
            Times::Once if n != 1 => "1 call".to_string(),
            Times::Exactly(k) if n != k => format!("{} calls", k),
            Times::AtLeast(k) if n < k => format!("at least {} calls", k),
            Times::AtMost(k) if n > k => format!("at most {} calls", k),
            _ => return None,
        };
        Some(format!(
            "Expectation {:?} expected {}, got {}",
            self.matcher, expected, n
        ))
    }
}

/// Define how many times an expectation should be matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    Once,
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    Any,
}
