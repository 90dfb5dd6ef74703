//! Testing utilities for gatecheck
//!
//! # Mock Validator
//!
//! The `MockValidator` stands in for a real validation engine so
//! interception logic can be tested against scripted violations.

pub mod expectation;
pub mod matcher;
pub mod validator;
pub mod violation;

pub use expectation::{Expectation, Times};
pub use matcher::{ValidationMatcher, ValidationPhase};
pub use validator::{ExpectationBuilder, MockValidator, RecordedValidation};
pub use violation::{violation, ViolationBuilder};
