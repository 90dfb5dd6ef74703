use gatecheck_validate::ExecutableId;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Which engine entry point a call came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPhase {
    Parameters,
    ReturnValue,
    ConstructorParameters,
    ConstructorReturnValue,
}

impl fmt::Display for ValidationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationPhase::Parameters => "parameters",
            ValidationPhase::ReturnValue => "return value",
            ValidationPhase::ConstructorParameters => "constructor parameters",
            ValidationPhase::ConstructorReturnValue => "constructor return value",
        };
        f.write_str(name)
    }
}

/// Matcher for validation calls
#[derive(Debug, Clone, Default)]
pub struct ValidationMatcher {
    pub(crate) phase: Option<ValidationPhase>,
    pub(crate) executable: Option<String>,
    pub(crate) declaring_type: Option<String>,
    pub(crate) values: Option<Vec<Value>>,
}

impl ValidationMatcher {
    /// Create a new matcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a specific engine entry point
    pub fn phase(mut self, phase: ValidationPhase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Match an executable by name
    pub fn executable(mut self, name: impl Into<String>) -> Self {
        self.executable = Some(name.into());
        self
    }

    /// Match the type declaring the executable
    pub fn declaring_type(mut self, type_name: impl Into<String>) -> Self {
        self.declaring_type = Some(type_name.into());
        self
    }

    /// Match exact validated values: the arguments, or the single returned
    /// value or instance.
    pub fn values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.values = Some(values.into_iter().collect());
        self
    }

    /// Match a single returned value or constructed instance
    pub fn value(self, value: Value) -> Self {
        self.values([value])
    }

    /// Check if the matcher matches a validation call
    pub fn matches(&self, phase: ValidationPhase, executable: &ExecutableId, values: &[Value]) -> bool {
        if let Some(p) = &self.phase {
            if *p != phase {
                return false;
            }
        }

        if let Some(name) = &self.executable {
            if name != executable.name() {
                return false;
            }
        }

        if let Some(ty) = &self.declaring_type {
            if ty != executable.declaring_type() {
                return false;
            }
        }

        if let Some(expected) = &self.values {
            if expected.as_slice() != values {
                return false;
            }
        }

        true
    }
}
