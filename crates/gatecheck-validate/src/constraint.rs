//! Built-in constraints of the reference engine.
//!
//! Constraints check `serde_json::Value` snapshots of arguments, return
//! values and bean properties. A `null` value satisfies every constraint
//! except [`Constraint::NotNull`] and [`Constraint::Required`], so optional
//! values only need a not-null rule when they are mandatory.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static URL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn email_regex() -> Option<&'static Regex> {
    EMAIL_REGEX
        .get_or_init(|| {
            // RFC 5322 simplified
            Regex::new(
                r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
            )
            .ok()
        })
        .as_ref()
}

fn url_regex() -> Option<&'static Regex> {
    URL_REGEX
        .get_or_init(|| Regex::new(r"^(https?|ftp)://[^\s/$.?#].[^\s]*$").ok())
        .as_ref()
}

/// A regular expression compiled once, when the constraint is defined.
///
/// Serializes as its source string. Deserializing an invalid pattern fails,
/// so a broken pattern is a configuration error rather than a violation of
/// every value it is checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::new(&source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.as_str().to_string()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single constraint check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleError {
    /// The constraint code (e.g. "not_null", "range")
    pub code: String,
    /// Message template, may contain `{param}` placeholders
    pub message: String,
    /// Parameters for placeholder interpolation
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
}

impl RuleError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter to the error.
    pub fn param(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.params.insert(key.into(), v);
        }
        self
    }

    /// Replace `{param_name}` placeholders with parameter values.
    pub fn interpolate_message(&self) -> String {
        let mut result = self.message.clone();
        for (key, value) in &self.params {
            let placeholder = format!("{{{}}}", key);
            let replacement = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            result = result.replace(&placeholder, &replacement);
        }
        result
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.interpolate_message())
    }
}

impl std::error::Error for RuleError {}

/// A declarative rule checked against a value.
///
/// The `Display` form is the descriptor shown in diagnostics, e.g.
/// `#[validate(range(min = 1))]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Value must not be null
    NotNull {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Value must be null
    Null {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Not null, not a blank string, not an empty array or object
    Required {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Character count of a string or item count of an array
    Length {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Inclusive numeric bounds
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Strictly greater than zero
    Positive {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// String must match a regular expression
    Regex {
        pattern: Pattern,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Url {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl Constraint {
    pub fn not_null() -> Self {
        Constraint::NotNull { message: None }
    }

    pub fn null() -> Self {
        Constraint::Null { message: None }
    }

    pub fn required() -> Self {
        Constraint::Required { message: None }
    }

    pub fn length(min: usize, max: usize) -> Self {
        Constraint::Length {
            min: Some(min),
            max: Some(max),
            message: None,
        }
    }

    pub fn min_length(min: usize) -> Self {
        Constraint::Length {
            min: Some(min),
            max: None,
            message: None,
        }
    }

    pub fn max_length(max: usize) -> Self {
        Constraint::Length {
            min: None,
            max: Some(max),
            message: None,
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: Some(max),
            message: None,
        }
    }

    pub fn min(min: f64) -> Self {
        Constraint::Range {
            min: Some(min),
            max: None,
            message: None,
        }
    }

    pub fn max(max: f64) -> Self {
        Constraint::Range {
            min: None,
            max: Some(max),
            message: None,
        }
    }

    pub fn positive() -> Self {
        Constraint::Positive { message: None }
    }

    /// Match strings against `pattern`; fails if the pattern does not compile.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Constraint::Regex {
            pattern: Pattern::new(pattern)?,
            message: None,
        })
    }

    pub fn email() -> Self {
        Constraint::Email { message: None }
    }

    pub fn url() -> Self {
        Constraint::Url { message: None }
    }

    /// Replace the default message template.
    pub fn with_message(mut self, custom: impl Into<String>) -> Self {
        let slot = match &mut self {
            Constraint::NotNull { message }
            | Constraint::Null { message }
            | Constraint::Required { message }
            | Constraint::Length { message, .. }
            | Constraint::Range { message, .. }
            | Constraint::Positive { message }
            | Constraint::Regex { message, .. }
            | Constraint::Email { message }
            | Constraint::Url { message } => message,
        };
        *slot = Some(custom.into());
        self
    }

    pub fn code(&self) -> &'static str {
        match self {
            Constraint::NotNull { .. } => "not_null",
            Constraint::Null { .. } => "null",
            Constraint::Required { .. } => "required",
            Constraint::Length { .. } => "length",
            Constraint::Range { .. } => "range",
            Constraint::Positive { .. } => "positive",
            Constraint::Regex { .. } => "regex",
            Constraint::Email { .. } => "email",
            Constraint::Url { .. } => "url",
        }
    }

    fn custom_message(&self) -> Option<&String> {
        match self {
            Constraint::NotNull { message }
            | Constraint::Null { message }
            | Constraint::Required { message }
            | Constraint::Length { message, .. }
            | Constraint::Range { message, .. }
            | Constraint::Positive { message }
            | Constraint::Regex { message, .. }
            | Constraint::Email { message }
            | Constraint::Url { message } => message.as_ref(),
        }
    }

    fn fail(&self, default_template: &str) -> RuleError {
        let template = self
            .custom_message()
            .cloned()
            .unwrap_or_else(|| default_template.to_string());
        RuleError::new(self.code(), template)
    }

    fn unsupported(&self, value: &Value) -> RuleError {
        RuleError::new(
            self.code(),
            "value of type {actual_type} is not supported by this constraint",
        )
        .param("actual_type", json_type(value))
    }

    /// Check `value` against this constraint.
    pub fn check(&self, value: &Value) -> Result<(), RuleError> {
        match self {
            Constraint::NotNull { .. } => {
                if value.is_null() {
                    return Err(self.fail("must not be null"));
                }
                Ok(())
            }
            Constraint::Null { .. } => {
                if !value.is_null() {
                    return Err(self.fail("must be null"));
                }
                Ok(())
            }
            Constraint::Required { .. } => {
                let present = match value {
                    Value::Null => false,
                    Value::String(s) => !s.trim().is_empty(),
                    Value::Array(items) => !items.is_empty(),
                    Value::Object(map) => !map.is_empty(),
                    _ => true,
                };
                if present {
                    Ok(())
                } else {
                    Err(self.fail("must not be empty"))
                }
            }
            Constraint::Length { min, max, .. } => {
                let len = match value {
                    Value::Null => return Ok(()),
                    Value::String(s) => s.chars().count(),
                    Value::Array(items) => items.len(),
                    other => return Err(self.unsupported(other)),
                };
                if let Some(min) = *min {
                    if len < min {
                        return Err(self
                            .fail("length must be at least {min}")
                            .param("min", min)
                            .param("max", *max)
                            .param("actual", len));
                    }
                }
                if let Some(max) = *max {
                    if len > max {
                        return Err(self
                            .fail("length must be at most {max}")
                            .param("min", *min)
                            .param("max", max)
                            .param("actual", len));
                    }
                }
                Ok(())
            }
            Constraint::Range { min, max, .. } => {
                let number = match value {
                    Value::Null => return Ok(()),
                    Value::Number(n) => n.as_f64(),
                    other => return Err(self.unsupported(other)),
                };
                let Some(number) = number else {
                    return Err(self.unsupported(value));
                };
                if let Some(min) = *min {
                    if number < min {
                        return Err(self
                            .fail("must be at least {min}")
                            .param("min", min)
                            .param("actual", value));
                    }
                }
                if let Some(max) = *max {
                    if number > max {
                        return Err(self
                            .fail("must be at most {max}")
                            .param("max", max)
                            .param("actual", value));
                    }
                }
                Ok(())
            }
            Constraint::Positive { .. } => match value {
                Value::Null => Ok(()),
                Value::Number(n) => match n.as_f64() {
                    Some(number) if number > 0.0 => Ok(()),
                    _ => Err(self.fail("must be greater than 0").param("actual", value)),
                },
                other => Err(self.unsupported(other)),
            },
            Constraint::Regex { pattern, .. } => {
                let text = match value {
                    Value::Null => return Ok(()),
                    Value::String(s) => s,
                    other => return Err(self.unsupported(other)),
                };
                if pattern.is_match(text) {
                    Ok(())
                } else {
                    Err(self
                        .fail("must match \"{pattern}\"")
                        .param("pattern", pattern.as_str()))
                }
            }
            Constraint::Email { .. } => {
                self.match_builtin(value, email_regex(), "must be a well-formed email address")
            }
            Constraint::Url { .. } => self.match_builtin(value, url_regex(), "must be a valid URL"),
        }
    }

    fn match_builtin(
        &self,
        value: &Value,
        regex: Option<&Regex>,
        template: &str,
    ) -> Result<(), RuleError> {
        let text = match value {
            Value::Null => return Ok(()),
            Value::String(s) => s,
            other => return Err(self.unsupported(other)),
        };
        match regex {
            Some(regex) if regex.is_match(text) => Ok(()),
            _ => Err(self.fail(template)),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        match self {
            Constraint::Length { min, max, .. } => {
                if let Some(min) = min {
                    parts.push(format!("min = {}", min));
                }
                if let Some(max) = max {
                    parts.push(format!("max = {}", max));
                }
            }
            Constraint::Range { min, max, .. } => {
                if let Some(min) = min {
                    parts.push(format!("min = {}", min));
                }
                if let Some(max) = max {
                    parts.push(format!("max = {}", max));
                }
            }
            Constraint::Regex { pattern, .. } => parts.push(format!("pattern = \"{}\"", pattern)),
            _ => {}
        }
        if let Some(message) = self.custom_message() {
            parts.push(format!("message = \"{}\"", message));
        }

        if parts.is_empty() {
            write!(f, "#[validate({})]", self.code())
        } else {
            write!(f, "#[validate({}({}))]", self.code(), parts.join(", "))
        }
    }
}
