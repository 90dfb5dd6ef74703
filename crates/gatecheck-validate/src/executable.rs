//! Identity of validated callables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an executable is a method or a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutableKind {
    Method,
    Constructor,
}

/// Opaque, hashable identity of a method or constructor.
///
/// Two ids are equal when kind, declaring type, name and parameter types
/// match, which is what constraint metadata is keyed on.
///
/// ```rust,ignore
/// let transfer = ExecutableId::method("Bank", "transfer")
///     .param("i64")
///     .returns("Receipt");
/// assert_eq!(transfer.to_string(), "Bank::transfer(i64) -> Receipt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutableId {
    kind: ExecutableKind,
    declaring_type: String,
    name: String,
    #[serde(default)]
    parameter_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    return_type: Option<String>,
}

impl ExecutableId {
    pub fn method(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: ExecutableKind::Method,
            declaring_type: declaring_type.into(),
            name: name.into(),
            parameter_types: Vec::new(),
            return_type: None,
        }
    }

    /// A constructor named `new`; use [`ExecutableId::named`] for others.
    pub fn constructor(declaring_type: impl Into<String>) -> Self {
        let declaring_type = declaring_type.into();
        Self {
            kind: ExecutableKind::Constructor,
            return_type: Some(declaring_type.clone()),
            declaring_type,
            name: "new".to_string(),
            parameter_types: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a parameter type.
    pub fn param(mut self, type_name: impl Into<String>) -> Self {
        self.parameter_types.push(type_name.into());
        self
    }

    pub fn params<I, S>(mut self, type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_types
            .extend(type_names.into_iter().map(Into::into));
        self
    }

    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }

    pub fn kind(&self) -> ExecutableKind {
        self.kind
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == ExecutableKind::Constructor
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_types.len()
    }

    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// An accessor: a method taking no parameters whose name starts with
    /// `get`, or with `is`/`has` when it returns `bool`.
    ///
    /// The prefix must be followed by `_` or an uppercase letter, so
    /// `get_balance`, `getBalance` and `is_open` qualify while `getaway`,
    /// `next_ticket` and `close` do not.
    pub fn is_getter(&self) -> bool {
        if self.kind != ExecutableKind::Method || !self.parameter_types.is_empty() {
            return false;
        }
        let Some(ret) = self.return_type.as_deref() else {
            return false;
        };
        if has_accessor_prefix(&self.name, "get") {
            return true;
        }
        ret == "bool"
            && (has_accessor_prefix(&self.name, "is")
                || has_accessor_prefix(&self.name, "has"))
    }
}

fn has_accessor_prefix(name: &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => match rest.strip_prefix('_') {
            Some(tail) => !tail.is_empty(),
            None => rest.chars().next().is_some_and(char::is_uppercase),
        },
        None => false,
    }
}

impl fmt::Display for ExecutableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}({})",
            self.declaring_type,
            self.name,
            self.parameter_types.join(", ")
        )?;
        match (&self.kind, &self.return_type) {
            (ExecutableKind::Method, Some(ret)) => write!(f, " -> {}", ret),
            _ => Ok(()),
        }
    }
}
