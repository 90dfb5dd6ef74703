//! Interceptor configuration with environment variable support.
//!
//! Settings are read from `GATECHECK_`-prefixed variables:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GATECHECK_VALIDATE_PARAMETERS` | `true` |
//! | `GATECHECK_VALIDATE_RETURN_VALUES` | `true` |
//! | `GATECHECK_EXECUTABLE_TYPES` | `constructors,non_getter_methods` |
//!
//! # Example
//!
//! ```ignore
//! use gatecheck_core::config::{load_dotenv, InterceptorConfig};
//!
//! load_dotenv();
//! let config = InterceptorConfig::from_env()?;
//! ```

use gatecheck_validate::ExecutableId;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "GATECHECK_";

/// Error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed.
    #[error("configuration error: {0}")]
    Env(#[from] envy::Error),
    /// `none` was listed together with other executable types.
    #[error("executable type `none` cannot be combined with other types")]
    NoneCombined,
}

/// Categories of executables subject to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutableType {
    /// Nothing is validated
    None,
    Constructors,
    /// Methods that are not getters
    NonGetterMethods,
    /// Methods with no parameters that return a value
    GetterMethods,
    /// Shorthand for every other category
    All,
}

fn default_true() -> bool {
    true
}

fn default_executable_types() -> Vec<ExecutableType> {
    vec![ExecutableType::Constructors, ExecutableType::NonGetterMethods]
}

/// Which invocations the interceptor validates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptorConfig {
    #[serde(default = "default_true")]
    pub validate_parameters: bool,
    #[serde(default = "default_true")]
    pub validate_return_values: bool,
    #[serde(default = "default_executable_types")]
    pub executable_types: Vec<ExecutableType>,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            validate_parameters: true,
            validate_return_values: true,
            executable_types: default_executable_types(),
        }
    }
}

impl InterceptorConfig {
    /// Load configuration from `GATECHECK_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or the executable
    /// type list is contradictory.
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::prefixed(ENV_PREFIX)
            .from_env::<Self>()
            .map_err(ConfigError::from)
            .and_then(Self::checked)
    }

    /// Load configuration from explicit `(KEY, value)` pairs, using the
    /// same prefix rules as [`from_env`](Self::from_env).
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter::<_, Self>(vars)
            .map_err(ConfigError::from)
            .and_then(Self::checked)
    }

    /// Validate every executable, getters included.
    pub fn all() -> Self {
        Self {
            executable_types: vec![ExecutableType::All],
            ..Self::default()
        }
    }

    /// Validate nothing; every invocation proceeds directly.
    pub fn disabled() -> Self {
        Self {
            validate_parameters: false,
            validate_return_values: false,
            executable_types: vec![ExecutableType::None],
        }
    }

    pub fn with_executable_types(mut self, types: impl IntoIterator<Item = ExecutableType>) -> Self {
        self.executable_types = types.into_iter().collect();
        self
    }

    pub fn with_parameters(mut self, enabled: bool) -> Self {
        self.validate_parameters = enabled;
        self
    }

    pub fn with_return_values(mut self, enabled: bool) -> Self {
        self.validate_return_values = enabled;
        self
    }

    fn checked(self) -> Result<Self, ConfigError> {
        if self.executable_types.len() > 1
            && self.executable_types.contains(&ExecutableType::None)
        {
            return Err(ConfigError::NoneCombined);
        }
        Ok(self)
    }

    fn enabled(&self, ty: ExecutableType) -> bool {
        self.executable_types
            .iter()
            .any(|t| *t == ty || *t == ExecutableType::All)
    }

    /// Whether invocations of `executable` are validated at all.
    pub fn covers(&self, executable: &ExecutableId) -> bool {
        if executable.is_constructor() {
            self.enabled(ExecutableType::Constructors)
        } else if executable.is_getter() {
            self.enabled(ExecutableType::GetterMethods)
        } else {
            self.enabled(ExecutableType::NonGetterMethods)
        }
    }
}

/// Load environment variables from a `.env` file, if present.
///
/// Existing variables take precedence over file values.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Load environment variables from a specific file path.
pub fn load_dotenv_from<P: AsRef<std::path::Path>>(path: P) {
    let _ = dotenvy::from_path(path);
}
