//! Knowledge base configuration.
//!
//! # Environment Variables
//!
//! - `SLEUTH_INDEXING`: Cluster facts on hashable attributes (default: `true`)
//! - `SLEUTH_MAX_RULE_DEPTH`: Maximum nesting of rule evaluations (default: `128`)
//!
//! # Invariants
//!
//! - `max_rule_depth` is always at least 1

/// Knowledge base configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBaseConfig {
    /// Whether new fact storages cluster on hashable attributes.
    /// When false every lookup is a filtered linear scan.
    pub indexing: bool,
    /// How many rule evaluations may be nested before evaluation fails with
    /// `RuleDepthExceeded`.
    pub max_rule_depth: usize,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            indexing: Self::DEFAULT_INDEXING,
            max_rule_depth: Self::DEFAULT_MAX_RULE_DEPTH,
        }
    }
}

impl KnowledgeBaseConfig {
    /// Default for `indexing`.
    pub const DEFAULT_INDEXING: bool = true;
    /// Default for `max_rule_depth`.
    pub const DEFAULT_MAX_RULE_DEPTH: usize = 128;

    const INDEXING_VAR: &'static str = "SLEUTH_INDEXING";
    const MAX_RULE_DEPTH_VAR: &'static str = "SLEUTH_MAX_RULE_DEPTH";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `SLEUTH_INDEXING` is set but not a boolean
    /// - `SLEUTH_MAX_RULE_DEPTH` is set but not a positive integer
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    /// or `None` if it is unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let indexing = match lookup(Self::INDEXING_VAR) {
            Some(value) => parse_bool(Self::INDEXING_VAR, &value)?,
            None => Self::DEFAULT_INDEXING,
        };
        let max_rule_depth = match lookup(Self::MAX_RULE_DEPTH_VAR) {
            Some(value) => parse_depth(Self::MAX_RULE_DEPTH_VAR, &value)?,
            None => Self::DEFAULT_MAX_RULE_DEPTH,
        };

        Ok(Self {
            indexing,
            max_rule_depth,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a boolean (expected true/false, 1/0, yes/no or on/off)"),
        }),
    }
}

fn parse_depth(name: &str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a positive integer"),
        }),
    }
}
