//! Compiler options and configuration for Ember.
//!
//! Options come from defaults or from a TOML file:
//!
//! ```toml
//! target = "x86"
//!
//! [strategy]
//! static-axis-bound = "exclusive"
//! max-schedule-args = 8
//! ```
//!
//! Every field is optional; missing fields take their default.

#![warn(missing_docs)]

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

/// Upper-bound check applied to the largest resolved reduction axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisBound {
    /// Accept `axis <= rank`. Historical behaviour of static-shape strategies.
    #[default]
    Inclusive,
    /// Accept `axis < rank` only.
    Exclusive,
}

impl AxisBound {
    /// Returns true if `axis` passes this bound for a tensor of `rank`.
    #[must_use]
    pub const fn admits(self, axis: usize, rank: usize) -> bool {
        match self {
            Self::Inclusive => axis <= rank,
            Self::Exclusive => axis < rank,
        }
    }
}

/// Options controlling how operator strategies are built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StrategyOptions {
    /// Axis upper bound for static-shape strategies. Symbolic-shape
    /// strategies always use [`AxisBound::Exclusive`].
    pub static_axis_bound: AxisBound,
    /// Fewest entries a schedule stage accepts.
    pub min_schedule_args: usize,
    /// Most entries a schedule stage accepts.
    pub max_schedule_args: usize,
    /// Priority of the registered implementation.
    pub priority: i32,
    /// Support level recorded on registered operators.
    pub support_level: u32,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            static_axis_bound: AxisBound::Inclusive,
            min_schedule_args: 2,
            max_schedule_args: 8,
            priority: 1,
            support_level: 4,
        }
    }
}

impl StrategyOptions {
    /// Check the options for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns an error if the schedule arity range is empty or starts at zero.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.min_schedule_args == 0 {
            return Err(SessionError::InvalidConfig(
                "min-schedule-args must be at least 1".to_string(),
            ));
        }
        if self.min_schedule_args > self.max_schedule_args {
            return Err(SessionError::InvalidConfig(format!(
                "min-schedule-args ({}) exceeds max-schedule-args ({})",
                self.min_schedule_args, self.max_schedule_args
            )));
        }
        Ok(())
    }
}

/// Top-level compiler options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Options {
    /// Target architecture name (e.g. "x86", "nvgpu").
    pub target: Option<String>,
    /// Strategy construction options.
    pub strategy: StrategyOptions,
}

impl Options {
    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// describes inconsistent options.
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SessionError::ConfigNotFound(path.to_path_buf())
            } else {
                SessionError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// Parse options from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or describes
    /// inconsistent options.
    pub fn parse(content: &str) -> Result<Self, SessionError> {
        let options: Self = toml::from_str(content)?;
        options.strategy.validate()?;
        Ok(options)
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(Utf8PathBuf),
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = StrategyOptions::default();
        assert_eq!(opts.static_axis_bound, AxisBound::Inclusive);
        assert_eq!((opts.min_schedule_args, opts.max_schedule_args), (2, 8));
        assert_eq!(opts.priority, 1);
        assert_eq!(opts.support_level, 4);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_axis_bound() {
        assert!(AxisBound::Inclusive.admits(3, 3));
        assert!(!AxisBound::Inclusive.admits(4, 3));
        assert!(!AxisBound::Exclusive.admits(3, 3));
        assert!(AxisBound::Exclusive.admits(2, 3));
    }

    #[test]
    fn test_parse_partial() {
        let opts = Options::parse(
            r#"
            target = "nvgpu"

            [strategy]
            static-axis-bound = "exclusive"
            "#,
        )
        .unwrap();
        assert_eq!(opts.target.as_deref(), Some("nvgpu"));
        assert_eq!(opts.strategy.static_axis_bound, AxisBound::Exclusive);
        assert_eq!(opts.strategy.max_schedule_args, 8);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Options::parse("").unwrap(), Options::default());
    }

    #[test]
    fn test_parse_rejects_inverted_range() {
        let err = Options::parse(
            r#"
            [strategy]
            min-schedule-args = 5
            max-schedule-args = 3
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Options::load("/nonexistent/ember.toml").unwrap_err();
        assert!(matches!(err, SessionError::ConfigNotFound(_)));
    }
}
