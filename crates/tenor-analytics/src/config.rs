//! Pricing configuration.
//!
//! [`PricingConfig`] travels explicitly on every
//! [`PricingContext`](crate::context::PricingContext). It can be built in
//! code, from one of the presets, or parsed from TOML or JSON; every field
//! has a default so partial documents are accepted.
//!
//! ```rust
//! use tenor_analytics::config::PricingConfig;
//!
//! let config = PricingConfig::from_toml_str(
//!     r#"
//!     [lattice]
//!     steps_per_year = 100
//!
//!     [cds]
//!     fallback_enabled = false
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.lattice.steps_per_year, 100);
//! assert!(!config.cds.fallback_enabled);
//! assert_eq!(config.solver.max_iterations, 100);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tenor_math::solvers::SolverConfig;

/// Current configuration schema version.
pub const CONFIG_VERSION: u32 = 1;

/// Errors raised when reading or validating a configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A field is out of range.
    #[error("Invalid configuration field {field}: {message}")]
    Invalid {
        /// Field path.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The document could not be parsed.
    #[error("Configuration parse error: {reason}")]
    Parse {
        /// Parser message.
        reason: String,
    },

    /// The document was written for a newer schema.
    #[error("Unsupported configuration version {found} (supported up to {supported})")]
    UnsupportedVersion {
        /// Version in the document.
        found: u32,
        /// Latest supported version.
        supported: u32,
    },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Root-finding tolerances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Absolute tolerance.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Iteration cap.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl SolverSettings {
    /// Solver configuration for `tenor_math`.
    #[must_use]
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig::new(self.tolerance, self.max_iterations)
    }
}

/// Initial search interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    /// Lower end.
    pub lower: f64,
    /// Upper end.
    pub upper: f64,
}

impl Bracket {
    /// Creates a bracket.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
}

/// Lattice resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeSettings {
    /// Minimum steps per year of the short-rate tree.
    #[serde(default = "default_steps_per_year")]
    pub steps_per_year: u32,
    /// Minimum steps per year of the convertible tree.
    #[serde(default = "default_convertible_steps_per_year")]
    pub convertible_steps_per_year: u32,
    /// Relative spot bump for convertible delta and gamma.
    #[serde(default = "default_spot_bump")]
    pub spot_bump: f64,
}

impl Default for LatticeSettings {
    fn default() -> Self {
        Self {
            steps_per_year: default_steps_per_year(),
            convertible_steps_per_year: default_convertible_steps_per_year(),
            spot_bump: default_spot_bump(),
        }
    }
}

/// CDS-implied spread solving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CdsSettings {
    /// Use the risky-duration fixed point when the price is not monotone in spread.
    #[serde(default = "default_true")]
    pub fallback_enabled: bool,
    /// Upper end of the spread search.
    #[serde(default = "default_max_spread")]
    pub max_spread: f64,
}

impl Default for CdsSettings {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            max_spread: default_max_spread(),
        }
    }
}

/// Parallel evaluation of lattice layers and batches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParallelSettings {
    /// Allow parallel evaluation when the `parallel` feature is compiled in.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minimum number of items before going parallel.
    #[serde(default = "default_parallel_threshold")]
    pub threshold: usize,
}

impl Default for ParallelSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_parallel_threshold(),
        }
    }
}

impl ParallelSettings {
    /// Sequential evaluation only.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            enabled: false,
            threshold: default_parallel_threshold(),
        }
    }

    /// True if `len` items should be processed in parallel.
    #[must_use]
    pub fn should_parallelize(&self, len: usize) -> bool {
        self.enabled && len >= self.threshold
    }
}

/// Versioned pricing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Solver tolerances.
    #[serde(default)]
    pub solver: SolverSettings,
    /// Yield search interval.
    #[serde(default = "default_yield_bracket")]
    pub yield_bracket: Bracket,
    /// Spread search interval.
    #[serde(default = "default_spread_bracket")]
    pub spread_bracket: Bracket,
    /// Lattice resolution.
    #[serde(default)]
    pub lattice: LatticeSettings,
    /// CDS-implied spread settings.
    #[serde(default)]
    pub cds: CdsSettings,
    /// Parallelism.
    #[serde(default)]
    pub parallel: ParallelSettings,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_iterations() -> u32 {
    100
}

fn default_yield_bracket() -> Bracket {
    Bracket::new(-0.5, 1.0)
}

fn default_spread_bracket() -> Bracket {
    Bracket::new(-0.1, 1.0)
}

fn default_steps_per_year() -> u32 {
    48
}

fn default_convertible_steps_per_year() -> u32 {
    24
}

fn default_spot_bump() -> f64 {
    0.05
}

fn default_true() -> bool {
    true
}

fn default_max_spread() -> f64 {
    1.0
}

fn default_parallel_threshold() -> usize {
    64
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            solver: SolverSettings::default(),
            yield_bracket: default_yield_bracket(),
            spread_bracket: default_spread_bracket(),
            lattice: LatticeSettings::default(),
            cds: CdsSettings::default(),
            parallel: ParallelSettings::default(),
        }
    }
}

impl PricingConfig {
    /// Coarse lattices and looser tolerances for screening.
    #[must_use]
    pub fn fast() -> Self {
        Self {
            solver: SolverSettings {
                tolerance: 1e-8,
                max_iterations: 60,
            },
            lattice: LatticeSettings {
                steps_per_year: 24,
                convertible_steps_per_year: 12,
                ..LatticeSettings::default()
            },
            ..Self::default()
        }
    }

    /// Fine lattices and tight tolerances.
    #[must_use]
    pub fn accurate() -> Self {
        Self {
            solver: SolverSettings {
                tolerance: 1e-12,
                max_iterations: 200,
            },
            lattice: LatticeSettings {
                steps_per_year: 120,
                convertible_steps_per_year: 52,
                ..LatticeSettings::default()
            },
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Solver configuration for `tenor_math`.
    #[must_use]
    pub fn solver_config(&self) -> SolverConfig {
        self.solver.solver_config()
    }

    /// Checks every field is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version > CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: CONFIG_VERSION,
            });
        }
        let tolerance = self.solver.tolerance;
        if !(tolerance > 0.0 && tolerance <= 1e-4) {
            return Err(ConfigError::invalid("solver.tolerance", "must be in (0, 1e-4]"));
        }
        if self.solver.max_iterations == 0 || self.solver.max_iterations > 10_000 {
            return Err(ConfigError::invalid("solver.max_iterations", "must be in [1, 10000]"));
        }
        for (field, bracket) in [
            ("yield_bracket", self.yield_bracket),
            ("spread_bracket", self.spread_bracket),
        ] {
            if !(bracket.lower.is_finite() && bracket.upper.is_finite() && bracket.lower < bracket.upper) {
                return Err(ConfigError::invalid(field, "needs finite lower < upper"));
            }
        }
        if self.yield_bracket.lower <= -1.0 {
            return Err(ConfigError::invalid("yield_bracket.lower", "must be above -100%"));
        }
        for (field, steps) in [
            ("lattice.steps_per_year", self.lattice.steps_per_year),
            ("lattice.convertible_steps_per_year", self.lattice.convertible_steps_per_year),
        ] {
            if steps == 0 || steps > 365 {
                return Err(ConfigError::invalid(field, "must be in [1, 365]"));
            }
        }
        let bump = self.lattice.spot_bump;
        if !(bump > 0.0 && bump < 0.5) {
            return Err(ConfigError::invalid("lattice.spot_bump", "must be in (0, 0.5)"));
        }
        if !(self.cds.max_spread > 0.0 && self.cds.max_spread.is_finite()) {
            return Err(ConfigError::invalid("cds.max_spread", "must be positive"));
        }
        if self.parallel.threshold == 0 {
            return Err(ConfigError::invalid("parallel.threshold", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for config in [PricingConfig::default(), PricingConfig::fast(), PricingConfig::accurate()] {
            assert!(config.validate().is_ok());
        }
        assert!(PricingConfig::fast().lattice.steps_per_year < PricingConfig::accurate().lattice.steps_per_year);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(PricingConfig::from_toml_str("").unwrap(), PricingConfig::default());
    }

    #[test]
    fn toml_round_trip() {
        let config = PricingConfig::accurate();
        let text = config.to_toml_string().unwrap();
        assert_eq!(PricingConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn json_partial_document() {
        let config = PricingConfig::from_json_str(r#"{"parallel": {"threshold": 8}}"#).unwrap();
        assert_eq!(config.parallel.threshold, 8);
        assert!(config.parallel.enabled);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = PricingConfig::default();
        config.lattice.steps_per_year = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let err = PricingConfig::from_toml_str("[solver]\ntolerance = 0.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = PricingConfig::from_toml_str("version = 99").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { found: 99, .. }));

        assert!(matches!(PricingConfig::from_toml_str("solver = 3"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn parallel_threshold() {
        let settings = ParallelSettings { enabled: true, threshold: 10 };
        assert!(!settings.should_parallelize(9));
        assert!(settings.should_parallelize(10));
        assert!(!ParallelSettings::sequential().should_parallelize(1_000));
    }
}
