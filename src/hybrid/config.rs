//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::evaluation::FitnessWeights;
use crate::explain::ExplainConfig;
use crate::ga::GaSettings;
use crate::rl::RefinerConfig;

/// Every tunable of a run, grouped by phase.
///
/// Deserializes from partial JSON: omitted fields keep their defaults.
///
/// # Examples
///
/// ```
/// use u_busroute::hybrid::SolverConfig;
///
/// let config = SolverConfig::from_json_str(r#"{"ga": {"population_size": 24}, "seed": 9}"#).unwrap();
/// assert_eq!(config.ga.population_size, 24);
/// assert_eq!(config.ga.tournament_size, 3);
/// assert_eq!(config.seed, Some(9));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Genetic search.
    pub ga: GaSettings,
    /// Learned refinement.
    pub refiner: RefinerConfig,
    /// Fitness weights.
    pub weights: FitnessWeights,
    /// Explanation defaults.
    pub explain: ExplainConfig,
    /// Share of the time budget the genetic search may use when the
    /// refiner runs after it.
    pub ga_budget_share: f64,
    /// Seed used when the request gives none; fresh entropy when unset.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            ga: GaSettings::default(),
            refiner: RefinerConfig::default(),
            weights: FitnessWeights::default(),
            explain: ExplainConfig::default(),
            ga_budget_share: 0.8,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Interactive preset.
    pub fn fast() -> Self {
        Self {
            ga: GaSettings::fast(),
            refiner: RefinerConfig::default().with_max_steps(100),
            ..Self::default()
        }
    }

    /// Quality preset.
    pub fn balanced() -> Self {
        Self {
            ga: GaSettings::balanced(),
            refiner: RefinerConfig::default().with_max_steps(400),
            ..Self::default()
        }
    }

    /// Sets the GA configuration.
    pub fn with_ga(mut self, ga: GaSettings) -> Self {
        self.ga = ga;
        self
    }

    /// Sets the refiner configuration.
    pub fn with_refiner(mut self, refiner: RefinerConfig) -> Self {
        self.refiner = refiner;
        self
    }

    /// Sets the fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the explanation defaults.
    pub fn with_explain(mut self, explain: ExplainConfig) -> Self {
        self.explain = explain;
        self
    }

    /// Sets the default seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parses a (possibly partial) JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ga.validate()?;
        self.refiner.validate()?;
        self.weights.validate()?;
        self.explain.validate()?;
        if !(self.ga_budget_share > 0.0 && self.ga_budget_share <= 1.0) {
            return Err(ConfigError::invalid(
                "ga_budget_share",
                format!("must be in (0, 1], got {}", self.ga_budget_share),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_valid() {
        assert!(SolverConfig::default().validate().is_ok());
        assert!(SolverConfig::fast().validate().is_ok());
        assert!(SolverConfig::balanced().validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            SolverConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_section_rejected() {
        let err = SolverConfig::from_json_str(r#"{"ga": {"population_size": 1}}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "ga", .. }
        ));
        let err = SolverConfig::from_json_str(r#"{"ga_budget_share": 0.0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "ga_budget_share",
                ..
            }
        ));
    }
}
