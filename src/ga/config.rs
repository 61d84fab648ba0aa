//! Serializable GA settings.
//!
//! [`GaSettings`] is the JSON-facing section of the solver configuration.
//! It is turned into a [`u_metaheur::ga::GaConfig`] for each run, with the
//! run seed and remaining time filled in.

use serde::{Deserialize, Serialize};
use u_metaheur::ga::{GaConfig, Selection};

use crate::error::ConfigError;

/// Genetic search settings.
///
/// Defaults and presets come from the `u-metaheur` presets; only the
/// seed-perturbation share of the initial population is specific to bus
/// routing.
///
/// ```
/// use u_busroute::ga::GaSettings;
///
/// let settings = GaSettings::default().with_population_size(80);
/// assert_eq!(settings.tournament_size, 3);
/// assert!(settings.validate().is_ok());
///
/// let config = settings.runner_config(7, None);
/// assert_eq!(config.population_size, 80);
/// assert_eq!(config.seed, Some(7));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaSettings {
    pub population_size: usize,
    pub max_generations: usize,
    /// Individuals drawn per tournament.
    pub tournament_size: usize,
    /// Share of each generation copied unchanged from the best of the last.
    pub elite_ratio: f64,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    /// Generations without improvement before stopping; 0 disables.
    pub stagnation_limit: usize,
    /// Score offspring on the rayon pool.
    pub parallel: bool,
    /// Share of the initial population built by perturbing the seed; the
    /// rest comes from randomized insertion builds.
    pub perturbed_fraction: f64,
}

impl From<&GaConfig> for GaSettings {
    fn from(config: &GaConfig) -> Self {
        let tournament_size = match config.selection {
            Selection::Tournament(k) => k,
            _ => 3,
        };
        Self {
            population_size: config.population_size,
            max_generations: config.max_generations,
            tournament_size,
            elite_ratio: config.elite_ratio,
            crossover_rate: config.crossover_rate,
            mutation_rate: config.mutation_rate,
            stagnation_limit: config.stagnation_limit,
            parallel: config.parallel,
            perturbed_fraction: 0.5,
        }
    }
}

impl Default for GaSettings {
    fn default() -> Self {
        Self::from(&GaConfig::fast())
    }
}

impl GaSettings {
    /// Small population with an early plateau exit.
    pub fn fast() -> Self {
        Self::from(&GaConfig::fast())
    }

    /// Larger population for offline planning.
    pub fn balanced() -> Self {
        Self::from(&GaConfig::balanced())
    }

    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_perturbed_fraction(mut self, fraction: f64) -> Self {
        self.perturbed_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    /// Number of perturbed seeds in an initial population.
    pub(crate) fn perturbed_count(&self) -> usize {
        (self.population_size.saturating_sub(1) as f64 * self.perturbed_fraction).round() as usize
    }

    /// Runner configuration for one run.
    ///
    /// `time_limit` is clamped to at least one millisecond.
    pub fn runner_config(&self, seed: u64, time_limit: Option<std::time::Duration>) -> GaConfig {
        let mut config = GaConfig::default()
            .with_population_size(self.population_size)
            .with_max_generations(self.max_generations)
            .with_tournament_size(self.tournament_size)
            .with_elite_ratio(self.elite_ratio)
            .with_crossover_rate(self.crossover_rate)
            .with_mutation_rate(self.mutation_rate)
            .with_stagnation_limit(self.stagnation_limit)
            .with_parallel(self.parallel)
            .with_seed(seed);
        if let Some(limit) = time_limit {
            let ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX).max(1);
            config = config.with_time_limit_ms(ms);
        }
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tournament_size == 0 {
            return Err(ConfigError::invalid("tournament_size", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.perturbed_fraction) {
            return Err(ConfigError::invalid(
                "perturbed_fraction",
                format!("must be in [0, 1], got {}", self.perturbed_fraction),
            ));
        }
        self.runner_config(0, None)
            .validate()
            .map_err(|reason| ConfigError::invalid("ga", reason))
    }
}
