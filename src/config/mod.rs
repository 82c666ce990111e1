//! Configuration system with YAML schema and validation.
//!
//! Implements Poka-Yoke (mistake-proofing) through:
//! - Type-safe configuration structs
//! - Compile-time validation via serde
//! - Runtime semantic validation
//!
//! Two documents live here: [`AnalysisConfig`], the numeric policy shared by
//! every engine (tolerances and iteration caps), and [`ScenarioFile`], a batch
//! of named M/M/c/K and D/D/1/K analyses for the `run` command.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use validator::Validate;

use crate::domains::fraction::parse_rate;
use crate::error::{QueueError, QueueResult};
use crate::jidoka::JidokaConfig;

/// Numeric policy for all analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Continued-fraction expansion settings.
    #[validate(nested)]
    #[serde(default)]
    pub fraction: FractionConfig,

    /// M/M/c/K state-space limit.
    #[validate(nested)]
    #[serde(default)]
    pub mmck: MmckConfig,

    /// D/D/1/K search caps and graph horizon.
    #[validate(nested)]
    #[serde(default)]
    pub dd1k: Dd1kConfig,

    /// Output guards.
    #[validate(nested)]
    #[serde(default)]
    pub jidoka: JidokaConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fraction: FractionConfig::default(),
            mmck: MmckConfig::default(),
            dd1k: Dd1kConfig::default(),
            jidoka: JidokaConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> QueueResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> QueueResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        config.validate_semantic()?;
        Ok(config)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> QueueResult<()> {
        if !self.fraction.tolerance.is_finite() {
            return Err(QueueError::config("Fraction tolerance must be finite"));
        }
        if self.dd1k.horizon_floor == 0 && self.dd1k.horizon_interarrivals == 0 {
            return Err(QueueError::config(
                "Graph horizon needs a positive floor or at least one interarrival time",
            ));
        }
        Ok(())
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    fraction_tolerance: Option<f64>,
    fraction_max_iterations: Option<usize>,
    max_states: Option<u32>,
    max_transient_steps: Option<u64>,
    max_trace_events: Option<u64>,
    horizon_floor: Option<u64>,
    horizon_interarrivals: Option<u64>,
    jidoka: Option<JidokaConfig>,
}

impl AnalysisConfigBuilder {
    /// Set the relative tolerance of the continued-fraction expansion.
    #[must_use]
    pub const fn fraction_tolerance(mut self, tolerance: f64) -> Self {
        self.fraction_tolerance = Some(tolerance);
        self
    }

    /// Set the continued-fraction depth cap.
    #[must_use]
    pub const fn fraction_max_iterations(mut self, iterations: usize) -> Self {
        self.fraction_max_iterations = Some(iterations);
        self
    }

    /// Set the largest M/M/c/K state space (`K`, or `c` when unbounded).
    #[must_use]
    pub const fn max_states(mut self, states: u32) -> Self {
        self.max_states = Some(states);
        self
    }

    /// Set the cap on D/D/1/K trace events and customer waits.
    #[must_use]
    pub const fn max_trace_events(mut self, events: u64) -> Self {
        self.max_trace_events = Some(events);
        self
    }

    /// Set the cap on the D/D/1/K transient-time search.
    #[must_use]
    pub const fn max_transient_steps(mut self, steps: u64) -> Self {
        self.max_transient_steps = Some(steps);
        self
    }

    /// Set the minimum graph horizon.
    #[must_use]
    pub const fn horizon_floor(mut self, floor: u64) -> Self {
        self.horizon_floor = Some(floor);
        self
    }

    /// Set how many interarrival times the graph extends past `t_i`.
    #[must_use]
    pub const fn horizon_interarrivals(mut self, count: u64) -> Self {
        self.horizon_interarrivals = Some(count);
        self
    }

    /// Set Jidoka configuration.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JidokaConfig isn't const-constructible here
    pub fn jidoka(mut self, config: JidokaConfig) -> Self {
        self.jidoka = Some(config);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();

        if let Some(tolerance) = self.fraction_tolerance {
            config.fraction.tolerance = tolerance;
        }
        if let Some(iterations) = self.fraction_max_iterations {
            config.fraction.max_iterations = iterations;
        }
        if let Some(states) = self.max_states {
            config.mmck.max_states = states;
        }
        if let Some(events) = self.max_trace_events {
            config.dd1k.max_trace_events = events;
        }
        if let Some(steps) = self.max_transient_steps {
            config.dd1k.max_transient_steps = steps;
        }
        if let Some(floor) = self.horizon_floor {
            config.dd1k.horizon_floor = floor;
        }
        if let Some(count) = self.horizon_interarrivals {
            config.dd1k.horizon_interarrivals = count;
        }
        if let Some(jidoka) = self.jidoka {
            config.jidoka = jidoka;
        }

        config
    }
}

/// Continued-fraction expansion settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct FractionConfig {
    /// Relative tolerance `|x - p/q| <= |x| * tolerance`.
    #[validate(range(min = 1e-15, max = 0.1))]
    #[serde(default = "default_fraction_tolerance")]
    pub tolerance: f64,
    /// Maximum number of convergents computed.
    #[validate(range(min = 1, max = 1000))]
    #[serde(default = "default_fraction_iterations")]
    pub max_iterations: usize,
}

const fn default_fraction_tolerance() -> f64 {
    1.0e-6
}

const fn default_fraction_iterations() -> usize {
    64
}

impl Default for FractionConfig {
    fn default() -> Self {
        Self {
            tolerance: default_fraction_tolerance(),
            max_iterations: default_fraction_iterations(),
        }
    }
}

/// M/M/c/K state-space limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MmckConfig {
    /// Largest `K` accepted, and largest `c` when `K` is infinite.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_states")]
    pub max_states: u32,
}

const fn default_max_states() -> u32 {
    100_000
}

impl Default for MmckConfig {
    fn default() -> Self {
        Self {
            max_states: default_max_states(),
        }
    }
}

/// D/D/1/K search caps and graph horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Dd1kConfig {
    /// Cap on the number of candidate instants tried when searching `t_i`.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_transient_steps")]
    pub max_transient_steps: u64,
    /// Cap on trace records and on customer waiting-time entries.
    #[validate(range(min = 1))]
    #[serde(default = "default_max_trace_events")]
    pub max_trace_events: u64,
    /// The graph horizon is never shorter than this.
    #[serde(default = "default_horizon_floor")]
    pub horizon_floor: u64,
    /// Interarrival times shown after `t_i`.
    #[serde(default = "default_horizon_interarrivals")]
    pub horizon_interarrivals: u64,
}

const fn default_max_transient_steps() -> u64 {
    1_000_000
}

const fn default_max_trace_events() -> u64 {
    1_000_000
}

const fn default_horizon_floor() -> u64 {
    10
}

const fn default_horizon_interarrivals() -> u64 {
    5
}

impl Default for Dd1kConfig {
    fn default() -> Self {
        Self {
            max_transient_steps: default_max_transient_steps(),
            max_trace_events: default_max_trace_events(),
            horizon_floor: default_horizon_floor(),
            horizon_interarrivals: default_horizon_interarrivals(),
        }
    }
}

/// A rate written either as a number or as a ratio string (`"1/6"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateSpec {
    /// Plain number.
    Number(f64),
    /// Ratio or decimal text.
    Text(String),
}

impl RateSpec {
    /// Evaluate the rate.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error for `parameter` if the text is not a
    /// number or ratio.
    pub fn value(&self, parameter: &str) -> QueueResult<f64> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Text(text) => parse_rate(parameter, text),
        }
    }
}

impl From<f64> for RateSpec {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Model-specific inputs of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum ScenarioModel {
    /// M/M/c/K steady state.
    Mmck {
        /// Service rate μ per server.
        service_rate: RateSpec,
        /// Arrival rate λ.
        arrival_rate: RateSpec,
        /// Number of servers c.
        servers: u32,
        /// System capacity K (absent = infinite).
        #[serde(default)]
        capacity: Option<u32>,
    },
    /// D/D/1/K deterministic queue.
    Dd1k {
        /// Arrival rate λ.
        arrival_rate: RateSpec,
        /// Service rate μ.
        service_rate: RateSpec,
        /// Capacity K.
        capacity: u64,
        /// Initial customers M (required when λ < μ).
        #[serde(default)]
        initial_customers: Option<u64>,
    },
}

/// One named analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Model and its inputs.
    #[serde(flatten)]
    pub model: ScenarioModel,
}

/// A batch of scenarios loaded from YAML.
///
/// ```yaml
/// schema_version: "1.0"
/// config:
///   dd1k:
///     horizon_floor: 20
/// scenarios:
///   - name: bank teller
///     model: mmck
///     service_rate: 60
///     arrival_rate: 50
///     servers: 1
///   - name: draining line
///     model: dd1k
///     arrival_rate: "1/3"
///     service_rate: 1
///     capacity: 4
///     initial_customers: 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Numeric policy applied to every scenario.
    #[validate(nested)]
    #[serde(default)]
    pub config: AnalysisConfig,

    /// Analyses to run, in order.
    #[validate(length(min = 1))]
    pub scenarios: Vec<Scenario>,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl ScenarioFile {
    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed, or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> QueueResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a scenario file from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> QueueResult<Self> {
        let file: Self = serde_yaml::from_str(yaml)?;
        file.validate()?;
        file.config.validate_semantic()?;
        file.validate_names()?;
        Ok(file)
    }

    /// Named scenarios must be unique so results can be told apart.
    fn validate_names(&self) -> QueueResult<()> {
        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !scenario.name.is_empty() && !seen.insert(scenario.name.as_str()) {
                return Err(QueueError::config(format!(
                    "Duplicate scenario name '{}'",
                    scenario.name
                )));
            }
        }
        Ok(())
    }
}
