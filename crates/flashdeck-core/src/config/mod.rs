//! Configuration system for flashdeck.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{FlashdeckError, FlashdeckResult};

/// Tunable parameters of the scheduling engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Successful reviews needed to graduate from Learning to Review.
    pub learning_steps: u32,
    /// Successful reviews needed to graduate from Relearning back to Review.
    pub relearning_steps: u32,
    /// Stability assigned to a never-reviewed card (days).
    pub initial_stability: f32,
    /// Difficulty assigned to a never-reviewed card.
    pub initial_difficulty: f32,
    /// Lower difficulty bound.
    pub min_difficulty: f32,
    /// Upper difficulty bound.
    pub max_difficulty: f32,
    /// Value Good reviews pull difficulty toward.
    pub neutral_difficulty: f32,
    /// Difficulty change for Again/Hard (up) and Easy (down).
    pub difficulty_step: f32,
    /// Fraction of the distance to `neutral_difficulty` covered by a Good review.
    pub mean_reversion: f32,
    /// Stability multiplier applied on a lapse.
    pub lapse_penalty: f32,
    /// Stability never drops below this.
    pub min_stability: f32,
    /// Elapsed days assumed for a card's first review.
    pub seed_elapsed_days: f32,
    /// Delay before a failed card comes back (minutes).
    pub again_delay_minutes: i64,
    /// Interval used while still stepping through (re)learning (days).
    pub learning_interval_days: i64,
    /// Longest interval ever scheduled (days).
    pub maximum_interval_days: i64,
    /// Stability gain for Hard.
    pub hard_gain: f32,
    /// Stability gain for Good.
    pub good_gain: f32,
    /// Stability gain for Easy.
    pub easy_gain: f32,
    /// Forgetting curve decay used for retrievability.
    pub decay: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            learning_steps: 2,
            relearning_steps: 1,
            initial_stability: 1.0,
            initial_difficulty: 5.0,
            min_difficulty: 1.0,
            max_difficulty: 10.0,
            neutral_difficulty: 5.0,
            difficulty_step: 0.5,
            mean_reversion: 0.1,
            lapse_penalty: 0.5,
            min_stability: 0.1,
            seed_elapsed_days: 1.0,
            again_delay_minutes: 10,
            learning_interval_days: 1,
            maximum_interval_days: 36_500,
            hard_gain: 0.2,
            good_gain: 0.6,
            easy_gain: 1.3,
            decay: fsrs::FSRS6_DEFAULT_DECAY,
        }
    }
}

impl SchedulerConfig {
    /// Reject parameter combinations that would break state invariants.
    pub fn validate(&self) -> FlashdeckResult<()> {
        fn invalid(message: &str) -> FlashdeckResult<()> {
            Err(FlashdeckError::Configuration(message.to_string()))
        }

        if self.learning_steps == 0 {
            return invalid("learning_steps must be at least 1");
        }
        if self.relearning_steps == 0 {
            return invalid("relearning_steps must be at least 1");
        }
        if !(self.min_difficulty > 0.0 && self.min_difficulty < self.max_difficulty) {
            return invalid("difficulty bounds must satisfy 0 < min_difficulty < max_difficulty");
        }
        if !(self.min_difficulty..=self.max_difficulty).contains(&self.neutral_difficulty) {
            return invalid("neutral_difficulty must lie within the difficulty bounds");
        }
        if !(self.min_difficulty..=self.max_difficulty).contains(&self.initial_difficulty) {
            return invalid("initial_difficulty must lie within the difficulty bounds");
        }
        if !(self.difficulty_step >= 0.0) {
            return invalid("difficulty_step must not be negative");
        }
        if !(0.0..=1.0).contains(&self.mean_reversion) {
            return invalid("mean_reversion must be within [0, 1]");
        }
        if !(self.lapse_penalty > 0.0 && self.lapse_penalty <= 1.0) {
            return invalid("lapse_penalty must be within (0, 1]");
        }
        if !(self.min_stability > 0.0) {
            return invalid("min_stability must be positive");
        }
        if !(self.initial_stability >= self.min_stability && self.initial_stability.is_finite()) {
            return invalid("initial_stability must be finite and at least min_stability");
        }
        if !(self.seed_elapsed_days >= 0.0) {
            return invalid("seed_elapsed_days must not be negative");
        }
        if self.again_delay_minutes < 0 {
            return invalid("again_delay_minutes must not be negative");
        }
        if self.learning_interval_days < 1 {
            return invalid("learning_interval_days must be at least 1");
        }
        if self.maximum_interval_days < self.learning_interval_days {
            return invalid("maximum_interval_days must be at least learning_interval_days");
        }
        if !(self.hard_gain > 0.0 && self.hard_gain < self.good_gain && self.good_gain < self.easy_gain) {
            return invalid("gains must satisfy 0 < hard_gain < good_gain < easy_gain");
        }
        if !(self.decay > 0.0) {
            return invalid("decay must be positive");
        }
        Ok(())
    }
}

/// Session planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Upper bound on cards per session, applied on top of the caller's limit.
    pub max_batch_size: usize,
    /// Optional cap on never-reviewed cards per session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_cards_per_session: Option<usize>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            new_cards_per_session: None,
        }
    }
}

impl PlannerConfig {
    /// Reject a batch size that could never yield a session.
    pub fn validate(&self) -> FlashdeckResult<()> {
        if self.max_batch_size == 0 {
            return Err(FlashdeckError::Configuration(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Main flashdeck configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashdeckConfig {
    /// Scheduling engine parameters.
    pub scheduler: SchedulerConfig,
    /// Session planner parameters.
    pub planner: PlannerConfig,
    /// Path to the SQLite database used by the bundled store.
    pub database_path: PathBuf,
}

impl Default for FlashdeckConfig {
    fn default() -> Self {
        let flashdeck_dir = dirs::home_dir()
            .map(|h| h.join(".flashdeck"))
            .unwrap_or_else(|| PathBuf::from(".flashdeck"));

        Self {
            scheduler: SchedulerConfig::default(),
            planner: PlannerConfig::default(),
            database_path: flashdeck_dir.join("flashdeck.db"),
        }
    }
}

impl FlashdeckConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> FlashdeckResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| FlashdeckError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| FlashdeckError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| FlashdeckError::Configuration(e.to_string()))?,
            _ => {
                return Err(FlashdeckError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("FLASHDECK_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(steps) = env_parse::<u32>("FLASHDECK_LEARNING_STEPS") {
            config.scheduler.learning_steps = steps;
        }
        if let Some(steps) = env_parse::<u32>("FLASHDECK_RELEARNING_STEPS") {
            config.scheduler.relearning_steps = steps;
        }
        if let Some(size) = env_parse::<usize>("FLASHDECK_MAX_BATCH_SIZE") {
            config.planner.max_batch_size = size;
        }
        if let Some(limit) = env_parse::<usize>("FLASHDECK_NEW_CARDS_PER_SESSION") {
            config.planner.new_cards_per_session = Some(limit);
        }

        config
    }

    /// Validate every section.
    pub fn validate(&self) -> FlashdeckResult<()> {
        self.scheduler.validate()?;
        self.planner.validate()
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> FlashdeckConfigBuilder {
        FlashdeckConfigBuilder::default()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}

/// Builder for FlashdeckConfig.
#[derive(Default)]
pub struct FlashdeckConfigBuilder {
    config: FlashdeckConfig,
}

impl FlashdeckConfigBuilder {
    /// Set scheduler configuration.
    pub fn scheduler(mut self, config: SchedulerConfig) -> Self {
        self.config.scheduler = config;
        self
    }

    /// Set planner configuration.
    pub fn planner(mut self, config: PlannerConfig) -> Self {
        self.config.planner = config;
        self
    }

    /// Set database path.
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    /// Set the learning step count.
    pub fn learning_steps(mut self, steps: u32) -> Self {
        self.config.scheduler.learning_steps = steps;
        self
    }

    /// Set the per-session batch cap.
    pub fn max_batch_size(mut self, size: usize) -> Self {
        self.config.planner.max_batch_size = size;
        self
    }

    /// Set the per-session new card cap.
    pub fn new_cards_per_session(mut self, limit: usize) -> Self {
        self.config.planner.new_cards_per_session = Some(limit);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> FlashdeckResult<FlashdeckConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = FlashdeckConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.learning_steps, 2);
        assert_eq!(config.scheduler.lapse_penalty, 0.5);
        assert!(config.database_path.ends_with("flashdeck.db"));
    }

    #[test]
    fn test_builder_sets_fields() {
        let config = FlashdeckConfig::builder()
            .learning_steps(3)
            .max_batch_size(20)
            .new_cards_per_session(5)
            .database_path("/tmp/decks.db")
            .build()
            .unwrap();

        assert_eq!(config.scheduler.learning_steps, 3);
        assert_eq!(config.planner.max_batch_size, 20);
        assert_eq!(config.planner.new_cards_per_session, Some(5));
        assert_eq!(config.database_path, PathBuf::from("/tmp/decks.db"));
    }

    #[test]
    fn test_builder_rejects_zero_learning_steps() {
        let err = FlashdeckConfig::builder().learning_steps(0).build().unwrap_err();
        assert!(matches!(err, FlashdeckError::Configuration(_)));
    }

    #[test]
    fn test_builder_rejects_empty_batch() {
        let err = FlashdeckConfig::builder().max_batch_size(0).build().unwrap_err();
        assert!(err.to_string().contains("max_batch_size"));
    }

    #[test]
    fn test_validate_rejects_unordered_gains() {
        let config = SchedulerConfig {
            good_gain: 2.0,
            easy_gain: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_lapse_penalty() {
        let config = SchedulerConfig {
            lapse_penalty: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SchedulerConfig {
            lapse_penalty: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_file_with_partial_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "database_path = \"/var/lib/flashdeck.db\"\n\n[scheduler]\nlearning_steps = 3\nlapse_penalty = 0.4\n\n[planner]\nmax_batch_size = 25"
        )
        .unwrap();

        let config = FlashdeckConfig::from_file(file.path()).unwrap();
        assert_eq!(config.scheduler.learning_steps, 3);
        assert_eq!(config.scheduler.lapse_penalty, 0.4);
        assert_eq!(config.scheduler.relearning_steps, 1);
        assert_eq!(config.planner.max_batch_size, 25);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/flashdeck.db"));
    }

    #[test]
    fn test_from_json_and_yaml_files() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"planner": {{"new_cards_per_session": 7}}}}"#).unwrap();
        let config = FlashdeckConfig::from_file(json.path()).unwrap();
        assert_eq!(config.planner.new_cards_per_session, Some(7));

        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "scheduler:\n  again_delay_minutes: 5").unwrap();
        let config = FlashdeckConfig::from_file(yaml.path()).unwrap();
        assert_eq!(config.scheduler.again_delay_minutes, 5);
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[scheduler]\nmin_stability = 0.0").unwrap();

        let err = FlashdeckConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, FlashdeckError::Configuration(_)));
    }

    #[test]
    fn test_from_file_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let err = FlashdeckConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }
}
