use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use log::info;
use serde::{Deserialize, Serialize};

/// Environment variable prefix, e.g. `AR_TRAINER_SESSION__DEFAULT_SOLVE_SECS=45`
pub const ENV_PREFIX: &str = "AR_TRAINER";

/// Path of the optional TOML file; kept outside `ENV_PREFIX` so it is not read as a setting
pub const CONFIG_PATH_ENV: &str = "TRAINER_CONFIG_PATH";

/// Trainer configuration: compiled defaults, then an optional TOML file, then environment overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerConfig {
    pub session: SessionSettings,
    pub captions: CaptionSettings,
    pub narration: NarrationSettings,
}

/// Timing knobs of the adaptive session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub default_solve_secs: u32,
    pub narration_words_per_second: f64,
    pub narration_failsafe_padding_ms: u64,
    pub caption_clear_delay_ms: u64,
    pub feedback_display_delay_ms: u64,
    pub report_timeout_secs: u64,
    pub expected_questions: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_solve_secs: 30,
            narration_words_per_second: 2.1,
            narration_failsafe_padding_ms: 2500,
            caption_clear_delay_ms: 1200,
            feedback_display_delay_ms: 2200,
            report_timeout_secs: 30,
            expected_questions: 5,
        }
    }
}

impl SessionSettings {
    /// Failsafe deadline for a narration script: `words / wps` seconds plus the padding
    pub fn narration_failsafe(&self, word_count: usize) -> Duration {
        let wps = if self.narration_words_per_second > 0.0 {
            self.narration_words_per_second
        } else {
            Self::default().narration_words_per_second
        };
        let speech_ms = (word_count as f64 * 1000.0 / wps).round() as u64;
        Duration::from_millis(speech_ms + self.narration_failsafe_padding_ms)
    }

    pub fn caption_clear_delay(&self) -> Duration {
        Duration::from_millis(self.caption_clear_delay_ms)
    }

    pub fn feedback_display_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_display_delay_ms)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }

    /// Timer length for a question; zero means the question did not specify one
    pub fn solve_secs_for(&self, expected_solve_time: u32) -> u32 {
        if expected_solve_time == 0 {
            self.default_solve_secs.max(1)
        } else {
            expected_solve_time
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptionSettings {
    pub max_words_per_segment: usize,
    pub retained_segments: usize,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            max_words_per_segment: 8,
            retained_segments: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NarrationSettings {
    /// Pace of the simulated narrator
    pub words_per_second: f64,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            words_per_second: 2.4,
        }
    }
}

impl TrainerConfig {
    /// Load configuration from an optional TOML file plus `AR_TRAINER_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading trainer config from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let config: TrainerConfig = builder
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        info!(
            "Trainer config: solve={}s, failsafe wps={}, display delay={}ms, captions={}x{}",
            config.session.default_solve_secs,
            config.session.narration_words_per_second,
            config.session.feedback_display_delay_ms,
            config.captions.retained_segments,
            config.captions.max_words_per_segment
        );
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

/// Config file named by `TRAINER_CONFIG_PATH`, if set
pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var_os(CONFIG_PATH_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
