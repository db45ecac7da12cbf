use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::companion::ResetPolicy;
use crate::core::{MapleError, Mood, PersonalityTraits, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub companion: CompanionConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub reset_policy: ResetPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionConfig {
    pub name: String,
    pub avatar: String,
    pub initial_mood: Mood,
    pub initial_energy: u8,
    pub personality: PersonalityTraits,
}

/// Delays in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub reply_delay_min: f64,
    pub reply_delay_max: f64,
    pub animation_reset: f64,
    pub speech_latency: f64,
    pub login_latency: f64,
}

const MAX_EVENT_CAPACITY: usize = 65_536;

fn default_event_capacity() -> usize {
    64
}

impl Default for CompanionConfig {
    fn default() -> Self {
        CompanionConfig {
            name: "Maple".to_string(),
            avatar: "robot".to_string(),
            initial_mood: Mood::Happy,
            initial_energy: 85,
            personality: PersonalityTraits::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            reply_delay_min: 1.0,
            reply_delay_max: 2.5,
            animation_reset: 2.0,
            speech_latency: 2.0,
            login_latency: 0.5,
        }
    }
}

impl TimingConfig {
    pub fn reply_delay_bounds(&self) -> (f64, f64) {
        (self.reply_delay_min, self.reply_delay_max)
    }

    pub fn animation_reset(&self) -> Duration {
        Duration::from_secs_f64(self.animation_reset)
    }

    pub fn speech_latency(&self) -> Duration {
        Duration::from_secs_f64(self.speech_latency)
    }

    pub fn login_latency(&self) -> Duration {
        Duration::from_secs_f64(self.login_latency)
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("reply_delay_min", self.reply_delay_min),
            ("reply_delay_max", self.reply_delay_max),
            ("animation_reset", self.animation_reset),
            ("speech_latency", self.speech_latency),
            ("login_latency", self.login_latency),
        ];
        for (name, value) in fields {
            // Also bounded so Duration::from_secs_f64 cannot panic.
            if !value.is_finite() || value < 0.0 || value > 86_400.0 {
                return Err(MapleError::Config(format!(
                    "timing.{} must be between 0 and 86400 seconds, got {}",
                    name, value
                )));
            }
        }
        if self.reply_delay_min > self.reply_delay_max {
            return Err(MapleError::Config(format!(
                "timing.reply_delay_min ({}) is greater than reply_delay_max ({})",
                self.reply_delay_min, self.reply_delay_max
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::new(),
            companion: CompanionConfig::default(),
            timing: TimingConfig::default(),
            reset_policy: ResetPolicy::default(),
            rng_seed: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl Config {
    /// Loads `config.json` from `data_dir` (or the default location).
    /// A missing or empty file yields the defaults; nothing is written.
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => Self::default_data_dir()?,
        };
        let config_path = data_dir.join("config.json");

        if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)?;
            if config_str.trim().is_empty() {
                warn!(path = %config_path.display(), "Config file is empty, using defaults");
            } else {
                let mut config: Config = serde_json::from_str(&config_str)?;
                config.data_dir = data_dir;
                config.validate()?;
                debug!(path = %config_path.display(), "Loaded config");
                return Ok(config);
            }
        }

        Ok(Config {
            data_dir,
            ..Config::default()
        })
    }

    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("maple"))
            .ok_or(MapleError::NoConfigDir)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn save(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.data_dir)?;
        let config_path = self.config_path();
        let json_str = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, json_str)?;
        Ok(config_path)
    }

    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        if self.companion.initial_energy > 100 {
            return Err(MapleError::Config(format!(
                "companion.initial_energy must be at most 100, got {}",
                self.companion.initial_energy
            )));
        }
        if !self.companion.personality.is_within_bounds() {
            return Err(MapleError::Config(
                "companion.personality traits must be within 0.0..=1.0".to_string(),
            ));
        }
        if self.companion.name.trim().is_empty() {
            return Err(MapleError::Config("companion.name must not be empty".to_string()));
        }
        if self.event_capacity == 0 || self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(MapleError::Config(format!(
                "event_capacity must be between 1 and {}, got {}",
                MAX_EVENT_CAPACITY, self.event_capacity
            )));
        }
        Ok(())
    }
}
