//! Configuration file management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use veil_disclosure::{ScoringConfig, TierThresholds};
use veil_quiz::QuizConfig;
use veil_types::{
    DEFAULT_ALPHA, DEFAULT_BETA, DEFAULT_ENTRY_COST, DEFAULT_MAX_STARTS_PER_HOUR,
    DEFAULT_TIER_THRESHOLDS, DEFAULT_WRONG_PENALTY, RATE_LIMIT_WINDOW_SECS,
};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub affinity: AffinityConfig,
    #[serde(default)]
    pub tiers: TierConfig,
    #[serde(default)]
    pub quiz: QuizLimits,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Currency amounts charged by the quiz flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default = "default_entry_cost")]
    pub entry_cost: u64,
    #[serde(default = "default_wrong_penalty")]
    pub wrong_penalty: u64,
}

/// Affinity weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffinityConfig {
    #[serde(default = "default_alpha")]
    pub alpha: u64,
    #[serde(default = "default_beta")]
    pub beta: u64,
}

/// Visibility tier thresholds. Must be strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    #[serde(default = "default_t1")]
    pub t1: u64,
    #[serde(default = "default_t2")]
    pub t2: u64,
    #[serde(default = "default_t3")]
    pub t3: u64,
}

/// Quiz start rate limiting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizLimits {
    /// Starts allowed per (asker, target) pair per rolling hour.
    #[serde(default = "default_max_starts")]
    pub max_starts_per_hour: u32,
}

/// Read-model cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Leaderboard freshness window in seconds.
    #[serde(default = "default_ranking_ttl")]
    pub ranking_ttl_secs: u64,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log file path. Empty = stderr.
    #[serde(default)]
    pub log_file: String,
}

// Default value functions

fn default_entry_cost() -> u64 {
    DEFAULT_ENTRY_COST
}

fn default_wrong_penalty() -> u64 {
    DEFAULT_WRONG_PENALTY
}

fn default_alpha() -> u64 {
    DEFAULT_ALPHA
}

fn default_beta() -> u64 {
    DEFAULT_BETA
}

fn default_t1() -> u64 {
    DEFAULT_TIER_THRESHOLDS[0]
}

fn default_t2() -> u64 {
    DEFAULT_TIER_THRESHOLDS[1]
}

fn default_t3() -> u64 {
    DEFAULT_TIER_THRESHOLDS[2]
}

fn default_max_starts() -> u32 {
    DEFAULT_MAX_STARTS_PER_HOUR
}

fn default_ranking_ttl() -> u64 {
    veil_skill::DEFAULT_RANKING_TTL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            entry_cost: default_entry_cost(),
            wrong_penalty: default_wrong_penalty(),
        }
    }
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            beta: default_beta(),
        }
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            t1: default_t1(),
            t2: default_t2(),
            t3: default_t3(),
        }
    }
}

impl Default for QuizLimits {
    fn default() -> Self {
        Self {
            max_starts_per_hour: default_max_starts(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ranking_ttl_secs: default_ranking_ttl(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: String::new(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist. Tier thresholds are
    /// validated here so a bad file stops the daemon at startup.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<DaemonConfig>(&content)?
        } else {
            Self::default()
        };
        config.tier_thresholds()?;
        Ok(config)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    pub fn quiz_config(&self) -> QuizConfig {
        QuizConfig {
            entry_cost: self.economy.entry_cost,
            max_starts_per_window: self.quiz.max_starts_per_hour,
            window_secs: RATE_LIMIT_WINDOW_SECS,
        }
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig {
            alpha: self.affinity.alpha,
            beta: self.affinity.beta,
            wrong_penalty: self.economy.wrong_penalty,
        }
    }

    pub fn tier_thresholds(&self) -> veil_disclosure::Result<TierThresholds> {
        TierThresholds::new(self.tiers.t1, self.tiers.t2, self.tiers.t3)
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("VEIL_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/Veil")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".veil")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/veil"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.economy.entry_cost, 1);
        assert_eq!(config.economy.wrong_penalty, 1);
        assert_eq!(config.affinity.alpha, 3);
        assert_eq!(config.affinity.beta, 1);
        assert_eq!(config.quiz.max_starts_per_hour, 10);
        assert_eq!(config.cache.ranking_ttl_secs, 60);
        assert!(config.tier_thresholds().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let _parsed: DaemonConfig = toml::from_str(&toml_str).expect("parse");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: DaemonConfig = toml::from_str(
            "[economy]\nentry_cost = 5\n\n[tiers]\nt1 = 10\n",
        )
        .expect("parse");
        assert_eq!(config.economy.entry_cost, 5);
        assert_eq!(config.economy.wrong_penalty, 1);
        assert_eq!(config.tiers.t1, 10);
        assert_eq!(config.tiers.t2, 40);
        assert_eq!(config.quiz_config().entry_cost, 5);
    }

    #[test]
    fn test_bad_thresholds_rejected() {
        let config: DaemonConfig =
            toml::from_str("[tiers]\nt1 = 50\nt2 = 40\nt3 = 60\n").expect("parse");
        assert!(config.tier_thresholds().is_err());
    }
}
