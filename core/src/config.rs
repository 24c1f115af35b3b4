use crate::month::CalendarMonth;
use serde::{Deserialize, Serialize};

/// What to do when an account was active in the baseline month but
/// retained nobody, so its baseline rate is exactly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroBaselinePolicy {
    /// Report a ratio of 0.
    #[default]
    Zero,
    /// Fail the run naming the account.
    Error,
}

// ── Synthetic event generator ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub accounts:              usize,
    pub users_per_account:     usize,
    pub start_month:           CalendarMonth,
    pub months:                u32,
    pub events_per_user_month: u32,
    /// Chance a user is active at all in a given month.
    pub activity_probability:  f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            accounts:              20,
            users_per_account:     25,
            start_month:           CalendarMonth::new(2020, 10).expect("static month"),
            months:                6,
            events_per_user_month: 3,
            activity_probability:  0.6,
        }
    }
}

// ── Top level ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub baseline_month:       CalendarMonth,
    pub comparison_month:     CalendarMonth,
    #[serde(default)]
    pub zero_baseline_policy: ZeroBaselinePolicy,
    #[serde(default)]
    pub generator:            GeneratorConfig,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            baseline_month:       CalendarMonth::new(2020, 12).expect("static month"),
            comparison_month:     CalendarMonth::new(2021, 1).expect("static month"),
            zero_baseline_policy: ZeroBaselinePolicy::Zero,
            generator:            GeneratorConfig::default(),
        }
    }
}

impl RetentionConfig {
    /// Load from the data/ directory.
    /// In tests, use RetentionConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/retention.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RetentionConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        if config.comparison_month <= config.baseline_month {
            log::warn!(
                "config: comparison month {} is not after baseline month {}",
                config.comparison_month,
                config.baseline_month
            );
        }
        Ok(config)
    }

    /// Load from `data_dir` if it has a retention.json, otherwise use defaults.
    pub fn load_or_default(data_dir: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(&format!("{data_dir}/retention.json")).exists() {
            Self::load(data_dir)
        } else {
            log::info!("config: no retention.json in {data_dir}, using defaults");
            Ok(Self::default())
        }
    }

    /// Small, fast configuration for tests.
    pub fn default_test() -> Self {
        Self {
            generator: GeneratorConfig {
                accounts:              4,
                users_per_account:     6,
                start_month:           CalendarMonth::new(2020, 11).expect("static month"),
                months:                4,
                events_per_user_month: 2,
                activity_probability:  0.7,
            },
            ..Self::default()
        }
    }
}
