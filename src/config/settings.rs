use std::time::Duration;

/// Tunable constants of the controversy index
#[derive(Debug, Clone)]
pub struct ControversySettings {
    /// IQR / mean above which an item counts as bimodal
    pub bimodality_threshold: f64,
    /// Multiplier applied to the coefficient of variation for bimodal items
    pub bimodality_multiplier: f64,
    /// Means at or below this are treated as zero
    pub mean_epsilon: f64,
}

impl Default for ControversySettings {
    fn default() -> Self {
        Self {
            bimodality_threshold: 0.3,
            bimodality_multiplier: 1.5,
            mean_epsilon: 1e-9,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticsSettings {
    pub controversy: ControversySettings,
    pub conformity_min_shared_items: usize,
    pub comeback_min_gap_ratio: f64,
    pub consensus_limit: usize,
    pub conformity_limit: usize,
    pub user_match_limit: usize,
    pub min_valid_submissions: usize,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            controversy: ControversySettings::default(),
            conformity_min_shared_items: 5,
            comeback_min_gap_ratio: 0.3,
            consensus_limit: 10,
            conformity_limit: 10,
            user_match_limit: 5,
            min_valid_submissions: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub default_ttl: Duration,
    pub heavy_ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            heavy_ttl: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub analytics: AnalyticsSettings,
    pub cache: CacheSettings,
    pub scheduler: SchedulerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            database_path: "rankings.db".to_string(),
            analytics: AnalyticsSettings::default(),
            cache: CacheSettings::default(),
            scheduler: SchedulerSettings::default(),
        }
    }

    /// Defaults overlaid with `DATABASE_PATH`, `ANALYSIS_SCHEDULER_ENABLED`
    /// and `ANALYSIS_INTERVAL_MINUTES`.
    pub fn from_env() -> Self {
        Self::new().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database_path = path;
        }
        if let Some(enabled) = lookup("ANALYSIS_SCHEDULER_ENABLED") {
            self.scheduler.enabled = !matches!(enabled.to_lowercase().as_str(), "0" | "false" | "no");
        }
        if let Some(minutes) = lookup("ANALYSIS_INTERVAL_MINUTES").and_then(|m| m.parse::<u64>().ok()) {
            if minutes > 0 {
                self.scheduler.interval = Duration::from_secs(minutes * 60);
            }
        }
        self
    }
}
