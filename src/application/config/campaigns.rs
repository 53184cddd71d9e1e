use std::time::Duration;

use super::env_parse;

/// Settings for the simulated progress updater
#[derive(Debug, Clone)]
pub struct CampaignsConfig {
    pub progress_interval: Duration,
    pub progress_min_step: i32,
    pub progress_max_step: i32,
}

impl Default for CampaignsConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_secs(5),
            progress_min_step: 5,
            progress_max_step: 15,
        }
    }
}

impl CampaignsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let min_step = env_parse("VOICEDROP_PROGRESS_MIN_STEP", defaults.progress_min_step).max(1);
        let max_step = env_parse("VOICEDROP_PROGRESS_MAX_STEP", defaults.progress_max_step).max(min_step);

        Self {
            progress_interval: Duration::from_secs(
                env_parse("VOICEDROP_PROGRESS_INTERVAL_SECS", 5u64).max(1),
            ),
            progress_min_step: min_step,
            progress_max_step: max_step,
        }
    }
}
