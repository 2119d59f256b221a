use anyhow::{bail, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::models::Phase;

/// Phase durations in minutes plus the long-break cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerConfig {
    pub work_duration: u32,
    pub short_break: u32,
    pub long_break: u32,
    pub sessions_before_long_break: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration: 25,
            short_break: 5,
            long_break: 15,
            sessions_before_long_break: 4,
        }
    }
}

impl TimerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.work_duration == 0 || self.short_break == 0 || self.long_break == 0 {
            bail!("timer durations must be positive");
        }
        if self.sessions_before_long_break == 0 {
            bail!("sessions_before_long_break must be at least 1");
        }
        Ok(())
    }

    /// Configured length of one `phase` interval, in seconds.
    pub fn phase_seconds(&self, phase: Phase) -> u32 {
        let minutes = match phase {
            Phase::Work => self.work_duration,
            Phase::ShortBreak => self.short_break,
            Phase::LongBreak => self.long_break,
        };
        minutes * 60
    }
}

/// On-disk timer configuration. A missing, corrupt, or invalid file yields
/// the defaults, so the timer never sees an unusable configuration.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<TimerConfig>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            match serde_json::from_str::<TimerConfig>(&contents) {
                Ok(config) if config.validate().is_ok() => config,
                _ => {
                    warn!(
                        "Unusable config at {}; falling back to defaults",
                        path.display()
                    );
                    TimerConfig::default()
                }
            }
        } else {
            TimerConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> TimerConfig {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, config: TimerConfig) -> Result<()> {
        config.validate()?;
        let mut guard = self.data.write().unwrap();
        *guard = config;
        self.persist(&guard)
    }

    fn persist(&self, data: &TimerConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("tomata-config-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = ConfigStore::new(scratch_path()).unwrap();
        assert_eq!(store.get(), TimerConfig::default());
    }

    #[test]
    fn corrupt_file_yields_defaults() {
        let path = scratch_path();
        fs::write(&path, "{not json").unwrap();
        let store = ConfigStore::new(path.clone()).unwrap();
        assert_eq!(store.get(), TimerConfig::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_duration_file_yields_defaults() {
        let path = scratch_path();
        fs::write(
            &path,
            r#"{"work_duration":0,"short_break":5,"long_break":15,"sessions_before_long_break":4}"#,
        )
        .unwrap();
        let store = ConfigStore::new(path.clone()).unwrap();
        assert_eq!(store.get(), TimerConfig::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn update_persists_and_round_trips() {
        let path = scratch_path();
        let store = ConfigStore::new(path.clone()).unwrap();
        let config = TimerConfig {
            work_duration: 50,
            short_break: 10,
            long_break: 30,
            sessions_before_long_break: 2,
        };
        store.update(config.clone()).unwrap();

        let reloaded = ConfigStore::new(path.clone()).unwrap();
        assert_eq!(reloaded.get(), config);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn update_rejects_zero_cadence() {
        let store = ConfigStore::new(scratch_path()).unwrap();
        let bad = TimerConfig {
            sessions_before_long_break: 0,
            ..TimerConfig::default()
        };
        assert!(store.update(bad).is_err());
        assert_eq!(store.get(), TimerConfig::default());
    }

    #[test]
    fn phase_seconds_converts_minutes() {
        let config = TimerConfig::default();
        assert_eq!(config.phase_seconds(Phase::Work), 25 * 60);
        assert_eq!(config.phase_seconds(Phase::ShortBreak), 5 * 60);
        assert_eq!(config.phase_seconds(Phase::LongBreak), 15 * 60);
    }
}
