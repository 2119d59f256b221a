//! Pomodoro work/break timer with on-disk session history and focus
//! analytics. The presentation layer drives [`timer::TimerController`] and
//! drains the event channel; finished sessions land in [`db::Database`] and
//! feed [`analytics::FocusAnalyzer`].

pub mod analytics;
pub mod config;
pub mod db;
pub mod models;
pub mod timer;

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use tokio::sync::mpsc::UnboundedReceiver;

use config::{ConfigStore, TimerConfig};
use db::Database;
use timer::{TimerController, TimerEvent};

/// Initialize logging from the environment (reads `RUST_LOG`).
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

/// Top-level handles, wired once at startup. Exactly one of each collaborator
/// exists; nothing here is global.
pub struct App {
    pub db: Database,
    pub config: ConfigStore,
    pub timer: TimerController,
}

impl App {
    pub fn init(data_dir: &Path) -> Result<(Self, UnboundedReceiver<TimerEvent>)> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = Database::new(data_dir.join("tomata.sqlite3"))?;
        let config = ConfigStore::new(data_dir.join("config.json"))?;
        let (timer, events) = TimerController::new(db.clone(), config.get());

        info!("App initialized at {}", data_dir.display());

        Ok((Self { db, config, timer }, events))
    }

    /// Validate and persist a new configuration, then apply it to the timer.
    pub async fn reconfigure(&self, config: TimerConfig) -> Result<()> {
        self.config.update(config.clone())?;
        self.timer.reconfigure(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tomata-app-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn init_wires_timer_to_persisted_config() {
        let dir = scratch_dir();
        let (app, _events) = App::init(&dir).unwrap();
        app.reconfigure(TimerConfig {
            work_duration: 45,
            ..TimerConfig::default()
        })
        .await
        .unwrap();

        drop(app);
        let (app, _events) = App::init(&dir).unwrap();
        let snapshot = app.timer.snapshot().await;
        assert_eq!(snapshot.total_seconds, 45 * 60);

        let _ = std::fs::remove_dir_all(dir);
    }
}
