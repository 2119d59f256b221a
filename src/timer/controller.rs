use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Local;
use log::{error, info};
use serde::Serialize;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time,
};

use crate::{
    config::TimerConfig,
    db::Database,
    models::{Phase, SessionRecord, Task},
};

use super::{PhaseTimer, TimerEvent};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    pub is_running: bool,
    pub completed_work_sessions: u32,
}

/// Async driver around the phase machine. User operations and the one-second
/// ticker all mutate the machine behind one mutex, so ticks never race a
/// state transition. Finalized records are persisted before their completion
/// event is forwarded to the presentation channel.
#[derive(Clone)]
pub struct TimerController {
    timer: Arc<Mutex<PhaseTimer>>,
    db: Database,
    events: mpsc::UnboundedSender<TimerEvent>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    tick_interval: Duration,
    active_task: Arc<Mutex<Option<Task>>>,
}

impl TimerController {
    pub fn new(
        db: Database,
        config: TimerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let controller = Self {
            timer: Arc::new(Mutex::new(PhaseTimer::new(config))),
            db,
            events: event_tx,
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
            active_task: Arc::new(Mutex::new(None)),
        };
        (controller, event_rx)
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let timer = self.timer.lock().await;
        TimerSnapshot {
            phase: timer.phase(),
            remaining_seconds: timer.remaining_seconds(),
            total_seconds: timer.total_seconds(),
            is_running: timer.is_running(),
            completed_work_sessions: timer.completed_work_sessions(),
        }
    }

    pub async fn start(&self) {
        {
            let mut timer = self.timer.lock().await;
            if timer.is_running() {
                return;
            }
            timer.start(Local::now());
        }
        self.spawn_ticker().await;
    }

    pub async fn pause(&self) {
        let mut timer = self.timer.lock().await;
        timer.pause();
        // the ticker observes the stopped flag on its next tick and exits
    }

    pub async fn skip(&self) {
        let events = {
            let mut timer = self.timer.lock().await;
            timer.skip(Local::now())
        };
        self.dispatch(events).await;
    }

    pub async fn reset(&self) {
        self.cancel_ticker().await;
        let events = {
            let mut timer = self.timer.lock().await;
            timer.reset()
        };
        self.dispatch(events).await;
    }

    /// Apply a validated configuration; the current interval is discarded.
    pub async fn reconfigure(&self, config: TimerConfig) -> Result<()> {
        config.validate()?;
        self.cancel_ticker().await;
        let events = {
            let mut timer = self.timer.lock().await;
            timer.set_config(config)
        };
        self.dispatch(events).await;
        Ok(())
    }

    /// Work sessions finalized while a task is active are stamped with it and
    /// their run time is logged against the task.
    pub async fn set_active_task(&self, task: Task) {
        *self.active_task.lock().await = Some(task);
    }

    pub async fn clear_active_task(&self) {
        *self.active_task.lock().await = None;
    }

    pub async fn active_task(&self) -> Option<Task> {
        self.active_task.lock().await.clone()
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let controller = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(controller.tick_interval);
            // the first interval tick fires immediately; the countdown
            // should not move until a full second has passed
            interval.tick().await;
            loop {
                interval.tick().await;
                let events = {
                    let mut timer = controller.timer.lock().await;
                    if !timer.is_running() {
                        break;
                    }
                    timer.tick(Local::now())
                };
                let finished = events
                    .iter()
                    .any(|event| matches!(event, TimerEvent::SessionCompleted(_)));
                controller.dispatch(events).await;
                if finished {
                    break;
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    /// Forward events in emission order. A completed record is written to
    /// storage before its event is sent, so the phase change that follows it
    /// is only observed after the record is durable.
    async fn dispatch(&self, events: Vec<TimerEvent>) {
        for event in events {
            match event {
                TimerEvent::SessionCompleted(record) => {
                    let record = self.attach_active_task(record).await;
                    if let Err(err) = self.db.append_session(&record).await {
                        error!("Failed to persist session record: {err:#}");
                    }
                    let _ = self.events.send(TimerEvent::SessionCompleted(record));
                }
                other => {
                    let _ = self.events.send(other);
                }
            }
        }
    }

    async fn attach_active_task(&self, mut record: SessionRecord) -> SessionRecord {
        if record.session_type != Phase::Work {
            return record;
        }

        let mut guard = self.active_task.lock().await;
        if let Some(mut task) = guard.take() {
            record.task_id = Some(task.id.clone());
            record.task_name = Some(task.name.clone());
            task.log_session(u64::from(record.actual_duration));
            if task.progress() >= 1.0 {
                info!("Task '{}' reached its time target", task.name);
            }
            if let Err(err) = self.db.upsert_task(&task).await {
                error!("Failed to persist task progress: {err:#}");
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_db() -> Database {
        let path =
            std::env::temp_dir().join(format!("tomata-controller-{}.sqlite3", Uuid::new_v4()));
        Database::new(path).unwrap()
    }

    fn test_controller() -> (TimerController, mpsc::UnboundedReceiver<TimerEvent>) {
        TimerController::new(scratch_db(), TimerConfig::default())
    }

    #[tokio::test]
    async fn start_then_skip_persists_one_skipped_record() {
        let (controller, _events) = test_controller();
        controller.start().await;
        controller.skip().await;

        let sessions = controller.db.load_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        let record = &sessions[0];
        assert!(record.was_skipped);
        assert!(!record.was_completed);
        assert_eq!(record.session_type, Phase::Work);
        assert!(record.actual_duration < record.planned_duration);
    }

    #[tokio::test]
    async fn skip_forwards_record_before_phase_change() {
        let (controller, mut events) = test_controller();
        controller.start().await;
        controller.skip().await;

        let first = events.recv().await.unwrap();
        assert!(matches!(first, TimerEvent::SessionCompleted(_)));
        let second = events.recv().await.unwrap();
        assert!(matches!(second, TimerEvent::PhaseChanged(Phase::ShortBreak)));
    }

    #[tokio::test]
    async fn reset_emits_no_record() {
        let (controller, _events) = test_controller();
        controller.start().await;
        controller.reset().await;

        assert_eq!(controller.db.session_count().await.unwrap(), 0);
        let snapshot = controller.snapshot().await;
        assert!(!snapshot.is_running);
        assert_eq!(snapshot.remaining_seconds, snapshot.total_seconds);
    }

    #[tokio::test]
    async fn active_task_is_stamped_and_logged() {
        let (controller, _events) = test_controller();
        let task = Task::create("write report", 3000, Local::now());
        controller.db.upsert_task(&task).await.unwrap();
        controller.set_active_task(task.clone()).await;

        controller.start().await;
        controller.skip().await;

        let sessions = controller.db.load_sessions().await.unwrap();
        assert_eq!(sessions[0].task_id.as_deref(), Some(task.id.as_str()));
        assert_eq!(sessions[0].task_name.as_deref(), Some("write report"));

        // the task handoff is one-shot
        assert!(controller.active_task().await.is_none());
        assert!(controller.db.get_task(&task.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn break_sessions_are_not_stamped_with_tasks() {
        let (controller, _events) = test_controller();
        controller.start().await;
        controller.skip().await; // finish the work interval, now on a break
        controller.reset().await; // stop the ticker carried over from the skip

        let task = Task::create("write report", 3000, Local::now());
        controller.set_active_task(task).await;
        controller.start().await;
        controller.skip().await;

        let sessions = controller.db.load_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions[1].session_type.is_break());
        assert!(sessions[1].task_id.is_none());
    }

    #[tokio::test]
    async fn snapshot_reflects_configuration() {
        let (controller, _events) = test_controller();
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Work);
        assert_eq!(snapshot.total_seconds, 25 * 60);
        assert_eq!(snapshot.remaining_seconds, 25 * 60);
        assert!(!snapshot.is_running);

        controller
            .reconfigure(TimerConfig {
                work_duration: 50,
                ..TimerConfig::default()
            })
            .await
            .unwrap();
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.total_seconds, 50 * 60);
    }

    #[tokio::test]
    async fn reconfigure_rejects_invalid_durations() {
        let (controller, _events) = test_controller();
        let result = controller
            .reconfigure(TimerConfig {
                work_duration: 0,
                ..TimerConfig::default()
            })
            .await;
        assert!(result.is_err());

        // the running configuration is untouched
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.total_seconds, 25 * 60);
    }
}
