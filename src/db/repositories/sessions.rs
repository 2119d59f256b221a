use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime, parse_phase, to_u32},
};
use crate::models::SessionRecord;

fn row_to_session(row: &Row) -> Result<SessionRecord> {
    let session_type: String = row.get("session_type")?;
    let start_time: String = row.get("start_time")?;
    let end_time: Option<String> = row.get("end_time")?;
    let planned_duration: i64 = row.get("planned_duration")?;
    let actual_duration: i64 = row.get("actual_duration")?;
    let pause_count: i64 = row.get("pause_count")?;

    Ok(SessionRecord {
        session_type: parse_phase(&session_type)?,
        start_time: parse_datetime(&start_time, "start_time")?,
        end_time: parse_optional_datetime(end_time, "end_time")?,
        planned_duration: to_u32(planned_duration, "planned_duration")?,
        actual_duration: to_u32(actual_duration, "actual_duration")?,
        pause_count: to_u32(pause_count, "pause_count")?,
        was_completed: row.get("was_completed")?,
        was_skipped: row.get("was_skipped")?,
        task_id: row.get("task_id")?,
        task_name: row.get("task_name")?,
    })
}

impl Database {
    /// Durable append of one finalized record. Insertion order is preserved
    /// by the rowid, so `load_sessions` returns emission order.
    pub async fn append_session(&self, record: &SessionRecord) -> Result<()> {
        let record = record.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO sessions (session_type, start_time, end_time, planned_duration,
                                       actual_duration, pause_count, was_completed, was_skipped,
                                       task_id, task_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.session_type.as_str(),
                    record.start_time.to_rfc3339(),
                    record.end_time.as_ref().map(|dt| dt.to_rfc3339()),
                    i64::from(record.planned_duration),
                    i64::from(record.actual_duration),
                    i64::from(record.pause_count),
                    record.was_completed,
                    record.was_skipped,
                    record.task_id,
                    record.task_name,
                ],
            )
            .with_context(|| "failed to insert session record")?;
            Ok(())
        })
        .await
    }

    pub async fn load_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT session_type, start_time, end_time, planned_duration, actual_duration,
                        pause_count, was_completed, was_skipped, task_id, task_name
                 FROM sessions
                 ORDER BY id ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
        .await
    }

    pub async fn session_count(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    pub async fn clear_sessions(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM sessions", [])
                .with_context(|| "failed to clear session history")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phase;
    use chrono::{Local, TimeZone};
    use uuid::Uuid;

    fn scratch_db() -> Database {
        let path = std::env::temp_dir().join(format!("tomata-sessions-{}.sqlite3", Uuid::new_v4()));
        Database::new(path).unwrap()
    }

    fn finalized_record(hour: u32, completed: bool) -> SessionRecord {
        let start = Local.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2026, 3, 2, hour, 25, 0).unwrap();
        let mut record = SessionRecord::begin(Phase::Work, start, 1500);
        if completed {
            record.finalize_completed(end, 1);
        } else {
            record.finalize_skipped(end, 700, 0);
        }
        record
    }

    #[tokio::test]
    async fn append_and_load_round_trips() {
        let db = scratch_db();
        let record = finalized_record(9, true);
        db.append_session(&record).await.unwrap();

        let loaded = db.load_sessions().await.unwrap();
        assert_eq!(loaded, vec![record]);
    }

    #[tokio::test]
    async fn load_preserves_append_order() {
        let db = scratch_db();
        let first = finalized_record(14, false);
        let second = finalized_record(9, true);
        db.append_session(&first).await.unwrap();
        db.append_session(&second).await.unwrap();

        let loaded = db.load_sessions().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], first);
        assert_eq!(loaded[1], second);
    }

    #[tokio::test]
    async fn clear_sessions_empties_history() {
        let db = scratch_db();
        db.append_session(&finalized_record(9, true)).await.unwrap();
        assert_eq!(db.session_count().await.unwrap(), 1);

        db.clear_sessions().await.unwrap();
        assert_eq!(db.session_count().await.unwrap(), 0);
        assert!(db.load_sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn task_association_round_trips() {
        let db = scratch_db();
        let mut record = finalized_record(9, true);
        record.task_id = Some("task-1".into());
        record.task_name = Some("write report".into());
        db.append_session(&record).await.unwrap();

        let loaded = db.load_sessions().await.unwrap();
        assert_eq!(loaded[0].task_id.as_deref(), Some("task-1"));
        assert_eq!(loaded[0].task_name.as_deref(), Some("write report"));
    }
}
