use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime, to_i64, to_u64},
};
use crate::models::Task;

fn row_to_task(row: &Row) -> Result<Task> {
    let created_at: String = row.get("created_at")?;
    let completed_at: Option<String> = row.get("completed_at")?;
    let target_seconds: i64 = row.get("target_seconds")?;
    let logged_seconds: i64 = row.get("logged_seconds")?;

    Ok(Task {
        id: row.get("id")?,
        name: row.get("name")?,
        target_seconds: to_u64(target_seconds, "target_seconds")?,
        logged_seconds: to_u64(logged_seconds, "logged_seconds")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        completed_at: parse_optional_datetime(completed_at, "completed_at")?,
        is_completed: row.get("is_completed")?,
    })
}

impl Database {
    pub async fn upsert_task(&self, task: &Task) -> Result<()> {
        let record = task.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO tasks (id, name, target_seconds, logged_seconds, created_at,
                                    completed_at, is_completed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     target_seconds = excluded.target_seconds,
                     logged_seconds = excluded.logged_seconds,
                     completed_at = excluded.completed_at,
                     is_completed = excluded.is_completed",
                params![
                    record.id,
                    record.name,
                    to_i64(record.target_seconds)?,
                    to_i64(record.logged_seconds)?,
                    record.created_at.to_rfc3339(),
                    record.completed_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.is_completed,
                ],
            )
            .with_context(|| "failed to upsert task")?;
            Ok(())
        })
        .await
    }

    pub async fn list_tasks(&self, include_completed: bool) -> Result<Vec<Task>> {
        self.execute(move |conn| {
            let sql = if include_completed {
                "SELECT id, name, target_seconds, logged_seconds, created_at, completed_at,
                        is_completed
                 FROM tasks ORDER BY created_at ASC"
            } else {
                "SELECT id, name, target_seconds, logged_seconds, created_at, completed_at,
                        is_completed
                 FROM tasks WHERE is_completed = 0 ORDER BY created_at ASC"
            };
            let mut stmt = conn.prepare(sql)?;

            let mut rows = stmt.query([])?;
            let mut tasks = Vec::new();
            while let Some(row) = rows.next()? {
                tasks.push(row_to_task(row)?);
            }
            Ok(tasks)
        })
        .await
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        let task_id = task_id.to_string();
        self.execute(move |conn| {
            conn.query_row(
                "SELECT id, name, target_seconds, logged_seconds, created_at, completed_at,
                        is_completed
                 FROM tasks WHERE id = ?1",
                params![task_id],
                |row| Ok(row_to_task(row)),
            )
            .optional()?
            .transpose()
        })
        .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        let task_id = task_id.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])
                .with_context(|| "failed to delete task")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use uuid::Uuid;

    fn scratch_db() -> Database {
        let path = std::env::temp_dir().join(format!("tomata-tasks-{}.sqlite3", Uuid::new_v4()));
        Database::new(path).unwrap()
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates() {
        let db = scratch_db();
        let mut task = Task::create("write report", 3000, Local::now());
        db.upsert_task(&task).await.unwrap();

        task.log_session(1500);
        db.upsert_task(&task).await.unwrap();

        let loaded = db.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(loaded.logged_seconds, 1500);
        assert_eq!(loaded.name, "write report");
    }

    #[tokio::test]
    async fn list_tasks_filters_completed() {
        let db = scratch_db();
        let open = Task::create("open", 1500, Local::now());
        let mut done = Task::create("done", 1500, Local::now());
        done.mark_completed(Local::now());
        db.upsert_task(&open).await.unwrap();
        db.upsert_task(&done).await.unwrap();

        let active = db.list_tasks(false).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, open.id);

        let all = db.list_tasks(true).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn get_missing_task_is_none() {
        let db = scratch_db();
        assert!(db.get_task("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_task_removes_row() {
        let db = scratch_db();
        let task = Task::create("gone soon", 1500, Local::now());
        db.upsert_task(&task).await.unwrap();
        db.delete_task(&task.id).await.unwrap();
        assert!(db.get_task(&task.id).await.unwrap().is_none());
    }
}
