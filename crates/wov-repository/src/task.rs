//! Scheduled task CRUD.

use serde::{Deserialize, Serialize};
use wov_core::{EntityId, ScheduledTask, TaskId, Value};

use crate::error::RepoResult;
use crate::Repository;

#[derive(Debug, Serialize, Deserialize)]
struct TaskRow {
    tid: String,
    entity_id: i64,
    verb: String,
    args: Vec<serde_json::Value>,
    execute_at: chrono::DateTime<chrono::Utc>,
}

impl From<TaskRow> for ScheduledTask {
    fn from(r: TaskRow) -> Self {
        ScheduledTask {
            id: TaskId(uuid::Uuid::parse_str(&r.tid).unwrap_or_default()),
            entity_id: EntityId(r.entity_id),
            verb: r.verb,
            args: r.args.iter().map(Value::from).collect(),
            execute_at: r.execute_at,
        }
    }
}

impl Repository {
    pub async fn schedule_task(
        &self,
        entity_id: EntityId,
        verb: impl Into<String>,
        args: Vec<Value>,
        execute_at: chrono::DateTime<chrono::Utc>,
    ) -> RepoResult<ScheduledTask> {
        let task = ScheduledTask { id: TaskId::new(), entity_id, verb: verb.into(), args, execute_at };
        let row = TaskRow {
            tid: task.id.0.to_string(),
            entity_id: task.entity_id.0,
            verb: task.verb.clone(),
            args: task.args.clone().into_iter().map(Into::into).collect(),
            execute_at: task.execute_at,
        };
        self.db.client().query("CREATE scheduled_tasks CONTENT $row").bind(("row", row)).await?;
        Ok(task)
    }

    /// Atomically read and delete every task due at or before `now` — the
    /// at-most-once dispatch guarantee comes from this delete happening in
    /// the same statement as the select.
    pub async fn take_due_tasks(&self, now: chrono::DateTime<chrono::Utc>) -> RepoResult<Vec<ScheduledTask>> {
        let mut res = self
            .db
            .client()
            .query(
                "BEGIN TRANSACTION;
                 LET $due = (SELECT * FROM scheduled_tasks WHERE execute_at <= $now);
                 DELETE scheduled_tasks WHERE execute_at <= $now;
                 RETURN $due;
                 COMMIT TRANSACTION;",
            )
            .bind(("now", now))
            .await?;
        let rows: Vec<TaskRow> = res.take(0)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn due_tasks_are_removed_exactly_once() {
        let repo = Repository::connect_memory().await.unwrap();
        let seq = wov_core::IdSequence::starting_after(0);
        let e = repo.create_entity(&seq, "Clock", None).await.unwrap();
        let past = chrono::Utc::now() - chrono::Duration::seconds(5);
        repo.schedule_task(e.id, "tick", vec![], past).await.unwrap();

        let due = repo.take_due_tasks(chrono::Utc::now()).await.unwrap();
        assert_eq!(due.len(), 1);
        let due_again = repo.take_due_tasks(chrono::Utc::now()).await.unwrap();
        assert!(due_again.is_empty(), "task must not be dispatched twice");
    }

    #[tokio::test]
    async fn future_tasks_are_not_taken() {
        let repo = Repository::connect_memory().await.unwrap();
        let seq = wov_core::IdSequence::starting_after(0);
        let e = repo.create_entity(&seq, "Clock", None).await.unwrap();
        let future = chrono::Utc::now() + chrono::Duration::seconds(60);
        repo.schedule_task(e.id, "tick", vec![], future).await.unwrap();

        let due = repo.take_due_tasks(chrono::Utc::now()).await.unwrap();
        assert!(due.is_empty());
    }
}
