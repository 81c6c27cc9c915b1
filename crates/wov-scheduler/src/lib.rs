//! Drains due scheduled tasks on a fixed tick and runs each through the
//! dispatcher, exactly as if the task's own entity had called itself.
//!
//! Modeled on the gateway's background monitoring loops: a `tokio::spawn`
//! task wrapping a `tokio::time::interval`, with an `AbortOnDrop` guard so
//! the loop dies with its owner instead of leaking.

#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use wov_core::error::Result;
use wov_dispatch::Dispatcher;
use wov_repository::Repository;

/// Aborts the wrapped task when dropped, so a `Scheduler` going out of scope
/// stops its tick loop rather than leaving it running forever.
pub struct Scheduler {
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl Scheduler {
    /// Spawn the tick loop. `tick` is the poll interval (from
    /// `Config::scheduler_tick_ms`); each tick drains every task due at or
    /// before `now` and runs it to completion before the next tick begins.
    #[must_use]
    pub fn spawn(repo: Arc<Repository>, dispatcher: Arc<Dispatcher>, tick: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick);
            loop {
                ticker.tick().await;
                if let Err(e) = run_due_tasks(&repo, &dispatcher).await {
                    warn!(error = %e, "scheduler tick failed to drain due tasks");
                }
            }
        });
        Self { handle }
    }
}

async fn run_due_tasks(repo: &Repository, dispatcher: &Dispatcher) -> Result<()> {
    let due = repo.take_due_tasks(chrono::Utc::now()).await?;
    for task in due {
        debug!(task_id = %task.id, entity = %task.entity_id, verb = %task.verb, "running scheduled task");
        // A scheduled task acts on its own behalf: caller and `this` are the
        // same entity. A missing entity or verb is the task author's mistake,
        // not an operational fault — log it and move on rather than retrying
        // or propagating, since the task has already been taken off the queue.
        match dispatcher.execute(task.entity_id, task.entity_id, &task.verb, task.args).await {
            Ok(_) => {},
            Err(e) => warn!(task_id = %task.id, entity = %task.entity_id, verb = %task.verb, error = %e, "scheduled task failed"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use wov_capabilities::CapabilityKernel;
    use wov_core::ast::Ast;
    use wov_core::value::Value;
    use wov_core::world::World;
    use wov_core::Config;
    use wov_events::EventBus;
    use wov_interpreter::Interpreter;

    use super::*;

    async fn harness() -> (Arc<Repository>, Arc<Dispatcher>) {
        let repo = Arc::new(Repository::connect_memory().await.unwrap());
        let capabilities = Arc::new(CapabilityKernel::new(repo.clone()));
        let events = EventBus::new();
        let fs_root = std::env::temp_dir().join("wov-scheduler-tests");
        let config = Config::from_env();
        let world_impl = Arc::new(wov_dispatch::WorldImpl::new(repo.clone(), capabilities, events, fs_root, config.bot_id).await.unwrap());
        let world: Arc<dyn World> = world_impl.clone();
        let interpreter = Arc::new(Interpreter::new(wov_opcodes::standard_registry()));
        world_impl.wire(world.clone(), interpreter.clone());
        let dispatcher = Arc::new(Dispatcher::new(world, interpreter, config));
        (repo, dispatcher)
    }

    #[tokio::test]
    async fn a_due_task_is_executed_and_removed() {
        let (repo, dispatcher) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let clock = repo.create_entity(&seq, "Clock", None).await.unwrap();
        let cap = repo
            .create_capability(clock.id, "entity.control", std::collections::BTreeMap::from([("target_id".into(), Value::int(clock.id.0))]))
            .await
            .unwrap();
        repo.update_verb(&seq, clock.id, "tick", Ast::call("set_entity", vec![
            Ast::literal(Value::int(clock.id.0)),
            Ast::literal(Value::str("ticked")),
            Ast::literal(Value::Bool(true)),
            Ast::literal(Value::str(cap.id.to_string())),
        ])).await.unwrap();
        let past = chrono::Utc::now() - chrono::Duration::seconds(1);
        repo.schedule_task(clock.id, "tick", vec![], past).await.unwrap();

        run_due_tasks(&repo, &dispatcher).await.unwrap();

        let entity = repo.get_entity(clock.id).await.unwrap().unwrap();
        assert_eq!(entity.props.get("ticked"), Some(&Value::Bool(true)));
        let due_again = repo.take_due_tasks(chrono::Utc::now()).await.unwrap();
        assert!(due_again.is_empty(), "task must be dequeued exactly once");
    }

    #[tokio::test]
    async fn a_task_whose_verb_no_longer_exists_is_dropped_not_retried() {
        let (repo, dispatcher) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let ghost = repo.create_entity(&seq, "Ghost", None).await.unwrap();
        let past = chrono::Utc::now() - chrono::Duration::seconds(1);
        repo.schedule_task(ghost.id, "nonexistent_verb", vec![], past).await.unwrap();

        // Must not panic or return an error: a bad task is logged and dropped.
        run_due_tasks(&repo, &dispatcher).await.unwrap();

        let due_again = repo.take_due_tasks(chrono::Utc::now()).await.unwrap();
        assert!(due_again.is_empty());
    }

    #[tokio::test]
    async fn future_tasks_are_left_for_a_later_tick() {
        let (repo, dispatcher) = harness().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let clock = repo.create_entity(&seq, "Clock", None).await.unwrap();
        repo.update_verb(&seq, clock.id, "tick", Ast::literal(Value::Null)).await.unwrap();
        let future = chrono::Utc::now() + chrono::Duration::seconds(60);
        repo.schedule_task(clock.id, "tick", vec![], future).await.unwrap();

        run_due_tasks(&repo, &dispatcher).await.unwrap();

        let due = repo.take_due_tasks(chrono::Utc::now() + chrono::Duration::seconds(61)).await.unwrap();
        assert_eq!(due.len(), 1, "task should still be queued for its actual due time");
    }
}
