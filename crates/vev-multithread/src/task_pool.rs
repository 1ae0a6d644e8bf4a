// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use rayon::ThreadPool;
use std::fmt::Debug;
use std::ops::Deref;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{sync::Semaphore, time::sleep};
use tracing::{debug, error, info, warn, Level};

#[derive(Debug, Error)]
pub enum TaskPoolError {
    #[error("pool semaphore for task '{0}' was closed")]
    SemaphoreClosed(String),
    #[error("task '{0}' panicked or its result channel was dropped")]
    TaskLost(String),
}

/// A bounded executor for CPU-bound tasks backed by a Rayon thread pool.
///
/// Used to run puzzle solving off the tallier's async intake loop: a slow
/// or malicious puzzle cannot stall message reception because solving
/// happens on dedicated Rayon threads, gated only by `max_tasks`
/// concurrent solves.
#[derive(Debug, Clone)]
pub struct TaskPool {
    semaphore: Arc<Semaphore>,
    thread_pool: Arc<ThreadPool>,
}

impl TaskPool {
    /// Creates a new pool with `threads` worker threads and at most `max_tasks` concurrent tasks.
    pub fn new(threads: usize, max_tasks: usize) -> TaskPool {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("failed to build puzzle-solver thread pool");

        Self {
            thread_pool: Arc::new(thread_pool),
            semaphore: Arc::new(Semaphore::new(max_tasks)),
        }
    }

    /// Runs `op` on the Rayon pool and awaits its result, logging a
    /// warning/error if it runs longer than the timeouts in `timed_logs`.
    pub async fn spawn<OP, T: Debug + Send + 'static>(
        &self,
        task_name: String,
        timed_logs: impl Into<TaskTimeouts>,
        op: OP,
    ) -> Result<T, TaskPoolError>
    where
        OP: FnOnce() -> T + Send + 'static,
    {
        let timeouts = timed_logs.into();
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| TaskPoolError::SemaphoreClosed(task_name.clone()))?;

        let warning_handle = {
            let task_name = task_name.clone();
            tokio::spawn(async move {
                for log in timeouts.iter() {
                    let delay = Duration::from_secs(log.0);
                    sleep(delay).await;
                    let msg = format!("puzzle solve '{}' has been running for {:?}", task_name, delay);
                    match log.1 {
                        Level::WARN => warn!(msg),
                        Level::ERROR => error!(msg),
                        Level::INFO => info!(msg),
                        Level::DEBUG => debug!(msg),
                        _ => (),
                    }
                }
            })
        };

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.thread_pool.spawn(move || {
            let t = op();
            if tx.send(t).is_err() {
                error!("solver result for '{task_name}' had no receiver");
            }
        });

        let output = rx.await.map_err(|_| TaskPoolError::TaskLost(task_name))?;

        warning_handle.abort();

        Ok(output)
    }
}

#[derive(Debug, Clone)]
pub struct TaskTimeouts(pub Vec<TimedLog>);

impl<const N: usize> From<[(u64, Level); N]> for TaskTimeouts {
    fn from(arr: [(u64, Level); N]) -> Self {
        Self(arr.into_iter().map(|(s, l)| TimedLog(s, l)).collect())
    }
}

impl Deref for TaskTimeouts {
    type Target = Vec<TimedLog>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TaskTimeouts {
    pub fn new(logs: Vec<TimedLog>) -> Self {
        Self(logs)
    }
}

impl Default for TaskTimeouts {
    fn default() -> Self {
        [(10, Level::WARN), (30, Level::ERROR)].into()
    }
}

impl From<(u64, Level)> for TimedLog {
    fn from((s, level): (u64, Level)) -> Self {
        Self(s, level)
    }
}

#[derive(Debug, Clone)]
pub struct TimedLog(pub u64, pub tracing::Level);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_runs_cpu_bound_work_and_returns_result() {
        let pool = TaskPool::new(2, 4);
        let result = pool
            .spawn("square".into(), TaskTimeouts::default(), || 6 * 7)
            .await
            .unwrap();
        assert_eq!(result, 42);
    }

    #[tokio::test]
    async fn semaphore_bounds_concurrency() {
        let pool = TaskPool::new(4, 1);
        let a = pool.spawn("a".into(), TaskTimeouts::default(), || 1);
        let b = pool.spawn("b".into(), TaskTimeouts::default(), || 2);
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a.unwrap() + b.unwrap(), 3);
    }
}
