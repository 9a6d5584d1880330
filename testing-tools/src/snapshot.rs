use log::*;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::Error;
use crate::models::{Id, Task};

/// Tasks in `after` whose id does not appear in `before`, in `after` order.
///
/// Identity is the task id only, so tasks whose other fields changed between
/// the two reads are not reported as new.
pub fn new_tasks(before: &[Task], after: &[Task]) -> Vec<Task> {
    let known: HashSet<Id> = before.iter().map(|task| task.id).collect();
    after
        .iter()
        .filter(|task| !known.contains(&task.id))
        .cloned()
        .collect()
}

fn task_ids(tasks: &[Task]) -> HashSet<Id> {
    tasks.iter().map(|task| task.id).collect()
}

/// Lower bound for every poll interval, including a configured zero.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for the backend to finish creating tasks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlePolicy {
    /// Wait before the first read.
    pub initial_delay: Duration,
    /// Interval before the second read; doubled after every read.
    pub interval: Duration,
    pub max_interval: Duration,
    /// Budget for polling, measured after the initial delay.
    pub timeout: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(4),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    pub tasks: Vec<Task>,
    /// Number of list reads performed.
    pub polls: u32,
    /// False when the timeout expired before two reads agreed.
    pub stable: bool,
}

/// Reads the task list until two consecutive reads hold the same task ids.
///
/// On timeout the last read is returned with `stable == false`. A failed read
/// ends polling with that error.
pub async fn poll_until_stable<F, Fut>(policy: &SettlePolicy, mut fetch: F) -> Result<Settled, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<Task>, Error>>,
{
    if !policy.initial_delay.is_zero() {
        tokio::time::sleep(policy.initial_delay).await;
    }

    let deadline = Instant::now() + policy.timeout;
    let mut previous = fetch().await?;
    let mut polls = 1;
    let max_interval = policy.max_interval.max(MIN_POLL_INTERVAL);
    let mut interval = policy.interval.clamp(MIN_POLL_INTERVAL, max_interval);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            warn!(
                "Task list still changing after {:?} ({} reads), using last read",
                policy.timeout, polls
            );
            return Ok(Settled {
                tasks: previous,
                polls,
                stable: false,
            });
        }

        tokio::time::sleep(interval.min(remaining)).await;
        let current = fetch().await?;
        polls += 1;

        if task_ids(&current) == task_ids(&previous) {
            debug!("Task list settled after {} reads", polls);
            return Ok(Settled {
                tasks: current,
                polls,
                stable: true,
            });
        }

        debug!(
            "Task list changed ({} -> {} tasks), polling again",
            previous.len(),
            current.len()
        );
        previous = current;
        interval = (interval * 2).min(max_interval);
    }
}
