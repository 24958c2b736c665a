use std::sync::Arc;

use super::models::Path;
use super::task::PathfinderTask;

struct Tracked {
    task: Arc<dyn PathfinderTask>,
    last_path: Option<Arc<Path>>,
    ticks_without_change: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub finished: usize,
    pub stagnated: usize,
    pub live: usize,
}

/// Tick-driven bookkeeping over live top-level tasks: evicts finished ones and
/// cancels tasks whose path has not changed for `threshold` ticks.
pub struct TaskSupervisor {
    threshold: Option<u32>,
    tasks: Vec<Tracked>,
}

fn same_task(a: &Arc<dyn PathfinderTask>, b: &Arc<dyn PathfinderTask>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

impl TaskSupervisor {
    /// A threshold of zero or less disables stagnation cancellation.
    pub fn new(stagnation_ticks: i32) -> Self {
        let threshold = u32::try_from(stagnation_ticks).ok().filter(|t| *t > 0);
        Self { threshold, tasks: Vec::new() }
    }

    pub fn threshold(&self) -> Option<u32> {
        self.threshold
    }

    /// Starts tracking; the current path is the first baseline.
    pub fn register(&mut self, task: Arc<dyn PathfinderTask>) {
        let last_path = task.path();
        self.tasks.push(Tracked { task, last_path, ticks_without_change: 0 });
    }

    pub fn contains(&self, task: &Arc<dyn PathfinderTask>) -> bool {
        self.tasks.iter().any(|t| same_task(&t.task, task))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// One external tick.
    pub fn evaluate(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let threshold = self.threshold;
        self.tasks.retain_mut(|tracked| {
            if tracked.task.is_final() {
                report.finished += 1;
                return false;
            }
            let current = tracked.task.path();
            if current != tracked.last_path {
                tracked.last_path = current;
                tracked.ticks_without_change = 0;
                return true;
            }
            tracked.ticks_without_change += 1;
            match threshold {
                Some(limit) if tracked.ticks_without_change >= limit => {
                    log::debug!(
                        "supervisor: cancelling task {} -> {} after {} ticks without progress",
                        tracked.task.start(),
                        tracked.task.target(),
                        tracked.ticks_without_change
                    );
                    tracked.task.cancel();
                    report.stagnated += 1;
                    false
                }
                _ => true,
            }
        });
        report.live = self.tasks.len();
        report
    }

    pub fn cancel_all(&mut self) {
        for tracked in self.tasks.drain(..) {
            tracked.task.cancel();
        }
    }
}
