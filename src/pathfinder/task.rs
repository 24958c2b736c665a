use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::models::{Path, TileCoord};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TaskStatus {
    Calculating,
    LookingForBetterPath,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }

    fn to_u8(self) -> u8 {
        match self {
            TaskStatus::Calculating => 0,
            TaskStatus::LookingForBetterPath => 1,
            TaskStatus::Done => 2,
            TaskStatus::Cancelled => 3,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskStatus::Calculating,
            1 => TaskStatus::LookingForBetterPath,
            2 => TaskStatus::Done,
            _ => TaskStatus::Cancelled,
        }
    }
}

/// Status cell that refuses to leave a terminal state.
#[derive(Debug)]
pub struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    pub fn new(status: TaskStatus) -> Self {
        Self(AtomicU8::new(status.to_u8()))
    }

    pub fn load(&self) -> TaskStatus {
        TaskStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `next` unless already terminal. Returns whether the store happened.
    pub fn transition(&self, next: TaskStatus) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                if TaskStatus::from_u8(cur).is_terminal() {
                    None
                } else {
                    Some(next.to_u8())
                }
            })
            .is_ok()
    }
}

/// Common surface of every search task.
pub trait PathfinderTask: Send + Sync {
    fn start(&self) -> TileCoord;
    fn target(&self) -> TileCoord;
    /// Best known path so far; None until the first result.
    fn path(&self) -> Option<Arc<Path>>;
    fn status(&self) -> TaskStatus;
    /// Cooperative; the task turns Cancelled right away and its worker stops at the next iteration.
    fn cancel(&self);

    fn is_final(&self) -> bool {
        self.status().is_terminal()
    }
}

/// Shared cancellation token polled by search loops.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Generation counter plus condition variable; children bump it when they finish.
#[derive(Clone, Debug, Default)]
pub struct ProgressSignal(Arc<(Mutex<u64>, Condvar)>);

impl ProgressSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        let (lock, cvar) = &*self.0;
        let mut generation = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *generation += 1;
        cvar.notify_all();
    }

    pub fn generation(&self) -> u64 {
        let (lock, _) = &*self.0;
        let generation = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *generation
    }

    /// Blocks until the generation differs from `seen` or the timeout passes; returns the current generation.
    pub fn wait_for_change(&self, seen: u64, timeout: Duration) -> u64 {
        let (lock, cvar) = &*self.0;
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |generation| *generation == seen)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

/// Polls until the task is final or the timeout passes. Returns whether it became final.
pub fn wait_until_final(task: &dyn PathfinderTask, timeout: Duration) -> bool {
    let started = Instant::now();
    while !task.is_final() {
        if started.elapsed() >= timeout {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
    true
}
