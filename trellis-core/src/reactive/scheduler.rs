//! Update Scheduler
//!
//! The scheduler batches watcher re-runs. Mutating observed data notifies
//! Deps synchronously, but eager watchers only enqueue themselves here; the
//! actual re-runs happen once, at the next tick.
//!
//! # Algorithm
//!
//! 1. `queue_watcher` records the watcher ID in the pending set. A watcher
//!    already pending is ignored, so N mutations in one tick cost one re-run.
//! 2. The first enqueue of a tick defers a flush with [`defer_until_flush`].
//! 3. The flush takes the queue, clears the pending set and flag, and only
//!    then runs each watcher. A watcher that re-enqueues itself while running
//!    lands in the *next* flush.
//!
//! Deferred callbacks share one FIFO queue with scheduler flushes, so a
//! callback registered after a mutation runs after the re-render it caused.
//!
//! # Ticks
//!
//! What "next tick" means depends on [`TickMode`]: in `Manual` mode the host
//! calls [`tick`] (or [`run_until_idle`]) when its synchronous work is done;
//! in `Tokio` mode every tick request spawns a local task that flushes.

use std::rc::Rc;

use super::runtime::{Deferred, Runtime};
use super::subscriber::Subscriber;
use crate::config::TickMode;
use crate::error::SchedulerError;

/// Enqueue a watcher for the next flush. Duplicate enqueues are ignored.
pub fn queue_watcher(watcher: Rc<dyn Subscriber>) {
    let id = watcher.id();
    let schedule = Runtime::with(|rt| {
        if !rt.queued.borrow_mut().insert(id) {
            return false;
        }
        rt.queue.borrow_mut().push(watcher);

        if rt.flush_pending.get() {
            false
        } else {
            rt.flush_pending.set(true);
            true
        }
    });

    if schedule {
        defer_until_flush(flush_scheduler_queue);
    }
}

/// Run `callback` at the next tick, after every callback registered before
/// it.
pub fn defer_until_flush(callback: impl FnOnce() + 'static) {
    let request = Runtime::with(|rt| {
        rt.callbacks
            .borrow_mut()
            .push_back(Box::new(callback) as Deferred);
        if rt.waiting.get() {
            false
        } else {
            rt.waiting.set(true);
            true
        }
    });

    if request {
        request_tick();
    }
}

fn request_tick() {
    let mode = Runtime::with(|rt| rt.config.borrow().tick);
    tracing::debug!(?mode, "tick requested");

    match mode {
        TickMode::Manual => {}
        TickMode::Tokio => {
            tokio::task::spawn_local(async {
                tick();
            });
        }
    }
}

/// Run every callback queued for the current tick.
///
/// Returns `false` if nothing was waiting.
pub fn tick() -> bool {
    let callbacks = Runtime::with(|rt| {
        if !rt.waiting.get() {
            return None;
        }
        rt.waiting.set(false);
        Some(std::mem::take(&mut *rt.callbacks.borrow_mut()))
    });

    match callbacks {
        Some(callbacks) => {
            tracing::debug!(callbacks = callbacks.len(), "flushing callbacks");
            for callback in callbacks {
                callback();
            }
            true
        }
        None => false,
    }
}

/// Tick until nothing is waiting.
///
/// Returns the number of ticks run. Fails if watchers are still being
/// re-scheduled after the configured number of rounds.
pub fn run_until_idle() -> Result<usize, SchedulerError> {
    let limit = Runtime::with(|rt| rt.config.borrow().max_flush_rounds);
    let mut rounds = 0;

    while !is_idle() {
        if rounds >= limit {
            tracing::warn!(rounds, "scheduler did not settle");
            return Err(SchedulerError::FlushLimitExceeded { rounds });
        }
        tick();
        rounds += 1;
    }

    Ok(rounds)
}

/// Whether no tick is waiting.
pub fn is_idle() -> bool {
    Runtime::with(|rt| !rt.waiting.get())
}

/// Number of watchers waiting for the next flush.
pub fn pending_watchers() -> usize {
    Runtime::with(|rt| rt.queue.borrow().len())
}

fn flush_scheduler_queue() {
    let queue = Runtime::with(|rt| {
        let queue = std::mem::take(&mut *rt.queue.borrow_mut());
        rt.queued.borrow_mut().clear();
        rt.flush_pending.set(false);
        queue
    });

    tracing::debug!(watchers = queue.len(), "flushing scheduler queue");
    for watcher in queue {
        watcher.run();
    }
}
