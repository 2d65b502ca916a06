// src/par.rs
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

/// A job's return value, or the message it panicked with.
pub type JobResult<T> = Result<T, String>;

/// Parallel map over a slice, keeping output order deterministic.
/// Spawns `threads` workers; with `threads <= 1` it runs serially.
///
/// Each job runs to completion on one worker. A panicking job only poisons
/// its own slot, the remaining jobs still run. `on_done(i, &result)` is
/// called from the worker right after job `i` finishes.
///
/// I: Sync so we can share &I across threads
/// T: Send because results cross thread boundaries into shared Vec
/// F, D: Sync so all workers can borrow the same callables
pub fn parallel_map_indexed<I, T, F, D>(items: &[I], threads: usize, f: F, on_done: D) -> Vec<JobResult<T>>
where
    I: Sync,
    T: Send,
    F: Fn(&I, usize) -> T + Sync,
    D: Fn(usize, &JobResult<T>) + Sync,
{
    let n = items.len();
    let run_one = |i: usize| -> JobResult<T> {
        let res = panic::catch_unwind(AssertUnwindSafe(|| f(&items[i], i))).map_err(panic_message);
        on_done(i, &res);
        res
    };

    if n == 0 || threads <= 1 {
        return (0..n).map(&run_one).collect();
    }

    // Pre-allocate result slots without requiring Option<T>: Clone
    let out = Mutex::new({
        let mut v: Vec<Option<JobResult<T>>> = Vec::with_capacity(n);
        v.resize_with(n, || None);
        v
    });

    // Lock-free work distribution
    let next = AtomicUsize::new(0);

    // Scoped threads let us borrow `items` and `f` (no 'static required)
    thread::scope(|scope| {
        for _ in 0..threads.min(n) {
            scope.spawn(|| loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                if i >= n { break; }
                let res = run_one(i);
                // jobs never panic while holding the lock, so poisoning is benign
                out.lock().unwrap_or_else(PoisonError::into_inner)[i] = Some(res);
            });
        }
    });

    out.into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err("job was never scheduled".to_string())))
        .collect()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() { return (*s).to_string(); }
    if let Some(s) = payload.downcast_ref::<String>() { return s.clone(); }
    "panic with non-string payload".to_string()
}
