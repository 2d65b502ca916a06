//! Progress reporting for long runs.
//!
//! The orchestrator only knows the `ProgressSink` trait; the text bar is one
//! implementation, closures are another.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::{Duration, Instant};

/// Receives `(completed, total)` after each finished trial. Fire-and-forget.
pub trait ProgressSink: Sync {
    fn update(&self, completed: usize, total: usize);
}

impl<F: Fn(usize, usize) + Sync> ProgressSink for F {
    fn update(&self, completed: usize, total: usize) { self(completed, total) }
}

/// Discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _completed: usize, _total: usize) {}
}

/// Counts finished trials and forwards the count to a sink.
///
/// Workers never wait on each other here: if another worker is already
/// reporting, the tick is folded into that worker's (or a later) update.
/// Updates reach the sink strictly increasing, and the tick that completes
/// the run always reports `(total, total)`.
pub(crate) struct ProgressTicker<'a> {
    sink: &'a dyn ProgressSink,
    total: usize,
    done: AtomicUsize,
    reported: Mutex<usize>,
}

impl<'a> ProgressTicker<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink, total: usize) -> Self {
        Self { sink, total, done: AtomicUsize::new(0), reported: Mutex::new(0) }
    }

    pub(crate) fn tick(&self) {
        let n = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        let guard: Option<MutexGuard<'_, usize>> = if n >= self.total {
            Some(self.reported.lock().unwrap_or_else(PoisonError::into_inner))
        } else {
            match self.reported.try_lock() {
                Ok(g) => Some(g),
                Err(TryLockError::Poisoned(p)) => Some(p.into_inner()),
                Err(TryLockError::WouldBlock) => None,
            }
        };
        if let Some(mut last) = guard {
            let now = self.done.load(Ordering::Acquire);
            if now > *last {
                *last = now;
                self.sink.update(now, self.total);
            }
        }
    }
}

struct BarState<W> {
    out: W,
    started: Instant,
    last_draw: Option<Instant>,
}

/// `[=========>          ] 42.0 % [ETC: 10-16 14:03:22]`, redrawn in place.
pub struct ProgressBar<W: Write + Send = io::Stderr> {
    state: Mutex<BarState<W>>,
    freq: Duration,
    width: usize,
}

impl ProgressBar<io::Stderr> {
    pub fn stderr() -> Self { Self::with_writer(io::stderr(), Duration::from_millis(250), 35) }
}

impl<W: Write + Send> ProgressBar<W> {
    pub fn with_writer(out: W, freq: Duration, width: usize) -> Self {
        Self {
            state: Mutex::new(BarState { out, started: Instant::now(), last_draw: None }),
            freq,
            width,
        }
    }

    pub fn into_inner(self) -> W {
        self.state.into_inner().unwrap_or_else(PoisonError::into_inner).out
    }

    fn render(&self, completed: usize, total: usize, elapsed: Duration) -> String {
        let frac = if total == 0 { 1.0 } else { (completed.min(total) as f64) / (total as f64) };
        let bars = ((self.width as f64) * frac) as usize;
        let mut line = String::with_capacity(self.width + 48);
        line.push_str("\r\x1b[K [");
        line.push_str(&"=".repeat(bars));
        line.push('>');
        line.push_str(&" ".repeat(self.width.saturating_sub(bars)));
        line.push_str("] ");
        if completed >= total {
            line.push_str("100.0 %\n");
        } else {
            line.push_str(&format!("{:5.1} % ", frac * 100.0));
            if completed > 0 {
                let remaining = elapsed.mul_f64((total - completed) as f64 / completed as f64);
                line.push_str(&format!("[ETC: {}]", completion_time(remaining)));
            }
        }
        line
    }
}

impl<W: Write + Send> ProgressSink for ProgressBar<W> {
    fn update(&self, completed: usize, total: usize) {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let done = completed >= total;
        if !done {
            if let Some(last) = st.last_draw {
                if now.duration_since(last) < self.freq { return; }
            }
        }
        st.last_draw = Some(now);
        let line = self.render(completed, total, now.duration_since(st.started));
        // best effort: a broken terminal must not stop the simulation
        let _ = st.out.write_all(line.as_bytes());
        let _ = st.out.flush();
    }
}

/// Local wall-clock time `remaining` from now, as `MM-DD HH:MM:SS`.
fn completion_time(remaining: Duration) -> String {
    let eta = chrono::Local::now()
        + chrono::Duration::from_std(remaining).unwrap_or_else(|_| chrono::Duration::zero());
    eta.format("%m-%d %X").to_string()
}

/// `1 d 2 h 3 m 4.500 s`; higher units only when non-zero.
pub fn format_elapsed(d: Duration) -> String {
    let total = d.as_secs();
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, secs) = (rem / 60, rem % 60);
    let secs = secs as f64 + f64::from(d.subsec_nanos()) * 1e-9;

    let mut s = String::new();
    if days > 0 { s.push_str(&format!("{} d ", days)); }
    if hours > 0 { s.push_str(&format!("{} h ", hours)); }
    if minutes > 0 { s.push_str(&format!("{} m ", minutes)); }
    s.push_str(&format!("{:.3} s", secs));
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(freq_ms: u64) -> ProgressBar<Vec<u8>> {
        ProgressBar::with_writer(Vec::new(), Duration::from_millis(freq_ms), 10)
    }

    #[test]
    fn final_update_always_draws_full_bar() {
        let b = bar(60_000);
        b.update(1, 4);
        b.update(2, 4); // throttled
        b.update(4, 4);
        let out = String::from_utf8(b.into_inner()).unwrap();
        assert_eq!(out.matches("\r\x1b[K").count(), 2);
        assert!(out.ends_with("[==========>] 100.0 %\n"));
        assert!(out.contains("[==>        ]  25.0 % [ETC: "));
    }

    #[test]
    fn zero_frequency_draws_every_update() {
        let b = bar(0);
        for i in 1..=5 { b.update(i, 5); }
        let out = String::from_utf8(b.into_inner()).unwrap();
        assert_eq!(out.matches("\r\x1b[K").count(), 5);
    }

    #[test]
    fn closures_are_sinks() {
        let seen = Mutex::new(Vec::new());
        let sink = |c: usize, t: usize| seen.lock().unwrap().push((c, t));
        sink.update(1, 2);
        NoProgress.update(1, 2);
        assert_eq!(seen.into_inner().unwrap(), vec![(1, 2)]);
    }

    #[test]
    fn ticker_reports_increasing_counts_and_the_total() {
        let seen = Mutex::new(Vec::new());
        let sink = |c: usize, t: usize| seen.lock().unwrap().push((c, t));
        let ticker = ProgressTicker::new(&sink, 64);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| for _ in 0..8 { ticker.tick(); });
            }
        });
        let seen = seen.into_inner().unwrap();
        assert!(!seen.is_empty() && seen.len() <= 64);
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(seen.last(), Some(&(64, 64)));
        assert_eq!(seen.iter().filter(|&&(c, _)| c == 64).count(), 1);
    }

    #[test]
    fn serial_ticker_reports_every_tick() {
        let seen = Mutex::new(Vec::new());
        let sink = |c: usize, t: usize| seen.lock().unwrap().push((c, t));
        let ticker = ProgressTicker::new(&sink, 3);
        for _ in 0..3 { ticker.tick(); }
        assert_eq!(seen.into_inner().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(Duration::from_millis(1_500)), "1.500 s");
        assert_eq!(format_elapsed(Duration::from_secs(61)), "1 m 1.000 s");
        assert_eq!(format_elapsed(Duration::from_secs(86_400 + 7_200 + 3)), "1 d 2 h 3.000 s");
    }
}
