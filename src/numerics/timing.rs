#![allow(unused)]
use std::cell::RefCell;
use std::time::Duration;

/// Wall-clock durations of the contact's assembly passes on this thread.
#[derive(Default, Clone, Debug)]
pub struct TimingStats {
    pub preprocess_times: Vec<Duration>,
    pub residual_times: Vec<Duration>,
    pub jacobian_times: Vec<Duration>,
}

impl TimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> Duration {
        self.preprocess_times
            .iter()
            .chain(&self.residual_times)
            .chain(&self.jacobian_times)
            .sum()
    }

    #[cfg(feature = "timing")]
    pub fn log_summary(&self) {
        fn avg_ms(times: &[Duration]) -> f64 {
            if times.is_empty() {
                return 0.0;
            }
            times.iter().sum::<Duration>().as_secs_f64() * 1000.0 / times.len() as f64
        }

        tracing::info!(
            preprocess_passes = self.preprocess_times.len(),
            preprocess_avg_ms = avg_ms(&self.preprocess_times),
            residual_passes = self.residual_times.len(),
            residual_avg_ms = avg_ms(&self.residual_times),
            jacobian_passes = self.jacobian_times.len(),
            jacobian_avg_ms = avg_ms(&self.jacobian_times),
            total_ms = self.total().as_secs_f64() * 1000.0,
            "contact assembly timing"
        );
    }

    #[cfg(not(feature = "timing"))]
    pub fn log_summary(&self) {}
}

#[cfg(feature = "timing")]
thread_local! {
    static TIMING_STATS: RefCell<TimingStats> = RefCell::new(TimingStats::new());
}

#[cfg(feature = "timing")]
fn record<F, R>(f: F, slot: fn(&mut TimingStats) -> &mut Vec<Duration>) -> R
where
    F: FnOnce() -> R,
{
    let start = std::time::Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    TIMING_STATS.with(|stats| slot(&mut stats.borrow_mut()).push(elapsed));
    result
}

#[cfg(feature = "timing")]
pub fn reset_timing() {
    TIMING_STATS.with(|stats| {
        *stats.borrow_mut() = TimingStats::new();
    });
}

#[cfg(not(feature = "timing"))]
pub fn reset_timing() {}

#[cfg(feature = "timing")]
pub fn timing_snapshot() -> TimingStats {
    TIMING_STATS.with(|stats| stats.borrow().clone())
}

#[cfg(not(feature = "timing"))]
pub fn timing_snapshot() -> TimingStats {
    TimingStats::new()
}

#[cfg(feature = "timing")]
pub fn record_preprocess<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    record(f, |s| &mut s.preprocess_times)
}

#[cfg(not(feature = "timing"))]
pub fn record_preprocess<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn record_residual<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    record(f, |s| &mut s.residual_times)
}

#[cfg(not(feature = "timing"))]
pub fn record_residual<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

#[cfg(feature = "timing")]
pub fn record_jacobian<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    record(f, |s| &mut s.jacobian_times)
}

#[cfg(not(feature = "timing"))]
pub fn record_jacobian<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}
