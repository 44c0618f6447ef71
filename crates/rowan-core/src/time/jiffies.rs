//! Monotonic tick counter.

use core::sync::atomic::{AtomicU64, Ordering};

/// A monotonic counter of periodic tick interrupts.
///
/// Plain atomic loads and stores; readers never see a torn value and
/// the tick handler never blocks on it.
pub struct Jiffies(AtomicU64);

impl Jiffies {
    /// Creates a counter starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Returns the current tick count.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    /// Advances the counter by `ticks`.
    pub fn advance(&self, ticks: u64) {
        self.0.fetch_add(ticks, Ordering::Relaxed);
    }
}

impl Default for Jiffies {
    fn default() -> Self {
        Self::new()
    }
}

/// The global tick counter, advanced once per periodic tick.
pub static JIFFIES: Jiffies = Jiffies::new();

/// Returns `true` if tick count `a` is after `b`.
///
/// Comparison is done on the signed difference, so it stays correct
/// across counter wraparound as long as the two values are within half
/// the counter range of each other.
#[must_use]
pub const fn time_after(a: u64, b: u64) -> bool {
    (b.wrapping_sub(a) as i64) < 0
}

/// Returns `true` if tick count `a` is before `b`.
#[must_use]
pub const fn time_before(a: u64, b: u64) -> bool {
    time_after(b, a)
}
