//! Time subsystem: periodic tick, jiffies, and clock event devices.

pub mod clockevents;
pub mod jiffies;

pub use clockevents::{ClockEventDevice, ClockEvents};
pub use jiffies::{JIFFIES, Jiffies, time_after, time_before};

/// Periodic tick rate in ticks per second.
pub const TICK_HZ: u32 = 100;
