//! Spin-based synchronization primitives.
//!
//! [`SpinLock`] is a plain TTAS lock; [`IrqSpinLock`] additionally masks
//! IRQs while held, so it is the only lock safe to share between
//! interrupt dispatch and normal kernel code.

mod irq_spinlock;
mod spinlock;

pub use irq_spinlock::{IrqSpinLock, IrqSpinLockGuard};
pub use spinlock::{SpinLock, SpinLockGuard};
