//! Arch-to-subsystem dispatch entry point.
//!
//! The exception vectors are assembled long before any controller driver
//! runs, so the root dispatch function is reached through an atomic
//! function pointer the platform driver installs during bring-up. An IRQ
//! taken before installation is silently dropped.

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use super::IrqError;

/// Root dispatch function: reads the platform's pending state and feeds
/// it into the descriptor table.
pub type IrqEntryFn = fn();

static HANDLE_ARCH_IRQ: AtomicPtr<()> = AtomicPtr::new(ptr::null_mut());

/// Installs the root dispatch function.
///
/// May succeed exactly once; later calls fail with
/// [`IrqError::EntryInstalled`] and leave the original in place.
pub fn set_handle_irq(entry: IrqEntryFn) -> Result<(), IrqError> {
    HANDLE_ARCH_IRQ
        .compare_exchange(
            ptr::null_mut(),
            entry as *mut (),
            Ordering::AcqRel,
            Ordering::Acquire,
        )
        .map(|_| ())
        .map_err(|_| IrqError::EntryInstalled)
}

/// Called by the exception vector on every IRQ.
pub fn irq_entry() {
    let entry = HANDLE_ARCH_IRQ.load(Ordering::Acquire);
    if entry.is_null() {
        return;
    }
    // SAFETY: The pointer was stored by set_handle_irq from a valid
    // IrqEntryFn and is never changed afterwards.
    let entry: IrqEntryFn = unsafe { core::mem::transmute(entry) };
    entry();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    static ENTERED: AtomicUsize = AtomicUsize::new(0);

    fn count_entry() {
        ENTERED.fetch_add(1, Ordering::Relaxed);
    }

    // Installation is process-global, so a single test covers the whole
    // life cycle.
    #[test]
    fn entry_life_cycle() {
        // Before installation an IRQ is dropped.
        irq_entry();
        assert_eq!(ENTERED.load(Ordering::Relaxed), 0);

        set_handle_irq(count_entry).unwrap();
        irq_entry();
        irq_entry();
        assert_eq!(ENTERED.load(Ordering::Relaxed), 2);

        // A second installation is rejected and the first stays active.
        assert_eq!(set_handle_irq(count_entry), Err(IrqError::EntryInstalled));
        irq_entry();
        assert_eq!(ENTERED.load(Ordering::Relaxed), 3);
    }
}
