//! Generic interrupt subsystem.
//!
//! A fixed table of [`NR_IRQS`] descriptors maps virtual interrupt
//! numbers to controller capabilities ([`IrqChip`]), flow handlers, and
//! chains of registered actions. Controllers that sit behind a parent
//! line plug in through [`ChainedHandler`] and map their hardware lines
//! into the virtual space at an offset.
//!
//! The free functions here operate on the global table behind an
//! IRQ-masking lock and are the normal kernel-facing API; the types are
//! public so tests and drivers can also work against local tables.

mod chip;
mod entry;
mod table;

pub use chip::{ChainedHandler, IrqChip};
pub use entry::{IrqEntryFn, irq_entry, set_handle_irq};
pub use table::{
    ACTION_POOL_CAPACITY, ActionFlags, FlowHandler, IrqHandler, IrqReturn, IrqTable, NR_IRQS,
};

use core::fmt;

use crate::id::{DevId, Virq};
use crate::sync::IrqSpinLock;

/// Errors from the interrupt registration API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
    /// The virtual interrupt number is outside the descriptor table.
    InvalidIrq,
    /// The fixed action pool has no free slot left.
    PoolExhausted,
    /// The operation needs a line that was never bound to a controller.
    NotBound,
    /// A root dispatch entry is already installed.
    EntryInstalled,
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIrq => write!(f, "virtual IRQ out of range"),
            Self::PoolExhausted => write!(f, "action pool exhausted"),
            Self::NotBound => write!(f, "IRQ not bound to a controller"),
            Self::EntryInstalled => write!(f, "dispatch entry already installed"),
        }
    }
}

impl core::error::Error for IrqError {}

static IRQ_TABLE: IrqSpinLock<IrqTable> = IrqSpinLock::new(IrqTable::new());

/// Resets the global descriptor table.
///
/// Must run before any controller driver binds lines.
pub fn init() {
    IRQ_TABLE.lock().reset();
}

/// Runs `f` with the global table locked and IRQs masked.
///
/// Controller drivers use this to bind their lines at bring-up and to
/// dispatch from their pending-state scans.
pub fn with_table<R>(f: impl FnOnce(&mut IrqTable) -> R) -> R {
    f(&mut IRQ_TABLE.lock())
}

/// Registers `handler` on `virq`. See [`IrqTable::request`].
pub fn request_irq(
    virq: Virq,
    handler: IrqHandler,
    flags: ActionFlags,
    dev: DevId,
) -> Result<(), IrqError> {
    IRQ_TABLE.lock().request(virq, handler, flags, dev)
}

/// Removes the registration on `virq` whose token matches `dev`.
pub fn free_irq(virq: Virq, dev: DevId) {
    IRQ_TABLE.lock().release(virq, dev);
}

/// Unmasks `virq` at its controller.
pub fn enable_irq(virq: Virq) {
    IRQ_TABLE.lock().enable(virq);
}

/// Masks `virq` at its controller.
pub fn disable_irq(virq: Virq) {
    IRQ_TABLE.lock().disable(virq);
}

/// Dispatches one interrupt through the global table.
pub fn generic_handle_irq(virq: Virq) {
    IRQ_TABLE.lock().dispatch(virq);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::HwIrq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullChip;
    impl IrqChip for NullChip {
        fn name(&self) -> &'static str {
            "null"
        }
        fn mask(&self, _hwirq: HwIrq) {}
        fn unmask(&self, _hwirq: HwIrq) {}
    }
    static NULL_CHIP: NullChip = NullChip;

    static GLOBAL_FIRED: AtomicUsize = AtomicUsize::new(0);

    fn global_handler(_hwirq: HwIrq, _dev: DevId) -> IrqReturn {
        GLOBAL_FIRED.fetch_add(1, Ordering::Relaxed);
        IrqReturn::Handled
    }

    // The table is process-global and tests run in parallel, so the
    // whole request/dispatch/free cycle lives in one test on a line no
    // other test touches.
    #[test]
    fn global_request_dispatch_free() {
        let virq = Virq::new(111);
        let dev = DevId::new(0x111);

        with_table(|t| t.bind(virq, HwIrq::new(11), &NULL_CHIP, FlowHandler::Simple)).unwrap();
        request_irq(virq, global_handler, ActionFlags::empty(), dev).unwrap();
        enable_irq(virq);

        generic_handle_irq(virq);
        generic_handle_irq(virq);
        assert_eq!(GLOBAL_FIRED.load(Ordering::Relaxed), 2);

        free_irq(virq, dev);
        generic_handle_irq(virq);
        assert_eq!(GLOBAL_FIRED.load(Ordering::Relaxed), 2);

        disable_irq(virq);
        assert_eq!(with_table(|t| t.fire_count(virq)), 3);
    }

    #[test]
    fn error_display() {
        assert_eq!(IrqError::InvalidIrq.to_string(), "virtual IRQ out of range");
        assert_eq!(IrqError::PoolExhausted.to_string(), "action pool exhausted");
    }
}
