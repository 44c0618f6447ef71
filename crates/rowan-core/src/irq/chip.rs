//! Controller capability traits.

use crate::id::HwIrq;

use super::table::IrqTable;

/// Hardware operations an interrupt controller provides for its lines.
///
/// Implementations close over their controller's register base, so a
/// single static chip instance serves every line it controls. All
/// operations take the controller-local hardware line number, never the
/// virtual one.
///
/// `mask` and `unmask` must be idempotent: masking a masked line or
/// unmasking an unmasked one is a no-op at the register level.
pub trait IrqChip: Sync {
    /// Human-readable controller name for diagnostics.
    fn name(&self) -> &'static str;

    /// Prevents the line from raising interrupts.
    fn mask(&self, hwirq: HwIrq);

    /// Allows the line to raise interrupts again.
    fn unmask(&self, hwirq: HwIrq);

    /// Acknowledges the current interrupt on the line.
    ///
    /// Most lines on this SoC are acknowledged at the device, so the
    /// default does nothing.
    fn ack(&self, hwirq: HwIrq) {
        let _ = hwirq;
    }
}

/// Flow hook for a parent line that multiplexes a secondary controller.
///
/// The handler receives the already-locked descriptor table so it can
/// re-dispatch the secondary controller's pending lines without
/// re-acquiring the dispatch lock.
pub trait ChainedHandler: Sync {
    /// Scans the secondary controller and dispatches its pending lines.
    fn handle(&self, table: &mut IrqTable);
}
