//! BCM2837 per-CPU local interrupt controller.
//!
//! The root controller on this SoC: every IRQ a core takes is first
//! reported in the core's local pending register. Lines 0-3 are the
//! generic timers, 4-7 the mailboxes, 8 the GPU interrupt (behind which
//! the ARMCTRL secondary controller multiplexes the peripherals), and
//! 9 the PMU. Local lines map to virtual IRQs with no offset.

use rowan_core::addr::VirtAddr;
use rowan_core::id::{CpuId, HwIrq, Virq};
use rowan_core::irq::{self, FlowHandler, IrqChip, IrqError, IrqTable};

/// Bus address of the local controller's register block.
pub const LOCAL_INTC_BASE: VirtAddr = VirtAddr::new(0x4000_0000);

/// Number of interrupt lines on the local controller.
pub const LOCAL_IRQ_COUNT: u32 = 10;

/// Hardware line numbers on the local controller.
pub mod lines {
    /// Secure physical generic timer.
    pub const CNTPSIRQ: u32 = 0;
    /// Non-secure physical generic timer.
    pub const CNTPNSIRQ: u32 = 1;
    /// Hypervisor generic timer.
    pub const CNTHPIRQ: u32 = 2;
    /// Virtual generic timer.
    pub const CNTVIRQ: u32 = 3;
    /// First core-to-core mailbox.
    pub const MAILBOX0: u32 = 4;
    /// GPU interrupt; parent line of the ARMCTRL secondary controller.
    pub const GPU_FAST: u32 = 8;
    /// Performance monitor unit.
    pub const PMU_FAST: u32 = 9;
}

const REG_PM_ROUTING_SET: u64 = 0x10;
const REG_PM_ROUTING_CLR: u64 = 0x14;

const fn reg_timer_ctrl(cpu: CpuId) -> u64 {
    0x40 + 4 * cpu.as_usize() as u64
}

const fn reg_pending(cpu: CpuId) -> u64 {
    0x60 + 4 * cpu.as_usize() as u64
}

fn read_reg(base: VirtAddr, offset: u64) -> u32 {
    // SAFETY: The base points at the controller's register block (or a
    // test image of it) and every offset used is within the block.
    unsafe { base.offset(offset).as_ptr::<u32>().read_volatile() }
}

fn write_reg(base: VirtAddr, offset: u64, value: u32) {
    // SAFETY: As for read_reg.
    unsafe { base.offset(offset).as_mut_ptr::<u32>().write_volatile(value) }
}

/// Capability for the per-CPU generic timer lines (0-3).
///
/// Enable bits live in the calling core's timer control register, one
/// bit per line.
pub struct LocalTimerChip {
    base: VirtAddr,
}

impl LocalTimerChip {
    /// Creates the chip over the given register block.
    #[must_use]
    pub const fn new(base: VirtAddr) -> Self {
        Self { base }
    }
}

impl IrqChip for LocalTimerChip {
    fn name(&self) -> &'static str {
        "bcm2837-local-timer"
    }

    fn mask(&self, hwirq: HwIrq) {
        let reg = reg_timer_ctrl(CpuId::current());
        let ctrl = read_reg(self.base, reg);
        write_reg(self.base, reg, ctrl & !(1 << hwirq.as_u32()));
    }

    fn unmask(&self, hwirq: HwIrq) {
        let reg = reg_timer_ctrl(CpuId::current());
        let ctrl = read_reg(self.base, reg);
        write_reg(self.base, reg, ctrl | (1 << hwirq.as_u32()));
    }
}

/// Capability for the PMU line (9).
///
/// Routing is controlled through write-only set/clear registers holding
/// one bit per core.
pub struct LocalPmuChip {
    base: VirtAddr,
}

impl LocalPmuChip {
    /// Creates the chip over the given register block.
    #[must_use]
    pub const fn new(base: VirtAddr) -> Self {
        Self { base }
    }
}

impl IrqChip for LocalPmuChip {
    fn name(&self) -> &'static str {
        "bcm2837-local-pmu"
    }

    fn mask(&self, _hwirq: HwIrq) {
        write_reg(
            self.base,
            REG_PM_ROUTING_CLR,
            1 << CpuId::current().as_u32(),
        );
    }

    fn unmask(&self, _hwirq: HwIrq) {
        write_reg(
            self.base,
            REG_PM_ROUTING_SET,
            1 << CpuId::current().as_u32(),
        );
    }
}

/// Capability for the GPU parent line (8).
///
/// The line itself cannot be gated here; the ARMCTRL controller behind
/// it masks its own lines, so these operations do nothing.
pub struct LocalGpuChip;

impl IrqChip for LocalGpuChip {
    fn name(&self) -> &'static str {
        "bcm2837-local-gpu"
    }

    fn mask(&self, _hwirq: HwIrq) {}

    fn unmask(&self, _hwirq: HwIrq) {}
}

/// Pending-state reader and root dispatcher for the local controller.
pub struct LocalIntc {
    base: VirtAddr,
}

impl LocalIntc {
    /// Creates the dispatcher over the given register block.
    #[must_use]
    pub const fn new(base: VirtAddr) -> Self {
        Self { base }
    }

    /// Reads the raw pending word for `cpu`.
    #[must_use]
    pub fn pending(&self, cpu: CpuId) -> u32 {
        read_reg(self.base, reg_pending(cpu))
    }

    /// Dispatches the calling core's pending state into `table`.
    ///
    /// Only the lowest pending line is dispatched per invocation; any
    /// other line still asserted re-raises the IRQ immediately after
    /// return. An empty pending word is counted as spurious.
    pub fn dispatch_pending(&self, table: &mut IrqTable) {
        let pending = self.pending(CpuId::current());
        if pending == 0 {
            table.note_spurious();
            return;
        }
        let line = pending.trailing_zeros();
        if line < LOCAL_IRQ_COUNT {
            table.dispatch(Virq::new(line));
        } else {
            table.note_spurious();
        }
    }
}

static LOCAL_TIMER_CHIP: LocalTimerChip = LocalTimerChip::new(LOCAL_INTC_BASE);
static LOCAL_PMU_CHIP: LocalPmuChip = LocalPmuChip::new(LOCAL_INTC_BASE);
static LOCAL_GPU_CHIP: LocalGpuChip = LocalGpuChip;
static LOCAL_INTC: LocalIntc = LocalIntc::new(LOCAL_INTC_BASE);

fn root_dispatch() {
    irq::with_table(|table| LOCAL_INTC.dispatch_pending(table));
}

/// Binds the local controller's lines and installs the root dispatcher.
///
/// Must run after [`rowan_core::irq::init`] and before IRQs are
/// unmasked at the CPU.
pub fn init() -> Result<(), IrqError> {
    irq::with_table(|table| {
        for line in lines::CNTPSIRQ..=lines::CNTVIRQ {
            table.bind(
                Virq::new(line),
                HwIrq::new(line),
                &LOCAL_TIMER_CHIP,
                FlowHandler::Simple,
            )?;
        }
        table.bind(
            Virq::new(lines::GPU_FAST),
            HwIrq::new(lines::GPU_FAST),
            &LOCAL_GPU_CHIP,
            FlowHandler::Simple,
        )?;
        table.bind(
            Virq::new(lines::PMU_FAST),
            HwIrq::new(lines::PMU_FAST),
            &LOCAL_PMU_CHIP,
            FlowHandler::Simple,
        )
    })?;
    irq::set_handle_irq(root_dispatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan_core::id::DevId;
    use rowan_core::irq::{ActionFlags, IrqReturn};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Register image covering offsets 0x00..0x70 of the local block.
    fn mock_block() -> (&'static mut [u32; 28], VirtAddr) {
        let block = Box::leak(Box::new([0u32; 28]));
        let base = VirtAddr::new(block.as_ptr() as u64);
        (block, base)
    }

    fn counting_handler(_hwirq: HwIrq, dev: DevId) -> IrqReturn {
        let counter = dev.as_usize() as *const AtomicUsize;
        // SAFETY: The test passed the address of a leaked AtomicUsize.
        unsafe { (*counter).fetch_add(1, Ordering::Relaxed) };
        IrqReturn::Handled
    }

    fn leaked_counter() -> (&'static AtomicUsize, DevId) {
        let counter = Box::leak(Box::new(AtomicUsize::new(0)));
        let dev = DevId::new(std::ptr::from_ref(counter) as usize);
        (counter, dev)
    }

    #[test]
    fn timer_chip_toggles_ctrl_bits() {
        let (block, base) = mock_block();
        let chip = LocalTimerChip::new(base);

        // Host tests always run as CPU 0: ctrl register at 0x40.
        chip.unmask(HwIrq::new(lines::CNTVIRQ));
        chip.unmask(HwIrq::new(lines::CNTPNSIRQ));
        assert_eq!(block[16], (1 << 3) | (1 << 1));

        chip.mask(HwIrq::new(lines::CNTVIRQ));
        assert_eq!(block[16], 1 << 1);

        // Masking an already-masked line changes nothing.
        chip.mask(HwIrq::new(lines::CNTVIRQ));
        assert_eq!(block[16], 1 << 1);
    }

    #[test]
    fn pmu_chip_uses_set_clear_registers() {
        let (block, base) = mock_block();
        let chip = LocalPmuChip::new(base);

        chip.unmask(HwIrq::new(lines::PMU_FAST));
        assert_eq!(block[4], 1); // 0x10: routing set, CPU 0 bit
        chip.mask(HwIrq::new(lines::PMU_FAST));
        assert_eq!(block[5], 1); // 0x14: routing clear, CPU 0 bit
    }

    #[test]
    fn dispatch_takes_lowest_pending_line() {
        let (block, base) = mock_block();
        let intc = LocalIntc::new(base);
        let chip = Box::leak(Box::new(LocalTimerChip::new(base)));

        let mut table = IrqTable::new();
        table.reset();
        let (cntpns, dev1) = leaked_counter();
        let (cntv, dev3) = leaked_counter();
        for (line, dev) in [(lines::CNTPNSIRQ, dev1), (lines::CNTVIRQ, dev3)] {
            table
                .bind(Virq::new(line), HwIrq::new(line), chip, FlowHandler::Simple)
                .unwrap();
            table
                .request(Virq::new(line), counting_handler, ActionFlags::PER_CPU, dev)
                .unwrap();
        }

        // CPU 0 pending register at 0x60: lines 1 and 3 asserted.
        block[24] = (1 << 1) | (1 << 3);
        intc.dispatch_pending(&mut table);

        // Only the lowest line is dispatched per entry.
        assert_eq!(cntpns.load(Ordering::Relaxed), 1);
        assert_eq!(cntv.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn empty_pending_word_is_spurious() {
        let (_block, base) = mock_block();
        let intc = LocalIntc::new(base);
        let mut table = IrqTable::new();
        table.reset();

        intc.dispatch_pending(&mut table);
        assert_eq!(table.spurious_count(), 1);
    }

    #[test]
    fn out_of_range_pending_bit_is_spurious() {
        let (block, base) = mock_block();
        let intc = LocalIntc::new(base);
        let mut table = IrqTable::new();
        table.reset();

        block[24] = 1 << 12;
        intc.dispatch_pending(&mut table);
        assert_eq!(table.spurious_count(), 1);
    }
}
