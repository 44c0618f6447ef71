//! BCM2837 ARMCTRL secondary interrupt controller.
//!
//! Multiplexes the SoC peripherals behind the local controller's GPU
//! line. Three banks of pending/enable/disable registers: bank 0 holds
//! the 8 "basic" ARM interrupts, banks 1 and 2 the 64 GPU interrupts.
//! Hardware line numbers pack the bank in bits 5.. and the bit index in
//! bits 0..5; virtual numbers are the hardware number plus
//! [`ARMCTRL_IRQ_OFFSET`].

use rowan_core::addr::VirtAddr;
use rowan_core::id::{HwIrq, Virq};
use rowan_core::irq::{self, ChainedHandler, FlowHandler, IrqChip, IrqError, IrqTable};

use super::bcm2837_local::lines;

/// Bus address of the ARMCTRL register block.
pub const ARMCTRL_BASE: VirtAddr = VirtAddr::new(0x3F00_B200);

/// Offset of ARMCTRL hardware lines in the virtual IRQ space.
pub const ARMCTRL_IRQ_OFFSET: u32 = 16;

/// Number of register banks.
pub const ARMCTRL_BANKS: usize = 3;

/// Meaningful lines per bank.
pub const BANK_IRQS: [u32; ARMCTRL_BANKS] = [8, 32, 32];

const BANK_PENDING: [u64; ARMCTRL_BANKS] = [0x00, 0x04, 0x08];
const BANK_ENABLE: [u64; ARMCTRL_BANKS] = [0x18, 0x10, 0x14];
const BANK_DISABLE: [u64; ARMCTRL_BANKS] = [0x24, 0x1C, 0x20];

const fn bank_of(hwirq: HwIrq) -> usize {
    (hwirq.as_u32() >> 5) as usize
}

const fn bit_of(hwirq: HwIrq) -> u32 {
    hwirq.as_u32() & 0x1F
}

/// Virtual IRQ number for an ARMCTRL bank/bit pair.
#[must_use]
pub const fn virq_for(bank: u32, bit: u32) -> Virq {
    Virq::new(ARMCTRL_IRQ_OFFSET + (bank << 5) + bit)
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

/// Capability for all ARMCTRL lines.
///
/// Enable and disable registers are write-1-to-act, so masking needs no
/// read-modify-write and is naturally idempotent.
pub struct ArmctrlChip {
    base: VirtAddr,
}

impl ArmctrlChip {
    /// Creates the chip over the given register block.
    #[must_use]
    pub const fn new(base: VirtAddr) -> Self {
        Self { base }
    }
}

impl IrqChip for ArmctrlChip {
    fn name(&self) -> &'static str {
        "bcm2837-armctrl"
    }

    fn mask(&self, hwirq: HwIrq) {
        write_reg(self.base, BANK_DISABLE[bank_of(hwirq)], 1 << bit_of(hwirq));
    }

    fn unmask(&self, hwirq: HwIrq) {
        write_reg(self.base, BANK_ENABLE[bank_of(hwirq)], 1 << bit_of(hwirq));
    }
}

/// Chained scan-and-redispatch hook for the GPU parent line.
pub struct ArmctrlIntc {
    base: VirtAddr,
}

impl ArmctrlIntc {
    /// Creates the dispatcher over the given register block.
    #[must_use]
    pub const fn new(base: VirtAddr) -> Self {
        Self { base }
    }

    /// Dispatches every pending ARMCTRL line into `table`.
    ///
    /// Each bank's pending word is snapshotted once and drained lowest
    /// bit first; a line asserting after the snapshot re-raises the
    /// parent IRQ.
    pub fn dispatch_pending(&self, table: &mut IrqTable) {
        for bank in 0..ARMCTRL_BANKS {
            let mut pending = read_reg(self.base, BANK_PENDING[bank]);
            while pending != 0 {
                let bit = pending.trailing_zeros();
                pending &= !(1 << bit);
                table.dispatch(virq_for(bank as u32, bit));
            }
        }
    }
}

impl ChainedHandler for ArmctrlIntc {
    fn handle(&self, table: &mut IrqTable) {
        self.dispatch_pending(table);
    }
}

static ARMCTRL_CHIP: ArmctrlChip = ArmctrlChip::new(ARMCTRL_BASE);
static ARMCTRL_INTC: ArmctrlIntc = ArmctrlIntc::new(ARMCTRL_BASE);

/// Binds all ARMCTRL lines and chains the controller off the GPU line.
///
/// Must run after [`super::bcm2837_local::init`] so the parent line is
/// already bound.
pub fn init() -> Result<(), IrqError> {
    irq::with_table(|table| {
        for bank in 0..ARMCTRL_BANKS {
            for bit in 0..BANK_IRQS[bank] {
                let hwirq = HwIrq::new(((bank as u32) << 5) + bit);
                table.bind(
                    virq_for(bank as u32, bit),
                    hwirq,
                    &ARMCTRL_CHIP,
                    FlowHandler::Level,
                )?;
            }
        }
        table.set_chained(Virq::new(lines::GPU_FAST), &ARMCTRL_INTC)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan_core::id::DevId;
    use rowan_core::irq::{ActionFlags, IrqReturn};
    use std::sync::Mutex;

    // Register image covering offsets 0x00..0x28 of the ARMCTRL block.
    fn mock_block() -> (&'static mut [u32; 10], VirtAddr) {
        let block = Box::leak(Box::new([0u32; 10]));
        let base = VirtAddr::new(block.as_ptr() as u64);
        (block, base)
    }

    static SEEN: Mutex<Vec<(u32, u32)>> = Mutex::new(Vec::new());

    fn recording_handler(hwirq: HwIrq, dev: DevId) -> IrqReturn {
        SEEN.lock().unwrap().push((hwirq.as_u32(), dev.as_usize() as u32));
        IrqReturn::Handled
    }

    #[test]
    fn virq_mapping_packs_bank_and_bit() {
        assert_eq!(virq_for(0, 5), Virq::new(21));
        assert_eq!(virq_for(1, 0), Virq::new(48));
        assert_eq!(virq_for(1, 3), Virq::new(51));
        assert_eq!(virq_for(2, 31), Virq::new(111));
    }

    #[test]
    fn mask_unmask_hit_per_bank_registers() {
        let (block, base) = mock_block();
        let chip = ArmctrlChip::new(base);

        // Bank 1 bit 3: enable at 0x10, disable at 0x1C.
        chip.unmask(HwIrq::new(35));
        assert_eq!(block[4], 1 << 3);
        chip.mask(HwIrq::new(35));
        assert_eq!(block[7], 1 << 3);

        // Bank 0 bit 7: enable at 0x18, disable at 0x24.
        chip.unmask(HwIrq::new(7));
        assert_eq!(block[6], 1 << 7);
        chip.mask(HwIrq::new(7));
        assert_eq!(block[9], 1 << 7);
    }

    #[test]
    fn chained_dispatch_drains_bank_lowest_first() {
        let (block, base) = mock_block();
        let chip = Box::leak(Box::new(ArmctrlChip::new(base)));
        let intc = Box::leak(Box::new(ArmctrlIntc::new(base)));

        let mut table = IrqTable::new();
        table.reset();

        // Parent line as the local controller binds it.
        struct NopChip;
        impl IrqChip for NopChip {
            fn name(&self) -> &'static str {
                "nop"
            }
            fn mask(&self, _hwirq: HwIrq) {}
            fn unmask(&self, _hwirq: HwIrq) {}
        }
        static PARENT: NopChip = NopChip;
        table
            .bind(
                Virq::new(lines::GPU_FAST),
                HwIrq::new(lines::GPU_FAST),
                &PARENT,
                FlowHandler::Simple,
            )
            .unwrap();
        table.set_chained(Virq::new(lines::GPU_FAST), intc).unwrap();

        for bit in [0u32, 2] {
            let virq = virq_for(1, bit);
            table
                .bind(virq, HwIrq::new(32 + bit), chip, FlowHandler::Level)
                .unwrap();
            table
                .request(
                    virq,
                    recording_handler,
                    ActionFlags::SHARED,
                    DevId::new(bit as usize),
                )
                .unwrap();
        }

        // Bank 1 pending (0x04): bits 0 and 2 asserted.
        block[1] = 0b101;
        SEEN.lock().unwrap().clear();
        table.dispatch(Virq::new(lines::GPU_FAST));

        // Both lines dispatched, lowest bit first, handlers seeing the
        // controller-local hardware numbers.
        assert_eq!(*SEEN.lock().unwrap(), [(32, 0), (34, 2)]);
        assert_eq!(table.fire_count(virq_for(1, 0)), 1);
        assert_eq!(table.fire_count(virq_for(1, 2)), 1);
        assert_eq!(table.fire_count(Virq::new(lines::GPU_FAST)), 1);

        // Level flow masked and unmasked each line at its bank.
        assert_eq!(block[7], 1 << 2); // last disable write
        assert_eq!(block[4], 1 << 2); // last enable write
    }

    static SCAN_ORDER: Mutex<Vec<u32>> = Mutex::new(Vec::new());

    // Clears the line's bit in the pending word passed through the
    // token, the way a real device handler quenches its source.
    fn clearing_handler(hwirq: HwIrq, dev: DevId) -> IrqReturn {
        SCAN_ORDER.lock().unwrap().push(hwirq.as_u32());
        let reg = dev.as_usize() as *mut u32;
        // SAFETY: The test passed the address of its live register image.
        unsafe { *reg &= !(1 << (hwirq.as_u32() & 0x1F)) };
        IrqReturn::Handled
    }

    #[test]
    fn scan_covers_all_banks_in_ascending_order() {
        let (block, base) = mock_block();
        let chip = Box::leak(Box::new(ArmctrlChip::new(base)));
        let intc = ArmctrlIntc::new(base);

        let mut table = IrqTable::new();
        table.reset();

        // Pending bits 2, 5, and 9 spread across the three banks.
        let lines = [(0u32, 2u32), (1, 5), (2, 9)];
        for (bank, bit) in lines {
            let virq = virq_for(bank, bit);
            let hwirq = HwIrq::new((bank << 5) + bit);
            let pending_reg =
                std::ptr::from_ref(&block[bank as usize]) as usize;
            table.bind(virq, hwirq, chip, FlowHandler::Level).unwrap();
            table
                .request(
                    virq,
                    clearing_handler,
                    ActionFlags::empty(),
                    DevId::new(pending_reg),
                )
                .unwrap();
            block[bank as usize] |= 1 << bit;
        }

        SCAN_ORDER.lock().unwrap().clear();
        intc.dispatch_pending(&mut table);

        // One dispatch per line, ascending (bank, bit) order, and every
        // source cleared by its own action.
        assert_eq!(*SCAN_ORDER.lock().unwrap(), [2, 37, 73]);
        assert_eq!(block[0..3], [0, 0, 0]);
        for (bank, bit) in lines {
            assert_eq!(table.fire_count(virq_for(bank, bit)), 1);
        }
    }

    #[test]
    fn empty_banks_dispatch_nothing() {
        let (_block, base) = mock_block();
        let intc = ArmctrlIntc::new(base);
        let mut table = IrqTable::new();
        table.reset();

        intc.dispatch_pending(&mut table);
        assert_eq!(table.spurious_count(), 0);
        assert_eq!(table.fire_count(virq_for(0, 0)), 0);
    }
}
