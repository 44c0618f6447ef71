//! BCM2837 system timer.
//!
//! A free-running 64-bit counter at 1 MHz with four compare channels.
//! Channels 0 and 2 belong to the GPU; the kernel drives the periodic
//! tick from channel 3, whose interrupt arrives on ARMCTRL bank 1
//! bit 3.

use rowan_core::addr::VirtAddr;
use rowan_core::id::{DevId, HwIrq, Virq};
use rowan_core::irq::{self, ActionFlags, IrqError, IrqReturn};
use rowan_core::time::{ClockEventDevice, TICK_HZ, clockevents};

use crate::irqchip::bcm2837_armctrl::virq_for;

/// Bus address of the system timer register block.
pub const SYSTEM_TIMER_BASE: VirtAddr = VirtAddr::new(0x3F00_3000);

/// Counter frequency in Hz.
pub const TIMER_FREQ_HZ: u32 = 1_000_000;

/// Tick period in timer ticks: 10 ms at 1 MHz.
pub const TICK_PERIOD: u32 = TIMER_FREQ_HZ / TICK_HZ;

/// Compare channel reserved for the ARM core.
const TICK_CHANNEL: u32 = 3;

/// Virtual IRQ of the tick channel: ARMCTRL bank 1, bit 3.
pub const SYSTEM_TIMER_IRQ: Virq = virq_for(1, TICK_CHANNEL);

const REG_CS: u64 = 0x00;
const REG_CLO: u64 = 0x04;
const REG_CHI: u64 = 0x08;

const fn reg_compare(channel: u32) -> u64 {
    0x0C + 4 * channel as u64
}

/// Scaling factor for converting timer ticks to nanoseconds.
const CLOCKSOURCE_SHIFT: u32 = 10;
const CLOCKSOURCE_MULT: u64 = (1_000_000_000u64 << CLOCKSOURCE_SHIFT) / TIMER_FREQ_HZ as u64;

/// One compare channel of the system timer.
pub struct SystemTimer {
    base: VirtAddr,
    channel: u32,
}

impl SystemTimer {
    /// Creates the driver over the given register block and channel.
    #[must_use]
    pub const fn new(base: VirtAddr, channel: u32) -> Self {
        Self { base, channel }
    }

    fn read_reg(&self, offset: u64) -> u32 {
        // SAFETY: The base points at the timer's register block (or a
        // test image of it) and every offset used is within the block.
        unsafe { self.base.offset(offset).as_ptr::<u32>().read_volatile() }
    }

    fn write_reg(&self, offset: u64, value: u32) {
        // SAFETY: As for read_reg.
        unsafe {
            self.base
                .offset(offset)
                .as_mut_ptr::<u32>()
                .write_volatile(value);
        }
    }

    /// Low word of the free-running counter.
    #[must_use]
    pub fn counter_low(&self) -> u32 {
        self.read_reg(REG_CLO)
    }

    /// Full 64-bit counter value.
    ///
    /// The two halves are separate registers, so the high word is
    /// re-read until it is stable across the low-word read.
    #[must_use]
    pub fn counter(&self) -> u64 {
        loop {
            let hi = self.read_reg(REG_CHI);
            let lo = self.read_reg(REG_CLO);
            if self.read_reg(REG_CHI) == hi {
                return (u64::from(hi) << 32) | u64::from(lo);
            }
        }
    }

    /// Counter value converted to nanoseconds since power-on.
    #[must_use]
    pub fn nanos(&self) -> u64 {
        let ticks = u128::from(self.counter());
        ((ticks * u128::from(CLOCKSOURCE_MULT)) >> CLOCKSOURCE_SHIFT) as u64
    }

    /// Whether this channel's compare has matched since the last clear.
    #[must_use]
    pub fn match_pending(&self) -> bool {
        self.read_reg(REG_CS) & (1 << self.channel) != 0
    }

    /// Clears this channel's match flag. The status register is
    /// write-1-to-clear, so other channels are untouched.
    pub fn clear_match(&self) {
        self.write_reg(REG_CS, 1 << self.channel);
    }
}

impl ClockEventDevice for SystemTimer {
    fn name(&self) -> &'static str {
        "bcm2837-system-timer"
    }

    fn set_next_event(&self, delta: u32) {
        // Deadlines are relative to the counter at call time. A late
        // tick therefore drifts instead of bursting to catch up.
        let now = self.counter_low();
        self.write_reg(reg_compare(self.channel), now.wrapping_add(delta));
    }
}

static SYSTEM_TIMER: SystemTimer = SystemTimer::new(SYSTEM_TIMER_BASE, TICK_CHANNEL);

/// Tick interrupt action. The line is shared with the GPU channels, so
/// an interrupt without our match flag set is declined.
fn tick_action(_hwirq: HwIrq, _dev: DevId) -> IrqReturn {
    if !SYSTEM_TIMER.match_pending() {
        return IrqReturn::None;
    }
    SYSTEM_TIMER.clear_match();
    clockevents::handle_event();
    IrqReturn::Handled
}

/// Registers the tick channel and starts the periodic tick.
///
/// Must run after the ARMCTRL controller is initialized.
pub fn init() -> Result<(), IrqError> {
    SYSTEM_TIMER.clear_match();
    irq::request_irq(
        SYSTEM_TIMER_IRQ,
        tick_action,
        ActionFlags::TIMER | ActionFlags::SHARED,
        DevId::from_ref(&SYSTEM_TIMER),
    )?;
    irq::enable_irq(SYSTEM_TIMER_IRQ);
    clockevents::config_and_register(&SYSTEM_TIMER, TICK_PERIOD);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan_core::time::{ClockEvents, Jiffies};

    // Register image: CS, CLO, CHI, C0..C3.
    fn mock_block() -> (&'static mut [u32; 7], VirtAddr) {
        let block = Box::leak(Box::new([0u32; 7]));
        let base = VirtAddr::new(block.as_ptr() as u64);
        (block, base)
    }

    #[test]
    fn tick_irq_is_armctrl_bank1_bit3() {
        assert_eq!(SYSTEM_TIMER_IRQ, Virq::new(51));
    }

    #[test]
    fn next_event_is_relative_to_current_counter() {
        let (block, base) = mock_block();
        let timer = SystemTimer::new(base, TICK_CHANNEL);

        block[1] = 12_345; // CLO
        timer.set_next_event(TICK_PERIOD);
        assert_eq!(block[6], 22_345); // C3
    }

    #[test]
    fn next_event_wraps_with_counter() {
        let (block, base) = mock_block();
        let timer = SystemTimer::new(base, TICK_CHANNEL);

        block[1] = u32::MAX - 5;
        timer.set_next_event(10);
        assert_eq!(block[6], 4);
    }

    #[test]
    fn late_tick_drifts_instead_of_bursting() {
        let (block, base) = mock_block();
        let timer: &'static SystemTimer =
            Box::leak(Box::new(SystemTimer::new(base, TICK_CHANNEL)));

        let mut events = ClockEvents::new();
        let jiffies = Jiffies::new();
        block[1] = 0;
        events.config_and_register(timer, TICK_PERIOD);
        assert_eq!(block[6], TICK_PERIOD);

        // The interrupt is served 2500 ticks late. The next deadline is
        // still a full period from "now", not from the old deadline.
        block[1] = TICK_PERIOD + 2_500;
        events.tick(&jiffies);
        assert_eq!(block[6], 2 * TICK_PERIOD + 2_500);
        assert_eq!(jiffies.get(), 1);
    }

    #[test]
    fn match_flag_clear_targets_own_channel() {
        let (block, base) = mock_block();
        let timer = SystemTimer::new(base, TICK_CHANNEL);

        block[0] = (1 << 3) | (1 << 1); // CS: channels 1 and 3 matched
        assert!(timer.match_pending());
        timer.clear_match();
        // Write-1-to-clear: only our channel's bit is written.
        assert_eq!(block[0], 1 << 3);

        block[0] = 1 << 1;
        assert!(!timer.match_pending());
    }

    #[test]
    fn full_counter_combines_both_words() {
        let (block, base) = mock_block();
        let timer = SystemTimer::new(base, TICK_CHANNEL);

        block[1] = 7; // CLO
        block[2] = 2; // CHI
        assert_eq!(timer.counter(), 0x2_0000_0007);
    }

    #[test]
    fn nanos_scales_microsecond_ticks() {
        let (block, base) = mock_block();
        let timer = SystemTimer::new(base, TICK_CHANNEL);

        block[1] = 5;
        assert_eq!(timer.nanos(), 5_000);
    }
}
