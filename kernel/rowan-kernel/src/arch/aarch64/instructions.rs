//! Low-level interrupt masking and idle primitives.

use aarch64_cpu::asm;

/// Unmasks IRQs at the current exception level.
///
/// # Safety
///
/// The exception vectors and at least one controller driver must be
/// installed first; an IRQ taken before that is dropped at the entry
/// stub.
#[inline]
pub unsafe fn local_irq_enable() {
    // SAFETY: Clearing the I bit only allows exceptions the caller has
    // prepared for.
    unsafe {
        core::arch::asm!("msr DAIFClr, #2", options(nomem, nostack, preserves_flags));
    }
}

/// Masks IRQs at the current exception level.
#[inline]
pub fn local_irq_disable() {
    // SAFETY: Masking IRQs is always safe at EL1.
    unsafe {
        core::arch::asm!("msr DAIFSet, #2", options(nomem, nostack, preserves_flags));
    }
}

/// Parks the core until the next event or interrupt.
#[inline]
pub fn wait_for_event() {
    asm::wfe();
}

/// Parks the core forever.
pub fn halt() -> ! {
    loop {
        asm::wfe();
    }
}
