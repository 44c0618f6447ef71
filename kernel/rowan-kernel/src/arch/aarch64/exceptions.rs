//! Exception vector installation and the fatal trap reporter.

use aarch64_cpu::asm::barrier;
use aarch64_cpu::registers::{ELR_EL1, ESR_EL1, FAR_EL1, SPSR_EL1, VBAR_EL1};
use tock_registers::interfaces::{Readable, Writeable};

use rowan_core::esr;
use rowan_core::id::CpuId;

use crate::{kfatal, kprintln};

use super::instructions;
use super::vectors;

/// Points `VBAR_EL1` at the vector table.
///
/// # Safety
///
/// Must be called once per core during bring-up, before IRQs are
/// unmasked.
pub unsafe fn install() {
    // SAFETY: The table is 2 KiB aligned and fully populated; taking
    // its address has no side effects.
    let table = unsafe { &raw const vectors::__rowan_exception_vectors };
    VBAR_EL1.set(table as u64);
    barrier::isb(barrier::SY);
}

/// Generic IRQ entry called from the vector trampoline.
#[unsafe(no_mangle)]
extern "C" fn rowan_irq_entry() {
    rowan_core::irq::irq_entry();
}

/// Fatal exception entry; `slot` is the vector table slot index.
#[unsafe(no_mangle)]
extern "C" fn rowan_fatal_entry(slot: u64) -> ! {
    fatal_trap(slot as usize)
}

/// Reports an unrecoverable exception and parks the core.
pub fn fatal_trap(slot: usize) -> ! {
    let esr = ESR_EL1.get();
    kfatal!(
        "unhandled exception on {}: {}",
        CpuId::current(),
        esr::vector_name(slot)
    );
    kprintln!("  class:    {}", esr::class_name(esr));
    kprintln!("  ESR_EL1:  {esr:#018x}");
    kprintln!("  ELR_EL1:  {:#018x}", ELR_EL1.get());
    kprintln!("  SPSR_EL1: {:#018x}", SPSR_EL1.get());
    kprintln!("  FAR_EL1:  {:#018x}", FAR_EL1.get());
    instructions::halt()
}
