//! Primary-core bring-up.
//!
//! The firmware drops all four cores into `_start`. Secondary cores are
//! parked; core 0 sets up a stack and walks the bring-up sequence:
//! logging, descriptor table, exception vectors, interrupt controllers,
//! then the periodic tick. Once IRQs are unmasked the core sits in the
//! idle loop and all further work happens in interrupt context.

use rowan_drivers::irqchip::{bcm2837_armctrl, bcm2837_local};
use rowan_drivers::timer::bcm2837 as system_timer;

use crate::arch::aarch64::{exceptions, instructions};
use crate::{config, kerr, kinfo, kprintln, log};

core::arch::global_asm!(
    r#"
.section .text._start, "ax"
.global _start
_start:
    // Park everything but core 0.
    mrs x0, MPIDR_EL1
    and x0, x0, #3
    cbnz x0, 1f

    ldr x1, =__rowan_boot_stack_top
    mov sp, x1
    bl kernel_main
1:
    wfe
    b 1b

.section .bss.boot_stack, "aw", %nobits
.balign 16
__rowan_boot_stack:
    .space {stack_size}
__rowan_boot_stack_top:
"#,
    stack_size = const config::BOOT_STACK_SIZE,
);

/// Rust entry point for the primary core.
#[unsafe(no_mangle)]
pub extern "C" fn kernel_main() -> ! {
    log::init();
    kprintln!();
    kinfo!(
        "rowan {} booting on BCM2837, {} IRQ descriptors",
        env!("CARGO_PKG_VERSION"),
        config::NR_IRQS
    );

    rowan_core::irq::init();
    // SAFETY: Single call on core 0, IRQs still masked.
    unsafe { exceptions::install() };

    if let Err(err) = bcm2837_local::init() {
        kerr!("local intc init failed: {err}");
    }
    if let Err(err) = bcm2837_armctrl::init() {
        kerr!("armctrl init failed: {err}");
    }
    if let Err(err) = system_timer::init() {
        kerr!("system timer init failed: {err}");
    }
    kinfo!(
        "tick source: {} at {} Hz",
        rowan_core::time::clockevents::active_device_name().unwrap_or("none"),
        config::TICK_HZ
    );

    // SAFETY: Vectors, dispatch entry, and the tick source are in place.
    unsafe { instructions::local_irq_enable() };
    kinfo!("entering idle loop");

    loop {
        instructions::wait_for_event();
    }
}
