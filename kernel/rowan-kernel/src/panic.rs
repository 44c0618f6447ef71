//! Kernel panic handler.

use core::panic::PanicInfo;

use crate::arch::aarch64::instructions;
use crate::kfatal;

#[panic_handler]
fn panic(info: &PanicInfo<'_>) -> ! {
    instructions::local_irq_disable();
    kfatal!("kernel panic: {info}");
    instructions::halt()
}
