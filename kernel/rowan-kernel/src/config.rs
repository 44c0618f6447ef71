//! Kernel configuration constants.

use crate::log::LogLevel;

pub use rowan_core::id::MAX_CPUS;
pub use rowan_core::irq::NR_IRQS;
pub use rowan_core::time::TICK_HZ;

/// Most verbose log level emitted by the kernel logger.
pub const MAX_LOG_LEVEL: LogLevel = LogLevel::Debug;

/// Size of the boot stack for the primary core.
pub const BOOT_STACK_SIZE: usize = 0x4000;
