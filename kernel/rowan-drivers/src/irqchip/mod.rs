//! Interrupt controller drivers.

pub mod bcm2837_armctrl;
pub mod bcm2837_local;
