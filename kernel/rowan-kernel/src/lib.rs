//! Rowan kernel for the BCM2837.
//!
//! Ties the generic interrupt and time subsystems from `rowan-core` to
//! the SoC drivers in `rowan-drivers`: exception vectors, bring-up
//! sequencing, logging, and the idle loop.
//!
//! Only [`config`] and [`log`] build off-target; everything touching
//! system registers is gated to the bare-metal aarch64 target.

#![no_std]

pub mod config;
pub mod log;

#[cfg(all(target_os = "none", target_arch = "aarch64"))]
pub mod arch;
#[cfg(all(target_os = "none", target_arch = "aarch64"))]
pub mod boot;
#[cfg(all(target_os = "none", target_arch = "aarch64"))]
mod panic;
