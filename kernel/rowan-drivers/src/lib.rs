//! Hardware drivers for the Rowan kernel.
//!
//! Everything here targets the BCM2837 SoC. Register blocks are reached
//! through a [`rowan_core::addr::VirtAddr`] base passed at construction,
//! so the unit tests drive the same code against in-memory register
//! images on the host.

#![cfg_attr(not(test), no_std)]

pub mod irqchip;
pub mod serial;
pub mod timer;
