//! Core interrupt and time subsystems for the Rowan kernel.
//!
//! Everything in this crate is hardware-independent and host-testable:
//! drivers plug in through the [`irq::IrqChip`] and
//! [`time::ClockEventDevice`] traits, and the unit tests exercise the
//! dispatch and tick machinery against mock devices on the host.
//!
//! The crate is `no_std` on the target; tests build with `std`.

#![cfg_attr(not(test), no_std)]

pub mod addr;
pub mod esr;
pub mod id;
pub mod irq;
pub mod sync;
pub mod time;
