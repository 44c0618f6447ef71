//! Serial drivers.

pub mod pl011;
