//! Timer drivers.

pub mod bcm2837;
