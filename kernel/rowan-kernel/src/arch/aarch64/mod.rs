//! AArch64 support: exception vectors, trap reporting, and IRQ masking.

pub mod exceptions;
pub mod instructions;
pub mod vectors;
