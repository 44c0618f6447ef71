//! Newtype identifiers used throughout the interrupt subsystem.
//!
//! Virtual and hardware interrupt numbers live in different spaces (a
//! chained secondary controller maps its hardware lines into the virtual
//! space at an offset), so they get distinct types to keep the two from
//! being mixed up at call sites.

use core::fmt;

/// Number of CPUs on the SoC.
pub const MAX_CPUS: usize = 4;

/// A virtual interrupt number: an index into the global descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Virq(u32);

impl Virq {
    /// Creates a virtual IRQ number.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw number.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the number as a table index.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Virq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "virq{}", self.0)
    }
}

/// A hardware interrupt line number, local to one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HwIrq(u32);

impl HwIrq {
    /// Creates a hardware line number.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw line number.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HwIrq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hwirq{}", self.0)
    }
}

/// A CPU core number (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CpuId(u32);

impl CpuId {
    /// Creates a CPU id from a raw core number.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the id of the CPU executing this code.
    ///
    /// Reads the affinity-0 field of `MPIDR_EL1` on the target; host
    /// builds always report CPU 0.
    #[must_use]
    pub fn current() -> Self {
        #[cfg(all(target_os = "none", target_arch = "aarch64"))]
        {
            let mpidr: u64;
            // SAFETY: MPIDR_EL1 is readable at EL1 and the read has no
            // side effects.
            unsafe {
                core::arch::asm!("mrs {}, MPIDR_EL1", out(reg) mpidr, options(nomem, nostack));
            }
            Self((mpidr & 0x3) as u32)
        }
        #[cfg(not(all(target_os = "none", target_arch = "aarch64")))]
        {
            Self(0)
        }
    }

    /// Returns the raw core number.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the core number as an array index.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu{}", self.0)
    }
}

/// Opaque per-registration token passed back to interrupt handlers.
///
/// Distinguishes registrations sharing one line: `free` removes only the
/// action whose token matches, and the handler receives it on every
/// invocation. Typically the address of the owning device structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevId(usize);

impl DevId {
    /// Creates a token from a raw value.
    #[must_use]
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Creates a token from the address of a device structure.
    #[must_use]
    pub fn from_ref<T>(dev: &'static T) -> Self {
        Self(core::ptr::from_ref(dev) as usize)
    }

    /// Returns the raw token value.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn virq_roundtrip() {
        let v = Virq::new(51);
        assert_eq!(v.as_u32(), 51);
        assert_eq!(v.as_usize(), 51);
        assert_eq!(format!("{v}"), "virq51");
    }

    #[test]
    fn hwirq_distinct_from_virq() {
        let hw = HwIrq::new(35);
        assert_eq!(hw.as_u32(), 35);
        assert_eq!(format!("{hw}"), "hwirq35");
    }

    #[test]
    fn cpu_current_on_host_is_zero() {
        assert_eq!(CpuId::current(), CpuId::new(0));
    }

    #[test]
    fn dev_id_compares_by_value() {
        assert_eq!(DevId::new(0x1000), DevId::new(0x1000));
        assert_ne!(DevId::new(0x1000), DevId::new(0x2000));
    }
}
