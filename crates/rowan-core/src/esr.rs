//! AArch64 exception syndrome decoding.
//!
//! Pure functions over `ESR_EL1` values and vector table slot indices,
//! used by the fatal trap reporter. Kept here so the decode tables are
//! host-testable.

/// Number of exception class codes in `ESR_EL1.EC` (6 bits).
const EC_COUNT: usize = 64;

/// Number of slots in the AArch64 exception vector table.
pub const VECTOR_SLOTS: usize = 16;

/// Extracts the exception class field from an `ESR_EL1` value.
#[must_use]
pub const fn exception_class(esr: u64) -> u8 {
    ((esr >> 26) & 0x3F) as u8
}

/// Extracts the instruction-specific syndrome field.
#[must_use]
pub const fn iss(esr: u64) -> u32 {
    (esr & 0x01FF_FFFF) as u32
}

const UNRECOGNIZED: &str = "Unrecognized EC";

const fn build_ec_names() -> [&'static str; EC_COUNT] {
    let mut names = [UNRECOGNIZED; EC_COUNT];
    names[0x00] = "Unknown reason";
    names[0x01] = "Trapped WFI/WFE";
    names[0x0E] = "Illegal execution state";
    names[0x15] = "SVC (AArch64)";
    names[0x18] = "Trapped MSR/MRS access";
    names[0x20] = "Instruction abort, lower EL";
    names[0x21] = "Instruction abort, same EL";
    names[0x22] = "PC alignment fault";
    names[0x24] = "Data abort, lower EL";
    names[0x25] = "Data abort, same EL";
    names[0x26] = "SP alignment fault";
    names[0x2F] = "SError";
    names[0x30] = "Breakpoint, lower EL";
    names[0x31] = "Breakpoint, same EL";
    names[0x32] = "Software step, lower EL";
    names[0x33] = "Software step, same EL";
    names[0x34] = "Watchpoint, lower EL";
    names[0x35] = "Watchpoint, same EL";
    names[0x3C] = "BRK instruction";
    names
}

static EC_NAMES: [&str; EC_COUNT] = build_ec_names();

/// Returns a human-readable name for the exception class of `esr`.
#[must_use]
pub fn class_name(esr: u64) -> &'static str {
    EC_NAMES[exception_class(esr) as usize]
}

/// Vector slot names, in table order: four exception kinds for each of
/// the four source states.
static VECTOR_NAMES: [&str; VECTOR_SLOTS] = [
    "Current EL with SP_EL0 - Sync",
    "Current EL with SP_EL0 - IRQ",
    "Current EL with SP_EL0 - FIQ",
    "Current EL with SP_EL0 - SError",
    "Current EL with SP_ELx - Sync",
    "Current EL with SP_ELx - IRQ",
    "Current EL with SP_ELx - FIQ",
    "Current EL with SP_ELx - SError",
    "Lower EL (AArch64) - Sync",
    "Lower EL (AArch64) - IRQ",
    "Lower EL (AArch64) - FIQ",
    "Lower EL (AArch64) - SError",
    "Lower EL (AArch32) - Sync",
    "Lower EL (AArch32) - IRQ",
    "Lower EL (AArch32) - FIQ",
    "Lower EL (AArch32) - SError",
];

/// Returns the name of a vector table slot.
#[must_use]
pub fn vector_name(slot: usize) -> &'static str {
    VECTOR_NAMES.get(slot).copied().unwrap_or("Invalid vector")
}
