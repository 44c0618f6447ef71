//! AArch64 exception vector table.
//!
//! Sixteen 128-byte slots: four exception kinds (sync, IRQ, FIQ,
//! SError) for each of four source states (current EL on SP_EL0,
//! current EL on SP_ELx, lower EL AArch64, lower EL AArch32). IRQ slots
//! save the caller-visible register file, call into the generic
//! dispatcher, and `eret`; every other slot is fatal and reports with
//! its slot index.

core::arch::global_asm!(
    r#"
.macro irq_vector
.balign 0x80
    b __rowan_irq_trampoline
.endm

.macro fatal_vector slot
.balign 0x80
    mov x0, #\slot
    b rowan_fatal_entry
.endm

.section .text.vectors, "ax"
.balign 0x800
.global __rowan_exception_vectors
__rowan_exception_vectors:
    fatal_vector 0      // Current EL, SP_EL0: Sync
    irq_vector          // Current EL, SP_EL0: IRQ
    fatal_vector 2      // Current EL, SP_EL0: FIQ
    fatal_vector 3      // Current EL, SP_EL0: SError
    fatal_vector 4      // Current EL, SP_ELx: Sync
    irq_vector          // Current EL, SP_ELx: IRQ
    fatal_vector 6      // Current EL, SP_ELx: FIQ
    fatal_vector 7      // Current EL, SP_ELx: SError
    fatal_vector 8      // Lower EL, AArch64: Sync
    irq_vector          // Lower EL, AArch64: IRQ
    fatal_vector 10     // Lower EL, AArch64: FIQ
    fatal_vector 11     // Lower EL, AArch64: SError
    fatal_vector 12     // Lower EL, AArch32: Sync
    irq_vector          // Lower EL, AArch32: IRQ
    fatal_vector 14     // Lower EL, AArch32: FIQ
    fatal_vector 15     // Lower EL, AArch32: SError

// Saves x0-x30, dispatches, restores, returns from exception.
__rowan_irq_trampoline:
    sub sp, sp, #256
    stp x0, x1, [sp, #16 * 0]
    stp x2, x3, [sp, #16 * 1]
    stp x4, x5, [sp, #16 * 2]
    stp x6, x7, [sp, #16 * 3]
    stp x8, x9, [sp, #16 * 4]
    stp x10, x11, [sp, #16 * 5]
    stp x12, x13, [sp, #16 * 6]
    stp x14, x15, [sp, #16 * 7]
    stp x16, x17, [sp, #16 * 8]
    stp x18, x19, [sp, #16 * 9]
    stp x20, x21, [sp, #16 * 10]
    stp x22, x23, [sp, #16 * 11]
    stp x24, x25, [sp, #16 * 12]
    stp x26, x27, [sp, #16 * 13]
    stp x28, x29, [sp, #16 * 14]
    str x30, [sp, #16 * 15]

    bl rowan_irq_entry

    ldp x0, x1, [sp, #16 * 0]
    ldp x2, x3, [sp, #16 * 1]
    ldp x4, x5, [sp, #16 * 2]
    ldp x6, x7, [sp, #16 * 3]
    ldp x8, x9, [sp, #16 * 4]
    ldp x10, x11, [sp, #16 * 5]
    ldp x12, x13, [sp, #16 * 6]
    ldp x14, x15, [sp, #16 * 7]
    ldp x16, x17, [sp, #16 * 8]
    ldp x18, x19, [sp, #16 * 9]
    ldp x20, x21, [sp, #16 * 10]
    ldp x22, x23, [sp, #16 * 11]
    ldp x24, x25, [sp, #16 * 12]
    ldp x26, x27, [sp, #16 * 13]
    ldp x28, x29, [sp, #16 * 14]
    ldr x30, [sp, #16 * 15]
    add sp, sp, #256
    eret
"#
);

unsafe extern "C" {
    /// First byte of the vector table defined above.
    pub static __rowan_exception_vectors: u8;
}
