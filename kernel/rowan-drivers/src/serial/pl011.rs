//! PL011 UART, transmit side only.
//!
//! The boot console. Assumes the firmware has already configured baud
//! rate and line settings; the kernel only feeds the transmit FIFO.

use core::fmt;

use bitflags::bitflags;
use rowan_core::addr::VirtAddr;

/// Bus address of the PL011 register block.
pub const PL011_BASE: VirtAddr = VirtAddr::new(0x3F20_1000);

const REG_DR: u64 = 0x00;
const REG_FR: u64 = 0x18;

bitflags! {
    /// Flag register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct FrFlags: u32 {
        /// UART busy transmitting.
        const BUSY = 1 << 3;
        /// Receive FIFO empty.
        const RXFE = 1 << 4;
        /// Transmit FIFO full.
        const TXFF = 1 << 5;
    }
}

/// PL011 transmit driver.
pub struct Pl011 {
    base: VirtAddr,
}

impl Pl011 {
    /// Creates the driver over the given register block.
    #[must_use]
    pub const fn new(base: VirtAddr) -> Self {
        Self { base }
    }

    fn flags(&self) -> FrFlags {
        // SAFETY: The base points at the UART's register block (or a
        // test image of it).
        let raw = unsafe { self.base.offset(REG_FR).as_ptr::<u32>().read_volatile() };
        FrFlags::from_bits_truncate(raw)
    }

    /// Writes one byte, spinning while the transmit FIFO is full.
    pub fn write_byte(&self, byte: u8) {
        while self.flags().contains(FrFlags::TXFF) {
            core::hint::spin_loop();
        }
        // SAFETY: As for flags.
        unsafe {
            self.base
                .offset(REG_DR)
                .as_mut_ptr::<u32>()
                .write_volatile(u32::from(byte));
        }
    }
}

impl fmt::Write for Pl011 {
    /// Writes a string, expanding `\n` to `\r\n` for serial terminals.
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(byte);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    // Register image covering offsets 0x00..0x20.
    fn mock_block() -> (&'static mut [u32; 8], VirtAddr) {
        let block = Box::leak(Box::new([0u32; 8]));
        let base = VirtAddr::new(block.as_ptr() as u64);
        (block, base)
    }

    #[test]
    fn write_byte_lands_in_data_register() {
        let (block, base) = mock_block();
        let uart = Pl011::new(base);
        uart.write_byte(b'A');
        assert_eq!(block[0], u32::from(b'A'));
    }

    #[test]
    fn write_str_emits_all_bytes() {
        let (block, base) = mock_block();
        let mut uart = Pl011::new(base);
        uart.write_str("ok\n").unwrap();
        // Plain memory only keeps the last write: the expanded newline.
        assert_eq!(block[0], u32::from(b'\n'));
    }
}
