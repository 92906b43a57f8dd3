//! Byte-addressable memory for PEEK and POKE
//!
//! A flat 64K address space with no mapped regions. Addresses outside
//! `[0, 65536)` are ILLEGAL QUANTITY; stored values are masked to one byte.

use crate::error::{BasicError, Result};

/// Size of the addressable space
pub const MEMORY_SIZE: usize = 65536;

/// Memory manager for the interpreter
#[derive(Debug, Clone)]
pub struct MemoryManager {
    ram: Vec<u8>,
}

impl MemoryManager {
    /// Create a zero-filled address space
    pub fn new() -> Self {
        Self {
            ram: vec![0; MEMORY_SIZE],
        }
    }

    fn check_address(address: i64) -> Result<usize> {
        usize::try_from(address)
            .ok()
            .filter(|&addr| addr < MEMORY_SIZE)
            .ok_or(BasicError::IllegalQuantity)
    }

    /// Read a byte from memory (PEEK operation)
    pub fn peek(&self, address: i64) -> Result<u8> {
        let addr = Self::check_address(address)?;
        Ok(self.ram[addr])
    }

    /// Write the low byte of `value` to memory (POKE operation)
    pub fn poke(&mut self, address: i64, value: i64) -> Result<()> {
        let addr = Self::check_address(address)?;
        self.ram[addr] = (value & 0xFF) as u8;
        Ok(())
    }
}

impl Default for MemoryManager {
    fn default() -> Self {
        Self::new()
    }
}
