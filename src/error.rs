//! Error taxonomy for cartridge parsing and fatal runtime conditions.
//!
//! Parse-time errors (`InvalidMagic`, `UnsupportedFormat`, `Truncated`) are
//! recoverable at the host boundary: the caller gets a `Result` back before
//! any `Bus`/`Cpu6502` exists. Runtime errors (`IllegalOpcode`, `WriteToRom`,
//! `PpuAddressOutOfRange`) are fatal and unwind the emulation loop; they
//! carry enough context (PC, opcode, address) to diagnose the ROM or the
//! emulator without a debugger attached.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmuError {
    #[error("invalid iNES magic number")]
    InvalidMagic,

    #[error("unsupported iNES format (expected version 0/1, NES 2.0 not supported)")]
    UnsupportedFormat,

    #[error("truncated ROM image: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("illegal opcode {opcode:#04X} at {pc:#06X}")]
    IllegalOpcode { opcode: u8, pc: u16 },

    #[error("write to read-only ROM address {addr:#06X} (value {value:#04X})")]
    WriteToRom { addr: u16, value: u8 },

    #[error("PPU address {addr:#06X} out of range")]
    PpuAddressOutOfRange { addr: u16 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
