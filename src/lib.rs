#![doc = r#"
NES emulator library crate.

Modules:
- error: shared fallible-operation error type
- cartridge: iNES v1 loader, mapper construction, mirroring metadata
- mapper: Mapper trait and the NROM (mapper 0) implementation
- joypad: standard-controller serial shift-register protocol
- apu: APU register stub (frame-counter IRQ only, no audio synthesis)
- ppu: register file, OAM, timing, and whole-frame software renderer
- bus: CPU/PPU address decode, OAM DMA, and system timing
- cpu: 6502 core (registers, addressing, instruction semantics, dispatch)
- trace: nestest-style per-instruction trace line formatting
- config: command-line configuration

In tests, shared iNES builders are available under `crate::test_support`.
"#]

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod cpu;
#[cfg(feature = "display")]
pub mod display;
pub mod error;
pub mod joypad;
pub mod mapper;
pub mod ppu;
pub mod trace;

pub use bus::Bus;
pub use cartridge::Cartridge;
pub use cpu::{BrkMode, Cpu6502};
pub use error::EmuError;

#[cfg(test)]
pub mod test_support;
