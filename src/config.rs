//! Command-line configuration for the emulator binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::cpu::BrkMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BrkModeArg {
    /// Halt the CPU on BRK. Suitable for conformance test ROMs that use BRK
    /// to signal completion.
    Halt,
    /// Treat BRK as a two-byte NOP and keep running.
    Noop,
}

impl From<BrkModeArg> for BrkMode {
    fn from(value: BrkModeArg) -> Self {
        match value {
            BrkModeArg::Halt => BrkMode::Halt,
            BrkModeArg::Noop => BrkMode::NoOp,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "oxines", about = "An NES emulator", version)]
pub struct Config {
    /// Path to an iNES (.nes) ROM image.
    pub rom: PathBuf,

    /// Override the reset vector's target PC (hex, e.g. C000), for running
    /// headless test ROMs that expect execution to start at a fixed address.
    #[arg(long, value_parser = parse_hex_u16)]
    pub start_pc: Option<u16>,

    /// Print a nestest-style trace line for every instruction to stdout.
    #[arg(long)]
    pub trace: bool,

    /// What BRK does when no debugger is attached.
    #[arg(long, value_enum, default_value = "noop")]
    pub brk_mode: BrkModeArg,
}

fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(s, 16).map_err(|e| format!("invalid hex value {s:?}: {e}"))
}
