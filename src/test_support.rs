//! Shared test helpers for building minimal iNES (v1) ROM images.
//!
//! These de-duplicate iNES construction logic across the cartridge, bus, and
//! CPU test suites. They intentionally support just what the tests need
//! (NROM mapper, simple flags).
//!
//! Header layout used here:
//! - bytes[0..4] = b"NES\x1A"
//! - byte 4 = PRG ROM size in 16 KiB units
//! - byte 5 = CHR ROM size in 8 KiB units (0 => CHR RAM allocated by the loader)
//! - byte 6 = Flags 6 (mirroring, battery, trainer, mapper low nibble)
//! - byte 7 = Flags 7 (NES 2.0 indicator, mapper high nibble)
//! - byte 8 = PRG RAM size in 8 KiB units (0 => 8 KiB by convention)
//!
//! Vectors: NROM-128 (16 KiB PRG) places them at PRG offset 0x3FFA..=0x3FFF;
//! NROM-256 (32 KiB PRG) at 0x7FFA..=0x7FFF.

#![allow(dead_code)]

/// Build a minimal iNES (v1) image with configurable PRG/CHR sizes and flags.
pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    prg_ram_8k: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(
        16 + trainer.map(|_| 512).unwrap_or(0) + prg_16k * 16 * 1024 + chr_8k * 8 * 1024,
    );

    bytes.extend_from_slice(b"NES\x1A");
    bytes.push(prg_16k as u8);
    bytes.push(chr_8k as u8);
    bytes.push(flags6);
    bytes.push(flags7);
    bytes.push(prg_ram_8k);
    bytes.extend_from_slice(&[0u8; 7]);

    if let Some(t) = trainer {
        bytes.extend_from_slice(t);
    }

    if prg_16k > 0 {
        bytes.extend(std::iter::repeat(0xAA).take(prg_16k * 16 * 1024));
    }
    if chr_8k > 0 {
        bytes.extend(std::iter::repeat(0xCC).take(chr_8k * 8 * 1024));
    }

    bytes
}

/// Build a single-bank NROM image carrying `prg` (padded/truncated to 16 KiB)
/// with RESET/NMI/IRQ vectors set, horizontal mirroring, no trainer, no battery.
pub fn build_nrom_with_prg(
    prg: &[u8],
    chr_8k: usize,
    prg_ram_8k: u8,
    vectors: Option<(u16, u16, u16)>,
) -> Vec<u8> {
    assert!(prg.len() <= 16 * 1024, "program must fit a 16 KiB PRG bank");

    let mut rom = build_ines(1, chr_8k, 0, 0, prg_ram_8k, None);

    let prg_start = 16;
    let prg_end = prg_start + 16 * 1024;
    rom[prg_start..prg_start + prg.len()].copy_from_slice(prg);

    let (reset, nmi, irq) = vectors.unwrap_or((0x8000, 0x8000, 0x8000));
    set_vectors_in_prg(&mut rom[prg_start..prg_end], reset, nmi, irq);

    rom
}

/// Convenience wrapper for tests that only care about the RESET vector.
pub fn build_nrom_with_prg_reset_only(
    prg: &[u8],
    chr_8k: usize,
    prg_ram_8k: u8,
    reset: Option<u16>,
) -> Vec<u8> {
    let vectors = reset.map(|r| (r, 0x8000, 0x8000));
    build_nrom_with_prg(prg, chr_8k, prg_ram_8k, vectors)
}

/// Write CPU vectors (NMI, RESET, IRQ/BRK) into a 16 KiB or 32 KiB PRG slice.
pub fn set_vectors_in_prg(prg: &mut [u8], reset: u16, nmi: u16, irq: u16) {
    match prg.len() {
        16384 => {
            let base = 0x3FFA;
            write_le_u16(prg, base, nmi);
            write_le_u16(prg, base + 2, reset);
            write_le_u16(prg, base + 4, irq);
        }
        32768 => {
            let base = 0x7FFA;
            write_le_u16(prg, base, nmi);
            write_le_u16(prg, base + 2, reset);
            write_le_u16(prg, base + 4, irq);
        }
        other => panic!("unsupported PRG length for vector placement: {other} bytes"),
    }
}

#[inline]
fn write_le_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset] = (value & 0x00FF) as u8;
    buf[offset + 1] = (value >> 8) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_basic_ines() {
        let rom = build_ines(2, 1, 0x01, 0x00, 1, None);
        assert_eq!(&rom[0..4], b"NES\x1A");
        assert_eq!(rom[4], 2);
        assert_eq!(rom[5], 1);
        assert_eq!(rom.len(), 16 + 2 * 16 * 1024 + 1024 * 8);
    }

    #[test]
    fn writes_vectors_for_16k_prg() {
        let mut prg = vec![0u8; 16 * 1024];
        set_vectors_in_prg(&mut prg, 0x8123, 0x8456, 0x8ABC);
        assert_eq!(&prg[0x3FFA..0x4000], &[0x56, 0x84, 0x23, 0x81, 0xBC, 0x8A]);
    }

    #[test]
    fn builds_nrom_with_prg_and_vectors() {
        let prg = [0xA9, 0x01, 0x00];
        let rom = build_nrom_with_prg(&prg, 1, 1, None);
        assert_eq!(&rom[0..4], b"NES\x1A");
        assert_ne!(rom[16 + 0x3FFC], 0x00);
    }
}
