//! Static opcode metadata: mnemonic, instruction length, and base cycle cost
//! for all 256 opcode slots, official and unofficial alike.
//!
//! This is consulted by `dispatch.rs` to advance PC past operand bytes the
//! dispatcher itself didn't already fetch, by `trace.rs` to format
//! disassembly, and for cycle accounting. It does not resolve addressing or
//! execute anything itself.

#![allow(dead_code)]

/// `len` counts the opcode byte itself, so `len == 1` means no operand bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpInfo {
    pub mnemonic: &'static str,
    pub len: u8,
    pub cycles: u8,
}

const fn op(mnemonic: &'static str, len: u8, cycles: u8) -> OpInfo {
    OpInfo { mnemonic, len, cycles }
}

#[rustfmt::skip]
pub const OPCODES: [OpInfo; 256] = [
    /* 0x00 */ op("BRK", 1, 7), op("ORA", 2, 6), op("*JAM", 1, 2), op("*SLO", 2, 8),
    /* 0x04 */ op("*NOP", 2, 3), op("ORA", 2, 3), op("ASL", 2, 5), op("*SLO", 2, 5),
    /* 0x08 */ op("PHP", 1, 3), op("ORA", 2, 2), op("ASL", 1, 2), op("*ANC", 2, 2),
    /* 0x0C */ op("*NOP", 3, 4), op("ORA", 3, 4), op("ASL", 3, 6), op("*SLO", 3, 6),
    /* 0x10 */ op("BPL", 2, 2), op("ORA", 2, 5), op("*JAM", 1, 2), op("*SLO", 2, 8),
    /* 0x14 */ op("*NOP", 2, 4), op("ORA", 2, 4), op("ASL", 2, 6), op("*SLO", 2, 6),
    /* 0x18 */ op("CLC", 1, 2), op("ORA", 3, 4), op("*NOP", 1, 2), op("*SLO", 3, 7),
    /* 0x1C */ op("*NOP", 3, 4), op("ORA", 3, 4), op("ASL", 3, 7), op("*SLO", 3, 7),
    /* 0x20 */ op("JSR", 3, 6), op("AND", 2, 6), op("*JAM", 1, 2), op("*RLA", 2, 8),
    /* 0x24 */ op("BIT", 2, 3), op("AND", 2, 3), op("ROL", 2, 5), op("*RLA", 2, 5),
    /* 0x28 */ op("PLP", 1, 4), op("AND", 2, 2), op("ROL", 1, 2), op("*ANC", 2, 2),
    /* 0x2C */ op("BIT", 3, 4), op("AND", 3, 4), op("ROL", 3, 6), op("*RLA", 3, 6),
    /* 0x30 */ op("BMI", 2, 2), op("AND", 2, 5), op("*JAM", 1, 2), op("*RLA", 2, 8),
    /* 0x34 */ op("*NOP", 2, 4), op("AND", 2, 4), op("ROL", 2, 6), op("*RLA", 2, 6),
    /* 0x38 */ op("SEC", 1, 2), op("AND", 3, 4), op("*NOP", 1, 2), op("*RLA", 3, 7),
    /* 0x3C */ op("*NOP", 3, 4), op("AND", 3, 4), op("ROL", 3, 7), op("*RLA", 3, 7),
    /* 0x40 */ op("RTI", 1, 6), op("EOR", 2, 6), op("*JAM", 1, 2), op("*SRE", 2, 8),
    /* 0x44 */ op("*NOP", 2, 3), op("EOR", 2, 3), op("LSR", 2, 5), op("*SRE", 2, 5),
    /* 0x48 */ op("PHA", 1, 3), op("EOR", 2, 2), op("LSR", 1, 2), op("*ALR", 2, 2),
    /* 0x4C */ op("JMP", 3, 3), op("EOR", 3, 4), op("LSR", 3, 6), op("*SRE", 3, 6),
    /* 0x50 */ op("BVC", 2, 2), op("EOR", 2, 5), op("*JAM", 1, 2), op("*SRE", 2, 8),
    /* 0x54 */ op("*NOP", 2, 4), op("EOR", 2, 4), op("LSR", 2, 6), op("*SRE", 2, 6),
    /* 0x58 */ op("CLI", 1, 2), op("EOR", 3, 4), op("*NOP", 1, 2), op("*SRE", 3, 7),
    /* 0x5C */ op("*NOP", 3, 4), op("EOR", 3, 4), op("LSR", 3, 7), op("*SRE", 3, 7),
    /* 0x60 */ op("RTS", 1, 6), op("ADC", 2, 6), op("*JAM", 1, 2), op("*RRA", 2, 8),
    /* 0x64 */ op("*NOP", 2, 3), op("ADC", 2, 3), op("ROR", 2, 5), op("*RRA", 2, 5),
    /* 0x68 */ op("PLA", 1, 4), op("ADC", 2, 2), op("ROR", 1, 2), op("*ARR", 2, 2),
    /* 0x6C */ op("JMP", 3, 5), op("ADC", 3, 4), op("ROR", 3, 6), op("*RRA", 3, 6),
    /* 0x70 */ op("BVS", 2, 2), op("ADC", 2, 5), op("*JAM", 1, 2), op("*RRA", 2, 8),
    /* 0x74 */ op("*NOP", 2, 4), op("ADC", 2, 4), op("ROR", 2, 6), op("*RRA", 2, 6),
    /* 0x78 */ op("SEI", 1, 2), op("ADC", 3, 4), op("*NOP", 1, 2), op("*RRA", 3, 7),
    /* 0x7C */ op("*NOP", 3, 4), op("ADC", 3, 4), op("ROR", 3, 7), op("*RRA", 3, 7),
    /* 0x80 */ op("*NOP", 2, 2), op("STA", 2, 6), op("*NOP", 2, 2), op("*SAX", 2, 6),
    /* 0x84 */ op("STY", 2, 3), op("STA", 2, 3), op("STX", 2, 3), op("*SAX", 2, 3),
    /* 0x88 */ op("DEY", 1, 2), op("*NOP", 2, 2), op("TXA", 1, 2), op("*XAA", 2, 2),
    /* 0x8C */ op("STY", 3, 4), op("STA", 3, 4), op("STX", 3, 4), op("*SAX", 3, 4),
    /* 0x90 */ op("BCC", 2, 2), op("STA", 2, 6), op("*JAM", 1, 2), op("*SHA", 2, 6),
    /* 0x94 */ op("STY", 2, 4), op("STA", 2, 4), op("STX", 2, 4), op("*SAX", 2, 4),
    /* 0x98 */ op("TYA", 1, 2), op("STA", 3, 5), op("TXS", 1, 2), op("*TAS", 3, 5),
    /* 0x9C */ op("*SHY", 3, 5), op("STA", 3, 5), op("*SHX", 3, 5), op("*SHA", 3, 5),
    /* 0xA0 */ op("LDY", 2, 2), op("LDA", 2, 6), op("LDX", 2, 2), op("*LAX", 2, 6),
    /* 0xA4 */ op("LDY", 2, 3), op("LDA", 2, 3), op("LDX", 2, 3), op("*LAX", 2, 3),
    /* 0xA8 */ op("TAY", 1, 2), op("LDA", 2, 2), op("TAX", 1, 2), op("*LAX", 2, 2),
    /* 0xAC */ op("LDY", 3, 4), op("LDA", 3, 4), op("LDX", 3, 4), op("*LAX", 3, 4),
    /* 0xB0 */ op("BCS", 2, 2), op("LDA", 2, 5), op("*JAM", 1, 2), op("*LAX", 2, 5),
    /* 0xB4 */ op("LDY", 2, 4), op("LDA", 2, 4), op("LDX", 2, 4), op("*LAX", 2, 4),
    /* 0xB8 */ op("CLV", 1, 2), op("LDA", 3, 4), op("TSX", 1, 2), op("*LAS", 3, 4),
    /* 0xBC */ op("LDY", 3, 4), op("LDA", 3, 4), op("LDX", 3, 4), op("*LAX", 3, 4),
    /* 0xC0 */ op("CPY", 2, 2), op("CMP", 2, 6), op("*NOP", 2, 2), op("*DCP", 2, 8),
    /* 0xC4 */ op("CPY", 2, 3), op("CMP", 2, 3), op("DEC", 2, 5), op("*DCP", 2, 5),
    /* 0xC8 */ op("INY", 1, 2), op("CMP", 2, 2), op("DEX", 1, 2), op("*AXS", 2, 2),
    /* 0xCC */ op("CPY", 3, 4), op("CMP", 3, 4), op("DEC", 3, 6), op("*DCP", 3, 6),
    /* 0xD0 */ op("BNE", 2, 2), op("CMP", 2, 5), op("*JAM", 1, 2), op("*DCP", 2, 8),
    /* 0xD4 */ op("*NOP", 2, 4), op("CMP", 2, 4), op("DEC", 2, 6), op("*DCP", 2, 6),
    /* 0xD8 */ op("CLD", 1, 2), op("CMP", 3, 4), op("*NOP", 1, 2), op("*DCP", 3, 7),
    /* 0xDC */ op("*NOP", 3, 4), op("CMP", 3, 4), op("DEC", 3, 7), op("*DCP", 3, 7),
    /* 0xE0 */ op("CPX", 2, 2), op("SBC", 2, 6), op("*NOP", 2, 2), op("*ISC", 2, 8),
    /* 0xE4 */ op("CPX", 2, 3), op("SBC", 2, 3), op("INC", 2, 5), op("*ISC", 2, 5),
    /* 0xE8 */ op("INX", 1, 2), op("SBC", 2, 2), op("NOP", 1, 2), op("*SBC", 2, 2),
    /* 0xEC */ op("CPX", 3, 4), op("SBC", 3, 4), op("INC", 3, 6), op("*ISC", 3, 6),
    /* 0xF0 */ op("BEQ", 2, 2), op("SBC", 2, 5), op("*JAM", 1, 2), op("*ISC", 2, 8),
    /* 0xF4 */ op("*NOP", 2, 4), op("SBC", 2, 4), op("INC", 2, 6), op("*ISC", 2, 6),
    /* 0xF8 */ op("SED", 1, 2), op("SBC", 3, 4), op("*NOP", 1, 2), op("*ISC", 3, 7),
    /* 0xFC */ op("*NOP", 3, 4), op("SBC", 3, 4), op("INC", 3, 7), op("*ISC", 3, 7),
];

#[inline]
pub fn lookup(opcode: u8) -> OpInfo {
    OPCODES[opcode as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn official_entries_match_known_values() {
        assert_eq!(lookup(0xEA).mnemonic, "NOP");
        assert_eq!(lookup(0xA9), op("LDA", 2, 2));
        assert_eq!(lookup(0x4C), op("JMP", 3, 3));
        assert_eq!(lookup(0x6C), op("JMP", 3, 5));
        assert_eq!(lookup(0x00), op("BRK", 1, 7));
    }

    #[test]
    fn unofficial_entries_present() {
        assert_eq!(lookup(0xAB).mnemonic, "*LAX");
        assert_eq!(lookup(0xCB).mnemonic, "*AXS");
        assert_eq!(lookup(0xEB).mnemonic, "*SBC");
        assert_eq!(lookup(0x0B).mnemonic, "*ANC");
    }

    #[test]
    fn table_is_fully_populated() {
        for entry in OPCODES.iter() {
            assert!(entry.len >= 1 && entry.len <= 3);
            assert!(entry.cycles >= 2);
        }
    }
}
