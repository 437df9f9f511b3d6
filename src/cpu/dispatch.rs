//! Opcode dispatch: fetch, decode, execute, advance.
//!
//! Every branch resolves its own addressing (fetching any operand bytes)
//! before acting, so PC always ends the instruction pointed at the next
//! opcode. Cycle counts come straight from the opcode table; no page-cross
//! penalties are charged anywhere, a taken branch is the only variable cost.

use crate::bus::Bus;
use crate::cpu::addressing::{
    addr_abs, addr_abs_x, addr_abs_y, addr_ind_x, addr_ind_y, addr_zp, addr_zp_x, addr_zp_y,
    fetch_byte, read_word_indirect_bug,
};
use crate::cpu::execute::*;
use crate::cpu::state::{CpuState, CARRY, NEGATIVE, OVERFLOW, ZERO};
use crate::cpu::table;
use crate::error::EmuError;

pub fn step(cpu: &mut CpuState, bus: &mut Bus) -> Result<u32, EmuError> {
    let pc_at_fetch = cpu.pc;
    let opcode = fetch_byte(cpu, bus);
    let info = table::lookup(opcode);
    let mut cycles = info.cycles as u32;

    macro_rules! read_at {
        ($addr_fn:expr) => {{
            let a = $addr_fn(cpu, bus);
            bus.read(a)
        }};
    }

    match opcode {
        // ------------------------------------------------------------ LDA
        0xA9 => lda(cpu, fetch_byte(cpu, bus)),
        0xA5 => lda(cpu, read_at!(addr_zp)),
        0xB5 => lda(cpu, read_at!(addr_zp_x)),
        0xAD => lda(cpu, read_at!(addr_abs)),
        0xBD => lda(cpu, read_at!(addr_abs_x)),
        0xB9 => lda(cpu, read_at!(addr_abs_y)),
        0xA1 => lda(cpu, read_at!(addr_ind_x)),
        0xB1 => lda(cpu, read_at!(addr_ind_y)),

        // ------------------------------------------------------------ LDX
        0xA2 => ldx(cpu, fetch_byte(cpu, bus)),
        0xA6 => ldx(cpu, read_at!(addr_zp)),
        0xB6 => ldx(cpu, read_at!(addr_zp_y)),
        0xAE => ldx(cpu, read_at!(addr_abs)),
        0xBE => ldx(cpu, read_at!(addr_abs_y)),

        // ------------------------------------------------------------ LDY
        0xA0 => ldy(cpu, fetch_byte(cpu, bus)),
        0xA4 => ldy(cpu, read_at!(addr_zp)),
        0xB4 => ldy(cpu, read_at!(addr_zp_x)),
        0xAC => ldy(cpu, read_at!(addr_abs)),
        0xBC => ldy(cpu, read_at!(addr_abs_x)),

        // ------------------------------------------------------------ STA
        0x85 => { let a = addr_zp(cpu, bus); bus.write(a, cpu.a)?; }
        0x95 => { let a = addr_zp_x(cpu, bus); bus.write(a, cpu.a)?; }
        0x8D => { let a = addr_abs(cpu, bus); bus.write(a, cpu.a)?; }
        0x9D => { let a = addr_abs_x(cpu, bus); bus.write(a, cpu.a)?; }
        0x99 => { let a = addr_abs_y(cpu, bus); bus.write(a, cpu.a)?; }
        0x81 => { let a = addr_ind_x(cpu, bus); bus.write(a, cpu.a)?; }
        0x91 => { let a = addr_ind_y(cpu, bus); bus.write(a, cpu.a)?; }

        // ------------------------------------------------------------ STX
        0x86 => { let a = addr_zp(cpu, bus); bus.write(a, cpu.x)?; }
        0x96 => { let a = addr_zp_y(cpu, bus); bus.write(a, cpu.x)?; }
        0x8E => { let a = addr_abs(cpu, bus); bus.write(a, cpu.x)?; }

        // ------------------------------------------------------------ STY
        0x84 => { let a = addr_zp(cpu, bus); bus.write(a, cpu.y)?; }
        0x94 => { let a = addr_zp_x(cpu, bus); bus.write(a, cpu.y)?; }
        0x8C => { let a = addr_abs(cpu, bus); bus.write(a, cpu.y)?; }

        // ------------------------------------------------------- transfers
        0xAA => tax(cpu),
        0xA8 => tay(cpu),
        0x8A => txa(cpu),
        0x98 => tya(cpu),
        0xBA => tsx(cpu),
        0x9A => txs(cpu),

        // ----------------------------------------------------------- stack
        0x48 => pha(cpu, bus),
        0x68 => pla(cpu, bus),
        0x08 => php(cpu, bus),
        0x28 => plp(cpu, bus),

        // ------------------------------------------------------- inc/dec reg
        0xE8 => inx(cpu),
        0xC8 => iny(cpu),
        0xCA => dex(cpu),
        0x88 => dey(cpu),

        // --------------------------------------------------------- inc/dec mem
        0xE6 => { let a = addr_zp(cpu, bus); inc_mem(cpu, bus, a)?; }
        0xF6 => { let a = addr_zp_x(cpu, bus); inc_mem(cpu, bus, a)?; }
        0xEE => { let a = addr_abs(cpu, bus); inc_mem(cpu, bus, a)?; }
        0xFE => { let a = addr_abs_x(cpu, bus); inc_mem(cpu, bus, a)?; }
        0xC6 => { let a = addr_zp(cpu, bus); dec_mem(cpu, bus, a)?; }
        0xD6 => { let a = addr_zp_x(cpu, bus); dec_mem(cpu, bus, a)?; }
        0xCE => { let a = addr_abs(cpu, bus); dec_mem(cpu, bus, a)?; }
        0xDE => { let a = addr_abs_x(cpu, bus); dec_mem(cpu, bus, a)?; }

        // ------------------------------------------------------------ shifts
        0x0A => asl_acc(cpu),
        0x06 => { let a = addr_zp(cpu, bus); asl_mem(cpu, bus, a)?; }
        0x16 => { let a = addr_zp_x(cpu, bus); asl_mem(cpu, bus, a)?; }
        0x0E => { let a = addr_abs(cpu, bus); asl_mem(cpu, bus, a)?; }
        0x1E => { let a = addr_abs_x(cpu, bus); asl_mem(cpu, bus, a)?; }

        0x4A => lsr_acc(cpu),
        0x46 => { let a = addr_zp(cpu, bus); lsr_mem(cpu, bus, a)?; }
        0x56 => { let a = addr_zp_x(cpu, bus); lsr_mem(cpu, bus, a)?; }
        0x4E => { let a = addr_abs(cpu, bus); lsr_mem(cpu, bus, a)?; }
        0x5E => { let a = addr_abs_x(cpu, bus); lsr_mem(cpu, bus, a)?; }

        0x2A => rol_acc(cpu),
        0x26 => { let a = addr_zp(cpu, bus); rol_mem(cpu, bus, a)?; }
        0x36 => { let a = addr_zp_x(cpu, bus); rol_mem(cpu, bus, a)?; }
        0x2E => { let a = addr_abs(cpu, bus); rol_mem(cpu, bus, a)?; }
        0x3E => { let a = addr_abs_x(cpu, bus); rol_mem(cpu, bus, a)?; }

        0x6A => ror_acc(cpu),
        0x66 => { let a = addr_zp(cpu, bus); ror_mem(cpu, bus, a)?; }
        0x76 => { let a = addr_zp_x(cpu, bus); ror_mem(cpu, bus, a)?; }
        0x6E => { let a = addr_abs(cpu, bus); ror_mem(cpu, bus, a)?; }
        0x7E => { let a = addr_abs_x(cpu, bus); ror_mem(cpu, bus, a)?; }

        // ------------------------------------------------------------ logical
        0x29 => and(cpu, fetch_byte(cpu, bus)),
        0x25 => and(cpu, read_at!(addr_zp)),
        0x35 => and(cpu, read_at!(addr_zp_x)),
        0x2D => and(cpu, read_at!(addr_abs)),
        0x3D => and(cpu, read_at!(addr_abs_x)),
        0x39 => and(cpu, read_at!(addr_abs_y)),
        0x21 => and(cpu, read_at!(addr_ind_x)),
        0x31 => and(cpu, read_at!(addr_ind_y)),

        0x09 => ora(cpu, fetch_byte(cpu, bus)),
        0x05 => ora(cpu, read_at!(addr_zp)),
        0x15 => ora(cpu, read_at!(addr_zp_x)),
        0x0D => ora(cpu, read_at!(addr_abs)),
        0x1D => ora(cpu, read_at!(addr_abs_x)),
        0x19 => ora(cpu, read_at!(addr_abs_y)),
        0x01 => ora(cpu, read_at!(addr_ind_x)),
        0x11 => ora(cpu, read_at!(addr_ind_y)),

        0x49 => eor(cpu, fetch_byte(cpu, bus)),
        0x45 => eor(cpu, read_at!(addr_zp)),
        0x55 => eor(cpu, read_at!(addr_zp_x)),
        0x4D => eor(cpu, read_at!(addr_abs)),
        0x5D => eor(cpu, read_at!(addr_abs_x)),
        0x59 => eor(cpu, read_at!(addr_abs_y)),
        0x41 => eor(cpu, read_at!(addr_ind_x)),
        0x51 => eor(cpu, read_at!(addr_ind_y)),

        0x24 => bit(cpu, read_at!(addr_zp)),
        0x2C => bit(cpu, read_at!(addr_abs)),

        // --------------------------------------------------------- arithmetic
        0x69 => adc(cpu, fetch_byte(cpu, bus)),
        0x65 => adc(cpu, read_at!(addr_zp)),
        0x75 => adc(cpu, read_at!(addr_zp_x)),
        0x6D => adc(cpu, read_at!(addr_abs)),
        0x7D => adc(cpu, read_at!(addr_abs_x)),
        0x79 => adc(cpu, read_at!(addr_abs_y)),
        0x61 => adc(cpu, read_at!(addr_ind_x)),
        0x71 => adc(cpu, read_at!(addr_ind_y)),

        0xE9 | 0xEB => sbc(cpu, fetch_byte(cpu, bus)),
        0xE5 => sbc(cpu, read_at!(addr_zp)),
        0xF5 => sbc(cpu, read_at!(addr_zp_x)),
        0xED => sbc(cpu, read_at!(addr_abs)),
        0xFD => sbc(cpu, read_at!(addr_abs_x)),
        0xF9 => sbc(cpu, read_at!(addr_abs_y)),
        0xE1 => sbc(cpu, read_at!(addr_ind_x)),
        0xF1 => sbc(cpu, read_at!(addr_ind_y)),

        0xC9 => cmp(cpu, fetch_byte(cpu, bus)),
        0xC5 => cmp(cpu, read_at!(addr_zp)),
        0xD5 => cmp(cpu, read_at!(addr_zp_x)),
        0xCD => cmp(cpu, read_at!(addr_abs)),
        0xDD => cmp(cpu, read_at!(addr_abs_x)),
        0xD9 => cmp(cpu, read_at!(addr_abs_y)),
        0xC1 => cmp(cpu, read_at!(addr_ind_x)),
        0xD1 => cmp(cpu, read_at!(addr_ind_y)),

        0xE0 => cpx(cpu, fetch_byte(cpu, bus)),
        0xE4 => cpx(cpu, read_at!(addr_zp)),
        0xEC => cpx(cpu, read_at!(addr_abs)),

        0xC0 => cpy(cpu, fetch_byte(cpu, bus)),
        0xC4 => cpy(cpu, read_at!(addr_zp)),
        0xCC => cpy(cpu, read_at!(addr_abs)),

        // ------------------------------------------------------------ branches
        0x10 => { let o = fetch_byte(cpu, bus); cycles += branch_cond(cpu, !cpu.is_flag_set(NEGATIVE), o); }
        0x30 => { let o = fetch_byte(cpu, bus); cycles += branch_cond(cpu, cpu.is_flag_set(NEGATIVE), o); }
        0x50 => { let o = fetch_byte(cpu, bus); cycles += branch_cond(cpu, !cpu.is_flag_set(OVERFLOW), o); }
        0x70 => { let o = fetch_byte(cpu, bus); cycles += branch_cond(cpu, cpu.is_flag_set(OVERFLOW), o); }
        0x90 => { let o = fetch_byte(cpu, bus); cycles += branch_cond(cpu, !cpu.is_flag_set(CARRY), o); }
        0xB0 => { let o = fetch_byte(cpu, bus); cycles += branch_cond(cpu, cpu.is_flag_set(CARRY), o); }
        0xD0 => { let o = fetch_byte(cpu, bus); cycles += branch_cond(cpu, !cpu.is_flag_set(ZERO), o); }
        0xF0 => { let o = fetch_byte(cpu, bus); cycles += branch_cond(cpu, cpu.is_flag_set(ZERO), o); }

        // --------------------------------------------------------- jumps/calls
        0x4C => { cpu.pc = addr_abs(cpu, bus); }
        0x6C => {
            let ptr = addr_abs(cpu, bus);
            cpu.pc = read_word_indirect_bug(bus, ptr);
        }
        0x20 => {
            let target = addr_abs(cpu, bus);
            // The pushed return address is the last byte of JSR itself, i.e.
            // one less than the already-advanced PC.
            let ret = cpu.pc.wrapping_sub(1);
            push_word(cpu, bus, ret);
            cpu.pc = target;
        }
        0x60 => {
            let ret = pop_word(cpu, bus);
            cpu.pc = ret.wrapping_add(1);
        }
        0x40 => {
            plp(cpu, bus);
            cpu.pc = pop_word(cpu, bus);
        }
        0x00 => {
            // BRK: push PC+2 (the skipped padding byte), then status with
            // BREAK set, then jump through the IRQ/BRK vector.
            cpu.advance_pc(1);
            push_word(cpu, bus, cpu.pc);
            php(cpu, bus);
            cpu.assign_flag(crate::cpu::state::IRQ_DISABLE, true);
            cpu.pc = bus.read_word(0xFFFE);
        }

        // -------------------------------------------------------------- flags
        0x18 => clc(cpu),
        0x38 => sec(cpu),
        0x58 => cli(cpu),
        0x78 => sei(cpu),
        0xB8 => clv(cpu),
        0xD8 => cld(cpu),
        0xF8 => sed(cpu),

        // --------------------------------------------------------------- nop
        0xEA => {}
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => {}
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => { fetch_byte(cpu, bus); }
        0x04 | 0x44 | 0x64 => { addr_zp(cpu, bus); }
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => { addr_zp_x(cpu, bus); }
        0x0C => { addr_abs(cpu, bus); }
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => { addr_abs_x(cpu, bus); }

        // ------------------------------------------------ unofficial RMW combos
        0x03 => { let a = addr_ind_x(cpu, bus); slo(cpu, bus, a)?; }
        0x07 => { let a = addr_zp(cpu, bus); slo(cpu, bus, a)?; }
        0x0F => { let a = addr_abs(cpu, bus); slo(cpu, bus, a)?; }
        0x13 => { let a = addr_ind_y(cpu, bus); slo(cpu, bus, a)?; }
        0x17 => { let a = addr_zp_x(cpu, bus); slo(cpu, bus, a)?; }
        0x1B => { let a = addr_abs_y(cpu, bus); slo(cpu, bus, a)?; }
        0x1F => { let a = addr_abs_x(cpu, bus); slo(cpu, bus, a)?; }

        0x23 => { let a = addr_ind_x(cpu, bus); rla(cpu, bus, a)?; }
        0x27 => { let a = addr_zp(cpu, bus); rla(cpu, bus, a)?; }
        0x2F => { let a = addr_abs(cpu, bus); rla(cpu, bus, a)?; }
        0x33 => { let a = addr_ind_y(cpu, bus); rla(cpu, bus, a)?; }
        0x37 => { let a = addr_zp_x(cpu, bus); rla(cpu, bus, a)?; }
        0x3B => { let a = addr_abs_y(cpu, bus); rla(cpu, bus, a)?; }
        0x3F => { let a = addr_abs_x(cpu, bus); rla(cpu, bus, a)?; }

        0x43 => { let a = addr_ind_x(cpu, bus); sre(cpu, bus, a)?; }
        0x47 => { let a = addr_zp(cpu, bus); sre(cpu, bus, a)?; }
        0x4F => { let a = addr_abs(cpu, bus); sre(cpu, bus, a)?; }
        0x53 => { let a = addr_ind_y(cpu, bus); sre(cpu, bus, a)?; }
        0x57 => { let a = addr_zp_x(cpu, bus); sre(cpu, bus, a)?; }
        0x5B => { let a = addr_abs_y(cpu, bus); sre(cpu, bus, a)?; }
        0x5F => { let a = addr_abs_x(cpu, bus); sre(cpu, bus, a)?; }

        0x63 => { let a = addr_ind_x(cpu, bus); rra(cpu, bus, a)?; }
        0x67 => { let a = addr_zp(cpu, bus); rra(cpu, bus, a)?; }
        0x6F => { let a = addr_abs(cpu, bus); rra(cpu, bus, a)?; }
        0x73 => { let a = addr_ind_y(cpu, bus); rra(cpu, bus, a)?; }
        0x77 => { let a = addr_zp_x(cpu, bus); rra(cpu, bus, a)?; }
        0x7B => { let a = addr_abs_y(cpu, bus); rra(cpu, bus, a)?; }
        0x7F => { let a = addr_abs_x(cpu, bus); rra(cpu, bus, a)?; }

        0xC3 => { let a = addr_ind_x(cpu, bus); dcp(cpu, bus, a)?; }
        0xC7 => { let a = addr_zp(cpu, bus); dcp(cpu, bus, a)?; }
        0xCF => { let a = addr_abs(cpu, bus); dcp(cpu, bus, a)?; }
        0xD3 => { let a = addr_ind_y(cpu, bus); dcp(cpu, bus, a)?; }
        0xD7 => { let a = addr_zp_x(cpu, bus); dcp(cpu, bus, a)?; }
        0xDB => { let a = addr_abs_y(cpu, bus); dcp(cpu, bus, a)?; }
        0xDF => { let a = addr_abs_x(cpu, bus); dcp(cpu, bus, a)?; }

        0xE3 => { let a = addr_ind_x(cpu, bus); isc(cpu, bus, a)?; }
        0xE7 => { let a = addr_zp(cpu, bus); isc(cpu, bus, a)?; }
        0xEF => { let a = addr_abs(cpu, bus); isc(cpu, bus, a)?; }
        0xF3 => { let a = addr_ind_y(cpu, bus); isc(cpu, bus, a)?; }
        0xF7 => { let a = addr_zp_x(cpu, bus); isc(cpu, bus, a)?; }
        0xFB => { let a = addr_abs_y(cpu, bus); isc(cpu, bus, a)?; }
        0xFF => { let a = addr_abs_x(cpu, bus); isc(cpu, bus, a)?; }

        // ----------------------------------------------------- unofficial loads
        0xA3 => lax(cpu, read_at!(addr_ind_x)),
        0xA7 => lax(cpu, read_at!(addr_zp)),
        0xAF => lax(cpu, read_at!(addr_abs)),
        0xB3 => lax(cpu, read_at!(addr_ind_y)),
        0xB7 => lax(cpu, read_at!(addr_zp_y)),
        0xBF => lax(cpu, read_at!(addr_abs_y)),

        0x83 => { let a = addr_ind_x(cpu, bus); bus.write(a, sax(cpu))?; }
        0x87 => { let a = addr_zp(cpu, bus); bus.write(a, sax(cpu))?; }
        0x8F => { let a = addr_abs(cpu, bus); bus.write(a, sax(cpu))?; }
        0x97 => { let a = addr_zp_y(cpu, bus); bus.write(a, sax(cpu))?; }

        // --------------------------------------------------- other unofficial
        0x0B | 0x2B => anc(cpu, fetch_byte(cpu, bus)),
        0x4B => alr(cpu, fetch_byte(cpu, bus)),
        0x6B => arr(cpu, fetch_byte(cpu, bus)),
        0xCB => axs(cpu, fetch_byte(cpu, bus)),
        0x8B => {
            let v = fetch_byte(cpu, bus);
            cpu.a &= cpu.x & v;
            cpu.update_zn(cpu.a);
        }
        0xBB => las(cpu, read_at!(addr_abs_y)),
        0xAB => lax(cpu, fetch_byte(cpu, bus)),

        0x9E => {
            let a = addr_abs_y(cpu, bus);
            let hi = (a >> 8) as u8;
            bus.write(a, unstable_store(cpu.x, hi))?;
        }
        0x9C => {
            let a = addr_abs_x(cpu, bus);
            let hi = (a >> 8) as u8;
            bus.write(a, unstable_store(cpu.y, hi))?;
        }
        0x93 => {
            let a = addr_ind_y(cpu, bus);
            let hi = (a >> 8) as u8;
            bus.write(a, unstable_store(cpu.a & cpu.x, hi))?;
        }
        0x9F => {
            let a = addr_abs_y(cpu, bus);
            let hi = (a >> 8) as u8;
            bus.write(a, unstable_store(cpu.a & cpu.x, hi))?;
        }
        0x9B => {
            let a = addr_abs_y(cpu, bus);
            cpu.sp = cpu.a & cpu.x;
            let hi = (a >> 8) as u8;
            bus.write(a, unstable_store(cpu.sp, hi))?;
        }

        // ------------------------------------------------------------ kill
        0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2 => {
            cpu.halted = true;
            return Err(EmuError::IllegalOpcode { opcode, pc: pc_at_fetch });
        }
    }

    Ok(cycles)
}
