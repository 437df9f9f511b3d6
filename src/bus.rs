//! System bus: CPU/PPU memory decode, OAM DMA, and PPU-address-space storage.
//!
//! The bus is the only thing that knows how CPU and PPU address spaces are
//! laid out. It owns nametable RAM and palette RAM directly and forwards
//! pattern-table accesses to the cartridge's mapper, implementing
//! [`crate::ppu::PpuBus`] so the PPU never has to know about cartridges.

use crate::apu::Apu;
use crate::cartridge::{Cartridge, Mirroring};
use crate::error::EmuError;
use crate::joypad::Joypad;
use crate::ppu::{Ppu, PpuBus};

pub struct Bus {
    ram: [u8; 0x0800],
    pub ppu: Ppu,
    pub apu: Apu,
    pub joypad: Joypad,
    pub cartridge: Option<Cartridge>,

    nt_ram: [u8; 0x0800],
    palette_ram: [u8; 32],

    cpu_cycle: u64,

    nmi_pending: bool,

    frame_callback: Option<Box<dyn FnMut(&Ppu, &mut Joypad)>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: [0; 0x0800],
            ppu: Ppu::new(),
            apu: Apu::new(),
            joypad: Joypad::new(),
            cartridge: None,
            nt_ram: [0; 0x0800],
            palette_ram: [0; 32],
            cpu_cycle: 0,
            nmi_pending: false,
            frame_callback: None,
        }
    }

    pub fn reset(&mut self) {
        self.ram = [0; 0x0800];
        self.ppu.reset();
        self.apu.reset();
        self.nt_ram = [0; 0x0800];
        self.palette_ram = [0; 32];
        self.cpu_cycle = 0;
        self.nmi_pending = false;
    }

    pub fn attach_cartridge(&mut self, cart: Cartridge) {
        self.cartridge = Some(cart);
    }

    pub fn set_frame_callback(&mut self, cb: impl FnMut(&Ppu, &mut Joypad) + 'static) {
        self.frame_callback = Some(Box::new(cb));
    }

    // -------------- CPU-visible address decode --------------

    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000 | 0x2001 | 0x2003 | 0x2005 | 0x2006 | 0x4014 => 0,
            0x2002 | 0x2004 | 0x2007 => self.ppu_read_reg(addr),
            0x2008..=0x3FFF => {
                let reg = 0x2000 + (addr & 0x0007);
                self.read(reg)
            }
            0x4000..=0x4013 | 0x4015 => self.apu.read_reg(addr),
            0x4016 => self.joypad.read(),
            0x4017 => 0,
            0x4018..=0x401F => 0,
            0x4020..=0x5FFF => 0,
            0x6000..=0x7FFF => self
                .cartridge
                .as_ref()
                .map(|c| c.cpu_read_prg_ram(addr))
                .unwrap_or(0),
            0x8000..=0xFFFF => self
                .cartridge
                .as_ref()
                .map(|c| c.cpu_read_prg_rom(addr))
                .unwrap_or(0xFF),
        }
    }

    /// Separate helper so the borrow-checker sees a single mutable borrow of
    /// `self` for the duration of a PPU register access. Swaps in a
    /// non-allocating placeholder rather than a fresh `Ppu::new()`, since
    /// `$2002`/`$2004`/`$2007` are on the hottest possible path (games poll
    /// vblank status every frame).
    fn ppu_read_reg(&mut self, addr: u16) -> u8 {
        let mut ppu = std::mem::replace(&mut self.ppu, Ppu::placeholder());
        let value = ppu.read_reg(addr, self);
        self.ppu = ppu;
        value
    }

    fn ppu_write_reg(&mut self, addr: u16, value: u8) {
        let mut ppu = std::mem::replace(&mut self.ppu, Ppu::placeholder());
        ppu.write_reg(addr, value, self);
        self.ppu = ppu;
    }

    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), EmuError> {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x2000 | 0x2001 | 0x2003 | 0x2005 | 0x2006 | 0x2007 => {
                self.ppu_write_reg(addr, value);
            }
            0x2002 => {}
            0x2008..=0x3FFF => {
                let reg = 0x2000 + (addr & 0x0007);
                self.write(reg, value)?;
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_reg(addr, value),
            0x4014 => self.oam_dma(value),
            0x4016 => self.joypad.write_strobe(value),
            0x4018..=0x401F => {}
            0x4020..=0x5FFF => {}
            0x6000..=0x7FFF => {
                if let Some(cart) = self.cartridge.as_mut() {
                    cart.cpu_write_prg_ram(addr, value);
                }
            }
            0x8000..=0xFFFF => {
                log::warn!("write to ROM at {addr:#06X} (value {value:#04X})");
                return Err(EmuError::WriteToRom { addr, value });
            }
        }
        Ok(())
    }

    /// Instantaneous 256-byte OAM DMA copy from `value * 0x100`.
    fn oam_dma(&mut self, value: u8) {
        let base = (value as u16) << 8;
        let mut buf = [0u8; 256];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.read(base.wrapping_add(i as u16));
        }
        self.ppu.oam_dma_copy(&buf);
        log::trace!("OAM DMA from {base:#06X}");
    }

    /// Non-mutating read used by the trace formatter: never clears PPU
    /// vblank, never advances the PPUDATA buffer or OAMAddr, never shifts
    /// the joypad's serial register. Everything else reads exactly as
    /// [`Self::read`] would.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000 | 0x2001 | 0x2003 | 0x2005 | 0x2006 | 0x4014 => 0,
            0x2002 | 0x2004 | 0x2007 => self.ppu.peek_reg(addr),
            0x2008..=0x3FFF => self.peek(0x2000 + (addr & 0x0007)),
            0x4000..=0x4013 | 0x4015 => self.apu.read_reg(addr),
            0x4016 => self.joypad.peek(),
            0x4017 => 0,
            0x4018..=0x401F => 0,
            0x4020..=0x5FFF => 0,
            0x6000..=0x7FFF => self
                .cartridge
                .as_ref()
                .map(|c| c.cpu_read_prg_ram(addr))
                .unwrap_or(0),
            0x8000..=0xFFFF => self
                .cartridge
                .as_ref()
                .map(|c| c.cpu_read_prg_rom(addr))
                .unwrap_or(0xFF),
        }
    }

    /// Non-mutating 16-bit little-endian read, built on [`Self::peek`].
    pub fn peek_word(&self, addr: u16) -> u16 {
        let lo = self.peek(addr) as u16;
        let hi = self.peek(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    // -------------- PPU address-space mapping --------------

    /// Fold a nametable address (0x2000-0x2FFF) per the cartridge's mirroring mode.
    fn map_nametable_addr(&self, addr: u16) -> u16 {
        let idx = (addr & 0x2FFF) - 0x2000;
        let nt = idx / 0x400;
        let mirroring = self
            .cartridge
            .as_ref()
            .map(|c| c.mirroring())
            .unwrap_or(Mirroring::Horizontal);
        let folded = match mirroring {
            Mirroring::Vertical => match nt {
                2 | 3 => idx - 0x800,
                _ => idx,
            },
            Mirroring::Horizontal => match nt {
                1 | 2 => idx - 0x400,
                3 => idx - 0x800,
                _ => idx,
            },
            Mirroring::FourScreen => idx,
        };
        folded & 0x07FF
    }

    fn map_palette_addr(&self, addr: u16) -> usize {
        let mut idx = ((addr - 0x3F00) & 0x1F) as usize;
        if idx >= 16 && idx & 3 == 0 {
            idx -= 16;
        }
        idx
    }

    fn ppu_mem_read(&self, addr: u16) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => self
                .cartridge
                .as_ref()
                .map(|c| c.mapper.borrow().ppu_read(addr))
                .unwrap_or(0),
            0x2000..=0x2FFF => self.nt_ram[self.map_nametable_addr(addr) as usize],
            0x3000..=0x3EFF => self.nt_ram[self.map_nametable_addr(addr - 0x1000) as usize],
            0x3F00..=0x3FFF => self.palette_ram[self.map_palette_addr(addr)],
            _ => 0,
        }
    }

    fn ppu_mem_write(&mut self, addr: u16, value: u8) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => {
                if let Some(cart) = self.cartridge.as_mut() {
                    cart.mapper.get_mut().ppu_write(addr, value);
                }
            }
            0x2000..=0x2FFF => {
                let idx = self.map_nametable_addr(addr);
                self.nt_ram[idx as usize] = value;
            }
            0x3000..=0x3EFF => {
                let idx = self.map_nametable_addr(addr - 0x1000);
                self.nt_ram[idx as usize] = value;
            }
            0x3F00..=0x3FFF => {
                let idx = self.map_palette_addr(addr);
                self.palette_ram[idx] = value;
            }
            _ => {}
        }
    }

    // -------------- Timing --------------

    /// Advance the bus by `cycles` CPU cycles: ticks the PPU at 3x, renders
    /// and invokes the host callback on the frame edge, and latches NMI.
    pub fn tick(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.cpu_cycle += 1;
            for _ in 0..3 {
                if self.ppu.tick() {
                    self.render_and_notify();
                }
            }
            if self.ppu.poll_nmi() {
                self.nmi_pending = true;
            }
        }
    }

    fn render_and_notify(&mut self) {
        let mut ppu = std::mem::replace(&mut self.ppu, Ppu::placeholder());
        ppu.render_frame(&*self);
        self.ppu = ppu;

        if let Some(mut cb) = self.frame_callback.take() {
            cb(&self.ppu, &mut self.joypad);
            self.frame_callback = Some(cb);
        }
    }

    /// Poll and clear the pending NMI flag; used by the CPU main loop.
    pub fn take_nmi(&mut self) -> bool {
        let v = self.nmi_pending;
        self.nmi_pending = false;
        v
    }

    pub fn total_ticks(&self) -> u64 {
        self.cpu_cycle
    }

    pub fn cartridge_mut(&mut self) -> Option<&mut Cartridge> {
        self.cartridge.as_mut()
    }

    pub fn cartridge_ref(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }
}

impl PpuBus for Bus {
    fn ppu_read(&self, addr: u16) -> u8 {
        self.ppu_mem_read(addr)
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        self.ppu_mem_write(addr, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::build_nrom_with_prg;

    fn bus_with_rom(prg: Vec<u8>) -> Bus {
        let mut bus = Bus::new();
        let data = build_nrom_with_prg(&prg, 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&data).unwrap();
        bus.attach_cartridge(cart);
        bus
    }

    #[test]
    fn ram_mirroring() {
        let mut bus = bus_with_rom(vec![0; 16 * 1024]);
        bus.write(0x0000, 0x42).unwrap();
        assert_eq!(bus.read(0x0800), 0x42);
        assert_eq!(bus.read(0x1000), 0x42);
        assert_eq!(bus.read(0x1800), 0x42);
    }

    #[test]
    fn ppu_reg_mirror() {
        let mut bus = bus_with_rom(vec![0; 16 * 1024]);
        bus.write(0x2003, 0x10).unwrap(); // OAMADDR
        bus.write(0x2004, 0x77).unwrap(); // OAMDATA
        bus.write(0x2003, 0x10).unwrap();
        assert_eq!(bus.read(0x2004), 0x77);
        // mirrored window
        bus.write(0x200B, 0x20).unwrap(); // 0x200B & 7 == 3 -> OAMADDR
        bus.write(0x200C, 0x99).unwrap(); // OAMDATA mirror
        bus.write(0x2003, 0x20).unwrap();
        assert_eq!(bus.read(0x2004), 0x99);
    }

    #[test]
    fn joypad_strobe_and_read() {
        let mut bus = bus_with_rom(vec![0; 16 * 1024]);
        bus.joypad.set_state_mask(0b0000_0001); // A pressed
        bus.write(0x4016, 1).unwrap();
        bus.write(0x4016, 0).unwrap();
        assert_eq!(bus.read(0x4016) & 1, 1);
        assert_eq!(bus.read(0x4016) & 1, 0);
        assert_eq!(bus.read(0x4017) & 1, 0);
    }

    #[test]
    fn prg_ram_basic() {
        let mut bus = bus_with_rom(vec![0; 16 * 1024]);
        bus.write(0x6000, 0xAB).unwrap();
        assert_eq!(bus.read(0x6000), 0xAB);
    }

    #[test]
    fn write_to_rom_is_rejected() {
        let mut bus = bus_with_rom(vec![0; 16 * 1024]);
        let err = bus.write(0x8000, 0x00).unwrap_err();
        assert!(matches!(err, EmuError::WriteToRom { .. }));
    }

    #[test]
    fn oam_dma_copies_256_bytes() {
        let mut bus = bus_with_rom(vec![0; 16 * 1024]);
        for i in 0..256u16 {
            bus.write(0x0200 + i, i as u8).unwrap();
        }
        bus.write(0x4014, 0x02).unwrap();
        bus.write(0x2003, 0x00).unwrap();
        assert_eq!(bus.read(0x2004), 0x00);
        bus.write(0x2003, 0x01).unwrap();
        assert_eq!(bus.read(0x2004), 0x01);
    }

    #[test]
    fn nametable_horizontal_mirroring() {
        let mut bus = bus_with_rom(vec![0; 16 * 1024]);
        // default header built by build_nrom_with_prg uses horizontal mirroring (flags6=0)
        bus.ppu_write(0x2000, 0xAA);
        assert_eq!(bus.ppu_read(0x2400), 0xAA); // nt1 folds onto nt0
        bus.ppu_write(0x2800, 0xBB);
        assert_eq!(bus.ppu_read(0x2C00), 0xBB); // nt3 folds onto nt1 (== nt2 store)
    }

    #[test]
    fn peek_does_not_disturb_vblank_or_oam_addr() {
        let mut bus = bus_with_rom(vec![0; 16 * 1024]);
        bus.ppu.set_vblank_for_test(true);
        let before = bus.peek(0x2002);
        let after = bus.peek(0x2002);
        assert_eq!(before & 0x80, 0x80);
        assert_eq!(after & 0x80, 0x80); // a real read would have cleared this
    }

    #[test]
    fn palette_mirroring() {
        let mut bus = bus_with_rom(vec![0; 16 * 1024]);
        bus.ppu_write(0x3F10, 0x12);
        assert_eq!(bus.ppu_read(0x3F00), 0x12);
        bus.ppu_write(0x3F00, 0x34);
        assert_eq!(bus.ppu_read(0x3F10), 0x34);
    }
}
