//! 6502 CPU core: registers, addressing, instruction semantics, and dispatch.
//!
//! [`Cpu6502`] owns a [`state::CpuState`] and drives it one instruction at a
//! time via [`dispatch::step`]. There is no general maskable IRQ line on
//! the NES CPU as modeled here: the only asynchronous signal the CPU
//! services is the PPU's NMI, polled once per `step` from [`crate::bus::Bus`].

mod addressing;
mod dispatch;
mod execute;
pub mod state;
pub(crate) mod table;

use crate::bus::Bus;
use crate::error::EmuError;
use state::CpuState;

/// What BRK does when it's reached with no debugger/OS attached to service
/// the resulting software interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrkMode {
    /// Halt the CPU; `step` keeps returning `Ok(0)` without executing
    /// further instructions. Suitable for test ROMs that use BRK to signal
    /// completion.
    Halt,
    /// Treat BRK as a two-byte NOP: skip the padding byte and continue.
    /// Matches how some test harnesses use BRK as a soft breakpoint.
    NoOp,
}

pub struct Cpu6502 {
    state: CpuState,
    brk_mode: BrkMode,
    step_hook: Option<Box<dyn FnMut(&CpuState)>>,
}

impl Cpu6502 {
    pub fn new(brk_mode: BrkMode) -> Self {
        Self { state: CpuState::new(), brk_mode, step_hook: None }
    }

    pub fn reset(&mut self, bus: &mut Bus) {
        self.state.reset(bus);
    }

    pub fn state(&self) -> &CpuState {
        &self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    /// Override PC after `reset`, for headless test ROMs (e.g. nestest) that
    /// expect execution to begin somewhere other than the cartridge's own
    /// reset vector.
    pub fn set_pc(&mut self, pc: u16) {
        self.state.pc = pc;
    }

    /// Install a callback invoked with the pre-instruction register state at
    /// the start of every `step`, for trace logging.
    pub fn set_step_hook(&mut self, hook: impl FnMut(&CpuState) + 'static) {
        self.step_hook = Some(Box::new(hook));
    }

    /// Execute one instruction, service a pending NMI if the bus has one,
    /// and return the number of CPU cycles charged.
    pub fn step(&mut self, bus: &mut Bus) -> Result<u32, EmuError> {
        if self.state.halted {
            return Ok(0);
        }

        if let Some(hook) = self.step_hook.as_mut() {
            hook(&self.state);
        }

        let is_brk = bus.read(self.state.pc) == 0x00;
        if is_brk && self.brk_mode == BrkMode::NoOp {
            self.state.advance_pc(2);
            bus.tick(2);
            return Ok(2);
        }

        let cycles = dispatch::step(&mut self.state, bus)?;
        bus.tick(cycles);

        if is_brk && self.brk_mode == BrkMode::Halt {
            self.state.halted = true;
        }

        if bus.take_nmi() {
            let nmi_cycles = self.enter_nmi(bus);
            bus.tick(nmi_cycles);
            return Ok(cycles + nmi_cycles);
        }

        Ok(cycles)
    }

    /// Push PC and status (Break clear, Break2 set) and jump through the NMI
    /// vector. Charges 2 CPU cycles.
    fn enter_nmi(&mut self, bus: &mut Bus) -> u32 {
        execute::push_word(&mut self.state, bus, self.state.pc);
        execute::push_status_with_break(&mut self.state, bus, false);
        self.state.assign_flag(state::IRQ_DISABLE, true);
        self.state.pc = bus.read_word(0xFFFA);
        2
    }
}
