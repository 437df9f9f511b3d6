use std::process::ExitCode;

use clap::Parser;

use oxines::config::Config;
use oxines::{Bus, Cartridge, Cpu6502};

fn main() -> ExitCode {
    env_logger::init();
    let config = Config::parse();

    let rom_bytes = match std::fs::read(&config.rom) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to read {}: {err}", config.rom.display());
            return ExitCode::FAILURE;
        }
    };

    let cartridge = match Cartridge::from_ines_bytes(&rom_bytes) {
        Ok(cart) => cart,
        Err(err) => {
            eprintln!("failed to parse {}: {err}", config.rom.display());
            return ExitCode::FAILURE;
        }
    };

    let mut bus = Bus::new();
    bus.attach_cartridge(cartridge);

    let mut cpu = Cpu6502::new(config.brk_mode.into());
    cpu.reset(&mut bus);

    if let Some(start_pc) = config.start_pc {
        log::info!("overriding reset vector, starting at {start_pc:#06X}");
        cpu.set_pc(start_pc);
    }

    #[cfg(feature = "display")]
    if !config.trace {
        oxines::display::run(cpu, bus);
        return ExitCode::SUCCESS;
    }

    run_headless(cpu, bus, config.trace);
    ExitCode::SUCCESS
}

fn run_headless(mut cpu: Cpu6502, mut bus: Bus, trace: bool) {
    loop {
        if trace {
            println!("{}", oxines::trace::format_trace_line(&cpu, &mut bus));
        }
        if let Err(err) = cpu.step(&mut bus) {
            log::error!("halting: {err}");
            break;
        }
        if cpu.is_halted() {
            break;
        }
    }
}
