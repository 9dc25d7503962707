use color_print::cprintln;

use super::Hook;
use crate::emulator::Emulator;

/// Prints every instruction before it runs.
pub struct Trace;

impl Hook for Trace {
    fn init(&mut self, _emu: &Emulator) {
        println!(" * Trace");
    }

    fn exec(&mut self, time: u64, emu: &Emulator) {
        match emu.next_instruction() {
            Ok((addr, inst)) => println!("[{:0>4}] {:0>4X} {}", time, addr, inst.cformat()),
            Err(err) => cprintln!("[{:0>4}] {:0>4X} <red>{}</>", time, emu.pc(), err),
        }
    }
}
