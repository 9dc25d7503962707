pub mod dump;
pub mod trace;

use crate::emulator::Emulator;

/// Observer called by the driver before every instruction.
pub trait Hook {
    fn init(&mut self, emu: &Emulator);
    fn exec(&mut self, time: u64, emu: &Emulator);
}
