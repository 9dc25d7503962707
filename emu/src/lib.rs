pub mod emulator;
pub mod error;
pub mod hooks;
pub mod memory;

pub use emulator::{Emulator, Stop};
pub use error::Error;
pub use memory::Memory;
