pub mod alu;
pub mod decode;
pub mod device;
pub mod error;
pub mod inst;
pub mod op;
pub mod operand;
pub mod reg;

pub use error::Error;

/// Number of addressable words.
pub const MEMORY_SIZE: usize = 0x10000;
