pub mod abi;
pub mod block;
pub mod error;
pub mod lexer;
pub mod library;
pub mod linker;
pub mod movesort;
pub mod parser;
pub mod registry;
pub mod yaml;

pub use block::{ind, off, Block, Data, DataItem};
pub use error::Error;
pub use library::{LibRef, Library};
pub use linker::Linker;
pub use registry::Registry;
