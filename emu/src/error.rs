use color_print::cprintln;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Decode error: {0}")]
    Decode(#[from] arch::Error),

    #[error("Memory access out of bounds: 0x{0:X}")]
    Bounds(usize),

    #[error("Invalid operand: {0}")]
    OperandKind(String),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Invalid YAML in {0}")]
    Yaml(String, #[source] serde_yaml::Error),
}

impl Error {
    pub fn print_diag(&self) {
        cprintln!("<red,bold>error</>: {}", self);
    }
}
