use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid opcode: 0x{0:X}")]
    InvalidOpcode(u16),

    #[error("Invalid non-basic opcode: 0x{0:X}")]
    InvalidNonBasicOpcode(u16),

    #[error("Invalid operand field: 0x{0:X}")]
    InvalidOperand(u16),

    #[error("Malformed operand: {0}")]
    MalformedOperand(String),

    #[error("Unknown operation: `{0}`")]
    UnknownOperation(String),

    #[error("Unknown register: `{0}`")]
    UnknownRegister(String),
}

impl Error {
    /// Errors raised while decoding machine words.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::InvalidOpcode(_) | Error::InvalidNonBasicOpcode(_) | Error::InvalidOperand(_)
        )
    }
}
