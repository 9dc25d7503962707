use color_print::cprintln;
use std::fmt;
use thiserror::Error;

/// Parse failure in a textual source, with enough context for a caret
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub msg: String,
    pub file: String,
    /// 1-based
    pub line: usize,
    /// 1-based, counted in characters
    pub col: usize,
    pub source_line: String,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}:{}", self.msg, self.file, self.line, self.col)
    }
}

impl SyntaxError {
    /// Whitespace leading up to the offending column. Tabs are kept so the
    /// caret lines up with the source.
    pub fn caret_padding(&self) -> String {
        self.source_line
            .chars()
            .take(self.col.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect()
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Arch(#[from] arch::Error),

    #[error("Syntax error: {0}")]
    Syntax(SyntaxError),

    #[error("Unknown data type: {0}")]
    UnknownData(String),

    #[error("No label: `{0}`")]
    MissingLabel(String),

    #[error("Re-defined label: `{0}`")]
    RedefinedLabel(String),

    #[error("No block: `{0}`")]
    MissingBlock(String),

    #[error("No library: `{0}`")]
    NoLibrary(String),

    #[error("No device: `{0}`")]
    NoDevice(String),

    #[error("Unknown library format: {0}")]
    UnknownLibraryFormat(String),

    #[error("Unresolved reference to block `{0}`")]
    Unresolved(String),

    #[error("Address of `{0}` does not fit in 16 bits")]
    AddressOverflow(String),

    #[error("Image of {0} words does not fit in memory")]
    ImageTooLarge(usize),

    #[error("Too many register arguments: {0}")]
    TooManyArguments(usize),

    #[error("Move scheduler: {0}")]
    SchedulerInvariant(String),

    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to create file: {0}")]
    FileCreate(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Invalid YAML in {0}")]
    Yaml(String, #[source] serde_yaml::Error),
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

impl Error {
    /// Print the error, with the offending source line for syntax errors.
    pub fn print_diag(&self) {
        cprintln!("<red,bold>error</>: {}", self);
        if let Error::Syntax(err) = self {
            cprintln!("     <blue>--></> <underline>{}:{}:{}</>", err.file, err.line, err.col);
            cprintln!("      <blue>|</>");
            cprintln!(" <blue>{:>4} |</> {}", err.line, err.source_line);
            cprintln!("      <blue>|</> {}<red,bold>^</>", err.caret_padding());
        }
    }
}
