/// Errors raised while parsing a `.mmach` source file, before any execution
/// is attempted.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unknown cpu id {id:?}")]
    UnknownCpu { line: usize, id: String },

    #[error("line {line}: {text:?} does not fit the target width")]
    NumberOutOfRange { line: usize, text: String },

    #[error("`.code` sections overlap in the range touched by the one starting at line {line}")]
    OverlappingSpans { line: usize },

    #[error("source has no `.cpu` directive")]
    MissingCpu,
}
