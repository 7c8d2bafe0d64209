use std::fmt;

/// Errors that can occur while performing arithmetic on a [`crate::Word`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("signed overflow")]
    SignedOverflow,
}

/// Raised when two operands of mismatched width are combined, or a value doesn't
/// fit the width it's being constructed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthMismatch {
    pub lhs: u32,
    pub rhs: u32,
}

impl fmt::Display for WidthMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "operand width mismatch: {} bits vs {} bits", self.lhs, self.rhs)
    }
}

impl std::error::Error for WidthMismatch {}
