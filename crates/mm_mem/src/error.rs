/// Errors raised by a [`crate::Ram`] or [`crate::RegisterFile`] access.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    #[error("read of uninitialised cell at {0:#06x}")]
    UninitialisedRead(u16),
    #[error("address out of range: {0:#06x}")]
    AddressOutOfRange(u16),
    #[error("register index {0} isn't addressable on this machine")]
    IllegalRegister(u32),
    #[error("width mismatch: expected {expected}, got {got}")]
    WidthMismatch { expected: u32, got: u32 },
}

impl MemError {
    pub(crate) fn width_mismatch(expected: u32, got: u32) -> Self {
        Self::WidthMismatch { expected, got }
    }
}
