/// Everything that can go wrong building and running a machine from a parsed
/// program, beyond what the source parser itself already catches.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("control unit fault: {0}")]
    Cpu(#[from] mm_core::Error),

    #[error("input value {value} at binding {index} doesn't fit a {width}-bit word")]
    NumberOutOfRange { index: usize, value: i64, width: u32 },

    #[error("program supplies {bindings} input bindings but only {values} input values were given")]
    NotEnoughInput { bindings: usize, values: usize },
}
