use mm_isa::MachineId;

/// A contiguous run of raw bytes to be placed at `address` before execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub address: u16,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Input,
    Output,
}

/// One entry of the I/O binding table. `address` is a memory cell address on
/// every machine except the address-less stack machine, where it is read as
/// a count of stack slots instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub kind: BindingKind,
    pub address: u16,
    pub message: Option<String>,
}

/// Everything the loader needs, as produced by parsing a `.mmach` file (or,
/// for the modification machine, by assembling a `.mmasm` file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProgram {
    pub machine_id: MachineId,
    pub spans: Vec<Span>,
    pub bindings: Vec<Binding>,
    pub inline_enter: Option<Vec<i64>>,
}
