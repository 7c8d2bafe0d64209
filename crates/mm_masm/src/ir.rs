/// A decoded operand, before label references are resolved to addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    Label(String),
    /// `label(reg)`: register contributes the modifier, `label` the
    /// displacement, exactly the instruction's addressing mode.
    Indexed { label: String, reg: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub line: usize,
    pub label: Option<String>,
    pub mnemonic: String,
    pub operands: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDirective {
    pub line: usize,
    pub label: Option<String>,
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpDirective {
    pub line: usize,
    /// `(label, size)`; `size` defaults to `1` when `label(size)` isn't given.
    pub targets: Vec<(String, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Statement(Statement),
    Word(WordDirective),
    /// `.config N`: set the load address of everything that follows to `N`.
    Config { line: usize, address: u16 },
    /// `.code`: set the load address of everything that follows to `0`.
    Code { line: usize },
    Dump(DumpDirective),
}
