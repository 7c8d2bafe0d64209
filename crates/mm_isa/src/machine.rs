/// Identifies one of the eight model machines. Each carries a short "cpu tag"
/// matching the `.config` / `.mmach` header token a program image names itself
/// with (e.g. `mm-3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineId {
    /// Three-address: `op dst, src1, src2`.
    ThreeAddress,
    /// Two-address: `op dst, src` (dst doubles as first operand).
    TwoAddress,
    /// Variable-length: per-opcode instruction lengths rather than one fixed width.
    VariableLength,
    /// One-address: single memory operand plus an implicit accumulator.
    OneAddress,
    /// Stack machine with addressed push/pop.
    Stack,
    /// Address-less stack machine: push takes an immediate, pop/jump take no address.
    StacklessZero,
    /// Register machine: all operands are numbered general-purpose registers.
    Register,
    /// Register-with-modification: adds indexed addressing via a modifier register.
    RegisterModified,
}

impl MachineId {
    pub fn cpu_tag(self) -> &'static str {
        match self {
            MachineId::ThreeAddress => "mm-3",
            MachineId::TwoAddress => "mm-2",
            MachineId::VariableLength => "mm-v",
            MachineId::OneAddress => "mm-1",
            MachineId::Stack => "mm-s",
            MachineId::StacklessZero => "mm-0",
            MachineId::Register => "mm-r",
            MachineId::RegisterModified => "mm-m",
        }
    }

    pub fn from_cpu_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "mm-3" => MachineId::ThreeAddress,
            "mm-2" => MachineId::TwoAddress,
            "mm-v" => MachineId::VariableLength,
            "mm-1" => MachineId::OneAddress,
            "mm-s" => MachineId::Stack,
            "mm-0" => MachineId::StacklessZero,
            "mm-r" => MachineId::Register,
            "mm-m" => MachineId::RegisterModified,
            _ => return None,
        })
    }

    pub const ALL: [MachineId; 8] = [
        MachineId::ThreeAddress,
        MachineId::TwoAddress,
        MachineId::VariableLength,
        MachineId::OneAddress,
        MachineId::Stack,
        MachineId::StacklessZero,
        MachineId::Register,
        MachineId::RegisterModified,
    ];
}

/// Whether out-of-range stack access is an error or silently clamped. Every
/// machine as specified treats both under- and overflow as hard errors, but the
/// policy is kept as data rather than hardcoded so a future machine variant
/// (or a debugger "permissive" mode) can relax it without touching the control
/// unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackPolicy {
    pub depth: u32,
    pub error_on_underflow: bool,
    pub error_on_overflow: bool,
}

impl StackPolicy {
    pub const fn strict(depth: u32) -> Self {
        Self { depth, error_on_underflow: true, error_on_overflow: true }
    }
}

/// Everything about a machine that the control unit needs but the opcode table
/// doesn't carry directly: word width, cell size, address space, and whether
/// the machine has a stack at all.
#[derive(Debug, Clone, Copy)]
pub struct MachineConfig {
    pub id: MachineId,
    pub word_bits: u32,
    pub cell_bytes: u32,
    pub address_bits: u32,
    pub protected_memory: bool,
    pub stack: Option<StackPolicy>,
    pub gp_register_count: u32,
}

impl MachineConfig {
    pub fn for_machine(id: MachineId) -> Self {
        match id {
            MachineId::ThreeAddress => MachineConfig {
                id,
                word_bits: 32,
                cell_bytes: 2,
                address_bits: 16,
                protected_memory: true,
                stack: None,
                gp_register_count: 0,
            },
            MachineId::TwoAddress => MachineConfig {
                id,
                word_bits: 16,
                cell_bytes: 1,
                address_bits: 16,
                protected_memory: true,
                stack: None,
                gp_register_count: 0,
            },
            MachineId::VariableLength => MachineConfig {
                id,
                word_bits: 24,
                cell_bytes: 3,
                address_bits: 16,
                protected_memory: true,
                stack: None,
                // Arithmetic/cmp address a register nibble (table.rs's
                // `variable_length()`), so this machine needs the same
                // sixteen-register file the register machines have.
                gp_register_count: 16,
            },
            MachineId::OneAddress => MachineConfig {
                id,
                word_bits: 16,
                cell_bytes: 2,
                address_bits: 16,
                protected_memory: true,
                stack: None,
                gp_register_count: 0,
            },
            MachineId::Stack => MachineConfig {
                id,
                word_bits: 24,
                cell_bytes: 3,
                address_bits: 16,
                protected_memory: true,
                stack: Some(StackPolicy::strict(256)),
                gp_register_count: 0,
            },
            MachineId::StacklessZero => MachineConfig {
                id,
                word_bits: 16,
                cell_bytes: 1,
                address_bits: 16,
                protected_memory: true,
                stack: Some(StackPolicy::strict(256)),
                gp_register_count: 0,
            },
            MachineId::Register => MachineConfig {
                id,
                word_bits: 40,
                cell_bytes: 5,
                address_bits: 16,
                protected_memory: true,
                stack: None,
                gp_register_count: 16,
            },
            MachineId::RegisterModified => MachineConfig {
                id,
                word_bits: 56,
                cell_bytes: 7,
                address_bits: 16,
                protected_memory: true,
                stack: None,
                gp_register_count: 16,
            },
        }
    }
}
