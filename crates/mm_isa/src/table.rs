use crate::machine::MachineId;
use crate::predicate::Predicate;
use crate::semantics::{AddrMode, ArithOp, Semantics};

/// One row of a machine's opcode table: how to decode an instruction and what
/// it means once decoded. `operand_count` and `addr_mode` together tell the
/// loader/assembler/control-unit how many operand slots to read and in what
/// encoding; `length_bytes` is the total instruction length including the
/// opcode byte itself, fixed per-opcode (even on the variable-length machine,
/// where it varies *across* opcodes rather than within one).
#[derive(Debug, Clone, Copy)]
pub struct InstructionDesc {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub addr_mode: AddrMode,
    pub operand_count: u8,
    pub length_bytes: u32,
    pub semantics: Semantics,
}

/// `0x99` is reserved for halt on every machine, per the shared control unit's
/// single hardcoded stop opcode.
pub const HALT_OPCODE: u8 = 0x99;

const ARITH_OPS: [(u8, &str, ArithOp); 5] = [
    (0x00, "add", ArithOp::Add),
    (0x01, "sub", ArithOp::Sub),
    (0x02, "mul", ArithOp::Mul),
    (0x03, "div", ArithOp::Div),
    (0x04, "mod", ArithOp::Mod),
];

const JUMP_IF: [(u8, Predicate); 10] = [
    (0x10, Predicate::Eq),
    (0x11, Predicate::Neq),
    (0x12, Predicate::SignedLess),
    (0x13, Predicate::SignedGreaterEq),
    (0x14, Predicate::SignedLessEq),
    (0x15, Predicate::SignedGreater),
    (0x16, Predicate::UnsignedLess),
    (0x17, Predicate::UnsignedGreaterEq),
    (0x18, Predicate::UnsignedLessEq),
    (0x19, Predicate::UnsignedGreater),
];

fn halt() -> InstructionDesc {
    InstructionDesc {
        opcode: HALT_OPCODE,
        mnemonic: "halt",
        addr_mode: AddrMode::None,
        operand_count: 0,
        length_bytes: 1,
        semantics: Semantics::Halt,
    }
}

/// Three-address: `op dst, src1, src2`, every operand a direct 16-bit address.
fn three_address() -> Vec<InstructionDesc> {
    let mut table = Vec::new();
    for (opcode, mnemonic, op) in ARITH_OPS {
        table.push(InstructionDesc {
            opcode,
            mnemonic,
            addr_mode: AddrMode::Direct,
            operand_count: 3,
            length_bytes: 1 + 3 * 2,
            semantics: Semantics::Arith(op),
        });
    }
    table.push(InstructionDesc {
        opcode: 0x05,
        mnemonic: "move",
        addr_mode: AddrMode::Direct,
        operand_count: 2,
        length_bytes: 1 + 2 * 2,
        semantics: Semantics::Move,
    });
    table.push(InstructionDesc {
        opcode: 0x06,
        mnemonic: "cmp",
        addr_mode: AddrMode::Direct,
        operand_count: 2,
        length_bytes: 1 + 2 * 2,
        semantics: Semantics::Cmp,
    });
    table.push(InstructionDesc {
        opcode: 0x07,
        mnemonic: "jump",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Jump,
    });
    for (opcode, predicate) in JUMP_IF {
        table.push(InstructionDesc {
            opcode,
            mnemonic: predicate.mnemonic(),
            addr_mode: AddrMode::Direct,
            operand_count: 1,
            length_bytes: 1 + 2,
            semantics: Semantics::JumpIf(predicate),
        });
    }
    table.push(halt());
    table
}

/// Two-address: `op dst, src`; `dst` is read as the first operand too.
fn two_address() -> Vec<InstructionDesc> {
    let mut table = Vec::new();
    for (opcode, mnemonic, op) in ARITH_OPS {
        table.push(InstructionDesc {
            opcode,
            mnemonic,
            addr_mode: AddrMode::Direct,
            operand_count: 2,
            length_bytes: 1 + 2 * 2,
            semantics: Semantics::Arith(op),
        });
    }
    table.push(InstructionDesc {
        opcode: 0x05,
        mnemonic: "move",
        addr_mode: AddrMode::Direct,
        operand_count: 2,
        length_bytes: 1 + 2 * 2,
        semantics: Semantics::Move,
    });
    table.push(InstructionDesc {
        opcode: 0x06,
        mnemonic: "cmp",
        addr_mode: AddrMode::Direct,
        operand_count: 2,
        length_bytes: 1 + 2 * 2,
        semantics: Semantics::Cmp,
    });
    table.push(InstructionDesc {
        opcode: 0x07,
        mnemonic: "jump",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Jump,
    });
    for (opcode, predicate) in JUMP_IF {
        table.push(InstructionDesc {
            opcode,
            mnemonic: predicate.mnemonic(),
            addr_mode: AddrMode::Direct,
            operand_count: 1,
            length_bytes: 1 + 2,
            semantics: Semantics::JumpIf(predicate),
        });
    }
    table.push(halt());
    table
}

/// Variable-length: operand encoding (and hence instruction length) differs
/// opcode by opcode rather than being uniform across the machine. Arithmetic
/// and compare address registers (one byte per register index); move
/// addresses two full 16-bit cells; control flow addresses a 16-bit cell.
fn variable_length() -> Vec<InstructionDesc> {
    let mut table = Vec::new();
    for (opcode, mnemonic, op) in ARITH_OPS {
        table.push(InstructionDesc {
            opcode,
            mnemonic,
            addr_mode: AddrMode::Register,
            operand_count: 3,
            length_bytes: 1 + 3,
            semantics: Semantics::Arith(op),
        });
    }
    table.push(InstructionDesc {
        opcode: 0x05,
        mnemonic: "move",
        addr_mode: AddrMode::Direct,
        operand_count: 2,
        length_bytes: 1 + 2 * 2,
        semantics: Semantics::Move,
    });
    table.push(InstructionDesc {
        opcode: 0x06,
        mnemonic: "cmp",
        addr_mode: AddrMode::Register,
        operand_count: 2,
        length_bytes: 1 + 2,
        semantics: Semantics::Cmp,
    });
    table.push(InstructionDesc {
        opcode: 0x07,
        mnemonic: "jump",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Jump,
    });
    for (opcode, predicate) in JUMP_IF {
        table.push(InstructionDesc {
            opcode,
            mnemonic: predicate.mnemonic(),
            addr_mode: AddrMode::Direct,
            operand_count: 1,
            length_bytes: 1 + 2,
            semantics: Semantics::JumpIf(predicate),
        });
    }
    table.push(halt());
    table
}

/// One-address: every opcode names a single memory operand and combines it
/// with an implicit accumulator.
fn one_address() -> Vec<InstructionDesc> {
    let mut table = Vec::new();
    for (opcode, mnemonic, op) in ARITH_OPS {
        table.push(InstructionDesc {
            opcode,
            mnemonic,
            addr_mode: AddrMode::Direct,
            operand_count: 1,
            length_bytes: 1 + 2,
            semantics: Semantics::Arith(op),
        });
    }
    table.push(InstructionDesc {
        opcode: 0x05,
        mnemonic: "load",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Move,
    });
    table.push(InstructionDesc {
        opcode: 0x08,
        mnemonic: "store",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Move,
    });
    table.push(InstructionDesc {
        opcode: 0x06,
        mnemonic: "cmp",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Cmp,
    });
    table.push(InstructionDesc {
        opcode: 0x07,
        mnemonic: "jump",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Jump,
    });
    for (opcode, predicate) in JUMP_IF {
        table.push(InstructionDesc {
            opcode,
            mnemonic: predicate.mnemonic(),
            addr_mode: AddrMode::Direct,
            operand_count: 1,
            length_bytes: 1 + 2,
            semantics: Semantics::JumpIf(predicate),
        });
    }
    table.push(halt());
    table
}

/// Stack machine with addressed push/pop: arithmetic and compare pop their
/// operands off the stack (address-less), while push/pop name a memory cell.
fn stack() -> Vec<InstructionDesc> {
    let mut table = Vec::new();
    for (opcode, mnemonic, op) in ARITH_OPS {
        table.push(InstructionDesc {
            opcode,
            mnemonic,
            addr_mode: AddrMode::None,
            operand_count: 0,
            length_bytes: 1,
            semantics: Semantics::Arith(op),
        });
    }
    table.push(InstructionDesc {
        opcode: 0x06,
        mnemonic: "cmp",
        addr_mode: AddrMode::None,
        operand_count: 0,
        length_bytes: 1,
        semantics: Semantics::Cmp,
    });
    table.push(InstructionDesc {
        opcode: 0x20,
        mnemonic: "push",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Push,
    });
    table.push(InstructionDesc {
        opcode: 0x21,
        mnemonic: "pop",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Pop,
    });
    table.push(InstructionDesc {
        opcode: 0x22,
        mnemonic: "dup",
        addr_mode: AddrMode::None,
        operand_count: 0,
        length_bytes: 1,
        semantics: Semantics::Dup,
    });
    table.push(InstructionDesc {
        opcode: 0x23,
        mnemonic: "swap",
        addr_mode: AddrMode::None,
        operand_count: 0,
        length_bytes: 1,
        semantics: Semantics::Swap,
    });
    table.push(InstructionDesc {
        opcode: 0x07,
        mnemonic: "jump",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Jump,
    });
    for (opcode, predicate) in JUMP_IF {
        table.push(InstructionDesc {
            opcode,
            mnemonic: predicate.mnemonic(),
            addr_mode: AddrMode::Direct,
            operand_count: 1,
            length_bytes: 1 + 2,
            semantics: Semantics::JumpIf(predicate),
        });
    }
    table.push(halt());
    table
}

/// Address-less stack machine: push carries a literal, every other operation
/// (including jump, which is PC-relative) takes no addressed operand.
fn stackless_zero() -> Vec<InstructionDesc> {
    let mut table = Vec::new();
    for (opcode, mnemonic, op) in ARITH_OPS {
        table.push(InstructionDesc {
            opcode,
            mnemonic,
            addr_mode: AddrMode::None,
            operand_count: 0,
            length_bytes: 1,
            semantics: Semantics::Arith(op),
        });
    }
    table.push(InstructionDesc {
        opcode: 0x06,
        mnemonic: "cmp",
        addr_mode: AddrMode::None,
        operand_count: 0,
        length_bytes: 1,
        semantics: Semantics::Cmp,
    });
    table.push(InstructionDesc {
        opcode: 0x20,
        mnemonic: "push",
        addr_mode: AddrMode::Immediate,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Push,
    });
    table.push(InstructionDesc {
        opcode: 0x21,
        mnemonic: "pop",
        addr_mode: AddrMode::None,
        operand_count: 0,
        length_bytes: 1,
        semantics: Semantics::Pop,
    });
    table.push(InstructionDesc {
        opcode: 0x22,
        mnemonic: "dup",
        addr_mode: AddrMode::None,
        operand_count: 0,
        length_bytes: 1,
        semantics: Semantics::Dup,
    });
    table.push(InstructionDesc {
        opcode: 0x23,
        mnemonic: "swap",
        addr_mode: AddrMode::None,
        operand_count: 0,
        length_bytes: 1,
        semantics: Semantics::Swap,
    });
    table.push(InstructionDesc {
        opcode: 0x07,
        mnemonic: "jump",
        addr_mode: AddrMode::Immediate,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Jump,
    });
    for (opcode, predicate) in JUMP_IF {
        table.push(InstructionDesc {
            opcode,
            mnemonic: predicate.mnemonic(),
            addr_mode: AddrMode::Immediate,
            operand_count: 1,
            length_bytes: 1 + 2,
            semantics: Semantics::JumpIf(predicate),
        });
    }
    table.push(halt());
    table
}

/// Register machine: every operand is a numbered general-purpose register.
fn register() -> Vec<InstructionDesc> {
    let mut table = Vec::new();
    for (opcode, mnemonic, op) in ARITH_OPS {
        table.push(InstructionDesc {
            opcode,
            mnemonic,
            addr_mode: AddrMode::Register,
            operand_count: 3,
            length_bytes: 1 + 3,
            semantics: Semantics::Arith(op),
        });
    }
    table.push(InstructionDesc {
        opcode: 0x05,
        mnemonic: "move",
        addr_mode: AddrMode::Register,
        operand_count: 2,
        length_bytes: 1 + 2,
        semantics: Semantics::Move,
    });
    table.push(InstructionDesc {
        opcode: 0x06,
        mnemonic: "cmp",
        addr_mode: AddrMode::Register,
        operand_count: 2,
        length_bytes: 1 + 2,
        semantics: Semantics::Cmp,
    });
    table.push(InstructionDesc {
        opcode: 0x07,
        mnemonic: "jump",
        addr_mode: AddrMode::Direct,
        operand_count: 1,
        length_bytes: 1 + 2,
        semantics: Semantics::Jump,
    });
    for (opcode, predicate) in JUMP_IF {
        table.push(InstructionDesc {
            opcode,
            mnemonic: predicate.mnemonic(),
            addr_mode: AddrMode::Direct,
            operand_count: 1,
            length_bytes: 1 + 2,
            semantics: Semantics::JumpIf(predicate),
        });
    }
    table.push(halt());
    table
}

/// Register-with-modification: adds indexed addressing. The memory operand of
/// `load`/`store`/arithmetic-with-memory is `Modified`: a modifier nibble
/// naming the index register (0 meaning "no register, displacement only")
/// followed by a 16-bit displacement.
fn register_modified() -> Vec<InstructionDesc> {
    let mut table = Vec::new();
    for (opcode, mnemonic, op) in ARITH_OPS {
        table.push(InstructionDesc {
            opcode,
            mnemonic,
            addr_mode: AddrMode::Register,
            operand_count: 2,
            length_bytes: 1 + 2,
            semantics: Semantics::Arith(op),
        });
    }
    table.push(InstructionDesc {
        opcode: 0x05,
        mnemonic: "load",
        addr_mode: AddrMode::RegisterAndModified,
        operand_count: 2,
        length_bytes: 1 + 1 + 1 + 2,
        semantics: Semantics::Move,
    });
    table.push(InstructionDesc {
        opcode: 0x08,
        mnemonic: "store",
        addr_mode: AddrMode::RegisterAndModified,
        operand_count: 2,
        length_bytes: 1 + 1 + 1 + 2,
        semantics: Semantics::Move,
    });
    table.push(InstructionDesc {
        opcode: 0x06,
        mnemonic: "cmp",
        addr_mode: AddrMode::Register,
        operand_count: 2,
        length_bytes: 1 + 2,
        semantics: Semantics::Cmp,
    });
    table.push(InstructionDesc {
        opcode: 0x07,
        mnemonic: "jump",
        addr_mode: AddrMode::Modified,
        operand_count: 1,
        length_bytes: 1 + 1 + 2,
        semantics: Semantics::Jump,
    });
    for (opcode, predicate) in JUMP_IF {
        table.push(InstructionDesc {
            opcode,
            mnemonic: predicate.mnemonic(),
            addr_mode: AddrMode::Modified,
            operand_count: 1,
            length_bytes: 1 + 1 + 2,
            semantics: Semantics::JumpIf(predicate),
        });
    }
    table.push(halt());
    table
}

/// Build the static opcode table for a machine.
pub fn table(id: MachineId) -> Vec<InstructionDesc> {
    match id {
        MachineId::ThreeAddress => three_address(),
        MachineId::TwoAddress => two_address(),
        MachineId::VariableLength => variable_length(),
        MachineId::OneAddress => one_address(),
        MachineId::Stack => stack(),
        MachineId::StacklessZero => stackless_zero(),
        MachineId::Register => register(),
        MachineId::RegisterModified => register_modified(),
    }
}

/// Look up a decoded opcode byte in a machine's table.
pub fn by_opcode(id: MachineId, opcode: u8) -> Option<InstructionDesc> {
    table(id).into_iter().find(|desc| desc.opcode == opcode)
}

/// Look up an instruction by mnemonic, used by the assembler/text-format parser.
pub fn by_mnemonic(id: MachineId, mnemonic: &str) -> Option<InstructionDesc> {
    table(id).into_iter().find(|desc| desc.mnemonic == mnemonic)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_machine_has_halt_at_the_shared_opcode() {
        for id in MachineId::ALL {
            let desc = by_opcode(id, HALT_OPCODE).expect("every machine defines halt");
            assert_eq!(desc.semantics, Semantics::Halt);
            assert_eq!(desc.length_bytes, 1);
        }
    }

    #[test]
    fn every_machine_has_all_ten_jump_predicates() {
        for id in MachineId::ALL {
            for (_, predicate) in JUMP_IF {
                let desc = table(id)
                    .into_iter()
                    .find(|d| d.semantics == Semantics::JumpIf(predicate));
                assert!(desc.is_some(), "{:?} missing predicate {:?}", id, predicate);
            }
        }
    }

    #[test]
    fn opcodes_are_unique_within_a_machine() {
        for id in MachineId::ALL {
            let t = table(id);
            for (i, a) in t.iter().enumerate() {
                for b in &t[i + 1..] {
                    assert_ne!(a.opcode, b.opcode, "duplicate opcode in {:?}", id);
                }
            }
        }
    }

    #[test]
    fn variable_length_machine_has_more_than_one_instruction_length() {
        let lengths: std::collections::HashSet<u32> =
            variable_length().into_iter().map(|d| d.length_bytes).collect();
        assert!(lengths.len() > 1);
    }
}
