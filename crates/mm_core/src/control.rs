use log::trace;

use mm_isa::{AddrMode, InstructionDesc, MachineConfig, MachineId, Semantics};
use mm_mem::{RegisterFile, RegisterId, Ram};
use mm_word::{Flags, Word};

use crate::alu;
use crate::error::Error;

/// Why a run stopped. Unlike [`Error`], none of these are a guest fault: they
/// are the ordinary, expected ways a machine's execution ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Halted,
    /// The watchdog step budget was exhausted before the guest halted itself.
    /// Distinct from an `Error`: a runaway loop is not a fault in the emulator,
    /// it's the guest program failing to terminate.
    StepLimitExceeded(u64),
    /// A debugger-set breakpoint address was reached, just after its
    /// instruction's side effects took place.
    Breakpoint(u16),
}

/// Where an operand, once decoded, actually lives.
#[derive(Debug, Clone, Copy)]
enum OperandLoc {
    Direct(u16),
    Register(u8),
    /// A memory address already resolved by the `Modified`/`RegisterAndModified`
    /// addressing formula.
    ModifiedAddr(u16),
    Immediate(Word),
}

/// The shared fetch-decode-execute engine parameterised over one of the eight
/// model machines' [`MachineConfig`]/opcode table.
pub struct ControlUnit {
    config: MachineConfig,
    ram: Ram,
    regs: RegisterFile,
    flags: Flags,
    stack: Option<Vec<Word>>,
    steps: u64,
    step_limit: Option<u64>,
}

impl ControlUnit {
    pub fn new(config: MachineConfig) -> Self {
        let mut regs = RegisterFile::new();
        regs.declare(RegisterId::Pc, config.address_bits);
        regs.declare(RegisterId::Ir, 8);
        regs.declare(RegisterId::Addr, config.address_bits);
        regs.declare(RegisterId::R1, config.word_bits);
        regs.declare(RegisterId::R2, config.word_bits);
        regs.declare(RegisterId::S, config.word_bits);
        regs.declare(RegisterId::S1, config.word_bits);
        for i in 0..config.gp_register_count {
            regs.declare(RegisterId::Gp(i as u8), config.word_bits);
        }

        Self {
            ram: Ram::new(config.cell_bytes, config.address_bits, config.protected_memory),
            regs,
            flags: Flags::new(),
            stack: config.stack.map(|_| Vec::new()),
            steps: 0,
            step_limit: None,
            config,
        }
    }

    pub fn machine_id(&self) -> MachineId {
        self.config.id
    }

    pub fn config(&self) -> MachineConfig {
        self.config
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn pc(&self) -> u16 {
        self.regs.get(RegisterId::Pc).as_unsigned() as u16
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.regs
            .set(RegisterId::Pc, Word::from_unsigned(self.config.address_bits, pc as u64))
            .expect("pc is declared at address_bits width");
    }

    /// The stack machines' `stack` is a `Vec<Word>`, not RAM-backed cells, so
    /// there is no addressable SP register to expose; its depth is the SP
    /// stand-in a debugger or inspection tool should read instead.
    pub fn stack(&self) -> Option<&[Word]> {
        self.stack.as_deref()
    }

    pub fn set_step_limit(&mut self, limit: Option<u64>) {
        self.step_limit = limit;
    }

    pub fn steps_executed(&self) -> u64 {
        self.steps
    }

    /// Push a value onto the stack from outside the fetch-decode-execute
    /// loop, the way the loader binds input values on the address-less stack
    /// machine (which has no addressed store to write them through instead).
    pub fn push_stack(&mut self, value: Word) -> Result<(), Error> {
        self.stack_push(value)
    }

    fn stack_push(&mut self, value: Word) -> Result<(), Error> {
        let policy = self.config.stack.ok_or(Error::NoStack)?;
        let stack = self.stack.as_mut().expect("stack config implies stack storage");
        if policy.error_on_overflow && stack.len() as u32 >= policy.depth {
            return Err(Error::StackOverflow);
        }
        stack.push(value);
        Ok(())
    }

    fn stack_pop(&mut self) -> Result<Word, Error> {
        self.config.stack.ok_or(Error::NoStack)?;
        let stack = self.stack.as_mut().expect("stack config implies stack storage");
        stack.pop().ok_or(Error::StackUnderflow)
    }

    fn read_loc(&self, loc: OperandLoc) -> Result<Word, Error> {
        match loc {
            OperandLoc::Direct(addr) => Ok(self.ram.fetch(addr, self.config.word_bits)?),
            OperandLoc::ModifiedAddr(addr) => Ok(self.ram.fetch(addr, self.config.word_bits)?),
            OperandLoc::Register(idx) => Ok(self.regs.fetch_gp(idx as u32)?),
            OperandLoc::Immediate(word) => Ok(word),
        }
    }

    fn write_loc(&mut self, loc: OperandLoc, value: Word) -> Result<(), Error> {
        match loc {
            OperandLoc::Direct(addr) => Ok(self.ram.store(addr, value)?),
            OperandLoc::ModifiedAddr(addr) => Ok(self.ram.store(addr, value)?),
            OperandLoc::Register(idx) => Ok(self.regs.store_gp(idx as u32, value)?),
            OperandLoc::Immediate(_) => unreachable!("decode never produces a writable immediate"),
        }
    }

    /// Resolve `(R_M + displacement) mod 2^address_bits`; modifier `0` means
    /// "no register", contributing zero regardless of what `Gp(0)` holds.
    fn modified_address(&self, modifier: u8, displacement: u16) -> u16 {
        let base = if modifier == 0 {
            0
        } else {
            self.regs.fetch_gp((modifier & 0x0f) as u32).map(|w| w.as_unsigned() as u16).unwrap_or(0)
        };
        base.wrapping_add(displacement)
    }

    fn decode_operands(&self, desc: &InstructionDesc, bytes: &[u8]) -> Vec<OperandLoc> {
        match desc.addr_mode {
            AddrMode::None => Vec::new(),
            AddrMode::Direct => bytes
                .chunks_exact(2)
                .take(desc.operand_count as usize)
                .map(|c| OperandLoc::Direct(u16::from_be_bytes([c[0], c[1]])))
                .collect(),
            AddrMode::Register => bytes
                .iter()
                .take(desc.operand_count as usize)
                .map(|&b| OperandLoc::Register(b))
                .collect(),
            AddrMode::Modified => {
                let addr = self.modified_address(bytes[0], u16::from_be_bytes([bytes[1], bytes[2]]));
                vec![OperandLoc::ModifiedAddr(addr)]
            }
            AddrMode::RegisterAndModified => {
                let reg = OperandLoc::Register(bytes[0]);
                let addr = self.modified_address(bytes[1], u16::from_be_bytes([bytes[2], bytes[3]]));
                vec![reg, OperandLoc::ModifiedAddr(addr)]
            }
            AddrMode::Immediate => {
                let n = (self.config.word_bits as usize + 7) / 8;
                vec![OperandLoc::Immediate(Word::from_bytes_be(self.config.word_bits, &bytes[..n]))]
            }
        }
    }

    /// Run exactly one instruction. Returns `Ok(Some(reason))` when the step
    /// ends execution (halt or watchdog trip), `Ok(None)` to keep going.
    pub fn step(&mut self) -> Result<Option<StopReason>, Error> {
        let start = self.pc();
        let opcode = self.ram.fetch_byte(start as u32);
        let desc = mm_isa::by_opcode(self.config.id, opcode).ok_or(Error::IllegalOpcode { opcode })?;

        let mut operand_bytes = Vec::with_capacity(desc.length_bytes as usize - 1);
        for i in 1..desc.length_bytes {
            operand_bytes.push(self.ram.fetch_byte(start as u32 + i));
        }

        // PC is advanced before the instruction executes, so a jump opcode
        // overwrites this value rather than being overwritten by it.
        let fall_through = start.wrapping_add(desc.length_bytes as u16);
        self.set_pc(fall_through);
        self.steps += 1;

        trace!("{:#06x}: {} ({:?})", start, desc.mnemonic, desc.semantics);

        let locs = self.decode_operands(&desc, &operand_bytes);
        self.execute(&desc, locs, fall_through)?;

        if self.flags.halt {
            return Ok(Some(StopReason::Halted));
        }
        if let Some(limit) = self.step_limit {
            if self.steps >= limit {
                return Ok(Some(StopReason::StepLimitExceeded(limit)));
            }
        }
        Ok(None)
    }

    fn execute(
        &mut self,
        desc: &InstructionDesc,
        locs: Vec<OperandLoc>,
        fall_through: u16,
    ) -> Result<(), Error> {
        match desc.semantics {
            Semantics::Arith(op) => self.exec_arith(op, desc, locs),
            Semantics::Move => self.exec_move(desc, locs),
            Semantics::Push => self.exec_push(desc, locs),
            Semantics::Pop => self.exec_pop(desc, locs),
            Semantics::Dup => self.exec_dup(),
            Semantics::Swap => self.exec_swap(),
            Semantics::Cmp => self.exec_cmp(desc, locs),
            Semantics::Jump => {
                self.set_pc(self.jump_target(desc, &locs, fall_through));
                Ok(())
            }
            Semantics::JumpIf(predicate) => {
                if predicate.holds(self.flags) {
                    self.set_pc(self.jump_target(desc, &locs, fall_through));
                }
                Ok(())
            }
            Semantics::Halt => {
                self.flags.halt = true;
                Ok(())
            }
        }
    }

    fn jump_target(&self, desc: &InstructionDesc, locs: &[OperandLoc], fall_through: u16) -> u16 {
        match (desc.addr_mode, locs[0]) {
            (AddrMode::Immediate, OperandLoc::Immediate(word)) => {
                fall_through.wrapping_add(word.as_signed() as i16 as u16)
            }
            (_, OperandLoc::Direct(addr)) => addr,
            (_, OperandLoc::ModifiedAddr(addr)) => addr,
            _ => unreachable!("jump operand is always an address or a relative displacement"),
        }
    }

    fn exec_arith(&mut self, op: mm_isa::ArithOp, desc: &InstructionDesc, locs: Vec<OperandLoc>) -> Result<(), Error> {
        if self.stack.is_some() && desc.addr_mode == AddrMode::None {
            let rhs = self.stack_pop()?;
            let lhs = self.stack_pop()?;
            let (result, flags) = alu::eval(op, lhs, rhs)?;
            self.flags = flags;
            self.stack_push(result)?;
            return Ok(());
        }

        match locs.len() {
            3 => {
                let lhs = self.read_loc(locs[1])?;
                let rhs = self.read_loc(locs[2])?;
                let (result, flags) = alu::eval(op, lhs, rhs)?;
                self.flags = flags;
                self.write_loc(locs[0], result)
            }
            2 => {
                let lhs = self.read_loc(locs[0])?;
                let rhs = self.read_loc(locs[1])?;
                let (result, flags) = alu::eval(op, lhs, rhs)?;
                self.flags = flags;
                self.write_loc(locs[0], result)
            }
            1 => {
                let lhs = self.regs.get(RegisterId::S);
                let rhs = self.read_loc(locs[0])?;
                let (result, flags) = alu::eval(op, lhs, rhs)?;
                self.flags = flags;
                self.regs.set(RegisterId::S, result)?;
                Ok(())
            }
            n => unreachable!("arithmetic with {n} operands isn't defined by any machine"),
        }
    }

    fn exec_move(&mut self, desc: &InstructionDesc, locs: Vec<OperandLoc>) -> Result<(), Error> {
        match desc.addr_mode {
            AddrMode::RegisterAndModified => {
                let (reg, mem) = (locs[0], locs[1]);
                if desc.mnemonic == "store" {
                    let value = self.read_loc(reg)?;
                    self.write_loc(mem, value)
                } else {
                    let value = self.read_loc(mem)?;
                    self.write_loc(reg, value)
                }
            }
            AddrMode::Direct if desc.operand_count == 1 => {
                if desc.mnemonic == "store" {
                    let value = self.regs.get(RegisterId::S);
                    self.write_loc(locs[0], value)
                } else {
                    let value = self.read_loc(locs[0])?;
                    self.regs.set(RegisterId::S, value)?;
                    Ok(())
                }
            }
            _ => {
                let value = self.read_loc(locs[1])?;
                self.write_loc(locs[0], value)
            }
        }
    }

    fn exec_push(&mut self, desc: &InstructionDesc, locs: Vec<OperandLoc>) -> Result<(), Error> {
        let _ = desc;
        let value = self.read_loc(locs[0])?;
        self.stack_push(value)
    }

    fn exec_pop(&mut self, desc: &InstructionDesc, locs: Vec<OperandLoc>) -> Result<(), Error> {
        let value = self.stack_pop()?;
        if desc.addr_mode == AddrMode::None {
            return Ok(());
        }
        self.write_loc(locs[0], value)
    }

    fn exec_dup(&mut self) -> Result<(), Error> {
        let top = *self.stack.as_ref().and_then(|s| s.last()).ok_or(Error::StackUnderflow)?;
        self.stack_push(top)
    }

    fn exec_swap(&mut self) -> Result<(), Error> {
        let stack = self.stack.as_mut().ok_or(Error::NoStack)?;
        let len = stack.len();
        if len < 2 {
            return Err(Error::StackUnderflow);
        }
        stack.swap(len - 1, len - 2);
        Ok(())
    }

    fn exec_cmp(&mut self, desc: &InstructionDesc, locs: Vec<OperandLoc>) -> Result<(), Error> {
        if self.stack.is_some() && desc.addr_mode == AddrMode::None {
            let rhs = self.stack_pop()?;
            let lhs = self.stack_pop()?;
            self.flags = alu::compare(lhs, rhs);
            return Ok(());
        }
        let _ = desc;
        let lhs = self.read_loc(locs[0])?;
        let rhs = self.read_loc(locs[1])?;
        self.flags = alu::compare(lhs, rhs);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use mm_isa::MachineConfig;

    /// `move a2, a0 ; move a3, a1 ; add a4, a2, a3 ; halt`, a three-address
    /// program computing `a4 = a0 + a1` laid out at address 0.
    #[test]
    fn three_address_add_and_halt() {
        let config = MachineConfig::for_machine(MachineId::ThreeAddress);
        let mut cpu = ControlUnit::new(config);

        const A0: u16 = 0x100;
        const A1: u16 = 0x108;
        const A4: u16 = 0x110;
        cpu.ram_mut().store(A0, Word::from_signed(32, 12)).unwrap();
        cpu.ram_mut().store(A1, Word::from_signed(32, 30)).unwrap();

        let mut image = Vec::new();
        image.push(0x00); // add
        image.extend(A4.to_be_bytes());
        image.extend(A0.to_be_bytes());
        image.extend(A1.to_be_bytes());
        image.push(0x99); // halt
        cpu.ram_mut().load_span(0, &image);

        let reason = loop {
            if let Some(reason) = cpu.step().unwrap() {
                break reason;
            }
        };
        assert_eq!(reason, StopReason::Halted);
        assert_eq!(cpu.ram().fetch(A4, 32).unwrap(), Word::from_signed(32, 42));
        assert!(cpu.flags().halt);
    }

    /// Address-less stack machine: `push 3 ; push 4 ; add ; halt` leaves `7`
    /// on top of the stack.
    #[test]
    fn stackless_zero_push_add_halt() {
        let config = MachineConfig::for_machine(MachineId::StacklessZero);
        let mut cpu = ControlUnit::new(config);

        let mut image = Vec::new();
        image.push(0x20); // push
        image.extend(Word::from_signed(16, 3).to_bytes_be());
        image.push(0x20); // push
        image.extend(Word::from_signed(16, 4).to_bytes_be());
        image.push(0x00); // add
        image.push(0x99); // halt
        cpu.ram_mut().load_span(0, &image);

        loop {
            if cpu.step().unwrap().is_some() {
                break;
            }
        }
        assert_eq!(cpu.stack().unwrap(), &[Word::from_signed(16, 7)]);
    }

    /// Variable-length machine: `add R2, R0, R1` (register-addressed, 4 bytes)
    /// ; `cmp R2, R1` (3 bytes) ; `sjg move` (direct-addressed, 3 bytes) ;
    /// `halt` (wrong path) ; `move dst, src` (direct-addressed, 5 bytes) ;
    /// `halt` (right path). Exercises all three of this machine's distinct
    /// operand encodings in one program.
    #[test]
    fn variable_length_register_arith_cmp_and_move() {
        let config = MachineConfig::for_machine(MachineId::VariableLength);
        let mut cpu = ControlUnit::new(config);

        cpu.registers_mut().set(RegisterId::Gp(0), Word::from_signed(24, 7)).unwrap();
        cpu.registers_mut().set(RegisterId::Gp(1), Word::from_signed(24, 35)).unwrap();

        const SRC: u16 = 0x10;
        const DST: u16 = 0x11;
        cpu.ram_mut().store(SRC, Word::from_signed(24, 99)).unwrap();

        let mut image = Vec::new();
        image.extend([0x00, 0x02, 0x00, 0x01]); // add R2, R0, R1
        image.extend([0x06, 0x02, 0x01]); // cmp R2, R1
        image.extend([0x15, 0x00, 0x0b]); // sjg 0x0b (the `move` below)
        image.push(0x99); // halt: only reached if sjg failed to jump
        image.extend([0x05, 0x00, 0x11, 0x00, 0x10]); // move DST, SRC
        image.push(0x99); // halt: the intended ending
        assert_eq!(image.len(), 17);
        cpu.ram_mut().load_span(0, &image);

        let reason = loop {
            if let Some(reason) = cpu.step().unwrap() {
                break reason;
            }
        };
        assert_eq!(reason, StopReason::Halted);
        assert_eq!(cpu.registers().get(RegisterId::Gp(2)), Word::from_signed(24, 42));
        assert_eq!(cpu.ram().fetch(DST, 24).unwrap(), Word::from_signed(24, 99));
        assert_eq!(cpu.pc(), 17);
    }

    #[test]
    fn step_limit_trips_before_an_infinite_loop_halts() {
        let config = MachineConfig::for_machine(MachineId::ThreeAddress);
        let mut cpu = ControlUnit::new(config);
        cpu.set_step_limit(Some(5));

        // jump 0: an eternal self-loop.
        let mut image = Vec::new();
        image.push(0x07);
        image.extend(0u16.to_be_bytes());
        cpu.ram_mut().load_span(0, &image);

        let reason = loop {
            if let Some(reason) = cpu.step().unwrap() {
                break reason;
            }
        };
        assert_eq!(reason, StopReason::StepLimitExceeded(5));
    }

    #[test]
    fn illegal_opcode_is_reported() {
        let config = MachineConfig::for_machine(MachineId::ThreeAddress);
        let mut cpu = ControlUnit::new(config);
        cpu.ram_mut().load_span(0, &[0xfe]);
        assert!(matches!(cpu.step(), Err(Error::IllegalOpcode { opcode: 0xfe })));
    }
}
