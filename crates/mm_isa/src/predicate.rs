use mm_word::Flags;

/// The ten condition-jump predicates shared by every machine's opcode table.
///
/// Every conditional-jump opcode, regardless of which machine it belongs to,
/// shares this single predicate nibble -> flag expression mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Eq,
    Neq,
    SignedLess,
    SignedGreaterEq,
    SignedLessEq,
    SignedGreater,
    UnsignedLess,
    UnsignedGreaterEq,
    UnsignedLessEq,
    UnsignedGreater,
}

impl Predicate {
    pub fn holds(self, flags: Flags) -> bool {
        match self {
            Predicate::Eq => flags.jeq(),
            Predicate::Neq => flags.jneq(),
            Predicate::SignedLess => flags.sjl(),
            Predicate::SignedGreaterEq => flags.sjge(),
            Predicate::SignedLessEq => flags.sjle(),
            Predicate::SignedGreater => flags.sjg(),
            Predicate::UnsignedLess => flags.ujl(),
            Predicate::UnsignedGreaterEq => flags.ujge(),
            Predicate::UnsignedLessEq => flags.ujle(),
            Predicate::UnsignedGreater => flags.ujg(),
        }
    }

    pub fn from_nibble(n: u8) -> Option<Self> {
        Some(match n {
            0x0 => Predicate::Eq,
            0x1 => Predicate::Neq,
            0x2 => Predicate::SignedLess,
            0x3 => Predicate::SignedGreaterEq,
            0x4 => Predicate::SignedLessEq,
            0x5 => Predicate::SignedGreater,
            0x6 => Predicate::UnsignedLess,
            0x7 => Predicate::UnsignedGreaterEq,
            0x8 => Predicate::UnsignedLessEq,
            0x9 => Predicate::UnsignedGreater,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Predicate::Eq => "jeq",
            Predicate::Neq => "jneq",
            Predicate::SignedLess => "sjl",
            Predicate::SignedGreaterEq => "sjge",
            Predicate::SignedLessEq => "sjle",
            Predicate::SignedGreater => "sjg",
            Predicate::UnsignedLess => "ujl",
            Predicate::UnsignedGreaterEq => "ujge",
            Predicate::UnsignedLessEq => "ujle",
            Predicate::UnsignedGreater => "ujg",
        }
    }
}
