use mm_fmt::{Binding, BindingKind, ParsedProgram, Span};
use mm_isa::MachineId;
use mm_word::Word;

use crate::run::load_and_run;
use mm_core::StopReason;

fn word32(value: i64) -> Vec<u8> {
    Word::from_signed(32, value).to_bytes_be()
}

fn word16(value: i64) -> Vec<u8> {
    Word::from_signed(16, value).to_bytes_be()
}

/// `res = 1; while (n != 0) { res *= n; n -= 1 }`, the quickstart sample's
/// factorial-by-decrement program on the three-address machine.
fn factorial_program() -> ParsedProgram {
    const N: u16 = 0x100;
    const RES: u16 = 0x102;
    const ONE: u16 = 0x104;
    const ZERO: u16 = 0x106;

    let mut code = Vec::new();
    code.extend([0x06, 0x01, 0x00, 0x01, 0x06]); // cmp N, ZERO
    code.extend([0x10, 0x00, 0x19]); // jeq end (25)
    code.extend([0x02, 0x01, 0x02, 0x01, 0x02, 0x01, 0x00]); // mul RES, RES, N
    code.extend([0x01, 0x01, 0x00, 0x01, 0x00, 0x01, 0x04]); // sub N, N, ONE
    code.extend([0x07, 0x00, 0x00]); // jump loop (0)
    code.push(0x99); // end: halt
    assert_eq!(code.len(), 26);

    ParsedProgram {
        machine_id: MachineId::ThreeAddress,
        spans: vec![
            Span { address: 0, bytes: code },
            Span { address: RES * 2, bytes: word32(1) },
            Span { address: ONE * 2, bytes: word32(1) },
            Span { address: ZERO * 2, bytes: word32(0) },
        ],
        bindings: vec![
            Binding { kind: BindingKind::Input, address: N, message: None },
            Binding { kind: BindingKind::Output, address: RES, message: None },
        ],
        inline_enter: None,
    }
}

#[test]
fn factorial_by_decrement_computes_720() {
    let program = factorial_program();
    let outcome = load_and_run(&program, &[6], Some(10_000)).unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Halted);
    assert_eq!(outcome.outputs, vec![720]);
}

#[test]
fn division_by_zero_halts_with_no_output() {
    const N: u16 = 0x100;
    const ZERO: u16 = 0x102;
    const RES: u16 = 0x104;

    let mut code = Vec::new();
    code.extend([0x03, 0x01, 0x04, 0x01, 0x00, 0x01, 0x02]); // div RES, N, ZERO
    code.push(0x99);

    let program = ParsedProgram {
        machine_id: MachineId::ThreeAddress,
        spans: vec![
            Span { address: 0, bytes: code },
            Span { address: ZERO * 2, bytes: word32(0) },
        ],
        bindings: vec![
            Binding { kind: BindingKind::Input, address: N, message: None },
            Binding { kind: BindingKind::Output, address: RES, message: None },
        ],
        inline_enter: None,
    };

    let result = load_and_run(&program, &[10], Some(100));
    assert!(result.is_err());
}

/// `x = ((a * -21) mod 50 - b)^2` on the three-address machine, the
/// quickstart sample's small polynomial evaluator.
#[test]
fn three_address_polynomial_evaluates_to_178929() {
    const A: u16 = 0x100;
    const B: u16 = 0x106;
    const NEG21: u16 = 0x108;
    const FIFTY: u16 = 0x10a;
    const TMP1: u16 = 0x10c;
    const TMP2: u16 = 0x10e;
    const TMP3: u16 = 0x110;
    const OUT: u16 = 0x103;

    fn addr(a: u16) -> [u8; 2] {
        a.to_be_bytes()
    }

    let mut code = Vec::new();
    code.push(0x02); // mul TMP1, A, NEG21
    code.extend(addr(TMP1));
    code.extend(addr(A));
    code.extend(addr(NEG21));
    code.push(0x04); // mod TMP2, TMP1, FIFTY
    code.extend(addr(TMP2));
    code.extend(addr(TMP1));
    code.extend(addr(FIFTY));
    code.push(0x01); // sub TMP3, TMP2, B
    code.extend(addr(TMP3));
    code.extend(addr(TMP2));
    code.extend(addr(B));
    code.push(0x02); // mul OUT, TMP3, TMP3
    code.extend(addr(OUT));
    code.extend(addr(TMP3));
    code.extend(addr(TMP3));
    code.push(0x99); // halt
    assert_eq!(code.len(), 29);

    let program = ParsedProgram {
        machine_id: MachineId::ThreeAddress,
        spans: vec![
            Span { address: 0, bytes: code },
            Span { address: NEG21 * 2, bytes: word32(-21) },
            Span { address: FIFTY * 2, bytes: word32(50) },
        ],
        bindings: vec![
            Binding { kind: BindingKind::Input, address: A, message: None },
            Binding { kind: BindingKind::Input, address: B, message: None },
            Binding { kind: BindingKind::Output, address: OUT, message: None },
        ],
        inline_enter: None,
    };

    let outcome = load_and_run(&program, &[-123, 456], Some(10_000)).unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Halted);
    assert_eq!(outcome.outputs, vec![178_929]);
}

/// The same polynomial, `x = ((a * -21) mod 50 - b)^2`, on the address-less
/// stack machine: every operand has to be shuffled into place with `swap`
/// and `dup` instead of named by address.
#[test]
fn stackless_zero_polynomial_evaluates_to_1849() {
    let mut code = Vec::new();
    code.push(0x23); // swap: [a, b] -> [b, a]
    code.push(0x20); // push -21: [b, a, -21]
    code.extend(word16(-21));
    code.push(0x02); // mul: [b, a*-21]
    code.push(0x20); // push 50
    code.extend(word16(50));
    code.push(0x04); // mod: [b, (a*-21) mod 50]
    code.push(0x23); // swap: [(a*-21) mod 50, b]
    code.push(0x01); // sub: [((a*-21) mod 50) - b]
    code.push(0x22); // dup
    code.push(0x02); // mul: [x^2]
    code.push(0x99); // halt

    let program = ParsedProgram {
        machine_id: MachineId::StacklessZero,
        spans: vec![Span { address: 0, bytes: code }],
        bindings: vec![
            Binding { kind: BindingKind::Input, address: 0, message: None },
            Binding { kind: BindingKind::Input, address: 0, message: None },
            Binding { kind: BindingKind::Output, address: 0, message: None },
        ],
        inline_enter: None,
    };

    let outcome = load_and_run(&program, &[-12, 45], Some(10_000)).unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Halted);
    assert_eq!(outcome.outputs, vec![1849]);
}

#[test]
fn reading_an_uninitialised_cell_under_protected_memory_is_an_error() {
    const UNSET: u16 = 0x100;
    const OTHER: u16 = 0x102;

    let mut code = Vec::new();
    code.extend([0x06, 0x01, 0x00, 0x01, 0x02]); // cmp UNSET, OTHER
    code.push(0x99);

    let program = ParsedProgram {
        machine_id: MachineId::ThreeAddress,
        spans: vec![
            Span { address: 0, bytes: code },
            Span { address: OTHER * 2, bytes: word32(0) },
        ],
        bindings: vec![],
        inline_enter: None,
    };

    let result = load_and_run(&program, &[], Some(100));
    assert!(result.is_err());
}
