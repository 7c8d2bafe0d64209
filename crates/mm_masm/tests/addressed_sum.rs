//! End-to-end check for the register-with-modification machine: assemble a
//! small indexed-addressing program from source, run it, and read the dump
//! back out through the loader.

use mm_core::StopReason;

const SOURCE: &str = "
.code
loop:
    load R3, array(R1)
    add R2, R3
    load R4, one(R0)
    add R1, R4
    load R5, limit(R0)
    cmp R1, R5
    sjl loop
    store R2, sum(R0)
    halt
one: .word 1
limit: .word 5
array: .word -1, 2, 3, 4, 5
sum: .word 0
.dump array(5), sum
";

#[test]
fn sums_an_array_through_indexed_addressing() {
    let program = mm_masm::assemble(SOURCE).unwrap();
    let outcome = mm_loader::load_and_run(&program, &[], Some(10_000)).unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Halted);
    assert_eq!(outcome.outputs, vec![-1, 2, 3, 4, 5, 13]);
}
