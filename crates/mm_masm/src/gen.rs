use std::collections::HashMap;

use mm_fmt::{Binding, BindingKind, ParsedProgram, Span};
use mm_isa::MachineId;

use crate::ir::{Item, Operand};
use crate::Error;

const MACHINE: MachineId = MachineId::RegisterModified;

struct Layout {
    /// Address of each item's first byte (only meaningful for `Statement`/`Word`).
    addresses: Vec<u16>,
    labels: HashMap<String, u16>,
}

/// First pass: assign every label and every statement/word an address, sized
/// by the mnemonic's encoded length or the word width, without emitting bytes.
///
/// Code addresses are raw byte offsets, matching the instruction stream the
/// control unit fetches from. Data words live in a cell-addressed memory
/// (one cell is one word on this machine), so a `.word` item is padded up to
/// the next word boundary before it's laid out, keeping every data label's
/// byte offset an exact multiple of `word_bytes`.
fn layout(items: &[Item], word_bytes: u32) -> Result<Layout, Error> {
    let mut address: u16 = 0;
    let mut addresses = Vec::with_capacity(items.len());
    let mut labels = HashMap::new();

    for item in items {
        if matches!(item, Item::Word(_)) {
            let rem = address % word_bytes as u16;
            if rem != 0 {
                address = address.wrapping_add(word_bytes as u16 - rem);
            }
        }
        addresses.push(address);
        match item {
            Item::Config { address: a, .. } => address = *a,
            Item::Code { .. } => address = 0,
            Item::Statement(s) => {
                if let Some(label) = &s.label {
                    if labels.insert(label.clone(), address).is_some() {
                        return Err(Error::new(s.line, format!("duplicate label {label:?}")));
                    }
                }
                if !s.mnemonic.is_empty() {
                    let desc = mm_isa::by_mnemonic(MACHINE, &s.mnemonic)
                        .ok_or_else(|| Error::new(s.line, format!("unknown mnemonic {:?}", s.mnemonic)))?;
                    address = address.wrapping_add(desc.length_bytes as u16);
                }
            }
            Item::Word(w) => {
                if let Some(label) = &w.label {
                    if labels.insert(label.clone(), address).is_some() {
                        return Err(Error::new(w.line, format!("duplicate label {label:?}")));
                    }
                }
                address = address.wrapping_add(w.values.len() as u16 * word_bytes as u16);
            }
            Item::Dump(_) => {}
        }
    }

    Ok(Layout { addresses, labels })
}

fn resolve_label(labels: &HashMap<String, u16>, label: &str, line: usize) -> Result<u16, Error> {
    labels.get(label).copied().ok_or_else(|| Error::new(line, format!("unknown label {label:?}")))
}

fn encode_statement(
    item_address: u16,
    s: &crate::ir::Statement,
    labels: &HashMap<String, u16>,
    word_bytes: u32,
) -> Result<Vec<u8>, Error> {
    if s.mnemonic.is_empty() {
        return Ok(Vec::new());
    }
    let desc = mm_isa::by_mnemonic(MACHINE, &s.mnemonic)
        .ok_or_else(|| Error::new(s.line, format!("unknown mnemonic {:?}", s.mnemonic)))?;

    let mut bytes = vec![desc.opcode];
    for operand in &s.operands {
        match (desc.addr_mode, operand) {
            (mm_isa::AddrMode::Register, Operand::Register(reg)) => bytes.push(*reg),
            (mm_isa::AddrMode::RegisterAndModified, Operand::Register(reg)) => bytes.push(*reg),
            // A bare label on a modified-addressing operand means "modifier 0",
            // i.e. the displacement alone is the effective address. Jump
            // targets land straight in the program counter, a byte offset;
            // load/store targets go through the cell-addressed RAM, so the
            // label's byte offset is rescaled to a cell index (`layout` keeps
            // every `.word` label on a word boundary so this division is exact).
            (mm_isa::AddrMode::Modified, Operand::Label(label)) => {
                let disp = resolve_label(labels, label, s.line)?;
                bytes.push(0);
                bytes.extend(disp.to_be_bytes());
            }
            (mm_isa::AddrMode::RegisterAndModified, Operand::Label(label)) => {
                let disp = resolve_label(labels, label, s.line)? / word_bytes as u16;
                bytes.push(0);
                bytes.extend(disp.to_be_bytes());
            }
            (mm_isa::AddrMode::Modified, Operand::Indexed { label, reg }) => {
                let disp = resolve_label(labels, label, s.line)?;
                bytes.push(*reg);
                bytes.extend(disp.to_be_bytes());
            }
            (mm_isa::AddrMode::RegisterAndModified, Operand::Indexed { label, reg }) => {
                let disp = resolve_label(labels, label, s.line)? / word_bytes as u16;
                bytes.push(*reg);
                bytes.extend(disp.to_be_bytes());
            }
            (mode, operand) => {
                return Err(Error::new(
                    s.line,
                    format!("operand {operand:?} doesn't fit {mode:?} addressing"),
                ))
            }
        }
    }

    if bytes.len() != desc.length_bytes as usize {
        return Err(Error::new(
            s.line,
            format!(
                "{} expects an encoded length of {} bytes, operands gave {} at {:#06x}",
                s.mnemonic,
                desc.length_bytes,
                bytes.len(),
                item_address
            ),
        ));
    }
    Ok(bytes)
}

fn encode_word(value: i64, word_bits: u32) -> Vec<u8> {
    mm_word::Word::from_signed(word_bits, value).to_bytes_be()
}

/// Second pass: emit bytes for every statement/word, resolving labels against
/// the layout from the first pass, and build the `.dump` output bindings.
pub fn assemble(items: Vec<Item>, word_bits: u32) -> Result<ParsedProgram, Error> {
    let word_bytes = (word_bits + 7) / 8;
    let layout = layout(&items, word_bytes)?;

    let mut spans: Vec<Span> = Vec::new();
    let mut current: Option<Span> = None;
    let mut bindings = Vec::new();

    let flush = |current: &mut Option<Span>, spans: &mut Vec<Span>| {
        if let Some(span) = current.take() {
            if !span.bytes.is_empty() {
                spans.push(span);
            }
        }
    };

    for (item, &address) in items.iter().zip(layout.addresses.iter()) {
        // The word-alignment padding `layout` inserts before a `.word` item
        // can leave a gap the current span doesn't cover; start a fresh span
        // rather than writing these bytes at the wrong offset.
        if let Some(span) = &current {
            let end = span.address.wrapping_add(span.bytes.len() as u16);
            if end != address {
                flush(&mut current, &mut spans);
            }
        }
        match item {
            Item::Config { .. } | Item::Code { .. } => {
                flush(&mut current, &mut spans);
                current = Some(Span { address, bytes: Vec::new() });
            }
            Item::Statement(s) => {
                if current.is_none() {
                    current = Some(Span { address, bytes: Vec::new() });
                }
                let bytes = encode_statement(address, s, &layout.labels, word_bytes)?;
                current.as_mut().unwrap().bytes.extend(bytes);
            }
            Item::Word(w) => {
                if current.is_none() {
                    current = Some(Span { address, bytes: Vec::new() });
                }
                for value in &w.values {
                    current.as_mut().unwrap().bytes.extend(encode_word(*value, word_bits));
                }
            }
            Item::Dump(d) => {
                for (label, size) in &d.targets {
                    // `.dump` addresses feed the loader's output bindings, which
                    // read through the same cell-addressed RAM as load/store, so
                    // they're rescaled to cell indices exactly like a load/store
                    // operand's displacement.
                    let base_cell = resolve_label(&layout.labels, label, d.line)? / word_bytes as u16;
                    for i in 0..*size {
                        let addr = base_cell.wrapping_add(i as u16);
                        bindings.push(Binding { kind: BindingKind::Output, address: addr, message: None });
                    }
                }
            }
        }
    }
    flush(&mut current, &mut spans);

    Ok(ParsedProgram { machine_id: MACHINE, spans, bindings, inline_enter: None })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::parse as parse_source;

    #[test]
    fn resolves_a_forward_label_reference() {
        let items = parse_source(".code\njump target\ntarget: halt\n").unwrap();
        let program = assemble(items, 56).unwrap();
        assert_eq!(program.spans.len(), 1);
        // jump (opcode 0x07) + modifier byte 0 + displacement to `target` (at byte 4).
        assert_eq!(&program.spans[0].bytes[0..4], &[0x07, 0x00, 0x00, 0x04]);
        assert_eq!(program.spans[0].bytes[4], 0x99);
    }

    #[test]
    fn dump_directive_expands_to_output_bindings() {
        let items = parse_source(".code\narray: .word -1, 2, 3, 4, 5\nsum: .word 0\n.dump array(5), sum\n").unwrap();
        let program = assemble(items, 56).unwrap();
        assert_eq!(program.bindings.len(), 6);
        // `.dump` addresses are cell indices (one cell per word here), so
        // consecutive array elements are 1 apart, not `word_bytes` apart.
        assert_eq!(program.bindings[5].address, program.bindings[0].address + 5);
    }

    #[test]
    fn unknown_label_is_reported() {
        let items = parse_source(".code\njump nowhere\n").unwrap();
        assert!(assemble(items, 56).is_err());
    }
}
