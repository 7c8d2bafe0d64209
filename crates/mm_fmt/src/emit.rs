use mm_isa::MachineConfig;

use crate::ir::{BindingKind, ParsedProgram};

/// Render a parsed program back into `.mmach` source text. Used by the
/// assembler front-end so a `.mmasm` file can be turned into something the
/// loader's ordinary text parser also accepts.
pub fn to_text(program: &ParsedProgram) -> String {
    let mut out = String::new();
    out.push_str(&format!(".cpu {}\n", program.machine_id.cpu_tag()));

    for binding in &program.bindings {
        let directive = match binding.kind {
            BindingKind::Input => ".input",
            BindingKind::Output => ".output",
        };
        match &binding.message {
            Some(message) => out.push_str(&format!("{directive} 0x{:x} {message}\n", binding.address)),
            None => out.push_str(&format!("{directive} 0x{:x}\n", binding.address)),
        }
    }

    if let Some(values) = &program.inline_enter {
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        out.push_str(&format!(".enter {}\n", rendered.join(" ")));
    }

    let word_bytes = (MachineConfig::for_machine(program.machine_id).word_bits as usize + 7) / 8;
    for span in &program.spans {
        out.push_str(&format!(".code 0x{:x}\n", span.address));
        for chunk in span.bytes.chunks(word_bytes.max(1)) {
            let line: String = chunk.iter().map(|b| format!("{b:02x}")).collect();
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::{Binding, Span};
    use mm_isa::MachineId;

    #[test]
    fn round_trips_through_the_text_parser() {
        let program = ParsedProgram {
            machine_id: MachineId::ThreeAddress,
            spans: vec![Span { address: 0, bytes: vec![0x00, 0x99, 0x00, 0x00] }],
            bindings: vec![Binding { kind: BindingKind::Output, address: 0x104, message: None }],
            inline_enter: None,
        };
        let text = to_text(&program);
        let reparsed = crate::parse::parse(&text).unwrap();
        assert_eq!(reparsed, program);
    }
}
