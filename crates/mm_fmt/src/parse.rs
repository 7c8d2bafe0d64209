use log::{debug, trace};

use mm_isa::{MachineConfig, MachineId};

use crate::error::FormatError;
use crate::ir::{Binding, BindingKind, ParsedProgram, Span};

/// Parse a `.mmach` source file into the image and binding table the loader
/// consumes. The grammar is intentionally simple: one directive or data line
/// at a time, `;` starts a line comment, blank lines are ignored.
pub fn parse(source: &str) -> Result<ParsedProgram, FormatError> {
    let mut machine_id = None;
    let mut bindings = Vec::new();
    let mut inline_enter: Option<Vec<i64>> = None;
    let mut spans: Vec<Span> = Vec::new();

    let mut code_addr: Option<u16> = None;
    let mut code_bytes: Vec<u8> = Vec::new();
    let mut code_start_line = 0;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix(".cpu") {
            let id = rest.trim();
            let id = MachineId::from_cpu_tag(id).ok_or_else(|| {
                trace!("unknown cpu tag {id:?} at line {line_no}");
                FormatError::UnknownCpu { line: line_no, id: id.to_string() }
            })?;
            trace!("parsing for {id:?}");
            machine_id = Some(id);
            continue;
        }

        if machine_id.is_none() {
            return Err(FormatError::MissingCpu);
        }

        if let Some(rest) = line.strip_prefix(".input") {
            bindings.extend(parse_binding(rest, BindingKind::Input, line_no)?);
            continue;
        }

        if let Some(rest) = line.strip_prefix(".output") {
            bindings.extend(parse_binding(rest, BindingKind::Output, line_no)?);
            continue;
        }

        if let Some(rest) = line.strip_prefix(".enter") {
            let mut values = Vec::new();
            for token in rest.split_whitespace() {
                values.push(parse_number(token, line_no)?);
            }
            inline_enter = Some(values);
            continue;
        }

        if let Some(rest) = line.strip_prefix(".code") {
            flush_code(&mut spans, code_addr, &mut code_bytes, machine_id, code_start_line)?;
            let rest = rest.trim();
            let addr = if rest.is_empty() {
                0
            } else {
                parse_number(rest, line_no)? as u16
            };
            code_addr = Some(addr);
            code_start_line = line_no;
            continue;
        }

        if line.starts_with('.') {
            return Err(FormatError::Syntax { line: line_no, message: format!("unknown directive {line:?}") });
        }

        // Otherwise: a line of hex digits belonging to the current `.code` section.
        if code_addr.is_none() {
            return Err(FormatError::Syntax {
                line: line_no,
                message: "hex data outside a `.code` section".to_string(),
            });
        }
        let digits: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() % 2 != 0 {
            trace!("odd hex digit count on line {line_no}");
            return Err(FormatError::Syntax {
                line: line_no,
                message: "hex data must contain a whole number of bytes".to_string(),
            });
        }
        for pair in digits.as_bytes().chunks(2) {
            let byte_str = std::str::from_utf8(pair).unwrap();
            let byte = u8::from_str_radix(byte_str, 16).map_err(|_| FormatError::Syntax {
                line: line_no,
                message: format!("{byte_str:?} is not valid hex"),
            })?;
            code_bytes.push(byte);
        }
    }

    flush_code(&mut spans, code_addr, &mut code_bytes, machine_id, code_start_line)?;

    let machine_id = machine_id.ok_or(FormatError::MissingCpu)?;
    check_no_overlap(&spans)?;

    debug!("parsed {machine_id:?} program: {} span(s), {} binding(s)", spans.len(), bindings.len());
    Ok(ParsedProgram { machine_id, spans, bindings, inline_enter })
}

/// Push the accumulated `.code` bytes as a [`Span`], first checking they form
/// a whole number of this machine's words: SPEC_FULL's source-format section
/// requires hex digits to be grouped into complete machine words, so a
/// section left one byte short of its last word is a parse error rather than
/// a silently truncated span.
fn flush_code(
    spans: &mut Vec<Span>,
    addr: Option<u16>,
    bytes: &mut Vec<u8>,
    machine_id: Option<MachineId>,
    line: usize,
) -> Result<(), FormatError> {
    let Some(address) = addr else { return Ok(()) };
    if bytes.is_empty() {
        return Ok(());
    }
    let machine_id = machine_id.ok_or(FormatError::MissingCpu)?;
    let word_bytes = (MachineConfig::for_machine(machine_id).word_bits as usize + 7) / 8;
    if bytes.len() % word_bytes != 0 {
        trace!("`.code` at line {line} is {} bytes, not a multiple of {word_bytes}", bytes.len());
        return Err(FormatError::Syntax {
            line,
            message: format!(
                "`.code` section is {} bytes, not a whole number of {word_bytes}-byte words",
                bytes.len(),
            ),
        });
    }
    spans.push(Span { address, bytes: std::mem::take(bytes) });
    Ok(())
}

fn parse_binding(rest: &str, kind: BindingKind, line: usize) -> Result<Vec<Binding>, FormatError> {
    let rest = rest.trim();
    let (addr_part, message) = match rest.split_once(char::is_whitespace) {
        Some((addrs, msg)) if looks_like_address_list(addrs) => (addrs, Some(msg.trim().to_string())),
        _ => (rest, None),
    };

    let mut out = Vec::new();
    for (i, token) in addr_part.split(',').enumerate() {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let value = parse_number(token, line)?;
        out.push(Binding {
            kind,
            address: value as u16,
            message: if i == 0 { message.clone() } else { None },
        });
    }
    if out.is_empty() {
        return Err(FormatError::Syntax { line, message: "binding with no addresses".to_string() });
    }
    Ok(out)
}

fn looks_like_address_list(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_hexdigit() || matches!(c, ',' | 'x' | '-' | ' '))
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Optional sign, then decimal digits or `0x` + hex digits.
fn parse_number(token: &str, line: usize) -> Result<i64, FormatError> {
    let (neg, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else {
        rest.parse::<i64>()
    }
    .map_err(|_| FormatError::NumberOutOfRange { line, text: token.to_string() })?;
    Ok(if neg { -magnitude } else { magnitude })
}

fn check_no_overlap(spans: &[Span]) -> Result<(), FormatError> {
    let mut ranges: Vec<(u32, u32)> = spans
        .iter()
        .map(|s| (s.address as u32, s.address as u32 + s.bytes.len() as u32))
        .collect();
    ranges.sort();
    for w in ranges.windows(2) {
        if w[0].1 > w[1].0 {
            return Err(FormatError::OverlappingSpans { line: 0 });
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_cpu_and_one_code_section() {
        // mm-3 has a 32-bit (4-byte) word, so the `.code` section's hex must
        // spell out a whole number of them.
        let source = "; a comment\n.cpu mm-3\n.input 0x100\n.output 0x104\n.code\n00990000\n";
        let program = parse(source).unwrap();
        assert_eq!(program.machine_id, MachineId::ThreeAddress);
        assert_eq!(program.spans, vec![Span { address: 0, bytes: vec![0x00, 0x99, 0x00, 0x00] }]);
        assert_eq!(program.bindings.len(), 2);
    }

    #[test]
    fn enter_values_support_negative_and_hex() {
        let source = ".cpu mm-0\n.enter -12 0x2d\n.code\n9900\n";
        let program = parse(source).unwrap();
        assert_eq!(program.inline_enter, Some(vec![-12, 45]));
    }

    #[test]
    fn overlapping_code_sections_are_rejected() {
        let source = ".cpu mm-3\n.code 0\n00000000\n.code 1\n00000000\n";
        assert!(matches!(parse(source), Err(FormatError::OverlappingSpans { .. })));
    }

    #[test]
    fn code_section_short_of_a_whole_word_is_a_syntax_error() {
        // mm-3's word is 4 bytes; 2 bytes is a truncated word, not a short one.
        let source = ".cpu mm-3\n.code\n0099\n";
        assert!(matches!(parse(source), Err(FormatError::Syntax { .. })));
    }

    #[test]
    fn unknown_cpu_id_is_rejected() {
        let source = ".cpu mm-9\n";
        assert!(matches!(parse(source), Err(FormatError::UnknownCpu { .. })));
    }

    #[test]
    fn odd_length_hex_is_a_syntax_error() {
        let source = ".cpu mm-3\n.code\n009\n";
        assert!(matches!(parse(source), Err(FormatError::Syntax { .. })));
    }
}
