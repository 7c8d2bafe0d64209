use crate::ir::{DumpDirective, Item, Operand, Statement, WordDirective};
use crate::lex::{tokenize_line, Token};
use crate::Error;

/// Parse `.mmasm` source into a flat item list, resolving nothing yet:
/// `gen` does the two address-assignment passes.
pub fn parse(source: &str) -> Result<Vec<Item>, Error> {
    let mut items = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_comment(raw_line);
        if line.trim().is_empty() {
            continue;
        }

        let mut tokens = tokenize_line(line).into_iter().peekable();

        let mut label = None;
        if let (Some(Token::Ident(name)), Some(Token::Colon)) = (tokens.peek().cloned(), peek2(&mut tokens)) {
            label = Some(name);
            tokens.next();
            tokens.next();
        }

        let head = match tokens.next() {
            Some(t) => t,
            None => {
                // A bare label on its own line marks the next address.
                if let Some(name) = label {
                    items.push(Item::Statement(Statement {
                        line: line_no,
                        label: Some(name),
                        mnemonic: String::new(),
                        operands: Vec::new(),
                    }));
                }
                continue;
            }
        };

        let Token::Ident(word) = head else {
            return Err(Error::new(line_no, "expected a directive or mnemonic"));
        };

        match word.as_str() {
            ".config" => {
                let address = expect_number(&mut tokens, line_no)?;
                items.push(Item::Config { line: line_no, address: address as u16 });
            }
            ".code" => {
                items.push(Item::Code { line: line_no });
            }
            ".word" => {
                let values = parse_number_list(&mut tokens, line_no)?;
                items.push(Item::Word(WordDirective { line: line_no, label, values }));
            }
            ".dump" => {
                let targets = parse_dump_targets(&mut tokens, line_no)?;
                items.push(Item::Dump(DumpDirective { line: line_no, targets }));
            }
            mnemonic if mnemonic.starts_with('.') => {
                return Err(Error::new(line_no, format!("unknown directive {mnemonic:?}")));
            }
            mnemonic => {
                let operands = parse_operands(&mut tokens, line_no)?;
                items.push(Item::Statement(Statement {
                    line: line_no,
                    label,
                    mnemonic: mnemonic.to_string(),
                    operands,
                }));
            }
        }
    }

    Ok(items)
}

fn peek2(tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>) -> Option<Token> {
    let mut clone = tokens.clone();
    clone.next();
    clone.next()
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(i) => &line[..i],
        None => line,
    }
}

fn expect_number(
    tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
    line: usize,
) -> Result<i64, Error> {
    match tokens.next() {
        Some(Token::Number(n)) => Ok(n),
        _ => Err(Error::new(line, "expected a number")),
    }
}

fn parse_number_list(
    tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
    line: usize,
) -> Result<Vec<i64>, Error> {
    let mut values = vec![expect_number(tokens, line)?];
    while matches!(tokens.peek(), Some(Token::Comma)) {
        tokens.next();
        values.push(expect_number(tokens, line)?);
    }
    Ok(values)
}

fn parse_dump_targets(
    tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
    line: usize,
) -> Result<Vec<(String, u32)>, Error> {
    let mut targets = Vec::new();
    loop {
        let name = match tokens.next() {
            Some(Token::Ident(name)) => name,
            _ => return Err(Error::new(line, "expected a label in `.dump`")),
        };
        let size = if matches!(tokens.peek(), Some(Token::LParen)) {
            tokens.next();
            let n = expect_number(tokens, line)?;
            match tokens.next() {
                Some(Token::RParen) => {}
                _ => return Err(Error::new(line, "expected `)` after `.dump` size")),
            }
            n as u32
        } else {
            1
        };
        targets.push((name, size));
        if matches!(tokens.peek(), Some(Token::Comma)) {
            tokens.next();
        } else {
            break;
        }
    }
    Ok(targets)
}

fn parse_operands(
    tokens: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
    line: usize,
) -> Result<Vec<Operand>, Error> {
    let mut operands = Vec::new();
    if tokens.peek().is_none() {
        return Ok(operands);
    }
    loop {
        let operand = match tokens.next() {
            Some(Token::Ident(name)) => {
                if matches!(tokens.peek(), Some(Token::LParen)) {
                    tokens.next();
                    let reg = match tokens.next() {
                        Some(Token::Ident(reg_name)) => parse_register(&reg_name)
                            .ok_or_else(|| Error::new(line, format!("{reg_name:?} is not a register")))?,
                        _ => return Err(Error::new(line, "expected a register inside `(...)`")),
                    };
                    match tokens.next() {
                        Some(Token::RParen) => {}
                        _ => return Err(Error::new(line, "expected `)`")),
                    }
                    Operand::Indexed { label: name, reg }
                } else if let Some(reg) = parse_register(&name) {
                    Operand::Register(reg)
                } else {
                    Operand::Label(name)
                }
            }
            _ => return Err(Error::new(line, "expected an operand")),
        };
        operands.push(operand);
        if matches!(tokens.peek(), Some(Token::Comma)) {
            tokens.next();
        } else {
            break;
        }
    }
    Ok(operands)
}

/// `R0`..`RF`, case-insensitive.
fn parse_register(text: &str) -> Option<u8> {
    let rest = text.strip_prefix('R').or_else(|| text.strip_prefix('r'))?;
    u8::from_str_radix(rest, 16).ok().filter(|&n| n <= 0xf)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_a_labelled_statement_with_an_indexed_operand() {
        let items = parse("sum: add R1, array(R2)\n").unwrap();
        assert_eq!(items.len(), 1);
        match &items[0] {
            Item::Statement(s) => {
                assert_eq!(s.label.as_deref(), Some("sum"));
                assert_eq!(s.mnemonic, "add");
                assert_eq!(s.operands[1], Operand::Indexed { label: "array".into(), reg: 2 });
            }
            _ => panic!("expected a statement"),
        }
    }

    #[test]
    fn parses_dump_with_explicit_size() {
        let items = parse(".dump array(5), sum\n").unwrap();
        match &items[0] {
            Item::Dump(d) => {
                assert_eq!(d.targets, vec![("array".to_string(), 5), ("sum".to_string(), 1)]);
            }
            _ => panic!("expected a dump directive"),
        }
    }
}
