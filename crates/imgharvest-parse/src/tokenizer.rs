//! Content stream tokenizer.
//!
//! Splits decoded content stream bytes into [`Operator`]s. Only numbers and
//! names are kept as operand values since placement tracking needs nothing
//! else (`cm` takes six numbers, `Do` takes one name). Strings, arrays and
//! dictionaries are consumed and reported as [`Operand::Other`]. Inline
//! images (`BI ... ID ... EI`) are skipped entirely.

use crate::error::BackendError;

/// A content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Number(f64),
    /// Name without the leading `/`.
    Name(String),
    Other,
}

impl Operand {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(n) => Some(n),
            _ => None,
        }
    }
}

/// An operator with the operands that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub operands: Vec<Operand>,
}

/// Parse content stream bytes into operators.
///
/// # Errors
///
/// Returns [`BackendError::Interpreter`] for unterminated strings, arrays
/// and dictionaries.
pub fn tokenize(input: &[u8]) -> Result<Vec<Operator>, BackendError> {
    let mut ops = Vec::new();
    let mut operands: Vec<Operand> = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        skip_whitespace_and_comments(input, &mut pos);
        if pos >= input.len() {
            break;
        }

        match input[pos] {
            b'(' | b'<' | b'[' => {
                skip_composite(input, &mut pos)?;
                operands.push(Operand::Other);
            }
            b'/' => operands.push(Operand::Name(parse_name(input, &mut pos))),
            b'0'..=b'9' | b'+' | b'-' | b'.' => match parse_number(input, &mut pos) {
                Some(n) => operands.push(Operand::Number(n)),
                None => operands.push(Operand::Other),
            },
            b'a'..=b'z' | b'A'..=b'Z' | b'*' | b'\'' | b'"' => {
                let keyword = parse_keyword(input, &mut pos);
                match keyword.as_str() {
                    "true" | "false" | "null" => operands.push(Operand::Other),
                    "BI" => {
                        skip_inline_image(input, &mut pos);
                        operands.clear();
                    }
                    _ => ops.push(Operator {
                        name: keyword,
                        operands: std::mem::take(&mut operands),
                    }),
                }
            }
            _ => pos += 1,
        }
    }

    Ok(ops)
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn skip_whitespace_and_comments(input: &[u8], pos: &mut usize) {
    while *pos < input.len() {
        if is_whitespace(input[*pos]) {
            *pos += 1;
        } else if input[*pos] == b'%' {
            while *pos < input.len() && input[*pos] != b'\n' && input[*pos] != b'\r' {
                *pos += 1;
            }
        } else {
            break;
        }
    }
}

/// Skip a literal string, hex string, array or dictionary starting at `pos`.
fn skip_composite(input: &[u8], pos: &mut usize) -> Result<(), BackendError> {
    match input[*pos] {
        b'(' => skip_literal_string(input, pos),
        b'<' if input.get(*pos + 1) == Some(&b'<') => {
            *pos += 2;
            skip_until_close(input, pos, b">>", "dictionary")
        }
        b'<' => {
            *pos += 1;
            while *pos < input.len() && input[*pos] != b'>' {
                *pos += 1;
            }
            if *pos >= input.len() {
                return Err(BackendError::Interpreter(
                    "unterminated hex string".to_string(),
                ));
            }
            *pos += 1;
            Ok(())
        }
        _ => {
            *pos += 1;
            skip_until_close(input, pos, b"]", "array")
        }
    }
}

/// Consume tokens until `close`, skipping nested composites.
fn skip_until_close(
    input: &[u8],
    pos: &mut usize,
    close: &[u8],
    what: &str,
) -> Result<(), BackendError> {
    loop {
        skip_whitespace_and_comments(input, pos);
        if *pos >= input.len() {
            return Err(BackendError::Interpreter(format!("unterminated {what}")));
        }
        if input[*pos..].starts_with(close) {
            *pos += close.len();
            return Ok(());
        }
        match input[*pos] {
            b'(' | b'<' | b'[' => skip_composite(input, pos)?,
            _ => *pos += 1,
        }
    }
}

fn skip_literal_string(input: &[u8], pos: &mut usize) -> Result<(), BackendError> {
    *pos += 1;
    let mut depth = 1u32;
    while *pos < input.len() {
        match input[*pos] {
            b'\\' => *pos += 2,
            b'(' => {
                depth += 1;
                *pos += 1;
            }
            b')' => {
                depth -= 1;
                *pos += 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            _ => *pos += 1,
        }
    }
    Err(BackendError::Interpreter(
        "unterminated literal string".to_string(),
    ))
}

/// Skip past the `EI` that ends an inline image. The image data is binary,
/// so `EI` only counts when surrounded by whitespace.
fn skip_inline_image(input: &[u8], pos: &mut usize) {
    while *pos + 1 < input.len() {
        if input[*pos] == b'I'
            && input[*pos + 1] == b'D'
            && *pos > 0
            && is_whitespace(input[*pos - 1])
        {
            *pos += 2;
            break;
        }
        *pos += 1;
    }
    while *pos + 1 < input.len() {
        let boundary_before = is_whitespace(input[*pos - 1]);
        let boundary_after = input.get(*pos + 2).is_none_or(|b| is_whitespace(*b));
        if input[*pos] == b'E' && input[*pos + 1] == b'I' && boundary_before && boundary_after {
            *pos += 2;
            return;
        }
        *pos += 1;
    }
    *pos = input.len();
}

fn parse_name(input: &[u8], pos: &mut usize) -> String {
    *pos += 1;
    let start = *pos;
    while *pos < input.len() && !is_whitespace(input[*pos]) && !is_delimiter(input[*pos]) {
        *pos += 1;
    }

    let raw = &input[start..*pos];
    let mut name = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let Ok(hex) = std::str::from_utf8(&raw[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    name.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        name.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&name).into_owned()
}

fn parse_number(input: &[u8], pos: &mut usize) -> Option<f64> {
    let start = *pos;
    if input[*pos] == b'+' || input[*pos] == b'-' {
        *pos += 1;
    }
    let mut has_dot = false;
    while *pos < input.len() {
        let b = input[*pos];
        if b == b'.' && !has_dot {
            has_dot = true;
        } else if !b.is_ascii_digit() {
            break;
        }
        *pos += 1;
    }
    if *pos == start {
        *pos += 1;
        return None;
    }
    std::str::from_utf8(&input[start..*pos])
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
}

fn parse_keyword(input: &[u8], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < input.len() && !is_whitespace(input[*pos]) && !is_delimiter(input[*pos]) {
        *pos += 1;
    }
    String::from_utf8_lossy(&input[start..*pos]).into_owned()
}
