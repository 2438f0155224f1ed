//! Fuzzy equality between expected and observed output lines.
//!
//! An expected line may end in one of three keywords that select how it
//! is compared against the observed line:
//!
//! - ` (re)`: the rest of the line is a regular expression.
//! - ` (glob)`: the rest of the line is a shell-style glob.
//! - ` (esc)`: the rest of the line is a double-quoted escape literal.
//!
//! The keywords can appear verbatim in command output, so plain byte
//! equality is always checked as well. Malformed patterns never abort a
//! run; they fall back to byte equality and surface as an ordinary
//! diff.

use regex::bytes::Regex;

/// Returns true if the observed line `b` satisfies the expected line
/// `a`, interpreting any trailing matcher keyword on `a`.
///
/// Only the expected side is interpreted as a pattern; `b` is always
/// raw output.
pub fn lines_match(a: &[u8], b: &[u8]) -> bool {
    let mut v = false;

    if let Some(pat) = a.strip_suffix(b" (re)") {
        v = match_regex(pat, b);
    }
    if let Some(pat) = a.strip_suffix(b" (glob)") {
        v = match_glob(pat, b);
    }
    if let Some(pat) = a.strip_suffix(b" (esc)") {
        v = match_esc(pat, b);
    }

    v || a == b
}

fn match_regex(pattern: &[u8], line: &[u8]) -> bool {
    if pattern.is_empty() {
        // Regex cannot be empty
        return false;
    }
    let pat = match std::str::from_utf8(pattern) {
        Ok(pat) => pat,
        Err(_) => return pattern == line,
    };
    match Regex::new(pat) {
        // Find semantics: the pattern may match anywhere in the line.
        Ok(re) => re.is_match(line),
        Err(_) => pattern == line,
    }
}

fn match_glob(pattern: &[u8], line: &[u8]) -> bool {
    if pattern.is_empty() {
        // Glob cannot be empty
        return false;
    }
    let (pat, line_str) = match (std::str::from_utf8(pattern), std::str::from_utf8(line)) {
        (Ok(pat), Ok(line_str)) => (pat, line_str),
        _ => return pattern == line,
    };
    match glob::Pattern::new(pat) {
        Ok(glob) => glob.matches(line_str),
        Err(_) => pattern == line,
    }
}

fn match_esc(pattern: &[u8], line: &[u8]) -> bool {
    match unescape(pattern) {
        Some(unescaped) => unescaped == line,
        None => false,
    }
}

/// Escapes unprintable bytes in an output line, appending the ` (esc)`
/// keyword when anything had to change. The result round-trips through
/// the `(esc)` matcher, so a rewritten `.err` file still matches the
/// output that produced it.
pub fn escape(s: &[u8]) -> String {
    let quoted = quote(s);
    if quoted.as_bytes() != s {
        quoted + " (esc)"
    } else {
        quoted
    }
}

/// Spells a raw byte string the way a double-quoted string literal
/// would, without the surrounding quotes. Printable bytes pass through,
/// including multi-byte UTF-8 sequences; everything else becomes a
/// backslash escape.
pub(crate) fn quote(s: &[u8]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        let b = s[i];
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            0x07 => out.push_str("\\a"),
            0x08 => out.push_str("\\b"),
            0x0c => out.push_str("\\f"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x0b => out.push_str("\\v"),
            0x20..=0x7e => out.push(b as char),
            0x00..=0x1f | 0x7f => out.push_str(&format!("\\x{:02x}", b)),
            _ => match next_char(&s[i..]) {
                Some((c, len)) if !c.is_control() => {
                    out.push(c);
                    i += len;
                    continue;
                }
                Some((c, len)) => {
                    if (c as u32) < 0x10000 {
                        out.push_str(&format!("\\u{:04x}", c as u32));
                    } else {
                        out.push_str(&format!("\\U{:08x}", c as u32));
                    }
                    i += len;
                    continue;
                }
                // Not valid UTF-8; escape the lone byte.
                None => out.push_str(&format!("\\x{:02x}", b)),
            },
        }
        i += 1;
    }
    out
}

/// Decodes one UTF-8 character from the front of `s`.
fn next_char(s: &[u8]) -> Option<(char, usize)> {
    let len = match s[0] {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => return None,
    };
    let chunk = s.get(..len)?;
    let decoded = std::str::from_utf8(chunk).ok()?;
    decoded.chars().next().map(|c| (c, len))
}

/// Interprets a double-quoted escape literal, producing the raw bytes
/// it denotes. Returns `None` on any malformed escape or on an
/// unescaped double quote.
pub(crate) fn unescape(s: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len());
    let mut i = 0;
    while i < s.len() {
        match s[i] {
            b'"' => return None,
            b'\\' => {
                let &esc = s.get(i + 1)?;
                i += 2;
                match esc {
                    b'a' => out.push(0x07),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0c),
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'v' => out.push(0x0b),
                    b'\\' => out.push(b'\\'),
                    b'\'' => out.push(b'\''),
                    b'"' => out.push(b'"'),
                    b'x' => {
                        let hi = hex_digit(*s.get(i)?)?;
                        let lo = hex_digit(*s.get(i + 1)?)?;
                        out.push(hi << 4 | lo);
                        i += 2;
                    }
                    b'0'..=b'7' => {
                        let mut v = u32::from(esc - b'0');
                        for _ in 0..2 {
                            let d = *s.get(i)?;
                            if !(b'0'..=b'7').contains(&d) {
                                return None;
                            }
                            v = v * 8 + u32::from(d - b'0');
                            i += 1;
                        }
                        if v > 255 {
                            return None;
                        }
                        out.push(v as u8);
                    }
                    b'u' => push_char(&mut out, hex_rune(s, &mut i, 4)?),
                    b'U' => push_char(&mut out, hex_rune(s, &mut i, 8)?),
                    _ => return None,
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Some(out)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn hex_rune(s: &[u8], i: &mut usize, digits: usize) -> Option<char> {
    let mut v: u32 = 0;
    for _ in 0..digits {
        v = v << 4 | u32::from(hex_digit(*s.get(*i)?)?);
        *i += 1;
    }
    char::from_u32(v)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}
