use crate::{AttrDict, AttrValue, ErrorKind, GrammarError, StrVec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The tokenization behavior of [shlex_tokenize].
pub enum ShLexMode {
    /// An unterminated quote is an error; no trailing empty token.
    Strict,
    /// Strict quoting, but trailing whitespace appends one empty token so the position after the
    /// last word can be completed.
    TrailingSpace,
    /// Completion mode: an unterminated quote is tolerated and reported out of band, a trailing
    /// empty token is appended, and every token records its `start`/`end` byte offsets in its
    /// attribute dictionary.
    Lenient,
}

#[derive(Debug)]
/// The outcome of a shell-like tokenization.
pub struct ShLexed {
    pub vec: StrVec,
    /// The quote character left unclosed by the input, when tokenized leniently.
    pub missing_quote: Option<char>,
}

fn is_blank(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

/// Consume a quoted segment starting at the opening quote; returns the consumed byte count, the
/// unquoted content and whether the closing quote was found.
/// Inside the segment `\<quote>` escapes the quote and `\\` escapes a backslash.
fn eat_quoted(line: &str, start: usize, quote: u8) -> (usize, String, bool) {
    let bytes = line.as_bytes();
    let mut out = String::new();
    let mut i = start + 1;
    let mut run = i;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\\' && i + 1 < bytes.len() && (bytes[i + 1] == quote || bytes[i + 1] == b'\\') {
            out.push_str(&line[run..i]);
            out.push(bytes[i + 1] as char);
            i += 2;
            run = i;
            continue;
        }
        if c == quote {
            out.push_str(&line[run..i]);
            return (i + 1 - start, out, true);
        }
        i += 1;
    }
    out.push_str(&line[run..]);
    (i - start, out, false)
}

/// Split a raw input line into a token vector with shell-like rules: blanks separate tokens,
/// single or double quotes group, adjacent quoted and bare segments concatenate into one token,
/// and a word starting with `#` outside quotes begins a comment running to the end of the line.
pub fn shlex_tokenize(line: &str, mode: ShLexMode) -> Result<ShLexed, GrammarError> {
    let bytes = line.as_bytes();
    let mut vec = StrVec::new();
    let mut missing_quote = None;
    let mut off = 0;
    let mut last_is_space = true;

    while off < bytes.len() {
        let mut had_space = false;
        while off < bytes.len() && is_blank(bytes[off]) {
            off += 1;
            had_space = true;
        }
        if had_space {
            last_is_space = true;
        }
        if off >= bytes.len() {
            break;
        }
        if bytes[off] == b'#' {
            while off < bytes.len() && bytes[off] != b'\n' {
                off += 1;
            }
            last_is_space = false;
            continue;
        }

        missing_quote = None;
        last_is_space = false;
        let token_start = off;
        let mut token = String::new();
        while off < bytes.len() {
            let c = bytes[off];
            if c == b'"' || c == b'\'' {
                let (consumed, segment, closed) = eat_quoted(line, off, c);
                if !closed {
                    missing_quote = Some(c as char);
                    if mode != ShLexMode::Lenient {
                        return Err(GrammarError::new(
                            ErrorKind::BadFormat,
                            "shlex",
                            format!("quote {} is not closed", c as char),
                        ));
                    }
                }
                token.push_str(&segment);
                off += consumed;
            } else if is_blank(c) {
                break;
            } else {
                let run = off;
                while off < bytes.len()
                    && !is_blank(bytes[off])
                    && bytes[off] != b'"'
                    && bytes[off] != b'\''
                {
                    off += 1;
                }
                token.push_str(&line[run..off]);
            }
        }

        let index = vec.len();
        vec.push(&token);
        if mode == ShLexMode::Lenient {
            let mut attrs = AttrDict::new();
            attrs.insert("start".into(), AttrValue::Int(token_start as i64));
            attrs.insert("end".into(), AttrValue::Int(off as i64));
            vec.set_attrs(index, attrs)?;
        }
    }

    if mode != ShLexMode::Strict && last_is_space {
        let index = vec.len();
        vec.push("");
        if mode == ShLexMode::Lenient {
            let mut attrs = AttrDict::new();
            attrs.insert("start".into(), AttrValue::Int(bytes.len() as i64));
            attrs.insert("end".into(), AttrValue::Int(bytes.len() as i64));
            vec.set_attrs(index, attrs)?;
        }
    }

    Ok(ShLexed { vec, missing_quote })
}
