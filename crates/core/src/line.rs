//! Input-line tokenizer.
//!
//! Splits an operator line into whitespace-separated tokens, honoring
//! double quotes, and separates the primary command from an output-modifier
//! segment at the first unescaped `|`.

/// Most tokens a single segment may hold.
pub const MAX_TOKENS: usize = 128;
/// Longest token, in bytes.
pub const MAX_TOKEN_LEN: usize = 256;

/// One token of an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineToken {
    /// Token text with quotes removed and `\|` unescaped.
    pub text: String,
    /// Byte offset of the first character in the line.
    pub start: usize,
    /// Byte offset one past the last character in the line.
    pub end: usize,
}

/// A tokenized line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenizedLine {
    /// Tokens before the pipe.
    pub primary: Vec<LineToken>,
    /// Byte offset of the pipe and the tokens after it.
    pub modifier: Option<(usize, Vec<LineToken>)>,
}

/// A segment exceeded [`MAX_TOKENS`] or a token exceeded [`MAX_TOKEN_LEN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooLong {
    /// Start of the offending token.
    pub offset: usize,
    /// End of the offending token.
    pub end: usize,
}

/// Tokenize `line`, enforcing the per-segment limits before anything is kept.
pub fn tokenize(line: &str) -> Result<TokenizedLine, TooLong> {
    let bytes = line.as_bytes();
    let mut out = TokenizedLine::default();
    let mut current: Vec<LineToken> = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if bytes[i] == b'|' && out.modifier.is_none() {
            out.primary = std::mem::take(&mut current);
            out.modifier = Some((i, Vec::new()));
            i += 1;
            continue;
        }
        let start = i;
        let mut text = String::new();
        if bytes[i] == b'"' {
            i += 1;
            let body = i;
            while i < bytes.len() && bytes[i] != b'"' {
                i += 1;
            }
            text.push_str(&line[body..i]);
            if i < bytes.len() {
                i += 1;
            }
        } else {
            let mut run = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                match bytes[i] {
                    b'\\' if bytes.get(i + 1) == Some(&b'|') => {
                        text.push_str(&line[run..i]);
                        text.push('|');
                        i += 2;
                        run = i;
                    }
                    b'|' if out.modifier.is_none() => break,
                    _ => i += 1,
                }
            }
            text.push_str(&line[run..i]);
        }
        if text.len() > MAX_TOKEN_LEN || current.len() == MAX_TOKENS {
            return Err(TooLong { offset: start, end: i });
        }
        current.push(LineToken {
            text,
            start,
            end: i,
        });
    }
    match &mut out.modifier {
        Some((_, tokens)) => *tokens = current,
        None => out.primary = current,
    }
    Ok(out)
}

/// Whether the line ends where a new token would start.
pub(crate) fn ends_open(line: &str) -> bool {
    line.is_empty() || line.ends_with(|c: char| c.is_ascii_whitespace() || c == '|')
}
