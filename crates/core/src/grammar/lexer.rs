/// Classification of a grammar-template lexer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    /// `(`
    ParenOpen,
    /// `)`
    ParenClose,
    /// `[`
    BracketOpen,
    /// `]`
    BracketClose,
    /// `{`
    BraceOpen,
    /// `}`
    BraceClose,
    /// `|` between alternatives.
    Pipe,
    /// A run of non-whitespace, non-structural characters.
    Word,
}

/// A token that borrows its text directly from the template.
///
/// `text` is always exactly `&template[start..end]`.
#[derive(Debug, Clone, Copy)]
pub struct Token<'a> {
    /// The classification of this token.
    pub kind: TokKind,
    /// Borrowed slice of the template for this token.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

fn structural(c: u8) -> Option<TokKind> {
    Some(match c {
        b'(' => TokKind::ParenOpen,
        b')' => TokKind::ParenClose,
        b'[' => TokKind::BracketOpen,
        b']' => TokKind::BracketClose,
        b'{' => TokKind::BraceOpen,
        b'}' => TokKind::BraceClose,
        b'|' => TokKind::Pipe,
        _ => return None,
    })
}

/// Tokenize a grammar template such as `show ip (route|bgp) [A.B.C.D]`.
///
/// Whitespace separates words and is otherwise dropped. Group delimiters and
/// `|` are single-character tokens even when not surrounded by spaces.
/// Structural characters are ASCII, so byte-wise scanning never splits a
/// UTF-8 sequence.
pub fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut toks = Vec::new();
    let b = template.as_bytes();
    let mut i = 0usize;
    while i < b.len() {
        let start = i;
        if b[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if let Some(kind) = structural(b[i]) {
            i += 1;
            toks.push(Token {
                kind,
                text: &template[start..i],
                start,
                end: i,
            });
            continue;
        }
        while i < b.len() && !b[i].is_ascii_whitespace() && structural(b[i]).is_none() {
            i += 1;
        }
        toks.push(Token {
            kind: TokKind::Word,
            text: &template[start..i],
            start,
            end: i,
        });
    }
    toks
}
