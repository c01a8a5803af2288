use std::fmt;

use crate::token::{TokenKind, TokenSpec};

/// A compiled grammar template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    /// Top-level sequence of elements.
    pub elements: Sequence,
    /// Number of keyword and placeholder positions, in template order.
    pub token_count: usize,
}

/// A run of elements matched one after another.
pub type Sequence = Vec<Element>;

/// One position or group of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A single keyword or placeholder.
    Atom(Atom),
    /// `( a | b )` when required, `[ a | b ]` when optional.
    Choice {
        /// Alternatives, each a non-empty sequence.
        alternatives: Vec<Sequence>,
        /// Whether the whole choice may be skipped.
        optional: bool,
    },
    /// `{ a | b }`: zero or more alternatives, any order, each at most once.
    Group(Vec<Sequence>),
}

/// A keyword or placeholder position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// What the position matches.
    pub spec: TokenSpec,
    /// `.WORD` / `.LINE`: the position may repeat.
    pub recursive: bool,
    /// Index into the command's help list.
    pub help_index: usize,
}

impl Grammar {
    /// A line that exercises the grammar: first alternative of every group,
    /// optional parts included, and a sample value for each placeholder.
    pub fn sample_line(&self) -> String {
        let mut words = Vec::new();
        sample_sequence(&self.elements, &mut words);
        words.join(" ")
    }

    /// Whether the grammar could match a line with no tokens.
    pub fn is_nullable(&self) -> bool {
        sequence_nullable(&self.elements)
    }
}

fn sample_sequence(seq: &[Element], out: &mut Vec<String>) {
    for element in seq {
        match element {
            Element::Atom(atom) => out.push(sample_value(&atom.spec)),
            Element::Choice { alternatives, .. } | Element::Group(alternatives) => {
                if let Some(first) = alternatives.first() {
                    sample_sequence(first, out);
                }
            }
        }
    }
}

/// A representative input for a position.
pub fn sample_value(spec: &TokenSpec) -> String {
    match spec.kind {
        TokenKind::Keyword => spec.text.clone(),
        TokenKind::Alias => spec.display().to_string(),
        TokenKind::Range => spec.range.map(|r| r.min).unwrap_or_default().to_string(),
        TokenKind::Ipv4 => "10.0.0.1".into(),
        TokenKind::Ipv4Prefix => "10.0.0.0/8".into(),
        TokenKind::Ipv6 => "2001:db8::1".into(),
        TokenKind::Ipv6Prefix => "2001:db8::/32".into(),
        TokenKind::Word => "Word1".into(),
        TokenKind::Line => "Line1 text".into(),
        TokenKind::Time => "12:30:00".into(),
        TokenKind::Community => "65000:100".into(),
        TokenKind::MacAddress => "0011.2233.4455".into(),
        TokenKind::IfName => "eth0".into(),
        _ => spec.text.clone(),
    }
}

fn sequence_nullable(seq: &[Element]) -> bool {
    seq.iter().all(|element| match element {
        Element::Atom(_) => false,
        Element::Choice {
            alternatives,
            optional,
        } => *optional || alternatives.iter().any(|alt| sequence_nullable(alt)),
        Element::Group(_) => true,
    })
}

fn write_alternatives(f: &mut fmt::Formatter<'_>, alts: &[Sequence]) -> fmt::Result {
    for (i, alt) in alts.iter().enumerate() {
        if i > 0 {
            f.write_str("|")?;
        }
        write_sequence(f, alt)?;
    }
    Ok(())
}

fn write_sequence(f: &mut fmt::Formatter<'_>, seq: &[Element]) -> fmt::Result {
    for (i, element) in seq.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{element}")?;
    }
    Ok(())
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Atom(atom) => write!(f, "{}", atom.spec),
            Element::Choice {
                alternatives,
                optional: false,
            } => {
                f.write_str("(")?;
                write_alternatives(f, alternatives)?;
                f.write_str(")")
            }
            Element::Choice {
                alternatives,
                optional: true,
            } => {
                f.write_str("[")?;
                write_alternatives(f, alternatives)?;
                f.write_str("]")
            }
            Element::Group(alternatives) => {
                f.write_str("{")?;
                write_alternatives(f, alternatives)?;
                f.write_str("}")
            }
        }
    }
}

/// Canonical template text, whitespace-normalized.
impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sequence(f, &self.elements)
    }
}
