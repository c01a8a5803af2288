use cmdtree_diagnostics::Span;

use super::ast::{Atom, Element, Grammar, Sequence};
use super::lexer::{TokKind, Token, tokenize};
use crate::error::InstallError;
use crate::token::{TokenKind, TokenSpec};

// ─── Public API ─────────────────────────────────────────────────────────────

/// Compile a grammar template into a [`Grammar`].
///
/// Fails with [`InstallError::MalformedGrammar`] on unbalanced or empty
/// groups, a stray `|`, a bad `<min-max>` range, an unknown all-uppercase
/// placeholder, a `LINE` position that is followed by more tokens, or a
/// template that could match an empty line.
pub fn compile(template: &str) -> Result<Grammar, InstallError> {
    let toks = tokenize(template);
    let mut parser = Parser {
        template,
        toks,
        pos: 0,
        next_help: 0,
    };
    let elements = parser.sequence()?;
    if let Some(tok) = parser.peek() {
        return Err(parser.error(format!("unexpected `{}`", tok.text), Some(tok)));
    }
    let grammar = Grammar {
        elements,
        token_count: parser.next_help,
    };
    check_line_is_last(&grammar.elements, false).map_err(|atom| InstallError::MalformedGrammar {
        template: template.to_string(),
        reason: format!("`{}` must be the last position", atom.spec),
        span: None,
    })?;
    if grammar.is_nullable() {
        return Err(parser.error("grammar matches an empty line", None));
    }
    Ok(grammar)
}

// ─── Parser Implementation ─────────────────────────────────────────────────

struct Parser<'a> {
    template: &'a str,
    toks: Vec<Token<'a>>,
    pos: usize,
    next_help: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.toks.get(self.pos).copied()
    }

    fn error(&self, reason: impl Into<String>, at: Option<Token<'_>>) -> InstallError {
        InstallError::MalformedGrammar {
            template: self.template.to_string(),
            reason: reason.into(),
            span: at.map(|t| Span::new(t.start, t.end)),
        }
    }

    /// Elements up to the next `|`, closing delimiter, or end of input.
    fn sequence(&mut self) -> Result<Sequence, InstallError> {
        let mut seq = Vec::new();
        while let Some(tok) = self.peek() {
            let element = match tok.kind {
                TokKind::Word => {
                    self.pos += 1;
                    Element::Atom(self.atom(tok)?)
                }
                TokKind::ParenOpen => Element::Choice {
                    alternatives: self.group(tok, TokKind::ParenClose)?,
                    optional: false,
                },
                TokKind::BracketOpen => Element::Choice {
                    alternatives: self.group(tok, TokKind::BracketClose)?,
                    optional: true,
                },
                TokKind::BraceOpen => Element::Group(self.group(tok, TokKind::BraceClose)?),
                TokKind::Pipe | TokKind::ParenClose | TokKind::BracketClose | TokKind::BraceClose => {
                    break;
                }
            };
            seq.push(element);
        }
        Ok(seq)
    }

    /// `open alt (| alt)* close`, every alternative non-empty.
    fn group(&mut self, open: Token<'a>, close: TokKind) -> Result<Vec<Sequence>, InstallError> {
        self.pos += 1;
        let mut alternatives = Vec::new();
        loop {
            let alt = self.sequence()?;
            let next = self.peek();
            if alt.is_empty() {
                return Err(self.error("empty alternative", next.or(Some(open))));
            }
            alternatives.push(alt);
            match next {
                Some(t) if t.kind == TokKind::Pipe => self.pos += 1,
                Some(t) if t.kind == close => {
                    self.pos += 1;
                    return Ok(alternatives);
                }
                Some(t) => {
                    return Err(self.error(
                        format!("`{}` does not close `{}`", t.text, open.text),
                        Some(t),
                    ));
                }
                None => return Err(self.error(format!("unclosed `{}`", open.text), Some(open))),
            }
        }
    }

    fn atom(&mut self, tok: Token<'_>) -> Result<Atom, InstallError> {
        let (spec, recursive) = self.classify(tok)?;
        let help_index = self.next_help;
        self.next_help += 1;
        Ok(Atom {
            spec,
            recursive,
            help_index,
        })
    }

    fn classify(&self, tok: Token<'_>) -> Result<(TokenSpec, bool), InstallError> {
        let text = tok.text;
        if let Some(rest) = text.strip_prefix('*') {
            return match rest.split_once('=') {
                Some((alias, keyword)) if !alias.is_empty() && !keyword.is_empty() => {
                    Ok((TokenSpec::alias(alias, keyword), false))
                }
                _ => Err(self.error(format!("bad alias `{text}`"), Some(tok))),
            };
        }
        if let Some(inner) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
            let bounds = inner
                .split_once('-')
                .and_then(|(lo, hi)| Some((lo.parse::<u32>().ok()?, hi.parse::<u32>().ok()?)))
                .filter(|(lo, hi)| lo <= hi);
            return match bounds {
                Some((min, max)) => Ok((TokenSpec::range(min, max), false)),
                None => Err(self.error(format!("bad range `{text}`"), Some(tok))),
            };
        }
        if let Some(rest) = text.strip_prefix('.') {
            return match TokenKind::from_placeholder(rest) {
                Some(kind) => Ok((TokenSpec::placeholder(kind, true), true)),
                None => Err(self.error(format!("unknown placeholder `{text}`"), Some(tok))),
            };
        }
        if let Some(kind) = TokenKind::from_placeholder(text) {
            return Ok((TokenSpec::placeholder(kind, false), false));
        }
        let upper = text.chars().any(|c| c.is_ascii_uppercase());
        let lower = text.chars().any(|c| c.is_ascii_lowercase());
        if upper && !lower {
            return Err(self.error(format!("unknown placeholder `{text}`"), Some(tok)));
        }
        Ok((TokenSpec::keyword(text), false))
    }
}

/// A `LINE` position swallows the rest of the line, so nothing may follow it.
fn check_line_is_last(seq: &[Element], followed: bool) -> Result<(), &Atom> {
    for (i, element) in seq.iter().enumerate() {
        let followed_here = followed || i + 1 < seq.len();
        match element {
            Element::Atom(atom) => {
                if atom.spec.kind == TokenKind::Line && followed_here {
                    return Err(atom);
                }
            }
            Element::Choice { alternatives, .. } => {
                for alt in alternatives {
                    check_line_is_last(alt, followed_here)?;
                }
            }
            // Brace members may be followed by other members.
            Element::Group(alternatives) => {
                for alt in alternatives {
                    check_line_is_last(alt, true)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn malformed(template: &str) -> String {
        match compile(template) {
            Err(InstallError::MalformedGrammar { reason, .. }) => reason,
            other => panic!("expected MalformedGrammar for {template:?}, got {other:?}"),
        }
    }

    #[test]
    fn keywords_and_placeholders() {
        let g = compile("show ip route A.B.C.D/M").unwrap();
        assert_eq!(g.token_count, 4);
        assert_eq!(g.to_string(), "show ip route A.B.C.D/M");
        match &g.elements[3] {
            Element::Atom(a) => {
                assert_eq!(a.spec.kind, TokenKind::Ipv4Prefix);
                assert_eq!(a.help_index, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn groups_normalize_whitespace() {
        let g = compile("show ( ip|ipv6 ) [ detail ] {brief|json}").unwrap();
        assert_eq!(g.to_string(), "show (ip|ipv6) [detail] {brief|json}");
        assert_eq!(g.token_count, 6);
    }

    #[test]
    fn ranges_aliases_recursive() {
        let g = compile("*s=show vlan <1-4094> .WORD").unwrap();
        let kinds: Vec<_> = g
            .elements
            .iter()
            .map(|e| match e {
                Element::Atom(a) => (a.spec.kind, a.recursive),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TokenKind::Alias, false),
                (TokenKind::Keyword, false),
                (TokenKind::Range, false),
                (TokenKind::Word, true),
            ]
        );
    }

    #[test]
    fn sample_line_uses_first_alternatives() {
        let g = compile("ping (A.B.C.D|X:X::X:X) [count <1-100>]").unwrap();
        assert_eq!(g.sample_line(), "ping 10.0.0.1 count 1");
    }

    #[test]
    fn malformed_templates() {
        assert!(malformed("show (ip|ipv6").contains("unclosed"));
        assert!(malformed("show (ip|)").contains("empty alternative"));
        assert!(malformed("show ()").contains("empty alternative"));
        assert!(malformed("show ip)").contains("unexpected"));
        assert!(malformed("show (ip]").contains("does not close"));
        assert!(malformed("show <10-1>").contains("bad range"));
        assert!(malformed("show <a-b>").contains("bad range"));
        assert!(malformed("show NAME").contains("unknown placeholder"));
        assert!(malformed("show .NAME").contains("unknown placeholder"));
        assert!(malformed("show *s").contains("bad alias"));
        assert!(malformed("description LINE extra").contains("last position"));
        assert!(malformed("[detail]").contains("empty line"));
        assert!(malformed("").contains("empty line"));
        assert!(malformed("show | ip").contains("unexpected"));
    }

    #[test]
    fn malformed_spans_point_into_template() {
        match compile("show BOGUS") {
            Err(InstallError::MalformedGrammar { span, .. }) => {
                assert_eq!(span, Some(Span::new(5, 10)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mixed_case_words_are_keywords() {
        let g = compile("show IPv6").unwrap();
        match &g.elements[1] {
            Element::Atom(a) => assert_eq!(a.spec, TokenSpec::keyword("IPv6")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
