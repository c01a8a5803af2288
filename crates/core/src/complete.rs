//! Tab completion and `?` help.
//!
//! Both walk every token but the last with the matcher's rules, then list
//! the positions the last (possibly empty) token could still become.

use serde::Serialize;

use crate::line;
use crate::matcher::{Cursor, Engine, Step};
use crate::privilege::Session;
use crate::token::TokenKind;
use crate::tree::CommandTree;

/// Describe entry shown when the line is already a complete command.
pub const CR: &str = "<cr>";
/// Describe entry shown when the complete command accepts output modifiers.
pub const PIPE: &str = "|";

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// Keyword text, or the placeholder pattern for value positions.
    pub text: String,
    /// Whether `text` can be inserted literally.
    pub is_literal: bool,
}

/// One context-help entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Description {
    /// Keyword, placeholder, `<cr>`, or `|`.
    pub token: String,
    /// Help text; empty when none was installed.
    pub help: String,
}

/// Sort class: literals, placeholders, then the `<cr>` and `|` markers.
fn class(kind: Option<TokenKind>) -> u8 {
    kind.map_or(2, |k| if k.is_literal() { 0 } else { 1 })
}

/// Where the last token of a partial line sits.
struct Position<'t> {
    engine: Engine<'t>,
    frontier: Vec<Cursor>,
    last: String,
    in_modifier: bool,
}

fn position<'t>(tree: &'t CommandTree, session: &Session, partial: &str) -> Option<Position<'t>> {
    let tokens = line::tokenize(partial).ok()?;
    let (root, mut segment, in_modifier) = match tokens.modifier {
        Some((_, segment)) => (tree.modifier_root()?, segment, true),
        None => (tree.root(session.mode)?, tokens.primary, false),
    };
    let last = if line::ends_open(partial) {
        String::new()
    } else {
        segment.pop().map(|t| t.text).unwrap_or_default()
    };

    let engine = Engine::new(tree, *session);
    let mut frontier = vec![Cursor::at(root)];
    for (i, token) in segment.iter().enumerate() {
        match engine.step(&frontier, &token.text, &segment[i + 1..]) {
            Step::Advanced {
                frontier: next,
                consumed_rest,
            } => {
                frontier = next;
                if consumed_rest {
                    break;
                }
            }
            Step::Ambiguous(_) | Step::NoMatch => return None,
        }
    }
    Some(Position {
        engine,
        frontier,
        last,
        in_modifier,
    })
}

impl Position<'_> {
    /// Nodes consistent with the last token, visibility applied.
    fn visible_candidates(&self) -> Vec<&crate::tree::Node> {
        let advanced = self.engine.session.advanced;
        let mut out: Vec<&crate::tree::Node> = Vec::new();
        for cursor in &self.frontier {
            for cand in self.engine.candidates(cursor) {
                let Some(node) = self.engine.tree.node(cand.node) else {
                    continue;
                };
                let shown = advanced || (!node.is_hidden() && node.spec.kind != TokenKind::Alias);
                if shown && node.spec.matches_prefix(&self.last) {
                    out.push(node);
                }
            }
        }
        out
    }
}

/// Completion candidates for the last token of `partial`.
///
/// Hidden commands and aliases are only offered in advanced sessions.
/// Literals come first, then placeholders, each sorted lexicographically.
pub fn complete(tree: &CommandTree, session: &Session, partial: &str) -> Vec<Completion> {
    let Some(pos) = position(tree, session, partial) else {
        return Vec::new();
    };
    let mut out: Vec<(u8, Completion)> = pos
        .visible_candidates()
        .into_iter()
        .map(|node| {
            (
                class(Some(node.spec.kind)),
                Completion {
                    text: node.spec.display().to_string(),
                    is_literal: node.spec.kind.is_literal(),
                },
            )
        })
        .collect();
    out.sort_by(|a, b| (a.0, &a.1.text).cmp(&(b.0, &b.1.text)));
    out.dedup_by(|a, b| a.1.text == b.1.text);
    out.into_iter().map(|(_, c)| c).collect()
}

/// Context help for the last token of `partial`; a trailing `?` is ignored.
///
/// Adds `<cr>` when the line before the last token is already a complete
/// command and `|` when that command accepts output modifiers.
pub fn describe(tree: &CommandTree, session: &Session, partial: &str) -> Vec<Description> {
    let partial = partial.strip_suffix('?').unwrap_or(partial);
    let Some(pos) = position(tree, session, partial) else {
        return Vec::new();
    };
    let mut out: Vec<(u8, Description)> = pos
        .visible_candidates()
        .into_iter()
        .map(|node| {
            (
                class(Some(node.spec.kind)),
                Description {
                    token: node.spec.display().to_string(),
                    help: node.help.clone().unwrap_or_default(),
                },
            )
        })
        .collect();

    if pos.last.is_empty() {
        let advanced = pos.engine.session.advanced;
        let leaves: Vec<_> = pos
            .frontier
            .iter()
            .flat_map(|c| pos.engine.leaves(c))
            .filter(|l| advanced || !l.is_hidden())
            .collect();
        if !leaves.is_empty() {
            out.push((class(None), Description {
                token: CR.to_string(),
                help: String::new(),
            }));
        }
        if !pos.in_modifier && leaves.iter().any(|l| l.allows_modifier()) {
            out.push((class(None), Description {
                token: PIPE.to_string(),
                help: "Output modifiers".to_string(),
            }));
        }
    }

    out.sort_by(|a, b| (a.0, &a.1.token).cmp(&(b.0, &b.1.token)));
    out.dedup_by(|a, b| a.1.token == b.1.token);
    out.into_iter().map(|(_, d)| d).collect()
}
