//! The matcher: resolves an input line against a mode's forest.
//!
//! Each call builds its own frontier of cursors from a [`Session`]; nothing
//! is cached on the tree. The same traversal rules back completion and
//! describe in [`crate::complete`].

use std::sync::Arc;

use cmdtree_diagnostics::{Diagnostic, Span, codes};
use tracing::trace;

use crate::command::CommandDescriptor;
use crate::flags::CliFlags;
use crate::line::{self, LineToken};
use crate::privilege::{Mode, Session};
use crate::token::{MatchRank, TokenKind, TokenSpec};
use crate::tree::{CommandTree, NodeId};

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

/// A dispatchable command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatch {
    /// The matched command.
    pub command: Arc<CommandDescriptor>,
    /// Values bound by placeholders and by keywords inside groups, in order.
    pub args: Vec<String>,
    /// Mode to enter after dispatch, reported only.
    pub target_mode: Option<Mode>,
}

/// A matched output modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifierMatch {
    /// The matched modifier.
    pub command: Arc<CommandDescriptor>,
    /// Arguments after the modifier keyword.
    pub args: Vec<String>,
    /// Byte offset of the `|` in the line.
    pub offset: usize,
}

/// What a line resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Exactly one command matches the whole line.
    Success(CommandMatch),
    /// The line is a proper prefix of at least one command.
    Incomplete,
    /// The text after `|` is not a complete modifier.
    IncompletePipe {
        /// Byte offset of the `|`.
        offset: usize,
    },
    /// The line has no command tokens.
    EmptyLine,
    /// Several candidates of equal priority accept a token.
    Ambiguous {
        /// Byte offset of the ambiguous token.
        offset: usize,
        /// The competing candidates, sorted.
        candidates: Vec<String>,
    },
    /// No candidate accepts a token.
    NoMatch {
        /// Byte offset of the first unrecognized token.
        offset: usize,
    },
    /// The session's mode has no commands.
    NoMode,
    /// A segment has too many tokens or a token is too long.
    ArgvTooLong {
        /// Byte offset of the offending token.
        offset: usize,
    },
}

/// Numeric parse status, stable for callers that log or compare codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ParseStatus {
    /// [`ParseOutcome::Success`]
    Success = 0,
    /// [`ParseOutcome::Incomplete`]
    Incomplete = 1,
    /// [`ParseOutcome::IncompletePipe`]
    IncompletePipe = 2,
    /// [`ParseOutcome::EmptyLine`]
    EmptyLine = 3,
    /// [`ParseOutcome::Ambiguous`]
    Ambiguous = 4,
    /// [`ParseOutcome::NoMatch`]
    NoMatch = 5,
    /// [`ParseOutcome::NoMode`]
    NoMode = 6,
    /// [`ParseOutcome::ArgvTooLong`]
    ArgvTooLong = 7,
}

impl ParseStatus {
    /// Lowercase name, as used in JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            ParseStatus::Success => "success",
            ParseStatus::Incomplete => "incomplete",
            ParseStatus::IncompletePipe => "incomplete_pipe",
            ParseStatus::EmptyLine => "empty_line",
            ParseStatus::Ambiguous => "ambiguous",
            ParseStatus::NoMatch => "no_match",
            ParseStatus::NoMode => "no_mode",
            ParseStatus::ArgvTooLong => "argv_too_long",
        }
    }
}

impl ParseOutcome {
    /// The numeric status of this outcome.
    pub fn status(&self) -> ParseStatus {
        match self {
            ParseOutcome::Success(_) => ParseStatus::Success,
            ParseOutcome::Incomplete => ParseStatus::Incomplete,
            ParseOutcome::IncompletePipe { .. } => ParseStatus::IncompletePipe,
            ParseOutcome::EmptyLine => ParseStatus::EmptyLine,
            ParseOutcome::Ambiguous { .. } => ParseStatus::Ambiguous,
            ParseOutcome::NoMatch { .. } => ParseStatus::NoMatch,
            ParseOutcome::NoMode => ParseStatus::NoMode,
            ParseOutcome::ArgvTooLong { .. } => ParseStatus::ArgvTooLong,
        }
    }
}

/// Result of parsing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    /// The primary outcome.
    pub outcome: ParseOutcome,
    /// The output modifier, when the line had a valid pipe segment.
    pub modifier: Option<ModifierMatch>,
    /// One diagnostic for every outcome other than success or an empty line.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// The matched command, if the line parsed.
    pub fn command(&self) -> Option<&CommandMatch> {
        match &self.outcome {
            ParseOutcome::Success(m) => Some(m),
            _ => None,
        }
    }

    /// Whether the line resolved to a command.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ParseOutcome::Success(_))
    }
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Parse `line` for `session` against `tree`.
pub fn parse(tree: &CommandTree, session: &Session, line: &str) -> ParseResult {
    let tokens = match line::tokenize(line) {
        Ok(tokens) => tokens,
        Err(too_long) => {
            return finish(
                line,
                session.mode,
                ParseOutcome::ArgvTooLong {
                    offset: too_long.offset,
                },
                None,
            );
        }
    };
    if tokens.primary.is_empty() {
        return finish(line, session.mode, ParseOutcome::EmptyLine, None);
    }
    let Some(root) = tree.root(session.mode) else {
        return finish(line, session.mode, ParseOutcome::NoMode, None);
    };

    let engine = Engine::new(tree, *session);
    let mut outcome = engine.run(root, &tokens.primary);
    let mut modifier = None;
    if let Some((offset, segment)) = &tokens.modifier {
        let matched = tree
            .modifier_root()
            .filter(|_| !segment.is_empty())
            .map(|root| engine.run(root, segment));
        match matched {
            Some(ParseOutcome::Success(m)) => {
                modifier = Some(ModifierMatch {
                    command: m.command,
                    args: m.args,
                    offset: *offset,
                });
            }
            _ => outcome = ParseOutcome::IncompletePipe { offset: *offset },
        }
    }
    finish(line, session.mode, outcome, modifier)
}

fn finish(
    line: &str,
    mode: Mode,
    outcome: ParseOutcome,
    modifier: Option<ModifierMatch>,
) -> ParseResult {
    let diagnostics = diagnose(line, mode, &outcome).into_iter().collect();
    ParseResult {
        outcome,
        modifier,
        diagnostics,
    }
}

/// Span of the whitespace-delimited token starting at `offset`.
fn token_span(line: &str, offset: usize) -> Span {
    let rest = line.get(offset..).unwrap_or_default();
    let len = rest.find(|c: char| c.is_ascii_whitespace()).unwrap_or(rest.len());
    Span::new(offset, offset + len)
}

fn diagnose(line: &str, mode: Mode, outcome: &ParseOutcome) -> Option<Diagnostic> {
    let diag = match outcome {
        ParseOutcome::Success(_) | ParseOutcome::EmptyLine => return None,
        ParseOutcome::Incomplete => Diagnostic::error(
            codes::PARSE_INCOMPLETE,
            "incomplete command",
            Some(Span::empty(line.trim_end().len())),
        ),
        ParseOutcome::IncompletePipe { offset } => Diagnostic::error(
            codes::PARSE_INCOMPLETE_PIPE,
            "incomplete output modifier",
            Some(Span::new(*offset, line.len().max(*offset))),
        ),
        ParseOutcome::Ambiguous { offset, candidates } => {
            let span = token_span(line, *offset);
            Diagnostic::error(
                codes::PARSE_AMBIGUOUS,
                format!("ambiguous command: {}", candidates.join(", ")),
                Some(span),
            )
            .with_context(ctx!(
                "token" => span.slice(line),
                "candidates" => candidates.join(","),
            ))
        }
        ParseOutcome::NoMatch { offset } => {
            let span = token_span(line, *offset);
            Diagnostic::error(
                codes::PARSE_NO_MATCH,
                format!("unrecognized command at `{}`", span.slice(line)),
                Some(span),
            )
            .with_context(ctx!("token" => span.slice(line)))
        }
        ParseOutcome::NoMode => Diagnostic::error(
            codes::PARSE_NO_MODE,
            format!("no commands installed in mode {mode}"),
            None,
        )
        .with_context(ctx!("mode" => mode.to_string())),
        ParseOutcome::ArgvTooLong { offset } => Diagnostic::error(
            codes::PARSE_ARGV_TOO_LONG,
            format!(
                "line exceeds {} tokens or a token exceeds {} bytes",
                line::MAX_TOKENS,
                line::MAX_TOKEN_LEN
            ),
            Some(token_span(line, *offset)),
        ),
    };
    Some(diag)
}

// ─── Traversal Engine ──────────────────────────────────────────────────────

/// One way of having matched the tokens so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub(crate) node: NodeId,
    /// Brace members already consumed.
    used: Vec<NodeId>,
    args: Vec<String>,
}

impl Cursor {
    pub(crate) fn at(node: NodeId) -> Self {
        Self {
            node,
            used: Vec::new(),
            args: Vec::new(),
        }
    }
}

/// A child reachable from a cursor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Candidate {
    pub(crate) node: NodeId,
    /// Reached as a member of a brace group.
    member: bool,
}

/// Result of feeding one token to a frontier.
pub(crate) enum Step {
    Advanced { frontier: Vec<Cursor>, consumed_rest: bool },
    Ambiguous(Vec<String>),
    NoMatch,
}

pub(crate) struct Engine<'t> {
    pub(crate) tree: &'t CommandTree,
    pub(crate) session: Session,
}

impl<'t> Engine<'t> {
    pub(crate) fn new(tree: &'t CommandTree, session: Session) -> Self {
        Self { tree, session }
    }

    fn node(&self, id: NodeId) -> &'t crate::tree::Node {
        // Ids come from the tree being walked.
        self.tree.node(id).expect("dangling node id")
    }

    /// The node itself, the group it returns to, and any group nodes it
    /// opens, transitively.
    fn closure(&self, start: NodeId) -> Vec<NodeId> {
        let mut seen = vec![start];
        let mut i = 0;
        while i < seen.len() {
            let node = self.node(seen[i]);
            i += 1;
            let returns = node.group.into_iter();
            let opens = node.children.iter().copied().filter(|&c| {
                let child = self.node(c);
                child.is_group() && self.session.can_traverse(child.privilege)
            });
            for next in returns.chain(opens) {
                if !seen.contains(&next) {
                    seen.push(next);
                }
            }
        }
        seen
    }

    /// Every position the next token may match from `cursor`.
    pub(crate) fn candidates(&self, cursor: &Cursor) -> Vec<Candidate> {
        let mut out: Vec<Candidate> = Vec::new();
        let current = self.node(cursor.node);
        if current.flags.contains(CliFlags::RECURSIVE) || current.spec.kind == TokenKind::Line {
            out.push(Candidate {
                node: cursor.node,
                member: false,
            });
        }
        for at in self.closure(cursor.node) {
            let node = self.node(at);
            let member = node.is_group();
            for &c in &node.children {
                let child = self.node(c);
                if child.is_group()
                    || (member && cursor.used.contains(&c))
                    || !self.session.can_traverse(child.privilege)
                    || out.iter().any(|o| o.node == c)
                {
                    continue;
                }
                out.push(Candidate { node: c, member });
            }
        }
        out
    }

    /// Commands complete at `cursor`, with the privilege to run them.
    pub(crate) fn leaves(&self, cursor: &Cursor) -> Vec<Arc<CommandDescriptor>> {
        let mut out: Vec<Arc<CommandDescriptor>> = Vec::new();
        for at in self.closure(cursor.node) {
            let node = self.node(at);
            if let Some(leaf) = &node.leaf
                && self.session.can_traverse(node.leaf_privilege)
                && !out.iter().any(|l| Arc::ptr_eq(l, leaf))
            {
                out.push(Arc::clone(leaf));
            }
        }
        out
    }

    /// Feed `token` (followed by `rest`) to every cursor of `frontier`.
    pub(crate) fn step(&self, frontier: &[Cursor], token: &str, rest: &[LineToken]) -> Step {
        let mut matches: Vec<(MatchRank, &Cursor, Candidate)> = Vec::new();
        for cursor in frontier {
            for cand in self.candidates(cursor) {
                let node = self.node(cand.node);
                let allow_plus = !node.flags.contains(CliFlags::PLUS_SIGN_FORBIDDEN);
                if let Some(rank) = node.spec.matches(token, allow_plus) {
                    matches.push((rank, cursor, cand));
                }
            }
        }
        let Some(best) = matches.iter().map(|(rank, ..)| *rank).max() else {
            trace!(token, "no candidate");
            return Step::NoMatch;
        };
        matches.retain(|(rank, ..)| *rank == best);

        let mut specs: Vec<&TokenSpec> = Vec::new();
        for (_, _, cand) in &matches {
            let spec = &self.node(cand.node).spec;
            if !specs.contains(&spec) {
                specs.push(spec);
            }
        }
        if specs.len() > 1 {
            let mut names: Vec<String> = specs.iter().map(|s| s.display().to_string()).collect();
            names.sort();
            names.dedup();
            trace!(token, ?names, "ambiguous");
            return Step::Ambiguous(names);
        }

        let mut next: Vec<Cursor> = Vec::new();
        let mut consumed_rest = false;
        for (rank, cursor, cand) in matches {
            let node = self.node(cand.node);
            let mut advanced = cursor.clone();
            advanced.node = cand.node;
            if cand.member {
                advanced.used.push(cand.node);
            }
            match node.spec.kind {
                TokenKind::Line => {
                    advanced.args.push(token.to_string());
                    advanced.args.extend(rest.iter().map(|t| t.text.clone()));
                    consumed_rest = true;
                }
                kind if kind.is_literal() => {
                    if node.flags.intersects(CliFlags::POSITIONAL) {
                        advanced.args.push(node.spec.canonical().to_string());
                    }
                }
                _ => advanced.args.push(token.to_string()),
            }
            trace!(token, ?rank, node = %node.spec, "matched");
            if !next.contains(&advanced) {
                next.push(advanced);
            }
        }
        Step::Advanced {
            frontier: next,
            consumed_rest,
        }
    }

    /// Match every token from `root` and resolve the end position.
    pub(crate) fn run(&self, root: NodeId, tokens: &[LineToken]) -> ParseOutcome {
        let mut frontier = vec![Cursor::at(root)];
        for (i, token) in tokens.iter().enumerate() {
            match self.step(&frontier, &token.text, &tokens[i + 1..]) {
                Step::NoMatch => {
                    return ParseOutcome::NoMatch {
                        offset: token.start,
                    };
                }
                Step::Ambiguous(candidates) => {
                    return ParseOutcome::Ambiguous {
                        offset: token.start,
                        candidates,
                    };
                }
                Step::Advanced {
                    frontier: next,
                    consumed_rest,
                } => {
                    frontier = next;
                    if consumed_rest {
                        break;
                    }
                }
            }
        }
        self.resolve(&frontier, tokens.last().map_or(0, |t| t.start))
    }

    fn resolve(&self, frontier: &[Cursor], last_offset: usize) -> ParseOutcome {
        let mut found: Vec<(Arc<CommandDescriptor>, &Cursor)> = Vec::new();
        for cursor in frontier {
            for leaf in self.leaves(cursor) {
                if !found.iter().any(|(l, _)| Arc::ptr_eq(l, &leaf)) {
                    found.push((leaf, cursor));
                }
            }
        }
        match found.as_slice() {
            [] => ParseOutcome::Incomplete,
            [(command, cursor)] => ParseOutcome::Success(CommandMatch {
                command: Arc::clone(command),
                args: cursor.args.clone(),
                target_mode: command.target_mode,
            }),
            many => {
                let mut candidates: Vec<String> =
                    many.iter().map(|(l, _)| l.template.clone()).collect();
                candidates.sort();
                ParseOutcome::Ambiguous {
                    offset: last_offset,
                    candidates,
                }
            }
        }
    }
}
