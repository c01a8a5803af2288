//! Command-tree core for router configuration shells.
//!
//! Commands are declared as grammar templates such as
//! `show ip bgp [neighbors A.B.C.D]` and installed into a per-mode
//! [`CommandTree`]. The main entry points are [`CommandTree::install`] for
//! registration, [`parse`] for resolving a line to a command and its
//! arguments, and [`complete`] / [`describe`] for tab completion and `?` help.
//! [`CommandSet`] loads a whole tree from JSON.

#![warn(missing_docs)]

/// Typed conversions for bound arguments.
pub mod args;
/// Command descriptors and their builder.
pub mod command;
/// JSON command-set files.
pub mod command_set;
/// Tab completion and context help.
pub mod complete;
/// Installation and loading errors.
pub mod error;
/// Command and node flags.
pub mod flags;
/// Grammar templates: lexer, parser, and compiled form.
pub mod grammar;
/// Input-line tokenizer.
pub mod line;
/// Line matching against the tree.
pub mod matcher;
/// Output modifiers after `|`.
pub mod modifier;
/// Modes, privilege levels, and sessions.
pub mod privilege;
/// Token kinds and per-kind matching.
pub mod token;
/// The command forest and its installer.
pub mod tree;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Tree and registration
pub use command::{CommandBuilder, CommandDescriptor, CommandStatus};
pub use command_set::{CommandSet, ModeRef};
pub use flags::CliFlags;
pub use privilege::{Mode, Privilege, Session};
pub use tree::{CommandTree, Node, NodeId};

// Matching
pub use complete::{Completion, Description, complete, describe};
pub use matcher::{CommandMatch, ModifierMatch, ParseOutcome, ParseResult, ParseStatus, parse};
pub use token::{MatchRank, TokenKind, TokenSpec};

// Errors
pub use args::ArgError;
pub use error::{InstallError, LoadError};

// Diagnostics (re-exported from the diagnostics crate)
pub use cmdtree_diagnostics::{Diagnostic, Severity, Span, codes};
