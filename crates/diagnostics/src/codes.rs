//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. Parser outcomes live in the `CLI1xxx` range and
//! installation failures in the `CLI2xxx` range.

// ── Parse outcomes ──────────────────────────────────────────────────────

/// No command at this position accepts the token.
pub const PARSE_NO_MATCH: &str = "CLI1001";
/// Two or more equally ranked commands accept the token.
pub const PARSE_AMBIGUOUS: &str = "CLI1002";
/// The line is a valid prefix but does not name a complete command.
pub const PARSE_INCOMPLETE: &str = "CLI1003";
/// The output modifier after `|` is missing or does not parse.
pub const PARSE_INCOMPLETE_PIPE: &str = "CLI1004";
/// The session's mode has no installed commands.
pub const PARSE_NO_MODE: &str = "CLI1005";
/// The line exceeds the token-count or token-length capacity.
pub const PARSE_ARGV_TOO_LONG: &str = "CLI1006";

// ── Installation ────────────────────────────────────────────────────────

/// A command with the same grammar is already bound at this position.
pub const INSTALL_DUPLICATE_COMMAND: &str = "CLI2001";
/// The grammar string is not well formed.
pub const INSTALL_MALFORMED_GRAMMAR: &str = "CLI2002";
/// The number of help strings does not match the grammar's token count.
pub const INSTALL_HELP_MISMATCH: &str = "CLI2003";
/// The referenced command is not installed.
pub const INSTALL_UNKNOWN_COMMAND: &str = "CLI2004";
/// A command's canonical line resolves to a different command.
pub const INSTALL_SHADOWED_COMMAND: &str = "CLI2005";
/// A command set references a mode that it does not declare.
pub const INSTALL_UNKNOWN_MODE: &str = "CLI2006";
