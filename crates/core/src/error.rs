//! Typed errors for installation and command-set loading.

use std::io;
use std::path::PathBuf;

use cmdtree_diagnostics::{Diagnostic, Span, codes};

use crate::privilege::Mode;

/// Why a command could not be installed, uninstalled, or flagged.
///
/// A failed operation leaves the tree exactly as it was.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstallError {
    /// Another command already terminates at the same position.
    #[error("duplicate command{}: {template}", scope(.mode))]
    DuplicateCommand {
        /// Mode the command was installed into; `None` for the modifier tree.
        mode: Option<Mode>,
        /// Template of the rejected command.
        template: String,
    },

    /// The template could not be compiled.
    #[error("malformed grammar `{template}`: {reason}")]
    MalformedGrammar {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
        /// Byte range of the problem inside the template.
        span: Option<Span>,
    },

    /// The help list is neither empty nor one entry per position.
    #[error("help mismatch for `{template}`: expected {expected} strings, found {found}")]
    HelpMismatch {
        /// Template of the rejected command.
        template: String,
        /// Number of keyword and placeholder positions.
        expected: usize,
        /// Number of help strings supplied.
        found: usize,
    },

    /// Uninstall or flagging of a path that is not installed.
    #[error("unknown command{}: {template}", scope(.mode))]
    UnknownCommand {
        /// Mode that was searched; `None` for the modifier tree.
        mode: Option<Mode>,
        /// Template that was looked up.
        template: String,
    },
}

fn scope(mode: &Option<Mode>) -> String {
    match mode {
        Some(mode) => format!(" in mode {mode}"),
        None => " in the modifier tree".to_string(),
    }
}

impl InstallError {
    /// Stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            InstallError::DuplicateCommand { .. } => codes::INSTALL_DUPLICATE_COMMAND,
            InstallError::MalformedGrammar { .. } => codes::INSTALL_MALFORMED_GRAMMAR,
            InstallError::HelpMismatch { .. } => codes::INSTALL_HELP_MISMATCH,
            InstallError::UnknownCommand { .. } => codes::INSTALL_UNKNOWN_COMMAND,
        }
    }

    /// Render as an error diagnostic; spans point into the template.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let span = match self {
            InstallError::MalformedGrammar { span, .. } => *span,
            _ => None,
        };
        Diagnostic::error(self.code(), self.to_string(), span)
    }
}

/// Why a command-set file could not be turned into a tree.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}", .path.display())]
    Io {
        /// Path that was opened.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The file is not a valid command set.
    #[error("invalid command set: {0}")]
    Json(#[from] serde_json::Error),

    /// A command or writer names a mode the set does not declare.
    #[error("unknown mode `{name}`")]
    UnknownMode {
        /// The unresolved mode name.
        name: String,
    },

    /// A command was rejected by the installer.
    #[error("cannot install `{template}`")]
    Install {
        /// Template of the failing command.
        template: String,
        /// The installer's reason.
        #[source]
        source: InstallError,
    },
}

impl LoadError {
    /// Stable diagnostic code, when the failure has one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            LoadError::UnknownMode { .. } => Some(codes::INSTALL_UNKNOWN_MODE),
            LoadError::Install { source, .. } => Some(source.code()),
            LoadError::Io { .. } | LoadError::Json(_) => None,
        }
    }
}
