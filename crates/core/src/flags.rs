//! Flag set shared by command descriptors and tree nodes.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Behavioral flags of a command or of a tree node.
    ///
    /// Descriptors carry the flags their installer passed in; nodes carry
    /// the subset that affects traversal (`HIDDEN`, `PAREN`, `TRAVERSE`,
    /// `RECURSIVE`, `SHOW`, `IFNAME`, `PLUS_SIGN_FORBIDDEN`). In JSON they
    /// serialize as `"HIDDEN | MODIFIER"`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CliFlags: u16 {
        /// Excluded from completion and describe unless the session is advanced.
        const HIDDEN = 1 << 0;
        /// The command accepts an output modifier after `|`.
        const MODIFIER = 1 << 1;
        /// The node is a `show` keyword (or an alias of it).
        const SHOW = 1 << 2;
        /// The node sits inside a `( )` or `[ ]` group; its keyword is bound as an argument.
        const PAREN = 1 << 3;
        /// The node sits inside a `{ }` group; its keyword is bound as an argument.
        const TRAVERSE = 1 << 4;
        /// The node may match several consecutive tokens (`.WORD`, `LINE`).
        const RECURSIVE = 1 << 5;
        /// Execute locally before forwarding to the configuration manager.
        const LOCAL_FIRST = 1 << 6;
        /// Output is never paged.
        const NO_PAGER = 1 << 7;
        /// The node matches interface names.
        const IFNAME = 1 << 8;
        /// Only available to the management interface.
        const MGMT_ONLY = 1 << 9;
        /// Ignore downstream protocol-module errors.
        const IGNORE_DOWNSTREAM_ERR = 1 << 10;
        /// Broadcast to every module, regardless of individual failures.
        const BROADCAST = 1 << 11;
        /// Numeric values may not carry a leading `+`.
        const PLUS_SIGN_FORBIDDEN = 1 << 12;
    }
}

impl CliFlags {
    /// Flags a range node takes from the command that created it.
    pub(crate) const NODE_INHERITED: CliFlags = CliFlags::PLUS_SIGN_FORBIDDEN;

    /// Group-membership flags: a keyword inside a group binds an argument,
    /// the same keyword outside does not.
    pub(crate) const POSITIONAL: CliFlags = CliFlags::PAREN.union(CliFlags::TRAVERSE);

    /// Flags compared when deciding whether two commands share a node.
    pub(crate) const IDENTITY: CliFlags = CliFlags::POSITIONAL.union(CliFlags::NODE_INHERITED);
}
