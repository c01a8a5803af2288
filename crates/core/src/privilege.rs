//! Modes, privilege levels, and the per-request session parameters.

use serde::{Deserialize, Serialize};

/// Identifier of a configuration mode.
///
/// Modes are opaque to the core: each one keys its own command forest and
/// the core never transitions between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(pub u32);

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access level of a session or the level required to traverse a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Privilege(pub u8);

impl Privilege {
    /// Lowest privilege level.
    pub const MIN: Privilege = Privilege(1);
    /// Level of an ordinary operator session.
    pub const NORMAL: Privilege = Privilege::MIN;
    /// Highest level inside a virtual router.
    pub const VR_MAX: Privilege = Privilege(15);
    /// Highest level on the physical router.
    pub const PVR_MAX: Privilege = Privilege(16);

    /// Whether a session at this level may traverse a node requiring `required`.
    pub fn permits(self, required: Privilege) -> bool {
        required <= self
    }
}

impl Default for Privilege {
    fn default() -> Self {
        Privilege::NORMAL
    }
}

impl std::fmt::Display for Privilege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who is asking: the mode, privilege, and visibility settings for one request.
///
/// A `Session` is cheap to copy and carries no parse state; each call to
/// [`parse`](crate::parse), [`complete`](crate::complete), or
/// [`describe`](crate::describe) builds its own working state from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Mode whose forest is searched.
    pub mode: Mode,
    /// Privilege of the requester.
    pub privilege: Privilege,
    /// Advanced mode bypasses the privilege ceiling and reveals hidden commands.
    pub advanced: bool,
}

impl Session {
    /// Session in `mode` at `privilege`, not advanced.
    pub fn new(mode: Mode, privilege: Privilege) -> Self {
        Self {
            mode,
            privilege,
            advanced: false,
        }
    }

    /// Enable or disable advanced mode (builder pattern).
    pub fn with_advanced(mut self, advanced: bool) -> Self {
        self.advanced = advanced;
        self
    }

    /// The privilege gate: `required <= session privilege`, unless advanced.
    pub fn can_traverse(&self, required: Privilege) -> bool {
        self.advanced || self.privilege.permits(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_is_inclusive() {
        let s = Session::new(Mode(0), Privilege(5));
        assert!(s.can_traverse(Privilege(1)));
        assert!(s.can_traverse(Privilege(5)));
        assert!(!s.can_traverse(Privilege(6)));
    }

    #[test]
    fn advanced_bypasses_ceiling() {
        let s = Session::new(Mode(0), Privilege::MIN).with_advanced(true);
        assert!(s.can_traverse(Privilege::PVR_MAX));
    }

    #[test]
    fn level_constants_are_ordered() {
        assert!(Privilege::MIN <= Privilege::NORMAL);
        assert!(Privilege::NORMAL < Privilege::VR_MAX);
        assert!(Privilege::VR_MAX < Privilege::PVR_MAX);
        assert_eq!(Privilege::default(), Privilege::NORMAL);
    }
}
