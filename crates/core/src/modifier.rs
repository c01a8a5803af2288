//! Output modifiers: the grammar that may follow a `|`.
//!
//! Modifiers live in one global tree, independent of modes, and are matched
//! with the same rules as commands. Whether the primary command accepts a
//! modifier ([`CliFlags::MODIFIER`](crate::CliFlags::MODIFIER)) is reported
//! to the dispatcher, not enforced here.

use std::sync::Arc;

use crate::command::CommandDescriptor;
use crate::error::InstallError;
use crate::privilege::Privilege;
use crate::tree::{CommandTree, Forest};

/// The standard modifier set: template, handler, help.
pub const STANDARD_MODIFIERS: &[(&str, &str, &[&str])] = &[
    ("begin LINE", "modifier_begin", &["Begin with the line that matches", "Regular expression"]),
    ("include LINE", "modifier_include", &["Include lines that match", "Regular expression"]),
    ("exclude LINE", "modifier_exclude", &["Exclude lines that match", "Regular expression"]),
    ("grep LINE", "modifier_grep", &["Lines that match, grep syntax", "Search pattern"]),
    ("count", "modifier_count", &["Count the number of lines"]),
    ("redirect WORD", "modifier_redirect", &["Redirect output to a file", "Output file name"]),
];

impl CommandTree {
    /// Install an output modifier into the global modifier tree.
    pub fn install_modifier(
        &mut self,
        descriptor: CommandDescriptor,
        privilege: Privilege,
    ) -> Result<Arc<CommandDescriptor>, InstallError> {
        let descriptor = Arc::new(descriptor);
        self.install_into(Forest::Modifiers, Arc::clone(&descriptor), privilege)?;
        Ok(descriptor)
    }

    /// Install `begin`, `include`, `exclude`, `grep`, `count`, and `redirect`.
    pub fn install_standard_modifiers(&mut self) -> Result<(), InstallError> {
        for &(template, handler, help) in STANDARD_MODIFIERS {
            let descriptor = CommandDescriptor::builder(template, handler)
                .help(help.iter().copied())
                .build();
            self.install_modifier(descriptor, Privilege::MIN)?;
        }
        Ok(())
    }

    /// Remove an output modifier.
    pub fn uninstall_modifier(
        &mut self,
        template: &str,
    ) -> Result<Arc<CommandDescriptor>, InstallError> {
        self.uninstall_from(Forest::Modifiers, template)
    }
}

#[cfg(test)]
mod tests {
    use crate::matcher::{ParseOutcome, parse};
    use crate::privilege::{Mode, Session};

    use super::*;

    fn tree() -> CommandTree {
        let mut tree = CommandTree::new();
        tree.install(
            Mode(1),
            CommandDescriptor::builder("show running-config", "show_run").build(),
            Privilege::MIN,
        )
        .unwrap();
        tree.install_standard_modifiers().unwrap();
        tree
    }

    #[test]
    fn standard_modifiers_live_outside_modes() {
        let mut tree = CommandTree::new();
        tree.install_standard_modifiers().unwrap();
        assert!(tree.modes().next().is_none());
        let names: Vec<_> = tree.modifiers().iter().map(|d| d.template.clone()).collect();
        assert_eq!(names.len(), STANDARD_MODIFIERS.len());
        tree.uninstall_modifier("count").unwrap();
        assert_eq!(tree.modifiers().len(), STANDARD_MODIFIERS.len() - 1);
        assert!(tree.install_standard_modifiers().is_err());
    }

    #[test]
    fn modifier_segment_gets_its_own_arguments() {
        let tree = tree();
        let s = Session::new(Mode(1), Privilege::MIN);
        let r = parse(&tree, &s, "show running-config | include interface eth0");
        assert!(r.is_success());
        assert!(r.command().unwrap().args.is_empty());
        let m = r.modifier.unwrap();
        assert_eq!(m.command.handler, "modifier_include");
        assert_eq!(m.args, ["interface", "eth0"]);
        assert_eq!(m.offset, 20);
    }

    #[test]
    fn bad_or_missing_modifier_is_incomplete_pipe() {
        let tree = tree();
        let s = Session::new(Mode(1), Privilege::MIN);
        for line in [
            "show running-config | frobnicate",
            "show running-config | include",
            "show running-config |",
        ] {
            let r = parse(&tree, &s, line);
            assert_eq!(r.outcome, ParseOutcome::IncompletePipe { offset: 20 }, "{line}");
            assert!(r.modifier.is_none());
        }
    }

    #[test]
    fn modifier_failure_overrides_primary_outcome() {
        let tree = tree();
        let s = Session::new(Mode(1), Privilege::MIN);
        let r = parse(&tree, &s, "show | bogus");
        assert_eq!(r.outcome, ParseOutcome::IncompletePipe { offset: 5 });
    }
}
