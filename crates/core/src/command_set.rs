//! Declarative command sets: modes, commands, and modifiers in one JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::CommandDescriptor;
use crate::error::{InstallError, LoadError};
use crate::flags::CliFlags;
use crate::privilege::{Mode, Privilege};
use crate::tree::CommandTree;

/// A mode referenced by numeric id or by declared name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModeRef {
    /// Numeric mode id.
    Id(u32),
    /// Name of a declared mode.
    Name(String),
}

/// A declared mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDecl {
    /// Numeric id used by sessions.
    pub id: u32,
    /// Name other entries refer to.
    pub name: String,
    /// Prompt suffix shown by shells, e.g. `(config)#`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Mode that `exit` returns to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ModeRef>,
    /// Install `exit`, `quit`, and `end` into this mode.
    #[serde(default)]
    pub defaults: bool,
}

/// A command and the modes it is installed into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    /// Grammar template.
    pub template: String,
    /// Symbolic callback name.
    pub handler: String,
    /// Modes to install into.
    pub modes: Vec<ModeRef>,
    /// Help strings, one per position, or none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub help: Vec<String>,
    /// Required privilege; defaults to normal.
    #[serde(default)]
    pub privilege: Privilege,
    /// Only shown to advanced sessions.
    #[serde(default)]
    pub hidden: bool,
    /// Explicit key; otherwise derived from the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<u32>,
    /// Command flags, e.g. `"MODIFIER | NO_PAGER"`.
    #[serde(default)]
    pub flags: CliFlags,
    /// Mode entered after dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mode: Option<ModeRef>,
    /// Owning module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Configuration data-type tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<u16>,
    /// For shortcuts: the line this command stands for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion: Option<String>,
}

/// An output modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierEntry {
    /// Grammar template.
    pub template: String,
    /// Symbolic callback name.
    pub handler: String,
    /// Help strings, one per position, or none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub help: Vec<String>,
    /// Required privilege; defaults to normal.
    #[serde(default)]
    pub privilege: Privilege,
}

/// A configuration writer registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterEntry {
    /// Mode the writer belongs to.
    pub mode: ModeRef,
    /// Symbolic writer name.
    pub handler: String,
}

fn default_true() -> bool {
    true
}

/// A complete command set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSet {
    /// Declared modes.
    #[serde(default)]
    pub modes: Vec<ModeDecl>,
    /// Commands.
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
    /// Extra output modifiers.
    #[serde(default)]
    pub modifiers: Vec<ModifierEntry>,
    /// Install the standard modifier set.
    #[serde(default = "default_true")]
    pub standard_modifiers: bool,
    /// Configuration writers.
    #[serde(default)]
    pub config_writers: Vec<WriterEntry>,
}

impl CommandSet {
    /// Parse a command set from JSON text.
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a command-set file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Declared mode with the given name.
    pub fn mode_named(&self, name: &str) -> Option<&ModeDecl> {
        self.modes.iter().find(|m| m.name == name)
    }

    /// Declared mode with the given id.
    pub fn mode_by_id(&self, id: Mode) -> Option<&ModeDecl> {
        self.modes.iter().find(|m| m.id == id.0)
    }

    /// Resolve a reference; ids need not be declared, names must be.
    pub fn resolve(&self, mode: &ModeRef) -> Result<Mode, LoadError> {
        match mode {
            ModeRef::Id(id) => Ok(Mode(*id)),
            ModeRef::Name(name) => self
                .mode_named(name)
                .map(|m| Mode(m.id))
                .ok_or_else(|| LoadError::UnknownMode { name: name.clone() }),
        }
    }

    /// Install everything into a fresh, sorted tree.
    pub fn build(&self) -> Result<CommandTree, LoadError> {
        let mut tree = CommandTree::new();
        let wrap = |template: &str| {
            let template = template.to_string();
            move |source: InstallError| LoadError::Install { template, source }
        };

        for decl in self.modes.iter().filter(|m| m.defaults) {
            tree.install_defaults(Mode(decl.id)).map_err(wrap("exit"))?;
        }

        for entry in &self.commands {
            let descriptor = self.descriptor(entry)?;
            let modes = entry
                .modes
                .iter()
                .map(|m| self.resolve(m))
                .collect::<Result<Vec<_>, _>>()?;
            tree.install_family(&modes, descriptor, entry.privilege)
                .map_err(wrap(&entry.template))?;
        }

        if self.standard_modifiers {
            tree.install_standard_modifiers()
                .map_err(wrap("standard modifiers"))?;
        }
        for entry in &self.modifiers {
            let descriptor = CommandDescriptor::builder(&entry.template, &entry.handler)
                .help(entry.help.iter().cloned())
                .build();
            tree.install_modifier(descriptor, entry.privilege)
                .map_err(wrap(&entry.template))?;
        }

        for writer in &self.config_writers {
            tree.install_config_writer(self.resolve(&writer.mode)?, &writer.handler);
        }

        tree.sort();
        debug!(
            modes = tree.modes().count(),
            commands = self.commands.len(),
            nodes = tree.node_count(),
            "built command tree"
        );
        Ok(tree)
    }

    fn descriptor(&self, entry: &CommandEntry) -> Result<CommandDescriptor, LoadError> {
        let mut builder = CommandDescriptor::builder(&entry.template, &entry.handler)
            .help(entry.help.iter().cloned())
            .flags(entry.flags);
        if entry.hidden {
            builder = builder.flags(CliFlags::HIDDEN);
        }
        if let Some(key) = entry.key {
            builder = builder.key(key);
        }
        if let Some(target) = &entry.target_mode {
            builder = builder.target_mode(self.resolve(target)?);
        }
        if let Some(module) = &entry.module {
            builder = builder.module(module);
        }
        if let Some(tag) = entry.data_type {
            builder = builder.data_type(tag);
        }
        if let Some(line) = &entry.expansion {
            builder = builder.expansion(line);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET: &str = r#"{
        "modes": [
            {"id": 1, "name": "exec", "prompt": ">"},
            {"id": 2, "name": "config", "prompt": "(config)#", "parent": "exec", "defaults": true}
        ],
        "commands": [
            {"template": "configure terminal", "handler": "config_terminal",
             "modes": ["exec"], "target_mode": "config",
             "help": ["Enter configuration mode", "From the terminal"]},
            {"template": "hostname WORD", "handler": "hostname", "modes": ["config"], "privilege": 15},
            {"template": "show version", "handler": "show_version", "modes": ["exec", "config"],
             "flags": "MODIFIER"}
        ],
        "config_writers": [{"mode": "config", "handler": "hostname_write"}]
    }"#;

    #[test]
    fn builds_modes_commands_and_writers() {
        let set = CommandSet::from_json(SET).unwrap();
        assert!(set.standard_modifiers);
        let tree = set.build().unwrap();
        assert_eq!(tree.modes().collect::<Vec<_>>(), [Mode(1), Mode(2)]);
        assert!(tree.lookup(Mode(2), &["exit"]).is_some());
        assert!(tree.lookup(Mode(1), &["exit"]).is_none());
        assert_eq!(tree.modifiers().len(), 6);

        let configure = tree.commands(Mode(1))
            .into_iter()
            .find(|d| d.handler == "config_terminal")
            .unwrap();
        assert_eq!(configure.target_mode, Some(Mode(2)));

        let hostname = tree.lookup(Mode(2), &["hostname"]).unwrap();
        assert_eq!(tree.node(hostname).unwrap().privilege(), Privilege(15));

        let writers: Vec<_> = tree.config_writers().collect();
        assert_eq!(writers, [(Mode(2), ["hostname_write".to_string()].as_slice())]);
    }

    #[test]
    fn shared_commands_are_one_descriptor() {
        let tree = CommandSet::from_json(SET).unwrap().build().unwrap();
        let a = tree.commands(Mode(1)).into_iter().find(|d| d.handler == "show_version").unwrap();
        let b = tree.commands(Mode(2)).into_iter().find(|d| d.handler == "show_version").unwrap();
        assert!(std::sync::Arc::ptr_eq(&a, &b));
        assert!(a.allows_modifier());
    }

    #[test]
    fn unknown_mode_names_fail() {
        let set = CommandSet::from_json(
            r#"{"commands": [{"template": "x", "handler": "x", "modes": ["nowhere"]}]}"#,
        )
        .unwrap();
        assert!(matches!(set.build(), Err(LoadError::UnknownMode { name }) if name == "nowhere"));
    }

    #[test]
    fn install_errors_name_the_template() {
        let set = CommandSet::from_json(
            r#"{"commands": [
                {"template": "show ip", "handler": "a", "modes": [1]},
                {"template": "show ip", "handler": "b", "modes": [1]}
            ]}"#,
        )
        .unwrap();
        match set.build() {
            Err(LoadError::Install { template, source }) => {
                assert_eq!(template, "show ip");
                assert!(matches!(source, InstallError::DuplicateCommand { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn load_reports_missing_files() {
        let err = CommandSet::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn load_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.json");
        std::fs::write(&path, SET).unwrap();
        let set = CommandSet::load(&path).unwrap();
        assert_eq!(set.commands.len(), 3);
        assert_eq!(set.mode_named("config").map(|m| m.id), Some(2));
        assert_eq!(set.mode_by_id(Mode(1)).map(|m| m.name.as_str()), Some("exec"));
    }
}
