//! Command descriptors: the metadata bound to a terminal tree position.

use serde::{Deserialize, Serialize};

use crate::flags::CliFlags;
use crate::privilege::Mode;

/// Everything the dispatcher needs to know about an installed command.
///
/// The core never invokes `handler`; it hands the descriptor back from a
/// successful parse and the dispatcher resolves the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Grammar template, e.g. `show ip route [A.B.C.D]`.
    pub template: String,
    /// Symbolic callback name.
    pub handler: String,
    /// Help strings, one per keyword or placeholder in template order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub help: Vec<String>,
    /// Stable numeric key.
    pub key: u32,
    /// Behavioral flags.
    #[serde(default)]
    pub flags: CliFlags,
    /// Owning protocol module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Mode the session enters after a successful dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mode: Option<Mode>,
    /// Configuration data-type tag, opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<u16>,
    /// For shortcuts: the full line the shortcut stands for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion: Option<String>,
}

impl CommandDescriptor {
    /// Start building a descriptor for `template`, dispatched to `handler`.
    pub fn builder(template: impl Into<String>, handler: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            descriptor: CommandDescriptor {
                template: template.into(),
                handler: handler.into(),
                help: Vec::new(),
                key: 0,
                flags: CliFlags::empty(),
                module: None,
                target_mode: None,
                data_type: None,
                expansion: None,
            },
            key: None,
        }
    }

    /// Whether the command accepts an output modifier.
    pub fn allows_modifier(&self) -> bool {
        self.flags.contains(CliFlags::MODIFIER)
    }

    /// Whether the command is excluded from help output.
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(CliFlags::HIDDEN)
    }
}

/// Builder for [`CommandDescriptor`].
#[derive(Debug, Clone)]
#[must_use]
pub struct CommandBuilder {
    descriptor: CommandDescriptor,
    key: Option<u32>,
}

impl CommandBuilder {
    /// Help strings in template order.
    pub fn help<I, S>(mut self, help: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptor.help = help.into_iter().map(Into::into).collect();
        self
    }

    /// Explicit key; otherwise one is derived from the template.
    pub fn key(mut self, key: u32) -> Self {
        self.key = Some(key);
        self
    }

    /// Add flags.
    pub fn flags(mut self, flags: CliFlags) -> Self {
        self.descriptor.flags |= flags;
        self
    }

    /// Owning module.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.descriptor.module = Some(module.into());
        self
    }

    /// Mode entered after dispatch.
    pub fn target_mode(mut self, mode: Mode) -> Self {
        self.descriptor.target_mode = Some(mode);
        self
    }

    /// Configuration data-type tag.
    pub fn data_type(mut self, tag: u16) -> Self {
        self.descriptor.data_type = Some(tag);
        self
    }

    /// Expansion line for a shortcut.
    pub fn expansion(mut self, line: impl Into<String>) -> Self {
        self.descriptor.expansion = Some(line.into());
        self
    }

    /// Finish the descriptor.
    pub fn build(mut self) -> CommandDescriptor {
        self.descriptor.key = self
            .key
            .unwrap_or_else(|| template_key(&self.descriptor.template));
        self.descriptor
    }
}

/// 32-bit FNV-1a over the whitespace-normalized template.
pub fn template_key(template: &str) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;
    let mut hash = OFFSET;
    for (i, word) in template.split_whitespace().enumerate() {
        if i > 0 {
            hash = (hash ^ u32::from(b' ')).wrapping_mul(PRIME);
        }
        for b in word.bytes() {
            hash = (hash ^ u32::from(b)).wrapping_mul(PRIME);
        }
    }
    hash
}

/// Status a dispatcher reports after running a command callback.
///
/// The core never produces these; they are shared vocabulary between the
/// dispatcher and the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// The command ran.
    Success,
    /// The command failed.
    Error,
    /// The command needs re-authentication before it runs.
    AuthRequired,
    /// A listing command has no more entries.
    EndOfList,
}
