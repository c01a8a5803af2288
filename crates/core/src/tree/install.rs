use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::arena::Node;
use super::{CommandTree, Forest, NodeId};
use crate::command::CommandDescriptor;
use crate::error::InstallError;
use crate::flags::CliFlags;
use crate::grammar::ast::{Atom, Element, Grammar};
use crate::grammar::parser::compile;
use crate::privilege::{Mode, Privilege};
use crate::token::{TokenKind, TokenSpec};

/// Commands installed by [`CommandTree::install_defaults`]: template, handler, help.
const DEFAULT_COMMANDS: &[(&str, &str, &str)] = &[
    ("exit", "exit", "End current mode and down to previous mode"),
    ("quit", "quit", "Exit current mode and down to previous mode"),
    ("end", "end", "End current mode and change to EXEC mode"),
];

impl CommandTree {
    /// Install `descriptor` into `mode` at `privilege`.
    ///
    /// The descriptor's template is compiled and every path it describes is
    /// added to the mode's forest, sharing existing nodes. On error the tree
    /// is unchanged.
    pub fn install(
        &mut self,
        mode: Mode,
        descriptor: CommandDescriptor,
        privilege: Privilege,
    ) -> Result<Arc<CommandDescriptor>, InstallError> {
        let descriptor = Arc::new(descriptor);
        self.install_shared(mode, Arc::clone(&descriptor), privilege)?;
        Ok(descriptor)
    }

    /// Install an already shared descriptor.
    pub fn install_shared(
        &mut self,
        mode: Mode,
        descriptor: Arc<CommandDescriptor>,
        privilege: Privilege,
    ) -> Result<(), InstallError> {
        self.install_into(Forest::Mode(mode), descriptor, privilege)
    }

    /// Install a command that completion and describe only show in advanced mode.
    pub fn install_hidden(
        &mut self,
        mode: Mode,
        mut descriptor: CommandDescriptor,
        privilege: Privilege,
    ) -> Result<Arc<CommandDescriptor>, InstallError> {
        descriptor.flags |= CliFlags::HIDDEN;
        self.install(mode, descriptor, privilege)
    }

    /// Install a command owned by a protocol module, tagged with the
    /// module's configuration data type.
    pub fn install_module(
        &mut self,
        mode: Mode,
        mut descriptor: CommandDescriptor,
        privilege: Privilege,
        module: &str,
        data_type: u16,
    ) -> Result<Arc<CommandDescriptor>, InstallError> {
        descriptor.module = Some(module.to_string());
        descriptor.data_type = Some(data_type);
        self.install(mode, descriptor, privilege)
    }

    /// Install one descriptor into several modes.
    ///
    /// All or nothing: if any mode rejects it, the modes already done are
    /// rolled back.
    pub fn install_family(
        &mut self,
        modes: &[Mode],
        descriptor: CommandDescriptor,
        privilege: Privilege,
    ) -> Result<Arc<CommandDescriptor>, InstallError> {
        let descriptor = Arc::new(descriptor);
        for (i, &mode) in modes.iter().enumerate() {
            if let Err(err) = self.install_shared(mode, Arc::clone(&descriptor), privilege) {
                for &done in &modes[..i] {
                    // Installed a moment ago, so the path exists.
                    let _ = self.uninstall(done, &descriptor.template);
                }
                return Err(err);
            }
        }
        Ok(descriptor)
    }

    /// Install the standard `exit`, `quit`, and `end` commands into `mode`.
    pub fn install_defaults(&mut self, mode: Mode) -> Result<(), InstallError> {
        for &(template, handler, help) in DEFAULT_COMMANDS {
            let descriptor = CommandDescriptor::builder(template, handler)
                .help([help])
                .build();
            self.install(mode, descriptor, Privilege::MIN)?;
        }
        Ok(())
    }

    /// Install a short grammar that stands for a longer line.
    ///
    /// The expansion is stored on the descriptor; dispatchers re-parse it.
    pub fn install_shortcut(
        &mut self,
        mode: Mode,
        mut descriptor: CommandDescriptor,
        expansion: &str,
        privilege: Privilege,
    ) -> Result<Arc<CommandDescriptor>, InstallError> {
        descriptor.expansion = Some(expansion.to_string());
        self.install(mode, descriptor, privilege)
    }

    /// Remove the command installed in `mode` under `template`.
    ///
    /// Counts along every path are decremented and nodes left with no
    /// commands are pruned; nodes still used by another command stay.
    pub fn uninstall(
        &mut self,
        mode: Mode,
        template: &str,
    ) -> Result<Arc<CommandDescriptor>, InstallError> {
        self.uninstall_from(Forest::Mode(mode), template)
    }

    /// Set `flag` on the terminal node(s) of an installed command.
    pub fn set_node_flag(
        &mut self,
        mode: Mode,
        template: &str,
        flag: CliFlags,
    ) -> Result<(), InstallError> {
        let forest = Forest::Mode(mode);
        let grammar = compile(template)?;
        let walk = self.find(forest, &grammar, template)?;
        for id in walk.terminals {
            self.arena.node_mut(id).flags |= flag;
        }
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────────

    pub(crate) fn install_into(
        &mut self,
        forest: Forest,
        descriptor: Arc<CommandDescriptor>,
        privilege: Privilege,
    ) -> Result<(), InstallError> {
        let template = descriptor.template.as_str();
        let grammar = compile(template)?;
        if !descriptor.help.is_empty() && descriptor.help.len() != grammar.token_count {
            return Err(InstallError::HelpMismatch {
                template: template.to_string(),
                expected: grammar.token_count,
                found: descriptor.help.len(),
            });
        }

        let inherited = descriptor.flags & CliFlags::NODE_INHERITED;
        // Ranges that differ only in `+` handling are separate positions, but
        // they still share a line with each other.
        for variant in [inherited, inherited ^ CliFlags::NODE_INHERITED] {
            if let Some(existing) = self.walk_existing(forest, &grammar, variant)
                && existing.terminals.iter().any(|&t| self.line_taken(t))
            {
                return Err(duplicate(forest, template));
            }
        }

        let (root, root_created) = match self.forest_root(forest) {
            Some(root) => (root, false),
            None => {
                let root = self.arena.alloc(Node::new(
                    TokenSpec::structural(TokenKind::Separator, ""),
                    CliFlags::empty(),
                    None,
                ));
                self.set_root(forest, Some(root));
                (root, true)
            }
        };

        let mut walk = Walk::new(root, inherited);
        walk.terminals = walk.sequence(
            &mut Cursor::Build(self),
            &grammar.elements,
            vec![root],
            CliFlags::empty(),
        );

        if walk.terminals.iter().any(|&t| self.line_taken(t)) {
            for &id in walk.created.iter().rev() {
                self.detach(id);
                self.arena.release(id);
            }
            if root_created {
                self.set_root(forest, None);
                self.arena.release(root);
            }
            return Err(duplicate(forest, template));
        }

        let visible = !descriptor.is_hidden();
        for &id in &walk.touched {
            let node = self.arena.node_mut(id);
            node.privilege = if node.refcnt == 0 {
                privilege
            } else {
                node.privilege.min(privilege)
            };
            node.refcnt += 1;
            if visible {
                node.visible += 1;
            }
            node.flags.set(CliFlags::HIDDEN, node.visible == 0);
        }
        for &(id, index) in &walk.help {
            offer_help(&mut self.arena.node_mut(id).help, descriptor.help.get(index));
        }
        for &(member, group) in &walk.anchors {
            self.arena.node_mut(member).group = Some(group);
        }
        for &id in &walk.terminals {
            let node = self.arena.node_mut(id);
            node.leaf = Some(Arc::clone(&descriptor));
            node.leaf_privilege = privilege;
        }

        debug!(
            forest = ?forest,
            template,
            handler = %descriptor.handler,
            created = walk.created.len(),
            "installed command"
        );
        Ok(())
    }

    pub(crate) fn uninstall_from(
        &mut self,
        forest: Forest,
        template: &str,
    ) -> Result<Arc<CommandDescriptor>, InstallError> {
        let grammar = compile(template)?;
        let walk = self.find(forest, &grammar, template)?;
        let descriptor = self
            .bound_to_one(&walk.terminals)
            .ok_or_else(|| unknown(forest, template))?;

        let visible = !descriptor.is_hidden();
        for &id in &walk.terminals {
            self.arena.node_mut(id).leaf = None;
        }
        let mut dead = Vec::new();
        for &id in &walk.touched {
            let node = self.arena.node_mut(id);
            node.refcnt = node.refcnt.saturating_sub(1);
            if visible {
                node.visible = node.visible.saturating_sub(1);
            }
            node.flags.set(CliFlags::HIDDEN, node.visible == 0);
            if node.refcnt == 0 {
                dead.push(id);
            }
        }
        // A child never outlives its parent's count, so dead nodes form
        // whole subtrees; only their tops need detaching.
        for &id in &dead {
            match self.arena.node(id).parent {
                Some(parent) if self.arena.node(parent).refcnt > 0 => self.detach(id),
                Some(_) => {}
                None => self.set_root(forest, None),
            }
        }
        for &id in &dead {
            self.arena.release(id);
        }
        self.refresh_shared(forest);

        debug!(
            forest = ?forest,
            template,
            pruned = dead.len(),
            "uninstalled command"
        );
        Ok(descriptor)
    }

    /// Walk without creating; every position must already exist and every
    /// terminal must be bound to the same command.
    fn find(&self, forest: Forest, grammar: &Grammar, template: &str) -> Result<Walk, InstallError> {
        [CliFlags::empty(), CliFlags::NODE_INHERITED]
            .into_iter()
            .filter_map(|inherited| self.walk_existing(forest, grammar, inherited))
            .find(|walk| !walk.missing && self.bound_to_one(&walk.terminals).is_some())
            .ok_or_else(|| unknown(forest, template))
    }

    /// Existing positions a grammar reaches; `missing` is set if some do not exist.
    fn walk_existing(&self, forest: Forest, grammar: &Grammar, inherited: CliFlags) -> Option<Walk> {
        let root = self.forest_root(forest)?;
        let mut walk = Walk::new(root, inherited);
        walk.terminals = walk.sequence(
            &mut Cursor::Find(self),
            &grammar.elements,
            vec![root],
            CliFlags::empty(),
        );
        Some(walk)
    }

    /// The command bound at every one of `terminals`, if it is one command.
    fn bound_to_one(&self, terminals: &[NodeId]) -> Option<Arc<CommandDescriptor>> {
        let (&first, rest) = terminals.split_first()?;
        let leaf = self.arena.node(first).leaf.as_ref()?;
        rest.iter()
            .all(|&t| {
                self.arena
                    .node(t)
                    .leaf
                    .as_ref()
                    .is_some_and(|other| Arc::ptr_eq(other, leaf))
            })
            .then(|| Arc::clone(leaf))
    }

    /// Whether a line ending at `terminal` already resolves to a command.
    ///
    /// A brace group may match no members, so a line ending on the group's
    /// parent reaches the group's command and the other way round.
    fn line_taken(&self, terminal: NodeId) -> bool {
        let mut at = terminal;
        loop {
            if self
                .end_closure(at)
                .into_iter()
                .any(|id| self.arena.node(id).leaf.is_some())
            {
                return true;
            }
            let node = self.arena.node(at);
            match node.parent {
                Some(parent) if node.spec.kind == TokenKind::BraceOpen => at = parent,
                _ => return false,
            }
        }
    }

    /// `start`, the group it returns to, and the groups it opens, transitively.
    fn end_closure(&self, start: NodeId) -> Vec<NodeId> {
        let mut seen = vec![start];
        let mut i = 0;
        while i < seen.len() {
            let node = self.arena.node(seen[i]);
            i += 1;
            let opens = node
                .children
                .iter()
                .copied()
                .filter(|&c| self.arena.node(c).spec.kind == TokenKind::BraceOpen);
            for next in node.group.into_iter().chain(opens) {
                if !seen.contains(&next) {
                    seen.push(next);
                }
            }
        }
        seen
    }

    /// Recompute privilege and help of every node in `forest` from the
    /// commands still installed.
    fn refresh_shared(&mut self, forest: Forest) {
        let Some(root) = self.forest_root(forest) else {
            return;
        };
        let mut commands: Vec<(Arc<CommandDescriptor>, Privilege)> = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.arena.node_mut(id);
            node.privilege = Privilege::PVR_MAX;
            node.help = None;
            if let Some(leaf) = &node.leaf
                && !commands.iter().any(|(known, _)| Arc::ptr_eq(known, leaf))
            {
                commands.push((Arc::clone(leaf), node.leaf_privilege));
            }
            stack.extend(node.children.iter().copied());
        }

        for (descriptor, privilege) in commands {
            let Ok(grammar) = compile(&descriptor.template) else {
                continue;
            };
            let Ok(walk) = self.find(forest, &grammar, &descriptor.template) else {
                continue;
            };
            if !self
                .bound_to_one(&walk.terminals)
                .is_some_and(|found| Arc::ptr_eq(&found, &descriptor))
            {
                continue;
            }
            for &id in &walk.touched {
                let node = self.arena.node_mut(id);
                node.privilege = node.privilege.min(privilege);
            }
            for &(id, index) in &walk.help {
                offer_help(&mut self.arena.node_mut(id).help, descriptor.help.get(index));
            }
        }
    }

    fn set_root(&mut self, forest: Forest, root: Option<NodeId>) {
        match (forest, root) {
            (Forest::Mode(mode), Some(root)) => {
                self.roots.insert(mode, root);
            }
            (Forest::Mode(mode), None) => {
                self.roots.remove(&mode);
            }
            (Forest::Modifiers, root) => self.modifier_root = root,
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.arena.node(id).parent {
            self.arena.node_mut(parent).children.retain(|&c| c != id);
        }
    }
}

fn duplicate(forest: Forest, template: &str) -> InstallError {
    InstallError::DuplicateCommand {
        mode: forest.mode(),
        template: template.to_string(),
    }
}

/// Shared nodes keep the smallest non-empty help text any command offers.
fn offer_help(slot: &mut Option<String>, offered: Option<&String>) {
    let Some(text) = offered.filter(|t| !t.is_empty()) else {
        return;
    };
    if slot.as_ref().is_none_or(|current| text < current) {
        *slot = Some(text.clone());
    }
}

fn unknown(forest: Forest, template: &str) -> InstallError {
    InstallError::UnknownCommand {
        mode: forest.mode(),
        template: template.to_string(),
    }
}

/// One pass over a compiled grammar, tracking the frontier of tails.
struct Walk {
    inherited: CliFlags,
    created: Vec<NodeId>,
    touched: BTreeSet<NodeId>,
    terminals: Vec<NodeId>,
    help: Vec<(NodeId, usize)>,
    anchors: Vec<(NodeId, NodeId)>,
    missing: bool,
}

impl Walk {
    fn new(root: NodeId, inherited: CliFlags) -> Self {
        Self {
            inherited,
            created: Vec::new(),
            touched: BTreeSet::from([root]),
            terminals: Vec::new(),
            help: Vec::new(),
            anchors: Vec::new(),
            missing: false,
        }
    }

    fn sequence(
        &mut self,
        tree: &mut Cursor<'_>,
        seq: &[Element],
        mut tails: Vec<NodeId>,
        positional: CliFlags,
    ) -> Vec<NodeId> {
        for element in seq {
            if tails.is_empty() {
                break;
            }
            tails = match element {
                Element::Atom(atom) => {
                    let spec = atom.spec.clone();
                    let flags = positional | atom_flags(atom);
                    let next = self.step(tree, &tails, &spec, flags);
                    for &id in &next {
                        self.help.push((id, atom.help_index));
                    }
                    next
                }
                Element::Choice {
                    alternatives,
                    optional,
                } => {
                    let mut next = Vec::new();
                    for alt in alternatives {
                        let ends =
                            self.sequence(tree, alt, tails.clone(), positional | CliFlags::PAREN);
                        push_unique(&mut next, ends);
                    }
                    if *optional {
                        push_unique(&mut next, tails);
                    }
                    next
                }
                Element::Group(alternatives) => {
                    let spec = TokenSpec::structural(TokenKind::BraceOpen, element.to_string());
                    let groups = self.step(tree, &tails, &spec, positional);
                    for &group in &groups {
                        for alt in alternatives {
                            let ends = self.sequence(
                                tree,
                                alt,
                                vec![group],
                                positional | CliFlags::TRAVERSE,
                            );
                            for member in ends {
                                self.anchors.push((member, group));
                            }
                        }
                    }
                    groups
                }
            };
        }
        tails
    }

    /// Advance every tail by one position, creating children as allowed.
    fn step(
        &mut self,
        tree: &mut Cursor<'_>,
        tails: &[NodeId],
        spec: &TokenSpec,
        flags: CliFlags,
    ) -> Vec<NodeId> {
        // Only ranges read `+` handling, so only ranges carry it.
        let flags = if spec.kind == TokenKind::Range {
            flags | self.inherited
        } else {
            flags
        };
        let mut next = Vec::new();
        for &tail in tails {
            let existing = {
                let t = tree.get();
                t.arena
                    .node(tail)
                    .children
                    .iter()
                    .copied()
                    .find(|&c| t.arena.node(c).same_position(spec, flags))
            };
            let child = match (existing, &mut *tree) {
                (Some(child), _) => child,
                (None, Cursor::Build(t)) => {
                    let id = t.arena.alloc(Node::new(spec.clone(), flags, Some(tail)));
                    t.arena.node_mut(tail).children.push(id);
                    self.created.push(id);
                    id
                }
                (None, Cursor::Find(_)) => {
                    self.missing = true;
                    continue;
                }
            };
            self.touched.insert(child);
            if !next.contains(&child) {
                next.push(child);
            }
        }
        next
    }
}

/// The tree as seen by a walk: mutable when installing, shared when finding.
enum Cursor<'t> {
    Build(&'t mut CommandTree),
    Find(&'t CommandTree),
}

impl Cursor<'_> {
    fn get(&self) -> &CommandTree {
        match self {
            Cursor::Build(t) => t,
            Cursor::Find(t) => t,
        }
    }
}

fn atom_flags(atom: &Atom) -> CliFlags {
    let mut flags = CliFlags::empty();
    if atom.recursive {
        flags |= CliFlags::RECURSIVE;
    }
    match atom.spec.kind {
        TokenKind::IfName => flags |= CliFlags::IFNAME,
        TokenKind::Keyword | TokenKind::Alias if atom.spec.canonical() == "show" => {
            flags |= CliFlags::SHOW;
        }
        _ => {}
    }
    flags
}

fn push_unique(into: &mut Vec<NodeId>, from: Vec<NodeId>) {
    for id in from {
        if !into.contains(&id) {
            into.push(id);
        }
    }
}
