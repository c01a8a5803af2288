//! The command forest: one tree of shared grammar positions per mode, plus
//! the global output-modifier tree.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Each node counts
//! the installed commands whose path passes through it; a node is pruned
//! when that count drops to zero.

mod arena;
mod install;

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

pub use arena::{Node, NodeId};

use crate::command::CommandDescriptor;
use crate::privilege::Mode;
use crate::token::{TokenKind, TokenSpec};
use arena::Arena;

/// Which root an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Forest {
    Mode(Mode),
    Modifiers,
}

impl Forest {
    pub(crate) fn mode(self) -> Option<Mode> {
        match self {
            Forest::Mode(mode) => Some(mode),
            Forest::Modifiers => None,
        }
    }
}

/// All installed commands, per mode, plus the output-modifier grammar.
///
/// Built once with `&mut` access, then shared read-only: every query takes
/// `&self` and keeps its working state on the caller's stack.
#[derive(Debug, Clone, Default)]
pub struct CommandTree {
    pub(crate) arena: Arena,
    pub(crate) roots: BTreeMap<Mode, NodeId>,
    pub(crate) modifier_root: Option<NodeId>,
    config_writers: BTreeMap<Mode, Vec<String>>,
}

impl CommandTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root of a mode's forest, if any command is installed in it.
    pub fn root(&self, mode: Mode) -> Option<NodeId> {
        self.roots.get(&mode).copied()
    }

    /// Root of the output-modifier tree.
    pub fn modifier_root(&self) -> Option<NodeId> {
        self.modifier_root
    }

    /// Look up a live node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Modes with at least one installed command, ascending.
    pub fn modes(&self) -> impl Iterator<Item = Mode> + '_ {
        self.roots.keys().copied()
    }

    /// Number of live nodes, roots included.
    pub fn node_count(&self) -> usize {
        self.arena.live()
    }

    pub(crate) fn forest_root(&self, forest: Forest) -> Option<NodeId> {
        match forest {
            Forest::Mode(mode) => self.root(mode),
            Forest::Modifiers => self.modifier_root,
        }
    }

    /// Follow `path` from a mode's root, one child per element.
    ///
    /// Elements are compared with each node's rendered text (`show`,
    /// `A.B.C.D`, `<1-10>`, `*s=show`, `{brief|json}`). Where several
    /// children render the same, the first is taken.
    pub fn lookup(&self, mode: Mode, path: &[&str]) -> Option<NodeId> {
        path.iter().try_fold(self.root(mode)?, |at, want| {
            self.arena
                .node(at)
                .children
                .iter()
                .copied()
                .find(|&c| self.arena.node(c).spec.to_string() == *want)
        })
    }

    /// Distinct commands installed in `mode`, in tree order.
    pub fn commands(&self, mode: Mode) -> Vec<Arc<CommandDescriptor>> {
        self.root(mode)
            .map(|root| self.collect_leaves(root))
            .unwrap_or_default()
    }

    /// Distinct modifiers installed in the modifier tree.
    pub fn modifiers(&self) -> Vec<Arc<CommandDescriptor>> {
        self.modifier_root
            .map(|root| self.collect_leaves(root))
            .unwrap_or_default()
    }

    fn collect_leaves(&self, root: NodeId) -> Vec<Arc<CommandDescriptor>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.arena.node(id);
            if let Some(leaf) = &node.leaf
                && seen.insert(Arc::as_ptr(leaf))
            {
                out.push(Arc::clone(leaf));
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    // ── Configuration writers ───────────────────────────────────────────

    /// Register a configuration writer for `mode`. The core only stores it.
    pub fn install_config_writer(&mut self, mode: Mode, handler: impl Into<String>) {
        self.config_writers
            .entry(mode)
            .or_default()
            .push(handler.into());
    }

    /// Registered writers, in mode order, each mode's in registration order.
    pub fn config_writers(&self) -> impl Iterator<Item = (Mode, &[String])> + '_ {
        self.config_writers
            .iter()
            .map(|(mode, handlers)| (*mode, handlers.as_slice()))
    }

    // ── Normalization and inspection ────────────────────────────────────

    /// Put every child list in canonical order: literals, then placeholders,
    /// then group nodes, lexicographic within each class.
    pub fn sort(&mut self) {
        let mut stack: Vec<NodeId> = self.roots.values().copied().collect();
        stack.extend(self.modifier_root);
        while let Some(id) = stack.pop() {
            let mut children = std::mem::take(&mut self.arena.node_mut(id).children);
            children.sort_by_cached_key(|&c| {
                let node = self.arena.node(c);
                (sort_key(&node.spec), node.flags.bits())
            });
            stack.extend(children.iter().copied());
            self.arena.node_mut(id).children = children;
        }
    }

    /// Indented outline of a mode's forest, one node per line.
    pub fn dump(&self, mode: Mode) -> Option<String> {
        self.root(mode).map(|root| self.dump_from(root))
    }

    /// Indented outline of the modifier tree.
    pub fn dump_modifiers(&self) -> Option<String> {
        self.modifier_root.map(|root| self.dump_from(root))
    }

    fn dump_from(&self, root: NodeId) -> String {
        let mut out = String::new();
        let mut stack: Vec<(NodeId, usize)> = self
            .arena
            .node(root)
            .children
            .iter()
            .rev()
            .map(|&c| (c, 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            let node = self.arena.node(id);
            let _ = write!(out, "{:indent$}{}", "", node.spec, indent = depth * 2);
            if let Some(leaf) = &node.leaf {
                let _ = write!(out, " => {}", leaf.handler);
            }
            let _ = write!(out, "  (refs {}, priv {}", node.refcnt, node.privilege);
            if node.is_hidden() {
                out.push_str(", hidden");
            }
            out.push_str(")\n");
            stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
        }
        out
    }
}

pub(crate) fn sort_key(spec: &TokenSpec) -> (u8, String, u32) {
    let lower = match spec.kind {
        TokenKind::Range => spec.range.map(|r| r.min).unwrap_or_default(),
        _ => 0,
    };
    (spec.kind.sort_class(), spec.display().to_string(), lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::privilege::Privilege;

    fn cmd(template: &str) -> CommandDescriptor {
        CommandDescriptor::builder(template, template.replace(' ', "_")).build()
    }

    #[test]
    fn sort_orders_literals_before_placeholders() {
        let mut tree = CommandTree::new();
        for t in ["show WORD", "show zebra", "show A.B.C.D", "show bgp"] {
            tree.install(Mode(1), cmd(t), Privilege::MIN).unwrap();
        }
        tree.sort();
        let show = tree.lookup(Mode(1), &["show"]).unwrap();
        let names: Vec<String> = tree
            .node(show)
            .unwrap()
            .children()
            .iter()
            .map(|&c| tree.node(c).unwrap().spec().to_string())
            .collect();
        assert_eq!(names, vec!["bgp", "zebra", "A.B.C.D", "WORD"]);
    }

    #[test]
    fn dump_marks_leaves_and_counts() {
        let mut tree = CommandTree::new();
        tree.install(Mode(1), cmd("show ip"), Privilege::MIN).unwrap();
        tree.install(Mode(1), cmd("show bgp"), Privilege(5)).unwrap();
        let text = tree.dump(Mode(1)).unwrap();
        assert!(text.starts_with("show  (refs 2, priv 1)\n"), "{text}");
        assert!(text.contains("  ip => show_ip  (refs 1, priv 1)"), "{text}");
        assert!(text.contains("  bgp => show_bgp  (refs 1, priv 5)"), "{text}");
        assert!(tree.dump(Mode(2)).is_none());
    }

    #[test]
    fn config_writers_enumerate_in_mode_order() {
        let mut tree = CommandTree::new();
        tree.install_config_writer(Mode(3), "bgp_config_write");
        tree.install_config_writer(Mode(1), "interface_config_write");
        tree.install_config_writer(Mode(3), "bgp_af_config_write");
        let all: Vec<_> = tree.config_writers().collect();
        assert_eq!(all[0].0, Mode(1));
        assert_eq!(all[1].1, ["bgp_config_write", "bgp_af_config_write"]);
    }

    #[test]
    fn commands_are_distinct() {
        let mut tree = CommandTree::new();
        tree.install(Mode(1), cmd("show [ip] bgp"), Privilege::MIN)
            .unwrap();
        tree.install(Mode(1), cmd("clear bgp"), Privilege::MIN).unwrap();
        let handlers: Vec<_> = tree
            .commands(Mode(1))
            .iter()
            .map(|d| d.handler.clone())
            .collect();
        assert_eq!(handlers, vec!["show_[ip]_bgp", "clear_bgp"]);
    }
}
