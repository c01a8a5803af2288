use std::sync::Arc;

use crate::command::CommandDescriptor;
use crate::flags::CliFlags;
use crate::privilege::Privilege;
use crate::token::TokenSpec;

/// Stable index of a node in the tree's arena.
///
/// An id stays valid until the node is pruned; pruned slots are reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// One grammar position shared by every command whose path passes through it.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) spec: TokenSpec,
    pub(crate) help: Option<String>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) leaf: Option<Arc<CommandDescriptor>>,
    /// Privilege the bound command was installed at.
    pub(crate) leaf_privilege: Privilege,
    pub(crate) privilege: Privilege,
    pub(crate) flags: CliFlags,
    pub(crate) refcnt: u32,
    /// Commands through this node that are not hidden.
    pub(crate) visible: u32,
    /// For the last node of a brace member: the group node to return to.
    pub(crate) group: Option<NodeId>,
}

impl Node {
    pub(crate) fn new(spec: TokenSpec, flags: CliFlags, parent: Option<NodeId>) -> Self {
        Self {
            spec,
            help: None,
            children: Vec::new(),
            parent,
            leaf: None,
            leaf_privilege: Privilege::PVR_MAX,
            privilege: Privilege::PVR_MAX,
            flags,
            refcnt: 0,
            visible: 0,
            group: None,
        }
    }

    /// What the node matches.
    pub fn spec(&self) -> &TokenSpec {
        &self.spec
    }

    /// Help text; when commands disagree, the lexicographically smallest.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Child ids in current order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent id; `None` for roots.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Descriptor bound here, if a command terminates at this node.
    pub fn leaf(&self) -> Option<&Arc<CommandDescriptor>> {
        self.leaf.as_ref()
    }

    /// Privilege required to run the bound command.
    pub fn leaf_privilege(&self) -> Privilege {
        self.leaf_privilege
    }

    /// Lowest privilege among the commands passing through.
    pub fn privilege(&self) -> Privilege {
        self.privilege
    }

    /// Node flags.
    pub fn flags(&self) -> CliFlags {
        self.flags
    }

    /// Number of installed commands whose path passes through this node.
    pub fn refcount(&self) -> u32 {
        self.refcnt
    }

    /// Hidden while every command through the node is hidden.
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(CliFlags::HIDDEN)
    }

    /// Whether this is a brace-group node rather than a matchable position.
    pub fn is_group(&self) -> bool {
        self.spec.kind.is_structural()
    }

    /// Node identity: kind, text, bounds, group membership, and `+` handling.
    pub(crate) fn same_position(&self, spec: &TokenSpec, flags: CliFlags) -> bool {
        self.spec == *spec
            && self.flags.intersection(CliFlags::IDENTITY) == flags.intersection(CliFlags::IDENTITY)
    }
}

/// Slot storage with a free list.
#[derive(Debug, Clone, Default)]
pub(crate) struct Arena {
    slots: Vec<Option<Node>>,
    free: Vec<u32>,
}

impl Arena {
    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(node);
            NodeId(slot)
        } else {
            let id = u32::try_from(self.slots.len()).expect("arena exceeds u32 nodes");
            self.slots.push(Some(node));
            NodeId(id)
        }
    }

    pub(crate) fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index())
            && slot.take().is_some()
        {
            self.free.push(id.0);
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Live node. Ids handed out by the tree always refer to live nodes.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.get(id).expect("dangling node id")
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .expect("dangling node id")
    }

    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
