use derive_more::{Display, IsVariant};
use snafu::{OptionExt, Snafu, ensure};
use tracing::debug;

/// Handle to a node stored in a [`Tree`].
///
/// The generation is bumped every time a slot is released, so a handle to a
/// removed node never silently resolves to whatever reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EntryKind {
    #[display("folder")]
    Folder,
    #[display("file")]
    File,
}

/// Payload held by every node of the tree.
#[derive(Debug, Clone, PartialEq, Eq, IsVariant)]
pub enum Entry {
    Folder { name: String },
    File { name: String, content: Vec<String> },
}

impl Entry {
    pub fn folder(name: impl Into<String>) -> Self {
        Entry::Folder { name: name.into() }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Entry::File {
            name: name.into(),
            content: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::Folder { name } | Entry::File { name, .. } => name,
        }
    }

    pub fn rename(&mut self, new_name: impl Into<String>) {
        match self {
            Entry::Folder { name } | Entry::File { name, .. } => *name = new_name.into(),
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Folder { .. } => EntryKind::Folder,
            Entry::File { .. } => EntryKind::File,
        }
    }

    /// Content lines of a file, `None` for folders
    pub fn content(&self) -> Option<&[String]> {
        match self {
            Entry::Folder { .. } => None,
            Entry::File { content, .. } => Some(content),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    entry: Entry,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl Node {
    fn new(entry: Entry, parent: Option<NodeId>) -> Self {
        Self {
            entry,
            parent,
            first_child: None,
            next_sibling: None,
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Result of releasing a subtree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removed {
    /// Entry of the node the removal was requested for
    pub entry: Entry,
    /// Folder the removed node was attached to
    pub parent: NodeId,
    /// Number of nodes released, the removed node included
    pub count: usize,
}

/// Folder/file hierarchy stored in an arena.
///
/// Nodes are linked first-child/next-sibling with parent back-links, all
/// expressed as [`NodeId`] handles into the arena. A tree always has exactly
/// one root, which is a folder and cannot be removed.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    live: usize,
}

impl Tree {
    /// Creates a tree holding only a root folder named `root_name`
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut tree = Tree {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            live: 0,
        };
        tree.root = tree.alloc(Node::new(Entry::folder(root_name), None));
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the root included
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).context(StaleNodeSnafu)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.get_mut(id).context(StaleNodeSnafu)
    }

    pub fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.get(id).map(Node::entry)
    }

    pub fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        self.get_mut(id).map(|node| &mut node.entry)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Direct children of `id` in sibling order
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).and_then(Node::first_child),
        }
    }

    /// `id` followed by each of its ancestors up to the root
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get(id).map(|_| id),
        }
    }

    /// Depth-first pre-order walk of the subtree rooted at `start`.
    ///
    /// Yields `(node, depth)` pairs with `start` at depth 0. A node is
    /// followed by its whole subtree before its next sibling is visited.
    pub fn pre_order(&self, start: NodeId) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![(start, 0, false)],
        }
    }

    /// Absolute path of a folder, built as `/<root>/<child>/...`
    pub fn path(&self, id: NodeId) -> Result<String, TreeError> {
        let node = self.node(id)?;
        ensure!(
            node.entry.is_folder(),
            NotAFolderSnafu {
                name: node.entry.name()
            }
        );

        let mut names = self
            .ancestors(id)
            .filter_map(|ancestor| self.entry(ancestor).map(Entry::name))
            .collect::<Vec<_>>();
        names.reverse();

        Ok(names.iter().map(|name| format!("/{name}")).collect())
    }

    /// Attaches `entry` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, entry: Entry) -> Result<NodeId, TreeError> {
        self.ensure_folder(parent)?;

        let last = self.children(parent).last();
        let id = self.alloc(Node::new(entry, Some(parent)));
        match last {
            Some(last) => self.node_mut(last)?.next_sibling = Some(id),
            None => self.node_mut(parent)?.first_child = Some(id),
        }

        Ok(id)
    }

    /// Attaches `entry` as the first child of `parent`
    pub fn insert_child(&mut self, parent: NodeId, entry: Entry) -> Result<NodeId, TreeError> {
        self.ensure_folder(parent)?;

        let mut node = Node::new(entry, Some(parent));
        node.next_sibling = self.node(parent)?.first_child;
        let id = self.alloc(node);
        self.node_mut(parent)?.first_child = Some(id);

        Ok(id)
    }

    /// Detaches `id` from its parent and releases it together with every
    /// node below it. Handles into the removed subtree become stale.
    pub fn remove_subtree(&mut self, id: NodeId) -> Result<Removed, TreeError> {
        let parent = self.unlink(id)?;

        let mut pending = vec![id];
        let mut removed_entry = None;
        let mut count = 0;
        while let Some(current) = pending.pop() {
            let Some(node) = self.release(current) else {
                continue;
            };
            count += 1;
            pending.extend(node.first_child);
            pending.extend(node.next_sibling);
            if current == id {
                removed_entry = Some(node.entry);
            }
        }

        debug!("Released {} nodes", count);
        let entry = removed_entry.context(StaleNodeSnafu)?;
        Ok(Removed {
            entry,
            parent,
            count,
        })
    }

    /// Removes `id` from its parent's sibling chain, returning the parent
    fn unlink(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let node = self.node(id)?;
        let parent = node.parent.context(RootRemovalSnafu)?;
        let next = node.next_sibling;

        let previous = self.children(parent).take_while(|&child| child != id).last();
        match previous {
            Some(previous) => self.node_mut(previous)?.next_sibling = next,
            None => self.node_mut(parent)?.first_child = next,
        }

        let node = self.node_mut(id)?;
        node.parent = None;
        node.next_sibling = None;
        Ok(parent)
    }

    fn ensure_folder(&self, id: NodeId) -> Result<(), TreeError> {
        let node = self.node(id)?;
        ensure!(
            node.entry.is_folder(),
            NotAFolderSnafu {
                name: node.entry.name()
            }
        );
        Ok(())
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Node> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node)
    }
}

/// Two trees are equal when they hold the same entries in the same shape,
/// regardless of how their arenas are laid out.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        let outline = |tree: &Tree| {
            tree.pre_order(tree.root())
                .map(|(id, depth)| (depth, tree.entry(id).cloned()))
                .collect::<Vec<_>>()
        };
        outline(self) == outline(other)
    }
}

impl Eq for Tree {}

pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(Node::next_sibling);
        Some(current)
    }
}

pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub struct PreOrder<'a> {
    tree: &'a Tree,
    // (node, depth, whether its next siblings belong to the walk)
    stack: Vec<(NodeId, usize, bool)>,
}

impl Iterator for PreOrder<'_> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<(NodeId, usize)> {
        let (id, depth, with_siblings) = self.stack.pop()?;
        let node = self.tree.get(id)?;

        if with_siblings {
            if let Some(sibling) = node.next_sibling {
                self.stack.push((sibling, depth, true));
            }
        }
        if let Some(child) = node.first_child {
            self.stack.push((child, depth + 1, true));
        }

        Some((id, depth))
    }
}

#[derive(Debug, Snafu)]
pub enum TreeError {
    #[snafu(display("Node handle does not refer to a live node"))]
    StaleNode,
    #[snafu(display("'{}' is not a folder", name))]
    NotAFolder { name: String },
    #[snafu(display("The root folder cannot be removed"))]
    RootRemoval,
}
