//! Name-based lookups and mutations built on the tree primitives.

use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{debug, info};

use super::tree::{Entry, EntryKind, NodeId, Removed, Tree, TreeError};

impl Tree {
    /// First node named `name` in pre-order from the root, root included.
    ///
    /// Names are not unique across folders; the earliest match in the walk
    /// wins.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.find_in_walk(name, None)
    }

    /// Like [`Tree::find_by_name`] but only folders can match
    pub fn find_folder_by_name(&self, name: &str) -> Option<NodeId> {
        self.find_in_walk(name, Some(EntryKind::Folder))
    }

    /// Scans the direct children of `folder` only
    pub fn find_child_by_name(&self, folder: NodeId, name: &str) -> Option<NodeId> {
        self.children(folder)
            .find(|&id| self.entry(id).is_some_and(|entry| entry.name() == name))
    }

    pub fn find_child_of_kind(&self, folder: NodeId, name: &str, kind: EntryKind) -> Option<NodeId> {
        self.children(folder).find(|&id| {
            self.entry(id)
                .is_some_and(|entry| entry.kind() == kind && entry.name() == name)
        })
    }

    /// Removes the first non-root node named `name` together with its subtree
    pub fn delete_by_name(&mut self, name: &str) -> Result<Removed, OperationError> {
        let target = self
            .pre_order(self.root())
            .skip(1)
            .map(|(id, _)| id)
            .find(|&id| self.entry(id).is_some_and(|entry| entry.name() == name))
            .context(NotFoundSnafu { name })?;

        let removed = self.remove_subtree(target).context(TreeSnafu)?;
        info!(
            "Removed {} '{}' ({} entries)",
            removed.entry.kind(),
            name,
            removed.count
        );
        Ok(removed)
    }

    /// Renames the direct child of `folder` that has kind `kind` and name `old_name`
    pub fn rename(
        &mut self,
        folder: NodeId,
        old_name: &str,
        new_name: &str,
        kind: EntryKind,
    ) -> Result<NodeId, OperationError> {
        let target = self
            .find_child_of_kind(folder, old_name, kind)
            .context(NotInFolderSnafu {
                kind,
                name: old_name,
            })?;

        if let Some(entry) = self.entry_mut(target) {
            entry.rename(new_name);
        }
        info!("Renamed {} '{}' to '{}'", kind, old_name, new_name);
        Ok(target)
    }

    /// Replaces the content lines of a file
    pub fn set_content(&mut self, file: NodeId, lines: Vec<String>) -> Result<(), OperationError> {
        match self.entry_mut(file) {
            Some(Entry::File { name, content }) => {
                debug!("Replacing {} content lines of '{}'", content.len(), name);
                *content = lines;
                Ok(())
            }
            Some(Entry::Folder { name }) => NotAFileSnafu { name: name.as_str() }.fail(),
            None => Err(TreeError::StaleNode).context(TreeSnafu),
        }
    }

    fn find_in_walk(&self, name: &str, kind: Option<EntryKind>) -> Option<NodeId> {
        self.pre_order(self.root())
            .map(|(id, _)| id)
            .find(|&id| {
                self.entry(id).is_some_and(|entry| {
                    entry.name() == name && kind.is_none_or(|kind| entry.kind() == kind)
                })
            })
    }
}

#[derive(Debug, Snafu)]
pub enum OperationError {
    #[snafu(display("No entry named '{}' exists", name))]
    NotFound { name: String },
    #[snafu(display("No {} named '{}' in the current folder", kind, name))]
    NotInFolder { kind: EntryKind, name: String },
    #[snafu(display("'{}' is not a file", name))]
    NotAFile { name: String },
    #[snafu(display("Tree update failed"))]
    Tree { source: TreeError },
}
