use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::{debug, info};

use crate::filesystem::{
    Entry, EntryKind, NodeId, OperationError, Removed, Tree, TreeError,
};

pub const PARENT_FOLDER: &str = "..";

/// A loaded tree together with the current folder of the shell
#[derive(Debug, Clone)]
pub struct Session {
    tree: Tree,
    cursor: NodeId,
}

impl Session {
    /// Starts a session positioned at the root folder
    pub fn new(tree: Tree) -> Self {
        let cursor = tree.root();
        Self { tree, cursor }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    pub fn current_path(&self) -> Result<String, SessionError> {
        self.tree.path(self.cursor).context(TreeSnafu)
    }

    /// Moves to the parent for `..`, otherwise to the first folder named
    /// `target` anywhere in the tree
    pub fn change_directory(&mut self, target: &str) -> Result<NodeId, SessionError> {
        if target == PARENT_FOLDER {
            let parent = self.tree.parent(self.cursor).context(AlreadyAtRootSnafu)?;
            self.cursor = parent;
            return Ok(parent);
        }

        match self.tree.find_folder_by_name(target) {
            Some(folder) => {
                debug!("Changing directory to '{}'", target);
                self.cursor = folder;
                Ok(folder)
            }
            None if self.tree.find_by_name(target).is_some() => {
                NotAFolderSnafu { name: target }.fail()
            }
            None => FolderNotFoundSnafu { name: target }.fail(),
        }
    }

    /// Entries below the current folder in pre-order, current folder first
    pub fn listing(&self) -> Vec<(usize, &Entry)> {
        self.tree
            .pre_order(self.cursor)
            .filter_map(|(id, depth)| self.tree.entry(id).map(|entry| (depth, entry)))
            .collect()
    }

    /// Creates a folder as the first child of the current folder
    pub fn make_folder(&mut self, name: &str) -> Result<NodeId, SessionError> {
        self.create(Entry::folder(name))
    }

    /// Creates an empty file as the first child of the current folder
    pub fn touch(&mut self, name: &str) -> Result<NodeId, SessionError> {
        self.create(Entry::file(name))
    }

    fn create(&mut self, entry: Entry) -> Result<NodeId, SessionError> {
        validate_name(entry.name())?;
        info!("Creating {} '{}'", entry.kind(), entry.name());
        self.tree
            .insert_child(self.cursor, entry)
            .context(TreeSnafu)
    }

    /// Removes the first entry named `name` anywhere below the root. When
    /// the current folder was inside the removed subtree the session moves
    /// to the removed entry's parent.
    pub fn remove(&mut self, name: &str) -> Result<Removed, SessionError> {
        let removed = self.tree.delete_by_name(name).context(OperationSnafu)?;
        if !self.tree.contains(self.cursor) {
            debug!("Current folder was removed, moving to its surviving ancestor");
            self.cursor = removed.parent;
        }
        Ok(removed)
    }

    pub fn rename_folder(&mut self, old_name: &str, new_name: &str) -> Result<(), SessionError> {
        self.rename(old_name, new_name, EntryKind::Folder)
    }

    pub fn rename_file(&mut self, old_name: &str, new_name: &str) -> Result<(), SessionError> {
        self.rename(old_name, new_name, EntryKind::File)
    }

    fn rename(&mut self, old_name: &str, new_name: &str, kind: EntryKind) -> Result<(), SessionError> {
        validate_name(new_name)?;
        self.tree
            .rename(self.cursor, old_name, new_name, kind)
            .context(OperationSnafu)?;
        Ok(())
    }

    /// Content of a file directly inside the current folder
    pub fn file_content(&self, name: &str) -> Result<&[String], SessionError> {
        let file = self.local_file(name)?;
        let content = self
            .tree
            .entry(file)
            .and_then(Entry::content)
            .context(FileNotFoundSnafu { name })?;
        Ok(content)
    }

    pub fn replace_content(&mut self, name: &str, lines: Vec<String>) -> Result<(), SessionError> {
        let file = self.local_file(name)?;
        info!("Replacing content of '{}' with {} lines", name, lines.len());
        self.tree.set_content(file, lines).context(OperationSnafu)
    }

    fn local_file(&self, name: &str) -> Result<NodeId, SessionError> {
        if let Some(file) = self.tree.find_child_of_kind(self.cursor, name, EntryKind::File) {
            return Ok(file);
        }
        match self.tree.find_child_by_name(self.cursor, name) {
            Some(_) => NotAFileSnafu { name }.fail(),
            None => FileNotFoundSnafu { name }.fail(),
        }
    }
}

fn validate_name(name: &str) -> Result<(), SessionError> {
    ensure!(
        !name.is_empty() && !name.contains('/') && !name.contains(['\n', '\r']),
        InvalidNameSnafu { name }
    );
    Ok(())
}

#[derive(Debug, Snafu)]
pub enum SessionError {
    #[snafu(display("Already at the root folder"))]
    AlreadyAtRoot,
    #[snafu(display("Folder '{}' not found", name))]
    FolderNotFound { name: String },
    #[snafu(display("'{}' is a file, not a folder", name))]
    NotAFolder { name: String },
    #[snafu(display("No file named '{}' in the current folder", name))]
    FileNotFound { name: String },
    #[snafu(display("'{}' is a folder, not a file", name))]
    NotAFile { name: String },
    #[snafu(display("Invalid name '{}': names cannot be empty or contain '/'", name))]
    InvalidName { name: String },
    #[snafu(display("{}", source))]
    Operation { source: OperationError },
    #[snafu(display("{}", source))]
    Tree { source: TreeError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::parse;

    const SAMPLE: &str = "\
home/
    x/
        notes
            from x
        inner/
    y/
        notes
            from y
    readme
";

    fn session() -> Session {
        Session::new(parse(SAMPLE).unwrap())
    }

    fn child_names(session: &Session) -> Vec<String> {
        let tree = session.tree();
        tree.children(session.cursor())
            .map(|id| tree.entry(id).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn starts_at_root() {
        let session = session();

        assert_eq!(session.cursor(), session.tree().root());
        assert_eq!(session.current_path().unwrap(), "/home");
    }

    #[test]
    fn cd_parent_at_root_is_reported_and_keeps_cursor() {
        let mut session = session();

        let result = session.change_directory("..");

        assert!(matches!(result, Err(SessionError::AlreadyAtRoot)));
        assert_eq!(session.cursor(), session.tree().root());
    }

    #[test]
    fn cd_searches_whole_tree_and_back_up() {
        let mut session = session();

        session.change_directory("inner").unwrap();
        assert_eq!(session.current_path().unwrap(), "/home/x/inner");

        session.change_directory("..").unwrap();
        assert_eq!(session.current_path().unwrap(), "/home/x");

        session.change_directory("y").unwrap();
        assert_eq!(session.current_path().unwrap(), "/home/y");
    }

    #[test]
    fn cd_into_file_is_rejected() {
        let mut session = session();

        let result = session.change_directory("readme");

        assert!(matches!(result, Err(SessionError::NotAFolder { .. })));
        assert_eq!(session.cursor(), session.tree().root());
    }

    #[test]
    fn cd_to_unknown_folder_is_reported() {
        let mut session = session();

        let result = session.change_directory("nowhere");

        assert!(matches!(
            result,
            Err(SessionError::FolderNotFound { name }) if name == "nowhere"
        ));
    }

    #[test]
    fn mkdir_and_touch_insert_at_head_of_current_folder() {
        let mut session = session();
        session.change_directory("y").unwrap();

        session.make_folder("archive").unwrap();
        session.touch("draft").unwrap();

        assert_eq!(child_names(&session), ["draft", "archive", "notes"]);
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut session = session();
        let before = session.tree().len();

        assert!(matches!(
            session.make_folder("a/b"),
            Err(SessionError::InvalidName { .. })
        ));
        assert!(matches!(
            session.touch(""),
            Err(SessionError::InvalidName { .. })
        ));
        assert!(matches!(
            session.rename_folder("x", "x/"),
            Err(SessionError::InvalidName { .. })
        ));
        assert_eq!(session.tree().len(), before);
    }

    #[test]
    fn rename_file_is_scope_local() {
        let mut session = session();
        session.change_directory("x").unwrap();

        session.rename_file("notes", "journal").unwrap();

        assert_eq!(child_names(&session), ["journal", "inner"]);
        session.change_directory("y").unwrap();
        assert_eq!(child_names(&session), ["notes"]);
    }

    #[test]
    fn rename_folder_does_not_touch_files() {
        let mut session = session();

        let result = session.rename_folder("readme", "other");

        assert!(matches!(
            result,
            Err(SessionError::Operation {
                source: OperationError::NotInFolder { .. }
            })
        ));
    }

    #[test]
    fn remove_redirects_cursor_out_of_removed_subtree() {
        let mut session = session();
        session.change_directory("inner").unwrap();

        let removed = session.remove("x").unwrap();

        assert_eq!(removed.count, 3);
        assert_eq!(session.cursor(), session.tree().root());
        assert_eq!(session.current_path().unwrap(), "/home");
    }

    #[test]
    fn remove_elsewhere_keeps_cursor() {
        let mut session = session();
        session.change_directory("y").unwrap();
        let cursor = session.cursor();

        session.remove("x").unwrap();

        assert_eq!(session.cursor(), cursor);
        assert_eq!(session.tree().find_by_name("inner"), None);
    }

    #[test]
    fn remove_unknown_name_is_not_found() {
        let mut session = session();

        let result = session.remove("ghost");

        assert!(matches!(
            result,
            Err(SessionError::Operation {
                source: OperationError::NotFound { .. }
            })
        ));
    }

    #[test]
    fn file_content_is_read_from_current_folder_only() {
        let mut session = session();

        assert!(matches!(
            session.file_content("notes"),
            Err(SessionError::FileNotFound { .. })
        ));
        assert!(matches!(
            session.file_content("x"),
            Err(SessionError::NotAFile { .. })
        ));

        session.change_directory("y").unwrap();
        assert_eq!(session.file_content("notes").unwrap(), ["from y"]);
    }

    #[test]
    fn replace_content_updates_file() {
        let mut session = session();
        session.change_directory("x").unwrap();

        session
            .replace_content("notes", vec!["new".into(), String::new()])
            .unwrap();

        assert_eq!(session.file_content("notes").unwrap(), ["new", ""]);
    }

    #[test]
    fn listing_starts_at_current_folder() {
        let mut session = session();
        session.change_directory("x").unwrap();

        let listing = session
            .listing()
            .into_iter()
            .map(|(depth, entry)| (depth, entry.name().to_string()))
            .collect::<Vec<_>>();

        assert_eq!(
            listing,
            [
                (0, "x".to_string()),
                (1, "notes".to_string()),
                (1, "inner".to_string()),
            ]
        );
    }
}
