use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{debug, trace};

use super::tree::{Entry, NodeId, Tree, TreeError};

const QUOTE: char = '"';

/// Incremental reader for the indented tree text.
///
/// Lines are fed one at a time. The parser keeps a cursor on the folder that
/// last opened a level, and remembers the file whose content lines may still
/// follow. There is no lookahead: every decision is made from the current
/// line and that state.
#[derive(Debug, Default)]
pub struct Parser {
    state: Option<ParseState>,
}

#[derive(Debug)]
struct ParseState {
    tree: Tree,
    folder: NodeId,
    /// Indentation of every folder from the root down to `folder`
    levels: Vec<usize>,
    open_file: Option<(NodeId, usize)>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one source line. `number` is 1-based and only used for errors.
    pub fn feed_line(&mut self, number: usize, line: &str) -> Result<(), ParseError> {
        if line.trim().is_empty() {
            return Ok(());
        }

        let indentation = indentation_of(line);
        // indentation characters are single-byte
        let trimmed = &line[indentation..];

        if let Some(state) = &mut self.state {
            return state.feed(number, trimmed, indentation);
        }

        self.state = Some(ParseState::start(number, trimmed, indentation)?);
        Ok(())
    }

    pub fn finish(self) -> Result<Tree, ParseError> {
        let state = self.state.context(EmptySnafu)?;
        debug!("Parsed tree with {} entries", state.tree.len());
        Ok(state.tree)
    }
}

impl ParseState {
    fn start(number: usize, trimmed: &str, indentation: usize) -> Result<Self, ParseError> {
        match classify(trimmed) {
            Entry::Folder { name } => {
                debug!("Root folder '{}' at line {}", name, number);
                let tree = Tree::new(name);
                Ok(ParseState {
                    folder: tree.root(),
                    tree,
                    levels: vec![indentation],
                    open_file: None,
                })
            }
            Entry::File { name, .. } => LeadingFileSnafu { line: number, name }.fail(),
        }
    }

    fn feed(&mut self, number: usize, trimmed: &str, indentation: usize) -> Result<(), ParseError> {
        if let Some((file, file_indentation)) = self.open_file {
            if indentation > file_indentation {
                trace!("Content line {} for file", number);
                if let Some(Entry::File { content, .. }) = self.tree.entry_mut(file) {
                    content.push(unquote(trimmed).to_string());
                }
                return Ok(());
            }
            self.open_file = None;
        }

        let entry = classify(trimmed);
        let parent = self.resolve_parent(number, &entry, indentation)?;
        let is_folder = entry.is_folder();
        let id = self
            .tree
            .append_child(parent, entry)
            .context(StructureSnafu { line: number })?;

        if is_folder {
            self.folder = id;
            self.levels.push(indentation);
        } else {
            self.open_file = Some((id, indentation));
        }
        Ok(())
    }

    fn level(&self) -> usize {
        self.levels.last().copied().unwrap_or_default()
    }

    /// Picks the folder the new line belongs to. On a dedent the cursor
    /// walks up to the closest ancestor opened at or above the line's
    /// indentation. The line is then a child of the cursor if still deeper,
    /// a sibling otherwise. Beside the root only files are accepted, and
    /// they fall back to the root itself.
    fn resolve_parent(
        &mut self,
        number: usize,
        entry: &Entry,
        indentation: usize,
    ) -> Result<NodeId, ParseError> {
        while self.levels.len() > 1 && self.level() > indentation {
            let Some(parent) = self.tree.parent(self.folder) else {
                break;
            };
            self.folder = parent;
            self.levels.pop();
        }

        if indentation > self.level() {
            return Ok(self.folder);
        }

        match self.tree.parent(self.folder) {
            Some(parent) => Ok(parent),
            None if entry.is_file() => {
                debug!("Line {}: file '{}' attached to the root", number, entry.name());
                Ok(self.folder)
            }
            None => SecondRootSnafu {
                line: number,
                name: entry.name(),
            }
            .fail(),
        }
    }
}

/// Parses a whole tree text
pub fn parse(text: &str) -> Result<Tree, ParseError> {
    let mut parser = Parser::new();
    for (index, line) in text.lines().enumerate() {
        parser.feed_line(index + 1, line)?;
    }
    parser.finish()
}

impl TryFrom<&str> for Tree {
    type Error = ParseError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        parse(text)
    }
}

fn indentation_of(line: &str) -> usize {
    line.chars().take_while(|c| matches!(c, ' ' | '\t')).count()
}

fn classify(trimmed: &str) -> Entry {
    match trimmed.strip_suffix('/') {
        Some(name) => Entry::folder(name),
        None => Entry::file(trimmed),
    }
}

fn unquote(line: &str) -> &str {
    if line.len() > 1 && line.starts_with(QUOTE) && line.ends_with(QUOTE) {
        &line[1..line.len() - 1]
    } else {
        line
    }
}

#[derive(Debug, Snafu)]
pub enum ParseError {
    #[snafu(display("Line {}: the first entry '{}' must be a folder", line, name))]
    LeadingFile { line: usize, name: String },
    #[snafu(display(
        "Line {}: folder '{}' would sit next to the root folder, only one root is allowed",
        line,
        name
    ))]
    SecondRoot { line: usize, name: String },
    #[snafu(display("The tree text contains no entries"))]
    Empty,
    #[snafu(display("Line {}: failed to attach entry", line))]
    Structure { line: usize, source: TreeError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn child_names(tree: &Tree, parent: NodeId) -> Vec<String> {
        tree.children(parent)
            .map(|id| tree.entry(id).unwrap().name().to_string())
            .collect()
    }

    fn child(tree: &Tree, parent: NodeId, name: &str) -> NodeId {
        tree.children(parent)
            .find(|&id| tree.entry(id).unwrap().name() == name)
            .unwrap_or_else(|| panic!("no child named {name}"))
    }

    #[test]
    fn parses_nested_folders_files_and_content() {
        let text = "a/\n    b/\n        c\n            hello\n            \"  spaced  \"\n    d\n";

        let tree = parse(text).unwrap();

        let root = tree.root();
        assert_eq!(tree.entry(root), Some(&Entry::folder("a")));
        assert_eq!(child_names(&tree, root), ["b", "d"]);

        let b = child(&tree, root, "b");
        assert_eq!(tree.entry(b), Some(&Entry::folder("b")));
        let c = child(&tree, b, "c");
        assert_eq!(
            tree.entry(c).unwrap().content().unwrap(),
            ["hello", "  spaced  "]
        );

        let d = child(&tree, root, "d");
        assert_eq!(tree.entry(d), Some(&Entry::file("d")));
    }

    #[test]
    fn equal_indentation_folders_are_siblings_in_file_order() {
        let tree = parse("root/\n    first/\n    second/\n    third/\n").unwrap();

        assert_eq!(child_names(&tree, tree.root()), ["first", "second", "third"]);
    }

    #[test]
    fn dedent_reattaches_to_matching_ancestor() {
        let text = "\
r/
    a/
        b/
            c/
                deep
        back_in_a/
    back_in_r
";
        let tree = parse(text).unwrap();

        let root = tree.root();
        let a = child(&tree, root, "a");
        assert_eq!(child_names(&tree, root), ["a", "back_in_r"]);
        assert_eq!(child_names(&tree, a), ["b", "back_in_a"]);
        let b = child(&tree, a, "b");
        let c = child(&tree, b, "c");
        assert_eq!(child_names(&tree, c), ["deep"]);
    }

    #[test]
    fn files_do_not_move_the_cursor() {
        let tree = parse("r/\n    f\n    g\n    sub/\n        h\n").unwrap();

        let root = tree.root();
        assert_eq!(child_names(&tree, root), ["f", "g", "sub"]);
        assert_eq!(child_names(&tree, child(&tree, root, "sub")), ["h"]);
    }

    #[test]
    fn content_ends_at_same_or_lower_indentation() {
        let text = "r/\n    notes\n        line one\n        line/two/\n    next/\n";
        let tree = parse(text).unwrap();

        let root = tree.root();
        let notes = child(&tree, root, "notes");
        assert_eq!(
            tree.entry(notes).unwrap().content().unwrap(),
            ["line one", "line/two/"]
        );
        assert_eq!(tree.entry(child(&tree, root, "next")), Some(&Entry::folder("next")));
    }

    #[test]
    fn blank_lines_are_skipped_everywhere() {
        let text = "\n   \nr/\n\n    f\n        one\n\t\n        two\n";
        let tree = parse(text).unwrap();

        let f = child(&tree, tree.root(), "f");
        assert_eq!(tree.entry(f).unwrap().content().unwrap(), ["one", "two"]);
    }

    #[test]
    fn tabs_count_as_single_indentation_characters() {
        let tree = parse("r/\n\tsub/\n\t\tfile\n\tother\n").unwrap();

        let root = tree.root();
        assert_eq!(child_names(&tree, root), ["sub", "other"]);
        assert_eq!(child_names(&tree, child(&tree, root, "sub")), ["file"]);
    }

    #[rstest]
    #[case("\"quoted\"", "quoted")]
    #[case("\"\"", "")]
    #[case("\"", "\"")]
    #[case("\"half", "\"half")]
    #[case("plain", "plain")]
    #[case("\"\"inner\"\"", "\"inner\"")]
    fn content_quotes_are_stripped(#[case] raw: &str, #[case] expected: &str) {
        let text = format!("r/\n    f\n        {raw}\n");
        let tree = parse(&text).unwrap();

        let f = child(&tree, tree.root(), "f");
        assert_eq!(tree.entry(f).unwrap().content().unwrap(), [expected]);
    }

    #[rstest]
    #[case("file\n")]
    #[case("\n\n    file\nfolder/\n")]
    fn leading_file_is_an_error(#[case] text: &str) {
        let result = parse(text);

        assert!(matches!(
            result,
            Err(ParseError::LeadingFile { name, .. }) if name == "file"
        ));
    }

    #[test]
    fn leading_file_error_names_the_line() {
        let error = parse("\n\nstray\n").unwrap_err();

        assert!(matches!(error, ParseError::LeadingFile { line: 3, .. }));
        assert!(error.to_string().contains("stray"));
    }

    #[rstest]
    #[case("")]
    #[case("\n  \n\t\n")]
    fn empty_input_is_an_error(#[case] text: &str) {
        assert!(matches!(parse(text), Err(ParseError::Empty)));
    }

    #[rstest]
    #[case("a/\nb/\n")]
    #[case("a/\n    x/\nb/\n")]
    #[case("    a/\nb/\n")]
    fn second_top_level_entry_is_an_error(#[case] text: &str) {
        assert!(matches!(
            parse(text),
            Err(ParseError::SecondRoot { .. })
        ));
    }

    #[rstest]
    #[case::two_spaces("r/\n  a/\n    b/\n      deep/\n  c/\n")]
    #[case::tabs("r/\n\ta/\n\t\tb/\n\t\t\tdeep/\n\tc/\n")]
    fn narrow_dedent_reattaches_to_matching_ancestor(#[case] text: &str) {
        let tree = parse(text).unwrap();

        let root = tree.root();
        assert_eq!(child_names(&tree, root), ["a", "c"]);
        let a = child(&tree, root, "a");
        assert_eq!(child_names(&tree, a), ["b"]);
        assert_eq!(child_names(&tree, child(&tree, a, "b")), ["deep"]);
    }

    #[test]
    fn two_space_dedent_by_one_level_stays_in_parent() {
        let tree = parse("r/\n  a/\n    b/\n      c/\n    d/\n").unwrap();

        let a = child(&tree, tree.root(), "a");
        assert_eq!(child_names(&tree, a), ["b", "d"]);
        assert_eq!(child_names(&tree, child(&tree, a, "b")), ["c"]);
    }

    #[test]
    fn dedent_between_levels_nests_under_shallower_folder() {
        let tree = parse("r/\n    a/\n        b/\n            c/\n      x/\n").unwrap();

        let a = child(&tree, tree.root(), "a");
        assert_eq!(child_names(&tree, a), ["b", "x"]);
    }

    #[rstest]
    #[case::same_level_as_root("home/\nreadme\n", &["readme"])]
    #[case::after_dedent("home/\n    docs/\nnotes\n", &["docs", "notes"])]
    #[case::below_indented_root("    home/\nnotes\n", &["notes"])]
    fn file_beside_root_joins_the_root(#[case] text: &str, #[case] expected: &[&str]) {
        let tree = parse(text).unwrap();

        assert_eq!(child_names(&tree, tree.root()), expected);
    }

    #[test]
    fn content_follows_file_attached_to_root() {
        let tree = parse("home/\nreadme\n    hello\n").unwrap();

        let readme = child(&tree, tree.root(), "readme");
        assert_eq!(tree.entry(readme).unwrap().content().unwrap(), ["hello"]);
    }

    #[test]
    fn try_from_str_parses() {
        let tree: Result<Tree, _> = "r/\n    a/\n".try_into();

        assert_eq!(tree.unwrap().len(), 2);
    }
}
