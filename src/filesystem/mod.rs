//! In-memory folder/file tree and its indented text representation.
//!
//! The tree lives in an arena addressed by [`NodeId`] handles. The text
//! format puts one entry per line, folders end with `/`, nesting is expressed
//! by indentation and file content lines sit one level below their file.

mod operations;
mod parser;
mod serializer;
mod storage;
mod tree;

/// Width of one nesting level, in indentation characters
pub const INDENT_STEP: usize = 4;

pub use operations::OperationError;
pub use parser::{ParseError, parse};
pub use serializer::serialize;
pub use storage::{StorageError, load, save};
pub use tree::{Entry, EntryKind, NodeId, Removed, Tree, TreeError};
