use std::path::{Path, PathBuf};

use compio::fs;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

use super::parser::ParseError;
use super::serializer::serialize;
use super::tree::Tree;
use crate::ext::BestEffortPathExt;

/// Reads and parses the tree file at `path`
pub async fn load(path: &Path) -> Result<Tree, StorageError> {
    debug!("Opening tree file: {}", path.best_effort_path_display());
    let bytes = fs::read(path).await.context(ReadSnafu { path })?;
    debug!("Read {} bytes", bytes.len());

    let text = String::from_utf8(bytes).context(EncodingSnafu { path })?;
    let tree = Tree::try_from(text.as_str()).context(ParseSnafu { path })?;

    info!(
        "Loaded {} entries from {}",
        tree.len(),
        path.best_effort_path_display()
    );
    Ok(tree)
}

/// Serializes `tree` over the file at `path`
pub async fn save(path: &Path, tree: &Tree) -> Result<(), StorageError> {
    let text = serialize(tree);
    debug!(
        "Writing {} bytes to {}",
        text.len(),
        path.best_effort_path_display()
    );

    fs::write(path, text.into_bytes())
        .await
        .0
        .context(WriteSnafu { path })?;

    info!(
        "Saved {} entries to {}",
        tree.len(),
        path.best_effort_path_display()
    );
    Ok(())
}

#[derive(Debug, Snafu)]
pub enum StorageError {
    #[snafu(display("Failed to read the tree file: {}", path.best_effort_path_display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("The tree file {} is not valid UTF-8", path.best_effort_path_display()))]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the tree file {}", path.best_effort_path_display()))]
    ParseError { path: PathBuf, source: ParseError },
    #[snafu(display("Failed to write the tree file: {}", path.best_effort_path_display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}
