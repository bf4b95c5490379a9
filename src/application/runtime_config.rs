use std::path::PathBuf;

use supports_color::Stream;

use crate::cli::Cli;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Tree file to load and save
    pub file: PathBuf,
    /// Whether listings may use terminal colors
    pub color: bool,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            file: cli.file,
            color: !cli.no_color && supports_color::on(Stream::Stdout).is_some(),
        }
    }
}
