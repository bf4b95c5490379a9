use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Browse and edit a folder tree stored as indented text")]
pub struct Cli {
    /// Tree file loaded at startup and written back on exit
    #[clap(default_value = "directory.txt")]
    pub file: PathBuf,
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// Never color folder names in listings
    #[clap(long)]
    pub no_color: bool,
}
