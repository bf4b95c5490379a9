//! Interactive command layer over a loaded tree.

mod command;
mod repl;
mod session;

pub use repl::{Repl, ReplError, ReplExit};
pub use session::Session;
