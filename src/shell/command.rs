use std::str::SplitWhitespace;

use snafu::{OptionExt, Snafu};

pub const HELP: &str = "\
Available commands:
  cd <folder>            change to the named folder
  cd ..                  move up one level
  ls                     list the current folder
  pwd                    print the current path
  mkdir <name>           create a folder in the current folder
  touch <name>           create a file in the current folder
  rm <name>              remove a file or folder (searched from the root)
  cnfolder <old> <new>   rename a folder in the current folder
  cnfile <old> <new>     rename a file in the current folder
  cat <file>             print a file of the current folder
  edit <file>            replace the content of a file of the current folder
  help                   show this list
  exit                   save the tree and quit";

/// One parsed shell input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    ChangeDirectory(String),
    List,
    PrintPath,
    MakeFolder(String),
    Touch(String),
    Remove(String),
    RenameFolder { old: String, new: String },
    RenameFile { old: String, new: String },
    Show(String),
    Edit(String),
    Exit,
}

impl Command {
    /// Parses a whitespace separated command line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandParseError> {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Ok(None);
        };

        let command = match keyword {
            "help" => Command::Help,
            "cd" => Command::ChangeDirectory(argument(&mut tokens, keyword, "folder")?),
            "ls" => Command::List,
            "pwd" => Command::PrintPath,
            "mkdir" => Command::MakeFolder(argument(&mut tokens, keyword, "name")?),
            "touch" => Command::Touch(argument(&mut tokens, keyword, "name")?),
            "rm" => Command::Remove(argument(&mut tokens, keyword, "name")?),
            "cnfolder" => Command::RenameFolder {
                old: argument(&mut tokens, keyword, "old name")?,
                new: argument(&mut tokens, keyword, "new name")?,
            },
            "cnfile" => Command::RenameFile {
                old: argument(&mut tokens, keyword, "old name")?,
                new: argument(&mut tokens, keyword, "new name")?,
            },
            "cat" => Command::Show(argument(&mut tokens, keyword, "file")?),
            "edit" => Command::Edit(argument(&mut tokens, keyword, "file")?),
            "exit" => Command::Exit,
            other => return UnknownCommandSnafu { command: other }.fail(),
        };

        if let Some(extra) = tokens.next() {
            return UnexpectedArgumentSnafu {
                command: keyword,
                argument: extra,
            }
            .fail();
        }

        Ok(Some(command))
    }
}

fn argument(
    tokens: &mut SplitWhitespace<'_>,
    command: &str,
    argument: &'static str,
) -> Result<String, CommandParseError> {
    tokens
        .next()
        .map(str::to_string)
        .context(MissingArgumentSnafu { command, argument })
}

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum CommandParseError {
    #[snafu(display("Unknown command: {} (type 'help' for the list)", command))]
    UnknownCommand { command: String },
    #[snafu(display("'{}' expects a {} argument", command, argument))]
    MissingArgument {
        command: String,
        argument: &'static str,
    },
    #[snafu(display("'{}' does not take the extra argument '{}'", command, argument))]
    UnexpectedArgument { command: String, argument: String },
}
