use std::io::{self, BufRead, Write};

use colored::Colorize;
use snafu::{ResultExt, Snafu};
use tracing::debug;

use crate::filesystem::{Entry, INDENT_STEP};
use crate::shell::command::{Command, HELP};
use crate::shell::session::{Session, SessionError};

/// Line that ends the replacement content typed after `edit`
pub const EDIT_SENTINEL: &str = "---EOF---";

const PROMPT_SUFFIX: &str = "> ";

/// How the interactive loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    /// The user typed `exit`
    Command,
    /// The input stream closed
    EndOfInput,
}

/// Line-oriented shell driving a [`Session`] from `input`, writing to `output`
pub struct Repl<R, W> {
    session: Session,
    input: R,
    output: W,
    color: bool,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(session: Session, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Reads and executes commands until `exit` or the end of input
    pub fn run(&mut self) -> Result<ReplExit, ReplError> {
        loop {
            self.prompt()?;
            let Some(line) = self.read_line()? else {
                debug!("Input closed");
                self.write_line("")?;
                return Ok(ReplExit::EndOfInput);
            };

            match Command::parse(&line) {
                Ok(Some(Command::Exit)) => return Ok(ReplExit::Command),
                Ok(Some(command)) => self.execute(command)?,
                Ok(None) => {}
                Err(error) => {
                    debug!("Rejected input line: {}", error);
                    self.write_line(&error.to_string())?;
                }
            }
        }
    }

    /// Gives back the session and the output stream
    pub fn finish(self) -> (Session, W) {
        (self.session, self.output)
    }

    fn execute(&mut self, command: Command) -> Result<(), ReplError> {
        debug!("Executing {:?}", command);
        let message = match command {
            Command::Help => HELP.to_string(),
            Command::ChangeDirectory(target) => match self.session.change_directory(&target) {
                Ok(_) => return Ok(()),
                Err(error) => error.to_string(),
            },
            Command::List => return self.print_listing(),
            Command::PrintPath => self.session.current_path().context(SessionSnafu)?,
            Command::MakeFolder(name) => report(self.session.make_folder(&name), |_| {
                format!("Folder '{name}' created")
            }),
            Command::Touch(name) => {
                report(self.session.touch(&name), |_| format!("File '{name}' created"))
            }
            Command::Remove(name) => report(self.session.remove(&name), |removed| {
                format!(
                    "Removed {} '{}' ({} entries)",
                    removed.entry.kind(),
                    name,
                    removed.count
                )
            }),
            Command::RenameFolder { old, new } => {
                report(self.session.rename_folder(&old, &new), |_| {
                    format!("Folder '{old}' renamed to '{new}'")
                })
            }
            Command::RenameFile { old, new } => report(self.session.rename_file(&old, &new), |_| {
                format!("File '{old}' renamed to '{new}'")
            }),
            Command::Show(name) => report(self.session.file_content(&name), |lines| lines.join("\n")),
            Command::Edit(name) => return self.edit(&name),
            Command::Exit => return Ok(()),
        };
        self.write_line(&message)
    }

    fn print_listing(&mut self) -> Result<(), ReplError> {
        let color = self.color;
        for (depth, entry) in self.session.listing() {
            let indent = " ".repeat(depth * INDENT_STEP);
            let written = match entry {
                Entry::Folder { name } if color => {
                    writeln!(self.output, "{indent}{}", format!("{name}/").blue().bold())
                }
                Entry::Folder { name } => writeln!(self.output, "{indent}{name}/"),
                Entry::File { name, .. } => writeln!(self.output, "{indent}{name}"),
            };
            written.context(OutputSnafu)?;
        }
        Ok(())
    }

    fn edit(&mut self, name: &str) -> Result<(), ReplError> {
        let current = match self.session.file_content(name).map(|lines| lines.join("\n")) {
            Ok(current) => current,
            Err(error) => return self.write_line(&error.to_string()),
        };

        self.write_line(&format!("Current content of '{name}':"))?;
        self.write_line("---START_CONTENT---")?;
        self.write_line(&current)?;
        self.write_line("---END_CONTENT---")?;
        self.write_line(&format!(
            "Enter the new content, finish with '{EDIT_SENTINEL}' on a line of its own:"
        ))?;

        let lines = self.read_until_sentinel()?;
        let message = report(self.session.replace_content(name, lines), |_| {
            format!("Content of '{name}' updated")
        });
        self.write_line(&message)
    }

    /// Collects lines up to the sentinel. If the input ends first, whatever
    /// was collected is kept.
    fn read_until_sentinel(&mut self) -> Result<Vec<String>, ReplError> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line == EDIT_SENTINEL {
                return Ok(lines);
            }
            lines.push(line);
        }
        debug!(
            "Input ended before '{}', keeping {} lines",
            EDIT_SENTINEL,
            lines.len()
        );
        Ok(lines)
    }

    fn prompt(&mut self) -> Result<(), ReplError> {
        let path = self.session.current_path().context(SessionSnafu)?;
        write!(self.output, "{path}{PROMPT_SUFFIX}").context(OutputSnafu)?;
        self.output.flush().context(OutputSnafu)
    }

    fn read_line(&mut self) -> Result<Option<String>, ReplError> {
        let mut buffer = String::new();
        let read = self.input.read_line(&mut buffer).context(InputSnafu)?;
        if read == 0 {
            return Ok(None);
        }
        let length = buffer.trim_end_matches(['\n', '\r']).len();
        buffer.truncate(length);
        Ok(Some(buffer))
    }

    fn write_line(&mut self, text: &str) -> Result<(), ReplError> {
        writeln!(self.output, "{text}").context(OutputSnafu)
    }
}

fn report<T>(result: Result<T, SessionError>, success: impl FnOnce(T) -> String) -> String {
    match result {
        Ok(value) => success(value),
        Err(error) => error.to_string(),
    }
}

#[derive(Debug, Snafu)]
pub enum ReplError {
    #[snafu(display("Failed to read from the terminal"))]
    InputError { source: io::Error },
    #[snafu(display("Failed to write to the terminal"))]
    OutputError { source: io::Error },
    #[snafu(display("Shell session is in an inconsistent state"))]
    SessionError { source: SessionError },
}
