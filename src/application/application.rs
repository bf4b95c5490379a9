use std::io::{self, BufRead, Write};

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::ext::BestEffortPathExt;
use crate::filesystem::{self, StorageError};
use crate::shell::{Repl, ReplError, ReplExit, Session};

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        debug!("Runtime config: {:?}", app_config);

        let stdin = io::stdin();
        let stdout = io::stdout();
        Self::run_with(&app_config, stdin.lock(), stdout.lock()).await?;
        Ok(())
    }

    /// Loads the tree, runs the shell over `input`/`output`, then saves the
    /// tree back to the same file
    pub async fn run_with<R: BufRead, W: Write>(
        app_config: &RuntimeConfig,
        input: R,
        output: W,
    ) -> Result<ReplExit, ApplicationError> {
        let tree = filesystem::load(&app_config.file)
            .await
            .context(LoadSnafu)?;

        let mut repl = Repl::new(Session::new(tree), input, output).with_color(app_config.color);
        let exit = repl.run().context(ShellSnafu)?;
        info!("Shell finished: {:?}", exit);

        let (session, mut output) = repl.finish();
        filesystem::save(&app_config.file, session.tree())
            .await
            .context(SaveSnafu)?;
        writeln!(
            output,
            "Tree saved to {}",
            app_config.file.best_effort_path_display()
        )
        .context(ReportSnafu)?;

        Ok(exit)
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Could not load the tree"))]
    LoadError { source: StorageError },
    #[snafu(display("The interactive shell failed"))]
    ShellError { source: ReplError },
    #[snafu(display("Could not save the tree, changes are lost"))]
    SaveError { source: StorageError },
    #[snafu(display("Failed to report the saved tree"))]
    ReportError { source: io::Error },
}
