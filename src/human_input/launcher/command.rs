use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::{TerminalLauncher, TerminalProcess};
use crate::error::{Error, Result};

/// `CREATE_NO_WINDOW`: keeps the `cmd.exe` wrapper itself invisible
pub const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Launches the script by running `program args... <script>`.
///
/// Covers terminal emulators that take a command line (`xterm -e python3 ...`)
/// and the Windows `cmd /C start "" /WAIT powershell ... -File <script>` form.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    name: String,
    program: String,
    args: Vec<String>,
    requires: Vec<String>,
    creation_flags: u32,
}

impl CommandLauncher {
    /// Create a launcher that runs `program args... <script>`
    pub fn new<I, S>(name: impl Into<String>, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        Self {
            name: name.into(),
            requires: vec![program.clone()],
            program,
            args: args.into_iter().map(Into::into).collect(),
            creation_flags: 0,
        }
    }

    /// Also require `program` to be on `PATH` (typically the script interpreter)
    pub fn requiring(mut self, program: impl Into<String>) -> Self {
        self.requires.push(program.into());
        self
    }

    /// Windows process creation flags; ignored elsewhere
    pub fn with_creation_flags(mut self, flags: u32) -> Self {
        self.creation_flags = flags;
        self
    }

    /// A terminal emulator that runs `interpreter <script>` after `args`
    pub fn terminal(name: &str, args: &[&str], interpreter: &str) -> Self {
        let mut all: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        all.push(interpreter.to_string());
        Self::new(name, name, all).requiring(interpreter)
    }

    /// `cmd /C start "" /WAIT <shell> ... -File <script>`: a new console window whose
    /// lifetime the invisible `cmd.exe` wrapper tracks.
    ///
    /// The shell is not spawned directly with `CREATE_NEW_CONSOLE`: the null stdio
    /// handles given to the child would replace the new console's input.
    pub fn windows_console(shell: &str) -> Self {
        Self::new(
            shell,
            "cmd.exe",
            [
                "/C",
                "start",
                "",
                "/WAIT",
                shell,
                "-NoProfile",
                "-ExecutionPolicy",
                "Bypass",
                "-File",
            ],
        )
        .requiring(shell)
        .with_creation_flags(CREATE_NO_WINDOW)
    }

    /// Program that is spawned
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments placed before the script path
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Windows process creation flags
    pub fn creation_flags(&self) -> u32 {
        self.creation_flags
    }

    fn missing_requirement(&self) -> Option<&str> {
        self.requires
            .iter()
            .find(|program| which::which(program.as_str()).is_err())
            .map(String::as_str)
    }
}

#[async_trait]
impl TerminalLauncher for CommandLauncher {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(launcher = %self.name))]
    async fn launch(&self, script: &Path) -> Result<Option<TerminalProcess>> {
        if let Some(missing) = self.missing_requirement() {
            if missing == self.program {
                debug!(program = %missing, "Terminal program not found");
            } else {
                warn!(program = %missing, "Interpreter not found, cannot launch front-end");
            }
            return Ok(None);
        }

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        command.process_group(0);

        #[cfg(windows)]
        if self.creation_flags() != 0 {
            command.creation_flags(self.creation_flags());
        }

        let child = command
            .spawn()
            .map_err(|e| Error::Launch(format!("failed to start {}: {}", self.program, e)))?;

        debug!(pid = ?child.id(), "Started terminal front-end");
        Ok(Some(TerminalProcess::new(child, self.name.clone())))
    }
}
