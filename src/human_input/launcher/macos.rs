use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::{TerminalLauncher, TerminalProcess};
use crate::error::{Error, Result};

/// File name of the shim Terminal.app opens
pub const SHIM_FILE_NAME: &str = "launch.command";

/// AppleScript run by `osascript`. It opens the shim in a new Terminal tab and
/// stays alive while the tab is busy, so the `osascript` process tracks the
/// lifetime of the front-end.
const APPLESCRIPT: &[&str] = &[
    "on run argv",
    "tell application \"Terminal\"",
    "activate",
    "set shimCommand to (quoted form of (item 1 of argv)) & \"; exit\"",
    "set frontTab to do script shimCommand",
    "delay 1",
    "repeat while busy of frontTab",
    "delay 1",
    "end repeat",
    "end tell",
    "end run",
];

/// Opens the script in Terminal.app through a generated `.command` shim.
#[derive(Debug, Clone)]
pub struct TerminalAppLauncher {
    interpreter: String,
}

impl Default for TerminalAppLauncher {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl TerminalAppLauncher {
    /// Create a launcher running the script with `interpreter`
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Shim content: run the script from its own directory so no path needs quoting
    pub fn shim_content(&self, script_name: &str) -> String {
        format!(
            "#!/bin/sh\ncd \"$(dirname \"$0\")\" || exit 1\nexec {} ./{}\n",
            self.interpreter, script_name
        )
    }

    async fn write_shim(&self, script: &Path) -> Result<PathBuf> {
        let dir = script
            .parent()
            .ok_or_else(|| Error::Launch(format!("script {} has no parent", script.display())))?;
        let script_name = script
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Launch(format!("unusable script name {}", script.display())))?;

        let shim = dir.join(SHIM_FILE_NAME);
        tokio::fs::write(&shim, self.shim_content(script_name))
            .await
            .map_err(|e| Error::Launch(format!("failed to write shim: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&shim, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(|e| Error::Launch(format!("failed to mark shim executable: {}", e)))?;
        }

        Ok(shim)
    }
}

#[async_trait]
impl TerminalLauncher for TerminalAppLauncher {
    fn name(&self) -> &str {
        "terminal-app"
    }

    #[instrument(skip(self))]
    async fn launch(&self, script: &Path) -> Result<Option<TerminalProcess>> {
        if which::which("osascript").is_err() {
            debug!("osascript not found");
            return Ok(None);
        }
        if which::which(&self.interpreter).is_err() {
            warn!(program = %self.interpreter, "Interpreter not found, cannot launch front-end");
            return Ok(None);
        }

        let shim = self.write_shim(script).await?;

        let mut command = Command::new("osascript");
        for line in APPLESCRIPT {
            command.arg("-e").arg(line);
        }
        command
            .arg(&shim)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| Error::Launch(format!("failed to start osascript: {}", e)))?;

        debug!(pid = ?child.id(), shim = %shim.display(), "Opened Terminal.app front-end");
        Ok(Some(TerminalProcess::new(child, self.name())))
    }
}
