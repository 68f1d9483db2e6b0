use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use tokio::process::Child;
use tracing::{debug, warn};

/// A running terminal front-end.
///
/// Owned by the exchange for the length of the wait. The whole process tree can be
/// terminated once with [`kill_tree`](Self::kill_tree).
///
/// Many terminals hand the window to an already running server process, so the
/// script may not be a descendant of the launched child. When the script records
/// its pid in a file (see [`with_pid_file`](Self::with_pid_file)) that process is
/// terminated as well.
#[derive(Debug)]
pub struct TerminalProcess {
    child: Child,
    launcher: String,
    pid_file: Option<PathBuf>,
    terminated: bool,
}

impl TerminalProcess {
    /// Wrap a freshly spawned child.
    ///
    /// On Unix the child should lead its own process group so the tree can be
    /// signalled as a whole.
    pub fn new(child: Child, launcher: impl Into<String>) -> Self {
        Self {
            child,
            launcher: launcher.into(),
            pid_file: None,
            terminated: false,
        }
    }

    /// Also terminate the process whose id the front-end writes to `path`
    pub fn with_pid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.pid_file = Some(path.into());
        self
    }

    /// OS process id, `None` once the child has been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Name of the launcher that started this process
    pub fn launcher(&self) -> &str {
        &self.launcher
    }

    /// Whether `kill_tree` already ran
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Wait for the process to exit on its own
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Forcibly terminate the process and its descendants.
    ///
    /// Returns `false` without doing anything if the tree was already terminated.
    /// A process that exited in the meantime is not an error.
    pub async fn kill_tree(&mut self) -> bool {
        if self.terminated {
            return false;
        }
        self.terminated = true;

        let child_pid = self.child.id();
        if let Some(pid) = child_pid {
            debug!(pid, launcher = %self.launcher, "Terminating front-end process tree");
            Self::signal_tree(pid).await;
        }

        if let Some(pid) = self.recorded_pid().await {
            if Some(pid) != child_pid && pid != std::process::id() {
                debug!(pid, "Terminating front-end script outside the launcher tree");
                Self::signal_tree(pid).await;
                #[cfg(unix)]
                Self::signal_process(pid);
            }
        }

        if let Err(e) = self.child.kill().await {
            debug!(error = %e, "Front-end process already gone");
        }
        true
    }

    /// Pid written by the front-end script, if it got far enough to write one
    async fn recorded_pid(&self) -> Option<u32> {
        let path = self.pid_file.as_ref()?;
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => match contents.trim().parse::<u32>() {
                Ok(pid) if pid > 0 => Some(pid),
                _ => {
                    warn!(path = %path.display(), "Ignoring unreadable front-end pid file");
                    None
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read front-end pid file");
                None
            }
        }
    }

    /// Signal a single process, for scripts that do not lead their own group
    #[cfg(unix)]
    fn signal_process(pid: u32) {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            return;
        };
        match kill(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!(pid, error = %e, "Failed to signal front-end script"),
        }
    }

    #[cfg(unix)]
    async fn signal_tree(pid: u32) {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            warn!(pid, "Process id out of range, skipping group kill");
            return;
        };
        match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => {}
            Err(Errno::ESRCH) => debug!(pid, "Process group already gone"),
            Err(e) => warn!(pid, error = %e, "Failed to signal process group"),
        }
    }

    #[cfg(windows)]
    async fn signal_tree(pid: u32) {
        let result = tokio::process::Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await;
        match result {
            Ok(status) if status.success() => {}
            Ok(status) => debug!(pid, ?status, "taskkill reported failure"),
            Err(e) => warn!(pid, error = %e, "Failed to run taskkill"),
        }
    }
}
