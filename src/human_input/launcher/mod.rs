//! Opening the front-end script in a new, visible terminal window.
//!
//! Each platform family has one or more [`TerminalLauncher`] strategies. A
//! [`LauncherChain`] tries them in priority order and hands back the first live
//! process, so the exchange never branches on the host OS itself.

mod command;
mod macos;
mod process;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::Result;
#[cfg(not(windows))]
use crate::human_input::script::ScriptFlavor;

pub use command::{CommandLauncher, CREATE_NO_WINDOW};
pub use macos::{TerminalAppLauncher, SHIM_FILE_NAME};
pub use process::TerminalProcess;

/// A way to start the front-end script in a new terminal session
#[async_trait]
pub trait TerminalLauncher: Send + Sync + fmt::Debug {
    /// Short name used in logs and in configuration
    fn name(&self) -> &str;

    /// Start `script` without waiting for it.
    ///
    /// `Ok(None)` means this mechanism is not available on the host. `Err` means it
    /// was available but starting it failed.
    async fn launch(&self, script: &Path) -> Result<Option<TerminalProcess>>;
}

/// Priority-ordered list of launchers
#[derive(Debug, Default)]
pub struct LauncherChain {
    launchers: Vec<Box<dyn TerminalLauncher>>,
}

impl LauncherChain {
    /// Create a chain from launchers in priority order
    pub fn new(launchers: Vec<Box<dyn TerminalLauncher>>) -> Self {
        Self { launchers }
    }

    /// The default candidates for the current host
    pub fn for_host() -> Self {
        Self::new(host_launchers())
    }

    /// Host candidates restricted to, and ordered by, `names`.
    ///
    /// An empty list keeps the default order. Unknown names are logged and skipped.
    pub fn for_host_with_order(names: &[String]) -> Self {
        if names.is_empty() {
            return Self::for_host();
        }

        let mut available = host_launchers();
        let mut ordered = Vec::with_capacity(names.len());
        for name in names {
            match available.iter().position(|l| l.name() == name) {
                Some(index) => ordered.push(available.remove(index)),
                None => warn!(launcher = %name, "Unknown terminal launcher in configuration"),
            }
        }
        Self::new(ordered)
    }

    /// Add a launcher with the lowest priority
    pub fn push(&mut self, launcher: Box<dyn TerminalLauncher>) {
        self.launchers.push(launcher);
    }

    /// Names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.launchers.iter().map(|l| l.name()).collect()
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.launchers.len()
    }

    /// Whether the chain has no candidates
    pub fn is_empty(&self) -> bool {
        self.launchers.is_empty()
    }
}

#[async_trait]
impl TerminalLauncher for LauncherChain {
    fn name(&self) -> &str {
        "chain"
    }

    async fn launch(&self, script: &Path) -> Result<Option<TerminalProcess>> {
        for launcher in &self.launchers {
            match launcher.launch(script).await {
                Ok(Some(process)) => {
                    info!(launcher = launcher.name(), pid = ?process.id(), "Launched terminal front-end");
                    return Ok(Some(process));
                }
                Ok(None) => debug!(launcher = launcher.name(), "Launcher not available"),
                Err(e) => warn!(launcher = launcher.name(), error = %e, "Launcher failed"),
            }
        }
        warn!(candidates = ?self.names(), "No terminal launcher could start the front-end");
        Ok(None)
    }
}

#[cfg(windows)]
fn host_launchers() -> Vec<Box<dyn TerminalLauncher>> {
    vec![
        Box::new(CommandLauncher::windows_console("pwsh.exe")),
        Box::new(CommandLauncher::windows_console("powershell.exe")),
    ]
}

#[cfg(target_os = "macos")]
fn host_launchers() -> Vec<Box<dyn TerminalLauncher>> {
    let interpreter = ScriptFlavor::Python.interpreter();
    vec![
        Box::new(TerminalAppLauncher::new(interpreter)),
        Box::new(CommandLauncher::terminal("xterm", &["-e"], interpreter)),
    ]
}

#[cfg(all(not(windows), not(target_os = "macos")))]
fn host_launchers() -> Vec<Box<dyn TerminalLauncher>> {
    let interpreter = ScriptFlavor::Python.interpreter();
    vec![
        Box::new(CommandLauncher::terminal("x-terminal-emulator", &["-e"], interpreter)),
        Box::new(CommandLauncher::terminal("gnome-terminal", &["--wait", "--"], interpreter)),
        Box::new(CommandLauncher::terminal("konsole", &["--nofork", "-e"], interpreter)),
        Box::new(CommandLauncher::terminal("xfce4-terminal", &["--disable-server", "-x"], interpreter)),
        Box::new(CommandLauncher::terminal("xterm", &["-e"], interpreter)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Unavailable(Arc<AtomicUsize>);

    #[async_trait]
    impl TerminalLauncher for Unavailable {
        fn name(&self) -> &str {
            "unavailable"
        }

        async fn launch(&self, _script: &Path) -> Result<Option<TerminalProcess>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    #[derive(Debug)]
    struct Broken(Arc<AtomicUsize>);

    #[async_trait]
    impl TerminalLauncher for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn launch(&self, _script: &Path) -> Result<Option<TerminalProcess>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(Error::Launch("shim generation failed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_chain_tries_every_candidate_then_gives_up() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = LauncherChain::new(vec![
            Box::new(Unavailable(calls.clone())),
            Box::new(Broken(calls.clone())),
            Box::new(Unavailable(calls.clone())),
        ]);

        let result = chain.launch(Path::new("ask.py")).await.unwrap();
        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(chain.names(), vec!["unavailable", "broken", "unavailable"]);
    }

    #[tokio::test]
    async fn test_empty_chain_returns_none() {
        let chain = LauncherChain::default();
        assert!(chain.is_empty());
        assert!(chain.launch(Path::new("ask.py")).await.unwrap().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_chain_stops_at_first_live_handle() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut chain = LauncherChain::new(vec![Box::new(Unavailable(calls.clone()))]);
        chain.push(Box::new(CommandLauncher::new("sh", "sh", ["-c", "exit 0", "sh"])));
        chain.push(Box::new(Broken(calls.clone())));

        let mut process = chain.launch(Path::new("ask.py")).await.unwrap().unwrap();
        assert_eq!(process.launcher(), "sh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        process.wait().await.unwrap();
    }

    #[test]
    fn test_host_order_can_be_overridden() {
        let defaults = LauncherChain::for_host();
        assert!(!defaults.is_empty());

        let last = defaults.names().last().unwrap().to_string();
        let chain = LauncherChain::for_host_with_order(&[last.clone(), "no-such-terminal".to_string()]);
        assert_eq!(chain.names(), vec![last.as_str()]);

        let unchanged = LauncherChain::for_host_with_order(&[]);
        assert_eq!(unchanged.names(), defaults.names());
    }
}
