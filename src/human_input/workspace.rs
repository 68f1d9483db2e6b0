//! Per-exchange scratch directory.
//!
//! Every exchange gets its own directory named after a random session id. The
//! directory holds the request artifact, the front-end script, the response
//! artifact written by the script, the front-end's pid file and, on some
//! platforms, a launcher shim.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Directory name under the system temp dir used when no root is configured
pub const DEFAULT_ROOT_DIR_NAME: &str = "mcp-ask-human";

/// File name of the request artifact
pub const REQUEST_FILE_NAME: &str = "request.json";

/// File name of the response artifact
pub const RESPONSE_FILE_NAME: &str = "response.json";

/// File the front-end script writes its own process id into
pub const FRONTEND_PID_FILE_NAME: &str = "frontend.pid";

/// Default workspace root: `<temp dir>/mcp-ask-human`
pub fn default_root() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_ROOT_DIR_NAME)
}

/// An isolated directory owned by a single exchange.
///
/// The directory is removed by [`SessionWorkspace::cleanup`] or, failing that,
/// when the value is dropped.
#[derive(Debug)]
pub struct SessionWorkspace {
    session_id: String,
    dir: PathBuf,
    released: bool,
}

impl SessionWorkspace {
    /// Create a fresh session directory under `root`
    pub async fn acquire(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).await.map_err(|e| {
            Error::Workspace(format!(
                "failed to create workspace root {}: {}",
                root.display(),
                e
            ))
        })?;

        let session_id = Uuid::new_v4().simple().to_string();
        let dir = root.join(&session_id);

        // Non-recursive create: an existing directory is a collision, not a reuse.
        fs::create_dir(&dir).await.map_err(|e| {
            Error::Workspace(format!(
                "failed to create session directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        debug!(session_id = %session_id, dir = %dir.display(), "Acquired session workspace");
        Ok(Self {
            session_id,
            dir,
            released: false,
        })
    }

    /// The random 128-bit session id rendered as hex
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The session directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the request artifact
    pub fn request_path(&self) -> PathBuf {
        self.dir.join(REQUEST_FILE_NAME)
    }

    /// Path of the response artifact (written by the front-end)
    pub fn response_path(&self) -> PathBuf {
        self.dir.join(RESPONSE_FILE_NAME)
    }

    /// Path the front-end records its process id at
    pub fn pid_path(&self) -> PathBuf {
        self.dir.join(FRONTEND_PID_FILE_NAME)
    }

    /// Path of an arbitrary file inside the session directory
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Whether the directory was already removed
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Remove the session directory and everything in it without blocking the runtime.
    ///
    /// Safe to call more than once. Failures (for example a file still held open by
    /// a lingering front-end on Windows) are logged and otherwise ignored.
    pub async fn cleanup(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let result = fs::remove_dir_all(&self.dir).await;
        self.log_removal(result);
    }

    /// Blocking variant of [`cleanup`](Self::cleanup), used from `Drop`
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let result = std::fs::remove_dir_all(&self.dir);
        self.log_removal(result);
    }

    fn log_removal(&self, result: io::Result<()>) {
        match result {
            Ok(()) => {
                debug!(session_id = %self.session_id, "Released session workspace");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(session_id = %self.session_id, "Session workspace already gone");
            }
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    dir = %self.dir.display(),
                    error = %e,
                    "Failed to remove session workspace"
                );
            }
        }
    }
}

impl Drop for SessionWorkspace {
    fn drop(&mut self) {
        self.release();
    }
}
