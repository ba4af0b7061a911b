//! Tag signing through the system `gpg` binary.
//!
//! The armored key file is imported into a scoped temporary keyring; the
//! keyring directory disappears with the run, so nothing leaks into the
//! user's GnuPG home.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{ensure, Context};
use tempfile::TempDir;

use semrel_git_tools::{Signer, SigningError};

/// Signs tag payloads with a key imported from an armored key file.
pub struct GpgSigner {
    homedir: TempDir,
}

impl GpgSigner {
    /// Imports the key at `key_path` into a fresh temporary keyring.
    ///
    /// # Errors
    ///
    /// Fails when the keyring directory cannot be prepared or `gpg` cannot
    /// import the key.
    pub fn new(key_path: &Path) -> anyhow::Result<Self> {
        let homedir = tempfile::Builder::new()
            .prefix("semrel-gnupg-")
            .tempdir()
            .context("cannot create temporary GnuPG home")?;

        // gpg refuses group-readable homedirs.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(homedir.path(), std::fs::Permissions::from_mode(0o700))?;
        }

        let status = Command::new("gpg")
            .arg("--homedir")
            .arg(homedir.path())
            .arg("--batch")
            .arg("--import")
            .arg(key_path)
            .status()
            .context("cannot run gpg")?;
        ensure!(status.success(), "failed to import signing key from {}", key_path.display());

        Ok(Self { homedir })
    }
}

impl Signer for GpgSigner {
    fn sign(&self, payload: &[u8]) -> Result<String, SigningError> {
        let mut child = Command::new("gpg")
            .arg("--homedir")
            .arg(self.homedir.path())
            .args(["--batch", "--yes", "--armor", "--detach-sign"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SigningError(format!("cannot run gpg: {e}")))?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(payload).map_err(|e| SigningError(e.to_string()))?;
        }

        let output = child.wait_with_output().map_err(|e| SigningError(e.to_string()))?;
        if !output.status.success() {
            return Err(SigningError(String::from_utf8_lossy(&output.stderr).into_owned()));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| SigningError(format!("gpg produced non-utf8 output: {e}")))
    }
}
