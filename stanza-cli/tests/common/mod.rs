//! Common test utilities for CLI integration tests.
//!
//! This module provides shared helpers for CLI testing, including:
//! - Test environment setup with temporary directories
//! - Command builder helpers for common patterns
//! - Test data fixtures

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A small server configuration split across two files.
#[allow(dead_code)]
pub const MAIN_CONF: &str = "\
# main configuration
NFS_Core_Param {
    NFS_Port = 2049;
    Protocols = 3, 4;
}

%include \"exports.conf\"
";

/// Export definitions included by [`MAIN_CONF`].
#[allow(dead_code)]
pub const EXPORTS_CONF: &str = "\
EXPORT {
    Export_Id = 1;
    Path = /srv/a;
    CLIENT { Clients = \"10.0.0.0/8\"; Access_Type = RO; }
}
EXPORT {
    Export_Id = 2;
    Path = /srv/b;
    CLIENT { Clients = \"*\"; Access_Type = RW; }
}
";

/// Test environment with an isolated configuration directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for the duration of the test)
    #[allow(dead_code)]
    temp_dir: TempDir,
    /// Path to the temporary directory
    pub temp_path: PathBuf,
}

#[allow(dead_code)]
impl TestEnv {
    /// Create a new, empty test environment.
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let temp_path = temp_dir.path().to_path_buf();
        Self {
            temp_dir,
            temp_path,
        }
    }

    /// Create an environment holding `main.conf` and `exports.conf`.
    pub fn with_sample() -> Self {
        let env = Self::new();
        env.write("main.conf", MAIN_CONF);
        env.write("exports.conf", EXPORTS_CONF);
        env
    }

    /// Get a command builder for the stanza binary.
    ///
    /// `STANZA_*` variables from the outer environment are removed so every
    /// test starts from the defaults.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("stanza").expect("Failed to find stanza binary");
        cmd.env_remove("STANZA_INCLUDE_DIR")
            .env_remove("STANZA_MAX_INCLUDE_DEPTH")
            .env_remove("STANZA_MAX_BLOCK_DEPTH")
            .env_remove("STANZA_MAX_FILE_SIZE")
            .env_remove("STANZA_OUTPUT_FORMAT")
            .env_remove("STANZA_LOG_MODE");
        cmd
    }

    /// Get the temp path.
    pub fn path(&self) -> &Path {
        &self.temp_path
    }

    /// Write a file (creating parent directories) and return its path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_path.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create test directory");
        }
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Path of a file inside the environment.
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_path.join(name)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
