//! Test-only helpers for building throwaway workspaces.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::context::Context;
use crate::core::defaults::NAMING;
use crate::io::config::Config;
use crate::io::workspace::{Identity, Workspace};

/// Configuration with deterministic naming rules on every host.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.set(NAMING, "platform", "posix");
    config
}

/// A workspace created inside its own temporary directory.
///
/// The temporary directory is the parent of the workspace root, so contexts
/// built from it stand outside the group.
pub struct TestGroup {
    temp: TempDir,
    root: PathBuf,
    config: Config,
}

impl TestGroup {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let identity = Identity {
            name: Some("Test Group".to_string()),
            id: Some(1),
            code: Some("TG1".to_string()),
        };
        let workspace =
            Workspace::create(&temp.path().join("group"), &config, &identity).expect("create group");
        let root = workspace.root().expect("root").to_path_buf();
        Self { temp, root, config }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent directory of the workspace root.
    pub fn parent(&self) -> &Path {
        self.temp.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Context rooted at the workspace, invoked from its parent.
    pub fn context(&self) -> Context {
        Context::new(self.config.clone(), &self.root, self.temp.path()).expect("context")
    }

    /// Create a plain student folder with one file inside.
    pub fn add_student_dir(&self, folder: &str) -> PathBuf {
        let dir = self.root.join(folder);
        fs::create_dir_all(&dir).expect("student dir");
        fs::write(dir.join("work.txt"), folder).expect("student file");
        dir
    }

    /// Write a file inside the resources area, creating parents.
    pub fn add_resource_file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join("~resources").join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("resource dir");
        }
        fs::write(&path, contents).expect("resource file");
        path
    }
}

impl Default for TestGroup {
    fn default() -> Self {
        Self::new()
    }
}
