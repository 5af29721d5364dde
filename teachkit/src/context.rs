//! Per-run context shared by every entity operation.
//!
//! Built once at start-up from the resolved configuration and passed by
//! reference; nothing here is global.

use std::path::{Path, PathBuf};

use crate::core::naming::sanitize;
use crate::core::value::Value;
use crate::error::Result;
use crate::io::config::{CommandOverrides, Config, ConfigSources, capture_env};
use crate::io::workspace::Workspace;

#[derive(Debug, Clone)]
pub struct Context {
    config: Config,
    workspace: Workspace,
    cwd: PathBuf,
}

impl Context {
    pub fn new(config: Config, root: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Result<Self> {
        let workspace = Workspace::new(root, &config)?;
        Ok(Self {
            config,
            workspace,
            cwd: cwd.into(),
        })
    }

    /// Resolve configuration for `root` from the process environment and
    /// build the context.
    pub fn load(
        root: &Path,
        cwd: &Path,
        install_file: Option<PathBuf>,
        overrides: CommandOverrides,
    ) -> Result<Self> {
        let sources = ConfigSources {
            install_file,
            workspace_root: Some(root.to_path_buf()),
            env: capture_env(),
            overrides,
        };
        let config = Config::resolve(&sources)?;
        Self::new(config, root, cwd)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Directory the command was invoked from.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn get_config_value(&self, section: &str, key: &str) -> Result<&Value> {
        self.config.get(section, key)
    }

    /// In-memory override; folder names already captured by the workspace
    /// are refreshed.
    pub fn set_config_value(
        &mut self,
        section: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.config.set(section, key, value);
        let root = self.workspace.root_path().to_path_buf();
        self.workspace = Workspace::new(root, &self.config)?;
        Ok(())
    }

    /// Sanitize with the current naming policy.
    pub fn sanitize(&self, text: &str, shorten: bool) -> Result<String> {
        Ok(sanitize(text, &self.config.naming_policy()?, shorten))
    }

    /// Word-limit with the current naming policy.
    pub fn limit_words(&self, text: &str) -> Result<String> {
        Ok(self.config.naming_policy()?.limit_words(text))
    }

    /// Fail unless the root is a workspace.
    pub fn require_workspace(&self) -> Result<&Workspace> {
        self.workspace.metadata_dir()?;
        Ok(&self.workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::defaults::{NAMING, RESOURCES};
    use crate::error::ErrorKind;

    #[test]
    fn require_workspace_fails_outside_groups() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ctx = Context::new(Config::default(), temp.path(), temp.path()).expect("ctx");
        assert_eq!(
            ctx.require_workspace().unwrap_err().kind(),
            ErrorKind::NotAWorkspace
        );
    }

    #[test]
    fn set_config_value_refreshes_workspace_names() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(temp.path().join(".metadata")).expect("mkdir");
        let mut ctx = Context::new(Config::default(), temp.path(), temp.path()).expect("ctx");

        ctx.set_config_value(RESOURCES, "folder", "~shared")
            .expect("set");
        let dir = ctx.workspace().resources_dir().expect("resources");
        assert_eq!(dir, temp.path().join("~shared"));
    }

    #[test]
    fn sanitize_uses_live_policy() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut ctx = Context::new(Config::default(), temp.path(), temp.path()).expect("ctx");
        ctx.set_config_value(NAMING, "convert_case", "upper")
            .expect("set");
        ctx.set_config_value(NAMING, "platform", "posix")
            .expect("set");
        assert_eq!(ctx.sanitize("ana lópez", false).expect("sanitize"), "ANA_LOPEZ");
    }
}
