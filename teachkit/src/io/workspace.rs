//! Workspace integrity: layout accessors, creation and deletion.
//!
//! Layout of a workspace root:
//!
//! ```text
//! <root>/
//!   desktop.ini
//!   <resources.folder>/     shared material, created on demand
//!   <metadata.folder>/      required marker of a workspace
//!     config/               group.toml, teachkit.toml
//!     logs/
//!     unenrolled/
//!   <student folders>/      names starting with a letter
//! ```
//!
//! Accessors are idempotent: optional folders are recreated with a warning,
//! the metadata folder is never recreated outside [`Workspace::create`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::core::defaults::{METADATA, RESOURCES};
use crate::core::naming::sanitize;
use crate::error::{Error, IoResultExt, Result};
use crate::io::config::{Config, TextSections, read_config_file, write_config_file};
use crate::io::marker::{Marker, ensure_marker, write_marker};

pub const CONFIG_DIR: &str = "config";
pub const LOGS_DIR: &str = "logs";
pub const UNENROLLED_DIR: &str = "unenrolled";
pub const GROUP_FILE: &str = "group.toml";
pub const GROUP_SECTION: &str = "group";

/// Identity fields persisted when a workspace is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: Option<String>,
    pub id: Option<u32>,
    pub code: Option<String>,
}

impl Identity {
    fn to_entries(&self) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();
        if let Some(name) = self.name.as_deref().filter(|s| !s.trim().is_empty()) {
            entries.insert("name".to_string(), name.trim().to_string());
        }
        if let Some(id) = self.id {
            entries.insert("id".to_string(), id.to_string());
        }
        if let Some(code) = self.code.as_deref().filter(|s| !s.trim().is_empty()) {
            entries.insert("code".to_string(), code.trim().to_string());
        }
        entries
    }
}

/// A workspace root plus the folder names and markers taken from configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    resources_folder: String,
    metadata_folder: String,
    resources_marker: Marker,
    metadata_marker: Marker,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        let resources_marker = Marker::named(config.get_str(RESOURCES, "name")?)
            .with_icon(config.get_str(RESOURCES, "icon")?)
            .with_entry("InfoTip", config.get_str(RESOURCES, "infotip")?);
        let metadata_marker = Marker::named(config.get_str(METADATA, "name")?)
            .with_icon(config.get_str(METADATA, "icon")?)
            .with_entry("InfoTip", config.get_str(METADATA, "infotip")?)
            .with_entry("CLSID", config.get_str(METADATA, "clsid")?);

        Ok(Self {
            root: root.into(),
            resources_folder: config.get_str(RESOURCES, "folder")?.to_string(),
            metadata_folder: config.get_str(METADATA, "folder")?.to_string(),
            resources_marker,
            metadata_marker,
        })
    }

    /// The workspace root; fails if it does not exist.
    pub fn root(&self) -> Result<&Path> {
        if !self.root.exists() {
            return Err(Error::NotFound {
                path: self.root.clone(),
            });
        }
        Ok(&self.root)
    }

    /// The configured root, whether or not it exists.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// True if the root carries a metadata folder.
    pub fn is_workspace(&self) -> bool {
        self.root.join(&self.metadata_folder).is_dir()
    }

    /// Shared resources folder, created (with its marker) if missing.
    pub fn resources_dir(&self) -> Result<PathBuf> {
        let dir = self.root()?.join(&self.resources_folder);
        ensure_dir(&dir, "resources")?;
        ensure_marker(&dir, || self.resources_marker.clone())?;
        Ok(dir)
    }

    /// Metadata folder; its absence means the root is not a workspace.
    pub fn metadata_dir(&self) -> Result<PathBuf> {
        let dir = self.root()?.join(&self.metadata_folder);
        if !dir.is_dir() {
            error!(path = %dir.display(), "metadata folder missing");
            return Err(Error::NotAWorkspace {
                path: self.root.clone(),
            });
        }
        ensure_marker(&dir, || self.metadata_marker.clone())?;
        Ok(dir)
    }

    pub fn config_dir(&self) -> Result<PathBuf> {
        let dir = self.metadata_dir()?.join(CONFIG_DIR);
        ensure_dir(&dir, "configuration")?;
        Ok(dir)
    }

    pub fn logs_dir(&self) -> Result<PathBuf> {
        let dir = self.metadata_dir()?.join(LOGS_DIR);
        ensure_dir(&dir, "log")?;
        Ok(dir)
    }

    pub fn unenrolled_dir(&self) -> Result<PathBuf> {
        let dir = self.metadata_dir()?.join(UNENROLLED_DIR);
        ensure_dir(&dir, "unenrolled")?;
        Ok(dir)
    }

    /// Student folders: directories directly under the root whose name starts
    /// with a letter, sorted by name. The configured special folders never
    /// count even if renamed to start with a letter.
    pub fn members(&self) -> Result<Vec<String>> {
        let root = self.root()?;
        let mut members = Vec::new();
        for entry in fs::read_dir(root).with_path("read", root)? {
            let entry = entry.with_path("read", root)?;
            let Ok(name) = entry.file_name().into_string() else {
                debug!(path = %entry.path().display(), "skipping non UTF-8 entry");
                continue;
            };
            if name == self.resources_folder || name == self.metadata_folder {
                continue;
            }
            let starts_alpha = name.chars().next().is_some_and(char::is_alphabetic);
            if starts_alpha && entry.path().is_dir() {
                members.push(name);
            }
        }
        members.sort();

        if members.is_empty() {
            info!("there are no students in this group yet");
        }
        Ok(members)
    }

    /// `<config>/group.toml`.
    pub fn group_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(GROUP_FILE))
    }

    /// The `[group]` entries persisted in `group.toml`.
    pub fn read_group(&self) -> Result<BTreeMap<String, String>> {
        let mut data = read_config_file(&self.group_file()?)?;
        Ok(data.remove(GROUP_SECTION).unwrap_or_default())
    }

    /// Replace the `[group]` entries in `group.toml`, keeping other sections.
    pub fn write_group(&self, entries: BTreeMap<String, String>) -> Result<()> {
        let path = self.group_file()?;
        let mut data: TextSections = read_config_file(&path)?;
        data.insert(GROUP_SECTION.to_string(), entries);
        write_config_file(&path, &data)?;
        debug!(path = %path.display(), "group file written");
        Ok(())
    }

    /// Create a workspace at `target`.
    ///
    /// A target that does not exist yet has its last component sanitized.
    /// Root and metadata failures abort; the remaining folders are
    /// recoverable and only logged.
    pub fn create(target: &Path, config: &Config, identity: &Identity) -> Result<Workspace> {
        let root = resolve_target(target, config)?;
        info!(root = %root.display(), "creating workspace");

        create_dir(&root)?;
        let workspace = Workspace::new(&root, config)?;
        workspace.root()?;

        recoverable("resources", create_dir(&root.join(&workspace.resources_folder)));
        recoverable("resources", workspace.resources_dir().map(drop));

        create_dir(&root.join(&workspace.metadata_folder))?;
        let metadata = workspace.metadata_dir()?;

        for (dir, label) in [
            (CONFIG_DIR, "configuration"),
            (LOGS_DIR, "log"),
            (UNENROLLED_DIR, "unenrolled"),
        ] {
            recoverable(label, create_dir(&metadata.join(dir)));
        }
        recoverable("configuration", workspace.config_dir().map(drop));
        recoverable("log", workspace.logs_dir().map(drop));
        recoverable("unenrolled", workspace.unenrolled_dir().map(drop));

        write_marker(&root, &Marker::named(display_name(&root, identity)))?;
        workspace.write_group(identity.to_entries())?;

        info!(root = %root.display(), "workspace created");
        Ok(workspace)
    }
}

/// Recursively delete the workspace rooted at `workspace`.
///
/// Refuses when `cwd` lies inside it, before touching the filesystem.
pub fn delete_workspace(workspace: &Workspace, cwd: &Path) -> Result<()> {
    let root = workspace.root()?;
    let root = fs::canonicalize(root).with_path("resolve", root)?;
    let cwd = fs::canonicalize(cwd).unwrap_or_else(|_| cwd.to_path_buf());

    if cwd.starts_with(&root) {
        return Err(Error::Policy(format!(
            "you must leave the group directory {} before deleting it",
            root.display()
        )));
    }
    if !workspace.is_workspace() {
        return Err(Error::NotAWorkspace { path: root });
    }

    fs::remove_dir_all(&root).with_path("remove", &root)?;
    info!(root = %root.display(), "workspace deleted");
    Ok(())
}

fn resolve_target(target: &Path, config: &Config) -> Result<PathBuf> {
    let target = std::path::absolute(target).with_path("resolve", target)?;
    if target.exists() {
        return Ok(target);
    }
    let (Some(parent), Some(last)) = (target.parent(), target.file_name()) else {
        return Ok(target);
    };

    let policy = config.naming_policy()?;
    let folder = sanitize(&last.to_string_lossy(), &policy, false);
    if folder.is_empty() {
        return Err(Error::InvalidInput(format!(
            "\"{}\" does not yield a usable folder name",
            last.to_string_lossy()
        )));
    }
    Ok(parent.join(folder))
}

fn display_name(root: &Path, identity: &Identity) -> String {
    match identity.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() && name != "." => name.to_string(),
        _ => root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn ensure_dir(dir: &Path, label: &str) -> Result<()> {
    if !dir.is_dir() {
        warn!(path = %dir.display(), "the {label} folder does not exist and will be created");
        create_dir(dir)?;
    }
    Ok(())
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_path("create", path)
}

fn recoverable(label: &str, result: Result<()>) {
    if let Err(err) = result {
        warn!(error = %err, "something went wrong with the {label} folder");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::defaults::NAMING;
    use crate::error::ErrorKind;
    use crate::io::marker::MARKER_FILE;

    fn config() -> Config {
        let mut config = Config::default();
        config.set(NAMING, "platform", "posix");
        config
    }

    #[test]
    fn create_builds_full_layout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let identity = Identity {
            name: Some("Physics 101".to_string()),
            id: Some(7),
            code: None,
        };

        let ws = Workspace::create(&temp.path().join("NewGroup"), &config(), &identity)
            .expect("create");
        let root = ws.root().expect("root").to_path_buf();

        assert_eq!(root, temp.path().join("newgroup"));
        for dir in [
            root.join(".metadata").join("config"),
            root.join(".metadata").join("logs"),
            root.join(".metadata").join("unenrolled"),
            root.join("~resources"),
        ] {
            assert!(dir.is_dir(), "{}", dir.display());
        }
        for dir in [&root, &root.join(".metadata"), &root.join("~resources")] {
            assert!(dir.join(MARKER_FILE).is_file(), "{}", dir.display());
        }

        let root_marker = fs::read_to_string(root.join(MARKER_FILE)).expect("marker");
        assert!(root_marker.contains("LocalizedResourceName = Physics 101"));
        let metadata_marker =
            fs::read_to_string(root.join(".metadata").join(MARKER_FILE)).expect("marker");
        assert!(metadata_marker.contains("CLSID = {BB06C0E4-D293-4F75-8A90-CB05B6477EEE}"));

        let group = ws.read_group().expect("group");
        assert_eq!(group.get("name").map(String::as_str), Some("Physics 101"));
        assert_eq!(group.get("id").map(String::as_str), Some("7"));
        assert!(!group.contains_key("code"));
    }

    #[test]
    fn existing_target_keeps_its_name() {
        let temp = tempfile::tempdir().expect("tempdir");
        let target = temp.path().join("Already There");
        fs::create_dir(&target).expect("mkdir");

        let ws = Workspace::create(&target, &config(), &Identity::default()).expect("create");
        assert_eq!(ws.root().expect("root"), target.as_path());
        let marker = fs::read_to_string(target.join(MARKER_FILE)).expect("marker");
        assert!(marker.contains("LocalizedResourceName = Already There"));
    }

    #[test]
    fn plain_directory_is_not_a_workspace() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path(), &config()).expect("workspace");

        assert!(!ws.is_workspace());
        assert_eq!(ws.metadata_dir().unwrap_err().kind(), ErrorKind::NotAWorkspace);
        assert_eq!(ws.config_dir().unwrap_err().kind(), ErrorKind::NotAWorkspace);
        assert!(!temp.path().join(".metadata").exists());
    }

    #[test]
    fn missing_root_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path().join("gone"), &config()).expect("workspace");
        assert_eq!(ws.root().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn accessors_heal_missing_folders() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::create(&temp.path().join("g"), &config(), &Identity::default())
            .expect("create");
        let root = ws.root().expect("root").to_path_buf();
        fs::remove_dir_all(root.join(".metadata").join("logs")).expect("rm logs");
        fs::remove_dir_all(root.join("~resources")).expect("rm resources");
        fs::remove_file(root.join(".metadata").join(MARKER_FILE)).expect("rm marker");

        let logs = ws.logs_dir().expect("logs");
        let resources = ws.resources_dir().expect("resources");

        assert!(logs.is_dir());
        assert!(resources.join(MARKER_FILE).is_file());
        assert!(root.join(".metadata").join(MARKER_FILE).is_file());
        assert_eq!(ws.logs_dir().expect("again"), logs);
    }

    #[test]
    fn members_lists_letter_folders_sorted() {
        let temp = tempfile::tempdir().expect("tempdir");
        for dir in ["Bob", ".metadata", "~resources", "Ana", "1999"] {
            fs::create_dir(temp.path().join(dir)).expect("mkdir");
        }
        fs::write(temp.path().join("notes.txt"), "x").expect("write");

        let ws = Workspace::new(temp.path(), &config()).expect("workspace");
        assert_eq!(ws.members().expect("members"), vec!["Ana", "Bob"]);
    }

    #[test]
    fn members_skip_configured_special_folders() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut config = config();
        config.set(RESOURCES, "folder", "shared");
        fs::create_dir(temp.path().join("shared")).expect("mkdir");
        fs::create_dir(temp.path().join("carla")).expect("mkdir");

        let ws = Workspace::new(temp.path(), &config).expect("workspace");
        assert_eq!(ws.members().expect("members"), vec!["carla"]);
    }

    #[test]
    fn delete_refuses_from_inside() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::create(&temp.path().join("g"), &config(), &Identity::default())
            .expect("create");
        let inside = ws.root().expect("root").join("~resources");

        let err = delete_workspace(&ws, &inside).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Policy);
        assert!(ws.root().expect("root").join(".metadata").is_dir());
    }

    #[test]
    fn delete_removes_workspace() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::create(&temp.path().join("g"), &config(), &Identity::default())
            .expect("create");
        let root = ws.root().expect("root").to_path_buf();

        delete_workspace(&ws, temp.path()).expect("delete");
        assert!(!root.exists());
    }

    #[test]
    fn delete_refuses_plain_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let plain = temp.path().join("plain");
        fs::create_dir(&plain).expect("mkdir");
        let ws = Workspace::new(&plain, &config()).expect("workspace");

        let err = delete_workspace(&ws, temp.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAWorkspace);
        assert!(plain.exists());
    }
}
