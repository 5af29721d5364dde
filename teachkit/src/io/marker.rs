//! Decoration markers (`desktop.ini`) giving folders a display name and icon.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{IoResultExt, Result};

pub const MARKER_FILE: &str = "desktop.ini";
const MARKER_SECTION: &str = "[.ShellClassInfo]";

/// Contents of a decoration marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Marker {
    pub name: Option<String>,
    pub icon: Option<String>,
    /// Additional keys written after the standard ones, in order.
    pub extra: Vec<(String, String)>,
}

impl Marker {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    pub fn render(&self) -> String {
        let mut lines = vec![MARKER_SECTION.to_string(), "ConfirmFileOp = 1".to_string()];
        if let Some(name) = self.name.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("LocalizedResourceName = {name}"));
        }
        if let Some(icon) = self.icon.as_deref().filter(|s| !s.is_empty()) {
            lines.push(format!("IconResource = {icon}"));
        }
        for (key, value) in &self.extra {
            lines.push(format!("{key} = {value}"));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

pub fn marker_path(dir: &Path) -> PathBuf {
    dir.join(MARKER_FILE)
}

/// Write (or replace) the marker inside `dir`.
pub fn write_marker(dir: &Path, marker: &Marker) -> Result<PathBuf> {
    let path = marker_path(dir);
    fs::write(&path, marker.render()).with_path("write", &path)?;
    info!(dir = %dir.display(), "decoration marker written");
    Ok(path)
}

/// Write the marker only if `dir` has none yet.
pub fn ensure_marker(dir: &Path, marker: impl FnOnce() -> Marker) -> Result<PathBuf> {
    let path = marker_path(dir);
    if path.exists() {
        return Ok(path);
    }
    write_marker(dir, &marker())
}
