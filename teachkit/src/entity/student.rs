//! Student operations: one folder per student directly under the root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use super::{Entity, Output, Request, Target};
use crate::context::Context;
use crate::core::naming::CaseConversion;
use crate::error::{Error, IoResultExt, Result};
use crate::io::copy::copy_tree;
use crate::io::marker::{MARKER_FILE, Marker, write_marker};

const NO_STUDENTS: &str = "There are no students in this group yet.";
const TABLE_HEADER: [&str; 6] = ["P", "C. date", "D", "A. date", "A. time", "Name"];

pub struct Student;

impl Entity for Student {
    fn target(&self) -> Target {
        Target::Student
    }

    /// `student add <name>`.
    fn create(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let workspace = ctx.require_workspace()?;
        let name = full_name(request)?;
        let folder = folder_name(ctx, &name)?;
        let dir = workspace.root()?.join(&folder);

        if dir.is_dir() {
            warn!(folder = %folder, "student folder already exists");
        }
        fs::create_dir_all(&dir).with_path("create", &dir)?;

        let shown = CaseConversion::Title.apply(&ctx.limit_words(&name)?);
        write_marker(&dir, &Marker::named(&shown))?;
        info!(student = %shown, folder = %folder, "student enrolled");
        Ok(vec![format!("Student \"{shown}\" enrolled in {folder}")])
    }

    /// `student list` (summary table) or `student print [folder]`.
    fn read(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let workspace = ctx.require_workspace()?;
        let root = workspace.root()?;
        let mut folders = workspace.members()?;

        if let Some(wanted) = request.args.first() {
            let wanted = wanted.trim();
            let folder = if folders.iter().any(|f| f == wanted) {
                wanted.to_string()
            } else {
                folder_name(ctx, wanted)?
            };
            if !folders.contains(&folder) {
                return Err(Error::NotFound {
                    path: root.join(folder),
                });
            }
            folders = vec![folder];
        }
        if folders.is_empty() {
            return Ok(vec![NO_STUDENTS.to_string()]);
        }

        if request.detail || !request.args.is_empty() {
            let mut lines = Vec::new();
            for folder in &folders {
                lines.extend(describe(root, folder)?);
            }
            return Ok(lines);
        }

        let mut rows = Vec::with_capacity(folders.len());
        for (index, folder) in folders.iter().enumerate() {
            let times = FolderTimes::read(&root.join(folder))?;
            rows.push(times.row(index, folder));
        }
        Ok(render_table(&rows))
    }

    /// `student sync [--force]`: copy the resources into every student.
    fn update(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let workspace = ctx.require_workspace()?;
        let folders = workspace.members()?;
        if folders.is_empty() {
            return Ok(vec![NO_STUDENTS.to_string()]);
        }

        let resources = workspace.resources_dir()?;
        let root = workspace.root()?;
        let mut lines = Vec::with_capacity(folders.len());
        for folder in &folders {
            let stats = copy_tree(&resources, &root.join(folder), request.force)?;
            lines.push(format!(
                "{folder}: {} copied, {} kept",
                stats.copied, stats.skipped
            ));
        }
        info!(students = folders.len(), overwrite = request.force, "resources synced");
        Ok(lines)
    }

    /// `student del <name> [--purge]`.
    fn delete(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let workspace = ctx.require_workspace()?;
        let name = full_name(request)?;
        let folder = folder_name(ctx, &name)?;
        let dir = workspace.root()?.join(&folder);
        if !dir.is_dir() {
            return Err(Error::NotFound { path: dir });
        }

        if request.purge {
            fs::remove_dir_all(&dir).with_path("remove", &dir)?;
            info!(folder = %folder, "student folder removed");
            return Ok(vec![format!("Student \"{name}\" folder has been removed.")]);
        }

        let dest = free_destination(&workspace.unenrolled_dir()?, &folder);
        fs::rename(&dir, &dest).with_path("move", &dir)?;
        info!(folder = %folder, dest = %dest.display(), "student unenrolled");
        Ok(vec![format!(
            "Student \"{name}\" moved to {}",
            dest.display()
        )])
    }
}

/// Folder name for a student: word-limited, ASCII, sanitized, lower-case.
///
/// Must start with a letter, otherwise it would not count as a student.
pub fn folder_name(ctx: &Context, name: &str) -> Result<String> {
    let limited = ctx.limit_words(name)?;
    let ascii = deunicode::deunicode(&limited);
    let folder = ctx.sanitize(&ascii, false)?.to_lowercase();

    if !folder.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(Error::InvalidInput(format!(
            "\"{name}\" does not yield a student folder starting with a letter"
        )));
    }
    Ok(folder)
}

/// First unused name under `dir`: `folder`, then `folder_<stamp>`, then
/// `folder_<stamp>_<n>`.
fn free_destination(dir: &Path, folder: &str) -> PathBuf {
    let plain = dir.join(folder);
    if !plain.exists() {
        return plain;
    }
    let stamp = Local::now().format("%Y%m%d%H%M%S").to_string();
    let stamped = dir.join(format!("{folder}_{stamp}"));
    if !stamped.exists() {
        return stamped;
    }
    (1..)
        .map(|n| dir.join(format!("{folder}_{stamp}_{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(stamped)
}

fn full_name(request: &Request) -> Result<String> {
    let name = request.args.join(" ");
    if name.trim().is_empty() {
        return Err(Error::InvalidInput(
            "the name is required to create new student".to_string(),
        ));
    }
    Ok(name.trim().to_string())
}

struct FolderTimes {
    created: DateTime<Local>,
    accessed: DateTime<Local>,
}

impl FolderTimes {
    fn read(dir: &Path) -> Result<Self> {
        let meta = fs::metadata(dir).with_path("stat", dir)?;
        // Not every filesystem records a birth time.
        let created = meta
            .created()
            .or_else(|_| meta.modified())
            .with_path("stat", dir)?;
        let accessed = meta.accessed().unwrap_or_else(|_| SystemTime::now());
        Ok(Self {
            created: created.into(),
            accessed: accessed.into(),
        })
    }

    /// Whole days between creation and last access.
    fn days(&self) -> i64 {
        self.accessed
            .date_naive()
            .signed_duration_since(self.created.date_naive())
            .num_days()
            .abs()
    }

    fn row(&self, index: usize, folder: &str) -> [String; 6] {
        [
            index.to_string(),
            self.created.format("%Y-%m-%d").to_string(),
            self.days().to_string(),
            self.accessed.format("%Y-%m-%d").to_string(),
            self.accessed.format("%H:%M:%S").to_string(),
            folder.to_string(),
        ]
    }
}

/// Render rows under the fixed header: index zero-padded, days
/// right-aligned, the rest left-aligned.
fn render_table(rows: &[[String; 6]]) -> Output {
    let mut widths = TABLE_HEADER.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let format_row = |cells: [&str; 6], numeric: bool| {
        let [index, cdate, days, adate, atime, name] = cells;
        let [w0, w1, w2, w3, w4, w5] = widths;
        let (index, days) = if numeric {
            (format!("{index:0>w0$}"), format!("{days:>w2$}"))
        } else {
            (format!("{index:<w0$}"), format!("{days:<w2$}"))
        };
        format!("{index}  {cdate:<w1$}  {days}  {adate:<w3$}  {atime:<w4$}  {name:<w5$}")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![
        format_row(TABLE_HEADER, false),
        format_row(widths.map(|w| "-".repeat(w)).each_ref().map(String::as_str), false),
    ];
    for row in rows {
        lines.push(format_row(row.each_ref().map(String::as_str), true));
    }
    lines
}

fn describe(root: &Path, folder: &str) -> Result<Output> {
    let dir = root.join(folder);
    let times = FolderTimes::read(&dir)?;
    let display = read_display_name(&dir).unwrap_or_else(|| folder.to_string());
    Ok(vec![
        format!("{:.<10}: {display}", "Name"),
        format!("{:.<10}: {folder}", "Folder"),
        format!("{:.<10}: {}", "Created", times.created.format("%Y-%m-%d %H:%M:%S")),
        format!("{:.<10}: {}", "Accessed", times.accessed.format("%Y-%m-%d %H:%M:%S")),
    ])
}

fn read_display_name(dir: &Path) -> Option<String> {
    let contents = fs::read_to_string(dir.join(MARKER_FILE)).ok()?;
    contents.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == "LocalizedResourceName").then(|| value.trim().to_string())
    })
}
