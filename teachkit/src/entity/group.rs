//! Group operations: the workspace itself.

use tracing::info;

use super::{Entity, Output, Request, Target};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::io::marker::{Marker, write_marker};
use crate::io::workspace::{Workspace, delete_workspace};

/// Properties persisted in `group.toml`.
pub const PROPERTIES: [&str; 3] = ["name", "id", "code"];

pub struct Group;

impl Entity for Group {
    fn target(&self) -> Target {
        Target::Group
    }

    /// `group add <dir>`: create a workspace relative to the invocation
    /// directory.
    fn create(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let dir = request.first_arg("group directory")?;
        let target = ctx.cwd().join(dir);
        let workspace = Workspace::create(&target, ctx.config(), &request.identity)?;
        let root = workspace.root()?;
        Ok(vec![format!("Group created at {}", root.display())])
    }

    /// `group get <property>` or `group print`.
    fn read(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let workspace = ctx.require_workspace()?;
        let entries = workspace.read_group()?;

        if let Some(property) = request.property.as_deref() {
            let property = known_property(property)?;
            let value = entries.get(property).ok_or_else(|| {
                Error::InvalidInput(format!("the group {property} has not been set"))
            })?;
            return Ok(vec![value.clone()]);
        }

        let mut lines: Output = PROPERTIES
            .iter()
            .filter_map(|key| {
                entries
                    .get(*key)
                    .map(|value| format!("{:.<10}: {value}", capitalize(key)))
            })
            .collect();
        lines.push(format!("{:.<10}: {}", "Folders", workspace.members()?.len()));
        Ok(lines)
    }

    /// `group set <property> <value>`: merge into `group.toml`.
    fn update(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let workspace = ctx.require_workspace()?;
        let property = known_property(request.property.as_deref().unwrap_or_default())?;
        let value = request
            .value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| Error::InvalidInput(format!("a value for {property} is required")))?;
        if property == "id" && value.parse::<u32>().is_err() {
            return Err(Error::InvalidInput(format!(
                "the group id must be a non-negative integer, got \"{value}\""
            )));
        }

        let mut entries = workspace.read_group()?;
        entries.insert(property.to_string(), value.to_string());
        workspace.write_group(entries)?;

        if property == "name" {
            write_marker(workspace.root()?, &Marker::named(value))?;
        }
        info!(property, value, "group updated");
        Ok(vec![format!("Group {property} set to \"{value}\"")])
    }

    /// `group del <dir>`: refuse while standing inside it.
    fn delete(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let dir = request.first_arg("group directory")?;
        let workspace = Workspace::new(ctx.cwd().join(dir), ctx.config())?;
        delete_workspace(&workspace, ctx.cwd())?;
        Ok(vec![format!("Group {dir} has been removed")])
    }
}

fn known_property(property: &str) -> Result<&'static str> {
    let property = property.trim().to_ascii_lowercase();
    PROPERTIES
        .into_iter()
        .find(|known| *known == property)
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "unknown group property \"{property}\", expected one of {}",
                PROPERTIES.join(", ")
            ))
        })
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
