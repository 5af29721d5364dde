//! Entity operations: create/read/update/delete on groups, students and
//! resources.
//!
//! Each [`Target`] has exactly one handler, found through [`handler`]. A
//! handler only overrides the actions it supports; the rest fail with
//! [`Error::Unsupported`].

pub mod group;
pub mod resource;
pub mod student;

use std::fmt;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::io::workspace::Identity;

/// What an operation acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Group,
    Student,
    Resource,
}

impl Target {
    pub fn name(self) -> &'static str {
        match self {
            Target::Group => "group",
            Target::Student => "student",
            Target::Resource => "resource",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments of one operation. Each handler reads the fields it needs.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// Positional arguments: a directory, a student name or resource path
    /// components.
    pub args: Vec<String>,
    /// Identity fields for group creation.
    pub identity: Identity,
    /// Property read by `group get` and written by `group set`.
    pub property: Option<String>,
    pub value: Option<String>,
    /// Detailed read instead of a summary table.
    pub detail: bool,
    /// Overwrite existing files when syncing.
    pub force: bool,
    /// Remove instead of moving to the unenrolled area.
    pub purge: bool,
}

impl Request {
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// First positional argument, required.
    pub fn first_arg(&self, what: &str) -> Result<&str> {
        self.args
            .first()
            .map(String::as_str)
            .filter(|arg| !arg.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput(format!("the {what} is required")))
    }
}

/// Lines of user-facing output produced by an operation.
pub type Output = Vec<String>;

/// Handler for one target. Unsupported actions keep the default body.
pub trait Entity: Sync {
    fn target(&self) -> Target;

    fn create(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let _ = (ctx, request);
        Err(unsupported(self.target(), Action::Create))
    }

    fn read(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let _ = (ctx, request);
        Err(unsupported(self.target(), Action::Read))
    }

    fn update(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let _ = (ctx, request);
        Err(unsupported(self.target(), Action::Update))
    }

    fn delete(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let _ = (ctx, request);
        Err(unsupported(self.target(), Action::Delete))
    }
}

/// Lookup table from target to handler.
pub fn handler(target: Target) -> &'static dyn Entity {
    match target {
        Target::Group => &group::Group,
        Target::Student => &student::Student,
        Target::Resource => &resource::Resource,
    }
}

/// Run `action` on `target`.
pub fn dispatch(ctx: &Context, target: Target, action: Action, request: &Request) -> Result<Output> {
    tracing::debug!(%target, %action, args = ?request.args, "dispatching");
    let entity = handler(target);
    match action {
        Action::Create => entity.create(ctx, request),
        Action::Read => entity.read(ctx, request),
        Action::Update => entity.update(ctx, request),
        Action::Delete => entity.delete(ctx, request),
    }
}

fn unsupported(target: Target, action: Action) -> Error {
    Error::Unsupported {
        target: target.name(),
        action: action.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_support::TestGroup;

    #[test]
    fn handler_table_covers_every_target() {
        for target in [Target::Group, Target::Student, Target::Resource] {
            assert_eq!(handler(target).target(), target);
        }
    }

    #[test]
    fn missing_actions_are_unsupported() {
        let group = TestGroup::new();
        let err = dispatch(
            &group.context(),
            Target::Resource,
            Action::Update,
            &Request::default(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(err.to_string(), "update is not supported for resource");
    }

    #[test]
    fn first_arg_rejects_blank_input() {
        let err = Request::with_args(["  "]).first_arg("name").unwrap_err();
        assert_eq!(err.to_string(), "the name is required");
        assert_eq!(Request::with_args(["x"]).first_arg("name").expect("arg"), "x");
    }
}
