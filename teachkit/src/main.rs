//! Teaching-group workspace manager.
//!
//! Resolves the layered configuration for the selected workspace, installs
//! logging, then dispatches one entity operation.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use teachkit::context::Context;
use teachkit::entity::{Action, Request, Target, dispatch};
use teachkit::exit_codes;
use teachkit::io::config::{CommandOverrides, install_file_path};
use teachkit::io::workspace::Identity;
use teachkit::logging;

#[derive(Parser)]
#[command(
    name = "teachkit",
    version,
    about = "Manage teaching-group workspaces: students, shared resources, metadata"
)]
struct Cli {
    /// Workspace root (defaults to the current directory).
    #[arg(short = 'C', long = "workspace", global = true, value_name = "DIR")]
    workspace: Option<PathBuf>,
    /// Maximum number of words kept when shortening names.
    #[arg(long, global = true, value_name = "N")]
    num_words: Option<u32>,
    /// Minimum length of a word that counts towards --num-words.
    #[arg(long, global = true, value_name = "N")]
    min_word_length: Option<u32>,
    /// Installation configuration file (defaults to config/teachkit.toml
    /// next to the executable).
    #[arg(long, global = true, value_name = "FILE")]
    install_config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the group workspace.
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },
    /// Manage student folders.
    Student {
        #[command(subcommand)]
        action: StudentCommand,
    },
    /// Manage shared resources.
    Resource {
        #[command(subcommand)]
        action: ResourceCommand,
    },
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum GroupCommand {
    /// Create a workspace in DIR (relative to the current directory).
    #[command(visible_alias = "create")]
    Add {
        dir: String,
        /// Display name of the group.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        id: Option<u32>,
        #[arg(long)]
        code: Option<String>,
    },
    /// Print the group identity and folder count.
    Print,
    /// Print one group property (name, id, code).
    Get { property: String },
    /// Set one group property (name, id, code).
    Set { property: String, value: String },
    /// Delete the workspace in DIR. Refused from inside it.
    #[command(visible_alias = "delete")]
    Del { dir: String },
}

#[derive(Subcommand)]
enum StudentCommand {
    /// Enroll a student.
    #[command(visible_alias = "create")]
    Add {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Table of students with creation and access dates.
    List,
    /// Details of one student, or of every student.
    Print { folder: Option<String> },
    /// Copy the shared resources into every student folder.
    Sync {
        /// Overwrite files that already exist.
        #[arg(short, long)]
        force: bool,
    },
    /// Move a student to the unenrolled area.
    #[command(visible_alias = "delete")]
    Del {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Remove the folder instead of moving it.
        #[arg(long)]
        purge: bool,
    },
}

#[derive(Subcommand)]
enum ResourceCommand {
    /// Create a topic, category or exercise folder.
    #[command(visible_alias = "create")]
    Add {
        topic: String,
        category: Option<String>,
        exercise: Option<String>,
    },
    /// List one level of the resources area.
    List {
        topic: Option<String>,
        category: Option<String>,
    },
    /// Remove a topic, category or exercise folder.
    #[command(visible_alias = "delete")]
    Del {
        topic: String,
        category: Option<String>,
        exercise: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration as TOML.
    Show,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("teachkit: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("resolve current directory")?;
    let root = cli
        .workspace
        .as_ref()
        .map_or_else(|| cwd.clone(), |dir| cwd.join(dir));
    let overrides = CommandOverrides {
        num_words: cli.num_words,
        min_word_length: cli.min_word_length,
    };
    let install_file = cli.install_config.clone().or_else(install_file_path);

    let ctx = Context::load(&root, &cwd, install_file, overrides)?;
    logging::init(ctx.config(), Some(ctx.workspace()))?;

    match operation(cli.command) {
        Some((target, action, request)) => {
            for line in dispatch(&ctx, target, action, &request)? {
                println!("{line}");
            }
        }
        None => print!("{}", ctx.config().to_toml_string()?),
    }
    Ok(())
}

/// Map a parsed command onto the entity table; `None` for `config show`.
fn operation(command: Command) -> Option<(Target, Action, Request)> {
    let op = match command {
        Command::Group { action } => group_operation(action),
        Command::Student { action } => student_operation(action),
        Command::Resource { action } => resource_operation(action),
        Command::Config {
            action: ConfigCommand::Show,
        } => return None,
    };
    Some(op)
}

fn group_operation(command: GroupCommand) -> (Target, Action, Request) {
    let (action, request) = match command {
        GroupCommand::Add {
            dir,
            name,
            id,
            code,
        } => (
            Action::Create,
            Request {
                identity: Identity { name, id, code },
                ..Request::with_args([dir])
            },
        ),
        GroupCommand::Print => (Action::Read, Request::default()),
        GroupCommand::Get { property } => (
            Action::Read,
            Request {
                property: Some(property),
                ..Request::default()
            },
        ),
        GroupCommand::Set { property, value } => (
            Action::Update,
            Request {
                property: Some(property),
                value: Some(value),
                ..Request::default()
            },
        ),
        GroupCommand::Del { dir } => (Action::Delete, Request::with_args([dir])),
    };
    (Target::Group, action, request)
}

fn student_operation(command: StudentCommand) -> (Target, Action, Request) {
    let (action, request) = match command {
        StudentCommand::Add { name } => (Action::Create, Request::with_args(name)),
        StudentCommand::List => (Action::Read, Request::default()),
        StudentCommand::Print { folder } => (
            Action::Read,
            Request {
                detail: true,
                ..Request::with_args(folder)
            },
        ),
        StudentCommand::Sync { force } => (
            Action::Update,
            Request {
                force,
                ..Request::default()
            },
        ),
        StudentCommand::Del { name, purge } => (
            Action::Delete,
            Request {
                purge,
                ..Request::with_args(name)
            },
        ),
    };
    (Target::Student, action, request)
}

fn resource_operation(command: ResourceCommand) -> (Target, Action, Request) {
    let (action, request) = match command {
        ResourceCommand::Add {
            topic,
            category,
            exercise,
        } => (
            Action::Create,
            Request::with_args(std::iter::once(topic).chain(category).chain(exercise)),
        ),
        ResourceCommand::List { topic, category } => (
            Action::Read,
            Request::with_args(topic.into_iter().chain(category)),
        ),
        ResourceCommand::Del {
            topic,
            category,
            exercise,
        } => (
            Action::Delete,
            Request::with_args(std::iter::once(topic).chain(category).chain(exercise)),
        ),
    };
    (Target::Resource, action, request)
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<teachkit::Error>()
        .map_or(exit_codes::FAILURE, |err| exit_codes::for_kind(err.kind()))
}
