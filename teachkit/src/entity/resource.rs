//! Resource operations: topic/category/exercise folders inside the shared
//! resources area.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use super::{Entity, Output, Request, Target};
use crate::context::Context;
use crate::error::{Error, IoResultExt, Result};
use crate::io::marker::{MARKER_FILE, Marker, ensure_marker};

/// Topic, category, exercise.
const MAX_DEPTH: usize = 3;

pub struct Resource;

impl Entity for Resource {
    fn target(&self) -> Target {
        Target::Resource
    }

    /// `resource add <topic> [category] [exercise]`.
    fn create(&self, ctx: &Context, request: &Request) -> Result<Output> {
        request.first_arg("topic")?;
        let resources = ctx.require_workspace()?.resources_dir()?;
        let names = component_names(ctx, &request.args)?;

        let mut dir = resources;
        for (name, raw) in names.iter().zip(&request.args) {
            dir.push(name);
            fs::create_dir_all(&dir).with_path("create", &dir)?;
            ensure_marker(&dir, || Marker::named(raw.trim()))?;
        }
        let relative = names.join("/");
        info!(resource = %relative, "resource ready");
        Ok(vec![format!("Resource {relative} ready")])
    }

    /// `resource list [topic] [category]`: entries of one level, folders
    /// first, with a trailing `/`.
    fn read(&self, ctx: &Context, request: &Request) -> Result<Output> {
        let resources = ctx.require_workspace()?.resources_dir()?;
        if request.args.len() >= MAX_DEPTH {
            return Err(Error::InvalidInput(
                "resource list takes at most a topic and a category".to_string(),
            ));
        }
        let dir = resolve(resources, &component_names(ctx, &request.args)?)?;

        let mut folders = Vec::new();
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).with_path("read", &dir)? {
            let entry = entry.with_path("read", &dir)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == MARKER_FILE {
                continue;
            }
            if entry.path().is_dir() {
                folders.push(format!("{name}/"));
            } else {
                files.push(name);
            }
        }
        folders.sort();
        files.sort();
        folders.extend(files);
        Ok(folders)
    }

    /// `resource del <topic> [category] [exercise]`.
    fn delete(&self, ctx: &Context, request: &Request) -> Result<Output> {
        request.first_arg("topic")?;
        let resources = ctx.require_workspace()?.resources_dir()?;
        let names = component_names(ctx, &request.args)?;
        let dir = resolve(resources, &names)?;

        fs::remove_dir_all(&dir).with_path("remove", &dir)?;
        let relative = names.join("/");
        info!(resource = %relative, "resource removed");
        Ok(vec![format!("Resource {relative} has been removed")])
    }
}

/// Sanitized, shortened folder name for each path component.
fn component_names(ctx: &Context, args: &[String]) -> Result<Vec<String>> {
    if args.len() > MAX_DEPTH {
        return Err(Error::InvalidInput(format!(
            "a resource path has at most {MAX_DEPTH} levels (topic, category, exercise)"
        )));
    }
    args.iter()
        .map(|raw| {
            let name = ctx.sanitize(raw, true)?;
            if name.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "\"{raw}\" does not yield a usable resource name"
                )));
            }
            Ok(name)
        })
        .collect()
}

fn resolve(mut dir: PathBuf, names: &[String]) -> Result<PathBuf> {
    dir.extend(names);
    if !dir.is_dir() {
        return Err(Error::NotFound { path: dir });
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::defaults::NAMING;
    use crate::error::ErrorKind;
    use crate::test_support::{TestGroup, test_config};

    fn resources(group: &TestGroup) -> PathBuf {
        group.root().join("~resources")
    }

    #[test]
    fn add_creates_nested_sanitized_folders_with_markers() {
        let group = TestGroup::new();
        let ctx = group.context();
        let request = Request::with_args(["Álgebra Lineal", "Matrices", "Ejercicio 1"]);

        let output = Resource.create(&ctx, &request).expect("add");

        let topic = resources(&group).join("algebra_lineal");
        let exercise = topic.join("matrices").join("ejercicio_1");
        assert!(exercise.is_dir());
        let marker = fs::read_to_string(topic.join(MARKER_FILE)).expect("marker");
        assert!(marker.contains("LocalizedResourceName = Álgebra Lineal"));
        assert_eq!(output, vec!["Resource algebra_lineal/matrices/ejercicio_1 ready"]);
    }

    #[test]
    fn add_shortens_with_word_limit() {
        let mut config = test_config();
        config.set(NAMING, "num_words", 2i64);
        config.set(NAMING, "underscore", false);
        let group = TestGroup::with_config(config);

        Resource
            .create(&group.context(), &Request::with_args(["intro to systems programming"]))
            .expect("add");
        assert!(resources(&group).join("intro to").is_dir());
    }

    #[test]
    fn add_rejects_deep_or_empty_paths() {
        let group = TestGroup::new();
        let ctx = group.context();

        let deep = Request::with_args(["a", "b", "c", "d"]);
        assert_eq!(
            Resource.create(&ctx, &deep).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        let empty = Request::with_args(["???"]);
        let mut config = test_config();
        config.set(NAMING, "platform", "windows");
        let windows = Context::new(config, group.root(), group.parent()).expect("context");
        assert_eq!(
            Resource.create(&windows, &empty).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn list_shows_folders_then_files() {
        let group = TestGroup::new();
        let ctx = group.context();
        Resource
            .create(&ctx, &Request::with_args(["algebra", "vectors"]))
            .expect("add");
        Resource
            .create(&ctx, &Request::with_args(["algebra", "matrices"]))
            .expect("add");
        group.add_resource_file("algebra/syllabus.md", "x");

        let top = Resource.read(&ctx, &Request::default()).expect("list");
        assert_eq!(top, vec!["algebra/"]);
        let topic = Resource
            .read(&ctx, &Request::with_args(["Algebra"]))
            .expect("list");
        assert_eq!(topic, vec!["matrices/", "vectors/", "syllabus.md"]);

        let err = Resource
            .read(&ctx, &Request::with_args(["geometry"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn delete_removes_only_the_named_level() {
        let group = TestGroup::new();
        let ctx = group.context();
        Resource
            .create(&ctx, &Request::with_args(["algebra", "vectors"]))
            .expect("add");
        Resource
            .create(&ctx, &Request::with_args(["algebra", "matrices"]))
            .expect("add");

        Resource
            .delete(&ctx, &Request::with_args(["algebra", "vectors"]))
            .expect("delete");

        assert!(!resources(&group).join("algebra").join("vectors").exists());
        assert!(resources(&group).join("algebra").join("matrices").is_dir());
        assert_eq!(
            Resource.delete(&ctx, &Request::default()).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
    }
}
