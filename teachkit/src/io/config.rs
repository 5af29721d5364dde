//! Layered configuration resolver.
//!
//! Layers are applied in a fixed order, each overwriting only keys it
//! defines and never introducing new sections or keys:
//!
//! 1. built-in defaults ([`crate::core::defaults`])
//! 2. installation file (`<exe dir>/config/teachkit.toml`)
//! 3. workspace file (`<root>/<metadata>/config/teachkit.toml`)
//! 4. environment (`SECTION_KEY`)
//! 5. command overrides (`--num-words`, `--min-word-length`)
//!
//! Files use `[section]` headers and `key = value` lines. They are parsed as
//! TOML first; a file that is not valid TOML is read as plain INI, where every
//! value is text (`convert_case = title`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::defaults::{METADATA, NAMING, Sections, default_sections};
use crate::core::naming::{CaseConversion, NamingPolicy};
use crate::core::platform::Platform;
use crate::core::value::Value;
use crate::error::{Error, IoResultExt, Result};

/// File name of both the installation and the workspace configuration file.
pub const CONFIG_FILE_NAME: &str = "teachkit.toml";

/// Textual section/key/value data, the shape persisted to disk.
pub type TextSections = BTreeMap<String, BTreeMap<String, String>>;

/// Overrides accepted from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandOverrides {
    pub num_words: Option<u32>,
    pub min_word_length: Option<u32>,
}

/// The four external inputs of resolution.
///
/// Resolution is a pure function of these values plus the two files they
/// point at, so resolving twice from the same sources yields the same result.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub install_file: Option<PathBuf>,
    pub workspace_root: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
    pub overrides: CommandOverrides,
}

/// Effective configuration: section -> key -> typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    sections: Sections,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sections: default_sections(),
        }
    }
}

impl Config {
    /// Run every layer over the built-in defaults.
    pub fn resolve(sources: &ConfigSources) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = &sources.install_file {
            config.apply_file(path)?;
        }
        if let Some(root) = &sources.workspace_root {
            let path = config.workspace_file(root)?;
            config.apply_file(&path)?;
        }
        config.apply_env(&sources.env);
        config.apply_overrides(&sources.overrides);

        debug!(
            install = ?sources.install_file,
            workspace = ?sources.workspace_root,
            "configuration resolved"
        );
        Ok(config)
    }

    /// Location of the workspace configuration file under `root`.
    ///
    /// Uses the metadata folder name as resolved so far.
    pub fn workspace_file(&self, root: &Path) -> Result<PathBuf> {
        let metadata = self.get_str(METADATA, "folder")?;
        Ok(root
            .join(metadata)
            .join(crate::io::workspace::CONFIG_DIR)
            .join(CONFIG_FILE_NAME))
    }

    /// Merge a configuration file if it exists.
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            debug!(path = %path.display(), "configuration file absent, skipped");
            return Ok(());
        }
        let table = parse_config_file(path)?;
        self.merge_table(&table);
        debug!(path = %path.display(), "configuration file applied");
        Ok(())
    }

    /// Merge recognized entries of a parsed file.
    ///
    /// Unknown sections and keys are ignored. A value that cannot be coerced
    /// to the current type, or that coerces to a falsy value, keeps the
    /// previous layer's value.
    pub fn merge_table(&mut self, table: &toml::Table) {
        for (section_name, entries) in table {
            let Some(section) = self.sections.get_mut(section_name) else {
                debug!(section = %section_name, "unknown section ignored");
                continue;
            };
            let Some(entries) = entries.as_table() else {
                continue;
            };
            for (key, raw) in entries {
                let Some(current) = section.get_mut(key) else {
                    debug!(section = %section_name, key = %key, "unknown key ignored");
                    continue;
                };
                match current.coerce_toml(raw) {
                    Some(value) if !value.is_falsy() => *current = value,
                    Some(_) => {
                        debug!(section = %section_name, key = %key, "empty value skipped");
                    }
                    None => {
                        debug!(
                            section = %section_name,
                            key = %key,
                            expected = current.type_name(),
                            "value skipped, wrong type"
                        );
                    }
                }
            }
        }
    }

    /// Apply `SECTION_KEY` variables from `env`.
    pub fn apply_env(&mut self, env: &BTreeMap<String, String>) {
        for (section_name, section) in &mut self.sections {
            for (key, current) in section {
                let var = env_var_name(section_name, key);
                let Some(raw) = env.get(&var) else {
                    continue;
                };
                match current.coerce_text(raw) {
                    Some(value) => *current = value,
                    None => warn!(
                        var = %var,
                        value = %raw,
                        expected = current.type_name(),
                        "environment override ignored"
                    ),
                }
            }
        }
    }

    /// Apply the command-line overrides, each to its own key.
    pub fn apply_overrides(&mut self, overrides: &CommandOverrides) {
        if let Some(num_words) = overrides.num_words {
            self.set(NAMING, "num_words", i64::from(num_words));
        }
        if let Some(min_word_length) = overrides.min_word_length {
            self.set(NAMING, "min_word_length", i64::from(min_word_length));
        }
    }

    /// Look up a registered value.
    ///
    /// A missing section or key is a programming error, never a silent default.
    pub fn get(&self, section: &str, key: &str) -> Result<&Value> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .ok_or_else(|| Error::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<bool> {
        let value = self.get(section, key)?;
        value
            .as_bool()
            .ok_or_else(|| type_mismatch(section, key, "boolean", value))
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<i64> {
        let value = self.get(section, key)?;
        value
            .as_int()
            .ok_or_else(|| type_mismatch(section, key, "integer", value))
    }

    /// Integer read clamped at zero.
    pub fn get_usize(&self, section: &str, key: &str) -> Result<usize> {
        Ok(usize::try_from(self.get_int(section, key)?).unwrap_or(0))
    }

    pub fn get_str(&self, section: &str, key: &str) -> Result<&str> {
        let value = self.get(section, key)?;
        value
            .as_str()
            .ok_or_else(|| type_mismatch(section, key, "string", value))
    }

    /// Insert or overwrite a value in memory, creating the section if absent.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<Value>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    /// Snapshot the `naming` section for the sanitizer.
    pub fn naming_policy(&self) -> Result<NamingPolicy> {
        let platform_name = self.get_str(NAMING, "platform")?;
        let platform = platform_name.parse::<Platform>().unwrap_or_else(|err| {
            warn!(error = %err, "falling back to host platform rules");
            Platform::host()
        });
        let convert_case = self
            .get_str(NAMING, "convert_case")?
            .parse::<CaseConversion>()
            .unwrap_or(CaseConversion::Keep);

        Ok(NamingPolicy {
            reduce_spaces: self.get_bool(NAMING, "reduce_spaces")?,
            unidecode: self.get_bool(NAMING, "unidecode")?,
            underscore: self.get_bool(NAMING, "underscore")?,
            merge_underscores: self.get_bool(NAMING, "merge_underscores")?,
            max_len: self.get_usize(NAMING, "max_len")?,
            num_words: self.get_usize(NAMING, "num_words")?,
            min_word_length: self.get_usize(NAMING, "min_word_length")?,
            convert_case,
            platform,
        })
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        let mut table = toml::Table::new();
        for (section_name, section) in &self.sections {
            let entries: toml::Table = section
                .iter()
                .map(|(key, value)| (key.clone(), to_toml_value(value)))
                .collect();
            table.insert(section_name.clone(), toml::Value::Table(entries));
        }
        toml::to_string(&table)
            .map_err(|err| Error::InvalidInput(format!("serialize configuration: {err}")))
    }
}

/// Environment variable consulted for `section.key`.
pub fn env_var_name(section: &str, key: &str) -> String {
    format!("{}_{}", section.to_uppercase(), key.to_uppercase())
}

/// Capture the process environment, skipping non-UTF-8 entries.
pub fn capture_env() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// Default installation file: `config/teachkit.toml` next to the executable.
pub fn install_file_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join("config").join(CONFIG_FILE_NAME))
}

/// Persist `data` with every value written as text.
///
/// Atomic write (temp file + rename).
pub fn write_config_file(path: &Path, data: &TextSections) -> Result<()> {
    let mut buf = toml::to_string(data)
        .map_err(|err| Error::InvalidInput(format!("serialize {}: {err}", path.display())))?;
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    write_atomic(path, &buf)
}

/// Read a persisted file back as text. A missing file reads as empty.
pub fn read_config_file(path: &Path) -> Result<TextSections> {
    if !path.exists() {
        return Ok(TextSections::new());
    }
    let table = parse_config_file(path)?;

    let mut data = TextSections::new();
    for (section_name, entries) in table {
        let Some(entries) = entries.as_table() else {
            continue;
        };
        let section = data.entry(section_name).or_default();
        for (key, raw) in entries {
            let text = match raw {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            section.insert(key.clone(), text);
        }
    }
    Ok(data)
}

/// Read `path` as TOML, falling back to INI when it is not valid TOML.
fn parse_config_file(path: &Path) -> Result<toml::Table> {
    let contents = fs::read_to_string(path).with_path("read", path)?;
    match toml::from_str::<toml::Table>(&contents) {
        Ok(table) => Ok(table),
        Err(toml_err) => {
            debug!(path = %path.display(), error = %toml_err, "not TOML, reading as INI");
            parse_ini(&contents)
                .map_err(|err| Error::InvalidInput(format!("parse {}: {err}", path.display())))
        }
    }
}

/// Parse INI text into a table of string values.
///
/// Keys are lower-cased. Later duplicates win.
pub fn parse_ini(contents: &str) -> std::result::Result<toml::Table, String> {
    let mut table = toml::Table::new();
    let mut current: Option<String> = None;

    for (index, raw) in contents.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| format!("line {line_no}: malformed section header"))?;
            if !table.contains_key(name) {
                table.insert(name.to_string(), toml::Value::Table(toml::Table::new()));
            }
            current = Some(name.to_string());
            continue;
        }

        let split = line
            .find(['=', ':'])
            .ok_or_else(|| format!("line {line_no}: expected `key = value`"))?;
        let section = current
            .as_deref()
            .ok_or_else(|| format!("line {line_no}: key outside of any section"))?;
        let key = line[..split].trim().to_lowercase();
        if key.is_empty() {
            return Err(format!("line {line_no}: empty key"));
        }
        let value = unquote(line[split + 1..].trim());

        if let Some(toml::Value::Table(entries)) = table.get_mut(section) {
            entries.insert(key, toml::Value::String(value.to_string()));
        }
    }
    Ok(table)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::InvalidInput(format!("{} has no parent", path.display())))?;
    fs::create_dir_all(parent).with_path("create", parent)?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents).with_path("write", &tmp_path)?;
    fs::rename(&tmp_path, path).with_path("replace", path)?;
    Ok(())
}

fn to_toml_value(value: &Value) -> toml::Value {
    match value {
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Int(i) => toml::Value::Integer(*i),
        Value::Float(f) => toml::Value::Float(*f),
        Value::Str(s) => toml::Value::String(s.clone()),
    }
}

fn type_mismatch(section: &str, key: &str, expected: &'static str, found: &Value) -> Error {
    Error::TypeMismatch {
        section: section.to_string(),
        key: key.to_string(),
        expected,
        found: found.type_name(),
    }
}
