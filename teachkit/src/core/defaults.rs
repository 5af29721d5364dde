//! Built-in defaults: the first configuration layer.
//!
//! This table also registers every recognized section and key. Later layers
//! may only overwrite entries that appear here.

use std::collections::BTreeMap;

use super::value::Value;

pub type Section = BTreeMap<String, Value>;
pub type Sections = BTreeMap<String, Section>;

pub const RESOURCES: &str = "resources";
pub const METADATA: &str = "metadata";
pub const NAMING: &str = "naming";
pub const STREAM_LOGGING: &str = "stream_logging";
pub const FILE_LOGGING: &str = "file_logging";

pub fn default_sections() -> Sections {
    let mut sections = Sections::new();

    sections.insert(
        RESOURCES.to_string(),
        section([
            ("folder", Value::from("~resources")),
            ("name", Value::from(".:[ Resources ]:.")),
            ("icon", Value::from(r"%SystemRoot%\system32\imageres.dll,-115")),
            (
                "infotip",
                Value::from("Shared folder with the provided material."),
            ),
        ]),
    );

    sections.insert(
        METADATA.to_string(),
        section([
            ("folder", Value::from(".metadata")),
            ("name", Value::from(".:[ Details ]:.")),
            ("icon", Value::from(r"%SystemRoot%\system32\imageres.dll,-186")),
            (
                "infotip",
                Value::from("Information relating to training management."),
            ),
            ("clsid", Value::from("{BB06C0E4-D293-4F75-8A90-CB05B6477EEE}")),
        ]),
    );

    sections.insert(
        NAMING.to_string(),
        section([
            ("reduce_spaces", Value::Bool(true)),
            ("underscore", Value::Bool(true)),
            ("merge_underscores", Value::Bool(true)),
            ("max_len", Value::Int(32)),
            ("num_words", Value::Int(32)),
            ("min_word_length", Value::Int(1)),
            ("convert_case", Value::from("lower")),
            ("unidecode", Value::Bool(true)),
            ("platform", Value::from("auto")),
        ]),
    );

    sections.insert(
        STREAM_LOGGING.to_string(),
        section([
            ("level", Value::from("ERROR")),
            ("stream", Value::from("stderr")),
            ("format", Value::from("compact")),
        ]),
    );

    sections.insert(
        FILE_LOGGING.to_string(),
        section([
            ("level", Value::from("INFO")),
            ("file", Value::from("teachkit.log")),
            ("max_size", Value::from("10M")),
            ("backup_count", Value::Int(5)),
            ("format", Value::from("full")),
        ]),
    );

    sections
}

fn section<const N: usize>(entries: [(&str, Value); N]) -> Section {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
