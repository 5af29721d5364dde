//! Tracing subscriber built from the resolved configuration.
//!
//! - **Stream layer**: always installed, writes to stderr or stdout.
//! - **File layer**: installed only inside a workspace, writes to
//!   `<metadata>/logs/<file_logging.file>` without colours. The file is
//!   rotated at start-up once it exceeds `file_logging.max_size`.
//!
//! `RUST_LOG` overrides both configured levels.
//!
//! # Example
//! ```bash
//! RUST_LOG=teachkit=debug teachkit student list
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::defaults::{FILE_LOGGING, STREAM_LOGGING};
use crate::error::{Error, IoResultExt, Result};
use crate::io::config::Config;
use crate::io::workspace::Workspace;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Output layout of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Compact,
    Full,
    Pretty,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Format::Compact),
            "full" => Ok(Format::Full),
            "pretty" => Ok(Format::Pretty),
            other => Err(format!("unknown log format \"{other}\"")),
        }
    }
}

/// Install the global subscriber.
///
/// `workspace` enables the file layer when it points at a workspace.
pub fn init(config: &Config, workspace: Option<&Workspace>) -> Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut deferred = Vec::new();

    let stream_level = level_directive(config.get_str(STREAM_LOGGING, "level")?);
    let stream_format = config
        .get_str(STREAM_LOGGING, "format")?
        .parse()
        .unwrap_or_else(|err| {
            deferred.push(err);
            Format::Compact
        });
    let stream = match config.get_str(STREAM_LOGGING, "stream")?.trim() {
        "stdout" => format_layer(std::io::stdout, stream_format, true),
        "stderr" => format_layer(std::io::stderr, stream_format, true),
        other => {
            deferred.push(format!("unknown log stream \"{other}\", using stderr"));
            format_layer(std::io::stderr, stream_format, true)
        }
    };
    layers.push(stream.with_filter(filter(&stream_level)).boxed());

    if let Some(workspace) = workspace.filter(|ws| ws.is_workspace()) {
        match file_layer(config, workspace) {
            Ok(layer) => layers.push(layer),
            Err(err) => {
                let err = anyhow::Error::new(err);
                deferred.push(format!("file logging disabled: {err:#}"));
            }
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|err| Error::InvalidInput(format!("install logging: {err}")))?;

    for message in deferred {
        warn!("{message}");
    }
    Ok(())
}

fn file_layer(config: &Config, workspace: &Workspace) -> Result<BoxedLayer> {
    let path = workspace.logs_dir()?.join(config.get_str(FILE_LOGGING, "file")?);
    let max_size = config.get_str(FILE_LOGGING, "max_size")?;
    let max_bytes = parse_size(max_size)
        .ok_or_else(|| Error::InvalidInput(format!("invalid log size \"{max_size}\"")))?;
    let backup_count = config.get_usize(FILE_LOGGING, "backup_count")?;
    rotate(&path, max_bytes, backup_count)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_path("open", &path)?;
    let format = config
        .get_str(FILE_LOGGING, "format")?
        .parse()
        .unwrap_or(Format::Full);
    let level = level_directive(config.get_str(FILE_LOGGING, "level")?);

    Ok(format_layer(Mutex::new(file), format, false)
        .with_filter(filter(&level))
        .boxed())
}

fn format_layer<W>(writer: W, format: Format, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        Format::Compact => layer.compact().boxed(),
        Format::Full => layer.boxed(),
        Format::Pretty => layer.pretty().boxed(),
    }
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Map a configured level name to a filter directive.
///
/// Accepts `CRITICAL`, `ERROR`, `WARNING`, `INFO`, `DEBUG` in any case, plus
/// the tracing names. Unknown names fall back to `error`.
pub fn level_directive(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "critical" | "fatal" | "error" => "error",
        "warning" | "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" | "notset" => "trace",
        "off" => "off",
        _ => "error",
    }
    .to_string()
}

/// Parse a size such as `10M`, `512k`, `1GB` or `2048` into bytes.
pub fn parse_size(text: &str) -> Option<u64> {
    let text = text.trim().to_ascii_uppercase();
    let text = text.strip_suffix('B').unwrap_or(&text);
    let (digits, factor) = match text.chars().last()? {
        'K' => (&text[..text.len() - 1], 1u64 << 10),
        'M' => (&text[..text.len() - 1], 1 << 20),
        'G' => (&text[..text.len() - 1], 1 << 30),
        _ => (text, 1),
    };
    digits.trim().parse::<u64>().ok()?.checked_mul(factor)
}

/// Rotate `path` when it is larger than `max_bytes`.
///
/// Backups are `<file>.1` (newest) to `<file>.<backup_count>`; the oldest is
/// dropped. With no backups the file is simply truncated. A `max_bytes` of
/// zero disables rotation.
pub fn rotate(path: &Path, max_bytes: u64, backup_count: usize) -> Result<bool> {
    let Ok(meta) = fs::metadata(path) else {
        return Ok(false);
    };
    if max_bytes == 0 || meta.len() <= max_bytes {
        return Ok(false);
    }

    if backup_count == 0 {
        File::create(path).with_path("truncate", path)?;
        return Ok(true);
    }
    for index in (1..backup_count).rev() {
        let from = backup_path(path, index);
        if from.exists() {
            let to = backup_path(path, index + 1);
            fs::rename(&from, &to).with_path("rotate", &from)?;
        }
    }
    let first = backup_path(path, 1);
    fs::rename(path, &first).with_path("rotate", path)?;
    Ok(true)
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_accept_upper_case_aliases() {
        assert_eq!(level_directive("CRITICAL"), "error");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive("Info"), "info");
        assert_eq!(level_directive("bogus"), "error");
    }

    #[test]
    fn sizes_parse_with_suffixes() {
        assert_eq!(parse_size("10M"), Some(10 * 1024 * 1024));
        assert_eq!(parse_size("512kb"), Some(512 * 1024));
        assert_eq!(parse_size("2048"), Some(2048));
        assert_eq!(parse_size("1G"), Some(1 << 30));
        assert_eq!(parse_size("lots"), None);
        assert_eq!(parse_size(""), None);
    }

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("Pretty".parse::<Format>(), Ok(Format::Pretty));
        assert!("json".parse::<Format>().is_err());
    }

    #[test]
    fn rotate_shifts_backups_and_drops_oldest() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("teachkit.log");
        fs::write(&log, "current-current").expect("write");
        fs::write(backup_path(&log, 1), "one").expect("write");
        fs::write(backup_path(&log, 2), "two").expect("write");

        assert!(rotate(&log, 4, 2).expect("rotate"));

        assert!(!log.exists());
        assert_eq!(
            fs::read_to_string(backup_path(&log, 1)).expect("read"),
            "current-current"
        );
        assert_eq!(fs::read_to_string(backup_path(&log, 2)).expect("read"), "one");
        assert!(!backup_path(&log, 3).exists());
    }

    #[test]
    fn rotate_leaves_small_files_alone() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("teachkit.log");
        fs::write(&log, "tiny").expect("write");

        assert!(!rotate(&log, 1024, 3).expect("rotate"));
        assert!(!rotate(&temp.path().join("missing.log"), 1, 3).expect("rotate"));
        assert_eq!(fs::read_to_string(&log).expect("read"), "tiny");
    }

    #[test]
    fn rotate_without_backups_truncates() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("teachkit.log");
        fs::write(&log, "0123456789").expect("write");

        assert!(rotate(&log, 4, 0).expect("rotate"));
        assert_eq!(fs::read_to_string(&log).expect("read"), "");
    }
}
