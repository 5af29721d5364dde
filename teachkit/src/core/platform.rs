//! Platform rules for a single path component.

use std::fmt;
use std::str::FromStr;

/// Default cap for a path component when no shortening is requested.
pub const MAX_COMPONENT_LEN: usize = 255;

const WINDOWS_INVALID: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_DEVICE_NAMES: [&str; 9] = [
    "CON", "PRN", "AUX", "NUL", "CONIN$", "CONOUT$", "CLOCK$", "COM", "LPT",
];

/// Target filesystem rules for sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Strictest union of all rules.
    Universal,
    Windows,
    Posix,
    MacOs,
}

impl Platform {
    /// The platform this binary runs on.
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Posix
        }
    }

    fn is_invalid(self, ch: char) -> bool {
        match self {
            Platform::Universal | Platform::Windows => {
                ch.is_control() || WINDOWS_INVALID.contains(&ch)
            }
            Platform::Posix => ch == '/' || ch == '\0',
            Platform::MacOs => ch == '/' || ch == ':' || ch == '\0',
        }
    }

    fn windows_rules(self) -> bool {
        matches!(self, Platform::Universal | Platform::Windows)
    }
}

impl FromStr for Platform {
    type Err = String;

    /// `auto` resolves to [`Platform::host`].
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Platform::host()),
            "universal" => Ok(Platform::Universal),
            "windows" => Ok(Platform::Windows),
            "posix" | "linux" => Ok(Platform::Posix),
            "macos" => Ok(Platform::MacOs),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Universal => "universal",
            Platform::Windows => "windows",
            Platform::Posix => "posix",
            Platform::MacOs => "macos",
        };
        f.write_str(name)
    }
}

/// Make `text` valid as one path component on `platform`.
///
/// Invalid characters are removed, the result is truncated to `max_len`
/// bytes on a character boundary, and Windows-style platforms additionally
/// lose trailing dots/spaces and get `_` appended to the stem of reserved
/// device names.
pub fn sanitize_component(text: &str, platform: Platform, max_len: usize) -> String {
    let mut name: String = text.chars().filter(|ch| !platform.is_invalid(*ch)).collect();
    truncate_bytes(&mut name, max_len);

    if platform.windows_rules() {
        trim_trailing_dots(&mut name);
        if is_reserved_device_name(&name) && name.len() >= max_len {
            // Make room for the suffix; the shorter name may no longer be reserved.
            truncate_bytes(&mut name, max_len.saturating_sub(1));
            trim_trailing_dots(&mut name);
        }
        if is_reserved_device_name(&name) {
            let stem_len = name.find('.').unwrap_or(name.len());
            name.insert(stem_len, '_');
        }
    }

    if name == "." || name == ".." {
        name.clear();
    }
    name
}

fn trim_trailing_dots(name: &mut String) {
    let trimmed = name.trim_end_matches(['.', ' ']).len();
    name.truncate(trimmed);
}

fn truncate_bytes(name: &mut String, max_len: usize) {
    if name.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }
    name.truncate(cut);
}

fn is_reserved_device_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or_default().to_ascii_uppercase();
    RESERVED_DEVICE_NAMES.iter().any(|reserved| match *reserved {
        "COM" | "LPT" => {
            stem.len() == 4
                && stem.starts_with(reserved)
                && stem.as_bytes()[3].is_ascii_digit()
        }
        exact => stem == exact,
    })
}
