//! Name sanitizer: free-form text to a platform-safe folder name.
//!
//! The pipeline runs in a fixed order and later stages rely on the
//! normalization done by earlier ones:
//!
//! 1. trim, optionally collapse runs of spaces
//! 2. optional ASCII transliteration
//! 3. optional spaces to underscores
//! 4. word limiting (only when shortening)
//! 5. platform sanitization and length cap
//! 6. optional merge of underscore runs
//! 7. optional case conversion

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::platform::{MAX_COMPONENT_LEN, Platform, sanitize_component};
use super::words::limit_words;

static SPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +").expect("space run regex"));
static UNDERSCORE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("underscore run regex"));

/// Case transform applied as the last stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseConversion {
    Keep,
    Lower,
    Upper,
    Title,
}

impl CaseConversion {
    pub fn apply(self, text: &str) -> String {
        match self {
            CaseConversion::Keep => text.to_string(),
            CaseConversion::Lower => text.to_lowercase(),
            CaseConversion::Upper => text.to_uppercase(),
            CaseConversion::Title => title_case(text),
        }
    }
}

impl FromStr for CaseConversion {
    type Err = std::convert::Infallible;

    /// Anything other than `lower`, `upper` or `title` keeps the case.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "lower" => CaseConversion::Lower,
            "upper" => CaseConversion::Upper,
            "title" => CaseConversion::Title,
            _ => CaseConversion::Keep,
        })
    }
}

/// Switches for every sanitizer stage, snapshotted from the `naming` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    pub reduce_spaces: bool,
    pub unidecode: bool,
    pub underscore: bool,
    pub merge_underscores: bool,
    pub max_len: usize,
    pub num_words: usize,
    pub min_word_length: usize,
    pub convert_case: CaseConversion,
    pub platform: Platform,
}

impl NamingPolicy {
    /// Apply the word limiter with this policy's limits.
    pub fn limit_words(&self, text: &str) -> String {
        limit_words(text, self.num_words, self.min_word_length)
    }
}

/// Derive a folder name from `text`.
///
/// With `shorten` the word limiter runs and the length cap is
/// `policy.max_len`; otherwise the cap is [`MAX_COMPONENT_LEN`]. Never fails:
/// an empty result is returned as is and callers decide whether to reject it.
pub fn sanitize(text: &str, policy: &NamingPolicy, shorten: bool) -> String {
    let mut name = text.trim().to_string();

    if policy.reduce_spaces {
        name = SPACE_RUN_RE.replace_all(&name, " ").into_owned();
    }

    if policy.unidecode {
        name = deunicode::deunicode(&name);
    }

    if policy.underscore {
        name = name.replace(' ', "_");
    }

    let max_len = if shorten {
        name = policy.limit_words(&name);
        policy.max_len
    } else {
        MAX_COMPONENT_LEN
    };
    name = sanitize_component(&name, policy.platform, max_len);

    if policy.merge_underscores {
        name = UNDERSCORE_RUN_RE.replace_all(&name, "_").into_owned();
    }

    name = policy.convert_case.apply(&name);

    debug!(source = text, result = %name, "name sanitized");
    name
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::Config;

    fn posix_policy() -> NamingPolicy {
        NamingPolicy {
            platform: Platform::Posix,
            ..Config::default().naming_policy().expect("default policy")
        }
    }

    #[test]
    fn default_policy_comes_from_built_in_configuration() {
        let policy = posix_policy();
        assert_eq!(policy.max_len, 32);
        assert_eq!(policy.num_words, 32);
        assert_eq!(policy.min_word_length, 1);
        assert_eq!(policy.convert_case, CaseConversion::Lower);
        assert!(policy.reduce_spaces && policy.unidecode && policy.underscore);
    }

    #[test]
    fn default_pipeline_produces_lowercase_ascii_snake() {
        let policy = posix_policy();
        assert_eq!(
            sanitize("  José   María  López ", &policy, false),
            "jose_maria_lopez"
        );
    }

    #[test]
    fn shorten_caps_at_policy_max_len() {
        let policy = NamingPolicy {
            max_len: 8,
            ..posix_policy()
        };
        assert_eq!(sanitize("Grupo de Programación", &policy, true), "grupo_de");
        assert_eq!(
            sanitize("Grupo de Programación", &policy, false),
            "grupo_de_programacion"
        );
    }

    #[test]
    fn shorten_limits_words_when_spaces_survive() {
        let policy = NamingPolicy {
            underscore: false,
            num_words: 2,
            min_word_length: 3,
            ..posix_policy()
        };
        assert_eq!(sanitize("Juan de la Cruz Pérez", &policy, true), "juan cruz");
    }

    #[test]
    fn windows_rules_strip_reserved_characters() {
        let policy = NamingPolicy {
            platform: Platform::Windows,
            ..posix_policy()
        };
        assert_eq!(sanitize("Q&A: week 1?", &policy, false), "q&a_week_1");
    }

    #[test]
    fn merges_underscore_runs() {
        assert_eq!(sanitize("a _ b", &posix_policy(), false), "a_b");
    }

    #[test]
    fn stages_can_be_disabled() {
        let policy = NamingPolicy {
            reduce_spaces: false,
            unidecode: false,
            underscore: false,
            merge_underscores: false,
            convert_case: CaseConversion::Keep,
            ..posix_policy()
        };
        assert_eq!(sanitize(" Ana  Peña ", &policy, false), "Ana  Peña");
    }

    #[test]
    fn case_conversions() {
        let title = NamingPolicy {
            convert_case: CaseConversion::Title,
            ..posix_policy()
        };
        assert_eq!(sanitize("ana o'neil", &title, false), "Ana_O'Neil");

        let upper = NamingPolicy {
            convert_case: CaseConversion::Upper,
            ..posix_policy()
        };
        assert_eq!(sanitize("ana", &upper, false), "ANA");
        assert_eq!("Camel".parse::<CaseConversion>(), Ok(CaseConversion::Keep));
        assert_eq!("TITLE".parse::<CaseConversion>(), Ok(CaseConversion::Title));
    }

    #[test]
    fn blank_input_yields_empty_name() {
        assert_eq!(sanitize("   ", &posix_policy(), false), "");
    }

    #[test]
    fn is_deterministic() {
        let policy = posix_policy();
        let inputs = ["Ünïcödé  text", "a/b/c", "   ", "Mañana: día 3"];
        for input in inputs {
            assert_eq!(
                sanitize(input, &policy, true),
                sanitize(input, &policy, true)
            );
        }
    }

    #[test]
    fn separator_only_input_respects_cap() {
        let policy = NamingPolicy {
            max_len: 5,
            merge_underscores: false,
            ..posix_policy()
        };
        for input in ["- - - - - - - -", "________________", "!? ;; ,, .. --"] {
            assert!(sanitize(input, &policy, true).len() <= 5, "{input}");
            assert!(sanitize(input, &policy, false).len() <= MAX_COMPONENT_LEN);
        }
    }
}
