// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment reports a failed extraction as a chain of errors carrying a key
//! path. Each one becomes a [`ConfigError`]; when the offending TOML text is
//! at hand the error also points at the key, and unknown keys get a
//! closest-match suggestion.

// miette's derive assigns label fields that rustc then reports as unused.
#![allow(unused_assignments)]

use std::collections::HashMap;

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a known key must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration problem, renderable with [`render_errors`].
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("`{key}` is not a recognised setting")]
    #[diagnostic(
        code(courier::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest known key, if one is similar enough.
        suggestion: Option<String>,
        /// Known keys at this level, comma separated.
        valid_keys: String,
        #[label("unknown key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: {detail}")]
    #[diagnostic(code(courier::config::invalid_type), help("this setting takes {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("not {expected}")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("required setting `{key}` is missing")]
    #[diagnostic(
        code(courier::config::missing_key),
        help("add `{key} = <value>` to courier.toml or set the matching COURIER_* variable")
    )]
    MissingKey { key: String },

    /// Checks that run after deserialisation (duplicates, URLs, ranges).
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(courier::config::validation))]
    Validation { message: String },

    #[error("configuration could not be loaded: {0}")]
    #[diagnostic(code(courier::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Known keys here: {valid_keys}"),
        None => format!("known keys here: {valid_keys}"),
    }
}

/// Turns every error in a Figment chain into a [`ConfigError`].
///
/// `toml_sources` holds `(path, contents)` of the files that were merged;
/// they are only used to attach spans.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    let sources = TomlSources(toml_sources);
    err.into_iter()
        .map(|error| ConfigError::from_figment(&error, &sources))
        .collect()
}

impl ConfigError {
    fn from_figment(error: &figment::Error, sources: &TomlSources<'_>) -> Self {
        let path: Vec<String> = error.path.iter().map(|p| p.to_string()).collect();

        match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = sources.locate(error, KeyLocation::new(&path, field));
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::MissingKey {
                key: dotted(&path, Some(&**field)),
            },
            Kind::InvalidType(actual, expected) => {
                let (span, src) = match path.split_last() {
                    Some((field, section)) => {
                        sources.locate(error, KeyLocation::new(section, field))
                    }
                    None => (None, None),
                };
                ConfigError::InvalidType {
                    key: dotted(&path, None),
                    detail: format!("found {actual}, expected {expected}"),
                    expected: expected.clone(),
                    span,
                    src,
                }
            }
            _ => ConfigError::Other(error.to_string()),
        }
    }
}

fn dotted(path: &[String], field: Option<&str>) -> String {
    let mut parts: Vec<&str> = path.iter().map(String::as_str).collect();
    parts.extend(field);
    parts.join(".")
}

/// The TOML documents a configuration was merged from.
struct TomlSources<'a>(&'a [(String, String)]);

impl TomlSources<'_> {
    /// Finds the document the error came from: the file Figment names, or
    /// the only document when it was loaded from a string.
    fn document_for(&self, error: &figment::Error) -> Option<&(String, String)> {
        let file = error
            .metadata
            .as_ref()
            .and_then(|m| m.source.as_ref())
            .and_then(|s| match s {
                figment::Source::File(path) => Some(path.display().to_string()),
                _ => None,
            });

        match (file, self.0) {
            (Some(file), docs) => docs.iter().find(|(path, _)| *path == file),
            (None, [only]) => Some(only),
            (None, _) => None,
        }
    }

    fn locate(
        &self,
        error: &figment::Error,
        location: KeyLocation<'_>,
    ) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
        let Some((path, toml)) = self.document_for(error) else {
            return (None, None);
        };
        match location.offset_in(toml) {
            Some(offset) => (
                Some(SourceSpan::new(offset.into(), location.key.len())),
                Some(NamedSource::new(path, toml.clone())),
            ),
            None => (None, None),
        }
    }
}

/// Where a key sits in a TOML document: under which section header and, for
/// repeated `[[array]]` headers, under which occurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
struct KeyLocation<'a> {
    section: Option<&'a str>,
    occurrence: usize,
    key: &'a str,
}

impl<'a> KeyLocation<'a> {
    /// Reads a Figment path such as `["sources", "1"]`: the first element is
    /// the section, a numeric second element the array index.
    fn new(path: &'a [String], key: &'a str) -> Self {
        Self {
            section: path.first().map(String::as_str),
            occurrence: path.get(1).and_then(|p| p.parse().ok()).unwrap_or(0),
            key,
        }
    }

    /// Byte offset of the key within `toml`, if it can be found.
    fn offset_in(&self, toml: &str) -> Option<usize> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut current: Option<(&str, usize)> = None;
        let mut offset = 0;

        for line in toml.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();
            let trimmed = line.trim_start();

            if let Some(name) = header_name(trimmed) {
                let count = seen.entry(name).or_insert(0);
                current = Some((name, *count));
                *count += 1;
                continue;
            }

            let in_scope = match (self.section, current) {
                (None, None) => true,
                (Some(want), Some((name, n))) => name == want && n == self.occurrence,
                _ => false,
            };
            if in_scope && defines_key(trimmed, self.key) {
                return Some(line_start + line.len() - trimmed.len());
            }
        }

        None
    }
}

/// Name inside a `[table]` or `[[array]]` header line.
fn header_name(line: &str) -> Option<&str> {
    let (inner, _) = match line.strip_prefix("[[") {
        Some(rest) => rest.split_once("]]")?,
        None => line.strip_prefix('[')?.split_once(']')?,
    };
    Some(inner.trim())
}

fn defines_key(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.starts_with([' ', '\t', '=']))
}

/// Closest known key to `unknown`, if any scores above the threshold.
pub(crate) fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Prints each error to stderr as a miette report, without colour when
/// stderr is not a terminal.
pub fn render_errors(errors: &[ConfigError]) {
    use std::io::IsTerminal;

    use miette::{GraphicalReportHandler, GraphicalTheme};

    let theme = if std::io::stderr().is_terminal() {
        GraphicalTheme::unicode()
    } else {
        GraphicalTheme::unicode_nocolor()
    };
    let handler = GraphicalReportHandler::new_themed(theme);

    for error in errors {
        let mut report = String::new();
        match handler.render_report(&mut report, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{report}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn typos_get_the_closest_key() {
        let source_keys = &["name", "short_code", "webhook_url", "retention_days"];
        assert_eq!(suggest_key("webhok_url", source_keys).as_deref(), Some("webhook_url"));
        assert_eq!(
            suggest_key("max_atempts", &["max_attempts", "delay_secs", "backoff"]).as_deref(),
            Some("max_attempts")
        );
        assert_eq!(suggest_key("zzzzzz", &["log_level", "run_timeout_secs"]), None);
    }

    #[test]
    fn key_is_found_under_its_table() {
        let toml = "log_level = \"info\"\n\n[retry]\nmax_atempts = 3\n";
        let section = path(&["retry"]);
        let offset = KeyLocation::new(&section, "max_atempts").offset_in(toml).unwrap();
        assert!(toml[offset..].starts_with("max_atempts = 3"));
    }

    #[test]
    fn top_level_key_is_not_confused_with_a_section_key() {
        let toml = "[delivery]\nlog_level = 1\n";
        assert_eq!(KeyLocation::new(&[], "log_level").offset_in(toml), None);
    }

    #[test]
    fn array_index_selects_the_matching_sources_entry() {
        let toml = "[[sources]]\nname = \"a\"\nwebhok_url = \"x\"\n\n\
                    [[sources]]\nname = \"b\"\nwebhok_url = \"y\"\n";
        let second = path(&["sources", "1"]);
        let offset = KeyLocation::new(&second, "webhok_url").offset_in(toml).unwrap();
        assert!(toml[offset..].starts_with("webhok_url = \"y\""));

        let first = path(&["sources"]);
        let offset = KeyLocation::new(&first, "webhok_url").offset_in(toml).unwrap();
        assert!(toml[offset..].starts_with("webhok_url = \"x\""));
    }

    #[test]
    fn crlf_documents_keep_correct_offsets() {
        let toml = "[retry]\r\nbackoff = \"fixed\"\r\nmax_atempts = 3\r\n";
        let section = path(&["retry"]);
        let offset = KeyLocation::new(&section, "max_atempts").offset_in(toml).unwrap();
        assert!(toml[offset..].starts_with("max_atempts"));
    }

    #[test]
    fn inline_typo_points_at_the_key() {
        let errors = crate::load_and_validate_str("[retry]\nmax_atempts = 3\n").unwrap_err();
        let located = errors.iter().any(|e| {
            matches!(e, ConfigError::UnknownKey { key, span: Some(_), .. } if key == "max_atempts")
        });
        assert!(located, "got {errors:?}");
    }
}
