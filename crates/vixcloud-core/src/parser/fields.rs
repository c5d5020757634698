//! Manifest field recovery
//!
//! Pulls `url`, `token` and `expires` out of the extracted object literal
//! through an ordered chain of [`FieldStrategy`] implementations, and the
//! high-definition flag from its sibling top-level assignment.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::parser::object::extract_object;
use crate::types::ManifestDescriptor;
use crate::url::unescape_js_slashes;

/// Fields every strategy must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredFields {
    pub url: String,
    pub token: String,
    pub expires: String,
}

impl RecoveredFields {
    fn new(url: String, token: String, expires: String) -> Option<Self> {
        if url.is_empty() || token.is_empty() || expires.is_empty() {
            return None;
        }
        Some(Self {
            url: unescape_js_slashes(&url),
            token,
            expires,
        })
    }
}

/// One way of reading manifest fields out of loosely-structured script
///
/// Implementations return `None` when they cannot produce every field;
/// the recoverer then moves on to the next strategy.
pub trait FieldStrategy: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Recovers the fields from `object` (the extracted literal), with the
    /// whole script `buffer` available for fields declared elsewhere
    fn recover(&self, object: &str, buffer: &str) -> Option<RecoveredFields>;
}

/// Normalizes the object literal to JSON and parses it
///
/// Expects `url` at the top level and `token`/`expires` under `params`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralStrategy;

impl FieldStrategy for StructuralStrategy {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn recover(&self, object: &str, _buffer: &str) -> Option<RecoveredFields> {
        let json = normalize_object_literal(object);
        let value: Value = match serde_json::from_str(&json) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Normalized object is not valid JSON");
                return None;
            }
        };

        let url = value.get("url").and_then(value_as_string)?;
        let params = value.get("params").unwrap_or(&value);
        let token = params.get("token").and_then(value_as_string)?;
        let expires = params.get("expires").and_then(value_as_string)?;

        RecoveredFields::new(url, token, expires)
    }
}

/// Matches each field independently with a regular expression
///
/// Tries the object first and the whole buffer for anything missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexStrategy;

impl FieldStrategy for RegexStrategy {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn recover(&self, object: &str, buffer: &str) -> Option<RecoveredFields> {
        let string_field = |key: &str| {
            let pattern = format!(r#"\b{key}\b['"]?\s*:\s*['"]([^'"]+)['"]"#);
            capture_first(&pattern, object).or_else(|| capture_first(&pattern, buffer))
        };
        let numeric_field = |key: &str| {
            let pattern = format!(r#"\b{key}\b['"]?\s*:\s*['"]?(\d+)['"]?"#);
            capture_first(&pattern, object).or_else(|| capture_first(&pattern, buffer))
        };

        let url = string_field("url")?;
        let token = string_field("token")?;
        let expires = numeric_field("expires")?;

        RecoveredFields::new(url, token, expires)
    }
}

/// Recovers a [`ManifestDescriptor`] from a player page's script buffer
pub struct FieldRecoverer {
    marker: String,
    hd_flag: String,
    strategies: Vec<Box<dyn FieldStrategy>>,
}

impl std::fmt::Debug for FieldRecoverer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRecoverer")
            .field("marker", &self.marker)
            .field("hd_flag", &self.hd_flag)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FieldRecoverer {
    /// Create a recoverer with the structural → regex strategy chain
    ///
    /// # Arguments
    /// * `marker` - Name of the assignment holding the manifest object
    /// * `hd_flag` - Name of the top-level boolean high-definition flag
    ///
    /// # Errors
    /// Returns `InvalidConfig` if either name is blank
    pub fn new(marker: &str, hd_flag: &str) -> Result<Self> {
        if marker.trim().is_empty() {
            return Err(ResolveError::InvalidConfig("marker cannot be empty".to_string()));
        }
        if hd_flag.trim().is_empty() {
            return Err(ResolveError::InvalidConfig("hd flag cannot be empty".to_string()));
        }

        Ok(Self {
            marker: marker.trim().to_string(),
            hd_flag: hd_flag.trim().to_string(),
            strategies: vec![Box::new(StructuralStrategy), Box::new(RegexStrategy)],
        })
    }

    /// Append a strategy, tried after the existing ones
    pub fn with_strategy(mut self, strategy: Box<dyn FieldStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Names of the configured strategies, in the order they are tried
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Recovers the manifest descriptor from a script buffer
    ///
    /// # Errors
    /// - `ScriptNotFound` if the marker is absent
    /// - `MalformedObject` if the object never closes or no strategy
    ///   yields every field
    pub fn recover(&self, buffer: &str) -> Result<ManifestDescriptor> {
        let object = extract_object(buffer, &self.marker)?;

        let fields = self
            .strategies
            .iter()
            .find_map(|strategy| {
                let fields = strategy.recover(object, buffer);
                debug!(
                    strategy = strategy.name(),
                    recovered = fields.is_some(),
                    "Tried field strategy"
                );
                fields
            })
            .ok_or_else(|| {
                ResolveError::MalformedObject(format!(
                    "no strategy recovered url/token/expires from `{}`",
                    self.marker
                ))
            })?;

        Ok(ManifestDescriptor {
            base_url: fields.url,
            token: fields.token,
            expires: fields.expires,
            allows_high_def: recover_hd_flag(buffer, &self.hd_flag),
        })
    }
}

/// Reads a top-level `flag = true|false` assignment; `false` when absent
pub fn recover_hd_flag(buffer: &str, flag: &str) -> bool {
    let pattern = format!(r"\b{}\s*=\s*(true|false)\b", regex::escape(flag));
    capture_first(&pattern, buffer).is_some_and(|v| v == "true")
}

/// Rewrites a JavaScript object literal toward strict JSON
///
/// Quotes bare keys, turns single-quoted and backtick strings into
/// double-quoted ones, drops comments, trailing commas and `;`. Text inside strings
/// is never touched apart from quote escaping.
pub fn normalize_object_literal(object: &str) -> String {
    let chars: Vec<char> = object.chars().collect();
    let mut out = String::with_capacity(object.len() + 16);
    let mut last: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' | '`' => {
                i = push_json_string(&chars, i, &mut out);
                last = Some('"');
            }
            ';' => i += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            ',' if matches!(next_significant(&chars, i + 1), Some('}' | ']') | None) => i += 1,
            c if is_ident_start(c) && matches!(last, Some('{' | '[' | ',')) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                if next_significant(&chars, i) == Some(':') {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(&ident);
                }
                last = Some('"');
            }
            c => {
                out.push(c);
                if !c.is_whitespace() {
                    last = Some(c);
                }
                i += 1;
            }
        }
    }

    out
}

/// Copies the string literal starting at `chars[start]` as a JSON string
///
/// Returns the index just past the closing quote.
fn push_json_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                let next = chars[i + 1];
                if next == '\'' || next == '`' {
                    out.push(next);
                } else {
                    out.push('\\');
                    out.push(next);
                }
                i += 2;
                continue;
            }
            c if c == quote => {
                out.push('"');
                return i + 1;
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
        i += 1;
    }

    i
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
    chars[from.min(chars.len())..]
        .iter()
        .copied()
        .find(|c| !c.is_whitespace())
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn capture_first(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
