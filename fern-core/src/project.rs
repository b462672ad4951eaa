//! Project discovery and the minimal `fern.yaml` parser.
//!
//! A directory is a project root iff it contains the `fern.yaml` marker
//! file. The file is parsed by a deliberately restricted indentation-based
//! parser rather than a full YAML implementation: callers only ever need
//! booleans, integers, strings and one nested level of mappings, and the
//! restricted grammar keeps project files language-neutral. Parse failures
//! are soft; the caller proceeds with defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PROJECT_MARKER: &str = "fern.yaml";

/// Walk upward from `start`, returning the first ancestor (or `start`
/// itself) containing the project marker file.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(start)
    };

    loop {
        if current.join(PROJECT_MARKER).is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// A scalar or one-level-nested value from `fern.yaml`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("line {0}: expected 'key: value'")]
    MissingColon(usize),

    #[error("line {0}: inconsistent indentation")]
    BadIndent(usize),
}

/// Parse the restricted indentation grammar into a key/value mapping.
/// Duplicate keys resolve last-write-wins.
pub fn parse(text: &str) -> Result<BTreeMap<String, Value>, ParseError> {
    let lines: Vec<(usize, usize, &str)> = text
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let trimmed = raw.trim_end();
            let body = trimmed.trim_start();
            if body.is_empty() || body.starts_with('#') {
                return None;
            }
            Some((i + 1, trimmed.len() - body.len(), body))
        })
        .collect();

    let mut pos = 0;
    let root_indent = lines.first().map(|&(_, indent, _)| indent).unwrap_or(0);
    let map = parse_block(&lines, &mut pos, root_indent)?;
    if let Some(&(number, ..)) = lines.get(pos) {
        // Leftover line shallower than the document root.
        return Err(ParseError::BadIndent(number));
    }
    Ok(map)
}

fn parse_block(
    lines: &[(usize, usize, &str)],
    pos: &mut usize,
    indent: usize,
) -> Result<BTreeMap<String, Value>, ParseError> {
    let mut map = BTreeMap::new();

    while let Some(&(number, line_indent, body)) = lines.get(*pos) {
        if line_indent < indent {
            break;
        }
        if line_indent > indent {
            return Err(ParseError::BadIndent(number));
        }

        let (key, rest) = body.split_once(':').ok_or(ParseError::MissingColon(number))?;
        let key = key.trim().to_string();
        let rest = rest.trim();
        *pos += 1;

        let value = if rest.is_empty() {
            match lines.get(*pos) {
                Some(&(_, next_indent, _)) if next_indent > line_indent => {
                    Value::Map(parse_block(lines, pos, next_indent)?)
                }
                _ => Value::Str(String::new()),
            }
        } else {
            scalar(rest)
        };

        map.insert(key, value);
    }

    Ok(map)
}

fn scalar(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Int(n);
    }
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(raw);
    Value::Str(unquoted.to_string())
}

/// Parsed project configuration, read-only for the lifetime of a command.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    root: PathBuf,
    values: BTreeMap<String, Value>,
}

impl ProjectConfig {
    /// Load and parse `<root>/fern.yaml`. Any failure is downgraded to a
    /// warning so the command can continue with defaults.
    pub fn load(root: &Path) -> Option<ProjectConfig> {
        let path = root.join(PROJECT_MARKER);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("Could not read {}: {}", path.display(), err);
                return None;
            }
        };
        match parse(&text) {
            Ok(values) => Some(ProjectConfig {
                root: root.to_path_buf(),
                values,
            }),
            Err(err) => {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), err);
                None
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Dotted-path lookup, e.g. `platforms.web.port`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut value = self.values.get(parts.next()?)?;
        for part in parts {
            value = value.get(part)?;
        }
        Some(value)
    }

    /// The preview-port override consumed by web builds.
    pub fn web_port(&self) -> Option<u16> {
        let port = self.get("platforms.web.port")?.as_int()?;
        u16::try_from(port).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn nested_port_lookup_yields_integer() {
        let values = parse("platforms:\n  web:\n    port: 4000\n").unwrap();
        let port = values
            .get("platforms")
            .and_then(|v| v.get("web"))
            .and_then(|v| v.get("port"))
            .and_then(Value::as_int);
        assert_eq!(port, Some(4000));
    }

    #[test]
    fn scalars_parse_to_native_types() {
        let values = parse("incremental: true\noptimize: false\nport: 3000\nname: demo\n").unwrap();
        assert_eq!(values.get("incremental"), Some(&Value::Bool(true)));
        assert_eq!(values.get("optimize"), Some(&Value::Bool(false)));
        assert_eq!(values.get("port"), Some(&Value::Int(3000)));
        assert_eq!(values.get("name"), Some(&Value::Str("demo".into())));
    }

    #[test]
    fn quoted_strings_are_unquoted() {
        let values = parse("description: \"A demo\"\n").unwrap();
        assert_eq!(values.get("description"), Some(&Value::Str("A demo".into())));
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        let values = parse("port: 3000\nport: 4000\n").unwrap();
        assert_eq!(values.get("port"), Some(&Value::Int(4000)));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let values = parse("# header\n\nname: demo\n\n# trailing\n").unwrap();
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn indentation_exits_nested_mapping() {
        let text = "platforms:\n  web:\n    port: 4000\nbuild:\n  optimize: false\n";
        let values = parse(text).unwrap();
        assert!(values.contains_key("platforms"));
        assert_eq!(
            values.get("build").and_then(|v| v.get("optimize")),
            Some(&Value::Bool(false))
        );
    }

    #[test]
    fn missing_colon_is_an_error() {
        assert_eq!(parse("not a mapping\n"), Err(ParseError::MissingColon(1)));
    }

    #[test]
    fn stray_deep_indent_is_an_error() {
        assert!(matches!(
            parse("a: 1\n    b: 2\n"),
            Err(ParseError::BadIndent(2))
        ));
    }

    #[test]
    fn project_root_found_three_levels_up() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join(PROJECT_MARKER), "name: demo\n").unwrap();
        let deep = tmp.path().join("a/b/c");
        std::fs::create_dir_all(&deep).unwrap();

        let root = find_project_root(&deep).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn no_marker_anywhere_returns_none() {
        let tmp = tempdir().unwrap();
        assert_eq!(find_project_root(tmp.path()), None);
    }

    #[test]
    fn malformed_config_loads_as_none() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join(PROJECT_MARKER), "???\n").unwrap();
        assert!(ProjectConfig::load(tmp.path()).is_none());
    }

    #[test]
    fn web_port_override_is_consumed() {
        let tmp = tempdir().unwrap();
        std::fs::write(
            tmp.path().join(PROJECT_MARKER),
            "name: demo\nplatforms:\n  web:\n    enabled: true\n    port: 4123\n",
        )
        .unwrap();

        let config = ProjectConfig::load(tmp.path()).unwrap();
        assert_eq!(config.web_port(), Some(4123));
        assert_eq!(
            config.get("platforms.web.enabled").and_then(Value::as_bool),
            Some(true)
        );
    }
}
