//! Dotted/bracketed key resolution against nested values
//!
//! `item.subEntry.array[3].value` and `item[subEntry].array[3][value]`
//! resolve to the same value. Bracket groups are delimited by bracket
//! balance rather than content, so `name[a.b][][[]]` has the groups
//! `a.b`, the empty key and `[]`. Keys whose brackets cannot be parsed are
//! treated as literal property names. Resolution never fails loudly: any
//! missing step yields `None`.

use serde_json::Value;

const OBJ_SEP: char = '.';
const OPEN: char = '[';
const CLOSE: char = ']';

/// One bracket group of a path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathIndex {
    Index(usize),
    Key(String),
}

impl PathIndex {
    fn parse(group: &str) -> Self {
        if !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = group.parse() {
                return PathIndex::Index(index);
            }
        }
        PathIndex::Key(group.to_string())
    }

    fn step<'v>(&self, current: &'v Value) -> Option<&'v Value> {
        match (self, current) {
            (PathIndex::Index(index), Value::Array(items)) => items.get(*index),
            (PathIndex::Index(index), Value::Object(map)) => map.get(&index.to_string()),
            (PathIndex::Key(key), Value::Object(map)) => map.get(key),
            _ => None,
        }
    }
}

/// A path segment split into its property name and bracket groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub name: String,
    pub indexes: Vec<PathIndex>,
}

impl ParsedKey {
    fn literal(segment: &str) -> Self {
        ParsedKey {
            name: segment.to_string(),
            indexes: Vec::new(),
        }
    }

    fn resolve<'v>(&self, current: &'v Value) -> Option<&'v Value> {
        let mut current = if self.name.is_empty() && !self.indexes.is_empty() {
            current
        } else {
            match current {
                Value::Object(map) => map.get(&self.name)?,
                Value::Array(items) => items.get(self.name.parse::<usize>().ok()?)?,
                _ => return None,
            }
        };

        for index in &self.indexes {
            current = index.step(current)?;
        }
        Some(current)
    }
}

/// Split a segment into its name and bracket groups
///
/// The name runs up to the first `[`; the rest must be a contiguous run of
/// balanced groups ending the segment, otherwise the whole segment is a
/// literal name.
pub fn parse_brackets(segment: &str) -> ParsedKey {
    if !segment.ends_with(CLOSE) {
        return ParsedKey::literal(segment);
    }
    let Some(first_open) = segment.find(OPEN) else {
        return ParsedKey::literal(segment);
    };

    let mut indexes = Vec::new();
    let mut depth = 0usize;
    let mut group_start = 0usize;

    for (offset, ch) in segment[first_open..].char_indices() {
        let at = first_open + offset;
        match ch {
            OPEN => {
                if depth == 0 {
                    group_start = at + OPEN.len_utf8();
                }
                depth += 1;
            }
            CLOSE => {
                if depth == 0 {
                    return ParsedKey::literal(segment);
                }
                depth -= 1;
                if depth == 0 {
                    indexes.push(PathIndex::parse(&segment[group_start..at]));
                }
            }
            // Text between two top-level groups breaks the bracket run
            _ if depth == 0 => return ParsedKey::literal(segment),
            _ => {}
        }
    }

    if depth != 0 {
        return ParsedKey::literal(segment);
    }

    ParsedKey {
        name: segment[..first_open].to_string(),
        indexes,
    }
}

/// Split a path on separators that sit outside of brackets
///
/// Falls back to splitting on every separator when the path's brackets are
/// unbalanced.
fn split_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut balanced = true;

    for (at, ch) in path.char_indices() {
        match ch {
            OPEN => depth += 1,
            CLOSE => match depth.checked_sub(1) {
                Some(next) => depth = next,
                None => balanced = false,
            },
            OBJ_SEP if depth == 0 => {
                segments.push(&path[start..at]);
                start = at + OBJ_SEP.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&path[start..]);

    if balanced && depth == 0 {
        segments
    } else {
        path.split(OBJ_SEP).collect()
    }
}

/// A parsed key path, reusable across many values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<ParsedKey>,
}

impl JsonPath {
    pub fn parse(path: &str) -> Self {
        JsonPath {
            segments: split_segments(path).into_iter().map(parse_brackets).collect(),
        }
    }

    pub fn segments(&self) -> &[ParsedKey] {
        &self.segments
    }

    pub fn resolve<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| segment.resolve(current))
    }
}

/// Resolve `path` against `root`; `None` when any step is missing
pub fn resolve<'v>(path: &str, root: &'v Value) -> Option<&'v Value> {
    JsonPath::parse(path).resolve(root)
}
