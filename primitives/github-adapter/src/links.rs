//! `Link` header parsing.
//!
//! GitHub advertises pagination with RFC 8288 style headers:
//!
//! ```text
//! <https://api.github.com/repositories/1/issues?page=2>; rel="next",
//! <https://api.github.com/repositories/1/issues?page=5>; rel="last"
//! ```
//!
//! The adapter only records these relations; it never follows them.

use std::collections::BTreeMap;

/// Relation name (`next`, `prev`, `first`, `last`, ...) to target URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks(BTreeMap<String, String>);

impl PageLinks {
    /// URL for the given relation.
    pub fn get(&self, rel: &str) -> Option<&str> {
        self.0.get(rel).map(String::as_str)
    }

    /// URL of the next page.
    pub fn next(&self) -> Option<&str> {
        self.get("next")
    }

    /// URL of the last page.
    pub fn last(&self) -> Option<&str> {
        self.get("last")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parses a `Link` header value.
///
/// Entries without a `<url>` target or without a `rel` parameter are skipped.
/// A `rel` listing several space-separated relations maps each of them to the
/// same URL. When a relation repeats, the first occurrence wins.
pub fn parse_link_header(value: &str) -> PageLinks {
    let mut links = BTreeMap::new();

    for entry in split_entries(value) {
        let Some((url, params)) = split_target(entry) else {
            continue;
        };

        for param in params.split(';') {
            let Some((key, val)) = param.split_once('=') else {
                continue;
            };
            if !key.trim().eq_ignore_ascii_case("rel") {
                continue;
            }
            let rels = val.trim().trim_matches('"');
            for rel in rels.split_whitespace() {
                links
                    .entry(rel.to_ascii_lowercase())
                    .or_insert_with(|| url.to_string());
            }
        }
    }

    PageLinks(links)
}

/// Splits on commas that are outside `<...>` targets, since URLs may contain commas.
fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);

    entries
}

/// Returns the URL inside `<...>` and the parameter string after it.
fn split_target(entry: &str) -> Option<(&str, &str)> {
    let entry = entry.trim();
    let rest = entry.strip_prefix('<')?;
    let end = rest.find('>')?;
    let url = rest[..end].trim();
    if url.is_empty() {
        return None;
    }
    Some((url, &rest[end + 1..]))
}
