//! Message-body record parsing.
//!
//! A message body is a sequence of records separated by runs of blank lines.
//! Each record optionally starts with a `#` header line of comma-separated
//! `key: value` pairs; the rest of the record is the params body handed to
//! the goal. Parsing is deliberately lenient: malformed header components
//! degrade to flags or defaults, never to an error.

use std::collections::HashMap;

use crate::config::DefaultHeader;

/// One parsed header value: either `key: value` text or a bare `key` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Text(String),
    Flag,
}

/// Record header: string keys over text-or-flag values. Built once during
/// record parsing (record fields merged over the configured defaults) and
/// read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header(HashMap<String, HeaderValue>);

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header carrying only the configured defaults (`type`, `dir`).
    pub fn defaults(defaults: &DefaultHeader) -> Self {
        let mut map = HashMap::new();
        map.insert("type".to_string(), HeaderValue::Text(defaults.goal_type.clone()));
        map.insert("dir".to_string(), HeaderValue::Text(defaults.dir.clone()));
        Self(map)
    }

    pub fn insert(&mut self, key: String, value: HeaderValue) {
        self.0.insert(key, value);
    }

    /// Text value for `key`, if present and textual (flags return None).
    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(HeaderValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Merge `other` into `self`, key by key; `other` wins on conflicts.
    pub fn merge(&mut self, other: Header) {
        for (k, v) in other.0 {
            self.0.insert(k, v);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Returns the length of a record separator starting at the beginning of `s`,
/// or None. A separator is a line break followed by one or more blank lines
/// (horizontal whitespace only), each terminated by a newline.
fn separator_len(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    let mut i = 0;
    if b.first() == Some(&b'\r') {
        i += 1;
    }
    if b.get(i) != Some(&b'\n') {
        return None;
    }
    i += 1;

    let mut matched = false;
    loop {
        let mut j = i;
        while matches!(b.get(j), Some(&(b' ' | b'\t' | b'\r' | b'\x0c'))) {
            j += 1;
        }
        if b.get(j) == Some(&b'\n') {
            i = j + 1;
            matched = true;
        } else {
            break;
        }
    }

    if matched {
        Some(i)
    } else {
        None
    }
}

/// Split a message body into records on runs of blank lines.
///
/// Always yields at least one record: empty input yields one empty record,
/// and a separator at the start or end of the body yields an empty record on
/// that side (downstream tolerates empty params).
pub fn parse_content(content: &str) -> Vec<String> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < content.len() {
        if let Some(len) = separator_len(&content[i..]) {
            records.push(content[start..i].to_string());
            i += len;
            start = i;
        } else {
            // Separator bytes are ASCII, so advancing by one char keeps us
            // on UTF-8 boundaries.
            i += content[i..].chars().next().map_or(1, char::len_utf8);
        }
    }
    records.push(content[start..].to_string());
    records
}

/// Parse one `#` header line (without the `#`) into a header.
///
/// Components are comma-separated; each splits on the first `:` into a
/// trimmed key/value pair. A component with no `:` becomes a boolean flag
/// keyed by its trimmed text.
pub fn parse_header(header_line: &str) -> Header {
    let mut header = Header::new();
    for component in header_line.split(',') {
        match component.split_once(':') {
            Some((key, value)) => {
                header.insert(key.trim().to_string(), HeaderValue::Text(value.trim().to_string()));
            }
            None => {
                header.insert(component.trim().to_string(), HeaderValue::Flag);
            }
        }
    }
    header
}

/// Split one record into its effective header and params body.
///
/// A trimmed record starting with `#` has its first line parsed as a header
/// and merged over `defaults`; everything after that line is params. Records
/// without a header line get exactly the default header and the whole
/// trimmed record as params.
pub fn parse_record(record: &str, defaults: &DefaultHeader) -> (Header, String) {
    let record = record.trim();

    let mut header = Header::defaults(defaults);

    if let Some(rest) = record.strip_prefix('#') {
        let (line, params) = match rest.split_once('\n') {
            Some((line, params)) => (line, params),
            None => (rest, ""),
        };
        header.merge(parse_header(line));
        (header, params.to_string())
    } else {
        (header, record.to_string())
    }
}
