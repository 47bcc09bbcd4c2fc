//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Why a document's front matter could not be turned into [`Metadata`]
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("no front-matter block found")]
    Missing,

    #[error("front-matter block is never closed")]
    Unterminated,

    #[error("malformed YAML front-matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed JSON front-matter: {0}")]
    Json(#[from] serde_json::Error),

    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("field `{field}` is not a valid date: {value:?}")]
    InvalidDate { field: &'static str, value: String },
}

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

fn is_true(value: &bool) -> bool {
    *value
}

/// Front-matter exactly as written in the source file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub categories: Vec<String>,
    #[serde(
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "is_true")]
    pub published: bool,

    /// Additional custom fields, in source order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            title: None,
            description: None,
            date: None,
            updated: None,
            categories: Vec::new(),
            tags: Vec::new(),
            published: true,
            extra: IndexMap::new(),
        }
    }
}

impl FrontMatter {
    /// Split raw document text into front-matter and body
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        Err(FrontMatterError::Missing)
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let (yaml_content, remaining) = split_fenced(content)?;

        // A `---` pair around prose is a Markdown thematic break, not metadata
        if !looks_like_yaml(yaml_content) {
            return Err(FrontMatterError::Missing);
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)?;
        Ok((fm, remaining))
    }

    fn parse_json(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.strip_prefix(";;;").unwrap_or(content).trim_start();
        if !content.starts_with('{') {
            return Err(FrontMatterError::Missing);
        }

        let mut stream = serde_json::Deserializer::from_str(content).into_iter::<FrontMatter>();
        let fm = match stream.next() {
            Some(result) => result?,
            None => return Err(FrontMatterError::Missing),
        };

        let remaining = content[stream.byte_offset()..].trim_start_matches([' ', '\t']);
        let remaining = remaining.trim_start_matches(['\n', '\r']);
        let remaining = remaining.strip_prefix(";;;").unwrap_or(remaining);
        let remaining = remaining.trim_start_matches(['\n', '\r']);

        Ok((fm, remaining))
    }

    /// Validate the required fields and normalize labels
    pub fn into_metadata(self) -> Result<Metadata, FrontMatterError> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(FrontMatterError::MissingField("title"))?;

        let raw_date = self.date.ok_or(FrontMatterError::MissingField("date"))?;
        let date = parse_date_string(&raw_date).ok_or_else(|| FrontMatterError::InvalidDate {
            field: "date",
            value: raw_date.clone(),
        })?;

        let updated = match self.updated {
            Some(raw) => Some(parse_date_string(&raw).ok_or_else(|| {
                FrontMatterError::InvalidDate {
                    field: "updated",
                    value: raw.clone(),
                }
            })?),
            None => None,
        };

        Ok(Metadata {
            title,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            date,
            updated,
            categories: normalize_labels(self.categories),
            tags: normalize_labels(self.tags),
            published: self.published,
            extra: self.extra,
        })
    }
}

/// Validated document metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDateTime,
    pub updated: Option<NaiveDateTime>,
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub published: bool,
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Metadata {
    /// Parse raw document text into metadata and the remaining body
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let (fm, body) = FrontMatter::parse(content)?;
        Ok((fm.into_metadata()?, body))
    }

    /// Serialize back into a `---` delimited YAML block
    pub fn to_front_matter(&self) -> Result<String, FrontMatterError> {
        let fm = FrontMatter {
            title: Some(self.title.clone()),
            description: self.description.clone(),
            date: Some(format_date_string(&self.date)),
            updated: self.updated.as_ref().map(format_date_string),
            categories: self.categories.iter().cloned().collect(),
            tags: self.tags.iter().cloned().collect(),
            published: self.published,
            extra: self.extra.clone(),
        };

        let yaml = serde_yaml::to_string(&fm)?;
        Ok(format!("---\n{}---\n", yaml))
    }
}

/// Locate the closing `---` line; returns (block, body)
fn split_fenced(content: &str) -> Result<(&str, &str), FrontMatterError> {
    let rest = content
        .strip_prefix("---")
        .ok_or(FrontMatterError::Missing)?;

    // The opening fence must stand alone on its line
    let rest = match rest.find('\n') {
        Some(nl) if rest[..nl].trim().is_empty() => &rest[nl + 1..],
        _ => return Err(FrontMatterError::Missing),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let body = rest[offset + line.len()..].trim_start_matches(['\n', '\r']);
            return Ok((&rest[..offset], body));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

/// Valid YAML front-matter has at least one line with a `key: value` pattern
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        if let Some(colon_pos) = trimmed.find(':') {
            let before_colon = &trimmed[..colon_pos];
            // Keys are simple identifiers; `https:` and friends are prose
            let is_valid_key = !before_colon.is_empty()
                && before_colon
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                && !matches!(before_colon, "http" | "https" | "ftp");
            if is_valid_key {
                let after_colon = &trimmed[colon_pos + 1..];
                return after_colon.is_empty() || after_colon.starts_with(' ');
            }
        }
        false
    })
}

fn normalize_labels(labels: Vec<String>) -> BTreeSet<String> {
    labels
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn format_date_string(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Parse a date string in various formats; offsets are normalized to UTC
pub fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Enumerations in Swift
description: Cases, raw values and associated values
date: 2022-03-01 10:30:00
tags:
  - swift
  - enums
categories:
  - Swift Basics
---

This is the content.
"#;

        let (meta, remaining) = Metadata::parse(content).unwrap();
        assert_eq!(meta.title, "Enumerations in Swift");
        assert_eq!(
            meta.description.as_deref(),
            Some("Cases, raw values and associated values")
        );
        assert_eq!(
            meta.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["enums", "swift"]
        );
        assert!(meta.categories.contains("Swift Basics"));
        assert_eq!(meta.date.format("%Y-%m-%d %H:%M").to_string(), "2022-03-01 10:30");
        assert_eq!(remaining, "This is the content.\n");
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#"{"title": "Closures", "date": "2022-05-02", "tags": ["a", "b"]}
;;;

This is content.
"#;

        let (meta, remaining) = Metadata::parse(content).unwrap();
        assert_eq!(meta.title, "Closures");
        assert_eq!(meta.tags.len(), 2);
        assert_eq!(remaining.trim(), "This is content.");
    }

    #[test]
    fn test_parse_single_string_labels() {
        let content = r#"---
title: Single Tag Post
date: 2024-01-15
tags: Notes
categories: Blog
---

Content here.
"#;

        let (meta, _) = Metadata::parse(content).unwrap();
        assert!(meta.tags.contains("Notes"));
        assert!(meta.categories.contains("Blog"));
    }

    #[test]
    fn test_labels_deduplicated_and_trimmed() {
        let content = "---\ntitle: T\ndate: 2024-01-15\ntags: [swift, ' swift ', '']\n---\n";
        let (meta, _) = Metadata::parse(content).unwrap();
        assert_eq!(meta.tags.len(), 1);
        assert!(meta.tags.contains("swift"));
    }

    #[test]
    fn test_missing_date() {
        let content = "---\ntitle: No Date\n---\nBody\n";
        let err = Metadata::parse(content).unwrap_err();
        assert!(matches!(err, FrontMatterError::MissingField("date")));
    }

    #[test]
    fn test_missing_title() {
        let content = "---\ntitle: '  '\ndate: 2022-03-01\n---\nBody\n";
        let err = Metadata::parse(content).unwrap_err();
        assert!(matches!(err, FrontMatterError::MissingField("title")));
    }

    #[test]
    fn test_invalid_calendar_date() {
        let content = "---\ntitle: Leap\ndate: 2022-02-30\n---\nBody\n";
        let err = Metadata::parse(content).unwrap_err();
        assert!(matches!(err, FrontMatterError::InvalidDate { field: "date", .. }));
    }

    #[test]
    fn test_unterminated_block() {
        let content = "---\ntitle: Open\ndate: 2022-03-01\n\nBody without closing fence\n";
        let err = Metadata::parse(content).unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        let content = r#"
---

Check out https://example.com/path and http://test.com

---
More content.
"#;

        let err = FrontMatter::parse(content).unwrap_err();
        assert!(matches!(err, FrontMatterError::Missing));
    }

    #[test]
    fn test_no_frontmatter() {
        let err = Metadata::parse("# Just a heading\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Missing));
    }

    #[test]
    fn test_metadata_round_trip() {
        let content = r#"---
title: "Strings: Unicode and Characters"
description: Grapheme clusters explained
date: 2023-07-14T08:15:00+02:00
updated: 2023/08/01
categories: [Swift Basics]
tags: [swift, strings]
published: false
series: swift-fundamentals
---
Body
"#;

        let (meta, _) = Metadata::parse(content).unwrap();
        let serialized = meta.to_front_matter().unwrap();
        let (reparsed, body) = Metadata::parse(&serialized).unwrap();
        assert_eq!(meta, reparsed);
        assert!(body.is_empty());
        assert_eq!(meta.date.format("%H:%M").to_string(), "06:15");
        assert!(!reparsed.published);
        assert!(reparsed.extra.contains_key("series"));
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date_string("2024-01-15").is_some());
        assert!(parse_date_string("2024/01/15 10:30").is_some());
        assert!(parse_date_string("2024-01-15T10:30:00").is_some());
        assert!(parse_date_string("2024-01-15T10:30:00Z").is_some());
        assert!(parse_date_string("yesterday").is_none());
        assert!(parse_date_string("2024-13-01").is_none());
    }
}
