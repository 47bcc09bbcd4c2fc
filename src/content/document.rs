//! Document model

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::frontmatter::Metadata;

/// One source content file (post or note) with metadata and body
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    /// Source path relative to the source directory, `/`-separated
    pub path: String,

    /// Output URL path (without root), e.g. `posts/enums/`
    pub route: String,

    /// Document title
    pub title: String,

    /// Optional summary line
    pub description: Option<String>,

    /// Publication date
    pub date: NaiveDateTime,

    /// Last updated date
    pub updated: Option<NaiveDateTime>,

    /// Document categories
    pub categories: BTreeSet<String>,

    /// Document tags
    pub tags: BTreeSet<String>,

    /// Unpublished documents are drafts
    pub published: bool,

    /// Raw markdown body
    pub body: String,

    /// Rendered HTML body
    pub content: String,

    /// Rendered HTML before `<!-- more -->`
    pub excerpt: Option<String>,

    /// Full source file path
    #[serde(skip)]
    pub full_source: PathBuf,

    /// Custom front-matter fields
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Document {
    /// Build a document from parsed metadata; `content` is filled in by rendering
    pub fn new(path: impl Into<String>, meta: Metadata, body: impl Into<String>) -> Self {
        let path = path.into();
        let route = route_for(&path);
        Self {
            full_source: PathBuf::from(&path),
            path,
            route,
            title: meta.title,
            description: meta.description,
            date: meta.date,
            updated: meta.updated,
            categories: meta.categories,
            tags: meta.tags,
            published: meta.published,
            body: body.into(),
            content: String::new(),
            excerpt: None,
            extra: meta.extra,
        }
    }

    /// The front-matter fields of this document
    pub fn metadata(&self) -> Metadata {
        Metadata {
            title: self.title.clone(),
            description: self.description.clone(),
            date: self.date,
            updated: self.updated,
            categories: self.categories.clone(),
            tags: self.tags.clone(),
            published: self.published,
            extra: self.extra.clone(),
        }
    }

    /// Last path segment of the route
    pub fn slug(&self) -> &str {
        self.route
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

/// Derive the output route from a source path: every component is slugified,
/// the Markdown extension dropped, and `index` files map to their directory.
pub fn route_for(path: &str) -> String {
    let path = Path::new(path);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();

    let mut segments: Vec<String> = path
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .map(slug::slugify)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if stem != "index" {
        let stem_slug = slug::slugify(stem);
        if !stem_slug.is_empty() {
            segments.push(stem_slug);
        }
    }

    if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_for() {
        assert_eq!(route_for("posts/enums.md"), "posts/enums/");
        assert_eq!(route_for("Swift Closures.markdown"), "swift-closures/");
        assert_eq!(route_for("notes/SwiftData/index.md"), "notes/swiftdata/");
        assert_eq!(route_for("index.md"), "");
    }

    #[test]
    fn test_document_slug() {
        let meta = Metadata::parse("---\ntitle: Enums\ndate: 2022-03-01\n---\nBody")
            .unwrap()
            .0;
        let doc = Document::new("posts/enums.md", meta.clone(), "Body");
        assert_eq!(doc.slug(), "enums");
        assert_eq!(doc.metadata(), meta);
        assert_eq!(doc.body, "Body");
    }
}
