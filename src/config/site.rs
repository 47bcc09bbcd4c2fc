//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,
    pub tag_dir: String,
    pub category_dir: String,
    pub archive_dir: String,

    // Writing
    pub render_drafts: bool,
    pub new_post_dir: String,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Category & Tag
    pub default_category: Option<String>,
    #[serde(default)]
    pub category_map: BTreeMap<String, String>,
    #[serde(default)]
    pub tag_map: BTreeMap<String, String>,

    // Date format (Moment.js style, e.g. "YYYY-MM-DD")
    pub date_format: String,

    // Pagination
    pub per_page: usize,
    pub pagination_dir: String,

    // Feed
    #[serde(default)]
    pub feed: FeedConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Inkpress".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "en".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),
            tag_dir: "tags".to_string(),
            category_dir: "categories".to_string(),
            archive_dir: "archives".to_string(),

            render_drafts: false,
            new_post_dir: "posts".to_string(),
            highlight: HighlightConfig::default(),

            default_category: None,
            category_map: BTreeMap::new(),
            tag_map: BTreeMap::new(),

            date_format: "YYYY-MM-DD".to_string(),

            per_page: 10,
            pagination_dir: "page".to_string(),

            feed: FeedConfig::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// URL slug for a tag, honouring `tag_map`
    pub fn tag_slug(&self, tag: &str) -> String {
        self.tag_map
            .get(tag)
            .cloned()
            .unwrap_or_else(|| slug::slugify(tag))
    }

    /// URL slug for a category, honouring `category_map`
    pub fn category_slug(&self, category: &str) -> String {
        self.category_map
            .get(category)
            .cloned()
            .unwrap_or_else(|| slug::slugify(category))
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    /// Name of a syntect bundled theme
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: true,
        }
    }
}

/// Atom feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub enable: bool,
    pub path: String,
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enable: true,
            path: "atom.xml".to_string(),
            limit: 20,
        }
    }
}
