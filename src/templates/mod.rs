//! Built-in page chrome using the Tera template engine
//!
//! Templates are embedded in the binary; a theme layer that wants different
//! chrome wraps the rendered document content instead.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

/// Template renderer with the embedded page chrome
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Text fields are escaped while building the data; rendered HTML and
        // URLs must pass through untouched
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("chrome/layout.html")),
            ("document.html", include_str!("chrome/document.html")),
            ("listing.html", include_str!("chrome/listing.html")),
            ("labels.html", include_str!("chrome/labels.html")),
            ("archive.html", include_str!("chrome/archive.html")),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => " ...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Site-wide data for templates
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub root: String,
    pub feed_url: String,
    pub archive_url: String,
    pub tags_url: String,
    pub categories_url: String,
}

/// A tag or category link
#[derive(Debug, Clone, Serialize)]
pub struct LabelData {
    pub name: String,
    pub url: String,
    pub count: usize,
}

/// Document data for templates
#[derive(Debug, Clone, Serialize)]
pub struct DocumentData {
    pub title: String,
    pub date: String,
    pub date_iso: String,
    pub url: String,
    pub description: Option<String>,
    pub categories: Vec<LabelData>,
    pub tags: Vec<LabelData>,
    pub content: String,
    pub excerpt: Option<String>,
}

/// Navigation link to a neighbouring document
#[derive(Debug, Clone, Serialize)]
pub struct NavDocument {
    pub title: String,
    pub url: String,
}

/// Pagination data for listing pages
#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub per_page: usize,
    pub total: usize,
    pub current: usize,
    pub prev_link: String,
    pub next_link: String,
}

/// Archive data grouped by year
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveYearData {
    pub year: i32,
    pub docs: Vec<DocumentData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> SiteData {
        SiteData {
            title: "Swift Notes".to_string(),
            subtitle: String::new(),
            description: String::new(),
            author: "Author".to_string(),
            language: "en".to_string(),
            root: "/".to_string(),
            feed_url: "/atom.xml".to_string(),
            archive_url: "/archives/".to_string(),
            tags_url: "/tags/".to_string(),
            categories_url: "/categories/".to_string(),
        }
    }

    #[test]
    fn test_templates_load() {
        assert!(TemplateRenderer::new().is_ok());
    }

    #[test]
    fn test_render_labels_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &site());
        context.insert("heading", "Tags");
        context.insert(
            "labels",
            &vec![LabelData {
                name: "swift".to_string(),
                url: "/tags/swift/".to_string(),
                count: 3,
            }],
        );

        let html = renderer.render("labels.html", &context).unwrap();
        assert!(html.contains(r#"<a href="/tags/swift/">swift</a>"#));
        assert!(html.contains("<title>Tags | Swift Notes</title>"));
    }

    #[test]
    fn test_truncate_chars_filter() {
        let value = tera::Value::String("abcdefghij".to_string());
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(4));
        let out = truncate_chars_filter(&value, &args).unwrap();
        assert_eq!(out, tera::Value::String("abcd ...".to_string()));
    }
}
