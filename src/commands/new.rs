//! Create a new document

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

use crate::Site;

const DEFAULT_SCAFFOLD: &str = "---
title: {{ title }}
date: {{ date }}
categories: []
tags: []
---
";

/// Create a new document under `new_post_dir`; returns its path
pub fn run(site: &Site, title: &str, path: Option<&str>) -> Result<PathBuf> {
    create_document(site, title, path, Local::now().naive_local())
}

/// Create a new document dated `now`
pub fn create_document(
    site: &Site,
    title: &str,
    path: Option<&str>,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let target_dir = site.source_dir.join(&site.config.new_post_dir);

    let file_name = match path {
        Some(p) => format!("{}.md", p.trim_end_matches(".md")),
        None => {
            let slug = slug::slugify(title);
            if slug.is_empty() {
                anyhow::bail!("Title {:?} has no URL-safe characters; pass --path", title);
            }
            format!("{}.md", slug)
        }
    };
    let file_path = target_dir.join(file_name);

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    // A scaffold in the site root overrides the built-in one
    let scaffold_path = site.base_dir.join("scaffolds").join("post.md");
    let scaffold = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)
            .with_context(|| format!("Failed to read {:?}", scaffold_path))?
    } else {
        DEFAULT_SCAFFOLD.to_string()
    };

    // Quote the title so `:` and friends stay valid YAML
    let title_yaml = serde_yaml::to_string(title)?;
    let content = scaffold
        .replace("{{ title }}", title_yaml.trim_end())
        .replace("{{ date }}", &now.format("%Y-%m-%d %H:%M:%S").to_string());

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content).with_context(|| format!("Failed to write {:?}", file_path))?;

    tracing::info!("Created: {:?}", file_path);
    Ok(file_path)
}
