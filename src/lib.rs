//! inkpress: a static-content pipeline for Markdown sites
//!
//! Documents with front matter are loaded from the source directory,
//! indexed by tag, category and date, rendered to HTML and written out
//! together with feed, archive and label listings.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod index;
pub mod report;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

use report::BuildReport;

/// A site rooted at a base directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Open the site in `base_dir`, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        })
    }

    /// Rebuild the whole site
    pub fn build(&self) -> Result<BuildReport> {
        commands::build::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Scaffold a new document
    pub fn new_document(&self, title: &str, path: Option<&str>) -> Result<PathBuf> {
        commands::new::run(self, title, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_site_defaults_without_config() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.source_dir, dir.path().join("source"));
        assert_eq!(site.public_dir, dir.path().join("public"));
    }

    #[test]
    fn test_site_reads_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Swift Notes\nsource_dir: content\npublic_dir: out\n",
        )
        .unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.title, "Swift Notes");
        assert_eq!(site.source_dir, dir.path().join("content"));
        assert_eq!(site.public_dir, dir.path().join("out"));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "per_page: [not a number\n").unwrap();
        assert!(Site::new(dir.path()).is_err());
    }
}
