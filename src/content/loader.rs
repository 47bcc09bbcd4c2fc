//! Content loader - loads documents and assets from the source directory

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{ContentStore, Document, MarkdownRenderer, Metadata};
use crate::report::{BuildReport, BuildWarning, WarningKind};
use crate::Site;

/// Everything found under the source directory
#[derive(Debug, Default)]
pub struct LoadedContent {
    pub store: ContentStore,
    /// Non-Markdown files, relative to the source directory
    pub assets: Vec<PathBuf>,
}

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    renderer: MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        let renderer = MarkdownRenderer::with_options(&site.config.highlight);
        Self { site, renderer }
    }

    /// Walk the source directory in file-name order. Broken files become
    /// warnings in `report`; they never abort the load.
    pub fn load(&self, report: &mut BuildReport) -> LoadedContent {
        let source_dir = &self.site.source_dir;
        let mut loaded = LoadedContent::default();

        if !source_dir.exists() {
            tracing::warn!("Source directory {:?} does not exist", source_dir);
            return loaded;
        }

        let walker = WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| relative_path(source_dir, p))
                        .unwrap_or_default();
                    report.warn(BuildWarning {
                        path,
                        line: None,
                        kind: WarningKind::Unreadable {
                            reason: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = relative_path(source_dir, path);

            if !is_markdown_file(path) {
                loaded.assets.push(PathBuf::from(&relative));
                continue;
            }

            let Some(document) = self.load_document(path, &relative, report) else {
                continue;
            };

            let route = document.route.clone();
            if let Some(replaced) = loaded.store.insert(document) {
                report.warn(BuildWarning {
                    path: relative,
                    line: None,
                    kind: WarningKind::DuplicateRoute {
                        route,
                        replaced: replaced.path,
                    },
                });
            }
        }

        report.documents = loaded.store.len();
        tracing::info!(
            "Loaded {} documents and {} assets",
            loaded.store.len(),
            loaded.assets.len()
        );

        loaded
    }

    /// Load a single document; `None` means it was excluded
    fn load_document(
        &self,
        path: &Path,
        relative: &str,
        report: &mut BuildReport,
    ) -> Option<Document> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                report.warn(BuildWarning {
                    path: relative.to_string(),
                    line: None,
                    kind: WarningKind::Unreadable {
                        reason: e.to_string(),
                    },
                });
                return None;
            }
        };

        let (mut meta, body) = match Metadata::parse(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                report.warn(BuildWarning {
                    path: relative.to_string(),
                    line: None,
                    kind: WarningKind::FrontMatter {
                        reason: e.to_string(),
                    },
                });
                return None;
            }
        };

        if !meta.published && !self.site.config.render_drafts {
            tracing::debug!("Skipping draft {}", relative);
            report.drafts += 1;
            return None;
        }

        if meta.categories.is_empty() {
            if let Some(default) = &self.site.config.default_category {
                meta.categories.insert(default.clone());
            }
        }

        // The body is always a suffix of the raw text
        let header_lines = raw[..raw.len() - body.len()].matches('\n').count();

        let rendered = self.renderer.render(body);
        for warning in rendered.warnings {
            report.warn(BuildWarning {
                path: relative.to_string(),
                line: Some(header_lines + warning.line),
                kind: WarningKind::Render(warning.kind),
            });
        }

        let mut document = Document::new(relative, meta, body);
        document.content = rendered.html;
        document.excerpt = self.renderer.render_excerpt(body);
        document.full_source = path.to_path_buf();

        tracing::debug!("Loaded {} -> /{}", relative, document.route);
        Some(document)
    }
}

/// Check if a file is a markdown file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// `path` relative to `base`, with `/` separators on every platform
fn relative_path(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site_in(dir: &TempDir) -> Site {
        Site::new(dir.path()).unwrap()
    }

    fn write(dir: &TempDir, rel: &str, content: &str) {
        let path = dir.path().join("source").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_documents_and_assets() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "posts/enums.md",
            "---\ntitle: Enums\ndate: 2022-03-01\ntags: [swift, enums]\n---\n# Enums\n",
        );
        write(&dir, "images/diagram.png", "not really a png");
        write(&dir, ".hidden/secret.md", "---\ntitle: S\ndate: 2022-03-01\n---\n");

        let site = site_in(&dir);
        let mut report = BuildReport::new();
        let loaded = ContentLoader::new(&site).load(&mut report);

        assert_eq!(loaded.store.len(), 1);
        let doc = loaded.store.get("posts/enums.md").unwrap();
        assert_eq!(doc.route, "posts/enums/");
        assert!(doc.content.contains("Enums</h1>"));
        assert_eq!(loaded.assets, vec![PathBuf::from("images/diagram.png")]);
        assert!(!report.has_warnings());
        assert_eq!(report.documents, 1);
    }

    #[test]
    fn test_missing_date_is_excluded_with_warning() {
        let dir = TempDir::new().unwrap();
        write(&dir, "undated.md", "---\ntitle: Undated\n---\nBody\n");

        let site = site_in(&dir);
        let mut report = BuildReport::new();
        let loaded = ContentLoader::new(&site).load(&mut report);

        assert!(loaded.store.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, "undated.md");
        assert!(matches!(
            report.warnings[0].kind,
            WarningKind::FrontMatter { .. }
        ));
    }

    #[test]
    fn test_duplicate_route_later_wins() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.markdown", "---\ntitle: Markdown\ndate: 2022-03-01\n---\n");
        write(&dir, "a.md", "---\ntitle: Md\ndate: 2022-03-01\n---\n");

        let site = site_in(&dir);
        let mut report = BuildReport::new();
        let loaded = ContentLoader::new(&site).load(&mut report);

        // "a.markdown" sorts before "a.md", so "a.md" is the later file
        assert_eq!(loaded.store.len(), 1);
        assert_eq!(loaded.store.by_route("a/").unwrap().title, "Md");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            report.warnings[0].kind,
            WarningKind::DuplicateRoute {
                route: "a/".to_string(),
                replaced: "a.markdown".to_string(),
            }
        );
    }

    #[test]
    fn test_render_warning_lines_are_file_relative() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "broken.md",
            "---\ntitle: Broken\ndate: 2022-03-01\n---\n\nIntro\n\n```swift\nlet x = 1\n",
        );

        let site = site_in(&dir);
        let mut report = BuildReport::new();
        let loaded = ContentLoader::new(&site).load(&mut report);

        assert_eq!(loaded.store.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line, Some(8));
    }

    #[test]
    fn test_drafts_skipped_unless_enabled() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "draft.md",
            "---\ntitle: Draft\ndate: 2022-03-01\npublished: false\n---\n",
        );

        let mut site = site_in(&dir);
        let mut report = BuildReport::new();
        assert!(ContentLoader::new(&site).load(&mut report).store.is_empty());
        assert_eq!(report.drafts, 1);

        site.config.render_drafts = true;
        let mut report = BuildReport::new();
        assert_eq!(ContentLoader::new(&site).load(&mut report).store.len(), 1);
    }

    #[test]
    fn test_default_category() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.md", "---\ntitle: A\ndate: 2022-03-01\n---\n");

        let mut site = site_in(&dir);
        site.config.default_category = Some("Uncategorized".to_string());
        let mut report = BuildReport::new();
        let loaded = ContentLoader::new(&site).load(&mut report);
        assert!(loaded
            .store
            .get("a.md")
            .unwrap()
            .categories
            .contains("Uncategorized"));
    }
}
