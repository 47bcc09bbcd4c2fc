//! Build the site: load, index, generate

use anyhow::Result;
use std::time::Instant;

use crate::commands::clean;
use crate::content::loader::ContentLoader;
use crate::generator::Generator;
use crate::index::SiteIndex;
use crate::report::BuildReport;
use crate::Site;

/// Run a full rebuild into a fresh public directory
pub fn run(site: &Site) -> Result<BuildReport> {
    let start = Instant::now();
    let mut report = BuildReport::new();

    // Full rebuild: output of removed documents must not linger
    clean::run(site)?;

    let loaded = ContentLoader::new(site).load(&mut report);
    let index = SiteIndex::build(loaded.store.iter());

    tracing::info!(
        "Indexed {} documents, {} tags, {} categories",
        index.feed.len(),
        index.tags.len(),
        index.categories.len()
    );

    let generator = Generator::new(site)?;
    generator.generate(&index, &loaded.assets, &mut report)?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_removes_stale_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source");
        fs::create_dir_all(&source).unwrap();
        fs::write(
            source.join("a.md"),
            "---\ntitle: A\ndate: 2022-03-01\n---\nBody\n",
        )
        .unwrap();
        fs::write(
            source.join("b.md"),
            "---\ntitle: B\ndate: 2022-03-02\n---\nBody\n",
        )
        .unwrap();

        let site = Site::new(dir.path()).unwrap();
        let report = run(&site).unwrap();
        assert_eq!(report.documents, 2);
        assert!(site.public_dir.join("b/index.html").exists());

        fs::remove_file(source.join("b.md")).unwrap();
        let report = run(&site).unwrap();
        assert_eq!(report.documents, 1);
        assert!(!site.public_dir.join("b/index.html").exists());
    }
}
