//! Clean the public directory

use anyhow::{Context, Result};
use std::fs;

use crate::Site;

/// Delete the public directory; a missing directory is not an error
pub fn run(site: &Site) -> Result<()> {
    if site.public_dir.exists() {
        fs::remove_dir_all(&site.public_dir)
            .with_context(|| format!("Failed to delete {:?}", site.public_dir))?;
        tracing::info!("Deleted: {:?}", site.public_dir);
    } else {
        tracing::debug!("Nothing to clean at {:?}", site.public_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_public_dir() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        fs::create_dir_all(site.public_dir.join("tags")).unwrap();
        fs::write(site.public_dir.join("index.html"), "old").unwrap();

        run(&site).unwrap();
        assert!(!site.public_dir.exists());

        // Second run has nothing to do
        run(&site).unwrap();
    }
}
