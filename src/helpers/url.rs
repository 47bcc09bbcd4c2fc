//! URL helper functions

use crate::config::SiteConfig;

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/tags/swift/") // -> "/blog/tags/swift/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/about/") // -> "https://example.com/blog/about/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig {
            url: "https://example.com/".to_string(),
            root: "/blog/".to_string(),
            ..SiteConfig::default()
        }
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/tags/swift/"), "/blog/tags/swift/");
        assert_eq!(url_for(&config, "about/"), "/blog/about/");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/about/"),
            "https://example.com/blog/about/"
        );
    }

    #[test]
    fn test_default_root() {
        let config = SiteConfig::default();
        assert_eq!(url_for(&config, "posts/enums/"), "/posts/enums/");
    }
}
