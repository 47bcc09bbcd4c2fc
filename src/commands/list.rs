//! List site content

use anyhow::Result;
use std::collections::BTreeMap;

use crate::content::loader::ContentLoader;
use crate::content::Document;
use crate::index::SiteIndex;
use crate::report::BuildReport;
use crate::Site;

/// What `list` prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Post,
    Tag,
    Category,
}

impl std::str::FromStr for ListKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "post" | "posts" => Ok(ListKind::Post),
            "tag" | "tags" => Ok(ListKind::Tag),
            "category" | "categories" => Ok(ListKind::Category),
            _ => anyhow::bail!("Unknown type: {}. Available: post, tag, category", s),
        }
    }
}

/// List site content by type
pub fn run(site: &Site, kind: ListKind) -> Result<()> {
    let mut report = BuildReport::new();
    let loaded = ContentLoader::new(site).load(&mut report);
    let index = SiteIndex::build(loaded.store.iter());

    for line in lines(&index, kind) {
        println!("{}", line);
    }

    Ok(())
}

/// Lines printed for `kind`, header first
pub fn lines(index: &SiteIndex<'_>, kind: ListKind) -> Vec<String> {
    match kind {
        ListKind::Post => {
            let mut out = vec![format!("Posts ({}):", index.feed.len())];
            out.extend(index.feed.iter().map(|doc| {
                format!(
                    "  {} - {} [{}]",
                    doc.date.format("%Y-%m-%d"),
                    doc.title,
                    doc.path
                )
            }));
            out
        }
        ListKind::Tag => label_lines("Tags", &index.tags),
        ListKind::Category => label_lines("Categories", &index.categories),
    }
}

fn label_lines(heading: &str, labels: &BTreeMap<String, Vec<&Document>>) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = labels
        .iter()
        .map(|(label, docs)| (label.as_str(), docs.len()))
        .collect();
    // Most used first; the map already orders equal counts by name
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut out = vec![format!("{} ({}):", heading, counts.len())];
    out.extend(
        counts
            .into_iter()
            .map(|(label, count)| format!("  {} ({})", label, count)),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Metadata;

    fn doc(path: &str, date: &str, tags: &str) -> Document {
        let raw = format!("---\ntitle: {}\ndate: {}\ntags: [{}]\n---\n", path, date, tags);
        let (meta, body) = Metadata::parse(&raw).unwrap();
        Document::new(path, meta, body)
    }

    #[test]
    fn test_parse_list_kind() {
        assert_eq!("posts".parse::<ListKind>().unwrap(), ListKind::Post);
        assert_eq!("category".parse::<ListKind>().unwrap(), ListKind::Category);
        assert!("route".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_post_and_tag_lines() {
        let docs = vec![
            doc("a.md", "2022-03-01", "swift"),
            doc("b.md", "2022-03-02", "swift, enums"),
        ];
        let index = SiteIndex::build(&docs);

        assert_eq!(
            lines(&index, ListKind::Post),
            vec![
                "Posts (2):",
                "  2022-03-02 - b.md [b.md]",
                "  2022-03-01 - a.md [a.md]",
            ]
        );
        assert_eq!(
            lines(&index, ListKind::Tag),
            vec!["Tags (2):", "  swift (2)", "  enums (1)"]
        );
    }
}
