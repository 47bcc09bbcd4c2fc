//! Index builder - derives the feed, tag, category and archive indexes
//!
//! Indexes borrow from the document set and hold no state of their own, so a
//! rebuild from the same documents always yields the same indexes.

use anyhow::Result;
use chrono::Datelike;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::content::Document;

/// Newest first; documents sharing a date are ordered by path
pub fn feed_order(a: &Document, b: &Document) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path))
}

/// All derived collections for one build
#[derive(Debug, Clone, Default)]
pub struct SiteIndex<'a> {
    /// Every document, date descending
    pub feed: Vec<&'a Document>,
    /// Tag label to documents, each list in feed order
    pub tags: BTreeMap<String, Vec<&'a Document>>,
    /// Category label to documents, each list in feed order
    pub categories: BTreeMap<String, Vec<&'a Document>>,
    /// Calendar year to documents, each list in feed order
    pub archives: BTreeMap<i32, Vec<&'a Document>>,
}

impl<'a> SiteIndex<'a> {
    /// Build every index from the full document set
    pub fn build<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut feed: Vec<&'a Document> = documents.into_iter().collect();
        feed.sort_by(|a, b| feed_order(a, b));

        let mut index = SiteIndex {
            feed: Vec::with_capacity(feed.len()),
            ..Default::default()
        };

        // Walking the sorted feed keeps every derived list in feed order
        for &doc in &feed {
            for tag in &doc.tags {
                index.tags.entry(tag.clone()).or_default().push(doc);
            }
            for category in &doc.categories {
                index.categories.entry(category.clone()).or_default().push(doc);
            }
            index.archives.entry(doc.date.year()).or_default().push(doc);
        }

        index.feed = feed;
        index
    }

    /// Years newest first
    pub fn archive_years(&self) -> impl Iterator<Item = (i32, &[&'a Document])> + '_ {
        self.archives
            .iter()
            .rev()
            .map(|(year, docs)| (*year, docs.as_slice()))
    }

    /// Previous (older) and next (newer) neighbours of the feed entry at `pos`
    pub fn neighbours(&self, pos: usize) -> (Option<&'a Document>, Option<&'a Document>) {
        if pos >= self.feed.len() {
            return (None, None);
        }
        let prev = self.feed.get(pos + 1).copied();
        let next = pos.checked_sub(1).and_then(|i| self.feed.get(i).copied());
        (prev, next)
    }

    /// Serializable snapshot of every index, by document path
    pub fn manifest(&self) -> Manifest<'_> {
        Manifest {
            feed: self
                .feed
                .iter()
                .map(|d| FeedEntry {
                    path: &d.path,
                    route: &d.route,
                    title: &d.title,
                    date: d.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                })
                .collect(),
            tags: self
                .tags
                .iter()
                .map(|(label, docs)| (label.as_str(), paths_of(docs)))
                .collect(),
            categories: self
                .categories
                .iter()
                .map(|(label, docs)| (label.as_str(), paths_of(docs)))
                .collect(),
            archives: self
                .archive_years()
                .map(|(year, docs)| ArchiveEntry {
                    year,
                    documents: paths_of(docs),
                })
                .collect(),
        }
    }

    /// The manifest as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.manifest())?)
    }
}

fn paths_of<'b>(docs: &[&'b Document]) -> Vec<&'b str> {
    docs.iter().map(|d| d.path.as_str()).collect()
}

#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub feed: Vec<FeedEntry<'a>>,
    pub tags: BTreeMap<&'a str, Vec<&'a str>>,
    pub categories: BTreeMap<&'a str, Vec<&'a str>>,
    pub archives: Vec<ArchiveEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FeedEntry<'a> {
    pub path: &'a str,
    pub route: &'a str,
    pub title: &'a str,
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct ArchiveEntry<'a> {
    pub year: i32,
    pub documents: Vec<&'a str>,
}

/// Split a listing into pages of `per_page` items; `0` means one page.
/// An empty listing still yields a single empty page.
pub fn paginate<T>(items: &[T], per_page: usize) -> Vec<&[T]> {
    if items.is_empty() || per_page == 0 {
        return vec![items];
    }
    items.chunks(per_page).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Metadata;

    fn doc(path: &str, date: &str, tags: &[&str], categories: &[&str]) -> Document {
        let raw = format!(
            "---\ntitle: {}\ndate: {}\ntags: [{}]\ncategories: [{}]\n---\nBody\n",
            path,
            date,
            tags.join(", "),
            categories.join(", ")
        );
        let (meta, body) = Metadata::parse(&raw).unwrap();
        Document::new(path, meta, body)
    }

    fn paths(docs: &[&Document]) -> Vec<String> {
        docs.iter().map(|d| d.path.clone()).collect()
    }

    #[test]
    fn test_tagged_document_in_exactly_its_tags() {
        let docs = vec![
            doc("enums.md", "2022-03-01", &["swift", "enums"], &["Swift"]),
            doc("closures.md", "2022-04-01", &["swift", "closures"], &["Swift"]),
        ];
        let index = SiteIndex::build(&docs);

        let holding: Vec<&str> = index
            .tags
            .iter()
            .filter(|(_, docs)| docs.iter().any(|d| d.path == "enums.md"))
            .map(|(label, _)| label.as_str())
            .collect();
        assert_eq!(holding, vec!["enums", "swift"]);
        assert_eq!(paths(&index.tags["swift"]), vec!["closures.md", "enums.md"]);
    }

    #[test]
    fn test_every_label_is_a_key() {
        let docs = vec![
            doc("a.md", "2021-01-01", &["x"], &["One", "Two"]),
            doc("b.md", "2022-01-01", &["y", "z"], &[]),
        ];
        let index = SiteIndex::build(&docs);
        for d in &docs {
            for tag in &d.tags {
                assert!(index.tags[tag].iter().any(|x| x.path == d.path));
            }
            for category in &d.categories {
                assert!(index.categories[category].iter().any(|x| x.path == d.path));
            }
        }
        assert_eq!(index.categories.len(), 2);
    }

    #[test]
    fn test_feed_order_and_tie_break() {
        let docs = vec![
            doc("b.md", "2022-03-01", &[], &[]),
            doc("old.md", "2020-01-01", &[], &[]),
            doc("a.md", "2022-03-01", &[], &[]),
            doc("new.md", "2023-06-30", &[], &[]),
        ];
        let index = SiteIndex::build(&docs);
        assert_eq!(
            paths(&index.feed),
            vec!["new.md", "a.md", "b.md", "old.md"]
        );
        for pair in index.feed.windows(2) {
            assert!(pair[0].date >= pair[1].date);
        }

        // Input order does not matter
        let reversed: Vec<Document> = docs.iter().rev().cloned().collect();
        let again = SiteIndex::build(&reversed);
        assert_eq!(paths(&again.feed), paths(&index.feed));
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let docs = vec![
            doc("a.md", "2022-03-01", &["swift"], &["Notes"]),
            doc("b.md", "2022-03-01", &["swift"], &["Notes"]),
            doc("c.md", "2021-11-20", &["swiftdata"], &[]),
        ];
        let first = SiteIndex::build(&docs).to_json().unwrap();
        let second = SiteIndex::build(&docs).to_json().unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"swiftdata\""));
    }

    #[test]
    fn test_archives_and_neighbours() {
        let docs = vec![
            doc("a.md", "2021-05-01", &[], &[]),
            doc("b.md", "2022-03-01", &[], &[]),
            doc("c.md", "2022-07-01", &[], &[]),
        ];
        let index = SiteIndex::build(&docs);

        let years: Vec<i32> = index.archive_years().map(|(y, _)| y).collect();
        assert_eq!(years, vec![2022, 2021]);
        assert_eq!(paths(&index.archives[&2022]), vec!["c.md", "b.md"]);

        // Feed is c, b, a
        let (prev, next) = index.neighbours(1);
        assert_eq!(prev.map(|d| d.path.as_str()), Some("a.md"));
        assert_eq!(next.map(|d| d.path.as_str()), Some("c.md"));

        let (prev, next) = index.neighbours(0);
        assert_eq!(prev.map(|d| d.path.as_str()), Some("b.md"));
        assert!(next.is_none());
        assert!(matches!(index.neighbours(3), (None, None)));
    }

    #[test]
    fn test_paginate() {
        let items = [1, 2, 3, 4, 5];
        let pages = paginate(&items, 2);
        assert_eq!(pages, vec![&[1, 2][..], &[3, 4][..], &[5][..]]);
        assert_eq!(paginate(&items, 0).len(), 1);
        assert_eq!(paginate::<i32>(&[], 10), vec![&[][..] as &[i32]]);
    }
}
