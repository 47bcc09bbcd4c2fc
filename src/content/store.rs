//! Content store: the current set of documents, keyed by route

use std::collections::BTreeMap;

use super::Document;

/// The set of parsed documents for one build
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    documents: BTreeMap<String, Document>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document. Returns the document previously holding
    /// the same route, if any.
    pub fn insert(&mut self, document: Document) -> Option<Document> {
        self.documents.insert(document.route.clone(), document)
    }

    /// Remove the document loaded from `path`
    pub fn remove(&mut self, path: &str) -> Option<Document> {
        let route = self
            .documents
            .values()
            .find(|d| d.path == path)
            .map(|d| d.route.clone())?;
        self.documents.remove(&route)
    }

    /// Look up a document by its source path
    pub fn get(&self, path: &str) -> Option<&Document> {
        self.documents.values().find(|d| d.path == path)
    }

    /// Look up a document by its route
    pub fn by_route(&self, route: &str) -> Option<&Document> {
        self.documents.get(route)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in route order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }
}

impl FromIterator<Document> for ContentStore {
    fn from_iter<I: IntoIterator<Item = Document>>(iter: I) -> Self {
        let mut store = ContentStore::new();
        for document in iter {
            store.insert(document);
        }
        store
    }
}
