//! Build warnings and the per-build summary

use serde::Serialize;
use std::fmt;

use crate::content::RenderWarningKind;

/// A non-fatal problem attached to one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildWarning {
    /// Source path relative to the source directory
    pub path: String,
    /// 1-based line in the source file, when known
    pub line: Option<usize>,
    pub kind: WarningKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WarningKind {
    /// The file could not be read
    Unreadable { reason: String },
    /// Required metadata missing or malformed; the document was excluded
    FrontMatter { reason: String },
    /// Another source file already produced this route; it was replaced
    DuplicateRoute { route: String, replaced: String },
    /// The document's page replaced a generated listing on the same route
    ListingCollision { route: String, listing: String },
    /// Broken markup inside the body
    Render(RenderWarningKind),
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: ", self.path, line)?,
            None => write!(f, "{}: ", self.path)?,
        }

        match &self.kind {
            WarningKind::Unreadable { reason } => write!(f, "unreadable: {}", reason),
            WarningKind::FrontMatter { reason } => {
                write!(f, "excluded, invalid front-matter: {}", reason)
            }
            WarningKind::DuplicateRoute { route, replaced } => write!(
                f,
                "duplicate route /{} replaces {}",
                route.trim_start_matches('/'),
                replaced
            ),
            WarningKind::ListingCollision { route, listing } => write!(
                f,
                "page at /{} replaces {}",
                route.trim_start_matches('/'),
                listing
            ),
            WarningKind::Render(RenderWarningKind::UnterminatedFence { fence }) => {
                write!(f, "code fence `{}` is never closed", fence)
            }
            WarningKind::Render(RenderWarningKind::UndefinedReference { label }) => {
                write!(f, "link reference [{}] is not defined", label)
            }
            WarningKind::Render(RenderWarningKind::EmptyLinkTarget) => {
                write!(f, "link has an empty destination")
            }
        }
    }
}

/// Outcome of one full build
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Documents that made it into the indexes
    pub documents: usize,
    /// Unpublished documents skipped
    pub drafts: usize,
    /// Generated files written under the public directory
    pub files_written: usize,
    /// Static assets copied verbatim
    pub assets_copied: usize,
    pub warnings: Vec<BuildWarning>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it
    pub fn warn(&mut self, warning: BuildWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings concerning one source path
    pub fn warnings_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a BuildWarning> {
        self.warnings.iter().filter(move |w| w.path == path)
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "{} documents, {} drafts skipped, {} files written, {} assets copied, {} warnings",
            self.documents,
            self.drafts,
            self.files_written,
            self.assets_copied,
            self.warnings.len()
        )
    }
}
