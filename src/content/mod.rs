//! Content module - documents, front-matter, rendering and loading

mod document;
mod frontmatter;
pub mod loader;
mod markdown;
mod store;

pub use document::{route_for, Document};
pub use frontmatter::{parse_date_string, FrontMatter, FrontMatterError, Metadata};
pub use markdown::{MarkdownRenderer, RenderWarning, RenderWarningKind, Rendered};
pub use store::ContentStore;
