//! Assemble Markdown documents from typed fragments.
//!
//! A [`Document`] collects headings, paragraphs, lists, quotes, code blocks,
//! links, images, tables and raw text in call order, then renders them into
//! one Markdown string.
//!
//! ```
//! use mdbuilder::{Config, Document, ListTree};
//!
//! let doc = Document::with_config(Config::default().with_newline("\n"))
//!     .heading("Release")
//!     .list(ListTree::new().nested("**Fixes**", "two of them", ["parser", "cli"]))
//!     .suppress(|d| d.force_break().line("tight").line("lines"));
//!
//! assert_eq!(
//!     doc.to_string(),
//!     "# Release\n\n- **Fixes** - two of them\n   - parser\n   - cli\n\ntight\nlines"
//! );
//! ```

mod config;
mod document;
mod error;
mod escape;
mod fragment;
mod render;

pub use config::Config;
pub use document::Document;
pub use error::{Error, Result};
pub use escape::Escaper;
pub use fragment::{ListContent, ListEntry, ListTree, RawContent};

/// Start an empty document using the default config.
pub fn document() -> Document {
    Document::new()
}

/// Start an empty document with the given config.
pub fn document_with(config: Config) -> Document {
    Document::with_config(config)
}
