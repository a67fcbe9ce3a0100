//! Markdown to render-tree builder for `ratatui`, with sticky and zoomable tables.
//!
//! The pipeline runs in four steps:
//!
//! - [`html::normalize_html_lists`]: rewrite raw HTML lists into text lines.
//! - [`ast::MarkdownParser`]: parse GitHub-flavored Markdown (plus `<br>`, `<sub>`, `<sup>` and
//!   `<u>` tags) into a small element tree.
//! - [`builder::MarkdownBuilder`]: fold that tree into a [`tree::MarkdownTree`] styled by a
//!   [`style::StyleSheet`].
//! - [`layout`]: lay the render tree out into owned `ratatui` lines for a width.
//!
//! [`document::MarkdownDocument`] runs all of them and owns the result. Wide tables can be
//! shown shrunk inline ([`table::ZoomableTable`]) and expanded into a full-screen
//! [`interactive::InteractiveTableView`], whose header row stays pinned through
//! [`sticky::StickyTableRenderer`].
pub mod ast;
pub mod builder;
pub mod document;
pub mod html;
pub mod interactive;
pub mod layout;
pub mod sticky;
pub mod style;
pub mod syntax;
pub mod table;
pub mod tree;

pub use document::MarkdownDocument;
pub use document::MarkdownOptions;
