//! Code block highlighting backends for `ratatui-mdtree`.
//!
//! Backends implement [`ratatui_mdtree_core::text::CodeHighlighter`] and are handed to the
//! render-tree builder, which calls them for every fenced or indented code block:
//! - `syntect` (feature: `syntect`)
#[cfg(feature = "syntect")]
pub mod syntect;
