//! `ratatui-mdtree-core` provides the toolkit-level primitives that the Markdown render tree and
//! the table renderers are built on.
//!
//! This crate is designed for **renderer authors**: it knows nothing about Markdown. The Markdown
//! pipeline (parsing, tree building, sticky tables) lives in `ratatui-mdtree`.
//!
//! ## Design goals
//!
//! - Event-loop agnostic: you drive input, layout and painting from your app.
//! - No async runtime: everything runs on the main thread, and work that has to wait for a
//!   finished frame is expressed through the explicit [`measure::DeferredMeasure`] protocol.
//! - Painting is column-clipped: every paint helper takes a horizontal start column and a maximum
//!   width, so overlays can repaint partial regions without touching the rest of the buffer.
//!
//! Useful entry points:
//! - [`render::render_spans_clipped`]: paint styled spans into a [`ratatui::buffer::Buffer`].
//! - [`style::TextStyle`]: a `ratatui` style plus font features, with nearest-wins merging.
//! - [`text::CodeHighlighter`]: pluggable code block formatting.
//! - [`measure::DeferredMeasure`]: request/commit measurement with tolerance gating.
pub mod style;

pub mod text;

#[cfg(feature = "crossterm")]
pub mod crossterm_input;

pub mod input;
pub mod measure;
pub mod render;
pub mod scroll;
