//! Folds a Markdown syntax tree into a [`MarkdownTree`].
//!
//! The builder is a [`NodeVisitor`] keeping two stacks. Block frames collect finished block
//! children; inline frames collect text spans and embedded blocks, carrying the style inherited
//! from their ancestors. Whenever a block boundary is crossed, pending inline content is flushed
//! into an anonymous wrapped paragraph of the enclosing block.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::LazyLock;

use ratatui::style::Style;
use ratatui_mdtree_core::style::FontFeature;
use ratatui_mdtree_core::style::TextStyle;
use ratatui_mdtree_core::text::CodeHighlighter;
use ratatui_mdtree_core::text::NoHighlight;
use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::ast::Element;
use crate::ast::Node;
use crate::ast::NodeVisitor;
use crate::style::Padding;
use crate::style::StyleSheet;
use crate::style::TableVerticalAlign;
use crate::style::TextAlign;
use crate::table;
use crate::table::TableAccumulator;
use crate::table::TableCell;
use crate::tree::Blockquote;
use crate::tree::CodeBlock;
use crate::tree::Image;
use crate::tree::InlineNode;
use crate::tree::LinkHandler;
use crate::tree::LinkId;
use crate::tree::LinkTapFn;
use crate::tree::LinkTarget;
use crate::tree::ListItem;
use crate::tree::MarkdownTree;
use crate::tree::RenderNode;
use crate::tree::TextSpan;
use crate::tree::Wrap;
use crate::tree::merge_inline_children;

const BLOCK_TAGS: &[&str] = &[
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "blockquote",
    "pre",
    "ol",
    "ul",
    "hr",
    "table",
    "thead",
    "tbody",
    "tr",
    "section",
];

fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

fn is_list_tag(tag: &str) -> bool {
    tag == "ul" || tag == "ol"
}

static SOFT_LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ?\n *").expect("hardcoded soft break regex is valid"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("baseline table alignment requires `table_text_baseline` in the style sheet")]
    MissingTextBaseline,
}

#[derive(Clone, Debug, Default)]
pub struct BuilderOptions {
    /// Keep single newlines inside paragraphs instead of folding them into spaces.
    pub soft_line_break: bool,
    /// Base for relative link and image destinations.
    pub base_url: Option<String>,
    /// Directory relative image paths are resolved against when there is no base URL.
    pub image_directory: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// What a custom bullet builder is asked to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BulletParams {
    /// Zero-based position of the item in its list, offset by the list's `start`.
    pub index: usize,
    pub kind: ListKind,
    /// Zero for top-level lists.
    pub nesting_level: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageRequest {
    pub uri: String,
    pub title: Option<String>,
    pub alt: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// Custom rendering for one tag.
///
/// Every hook has a no-op default, so a builder only overrides what it needs.
pub trait ElementBuilder {
    /// Whether the tag's output replaces the whole block (`true`) or sits in the inline flow.
    fn is_block_element(&self) -> bool {
        false
    }

    fn visit_element_before(&mut self, _element: &Element) {}

    /// Replacement for text directly inside the block this builder is registered for.
    fn visit_text(&mut self, _text: &str, _style: Option<&TextStyle>) -> Option<InlineNode> {
        None
    }

    fn visit_element_after(
        &mut self,
        _element: &Element,
        _preferred_style: Option<&TextStyle>,
        _parent_style: Option<&TextStyle>,
    ) -> Option<RenderNode> {
        None
    }
}

/// Supplies the padding of a tag's content.
pub trait PaddingBuilder {
    fn visit_element_before(&mut self, _element: &Element) {}
    fn padding(&self) -> Padding;
}

pub type ImageBuilderFn = Box<dyn Fn(&ImageRequest) -> RenderNode>;
pub type CheckboxBuilderFn = Box<dyn Fn(bool) -> RenderNode>;
pub type BulletBuilderFn = Box<dyn Fn(&BulletParams) -> RenderNode>;

#[derive(Debug)]
struct BlockFrame {
    tag: Option<String>,
    children: Vec<RenderNode>,
    next_list_index: usize,
}

impl BlockFrame {
    fn new(tag: Option<String>) -> Self {
        Self {
            tag,
            children: Vec::new(),
            next_list_index: 0,
        }
    }
}

#[derive(Debug)]
struct InlineFrame {
    tag: Option<String>,
    style: TextStyle,
    children: Vec<InlineNode>,
}

pub struct MarkdownBuilder {
    style_sheet: StyleSheet,
    options: BuilderOptions,
    builders: HashMap<String, Box<dyn ElementBuilder>>,
    padding_builders: HashMap<String, Box<dyn PaddingBuilder>>,
    image_builder: Option<ImageBuilderFn>,
    checkbox_builder: Option<CheckboxBuilderFn>,
    bullet_builder: Option<BulletBuilderFn>,
    highlighter: Option<Arc<dyn CodeHighlighter + Send + Sync>>,
    on_tap_link: Option<LinkTapFn>,

    blocks: Vec<BlockFrame>,
    inlines: Vec<InlineFrame>,
    tables: Vec<TableAccumulator>,
    list_indents: Vec<ListKind>,
    link_handlers: Vec<LinkId>,
    links: Vec<LinkHandler>,
    blockquote_depth: usize,
    code_language: Option<String>,
    last_visited_tag: Option<String>,
}

impl MarkdownBuilder {
    pub fn new(style_sheet: StyleSheet, options: BuilderOptions) -> Result<Self, BuildError> {
        if style_sheet.table_vertical_alignment == TableVerticalAlign::Baseline
            && style_sheet.table_text_baseline.is_none()
        {
            return Err(BuildError::MissingTextBaseline);
        }
        Ok(Self {
            style_sheet,
            options,
            builders: HashMap::new(),
            padding_builders: HashMap::new(),
            image_builder: None,
            checkbox_builder: None,
            bullet_builder: None,
            highlighter: None,
            on_tap_link: None,
            blocks: Vec::new(),
            inlines: Vec::new(),
            tables: Vec::new(),
            list_indents: Vec::new(),
            link_handlers: Vec::new(),
            links: Vec::new(),
            blockquote_depth: 0,
            code_language: None,
            last_visited_tag: None,
        })
    }

    pub fn style_sheet(&self) -> &StyleSheet {
        &self.style_sheet
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    pub fn with_element_builder(
        mut self,
        tag: impl Into<String>,
        builder: Box<dyn ElementBuilder>,
    ) -> Self {
        self.builders.insert(tag.into(), builder);
        self
    }

    pub fn with_padding_builder(
        mut self,
        tag: impl Into<String>,
        builder: Box<dyn PaddingBuilder>,
    ) -> Self {
        self.padding_builders.insert(tag.into(), builder);
        self
    }

    pub fn with_image_builder(mut self, builder: ImageBuilderFn) -> Self {
        self.image_builder = Some(builder);
        self
    }

    pub fn with_checkbox_builder(mut self, builder: CheckboxBuilderFn) -> Self {
        self.checkbox_builder = Some(builder);
        self
    }

    pub fn with_bullet_builder(mut self, builder: BulletBuilderFn) -> Self {
        self.bullet_builder = Some(builder);
        self
    }

    pub fn with_link_tap(mut self, on_tap: LinkTapFn) -> Self {
        self.on_tap_link = Some(on_tap);
        self
    }

    pub fn set_highlighter(&mut self, highlighter: Option<Arc<dyn CodeHighlighter + Send + Sync>>) {
        self.highlighter = highlighter;
    }

    /// Builds the render tree for `nodes`.
    ///
    /// All traversal state is reset first, so building the same nodes twice yields equal trees.
    pub fn build(&mut self, nodes: &[Node]) -> MarkdownTree {
        self.reset();
        self.blocks.push(BlockFrame::new(None));
        for node in nodes {
            node.accept(self);
        }
        self.add_anonymous_block_if_needed();

        debug_assert!(self.tables.is_empty(), "unclosed table");
        debug_assert!(self.inlines.is_empty(), "unflushed inline content");
        debug_assert!(self.link_handlers.is_empty(), "unclosed link");
        debug_assert_eq!(self.blockquote_depth, 0, "unclosed blockquote");
        debug_assert_eq!(self.blocks.len(), 1, "unclosed block");

        let root = self.blocks.pop().map(|b| b.children).unwrap_or_default();
        let links = std::mem::take(&mut self.links);
        log::trace!(
            "built {} top-level node(s), {} link(s)",
            root.len(),
            links.len()
        );
        self.reset();
        MarkdownTree::new(root, links)
    }

    fn reset(&mut self) {
        self.blocks.clear();
        self.inlines.clear();
        self.tables.clear();
        self.list_indents.clear();
        self.link_handlers.clear();
        self.links.clear();
        self.blockquote_depth = 0;
        self.code_language = None;
        self.last_visited_tag = None;
    }

    fn current_block_tag(&self) -> Option<&str> {
        self.blocks.last().and_then(|b| b.tag.as_deref())
    }

    fn block_padding(&self, tag: Option<&str>) -> Padding {
        match tag.and_then(|t| self.padding_builders.get(t)) {
            Some(builder) => builder.padding(),
            None => self.style_sheet.padding_for(tag),
        }
    }

    fn add_parent_inline_if_needed(&mut self, tag: Option<&str>) {
        if !self.inlines.is_empty() {
            return;
        }
        let style = tag
            .and_then(|t| self.style_sheet.style(t))
            .cloned()
            .unwrap_or_default();
        self.inlines.push(InlineFrame {
            tag: tag.map(str::to_string),
            style,
            children: Vec::new(),
        });
    }

    /// Flushes pending inline content into a wrapped paragraph of the current block.
    fn add_anonymous_block_if_needed(&mut self) {
        if self.inlines.is_empty() {
            return;
        }
        debug_assert_eq!(self.inlines.len(), 1, "inline frames left open");
        let children: Vec<InlineNode> = self
            .inlines
            .drain(..)
            .flat_map(|frame| frame.children)
            .collect();
        if children.is_empty() {
            return;
        }
        let tag = self.current_block_tag().map(str::to_string);
        let align = self.style_sheet.align_for(tag.as_deref());
        let padding = self.block_padding(tag.as_deref());
        let wrap = RenderNode::Wrap(Wrap {
            align,
            children: merge_inline_children(children, align),
        });
        let node = if padding.is_zero() {
            wrap
        } else {
            RenderNode::Padded {
                padding,
                child: Box::new(wrap),
            }
        };
        self.add_block_child(node);
    }

    fn add_block_child(&mut self, child: RenderNode) {
        let spacing = self.style_sheet.block_spacing;
        let Some(parent) = self.blocks.last_mut() else {
            return;
        };
        if !parent.children.is_empty() {
            parent.children.push(RenderNode::Spacer(spacing));
        }
        parent.children.push(child);
        parent.next_list_index += 1;
    }

    fn trim_text(&self, text: &str) -> String {
        let text = if self.options.soft_line_break {
            text.to_string()
        } else {
            SOFT_LINE_BREAK.replace_all(text, " ").into_owned()
        };
        match self.last_visited_tag.as_deref() {
            Some("ul" | "ol" | "li" | "p" | "br") => text.trim_start_matches(' ').to_string(),
            _ => text,
        }
    }

    fn build_code_block(&self, text: &str) -> RenderNode {
        let language = self.code_language.clone();
        let lines = match &self.highlighter {
            Some(highlighter) => highlighter.highlight_text(language.as_deref(), text),
            None => {
                let style = self
                    .style_sheet
                    .style("code")
                    .map(|s| s.style)
                    .unwrap_or_default();
                NoHighlight::new(style).highlight_text(language.as_deref(), text)
            }
        };
        RenderNode::Code(CodeBlock {
            language,
            lines,
            padding: self.style_sheet.code_block_padding,
        })
    }

    fn build_bullet(&self, kind: ListKind) -> RenderNode {
        let params = BulletParams {
            index: self.blocks.last().map_or(0, |b| b.next_list_index),
            kind,
            nesting_level: self.list_indents.len().saturating_sub(1),
        };
        if let Some(builder) = &self.bullet_builder {
            return builder(&params);
        }
        let style = self
            .style_sheet
            .style("list_bullet")
            .cloned()
            .unwrap_or_default();
        let (text, align) = match kind {
            ListKind::Unordered => ("•".to_string(), TextAlign::Center),
            ListKind::Ordered => (format!("{}.", params.index + 1), TextAlign::Right),
        };
        RenderNode::Wrap(Wrap {
            align,
            children: vec![InlineNode::Rich {
                spans: vec![TextSpan::new(text, style)],
                align,
            }],
        })
    }

    fn build_checkbox(&self, checked: bool) -> RenderNode {
        if let Some(builder) = &self.checkbox_builder {
            return builder(checked);
        }
        let style = self
            .style_sheet
            .style("checkbox")
            .cloned()
            .unwrap_or_default();
        let text = if checked { "[x]" } else { "[ ]" };
        RenderNode::Wrap(Wrap {
            align: TextAlign::Left,
            children: vec![InlineNode::Rich {
                spans: vec![TextSpan::new(text, style)],
                align: TextAlign::Left,
            }],
        })
    }

    fn build_list_item(&self, element: &Element, kind: ListKind, body: RenderNode) -> RenderNode {
        let marker = match task_marker(element) {
            Some(checked) => self.build_checkbox(checked),
            None => self.build_bullet(kind),
        };
        RenderNode::ListItem(ListItem {
            marker: Box::new(marker),
            indent: self.style_sheet.list_indent,
            marker_padding: self.style_sheet.list_bullet_padding,
            body: Box::new(body),
        })
    }

    fn build_image(&self, element: &Element) -> RenderNode {
        let src = element.attr("src").unwrap_or_default();
        let (path, width, height) = parse_image_source(src);
        let node = match self.resolve_image(path) {
            None => {
                log::warn!("skipping image with unresolvable source {src:?}");
                RenderNode::Empty
            }
            Some(uri) => {
                let request = ImageRequest {
                    uri,
                    title: element.attr("title").map(str::to_string),
                    alt: element.attr("alt").map(str::to_string),
                    width,
                    height,
                };
                match &self.image_builder {
                    Some(builder) => builder(&request),
                    None => RenderNode::Image(Image {
                        uri: request.uri,
                        alt: request.alt,
                        title: request.title,
                        width: request.width,
                        height: request.height,
                        style: self
                            .style_sheet
                            .style("img")
                            .map(|s| s.style)
                            .unwrap_or_default(),
                    }),
                }
            }
        };
        match self.link_handlers.last() {
            Some(&link) => RenderNode::Tappable {
                link,
                child: Box::new(node),
            },
            None => node,
        }
    }

    fn resolve_image(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        if is_absolute_url(path) || Url::parse(path).is_ok() {
            return Some(path.to_string());
        }
        if self.options.base_url.is_some() {
            return Some(resolve_url(self.options.base_url.as_deref(), path));
        }
        match self.options.image_directory.as_deref() {
            Some(dir) => Some(resolve_url(Some(dir), path)),
            None => Some(path.to_string()),
        }
    }

    fn push_table_cell(&mut self, element: &Element, mut children: Vec<InlineNode>) {
        let is_head = element.tag == "th";
        let align = element
            .attr("align")
            .and_then(TextAlign::from_attribute)
            .unwrap_or(if is_head {
                self.style_sheet.table_head_align
            } else {
                TextAlign::Left
            });
        let style = self
            .style_sheet
            .style(if is_head { "table_head" } else { "table_body" })
            .cloned()
            .unwrap_or_default();
        trim_inline_edges(&mut children);
        let cell = TableCell {
            align,
            style,
            children: merge_inline_children(children, align),
        };
        debug_assert_eq!(self.tables.len(), 1, "table cell outside of a table");
        match self.tables.last_mut() {
            Some(table) => table.push_cell(cell),
            None => log::warn!("dropping <{}> outside of a table", element.tag),
        }
    }

    fn superscript(&self, children: &mut [InlineNode]) {
        let Some(InlineNode::Span(span)) = children.last_mut() else {
            return;
        };
        let mut features = vec![FontFeature::enable(FontFeature::SUPERSCRIPTS)];
        if let Some(tag) = &self.style_sheet.superscript_font_feature_tag {
            features.push(FontFeature::enable(tag.clone()));
        }
        span.style.font_features = features;
    }
}

impl NodeVisitor for MarkdownBuilder {
    fn visit_element_before(&mut self, element: &Element) -> bool {
        let tag = element.tag.as_str();
        self.last_visited_tag = Some(tag.to_string());

        if let Some(builder) = self.builders.get_mut(tag) {
            builder.visit_element_before(element);
        }
        if let Some(builder) = self.padding_builders.get_mut(tag) {
            builder.visit_element_before(element);
        }

        if is_block_tag(tag) {
            self.add_anonymous_block_if_needed();
            let mut frame = BlockFrame::new(Some(tag.to_string()));
            if is_list_tag(tag) {
                self.list_indents.push(if tag == "ol" {
                    ListKind::Ordered
                } else {
                    ListKind::Unordered
                });
                let start = element
                    .attr("start")
                    .and_then(|s| s.trim().parse::<usize>().ok());
                if let Some(start) = start {
                    frame.next_list_index = start.saturating_sub(1);
                }
            } else if tag == "blockquote" {
                self.blockquote_depth += 1;
            } else if tag == "table" {
                if !self.tables.is_empty() {
                    log::warn!("nested table; inner rows join the outer table");
                }
                self.tables.push(TableAccumulator::new(element.clone()));
            } else if tag == "tr" {
                let is_header = self.current_block_tag() == Some("thead");
                let stripe = self.style_sheet.table_cells_background;
                match self.tables.last_mut() {
                    Some(table) => table.push_row(stripe, is_header),
                    None => log::warn!("<tr> outside of a table"),
                }
            }
            self.blocks.push(frame);
            return true;
        }

        if tag == "a" {
            let Some(text) = link_text(element) else {
                log::debug!("skipping link without text");
                return false;
            };
            let id = LinkId(self.links.len());
            let target = LinkTarget {
                text,
                href: element
                    .attr("href")
                    .map(|href| resolve_url(self.options.base_url.as_deref(), href)),
                title: element.attr("title").map(str::to_string),
            };
            self.links
                .push(LinkHandler::new(target, self.on_tap_link.clone()));
            self.link_handlers.push(id);
        }

        let block_tag = self.current_block_tag().map(str::to_string);
        self.add_parent_inline_if_needed(block_tag.as_deref());
        if tag == "code" && block_tag.as_deref() == Some("pre") {
            self.code_language = element
                .attr("class")
                .and_then(|c| c.strip_prefix("language-"))
                .map(str::to_string);
        }
        let parent_style = self
            .inlines
            .last()
            .map(|f| f.style.clone())
            .unwrap_or_default();
        self.inlines.push(InlineFrame {
            tag: Some(tag.to_string()),
            style: parent_style.merge(self.style_sheet.style(tag)),
            children: Vec::new(),
        });

        if tag == "td" && element.children.is_empty() {
            self.visit_text("");
        }
        true
    }

    fn visit_text(&mut self, text: &str) {
        let Some(block_tag) = self.current_block_tag().map(str::to_string) else {
            log::trace!("dropping text outside of any block");
            return;
        };
        self.add_parent_inline_if_needed(Some(&block_tag));

        let child = if let Some(builder) = self.builders.get_mut(&block_tag) {
            builder.visit_text(text, self.style_sheet.style(&block_tag))
        } else if block_tag == "pre" {
            Some(InlineNode::Block(self.build_code_block(text)))
        } else {
            let inline_style = self
                .inlines
                .last()
                .map(|f| f.style.clone())
                .unwrap_or_default();
            let style = if self.blockquote_depth > 0 {
                inline_style.merge(self.style_sheet.style("blockquote"))
            } else {
                inline_style
            };
            Some(InlineNode::Span(
                TextSpan::new(self.trim_text(text), style)
                    .with_link(self.link_handlers.last().copied()),
            ))
        };

        if let (Some(child), Some(frame)) = (child, self.inlines.last_mut()) {
            frame.children.push(child);
        }
        self.last_visited_tag = None;
    }

    fn visit_element_after(&mut self, element: &Element) {
        let tag = element.tag.as_str();

        if is_block_tag(tag) {
            self.add_anonymous_block_if_needed();
            let Some(current) = self.blocks.pop() else {
                return;
            };
            let mut child = if current.children.is_empty() {
                RenderNode::Empty
            } else {
                RenderNode::Column(current.children)
            };

            let custom = match self.builders.get_mut(tag) {
                Some(builder) if builder.is_block_element() => Some(builder.visit_element_after(
                    element,
                    self.style_sheet.style(tag),
                    None,
                )),
                _ => None,
            };
            match custom {
                Some(node) => {
                    if let Some(node) = node {
                        child = node;
                    }
                    if is_list_tag(tag) {
                        self.list_indents.pop();
                    } else if tag == "blockquote" {
                        self.blockquote_depth = self.blockquote_depth.saturating_sub(1);
                    } else if tag == "table" {
                        self.tables.pop();
                    }
                }
                None => match tag {
                    "ul" | "ol" => {
                        self.list_indents.pop();
                    }
                    "li" => {
                        if let Some(&kind) = self.list_indents.last() {
                            child = self.build_list_item(element, kind, child);
                        }
                    }
                    "table" => {
                        child = match self.tables.pop() {
                            Some(acc) => table::assemble(acc, &self.style_sheet),
                            None => RenderNode::Empty,
                        };
                    }
                    "blockquote" => {
                        self.blockquote_depth = self.blockquote_depth.saturating_sub(1);
                        child = RenderNode::Blockquote(Blockquote {
                            bar: self.style_sheet.blockquote_bar.clone(),
                            style: self
                                .style_sheet
                                .style("blockquote")
                                .map(|s| s.style)
                                .unwrap_or_default(),
                            child: Box::new(child),
                        });
                    }
                    "pre" => self.code_language = None,
                    "hr" => {
                        child = RenderNode::Rule(
                            self.style_sheet
                                .style("hr")
                                .map(|s| s.style)
                                .unwrap_or_else(Style::default),
                        );
                    }
                    _ => {}
                },
            }

            self.add_block_child(child);
            self.last_visited_tag = Some(tag.to_string());
            return;
        }

        let Some(current) = self.inlines.pop() else {
            return;
        };
        let mut children = current.children;

        let custom = match self.builders.get_mut(tag) {
            Some(builder) => {
                let parent_style = self.inlines.last().map(|f| &f.style);
                Some(builder.visit_element_after(
                    element,
                    self.style_sheet.style(tag),
                    parent_style,
                ))
            }
            None => None,
        };
        match custom {
            Some(Some(node)) => {
                let node = InlineNode::Block(node);
                match children.first_mut() {
                    Some(first) => *first = node,
                    None => children.push(node),
                }
            }
            Some(None) => {}
            None => match tag {
                "img" => children.push(InlineNode::Block(self.build_image(element))),
                "br" => children.push(InlineNode::Span(TextSpan::new(
                    "\n",
                    current.style.clone(),
                ))),
                "th" | "td" => {
                    self.push_table_cell(element, std::mem::take(&mut children));
                }
                "sup" => self.superscript(&mut children),
                _ => {}
            },
        }
        if tag == "a" {
            self.link_handlers.pop();
        }

        if let Some(builder) = self.padding_builders.get(tag) {
            let padding = builder.padding();
            if !padding.is_zero() && !children.is_empty() {
                let align = self.style_sheet.align_for(current.tag.as_deref());
                children = vec![InlineNode::Block(RenderNode::Padded {
                    padding,
                    child: Box::new(RenderNode::Wrap(Wrap {
                        align,
                        children: merge_inline_children(children, align),
                    })),
                })];
            }
        }

        if let Some(parent) = self.inlines.last_mut() {
            parent.children.extend(children);
        }
        self.last_visited_tag = Some(tag.to_string());
    }
}

/// Visible text of a link: its descendants' text, with childless elements such as images
/// contributing their `alt`. `None` for a link with nothing to show.
/// Checked state of a task item. Loose lists put the marker inside the item's paragraph.
fn task_marker(item: &Element) -> Option<bool> {
    let first = match item.children.first()? {
        Node::Element(p) if p.tag == "p" => p.children.first()?,
        node => node,
    };
    match first {
        Node::Element(input) if input.tag == "input" && input.attr("type") == Some("checkbox") => {
            Some(input.attributes.contains_key("checked"))
        }
        _ => None,
    }
}

fn link_text(element: &Element) -> Option<String> {
    if element.children.is_empty() {
        return element.attr("alt").map(str::to_string);
    }
    let mut out = String::new();
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) => out.push_str(&link_text(e).unwrap_or_default()),
        }
    }
    Some(out)
}

/// Splits `path#WxH` into the path and optional dimensions.
fn parse_image_source(src: &str) -> (&str, Option<f32>, Option<f32>) {
    let Some((path, dims)) = src.rsplit_once('#') else {
        return (src, None, None);
    };
    let Some((w, h)) = dims.split_once('x') else {
        return (src, None, None);
    };
    match (w.trim().parse::<f32>(), h.trim().parse::<f32>()) {
        (Ok(w), Ok(h)) => (path, Some(w), Some(h)),
        _ => (src, None, None),
    }
}

/// Trims leading whitespace of the first span and trailing whitespace of the last.
fn trim_inline_edges(children: &mut [InlineNode]) {
    fn first_span(node: &mut InlineNode) -> Option<&mut TextSpan> {
        match node {
            InlineNode::Span(span) => Some(span),
            InlineNode::Rich { spans, .. } => spans.first_mut(),
            InlineNode::Block(_) => None,
        }
    }
    fn last_span(node: &mut InlineNode) -> Option<&mut TextSpan> {
        match node {
            InlineNode::Span(span) => Some(span),
            InlineNode::Rich { spans, .. } => spans.last_mut(),
            InlineNode::Block(_) => None,
        }
    }
    if let Some(span) = children.first_mut().and_then(first_span) {
        span.text = span.text.trim_start().to_string();
    }
    if let Some(span) = children.last_mut().and_then(last_span) {
        span.text = span.text.trim_end().to_string();
    }
}

fn resolve_url(base_url: Option<&str>, dest: &str) -> String {
    let dest = dest.trim();
    if dest.is_empty() {
        return String::new();
    }
    if is_absolute_url(dest) {
        return dest.to_string();
    }
    let Some(base) = base_url.map(str::trim).filter(|s| !s.is_empty()) else {
        return dest.to_string();
    };

    if let Ok(base) = Url::parse(base) {
        return base
            .join(dest)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| dest.to_string());
    }

    let mut base = base
        .trim_end_matches('/')
        .trim_end_matches('\\')
        .to_string();
    let dest = dest.trim_start_matches("./").trim_start_matches('/');
    base.push('/');
    base.push_str(dest);
    base
}

fn is_absolute_url(dest: &str) -> bool {
    let d = dest.trim();
    d.starts_with('#')
        || d.starts_with("mailto:")
        || d.starts_with("http://")
        || d.starts_with("https://")
        || d.starts_with("file://")
        || d.starts_with("data:")
        || d.starts_with('/')
}
