//! The render tree produced by [`crate::builder::MarkdownBuilder`].
use std::fmt;
use std::rc::Rc;

use ratatui::style::Style;
use ratatui::text::Span;
use ratatui_mdtree_core::style::TextStyle;

use crate::style::Padding;
use crate::style::TextAlign;
use crate::table::Table;
use crate::table::TablePresentation;

/// Index of a link handler in the [`MarkdownTree`] that produced a span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub style: TextStyle,
    pub link: Option<LinkId>,
    pub semantics_label: Option<String>,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            link: None,
            semantics_label: None,
        }
    }

    pub fn with_link(mut self, link: Option<LinkId>) -> Self {
        self.link = link;
        self
    }

    fn can_merge_with(&self, other: &TextSpan) -> bool {
        self.style == other.style
            && self.link == other.link
            && self.semantics_label == other.semantics_label
    }
}

/// A finished inline child: a text span, or a block embedded in the text flow.
#[derive(Clone, Debug, PartialEq)]
pub enum InlineNode {
    Span(TextSpan),
    /// A run of spans laid out as one paragraph fragment.
    Rich { spans: Vec<TextSpan>, align: TextAlign },
    Block(RenderNode),
}

/// Inline content wrapped and aligned as one paragraph.
#[derive(Clone, Debug, PartialEq)]
pub struct Wrap {
    pub align: TextAlign,
    pub children: Vec<InlineNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ListItem {
    pub marker: Box<RenderNode>,
    /// Width of the marker column, excluding `marker_padding`.
    pub indent: u16,
    pub marker_padding: Padding,
    pub body: Box<RenderNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Blockquote {
    pub bar: String,
    pub style: Style,
    pub child: Box<RenderNode>,
}

/// A formatted, horizontally scrollable code block.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub lines: Vec<Vec<Span<'static>>>,
    pub padding: Padding,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub uri: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub style: Style,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderNode {
    Empty,
    Spacer(u16),
    Column(Vec<RenderNode>),
    Wrap(Wrap),
    Padded {
        padding: Padding,
        child: Box<RenderNode>,
    },
    ListItem(ListItem),
    Blockquote(Blockquote),
    Code(CodeBlock),
    Rule(Style),
    Table(Table),
    Image(Image),
    /// A child that activates a link when tapped.
    Tappable {
        link: LinkId,
        child: Box<RenderNode>,
    },
}

/// Merges adjacent text into paragraph fragments aligned with `align`.
///
/// Consecutive spans (and the spans of already merged fragments) are grouped into one
/// [`InlineNode::Rich`]; inside a group, neighbors with the same style, link and label are
/// concatenated. Embedded blocks split groups and pass through unchanged.
pub fn merge_inline_children(children: Vec<InlineNode>, align: TextAlign) -> Vec<InlineNode> {
    let mut out = Vec::with_capacity(children.len());
    let mut run: Vec<TextSpan> = Vec::new();

    fn push_merged(run: &mut Vec<TextSpan>, span: TextSpan) {
        match run.last_mut() {
            Some(last) if last.can_merge_with(&span) => last.text.push_str(&span.text),
            _ => run.push(span),
        }
    }

    for child in children {
        match child {
            InlineNode::Span(span) => push_merged(&mut run, span),
            InlineNode::Rich { spans, .. } => {
                for span in spans {
                    push_merged(&mut run, span);
                }
            }
            InlineNode::Block(node) => {
                if !run.is_empty() {
                    out.push(InlineNode::Rich {
                        spans: std::mem::take(&mut run),
                        align,
                    });
                }
                out.push(InlineNode::Block(node));
            }
        }
    }
    if !run.is_empty() {
        out.push(InlineNode::Rich { spans: run, align });
    }
    out
}

/// What a link span points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkTarget {
    pub text: String,
    pub href: Option<String>,
    pub title: Option<String>,
}

pub type LinkTapFn = Rc<dyn Fn(&LinkTarget)>;

/// A tap recognizer for one link, owned by the tree that produced it.
pub struct LinkHandler {
    target: LinkTarget,
    on_tap: Option<LinkTapFn>,
}

impl LinkHandler {
    pub(crate) fn new(target: LinkTarget, on_tap: Option<LinkTapFn>) -> Self {
        Self { target, on_tap }
    }

    pub fn target(&self) -> &LinkTarget {
        &self.target
    }
}

/// The output of one build: render nodes plus the link handlers their spans refer to.
///
/// Handlers live exactly as long as the tree.
pub struct MarkdownTree {
    nodes: Vec<RenderNode>,
    links: Vec<LinkHandler>,
}

impl MarkdownTree {
    pub(crate) fn new(nodes: Vec<RenderNode>, links: Vec<LinkHandler>) -> Self {
        Self { nodes, links }
    }

    pub fn nodes(&self) -> &[RenderNode] {
        &self.nodes
    }

    pub fn link(&self, id: LinkId) -> Option<&LinkTarget> {
        self.links.get(id.0).map(LinkHandler::target)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Invokes the tap callback for `id`. Returns `false` when no callback is attached.
    pub fn tap(&self, id: LinkId) -> bool {
        let Some(handler) = self.links.get(id.0) else {
            return false;
        };
        match &handler.on_tap {
            Some(on_tap) => {
                on_tap(&handler.target);
                true
            }
            None => false,
        }
    }

    /// All tables in document order.
    pub fn tables(&self) -> Vec<&Table> {
        let mut out = Vec::new();
        collect_tables(&self.nodes, &mut out);
        out
    }

    pub(crate) fn tables_mut(&mut self) -> Vec<&mut Table> {
        let mut out = Vec::new();
        collect_tables_mut(&mut self.nodes, &mut out);
        out
    }

    pub(crate) fn has_zoomable_tables(&self) -> bool {
        self.tables()
            .iter()
            .any(|t| matches!(t.presentation, TablePresentation::Zoomable(_)))
    }
}

impl PartialEq for MarkdownTree {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.links.len() == other.links.len()
            && self
                .links
                .iter()
                .zip(&other.links)
                .all(|(a, b)| a.target == b.target)
    }
}

impl fmt::Debug for MarkdownTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkdownTree")
            .field("nodes", &self.nodes)
            .field(
                "links",
                &self.links.iter().map(|l| &l.target).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn collect_tables<'a>(nodes: &'a [RenderNode], out: &mut Vec<&'a Table>) {
    for node in nodes {
        collect_tables_in(node, out);
    }
}

fn collect_tables_in<'a>(node: &'a RenderNode, out: &mut Vec<&'a Table>) {
    match node {
        RenderNode::Table(table) => out.push(table),
        RenderNode::Column(children) => collect_tables(children, out),
        RenderNode::Wrap(wrap) => {
            for child in &wrap.children {
                if let InlineNode::Block(node) = child {
                    collect_tables_in(node, out);
                }
            }
        }
        RenderNode::Padded { child, .. } | RenderNode::Tappable { child, .. } => {
            collect_tables_in(child, out)
        }
        RenderNode::ListItem(item) => collect_tables_in(&item.body, out),
        RenderNode::Blockquote(quote) => collect_tables_in(&quote.child, out),
        _ => {}
    }
}

fn collect_tables_mut<'a>(nodes: &'a mut [RenderNode], out: &mut Vec<&'a mut Table>) {
    for node in nodes {
        collect_tables_in_mut(node, out);
    }
}

fn collect_tables_in_mut<'a>(node: &'a mut RenderNode, out: &mut Vec<&'a mut Table>) {
    match node {
        RenderNode::Table(table) => out.push(table),
        RenderNode::Column(children) => collect_tables_mut(children, out),
        RenderNode::Wrap(wrap) => {
            for child in &mut wrap.children {
                if let InlineNode::Block(node) = child {
                    collect_tables_in_mut(node, out);
                }
            }
        }
        RenderNode::Padded { child, .. } | RenderNode::Tappable { child, .. } => {
            collect_tables_in_mut(child, out)
        }
        RenderNode::ListItem(item) => collect_tables_in_mut(&mut item.body, out),
        RenderNode::Blockquote(quote) => collect_tables_in_mut(&mut quote.child, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Modifier;

    fn span(text: &str) -> InlineNode {
        InlineNode::Span(TextSpan::new(text, TextStyle::default()))
    }

    #[test]
    fn merges_spans_with_identical_styling() {
        let merged = merge_inline_children(vec![span("foo"), span("bar")], TextAlign::Left);
        assert_eq!(
            merged,
            vec![InlineNode::Rich {
                spans: vec![TextSpan::new("foobar", TextStyle::default())],
                align: TextAlign::Left,
            }]
        );
    }

    #[test]
    fn keeps_linked_and_differently_styled_spans_apart() {
        let bold = TextStyle::new(Style::default().add_modifier(Modifier::BOLD));
        let linked = InlineNode::Span(
            TextSpan::new("bar", TextStyle::default()).with_link(Some(LinkId(0))),
        );
        let merged = merge_inline_children(
            vec![
                span("foo"),
                linked,
                InlineNode::Span(TextSpan::new("baz", bold)),
            ],
            TextAlign::Center,
        );
        let [InlineNode::Rich { spans, align }] = merged.as_slice() else {
            panic!("expected one fragment, got {merged:?}");
        };
        assert_eq!(*align, TextAlign::Center);
        assert_eq!(spans.len(), 3);
    }

    #[test]
    fn blocks_split_fragments_and_fragments_are_flattened() {
        let first = merge_inline_children(vec![span("a")], TextAlign::Left);
        let mut children = first;
        children.push(span("b"));
        children.push(InlineNode::Block(RenderNode::Empty));
        children.push(span("c"));
        let merged = merge_inline_children(children, TextAlign::Right);
        assert_eq!(merged.len(), 3);
        assert_eq!(
            merged[0],
            InlineNode::Rich {
                spans: vec![TextSpan::new("ab", TextStyle::default())],
                align: TextAlign::Right,
            }
        );
        assert_eq!(merged[1], InlineNode::Block(RenderNode::Empty));
    }

    #[test]
    fn tree_owns_its_link_callbacks() {
        let on_tap: LinkTapFn = Rc::new(|_target: &LinkTarget| {});
        let target = LinkTarget {
            text: "home".into(),
            href: Some("https://example.com".into()),
            title: None,
        };
        let tree = MarkdownTree::new(
            vec![RenderNode::Empty],
            vec![LinkHandler::new(target.clone(), Some(on_tap.clone()))],
        );
        assert_eq!(Rc::strong_count(&on_tap), 2);
        assert_eq!(tree.link(LinkId(0)), Some(&target));
        assert!(tree.tap(LinkId(0)));
        assert!(!tree.tap(LinkId(1)));
        drop(tree);
        assert_eq!(Rc::strong_count(&on_tap), 1);
    }
}
