//! A small HTML-shaped syntax tree and the Markdown parser that produces it.
//!
//! The builder walks this tree instead of raw parser events: every block and inline construct is
//! an [`Element`] named after its HTML tag (`p`, `ul`, `li`, `em`, `a`, `table`, `th`, ...), with
//! [`Node::Text`] leaves.
use std::collections::BTreeMap;
use std::ops::Range;

use pulldown_cmark::Alignment;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;

use crate::syntax::InlineSyntax;
use crate::syntax::default_inline_syntaxes;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_text_content(&mut out);
        }
        out
    }
}

impl Node {
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text_content(&mut out);
        out
    }

    fn push_text_content(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.push_text_content(out);
                }
            }
        }
    }

    /// Walks the subtree depth-first.
    ///
    /// When [`NodeVisitor::visit_element_before`] returns `false` the element's children and its
    /// [`NodeVisitor::visit_element_after`] call are skipped.
    pub fn accept<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Node::Text(text) => visitor.visit_text(text),
            Node::Element(element) => {
                if visitor.visit_element_before(element) {
                    for child in &element.children {
                        child.accept(visitor);
                    }
                    visitor.visit_element_after(element);
                }
            }
        }
    }
}

pub trait NodeVisitor {
    fn visit_element_before(&mut self, element: &Element) -> bool;
    fn visit_text(&mut self, text: &str);
    fn visit_element_after(&mut self, element: &Element);
}

/// Parses CommonMark (plus tables, strikethrough and task lists) into [`Node`]s.
pub struct MarkdownParser {
    options: Options,
    inline_syntaxes: Vec<Box<dyn InlineSyntax>>,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownParser {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self {
            options,
            inline_syntaxes: default_inline_syntaxes(),
        }
    }

    /// Appends a syntax. Earlier syntaxes win when two match at the same offset.
    pub fn with_inline_syntax(mut self, syntax: Box<dyn InlineSyntax>) -> Self {
        self.inline_syntaxes.push(syntax);
        self
    }

    pub fn parse(&self, source: &str) -> Vec<Node> {
        let mut folder = EventFolder::new(&self.inline_syntaxes);
        for event in Parser::new_ext(source, self.options) {
            folder.event(event);
        }
        folder.finish()
    }
}

/// A run of inline text waiting to be scanned by the inline syntaxes.
#[derive(Default)]
struct InlineRun {
    text: String,
    html: Vec<Range<usize>>,
}

impl InlineRun {
    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn push_html(&mut self, html: &str) {
        let start = self.text.len();
        self.text.push_str(html);
        self.html.push(start..self.text.len());
    }

    fn starts_in_html(&self, offset: usize) -> bool {
        self.html.iter().any(|r| r.contains(&offset))
    }
}

struct EventFolder<'s> {
    syntaxes: &'s [Box<dyn InlineSyntax>],
    root: Vec<Node>,
    stack: Vec<Element>,
    /// Elements pushed per open pulldown tag, so ends pop exactly what starts pushed.
    opened: Vec<usize>,
    run: InlineRun,
    code: Option<String>,
    image_alt: Option<String>,
    table_alignments: Vec<Alignment>,
    cell_index: usize,
    in_table_head: bool,
    tbody_open: bool,
}

impl<'s> EventFolder<'s> {
    fn new(syntaxes: &'s [Box<dyn InlineSyntax>]) -> Self {
        Self {
            syntaxes,
            root: Vec::new(),
            stack: Vec::new(),
            opened: Vec::new(),
            run: InlineRun::default(),
            code: None,
            image_alt: None,
            table_alignments: Vec::new(),
            cell_index: 0,
            in_table_head: false,
            tbody_open: false,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => {
                let pushed = self.start(tag);
                self.opened.push(pushed);
            }
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.push_str(&text);
                } else if let Some(alt) = self.image_alt.as_mut() {
                    alt.push_str(&text);
                } else {
                    self.run.push_text(&text);
                }
            }
            Event::Code(code) => {
                if let Some(alt) = self.image_alt.as_mut() {
                    alt.push_str(&code);
                } else {
                    self.push_child(Node::Element(
                        Element::new("code").with_child(Node::Text(code.to_string())),
                    ));
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                if self.image_alt.is_none() {
                    self.run.push_html(&html);
                }
            }
            Event::SoftBreak => {
                if let Some(alt) = self.image_alt.as_mut() {
                    alt.push(' ');
                } else {
                    self.run.push_text("\n");
                }
            }
            Event::HardBreak => {
                if self.image_alt.is_none() {
                    self.push_child(Node::Element(Element::new("br")));
                }
            }
            Event::Rule => self.push_child(Node::Element(Element::new("hr"))),
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input").with_attr("type", "checkbox");
                if checked {
                    input = input.with_attr("checked", "true");
                }
                self.push_child(Node::Element(input));
            }
            Event::FootnoteReference(label) => self.run.push_text(&format!("[^{label}]")),
            _ => {}
        }
    }

    /// Opens the elements for `tag`, returning how many were pushed.
    fn start(&mut self, tag: Tag<'_>) -> usize {
        if self.image_alt.is_some() {
            return 0;
        }
        let element = match tag {
            Tag::Paragraph | Tag::HtmlBlock => Element::new("p"),
            Tag::Heading { level, .. } => Element::new(format!("h{}", heading_level(level))),
            Tag::BlockQuote(_) => Element::new("blockquote"),
            Tag::CodeBlock(kind) => {
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    if let Some(lang) = info.split_whitespace().next() {
                        code = code.with_attr("class", format!("language-{lang}"));
                    }
                }
                self.open(Element::new("pre"));
                self.open(code);
                self.code = Some(String::new());
                return 2;
            }
            Tag::List(Some(start)) => {
                let mut ol = Element::new("ol");
                if start != 1 {
                    ol = ol.with_attr("start", start.to_string());
                }
                ol
            }
            Tag::List(None) => Element::new("ul"),
            Tag::Item => Element::new("li"),
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                self.tbody_open = false;
                Element::new("table")
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                self.open(Element::new("thead"));
                self.open(Element::new("tr"));
                return 2;
            }
            Tag::TableRow => {
                if !self.tbody_open {
                    self.open(Element::new("tbody"));
                    self.tbody_open = true;
                }
                self.cell_index = 0;
                Element::new("tr")
            }
            Tag::TableCell => {
                let name = if self.in_table_head { "th" } else { "td" };
                let mut cell = Element::new(name);
                let align = match self.table_alignments.get(self.cell_index) {
                    Some(Alignment::Left) => Some("left"),
                    Some(Alignment::Center) => Some("center"),
                    Some(Alignment::Right) => Some("right"),
                    _ => None,
                };
                if let Some(align) = align {
                    cell = cell.with_attr("align", align);
                }
                self.cell_index += 1;
                cell
            }
            Tag::Emphasis => Element::new("em"),
            Tag::Strong => Element::new("strong"),
            Tag::Strikethrough => Element::new("del"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut a = Element::new("a").with_attr("href", dest_url.to_string());
                if !title.is_empty() {
                    a = a.with_attr("title", title.to_string());
                }
                a
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut img = Element::new("img").with_attr("src", dest_url.to_string());
                if !title.is_empty() {
                    img = img.with_attr("title", title.to_string());
                }
                self.open(img);
                self.image_alt = Some(String::new());
                return 1;
            }
            _ => return 0,
        };
        self.open(element);
        1
    }

    fn end(&mut self, tag: TagEnd) {
        let pushed = self.opened.pop().unwrap_or(0);
        match tag {
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    if let Some(element) = self.stack.last_mut() {
                        element.children.push(Node::Text(code));
                    }
                }
            }
            TagEnd::Image if pushed == 1 => {
                if let Some(alt) = self.image_alt.take() {
                    if let Some(img) = self.stack.last_mut() {
                        if !alt.is_empty() {
                            img.attributes.insert("alt".to_string(), alt);
                        }
                    }
                }
            }
            TagEnd::HtmlBlock => {
                let trimmed = self.run.text.trim_end().len();
                self.run.text.truncate(trimmed);
                self.flush_run();
                if pushed == 1 && self.stack.last().is_some_and(|p| p.children.is_empty()) {
                    self.stack.pop();
                    return;
                }
            }
            TagEnd::TableHead => self.in_table_head = false,
            TagEnd::Table => {
                if self.tbody_open {
                    self.close();
                    self.tbody_open = false;
                }
            }
            _ => {}
        }
        for _ in 0..pushed {
            self.close();
        }
    }

    fn open(&mut self, element: Element) {
        self.flush_run();
        self.stack.push(element);
    }

    fn close(&mut self) {
        self.flush_run();
        if let Some(element) = self.stack.pop() {
            self.append(Node::Element(element));
        }
    }

    fn push_child(&mut self, node: Node) {
        self.flush_run();
        self.append(node);
    }

    fn append(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    /// Scans the pending run with the inline syntaxes and appends the result.
    ///
    /// Only matches that begin inside raw HTML count, so escaped or code text that merely looks
    /// like a tag is never rewritten. Unmatched HTML stays literal text.
    fn flush_run(&mut self) {
        let run = std::mem::take(&mut self.run);
        if run.text.is_empty() {
            return;
        }
        let text = run.text.as_str();
        let mut pos = 0;
        let mut pending = String::new();
        while pos < text.len() {
            let Some(m) = self.next_match(&run, pos) else {
                break;
            };
            pending.push_str(&text[pos..m.range.start]);
            if !pending.is_empty() {
                self.append(Node::Text(std::mem::take(&mut pending)));
            }
            self.append(m.node);
            if m.range.end <= pos {
                break;
            }
            pos = m.range.end;
        }
        pending.push_str(&text[pos..]);
        if !pending.is_empty() {
            self.append(Node::Text(pending));
        }
    }

    fn next_match(&self, run: &InlineRun, from: usize) -> Option<crate::syntax::InlineMatch> {
        if run.html.is_empty() {
            return None;
        }
        let mut best: Option<crate::syntax::InlineMatch> = None;
        for syntax in self.syntaxes {
            let mut at = from;
            while let Some(m) = syntax.find(&run.text, at) {
                if run.starts_in_html(m.range.start) {
                    if best.as_ref().is_none_or(|b| m.range.start < b.range.start) {
                        best = Some(m);
                    }
                    break;
                }
                at = next_char_boundary(&run.text, m.range.start);
                if at >= run.text.len() {
                    break;
                }
            }
        }
        best
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.stack.is_empty() {
            self.close();
        }
        self.flush_run();
        self.root
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn next_char_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len(), |c| at + c.len_utf8())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Vec<Node> {
        MarkdownParser::new().parse(src)
    }

    fn el(node: &Node) -> &Element {
        match node {
            Node::Element(e) => e,
            Node::Text(t) => panic!("expected element, got text {t:?}"),
        }
    }

    #[test]
    fn paragraphs_keep_soft_breaks_as_newlines() {
        let nodes = parse("foo\nbar");
        assert_eq!(nodes.len(), 1);
        let p = el(&nodes[0]);
        assert_eq!(p.tag, "p");
        assert_eq!(p.children, vec![Node::Text("foo\nbar".into())]);
    }

    #[test]
    fn inline_html_becomes_elements() {
        let nodes = parse("H<sub>2</sub>O and x<sup>2</sup><br>next");
        let p = el(&nodes[0]);
        let tags: Vec<&str> = p
            .children
            .iter()
            .filter_map(|n| match n {
                Node::Element(e) => Some(e.tag.as_str()),
                Node::Text(_) => None,
            })
            .collect();
        assert_eq!(tags, vec!["sub", "sup", "br"]);
        assert_eq!(p.text_content(), "H2O and x2next");
    }

    #[test]
    fn unmatched_html_stays_literal() {
        let nodes = parse("a <span>b</span> c");
        let p = el(&nodes[0]);
        assert_eq!(p.children, vec![Node::Text("a <span>b</span> c".into())]);
    }

    #[test]
    fn code_spans_are_not_rewritten() {
        let nodes = parse("`<br>`");
        let p = el(&nodes[0]);
        let code = el(&p.children[0]);
        assert_eq!(code.tag, "code");
        assert_eq!(code.text_content(), "<br>");
    }

    #[test]
    fn tables_get_sections_and_alignment() {
        let nodes = parse("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        let table = el(&nodes[0]);
        assert_eq!(table.tag, "table");
        let thead = el(&table.children[0]);
        let tbody = el(&table.children[1]);
        assert_eq!(thead.tag, "thead");
        assert_eq!(tbody.tag, "tbody");
        let head_row = el(&thead.children[0]);
        assert_eq!(el(&head_row.children[0]).tag, "th");
        assert_eq!(el(&head_row.children[0]).attr("align"), Some("left"));
        let body_row = el(&tbody.children[0]);
        assert_eq!(el(&body_row.children[1]).attr("align"), Some("right"));
        assert_eq!(body_row.children[1].text_content(), "2");
    }

    #[test]
    fn empty_cells_have_no_children() {
        let nodes = parse("|Header 1|Header 2|\n|----|----|\n| | |\n");
        let table = el(&nodes[0]);
        let row = el(&el(&table.children[1]).children[0]);
        assert_eq!(row.children.len(), 2);
        assert!(el(&row.children[0]).children.is_empty());
    }

    #[test]
    fn task_items_start_with_a_checkbox() {
        let nodes = parse("- [x] done\n- [ ] todo\n");
        let ul = el(&nodes[0]);
        let first = el(&ul.children[0]);
        let input = el(&first.children[0]);
        assert_eq!(input.tag, "input");
        assert_eq!(input.attr("checked"), Some("true"));
        let second = el(&ul.children[1]);
        assert_eq!(el(&second.children[0]).attr("checked"), None);
    }

    #[test]
    fn ordered_lists_record_their_start() {
        let nodes = parse("3. c\n4. d\n");
        assert_eq!(el(&nodes[0]).attr("start"), Some("3"));
        let nodes = parse("1. a\n");
        assert_eq!(el(&nodes[0]).attr("start"), None);
    }

    #[test]
    fn fenced_code_keeps_language_and_text() {
        let nodes = parse("```rust\nfn main() {}\n```\n");
        let pre = el(&nodes[0]);
        assert_eq!(pre.tag, "pre");
        let code = el(&pre.children[0]);
        assert_eq!(code.attr("class"), Some("language-rust"));
        assert_eq!(code.text_content(), "fn main() {}\n");
    }

    #[test]
    fn images_carry_alt_text_as_an_attribute() {
        let nodes = parse("![the *alt*](img.png#10x20 \"t\")");
        let img = el(&el(&nodes[0]).children[0]);
        assert_eq!(img.tag, "img");
        assert_eq!(img.attr("src"), Some("img.png#10x20"));
        assert_eq!(img.attr("alt"), Some("the alt"));
        assert_eq!(img.attr("title"), Some("t"));
        assert!(img.children.is_empty());
    }

    #[test]
    fn html_blocks_are_scanned_as_paragraphs() {
        let nodes = parse("<div>\n<u>under</u>\n</div>\n");
        assert_eq!(nodes.len(), 1);
        let p = el(&nodes[0]);
        assert_eq!(p.tag, "p");
        assert!(
            p.children
                .iter()
                .any(|n| matches!(n, Node::Element(e) if e.tag == "u"))
        );
        assert!(p.text_content().starts_with("<div>"));
    }

    struct Tags(Vec<String>);

    impl NodeVisitor for Tags {
        fn visit_element_before(&mut self, element: &Element) -> bool {
            self.0.push(format!("<{}>", element.tag));
            element.tag != "a"
        }

        fn visit_text(&mut self, text: &str) {
            self.0.push(text.to_string());
        }

        fn visit_element_after(&mut self, element: &Element) {
            self.0.push(format!("</{}>", element.tag));
        }
    }

    #[test]
    fn skipped_elements_get_no_children_or_after_call() {
        let mut tags = Tags(Vec::new());
        for node in parse("x [link](u) y") {
            node.accept(&mut tags);
        }
        assert_eq!(tags.0, vec!["<p>", "x ", "<a>", " y", "</p>"]);
    }
}
