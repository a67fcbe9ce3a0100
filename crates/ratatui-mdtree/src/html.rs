//! Rewrites raw HTML lists into text lines Markdown renders faithfully.
//!
//! Markdown leaves `<ul>`/`<ol>` blocks as literal HTML. [`normalize_html_lists`] replaces every
//! well-formed list with one line per item: an indent of two non-breaking spaces per nesting
//! level, a `•` bullet or `N.` ordinal, a space and the item text. Lines are joined with `<br>` so
//! the inline break syntax turns them into forced line breaks. Non-breaking spaces keep the lines
//! from being re-read as Markdown lists or indented code.
use std::sync::LazyLock;

use regex::Regex;

const INDENT: &str = "\u{a0}\u{a0}";
const LINE_BREAK: &str = "<br>";

struct TagPattern {
    open: Regex,
    close: Regex,
}

impl TagPattern {
    fn new(name: &str) -> Self {
        Self {
            open: Regex::new(&format!(r"(?i)<{name}(?:\s[^>]*)?>"))
                .expect("hardcoded open tag regex is valid"),
            close: Regex::new(&format!(r"(?i)</{name}\s*>"))
                .expect("hardcoded close tag regex is valid"),
        }
    }
}

static UL: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("ul"));
static OL: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("ol"));
static LI: LazyLock<TagPattern> = LazyLock::new(|| TagPattern::new("li"));

static START_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bstart\s*=\s*["']?(\d+)"#).expect("hardcoded start regex is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n]+").expect("hardcoded whitespace regex is valid"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn pattern(self) -> &'static TagPattern {
        match self {
            ListKind::Unordered => &*UL,
            ListKind::Ordered => &*OL,
        }
    }
}

/// A well-formed list: its opening tag and the byte range of its body and of the whole list.
struct ListMatch<'a> {
    kind: ListKind,
    open_tag: &'a str,
    start: usize,
    body: std::ops::Range<usize>,
    end: usize,
}

/// Replaces every well-formed HTML list in `source` with `<br>`-joined text lines.
///
/// An opening tag with no matching close leaves it and everything after it verbatim, nested
/// lists included. Text outside lists is never modified.
pub fn normalize_html_lists(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut pos = 0;
    while let Some(found) = next_list(source, pos) {
        match found {
            Ok(list) => {
                out.push_str(&source[pos..list.start]);
                let lines = list_lines(&list, source, 1);
                out.push_str(&lines.join(LINE_BREAK));
                pos = list.end;
            }
            Err(open) => {
                log::debug!("leaving unterminated html list at byte {open} untouched");
                break;
            }
        }
    }
    out.push_str(&source[pos..]);
    out
}

/// Finds the next list opening at or after `from`.
///
/// Returns `Err(start_of_open_tag)` when the opening tag has no matching close.
fn next_list(source: &str, from: usize) -> Option<Result<ListMatch<'_>, usize>> {
    let ul = UL.open.find_at(source, from);
    let ol = OL.open.find_at(source, from);
    let (kind, open) = match (ul, ol) {
        (Some(u), Some(o)) if o.start() < u.start() => (ListKind::Ordered, o),
        (Some(u), _) => (ListKind::Unordered, u),
        (None, Some(o)) => (ListKind::Ordered, o),
        (None, None) => return None,
    };
    Some(
        match matching_close(source, open.end(), kind.pattern()) {
            Some(close) => Ok(ListMatch {
                kind,
                open_tag: open.as_str(),
                start: open.start(),
                body: open.end()..close.start,
                end: close.end,
            }),
            None => Err(open.start()),
        },
    )
}

/// Finds the close tag balancing an open tag that ended at `from`, counting nested same-name
/// tags.
fn matching_close(text: &str, from: usize, pattern: &TagPattern) -> Option<std::ops::Range<usize>> {
    let mut depth = 1usize;
    let mut pos = from;
    loop {
        let close = pattern.close.find_at(text, pos)?;
        match pattern.open.find_at(text, pos) {
            Some(open) if open.start() < close.start() => {
                depth += 1;
                pos = open.end();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(close.range());
                }
                pos = close.end();
            }
        }
    }
}

fn list_lines(list: &ListMatch<'_>, source: &str, depth: usize) -> Vec<String> {
    let body = &source[list.body.clone()];
    let mut ordinal = match list.kind {
        ListKind::Ordered => START_ATTR
            .captures(list.open_tag)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(1),
        ListKind::Unordered => 1,
    };

    let mut lines = Vec::new();
    let mut pos = 0;
    while let Some(open) = LI.open.find_at(body, pos) {
        let (content, next) = match matching_close(body, open.end(), &LI) {
            Some(close) => (&body[open.end()..close.start], close.end),
            None => (&body[open.end()..], body.len()),
        };
        let (text, nested) = item_parts(content, depth);
        let marker = match list.kind {
            ListKind::Ordered => format!("{ordinal}."),
            ListKind::Unordered => "•".to_string(),
        };
        let mut line = INDENT.repeat(depth);
        line.push_str(&marker);
        if !text.is_empty() {
            line.push(' ');
            line.push_str(&text);
        }
        lines.push(line);
        lines.extend(nested);
        ordinal += 1;
        pos = next;
    }
    lines
}

/// Splits an item's content into its own text and the lines of any nested lists.
fn item_parts(content: &str, depth: usize) -> (String, Vec<String>) {
    let mut text = String::new();
    let mut nested = Vec::new();
    let mut pos = 0;
    while let Some(found) = next_list(content, pos) {
        match found {
            Ok(list) => {
                text.push_str(&content[pos..list.start]);
                text.push(' ');
                nested.extend(list_lines(&list, content, depth + 1));
                pos = list.end;
            }
            Err(_) => break,
        }
    }
    text.push_str(&content[pos..]);
    let text = WHITESPACE.replace_all(text.trim(), " ").into_owned();
    (text, nested)
}
