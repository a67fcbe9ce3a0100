//! Lays a render tree out into terminal lines.
//!
//! Wrapping is word-based on display width (`unicode-width`), breaks long URLs at punctuation, and
//! hard-splits anything else that does not fit.
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui_mdtree_core::style::FontFeature;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use crate::style::TableVerticalAlign;
use crate::style::TextAlign;
use crate::table::ColumnWidth;
use crate::table::Table;
use crate::table::TableCell;
use crate::table::TableGrid;
use crate::table::TablePresentation;
use crate::tree::InlineNode;
use crate::tree::RenderNode;
use crate::tree::TextSpan;
use crate::tree::Wrap;

#[derive(Clone, Debug)]
struct Segment {
    text: String,
    style: Style,
}

impl Segment {
    fn from_span(span: &TextSpan, base: Style) -> Self {
        let text = if span.style.has_feature(FontFeature::SUPERSCRIPTS) {
            span.text.chars().map(superscript_char).collect()
        } else if span.style.has_feature(FontFeature::SUBSCRIPTS) {
            span.text.chars().map(subscript_char).collect()
        } else {
            span.text.clone()
        };
        Self {
            text,
            style: base.patch(span.style.style),
        }
    }
}

/// Lays `nodes` out at `width` columns.
pub fn layout(nodes: &[RenderNode], width: u16) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    for node in nodes {
        layout_node(node, width, &mut out);
    }
    out
}

fn layout_node(node: &RenderNode, width: u16, out: &mut Vec<Line<'static>>) {
    match node {
        RenderNode::Empty => {}
        RenderNode::Spacer(height) => {
            out.extend((0..*height).map(|_| Line::default()));
        }
        RenderNode::Column(children) => {
            for child in children {
                layout_node(child, width, out);
            }
        }
        RenderNode::Wrap(wrap) => layout_wrap(wrap, width, Style::default(), out),
        RenderNode::Padded { padding, child } => {
            out.extend((0..padding.top).map(|_| Line::default()));
            let inner = width.saturating_sub(padding.width());
            let mut lines = Vec::new();
            layout_node(child, inner, &mut lines);
            out.extend(prefix_lines(lines, &" ".repeat(padding.left as usize), Style::default()));
            out.extend((0..padding.bottom).map(|_| Line::default()));
        }
        RenderNode::ListItem(item) => {
            let marker_cols = item
                .indent
                .saturating_add(item.marker_padding.width());
            let mut marker = Vec::new();
            layout_node(&item.marker, item.indent, &mut marker);
            let mut body = Vec::new();
            layout_node(&item.body, width.saturating_sub(marker_cols), &mut body);
            let rows = marker.len().max(body.len()).max(1);
            let mut marker = marker.into_iter();
            let mut body = body.into_iter();
            for _ in 0..rows {
                let mut spans = Vec::new();
                if item.marker_padding.left > 0 {
                    spans.push(Span::raw(" ".repeat(item.marker_padding.left as usize)));
                }
                let marker_spans = marker.next().map(|l| l.spans).unwrap_or_default();
                spans.extend(pad_spans(marker_spans, item.indent, TextAlign::Left, Style::default()));
                if item.marker_padding.right > 0 {
                    spans.push(Span::raw(" ".repeat(item.marker_padding.right as usize)));
                }
                spans.extend(body.next().map(|l| l.spans).unwrap_or_default());
                out.push(Line::from(spans));
            }
        }
        RenderNode::Blockquote(quote) => {
            let bar_cols = UnicodeWidthStr::width(quote.bar.as_str()) as u16;
            let mut lines = Vec::new();
            layout_node(&quote.child, width.saturating_sub(bar_cols), &mut lines);
            if lines.is_empty() {
                lines.push(Line::default());
            }
            out.extend(prefix_lines(lines, &quote.bar, quote.style));
        }
        RenderNode::Code(code) => {
            let indent = " ".repeat(code.padding.left as usize);
            out.extend((0..code.padding.top).map(|_| Line::default()));
            for line in &code.lines {
                let mut spans = Vec::with_capacity(line.len() + 1);
                if !indent.is_empty() {
                    spans.push(Span::raw(indent.clone()));
                }
                spans.extend(line.iter().cloned());
                out.push(Line::from(spans));
            }
            out.extend((0..code.padding.bottom).map(|_| Line::default()));
        }
        RenderNode::Rule(style) => {
            out.push(Line::from(Span::styled(
                "─".repeat(width.max(1) as usize),
                *style,
            )));
        }
        RenderNode::Table(table) => layout_table(table, width, out),
        RenderNode::Image(image) => {
            let alt = image
                .alt
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or("[image]");
            let segments = vec![
                Segment {
                    text: "Image: ".to_string(),
                    style: image.style,
                },
                Segment {
                    text: alt.to_string(),
                    style: image.style,
                },
                Segment {
                    text: " → ".to_string(),
                    style: image.style,
                },
                Segment {
                    text: image.uri.clone(),
                    style: image.style,
                },
            ];
            out.extend(wrap_segments(&segments, width).into_iter().map(Line::from));
        }
        RenderNode::Tappable { child, .. } => layout_node(child, width, out),
    }
}

fn prefix_lines(lines: Vec<Line<'static>>, prefix: &str, style: Style) -> Vec<Line<'static>> {
    if prefix.is_empty() {
        return lines;
    }
    lines
        .into_iter()
        .map(|line| {
            let mut spans = Vec::with_capacity(line.spans.len() + 1);
            spans.push(Span::styled(prefix.to_string(), style));
            spans.extend(line.spans);
            Line::from(spans)
        })
        .collect()
}

fn layout_wrap(wrap: &Wrap, width: u16, base: Style, out: &mut Vec<Line<'static>>) {
    let mut segments: Vec<Segment> = Vec::new();
    for child in &wrap.children {
        match child {
            InlineNode::Span(span) => segments.push(Segment::from_span(span, base)),
            InlineNode::Rich { spans, .. } => {
                segments.extend(spans.iter().map(|s| Segment::from_span(s, base)));
            }
            InlineNode::Block(node) => {
                flush_paragraph(&mut segments, width, wrap.align, out);
                layout_node(node, width, out);
            }
        }
    }
    flush_paragraph(&mut segments, width, wrap.align, out);
}

fn flush_paragraph(
    segments: &mut Vec<Segment>,
    width: u16,
    align: TextAlign,
    out: &mut Vec<Line<'static>>,
) {
    if segments.is_empty() {
        return;
    }
    for line in split_lines(std::mem::take(segments)) {
        let wrapped = wrap_segments(&line, width);
        if wrapped.is_empty() {
            out.push(Line::default());
        }
        for spans in wrapped {
            out.push(Line::from(align_spans(spans, width, align)));
        }
    }
}

/// Splits segments at embedded newlines into logical lines.
fn split_lines(segments: Vec<Segment>) -> Vec<Vec<Segment>> {
    let mut lines = vec![Vec::new()];
    for seg in segments {
        let mut parts = seg.text.split('\n');
        if let Some(first) = parts.next() {
            if !first.is_empty() {
                if let Some(cur) = lines.last_mut() {
                    cur.push(Segment {
                        text: first.to_string(),
                        style: seg.style,
                    });
                }
            }
        }
        for part in parts {
            let mut line = Vec::new();
            if !part.is_empty() {
                line.push(Segment {
                    text: part.to_string(),
                    style: seg.style,
                });
            }
            lines.push(line);
        }
    }
    lines
}

fn align_spans(spans: Vec<Span<'static>>, width: u16, align: TextAlign) -> Vec<Span<'static>> {
    let used = spans_width(&spans);
    let pad = (width as usize).saturating_sub(used);
    let left = match align {
        TextAlign::Left => 0,
        TextAlign::Center => pad / 2,
        TextAlign::Right => pad,
    };
    if left == 0 {
        return spans;
    }
    let mut out = Vec::with_capacity(spans.len() + 1);
    out.push(Span::raw(" ".repeat(left)));
    out.extend(spans);
    out
}

fn pad_spans(
    mut spans: Vec<Span<'static>>,
    width: u16,
    align: TextAlign,
    pad_style: Style,
) -> Vec<Span<'static>> {
    let pad = (width as usize).saturating_sub(spans_width(&spans));
    let (left, right) = match align {
        TextAlign::Left => (0, pad),
        TextAlign::Right => (pad, 0),
        TextAlign::Center => (pad / 2, pad - pad / 2),
    };
    if left > 0 {
        spans.insert(0, Span::styled(" ".repeat(left), pad_style));
    }
    if right > 0 {
        spans.push(Span::styled(" ".repeat(right), pad_style));
    }
    spans
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans
        .iter()
        .map(|s| UnicodeWidthStr::width(s.content.as_ref()))
        .sum()
}

fn wrap_segments(segments: &[Segment], width: u16) -> Vec<Vec<Span<'static>>> {
    if width == 0 {
        return Vec::new();
    }
    let width = width as usize;

    let mut tokens: Vec<Segment> = Vec::new();
    for seg in segments {
        tokens.extend(split_segment_ws(seg));
    }

    let mut out: Vec<Vec<Span<'static>>> = Vec::new();
    let mut cur: Vec<Segment> = Vec::new();
    let mut cur_cols = 0usize;

    fn push_line(out: &mut Vec<Vec<Span<'static>>>, cur: &mut Vec<Segment>) {
        while cur.last().is_some_and(|s| is_all_ws(&s.text)) {
            cur.pop();
        }
        out.push(segments_to_spans(cur));
        cur.clear();
    }

    for tok in tokens {
        let tok_cols = UnicodeWidthStr::width(tok.text.as_str());
        if cur.is_empty() && is_all_ws(&tok.text) {
            continue;
        }
        if cur_cols + tok_cols <= width {
            cur.push(tok);
            cur_cols += tok_cols;
            continue;
        }
        if !cur.is_empty() {
            push_line(&mut out, &mut cur);
            cur_cols = 0;
            if is_all_ws(&tok.text) {
                continue;
            }
        }
        let mut remaining = tok;
        loop {
            if remaining.text.is_empty() || is_all_ws(&remaining.text) {
                break;
            }
            let remaining_cols = UnicodeWidthStr::width(remaining.text.as_str());
            if cur_cols + remaining_cols <= width {
                cur.push(remaining);
                cur_cols += remaining_cols;
                break;
            }
            let max = width.saturating_sub(cur_cols).max(1);
            let (head, tail) = split_to_width_prefer_url_breaks(&remaining, max);
            if head.text.is_empty() {
                // A single glyph wider than the line; emit it alone.
                let mut chars = remaining.text.chars();
                let first: String = chars.next().map(String::from).unwrap_or_default();
                cur.push(Segment {
                    text: first,
                    style: remaining.style,
                });
                remaining.text = chars.collect();
            } else {
                cur.push(head);
                remaining = tail;
            }
            push_line(&mut out, &mut cur);
            cur_cols = 0;
        }
    }
    if !cur.is_empty() {
        push_line(&mut out, &mut cur);
    }
    out
}

fn split_to_width_prefer_url_breaks(seg: &Segment, max_cols: usize) -> (Segment, Segment) {
    if looks_like_url(&seg.text)
        && let Some(split_idx) = last_url_breakpoint_before(&seg.text, max_cols)
    {
        let (a, b) = seg.text.split_at(split_idx);
        return (
            Segment {
                text: a.to_string(),
                style: seg.style,
            },
            Segment {
                text: b.to_string(),
                style: seg.style,
            },
        );
    }
    split_to_width(seg, max_cols)
}

fn looks_like_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

fn last_url_breakpoint_before(s: &str, max_cols: usize) -> Option<usize> {
    let mut cols = 0usize;
    let mut best: Option<usize> = None;
    for (byte_idx, ch) in s.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if w == 0 {
            continue;
        }
        if cols + w > max_cols {
            break;
        }
        cols += w;
        if matches!(ch, '.' | '-' | '_' | '~' | '?' | '&' | '#' | '=' | '/') {
            best = Some(byte_idx + ch.len_utf8());
        }
    }
    best
}

fn split_segment_ws(seg: &Segment) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::new();
    let mut buf = String::new();
    let mut last_was_ws: Option<bool> = None;
    for ch in seg.text.chars() {
        // Non-breaking spaces glue words together.
        let is_ws = ch.is_whitespace() && ch != '\u{a0}';
        match last_was_ws {
            Some(prev) if prev != is_ws => {
                out.push(Segment {
                    text: std::mem::take(&mut buf),
                    style: seg.style,
                });
            }
            _ => {}
        }
        buf.push(ch);
        last_was_ws = Some(is_ws);
    }
    if !buf.is_empty() {
        out.push(Segment {
            text: buf,
            style: seg.style,
        });
    }
    out
}

fn split_to_width(seg: &Segment, max_cols: usize) -> (Segment, Segment) {
    let mut cols = 0usize;
    let mut idx = 0usize;
    for (byte_idx, ch) in seg.text.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols {
            break;
        }
        cols += w;
        idx = byte_idx + ch.len_utf8();
    }
    let (a, b) = seg.text.split_at(idx);
    (
        Segment {
            text: a.to_string(),
            style: seg.style,
        },
        Segment {
            text: b.to_string(),
            style: seg.style,
        },
    )
}

fn is_all_ws(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace() && c != '\u{a0}')
}

fn segments_to_spans(segs: &[Segment]) -> Vec<Span<'static>> {
    segs.iter()
        .filter(|s| !s.text.is_empty())
        .map(|s| Span::styled(s.text.clone(), s.style))
        .collect()
}

fn superscript_char(ch: char) -> char {
    match ch {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'n' => 'ⁿ',
        'i' => 'ⁱ',
        other => other,
    }
}

fn subscript_char(ch: char) -> char {
    match ch {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '+' => '₊',
        '-' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        other => other,
    }
}

/// Widest logical line of inline content, in columns.
pub(crate) fn inline_width(children: &[InlineNode]) -> u16 {
    let mut widest = 0usize;
    let mut current = 0usize;
    let measure_text = |text: &str, current: &mut usize, widest: &mut usize| {
        let mut parts = text.split('\n');
        if let Some(first) = parts.next() {
            *current += UnicodeWidthStr::width(first);
        }
        for part in parts {
            *widest = (*widest).max(*current);
            *current = UnicodeWidthStr::width(part);
        }
    };
    for child in children {
        match child {
            InlineNode::Span(span) => measure_text(&span.text, &mut current, &mut widest),
            InlineNode::Rich { spans, .. } => {
                for span in spans {
                    measure_text(&span.text, &mut current, &mut widest);
                }
            }
            InlineNode::Block(node) => {
                widest = widest.max(current).max(natural_width(node) as usize);
                current = 0;
            }
        }
    }
    widest.max(current).min(u16::MAX as usize) as u16
}

/// Width `node` occupies when nothing wraps.
pub fn natural_width(node: &RenderNode) -> u16 {
    match node {
        RenderNode::Empty | RenderNode::Spacer(_) => 0,
        RenderNode::Column(children) => children.iter().map(natural_width).max().unwrap_or(0),
        RenderNode::Wrap(wrap) => inline_width(&wrap.children),
        RenderNode::Padded { padding, child } => {
            natural_width(child).saturating_add(padding.width())
        }
        RenderNode::ListItem(item) => item
            .indent
            .saturating_add(item.marker_padding.width())
            .saturating_add(natural_width(&item.body)),
        RenderNode::Blockquote(quote) => (UnicodeWidthStr::width(quote.bar.as_str()) as u16)
            .saturating_add(natural_width(&quote.child)),
        RenderNode::Code(code) => code
            .lines
            .iter()
            .map(|l| spans_width(l) as u16)
            .max()
            .unwrap_or(0)
            .saturating_add(code.padding.width()),
        RenderNode::Rule(_) => 1,
        RenderNode::Table(table) => table_natural_width(&table.grid),
        RenderNode::Image(image) => {
            let alt = image.alt.as_deref().unwrap_or("[image]");
            (UnicodeWidthStr::width(alt) + UnicodeWidthStr::width(image.uri.as_str()) + 10) as u16
        }
        RenderNode::Tappable { child, .. } => natural_width(child),
    }
}

/// Column widths (content only) when no column is squeezed.
pub(crate) fn natural_column_widths(grid: &TableGrid) -> Vec<u16> {
    grid.column_widths
        .iter()
        .enumerate()
        .map(|(col, width)| match width {
            ColumnWidth::Fixed(w) => (*w).max(1),
            ColumnWidth::Flex => grid
                .rows
                .iter()
                .map(|row| inline_width(&row.cells[col].children))
                .max()
                .unwrap_or(0)
                .max(1),
        })
        .collect()
}

fn separator_cols(grid: &TableGrid) -> u16 {
    grid.column_count().saturating_sub(1) as u16
}

fn chrome_width(grid: &TableGrid) -> u16 {
    let cols = grid.column_count() as u16;
    separator_cols(grid).saturating_add(grid.cell_padding.width().saturating_mul(cols))
}

pub fn table_natural_width(grid: &TableGrid) -> u16 {
    natural_column_widths(grid)
        .into_iter()
        .fold(chrome_width(grid), u16::saturating_add)
}

/// Squeezes the widest columns one cell at a time until they fit `available`.
fn shrink_to_fit(col_w: &mut [u16], available: u16, min_col_w: u16) {
    let mut total = col_w.iter().copied().map(u32::from).sum::<u32>();
    while total > available as u32 {
        let Some((idx, _)) = col_w
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > min_col_w)
            .max_by_key(|(_, w)| **w)
        else {
            break;
        };
        col_w[idx] -= 1;
        total -= 1;
    }
}

fn column_widths_for(table: &Table, width: u16) -> (Vec<u16>, bool) {
    let grid = &table.grid;
    let natural = natural_column_widths(grid);
    match &table.presentation {
        TablePresentation::Scrollable => (natural, false),
        TablePresentation::Plain => {
            let cols = grid.column_count().max(1) as u16;
            let available = width.saturating_sub(chrome_width(grid));
            let all_flex = grid
                .column_widths
                .iter()
                .all(|w| matches!(w, ColumnWidth::Flex));
            let mut col_w = if all_flex {
                let per = (available / cols).max(1);
                let mut w = vec![per; cols as usize];
                if let Some(first) = w.first_mut() {
                    *first = first.saturating_add(available.saturating_sub(per * cols));
                }
                w
            } else {
                natural
            };
            shrink_to_fit(&mut col_w, available, 1);
            (col_w, false)
        }
        TablePresentation::Zoomable(zoom) => {
            let scale = zoom.scale();
            if scale >= 1.0 {
                return (natural, false);
            }
            let min = zoom.min_column_width();
            let mut col_w: Vec<u16> = natural
                .into_iter()
                .map(|w| ((w as f32 * scale).floor() as u16).max(min.min(w)).max(1))
                .collect();
            shrink_to_fit(&mut col_w, width.saturating_sub(chrome_width(grid)), min.max(1));
            (col_w, true)
        }
    }
}

fn cell_spans(cell: &TableCell) -> Vec<Segment> {
    let base = cell.style.style;
    let mut segments = Vec::new();
    for child in &cell.children {
        match child {
            InlineNode::Span(span) => segments.push(Segment::from_span(span, base)),
            InlineNode::Rich { spans, .. } => {
                segments.extend(spans.iter().map(|s| Segment::from_span(s, base)))
            }
            InlineNode::Block(node) => {
                let mut lines = Vec::new();
                layout_node(node, natural_width(node).max(1), &mut lines);
                for line in lines {
                    for span in line.spans {
                        segments.push(Segment {
                            text: span.content.into_owned(),
                            style: span.style,
                        });
                    }
                }
            }
        }
    }
    segments
}

/// Lines of one cell laid out at `width`, padded to the column and aligned.
pub(crate) fn cell_lines(cell: &TableCell, width: u16, truncate: bool) -> Vec<Vec<Span<'static>>> {
    let segments = cell_spans(cell);
    let mut lines: Vec<Vec<Span<'static>>> = Vec::new();
    for line in split_lines(segments) {
        if truncate {
            lines.push(truncate_spans_with_ellipsis(
                segments_to_spans(&line),
                width as usize,
                cell.style.style,
            ));
        } else {
            let wrapped = wrap_segments(&line, width);
            if wrapped.is_empty() {
                lines.push(Vec::new());
            }
            lines.extend(wrapped);
        }
    }
    if truncate {
        lines.truncate(1);
    }
    if lines.is_empty() {
        lines.push(Vec::new());
    }
    lines
        .into_iter()
        .map(|spans| pad_spans(spans, width, cell.align, Style::default()))
        .collect()
}

fn layout_table(table: &Table, width: u16, out: &mut Vec<Line<'static>>) {
    let grid = &table.grid;
    if grid.column_count() == 0 {
        return;
    }
    let (col_w, truncate) = column_widths_for(table, width);
    let border = grid.border.unwrap_or_default();
    let separator = if grid.border.is_some() { "│" } else { " " };
    let pad = grid.cell_padding;
    let header_rows = grid.header_rows();

    for (ri, row) in grid.rows.iter().enumerate() {
        let cells: Vec<Vec<Vec<Span<'static>>>> = row
            .cells
            .iter()
            .zip(&col_w)
            .map(|(cell, w)| cell_lines(cell, *w, truncate))
            .collect();
        let row_h = cells.iter().map(Vec::len).max().unwrap_or(1);
        let row_style = row.background.map_or(Style::default(), |bg| Style::default().bg(bg));

        for li in 0..row_h {
            let mut spans: Vec<Span<'static>> = Vec::new();
            for (ci, lines) in cells.iter().enumerate() {
                if ci > 0 {
                    spans.push(Span::styled(separator.to_string(), border));
                }
                let offset = match grid.vertical_align {
                    TableVerticalAlign::Top | TableVerticalAlign::Baseline => 0,
                    TableVerticalAlign::Middle => (row_h - lines.len()) / 2,
                    TableVerticalAlign::Bottom => row_h - lines.len(),
                };
                let cell = li
                    .checked_sub(offset)
                    .and_then(|i| lines.get(i))
                    .cloned()
                    .unwrap_or_else(|| vec![Span::raw(" ".repeat(col_w[ci] as usize))]);
                if pad.left > 0 {
                    spans.push(Span::styled(" ".repeat(pad.left as usize), row_style));
                }
                spans.extend(
                    cell.into_iter()
                        .map(|s| Span::styled(s.content, row_style.patch(s.style))),
                );
                if pad.right > 0 {
                    spans.push(Span::styled(" ".repeat(pad.right as usize), row_style));
                }
            }
            out.push(Line::from(spans));
        }

        if ri + 1 == header_rows && grid.border.is_some() {
            out.push(Line::from(Span::styled(
                separator_line(&col_w, pad.width()),
                border,
            )));
        }
    }

    if truncate && let Some(zoom) = table.zoomable() {
        out.push(scale_readout(zoom.scale(), border));
    }
}

/// Muted footer under a shrunk table, e.g. `⤢ 80%`.
fn scale_readout(scale: f32, style: Style) -> Line<'static> {
    let percent = (scale * 100.0).round() as u32;
    Line::from(Span::styled(format!("⤢ {percent}%"), style))
}

fn separator_line(col_w: &[u16], padding: u16) -> String {
    let mut s = String::new();
    for (i, w) in col_w.iter().copied().enumerate() {
        if i > 0 {
            s.push('┼');
        }
        s.push_str(&"─".repeat(w.saturating_add(padding) as usize));
    }
    s
}

fn truncate_spans_with_ellipsis(
    spans: Vec<Span<'static>>,
    max_cols: usize,
    fallback_style: Style,
) -> Vec<Span<'static>> {
    if max_cols == 0 {
        return Vec::new();
    }
    if spans_width(&spans) <= max_cols {
        return spans;
    }
    if max_cols == 1 {
        return vec![Span::styled("…".to_string(), fallback_style)];
    }

    let target = max_cols - 1;
    let mut out: Vec<Span<'static>> = Vec::new();
    let mut cur = 0usize;
    'outer: for span in spans {
        let mut buf = String::new();
        for ch in span.content.as_ref().chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if cur + w > target {
                if !buf.is_empty() {
                    out.push(Span::styled(buf, span.style));
                }
                break 'outer;
            }
            cur += w;
            buf.push(ch);
        }
        if !buf.is_empty() {
            out.push(Span::styled(buf, span.style));
        }
    }
    out.push(Span::styled("…".to_string(), fallback_style));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MarkdownParser;
    use crate::builder::BuilderOptions;
    use crate::builder::MarkdownBuilder;
    use crate::style::StyleSheet;
    use crate::style::TableColumnWidth;
    use ratatui_mdtree_core::render::spans_plain;

    fn render(src: &str, sheet: StyleSheet, width: u16) -> Vec<String> {
        let nodes = MarkdownParser::new().parse(src);
        let mut builder =
            MarkdownBuilder::new(sheet, BuilderOptions::default()).expect("valid style sheet");
        let tree = builder.build(&nodes);
        layout(tree.nodes(), width)
            .iter()
            .map(|l| spans_plain(&l.spans))
            .collect()
    }

    fn plain(src: &str, width: u16) -> Vec<String> {
        render(src, StyleSheet::default(), width)
    }

    #[test]
    fn paragraphs_wrap_on_words() {
        let lines = plain("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn long_urls_break_at_punctuation() {
        let lines = plain("https://example.com/some-long-path", 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| UnicodeWidthStr::width(l.as_str()) <= 20));
        assert_eq!(lines.concat(), "https://example.com/some-long-path");
    }

    #[test]
    fn list_items_get_markers() {
        let lines = plain("- one\n- two\n", 20);
        assert_eq!(lines, vec![" •  one", "", " •  two"]);
        let lines = plain("9. a\n10. b\n", 20);
        assert_eq!(lines[0], " 9. a");
        assert_eq!(lines[2], "10. b");
    }

    #[test]
    fn blockquotes_are_barred() {
        let lines = plain("> a quote", 20);
        assert_eq!(lines, vec!["│ a quote"]);
    }

    #[test]
    fn code_blocks_are_indented_and_unwrapped() {
        let lines = plain("```\nlet x = 1;\n```\n", 6);
        assert_eq!(lines, vec!["    let x = 1;"]);
    }

    #[test]
    fn normalized_html_lists_keep_their_indent() {
        let src = crate::html::normalize_html_lists("<ul><li>a<ul><li>b</li></ul></li></ul>");
        let lines = plain(&src, 20);
        assert_eq!(lines, vec!["\u{a0}\u{a0}• a", "\u{a0}\u{a0}\u{a0}\u{a0}• b"]);
    }

    #[test]
    fn superscripts_use_superscript_glyphs() {
        assert_eq!(plain("x<sup>2</sup>", 20), vec!["x²"]);
    }

    #[test]
    fn subscripts_use_subscript_glyphs() {
        assert_eq!(plain("H<sub>2</sub>O", 20), vec!["H₂O"]);
    }

    #[test]
    fn tables_render_with_separators() {
        let lines = plain("| a | bb |\n|---|---|\n| 1 | 2 |\n", 40);
        assert_eq!(lines, vec![" a │ bb ", "───┼────", " 1 │ 2  "]);
    }

    #[test]
    fn flex_tables_share_the_width() {
        let sheet = StyleSheet {
            table_column_width: TableColumnWidth::Flex,
            ..StyleSheet::default()
        };
        let lines = render("| a | b |\n|---|---|\n| 1 | 2 |\n", sheet, 11);
        assert!(lines.iter().all(|l| UnicodeWidthStr::width(l.as_str()) == 11));
    }

    #[test]
    fn natural_width_covers_the_widest_line() {
        let nodes = MarkdownParser::new().parse("short\n\na much longer line");
        let mut builder = MarkdownBuilder::new(StyleSheet::default(), BuilderOptions::default())
            .expect("valid style sheet");
        let tree = builder.build(&nodes);
        let widest = tree.nodes().iter().map(natural_width).max();
        assert_eq!(widest, Some(18));
    }

    #[test]
    fn truncation_appends_an_ellipsis() {
        let spans = vec![Span::raw("abcdef")];
        let out = truncate_spans_with_ellipsis(spans, 4, Style::default());
        assert_eq!(spans_plain(&out), "abc…");
    }
}
