use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;

use crate::scroll::ScrollOffsets;

/// Fills `area` (intersected with the buffer) with blanks in `style`.
pub fn fill_rect(buf: &mut Buffer, area: Rect, style: Style) {
    let area = area.intersection(buf.area);
    if area.is_empty() {
        return;
    }
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.reset();
                cell.set_style(style);
            }
        }
    }
}

/// Paints a vertical scrollbar track for `state` into a one-column `area`.
pub fn render_scrollbar_y(area: Rect, buf: &mut Buffer, state: &ScrollOffsets, style: Style) {
    buf.set_style(area, style);
    if area.height == 0 {
        return;
    }
    let (top, len) = thumb(area.height, state.y, state.viewport_h, state.content_h);
    for dy in 0..area.height {
        let ch = if dy >= top && dy < top + len { "█" } else { " " };
        buf.set_stringn(area.x, area.y + dy, ch, 1, style);
    }
}

/// Paints a horizontal scrollbar track for `state` into a one-row `area`.
pub fn render_scrollbar_x(area: Rect, buf: &mut Buffer, state: &ScrollOffsets, style: Style) {
    buf.set_style(area, style);
    if area.width == 0 {
        return;
    }
    let (left, len) = thumb(area.width, state.x, state.viewport_w, state.content_w);
    for dx in 0..area.width {
        let ch = if dx >= left && dx < left + len { "▀" } else { " " };
        buf.set_stringn(area.x + dx, area.y, ch, 1, style);
    }
}

fn thumb(track: u16, offset: f32, viewport: f32, content: f32) -> (u16, u16) {
    if content <= viewport || content <= 0.0 {
        return (0, 0);
    }
    let track_f = track as f32;
    let len = ((viewport / content) * track_f).round().clamp(1.0, track_f) as u16;
    let max = (content - viewport).max(1.0);
    let start = ((offset / max) * (track_f - len as f32))
        .round()
        .clamp(0.0, (track_f - len as f32).max(0.0)) as u16;
    (start, len)
}

/// Paints `spans` on row `y` starting at `x`, skipping the first `start_col` columns of content
/// and painting at most `max_cols` columns.
///
/// Wide characters that straddle either clip edge are dropped rather than split.
pub fn render_spans_clipped(
    x: u16,
    y: u16,
    start_col: u32,
    max_cols: u16,
    buf: &mut Buffer,
    spans: &[Span<'static>],
    fallback_style: Style,
) {
    if max_cols == 0 {
        return;
    }

    let start_col = start_col as usize;
    let max_cols = max_cols as usize;
    let mut col = 0usize;
    let mut out_cols = 0usize;
    let mut dx = 0u16;
    let mut tmp = [0u8; 4];

    for span in spans {
        let style = fallback_style.patch(span.style);
        for ch in span.content.chars() {
            if ch == '\t' {
                for _ in 0..4 {
                    if col < start_col {
                        col += 1;
                        continue;
                    }
                    if out_cols + 1 > max_cols {
                        return;
                    }
                    if let Some(cell) = buf.cell_mut((x + dx, y)) {
                        cell.set_style(style);
                        cell.set_symbol(" ");
                    }
                    dx += 1;
                    out_cols += 1;
                    col += 1;
                }
                continue;
            }

            let w = UnicodeWidthChar::width(ch).unwrap_or(0);
            if w == 0 {
                continue;
            }
            if col + w <= start_col {
                col += w;
                continue;
            }
            if col < start_col && col + w > start_col {
                col += w;
                continue;
            }
            if out_cols + w > max_cols {
                return;
            }

            let s = ch.encode_utf8(&mut tmp);
            if let Some(cell) = buf.cell_mut((x + dx, y)) {
                cell.set_style(style);
                cell.set_symbol(s);
            }
            dx += 1;
            out_cols += 1;
            col += w;

            if w == 2 {
                if let Some(cell) = buf.cell_mut((x + dx, y)) {
                    cell.set_style(style);
                    cell.set_symbol("");
                }
                dx += 1;
                out_cols += 1;
            }
        }
    }
}

/// Returns the plain text of `spans`.
pub fn spans_plain(spans: &[Span<'_>]) -> String {
    let mut out = String::new();
    for s in spans {
        out.push_str(s.content.as_ref());
    }
    out
}
