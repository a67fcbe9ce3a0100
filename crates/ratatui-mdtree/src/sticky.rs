//! A table painter that keeps leading rows and columns pinned while the rest scrolls.
//!
//! [`StickyTable`] holds already laid-out cells on a fixed grid. [`StickyTableRenderer`] paints
//! it into a viewport in four passes: the scrolled base table, the pinned rows, the pinned
//! columns, and finally their top-left intersection. Each overlay repaints only the cells it
//! covers, and changing what is pinned invalidates the paint, never the grid geometry.
use std::ops::Range;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui_mdtree_core::render::fill_rect;
use ratatui_mdtree_core::render::render_spans_clipped;
use thiserror::Error;

use crate::layout;
use crate::style::TableVerticalAlign;
use crate::table::TableGrid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StickyTableError {
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{found} column widths given for {expected} columns")]
    ColumnWidthCount { expected: usize, found: usize },
}

/// One laid-out cell: its lines (already padded to the column width) and an optional fill.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StickyCell {
    pub lines: Vec<Line<'static>>,
    pub background: Option<Color>,
}

impl StickyCell {
    pub fn new(lines: Vec<Line<'static>>) -> Self {
        Self {
            lines,
            background: None,
        }
    }

    pub fn with_background(mut self, background: Option<Color>) -> Self {
        self.background = background;
        self
    }
}

/// A row-major grid of laid-out cells with fixed column widths.
///
/// Columns are separated by a one-column gap, painted with the separator style when one is set.
#[derive(Clone, Debug, PartialEq)]
pub struct StickyTable {
    columns: usize,
    cells: Vec<StickyCell>,
    column_widths: Vec<u16>,
    /// Prefix sums: `col_x[c]` is the content x of column `c`; the last entry is the width.
    col_x: Vec<u32>,
    row_y: Vec<u32>,
    separator: Option<Style>,
}

impl StickyTable {
    /// Builds a table from rows of cells. Every row must have exactly one cell per column width.
    pub fn new(
        rows: Vec<Vec<StickyCell>>,
        column_widths: Vec<u16>,
    ) -> Result<Self, StickyTableError> {
        let columns = rows.first().map_or(column_widths.len(), Vec::len);
        if column_widths.len() != columns {
            return Err(StickyTableError::ColumnWidthCount {
                expected: columns,
                found: column_widths.len(),
            });
        }
        if let Some((row, cells)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
            return Err(StickyTableError::RaggedRows {
                row,
                expected: columns,
                found: cells.len(),
            });
        }

        let mut col_x = Vec::with_capacity(columns + 1);
        let mut x = 0u32;
        for (i, w) in column_widths.iter().enumerate() {
            if i > 0 {
                x += 1;
            }
            col_x.push(x);
            x += u32::from(*w);
        }
        col_x.push(x);

        let mut row_y = Vec::with_capacity(rows.len() + 1);
        let mut y = 0u32;
        for row in &rows {
            row_y.push(y);
            y += row.iter().map(|c| c.lines.len()).max().unwrap_or(0).max(1) as u32;
        }
        row_y.push(y);

        Ok(Self {
            columns,
            cells: rows.into_iter().flatten().collect(),
            column_widths,
            col_x,
            row_y,
            separator: None,
        })
    }

    /// Lays a table grid out at its natural column widths.
    pub fn from_grid(grid: &TableGrid) -> Result<Self, StickyTableError> {
        Self::from_grid_at_scale(grid, 1.0)
    }

    /// Lays a table grid out with every natural column width multiplied by `scale` (at least 1).
    pub fn from_grid_at_scale(grid: &TableGrid, scale: f32) -> Result<Self, StickyTableError> {
        let scale = if scale.is_finite() { scale.max(1.0) } else { 1.0 };
        let natural: Vec<u16> = layout::natural_column_widths(grid)
            .into_iter()
            .map(|w| ((f32::from(w) * scale).round() as u16).max(w))
            .collect();
        let pad = grid.cell_padding;
        let rows = grid
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<Vec<Line<'static>>> = row
                    .cells
                    .iter()
                    .zip(&natural)
                    .map(|(cell, w)| {
                        layout::cell_lines(cell, *w, false)
                            .into_iter()
                            .map(|spans| {
                                let mut padded: Vec<Span<'static>> =
                                    Vec::with_capacity(spans.len() + 2);
                                padded.push(Span::raw(" ".repeat(pad.left as usize)));
                                padded.extend(spans);
                                padded.push(Span::raw(" ".repeat(pad.right as usize)));
                                Line::from(padded)
                            })
                            .collect()
                    })
                    .collect();
                let height = cells.iter().map(Vec::len).max().unwrap_or(1);
                cells
                    .into_iter()
                    .map(|lines| {
                        StickyCell::new(align_vertically(lines, height, grid.vertical_align))
                            .with_background(row.background)
                    })
                    .collect()
            })
            .collect();
        let widths = natural.iter().map(|w| w.saturating_add(pad.width())).collect();
        Ok(Self::new(rows, widths)?.with_separator(grid.border))
    }

    pub fn with_separator(mut self, separator: Option<Style>) -> Self {
        self.separator = separator;
        self
    }

    pub fn row_count(&self) -> usize {
        self.row_y.len() - 1
    }

    pub fn column_count(&self) -> usize {
        self.columns
    }

    pub fn column_widths(&self) -> &[u16] {
        &self.column_widths
    }

    pub fn width(&self) -> u32 {
        self.col_x.last().copied().unwrap_or(0)
    }

    pub fn height(&self) -> u32 {
        self.row_y.last().copied().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&StickyCell> {
        if col >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + col)
    }

    /// Width spanned by the first `count` columns, including the gaps between them.
    fn leading_width(&self, count: usize) -> u32 {
        if count == 0 {
            return 0;
        }
        self.col_x[count.min(self.columns)]
            - u32::from(count < self.columns)
    }

    fn leading_height(&self, count: usize) -> u32 {
        self.row_y[count.min(self.row_count())]
    }

    fn rows_within(&self, top: u32, bottom: u32) -> Range<usize> {
        let rows = self.row_count();
        let first = self.row_y[1..].partition_point(|end| *end <= top);
        let last = self.row_y[..rows].partition_point(|start| *start < bottom);
        first..last.max(first)
    }

    fn columns_within(&self, left: u32, right: u32) -> Range<usize> {
        // A column's separator sits just left of it.
        let first = self.col_x[1..].partition_point(|end| *end <= left);
        let last = self.col_x[..self.columns].partition_point(|start| start.saturating_sub(1) < right);
        first..last.max(first)
    }

    fn paint_cell(
        &self,
        row: usize,
        col: usize,
        origin: (i64, i64),
        clip: Rect,
        buf: &mut Buffer,
    ) {
        let Some(cell) = self.cell(row, col) else {
            return;
        };
        let width = self.column_widths[col];
        let height = self.row_y[row + 1] - self.row_y[row];
        let (ox, oy) = origin;

        let base = cell
            .background
            .map_or(Style::default(), |bg| Style::default().bg(bg));
        if let Some(rect) = clip_rect(ox, oy, u32::from(width), height, clip)
            && cell.background.is_some()
        {
            buf.set_style(rect, base);
        }

        for (li, line) in cell.lines.iter().enumerate() {
            let y = oy + li as i64;
            if y < i64::from(clip.top()) || y >= i64::from(clip.bottom()) {
                continue;
            }
            let x = ox.max(i64::from(clip.left()));
            let right = (ox + i64::from(width)).min(i64::from(clip.right()));
            if right <= x {
                continue;
            }
            render_spans_clipped(
                x as u16,
                y as u16,
                (x - ox) as u32,
                (right - x) as u16,
                buf,
                &line.spans,
                base.patch(line.style),
            );
        }

        if col > 0
            && let Some(style) = self.separator
        {
            let sx = ox - 1;
            if sx >= i64::from(clip.left()) && sx < i64::from(clip.right()) {
                for dy in 0..i64::from(height) {
                    let y = oy + dy;
                    if y >= i64::from(clip.top()) && y < i64::from(clip.bottom()) {
                        buf.set_string(sx as u16, y as u16, "│", style);
                    }
                }
            }
        }
    }

    /// Paints `rows` × `columns` with content point `shift` at the top-left of `area`, clipped to
    /// `clip`.
    fn paint_region(
        &self,
        rows: Range<usize>,
        columns: Range<usize>,
        area: Rect,
        shift: (u32, u32),
        clip: Rect,
        buf: &mut Buffer,
    ) {
        if clip.is_empty() {
            return;
        }
        let top = shift.1 + u32::from(clip.top() - area.top());
        let left = shift.0 + u32::from(clip.left() - area.left());
        let visible_rows = self.rows_within(top, top + u32::from(clip.height));
        let visible_cols = self.columns_within(left, left + u32::from(clip.width));
        let rows = rows.start.max(visible_rows.start)..rows.end.min(visible_rows.end);
        let columns = columns.start.max(visible_cols.start)..columns.end.min(visible_cols.end);
        for row in rows {
            for col in columns.clone() {
                let ox = i64::from(area.x) + i64::from(self.col_x[col]) - i64::from(shift.0);
                let oy = i64::from(area.y) + i64::from(self.row_y[row]) - i64::from(shift.1);
                self.paint_cell(row, col, (ox, oy), clip, buf);
            }
        }
    }
}

fn align_vertically(
    mut lines: Vec<Line<'static>>,
    height: usize,
    align: TableVerticalAlign,
) -> Vec<Line<'static>> {
    let spare = height.saturating_sub(lines.len());
    let top = match align {
        TableVerticalAlign::Top | TableVerticalAlign::Baseline => 0,
        TableVerticalAlign::Middle => spare / 2,
        TableVerticalAlign::Bottom => spare,
    };
    if top > 0 {
        lines.splice(0..0, (0..top).map(|_| Line::default()));
    }
    lines
}

fn clip_rect(x: i64, y: i64, w: u32, h: u32, clip: Rect) -> Option<Rect> {
    let left = x.max(i64::from(clip.left()));
    let top = y.max(i64::from(clip.top()));
    let right = (x + i64::from(w)).min(i64::from(clip.right()));
    let bottom = (y + i64::from(h)).min(i64::from(clip.bottom()));
    (right > left && bottom > top).then(|| {
        Rect::new(
            left as u16,
            top as u16,
            (right - left) as u16,
            (bottom - top) as u16,
        )
    })
}

/// Where the table is scrolled to and how much of the area is usable.
///
/// `viewport_width`/`viewport_height` default to the paint area. `right_gutter` and
/// `bottom_gutter` are the columns/rows taken by scrollbars; overlays never paint into them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StickyTableViewport {
    pub horizontal_offset: f32,
    pub vertical_offset: f32,
    pub viewport_width: Option<f32>,
    pub viewport_height: Option<f32>,
    pub right_gutter: f32,
    pub bottom_gutter: f32,
}

impl StickyTableViewport {
    fn offsets(&self) -> (u32, u32) {
        (to_cells(self.horizontal_offset), to_cells(self.vertical_offset))
    }

    /// The usable part of `area`.
    fn available(&self, area: Rect) -> Rect {
        let width = self
            .viewport_width
            .map_or(f32::from(area.width), |w| w.min(f32::from(area.width)));
        let height = self
            .viewport_height
            .map_or(f32::from(area.height), |h| h.min(f32::from(area.height)));
        Rect::new(
            area.x,
            area.y,
            to_cells(width - self.right_gutter).min(u32::from(area.width)) as u16,
            to_cells(height - self.bottom_gutter).min(u32::from(area.height)) as u16,
        )
    }
}

fn to_cells(value: f32) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

/// What is pinned, derived on every paint from the sticky counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StickyMode {
    None,
    Rows,
    Columns,
    Both,
}

impl StickyMode {
    pub fn from_counts(rows: usize, columns: usize) -> Self {
        match (rows > 0, columns > 0) {
            (false, false) => StickyMode::None,
            (true, false) => StickyMode::Rows,
            (false, true) => StickyMode::Columns,
            (true, true) => StickyMode::Both,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayRegion {
    Rows,
    Columns,
    Intersection,
}

/// One overlay pass: the cells it repaints, where it may paint, and the content point shown at
/// the top-left of the paint area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayPlan {
    pub region: OverlayRegion,
    pub rows: Range<usize>,
    pub columns: Range<usize>,
    pub clip: Rect,
    pub shift: (u32, u32),
}

#[derive(Clone, Debug)]
pub struct StickyTableRenderer {
    table: StickyTable,
    sticky_rows: usize,
    sticky_columns: usize,
    viewport: StickyTableViewport,
    column_max_fraction: f32,
    background: Option<Color>,
    needs_paint: bool,
}

impl StickyTableRenderer {
    pub fn new(table: StickyTable) -> Self {
        Self {
            table,
            sticky_rows: 0,
            sticky_columns: 0,
            viewport: StickyTableViewport::default(),
            column_max_fraction: 0.5,
            background: None,
            needs_paint: true,
        }
    }

    pub fn table(&self) -> &StickyTable {
        &self.table
    }

    pub fn sticky_rows(&self) -> usize {
        self.sticky_rows
    }

    pub fn sticky_columns(&self) -> usize {
        self.sticky_columns
    }

    pub fn viewport(&self) -> &StickyTableViewport {
        &self.viewport
    }

    pub fn column_max_fraction(&self) -> f32 {
        self.column_max_fraction
    }

    pub fn background(&self) -> Option<Color> {
        self.background
    }

    /// Swaps in a re-laid-out table, keeping pins (clamped to the new grid), viewport and
    /// overlay styling.
    pub fn set_table(&mut self, table: StickyTable) {
        self.table = table;
        self.sticky_rows = self.sticky_rows.min(self.table.row_count());
        self.sticky_columns = self.sticky_columns.min(self.table.column_count());
        self.needs_paint = true;
    }

    pub fn mode(&self) -> StickyMode {
        StickyMode::from_counts(self.sticky_rows, self.sticky_columns)
    }

    /// Whether something changed since the last [`StickyTableRenderer::render`].
    pub fn needs_paint(&self) -> bool {
        self.needs_paint
    }

    fn update<T: PartialEq>(needs_paint: &mut bool, slot: &mut T, value: T) {
        if *slot != value {
            *slot = value;
            *needs_paint = true;
        }
    }

    /// Pins the first `count` rows, clamped to the row count.
    pub fn set_sticky_rows(&mut self, count: usize) {
        let count = count.min(self.table.row_count());
        Self::update(&mut self.needs_paint, &mut self.sticky_rows, count);
    }

    pub fn set_sticky_columns(&mut self, count: usize) {
        let count = count.min(self.table.column_count());
        Self::update(&mut self.needs_paint, &mut self.sticky_columns, count);
    }

    pub fn set_viewport(&mut self, viewport: StickyTableViewport) {
        Self::update(&mut self.needs_paint, &mut self.viewport, viewport);
    }

    /// Caps pinned columns to this fraction of the usable width.
    pub fn set_column_max_fraction(&mut self, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        Self::update(&mut self.needs_paint, &mut self.column_max_fraction, fraction);
    }

    pub fn set_background(&mut self, background: Option<Color>) {
        Self::update(&mut self.needs_paint, &mut self.background, background);
    }

    /// The overlay passes for a paint into `area`, in paint order.
    pub fn overlay_plan(&self, area: Rect) -> Vec<OverlayPlan> {
        let available = self.viewport.available(area);
        let (h, v) = self.viewport.offsets();
        let rows = self.table.row_count();
        let columns = self.table.column_count();
        let (r, c) = (self.sticky_rows.min(rows), self.sticky_columns.min(columns));

        let rows_height = self.table.leading_height(r).min(u32::from(available.height)) as u16;
        let max_cols_width = (f32::from(available.width) * self.column_max_fraction).floor() as u32;
        let cols_width = self
            .table
            .leading_width(c)
            .min(max_cols_width)
            .min(u32::from(available.width)) as u16;

        let mut plan = Vec::with_capacity(3);
        if r > 0 {
            plan.push(OverlayPlan {
                region: OverlayRegion::Rows,
                rows: 0..r,
                columns: c..columns,
                clip: Rect::new(available.x, available.y, available.width, rows_height),
                shift: (h, 0),
            });
        }
        if c > 0 {
            plan.push(OverlayPlan {
                region: OverlayRegion::Columns,
                rows: r..rows,
                columns: 0..c,
                clip: Rect::new(available.x, available.y, cols_width, available.height),
                shift: (0, v),
            });
        }
        if r > 0 && c > 0 {
            plan.push(OverlayPlan {
                region: OverlayRegion::Intersection,
                rows: 0..r,
                columns: 0..c,
                clip: Rect::new(available.x, available.y, cols_width, rows_height),
                shift: (0, 0),
            });
        }
        plan
    }

    /// Paints the scrolled table into `area`, then each overlay on top.
    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        let available = self.viewport.available(area);
        let table = &self.table;
        table.paint_region(
            0..table.row_count(),
            0..table.column_count(),
            area,
            self.viewport.offsets(),
            available,
            buf,
        );

        let plan = self.overlay_plan(area);
        if !plan.is_empty() {
            log::trace!("sticky overlay plan: {plan:?}");
        }
        for pass in plan {
            if let Some(bg) = self.background {
                fill_rect(buf, pass.clip, Style::default().bg(bg));
            }
            table.paint_region(pass.rows, pass.columns, area, pass.shift, pass.clip, buf);
        }
        self.needs_paint = false;
    }
}
