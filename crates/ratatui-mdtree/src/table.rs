//! Table assembly and the inline zoom wrapper.
//!
//! While the builder walks a `table` element it collects rows into a [`TableAccumulator`]; on
//! exit [`assemble`] turns them into a [`Table`] whose every row has exactly as many cells as the
//! header, and picks how the table is presented.
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui_mdtree_core::measure::DeferredMeasure;
use ratatui_mdtree_core::measure::LAYOUT_TOLERANCE;
use ratatui_mdtree_core::style::TextStyle;

use crate::ast::Element;
use crate::layout;
use crate::style::Padding;
use crate::style::StyleSheet;
use crate::style::TableColumnWidth;
use crate::style::TableVerticalAlign;
use crate::style::TextAlign;
use crate::style::TextBaseline;
use crate::tree::InlineNode;
use crate::tree::RenderNode;

#[derive(Clone, Debug, PartialEq)]
pub struct TableCell {
    pub align: TextAlign,
    pub style: TextStyle,
    pub children: Vec<InlineNode>,
}

impl TableCell {
    fn empty(align: TextAlign, style: TextStyle) -> Self {
        Self {
            align,
            style,
            children: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub background: Option<Color>,
    pub is_header: bool,
}

/// Resolved width of one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnWidth {
    Flex,
    Fixed(u16),
}

/// The cells of a table, normalized to a rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct TableGrid {
    pub rows: Vec<TableRow>,
    pub column_widths: Vec<ColumnWidth>,
    pub border: Option<Style>,
    pub cell_padding: Padding,
    pub vertical_align: TableVerticalAlign,
    pub text_baseline: Option<TextBaseline>,
}

impl TableGrid {
    pub fn column_count(&self) -> usize {
        self.column_widths.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn header_rows(&self) -> usize {
        self.rows.iter().take_while(|r| r.is_header).count()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TablePresentation {
    Plain,
    /// Laid out at natural width; the host scrolls it horizontally.
    Scrollable,
    Zoomable(ZoomableTable),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub grid: TableGrid,
    pub presentation: TablePresentation,
}

impl Table {
    pub fn zoomable(&self) -> Option<&ZoomableTable> {
        match &self.presentation {
            TablePresentation::Zoomable(zoom) => Some(zoom),
            _ => None,
        }
    }
}

/// Row collected while the builder is inside a `table`.
#[derive(Debug)]
pub(crate) struct RowRecord {
    cells: Vec<TableCell>,
    background: Option<Color>,
    is_header: bool,
}

#[derive(Debug)]
pub(crate) struct TableAccumulator {
    source: Element,
    rows: Vec<RowRecord>,
}

impl TableAccumulator {
    pub(crate) fn new(source: Element) -> Self {
        Self {
            source,
            rows: Vec::new(),
        }
    }

    /// Starts a row. Rows after the first alternate, and every even one gets `stripe`.
    pub(crate) fn push_row(&mut self, stripe: Option<Color>, is_header: bool) {
        let index = self.rows.len();
        let background = if index > 0 && index % 2 == 0 {
            stripe
        } else {
            None
        };
        self.rows.push(RowRecord {
            cells: Vec::new(),
            background,
            is_header,
        });
    }

    pub(crate) fn push_cell(&mut self, cell: TableCell) {
        match self.rows.last_mut() {
            Some(row) => row.cells.push(cell),
            None => log::warn!("dropping table cell outside of a row"),
        }
    }
}

/// Finishes a table: normalizes rows to the header's column count and picks a presentation.
///
/// A table without rows, or whose header has no cells, renders as nothing.
pub(crate) fn assemble(acc: TableAccumulator, sheet: &StyleSheet) -> RenderNode {
    let Some(columns) = acc.rows.first().map(|r| r.cells.len()) else {
        return RenderNode::Empty;
    };
    if columns == 0 {
        return RenderNode::Empty;
    }

    let body_style = sheet.style("table_body").cloned().unwrap_or_default();
    let rows: Vec<TableRow> = acc
        .rows
        .into_iter()
        .map(|mut row| {
            if row.cells.len() > columns {
                log::debug!(
                    "dropping {} extra table cell(s)",
                    row.cells.len() - columns
                );
                row.cells.truncate(columns);
            }
            while row.cells.len() < columns {
                row.cells
                    .push(TableCell::empty(TextAlign::Left, body_style.clone()));
            }
            TableRow {
                cells: row.cells,
                background: row.background,
                is_header: row.is_header,
            }
        })
        .collect();

    let column_widths = match sheet.table_column_width {
        TableColumnWidth::Flex => vec![ColumnWidth::Flex; columns],
        TableColumnWidth::Fixed(width) => vec![ColumnWidth::Fixed(width); columns],
        TableColumnWidth::Intrinsic => (0..columns)
            .map(|col| {
                let widest = rows
                    .iter()
                    .map(|row| layout::inline_width(&row.cells[col].children))
                    .max()
                    .unwrap_or(0);
                ColumnWidth::Fixed(widest.max(1))
            })
            .collect(),
    };

    let grid = TableGrid {
        rows,
        column_widths,
        border: sheet.table_border,
        cell_padding: sheet.table_cell_padding,
        vertical_align: sheet.table_vertical_alignment,
        text_baseline: sheet.table_text_baseline,
    };

    let presentation = if sheet.enable_interactive_table {
        TablePresentation::Zoomable(ZoomableTable::new(acc.source, sheet))
    } else {
        match sheet.table_column_width {
            TableColumnWidth::Fixed(_) | TableColumnWidth::Intrinsic => {
                TablePresentation::Scrollable
            }
            TableColumnWidth::Flex => TablePresentation::Plain,
        }
    };
    log::trace!(
        "assembled {}x{} table ({presentation:?})",
        grid.row_count(),
        grid.column_count()
    );
    RenderNode::Table(Table { grid, presentation })
}

/// Scale that fits `natural` into `available`, or 1.0 when fitting would shrink the table below
/// `min_fraction` of its natural size.
pub fn fit_scale(natural: f32, available: f32, min_fraction: f32) -> f32 {
    if natural <= 0.0 || available >= natural {
        return 1.0;
    }
    let scale = available / natural;
    if scale >= min_fraction { scale } else { 1.0 }
}

/// An inline table that shrinks to fit its column when it can, and expands into an interactive
/// view on tap.
///
/// The natural width is only known after a frame, so fitting follows the deferred measurement
/// protocol: [`ZoomableTable::request_measure`] while laying out, then
/// [`ZoomableTable::on_post_frame`] with the measured width.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomableTable {
    source: Element,
    min_viewport_fraction: f32,
    min_column_width: u16,
    measure: DeferredMeasure<f32>,
    available: Option<f32>,
    scale: f32,
}

impl ZoomableTable {
    fn new(source: Element, sheet: &StyleSheet) -> Self {
        Self {
            source,
            min_viewport_fraction: sheet.inline_table_min_viewport_fraction,
            min_column_width: sheet.inline_table_min_column_width,
            measure: DeferredMeasure::new(LAYOUT_TOLERANCE),
            available: None,
            scale: 1.0,
        }
    }

    /// The table element this wrapper was built from, for rebuilding it in an expanded view.
    pub fn source(&self) -> &Element {
        &self.source
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn min_column_width(&self) -> u16 {
        self.min_column_width
    }

    /// Tapping expands the table only while it is shown shrunk.
    pub fn can_expand(&self) -> bool {
        self.scale < 1.0
    }

    /// Display scale for `available` columns, from the last committed natural width.
    pub fn fit(&self, available: f32) -> f32 {
        self.measure.value().map_or(1.0, |natural| {
            fit_scale(natural, available, self.min_viewport_fraction)
        })
    }

    pub fn request_measure(&mut self) -> bool {
        self.measure.request()
    }

    /// Commits the natural width measured after a frame laid out in `available` columns.
    ///
    /// Returns `true` when the scale changed and the table must be laid out again.
    pub fn on_post_frame(&mut self, natural: f32, available: f32) -> bool {
        let natural_changed = self.measure.commit(natural);
        let available_changed = self
            .available
            .is_none_or(|prev| (prev - available).abs() > LAYOUT_TOLERANCE);
        if !natural_changed && !available_changed {
            return false;
        }
        self.available = Some(available);
        if self.measure.value().is_none() {
            return false;
        }
        let scale = self.fit(available);
        if (scale - self.scale).abs() <= f32::EPSILON {
            return false;
        }
        log::debug!("inline table scale {:.2} -> {scale:.2}", self.scale);
        self.scale = scale;
        true
    }
}
