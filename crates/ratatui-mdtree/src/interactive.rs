//! Full-screen view of a table that was too wide to show inline.
//!
//! The view rebuilds the table from its source markup at intrinsic column widths and paints it
//! through a [`StickyTableRenderer`], with the header row (and optionally the first column)
//! pinned. It scrolls on keys and wheel, zooms on multi-pointer pinch gestures, and closes on
//! `Esc`/`q`.
//!
//! Size changes follow the deferred measurement protocol: [`InteractiveTableView::render`]
//! records the area and requests a measurement, and the host calls
//! [`InteractiveTableView::on_post_frame`] once the frame is on screen.
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Style;
use ratatui_mdtree_core::input::GesturePhase;
use ratatui_mdtree_core::input::InputEvent;
use ratatui_mdtree_core::input::KeyCode;
use ratatui_mdtree_core::input::KeyEvent;
use ratatui_mdtree_core::input::MouseEvent;
use ratatui_mdtree_core::input::MouseEventKind;
use ratatui_mdtree_core::input::ScaleEvent;
use ratatui_mdtree_core::input::key_char;
use ratatui_mdtree_core::measure::DeferredMeasure;
use ratatui_mdtree_core::measure::LAYOUT_TOLERANCE;
use ratatui_mdtree_core::render;
use ratatui_mdtree_core::scroll::ScrollBindings;
use ratatui_mdtree_core::scroll::ScrollOffsets;
use thiserror::Error;

use crate::ast::Element;
use crate::ast::Node;
use crate::builder::BuildError;
use crate::builder::BuilderOptions;
use crate::builder::MarkdownBuilder;
use crate::sticky::StickyTable;
use crate::sticky::StickyTableError;
use crate::sticky::StickyTableRenderer;
use crate::sticky::StickyTableViewport;
use crate::style::StyleSheet;
use crate::style::TableColumnWidth;
use crate::table::TableGrid;

pub const MIN_SCALE: f32 = 1.0;
pub const MAX_SCALE: f32 = 3.0;

#[derive(Debug, Error)]
pub enum InteractiveError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Layout(#[from] StickyTableError),
    #[error("source element does not contain a table")]
    NoTable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractiveAction {
    None,
    /// Only the paint changed (scroll position, sticky state).
    Repaint,
    /// The table geometry changed and must be laid out again.
    Relayout,
    /// The view accepted a close request; it finishes closing after the next frame.
    CloseRequested,
    /// The deferred close completed; the host should drop the view.
    Closed,
}

#[derive(Clone, Debug)]
pub struct InteractiveOptions {
    pub bindings: ScrollBindings,
    pub close_keys: Vec<KeyEvent>,
    pub scrollbar_style: Style,
    pub show_scrollbars: bool,
}

impl Default for InteractiveOptions {
    fn default() -> Self {
        Self {
            bindings: ScrollBindings::default(),
            close_keys: vec![KeyEvent::new(KeyCode::Esc), key_char('q')],
            scrollbar_style: Style::default().fg(Color::DarkGray),
            show_scrollbars: true,
        }
    }
}

pub struct InteractiveTableView {
    grid: TableGrid,
    renderer: StickyTableRenderer,
    scroll: ScrollOffsets,
    options: InteractiveOptions,
    scale: f32,
    gesture_base: Option<f32>,
    size: DeferredMeasure<(f32, f32)>,
    last_area: Option<Rect>,
    closing: bool,
    closed: bool,
}

impl InteractiveTableView {
    /// Builds the view for the first table under `source` (usually a zoomable table's source).
    pub fn open(
        source: &Element,
        style_sheet: &StyleSheet,
        builder_options: &BuilderOptions,
    ) -> Result<Self, InteractiveError> {
        let sheet = StyleSheet {
            table_column_width: TableColumnWidth::Intrinsic,
            enable_interactive_table: false,
            ..style_sheet.clone()
        };
        let mut builder = MarkdownBuilder::new(sheet, builder_options.clone())?;
        let tree = builder.build(&[Node::Element(source.clone())]);
        let grid = tree
            .tables()
            .first()
            .map(|t| t.grid.clone())
            .ok_or(InteractiveError::NoTable)?;

        let mut renderer = StickyTableRenderer::new(StickyTable::from_grid(&grid)?);
        if style_sheet.enable_sticky_header {
            renderer.set_sticky_rows(grid.header_rows());
        }
        if style_sheet.enable_sticky_column {
            renderer.set_sticky_columns(1);
        }
        renderer.set_column_max_fraction(style_sheet.sticky_column_max_viewport_fraction);
        renderer.set_background(style_sheet.sticky_background);

        let mut scroll = ScrollOffsets::default();
        let table = renderer.table();
        scroll.set_content(table.width() as f32, table.height() as f32);
        log::debug!(
            "opened interactive table {}x{}",
            grid.row_count(),
            grid.column_count()
        );
        Ok(Self {
            grid,
            renderer,
            scroll,
            options: InteractiveOptions::default(),
            scale: MIN_SCALE,
            gesture_base: None,
            size: DeferredMeasure::new(LAYOUT_TOLERANCE),
            last_area: None,
            closing: false,
            closed: false,
        })
    }

    pub fn with_options(mut self, options: InteractiveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn scroll(&self) -> &ScrollOffsets {
        &self.scroll
    }

    pub fn renderer(&self) -> &StickyTableRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut StickyTableRenderer {
        &mut self.renderer
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Starts closing. Returns `false` while a close is already in flight or done.
    pub fn request_close(&mut self) -> bool {
        if self.closing || self.closed {
            return false;
        }
        self.closing = true;
        true
    }

    pub fn handle_event(&mut self, event: InputEvent) -> InteractiveAction {
        if self.closed {
            return InteractiveAction::None;
        }
        match event {
            InputEvent::Key(key) => self.handle_key(&key),
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse),
            InputEvent::Scale(scale) => self.handle_scale(scale),
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> InteractiveAction {
        if self.options.close_keys.iter().any(|k| k.matches(key)) {
            return if self.request_close() {
                InteractiveAction::CloseRequested
            } else {
                InteractiveAction::None
            };
        }
        let Some(action) = self.options.bindings.action_for(key) else {
            return InteractiveAction::None;
        };
        let before = self.scroll;
        self.options.bindings.apply(&mut self.scroll, action);
        self.scrolled(before)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> InteractiveAction {
        let line = self.options.bindings.line_step;
        let horiz = self.options.bindings.horiz_step;
        let (dx, dy) = match mouse.kind {
            MouseEventKind::ScrollUp if mouse.modifiers.shift => (-horiz, 0.0),
            MouseEventKind::ScrollDown if mouse.modifiers.shift => (horiz, 0.0),
            MouseEventKind::ScrollUp => (0.0, -line * 3.0),
            MouseEventKind::ScrollDown => (0.0, line * 3.0),
            MouseEventKind::ScrollLeft => (-horiz, 0.0),
            MouseEventKind::ScrollRight => (horiz, 0.0),
            _ => return InteractiveAction::None,
        };
        let before = self.scroll;
        self.scroll.scroll_by(dx, dy);
        self.scrolled(before)
    }

    fn scrolled(&mut self, before: ScrollOffsets) -> InteractiveAction {
        if (before.x - self.scroll.x).abs() <= LAYOUT_TOLERANCE
            && (before.y - self.scroll.y).abs() <= LAYOUT_TOLERANCE
        {
            return InteractiveAction::None;
        }
        self.sync_viewport();
        InteractiveAction::Repaint
    }

    /// Pinch zoom. Single-pointer gestures never scale.
    fn handle_scale(&mut self, event: ScaleEvent) -> InteractiveAction {
        if !event.is_multi_pointer() {
            return InteractiveAction::None;
        }
        match event.phase {
            GesturePhase::Start => {
                self.gesture_base = Some(self.scale);
                InteractiveAction::None
            }
            GesturePhase::Update => {
                // Updates outside a gesture (wheel zoom) are relative to the current scale.
                let base = self.gesture_base.unwrap_or(self.scale);
                self.set_scale(base * event.scale)
            }
            GesturePhase::End => {
                self.gesture_base = None;
                InteractiveAction::None
            }
        }
    }

    /// Sets the zoom, clamped to [`MIN_SCALE`, `MAX_SCALE`], keeping the same content point at
    /// the top-left of the viewport.
    pub fn set_scale(&mut self, scale: f32) -> InteractiveAction {
        let scale = if scale.is_finite() {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            MIN_SCALE
        };
        if (scale - self.scale).abs() <= f32::EPSILON {
            return InteractiveAction::None;
        }
        let table = match StickyTable::from_grid_at_scale(&self.grid, scale) {
            Ok(table) => table,
            Err(err) => {
                log::warn!("keeping scale {:.2}: {err}", self.scale);
                return InteractiveAction::None;
            }
        };
        let ratio = scale / self.scale;
        self.scale = scale;

        self.renderer.set_table(table);

        let (x, y) = (self.scroll.x * ratio, self.scroll.y);
        let table = self.renderer.table();
        self.scroll
            .set_content(table.width() as f32, table.height() as f32);
        self.scroll.x = x;
        self.scroll.y = y;
        self.scroll.clamp();
        self.sync_viewport();
        self.size.request();
        log::debug!("interactive table scale {scale:.2}");
        InteractiveAction::Relayout
    }

    /// Completes work deferred to after a frame: size measurement and closing.
    pub fn on_post_frame(&mut self) -> InteractiveAction {
        if self.closing {
            self.closing = false;
            self.closed = true;
            return InteractiveAction::Closed;
        }
        let Some(area) = self.last_area else {
            return InteractiveAction::None;
        };
        if self
            .size
            .commit((f32::from(area.width), f32::from(area.height)))
        {
            log::trace!("interactive table viewport {}x{}", area.width, area.height);
            return InteractiveAction::Relayout;
        }
        InteractiveAction::None
    }

    fn sync_viewport(&mut self) {
        let viewport = StickyTableViewport {
            horizontal_offset: self.scroll.x,
            vertical_offset: self.scroll.y,
            ..*self.renderer.viewport()
        };
        self.renderer.set_viewport(viewport);
    }

    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        if self.last_area != Some(area) {
            self.last_area = Some(area);
            self.size.request();
        }

        let table_w = self.renderer.table().width() as f32;
        let table_h = self.renderer.table().height() as f32;
        let show = self.options.show_scrollbars;
        let needs_y = show && area.width >= 2 && table_h > f32::from(area.height);
        let needs_x = show
            && area.height >= 2
            && table_w > f32::from(area.width) - if needs_y { 1.0 } else { 0.0 };
        let right_gutter = if needs_y { 1.0 } else { 0.0 };
        let bottom_gutter = if needs_x { 1.0 } else { 0.0 };

        self.scroll.set_viewport(
            f32::from(area.width) - right_gutter,
            f32::from(area.height) - bottom_gutter,
        );
        self.scroll.set_content(table_w, table_h);
        self.renderer.set_viewport(StickyTableViewport {
            horizontal_offset: self.scroll.x,
            vertical_offset: self.scroll.y,
            viewport_width: Some(f32::from(area.width)),
            viewport_height: Some(f32::from(area.height)),
            right_gutter,
            bottom_gutter,
        });
        self.renderer.render(area, buf);

        if needs_y {
            render::render_scrollbar_y(
                Rect::new(
                    area.right() - 1,
                    area.y,
                    1,
                    area.height - bottom_gutter as u16,
                ),
                buf,
                &self.scroll,
                self.options.scrollbar_style,
            );
        }
        if needs_x {
            render::render_scrollbar_x(
                Rect::new(
                    area.x,
                    area.bottom() - 1,
                    area.width - right_gutter as u16,
                    1,
                ),
                buf,
                &self.scroll,
                self.options.scrollbar_style,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MarkdownParser;
    use ratatui_mdtree_core::input::KeyModifiers;

    const SOURCE: &str = "| name | description |\n|---|---|\n| a | first entry |\n| b | second entry |\n| c | third entry |\n";

    fn table_element(src: &str) -> Element {
        let nodes = MarkdownParser::new().parse(src);
        match nodes.into_iter().next() {
            Some(Node::Element(el)) => el,
            other => panic!("expected a table element, got {other:?}"),
        }
    }

    fn open() -> InteractiveTableView {
        InteractiveTableView::open(
            &table_element(SOURCE),
            &StyleSheet::default(),
            &BuilderOptions::default(),
        )
        .expect("table opens")
    }

    fn pinch(phase: GesturePhase, pointers: usize, scale: f32) -> InputEvent {
        InputEvent::Scale(ScaleEvent {
            phase,
            pointer_count: pointers,
            scale,
        })
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).map(|c| c.symbol().to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn non_table_sources_are_rejected() {
        let err = InteractiveTableView::open(
            &table_element("just text"),
            &StyleSheet::default(),
            &BuilderOptions::default(),
        )
        .err();
        assert!(matches!(err, Some(InteractiveError::NoTable)));
    }

    #[test]
    fn header_is_pinned_by_default() {
        let view = open();
        assert_eq!(view.renderer().sticky_rows(), 1);
        assert_eq!(view.renderer().sticky_columns(), 0);
    }

    #[test]
    fn zooming_keeps_sticky_styling() {
        let sheet = StyleSheet {
            sticky_background: Some(Color::Blue),
            sticky_column_max_viewport_fraction: 0.8,
            enable_sticky_column: true,
            ..StyleSheet::default()
        };
        let mut view = InteractiveTableView::open(
            &table_element(SOURCE),
            &sheet,
            &BuilderOptions::default(),
        )
        .expect("table opens");
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);

        assert_eq!(view.set_scale(2.0), InteractiveAction::Relayout);
        assert_eq!(view.renderer().background(), Some(Color::Blue));
        assert_eq!(view.renderer().column_max_fraction(), 0.8);
        assert_eq!(view.renderer().sticky_rows(), 1);
        assert_eq!(view.renderer().sticky_columns(), 1);
        assert!(view.renderer().needs_paint());

        let mut buf = Buffer::empty(area);
        view.render(area, &mut buf);
        assert_eq!(buf.cell((0, 0)).map(|c| c.bg), Some(Color::Blue));
    }

    #[test]
    fn pinch_scale_is_clamped() {
        let mut view = open();
        view.handle_event(pinch(GesturePhase::Start, 2, 1.0));
        assert_eq!(
            view.handle_event(pinch(GesturePhase::Update, 2, 10.0)),
            InteractiveAction::Relayout
        );
        assert_eq!(view.scale(), MAX_SCALE);
        view.handle_event(pinch(GesturePhase::End, 2, 10.0));

        view.handle_event(pinch(GesturePhase::Start, 2, 1.0));
        view.handle_event(pinch(GesturePhase::Update, 2, 0.01));
        assert_eq!(view.scale(), MIN_SCALE);
    }

    #[test]
    fn single_pointer_gestures_do_not_scale() {
        let mut view = open();
        view.handle_event(pinch(GesturePhase::Start, 1, 1.0));
        assert_eq!(
            view.handle_event(pinch(GesturePhase::Update, 1, 2.0)),
            InteractiveAction::None
        );
        assert_eq!(view.scale(), 1.0);
    }

    #[test]
    fn zooming_widens_the_columns() {
        let mut view = open();
        let natural = view.renderer().table().width();
        view.set_scale(2.0);
        assert!(view.renderer().table().width() > natural);
        assert_eq!(view.renderer().sticky_rows(), 1);
    }

    #[test]
    fn close_is_guarded_until_the_frame_completes() {
        let mut view = open();
        let esc = InputEvent::Key(KeyEvent::new(KeyCode::Esc));
        assert_eq!(view.handle_event(esc.clone()), InteractiveAction::CloseRequested);
        assert!(view.is_closing());
        assert_eq!(view.handle_event(InputEvent::Key(key_char('q'))), InteractiveAction::None);
        assert!(!view.request_close());

        assert_eq!(view.on_post_frame(), InteractiveAction::Closed);
        assert!(view.is_closed());
        assert_eq!(view.handle_event(esc), InteractiveAction::None);
    }

    #[test]
    fn size_changes_relayout_once() {
        let mut view = open();
        let mut buf = Buffer::empty(Rect::new(0, 0, 12, 3));
        view.render(buf.area, &mut buf);
        assert_eq!(view.on_post_frame(), InteractiveAction::Relayout);
        view.render(buf.area, &mut buf);
        assert_eq!(view.on_post_frame(), InteractiveAction::None);
    }

    #[test]
    fn scrolling_keeps_the_header_on_top() {
        let mut view = open();
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 3));
        view.render(buf.area, &mut buf);
        assert!(row_text(&buf, 0).contains("name"));

        let wheel = InputEvent::Mouse(MouseEvent {
            x: 0,
            y: 0,
            kind: MouseEventKind::ScrollDown,
            modifiers: KeyModifiers::none(),
        });
        assert_eq!(view.handle_event(wheel), InteractiveAction::Repaint);
        assert!(view.scroll().y > 0.0);

        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 3));
        view.render(buf.area, &mut buf);
        assert!(row_text(&buf, 0).contains("name"));
        assert!(!row_text(&buf, 1).contains(" a "));
    }

    #[test]
    fn keys_scroll_horizontally() {
        let mut view = open();
        let mut buf = Buffer::empty(Rect::new(0, 0, 8, 6));
        view.render(buf.area, &mut buf);
        assert_eq!(
            view.handle_event(InputEvent::Key(key_char('l'))),
            InteractiveAction::Repaint
        );
        assert_eq!(view.scroll().x, 4.0);
        assert_eq!(
            view.handle_event(InputEvent::Key(key_char('x'))),
            InteractiveAction::None
        );
    }
}
