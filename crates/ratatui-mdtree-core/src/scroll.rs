use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::key_char;
use crate::input::key_ctrl;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

/// Two-axis scroll position in layout units, clamped to the scrollable extent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollOffsets {
    pub x: f32,
    pub y: f32,
    pub viewport_w: f32,
    pub viewport_h: f32,
    pub content_w: f32,
    pub content_h: f32,
}

impl ScrollOffsets {
    pub fn set_viewport(&mut self, w: f32, h: f32) {
        self.viewport_w = w.max(0.0);
        self.viewport_h = h.max(0.0);
        self.clamp();
    }

    pub fn set_content(&mut self, w: f32, h: f32) {
        self.content_w = w.max(0.0);
        self.content_h = h.max(0.0);
        self.clamp();
    }

    pub fn clamp(&mut self) {
        self.x = self.x.clamp(0.0, self.max_x());
        self.y = self.y.clamp(0.0, self.max_y());
    }

    pub fn scroll_by(&mut self, dx: f32, dy: f32) {
        self.x = (self.x + dx).clamp(0.0, self.max_x());
        self.y = (self.y + dy).clamp(0.0, self.max_y());
    }

    pub fn max_x(&self) -> f32 {
        (self.content_w - self.viewport_w).max(0.0)
    }

    pub fn max_y(&self) -> f32 {
        (self.content_h - self.viewport_h).max(0.0)
    }
}

#[derive(Clone, Debug)]
pub struct ScrollBindings {
    pub line_step: f32,
    pub horiz_step: f32,
    pub up: Vec<KeyEvent>,
    pub down: Vec<KeyEvent>,
    pub left: Vec<KeyEvent>,
    pub right: Vec<KeyEvent>,
    pub page_up: Vec<KeyEvent>,
    pub page_down: Vec<KeyEvent>,
    pub top: Vec<KeyEvent>,
    pub bottom: Vec<KeyEvent>,
}

impl Default for ScrollBindings {
    fn default() -> Self {
        Self {
            line_step: 1.0,
            horiz_step: 4.0,
            up: vec![KeyEvent::new(KeyCode::Up), key_char('k')],
            down: vec![KeyEvent::new(KeyCode::Down), key_char('j')],
            left: vec![KeyEvent::new(KeyCode::Left), key_char('h')],
            right: vec![KeyEvent::new(KeyCode::Right), key_char('l')],
            page_up: vec![KeyEvent::new(KeyCode::PageUp), key_ctrl('u')],
            page_down: vec![KeyEvent::new(KeyCode::PageDown), key_ctrl('d')],
            top: vec![KeyEvent::new(KeyCode::Home), key_char('g')],
            bottom: vec![KeyEvent::new(KeyCode::End), key_char('G')],
        }
    }
}

impl ScrollBindings {
    pub fn action_for(&self, key: &KeyEvent) -> Option<ScrollAction> {
        let table = [
            (&self.up, ScrollAction::Up),
            (&self.down, ScrollAction::Down),
            (&self.left, ScrollAction::Left),
            (&self.right, ScrollAction::Right),
            (&self.page_up, ScrollAction::PageUp),
            (&self.page_down, ScrollAction::PageDown),
            (&self.top, ScrollAction::Top),
            (&self.bottom, ScrollAction::Bottom),
        ];
        table
            .into_iter()
            .find(|(keys, _)| keys.iter().any(|p| p.matches(key)))
            .map(|(_, action)| action)
    }

    pub fn apply(&self, offsets: &mut ScrollOffsets, action: ScrollAction) {
        let page = (offsets.viewport_h - 1.0).max(1.0);
        match action {
            ScrollAction::Up => offsets.scroll_by(0.0, -self.line_step),
            ScrollAction::Down => offsets.scroll_by(0.0, self.line_step),
            ScrollAction::Left => offsets.scroll_by(-self.horiz_step, 0.0),
            ScrollAction::Right => offsets.scroll_by(self.horiz_step, 0.0),
            ScrollAction::PageUp => offsets.scroll_by(0.0, -page),
            ScrollAction::PageDown => offsets.scroll_by(0.0, page),
            ScrollAction::Top => offsets.y = 0.0,
            ScrollAction::Bottom => offsets.y = offsets.max_y(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_clamp_both_axes() {
        let mut s = ScrollOffsets::default();
        s.set_viewport(10.0, 5.0);
        s.set_content(12.0, 6.0);
        s.scroll_by(99.0, 99.0);
        assert_eq!(s.x, 2.0);
        assert_eq!(s.y, 1.0);
    }

    #[test]
    fn bindings_map_keys_to_actions() {
        let b = ScrollBindings::default();
        assert_eq!(b.action_for(&key_char('j')), Some(ScrollAction::Down));
        assert_eq!(b.action_for(&key_ctrl('d')), Some(ScrollAction::PageDown));
        assert_eq!(b.action_for(&key_char('x')), None);

        let mut s = ScrollOffsets::default();
        s.set_viewport(10.0, 5.0);
        s.set_content(10.0, 50.0);
        b.apply(&mut s, ScrollAction::Bottom);
        assert_eq!(s.y, 45.0);
        b.apply(&mut s, ScrollAction::PageUp);
        assert_eq!(s.y, 41.0);
    }
}
