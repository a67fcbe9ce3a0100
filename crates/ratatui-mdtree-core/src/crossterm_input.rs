use crate::input::GesturePhase;
use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::KeyModifiers;
use crate::input::MouseButton;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;
use crate::input::ScaleEvent;

/// Relative scale of one Ctrl+wheel notch.
pub const WHEEL_ZOOM_STEP: f32 = 1.1;

/// Converts a crossterm event into an [`InputEvent`].
///
/// Terminals have no pinch gestures; Ctrl+wheel stands in for one, reported as a single
/// two-pointer [`GesturePhase::Update`] of [`WHEEL_ZOOM_STEP`].
pub fn input_event_from_crossterm(ev: crossterm::event::Event) -> Option<InputEvent> {
    match ev {
        crossterm::event::Event::Key(key) => {
            if key.kind != crossterm::event::KeyEventKind::Press {
                return None;
            }
            Some(InputEvent::Key(key_event_from_crossterm(key)?))
        }
        crossterm::event::Event::Mouse(m) => {
            if let Some(scale) = wheel_zoom_from_crossterm(&m) {
                return Some(InputEvent::Scale(scale));
            }
            Some(InputEvent::Mouse(mouse_event_from_crossterm(m)?))
        }
        _ => None,
    }
}

fn wheel_zoom_from_crossterm(m: &crossterm::event::MouseEvent) -> Option<ScaleEvent> {
    if !m.modifiers.contains(crossterm::event::KeyModifiers::CONTROL) {
        return None;
    }
    let scale = match m.kind {
        crossterm::event::MouseEventKind::ScrollUp => WHEEL_ZOOM_STEP,
        crossterm::event::MouseEventKind::ScrollDown => 1.0 / WHEEL_ZOOM_STEP,
        _ => return None,
    };
    Some(ScaleEvent {
        phase: GesturePhase::Update,
        pointer_count: 2,
        scale,
    })
}

pub fn key_event_from_crossterm(key: crossterm::event::KeyEvent) -> Option<KeyEvent> {
    let code = match key.code {
        crossterm::event::KeyCode::Char(c) => KeyCode::Char(c),
        crossterm::event::KeyCode::Enter => KeyCode::Enter,
        crossterm::event::KeyCode::Tab => KeyCode::Tab,
        crossterm::event::KeyCode::Esc => KeyCode::Esc,
        crossterm::event::KeyCode::Left => KeyCode::Left,
        crossterm::event::KeyCode::Right => KeyCode::Right,
        crossterm::event::KeyCode::Up => KeyCode::Up,
        crossterm::event::KeyCode::Down => KeyCode::Down,
        crossterm::event::KeyCode::Home => KeyCode::Home,
        crossterm::event::KeyCode::End => KeyCode::End,
        crossterm::event::KeyCode::PageUp => KeyCode::PageUp,
        crossterm::event::KeyCode::PageDown => KeyCode::PageDown,
        _ => return None,
    };

    Some(KeyEvent {
        code,
        modifiers: modifiers_from_crossterm(key.modifiers),
    })
}

pub fn mouse_event_from_crossterm(m: crossterm::event::MouseEvent) -> Option<MouseEvent> {
    let kind = match m.kind {
        crossterm::event::MouseEventKind::Down(b) => {
            MouseEventKind::Down(mouse_button_from_crossterm(b))
        }
        crossterm::event::MouseEventKind::Up(b) => {
            MouseEventKind::Up(mouse_button_from_crossterm(b))
        }
        crossterm::event::MouseEventKind::ScrollUp => MouseEventKind::ScrollUp,
        crossterm::event::MouseEventKind::ScrollDown => MouseEventKind::ScrollDown,
        crossterm::event::MouseEventKind::ScrollLeft => MouseEventKind::ScrollLeft,
        crossterm::event::MouseEventKind::ScrollRight => MouseEventKind::ScrollRight,
        _ => return None,
    };

    Some(MouseEvent {
        x: m.column,
        y: m.row,
        kind,
        modifiers: modifiers_from_crossterm(m.modifiers),
    })
}

fn modifiers_from_crossterm(m: crossterm::event::KeyModifiers) -> KeyModifiers {
    KeyModifiers {
        shift: m.contains(crossterm::event::KeyModifiers::SHIFT),
        ctrl: m.contains(crossterm::event::KeyModifiers::CONTROL),
        alt: m.contains(crossterm::event::KeyModifiers::ALT),
    }
}

fn mouse_button_from_crossterm(b: crossterm::event::MouseButton) -> MouseButton {
    match b {
        crossterm::event::MouseButton::Left => MouseButton::Left,
        crossterm::event::MouseButton::Right => MouseButton::Right,
        crossterm::event::MouseButton::Middle => MouseButton::Middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wheel(
        kind: crossterm::event::MouseEventKind,
        modifiers: crossterm::event::KeyModifiers,
    ) -> crossterm::event::Event {
        crossterm::event::Event::Mouse(crossterm::event::MouseEvent {
            kind,
            column: 3,
            row: 4,
            modifiers,
        })
    }

    #[test]
    fn ctrl_wheel_becomes_a_scale_step() {
        let ev = input_event_from_crossterm(wheel(
            crossterm::event::MouseEventKind::ScrollUp,
            crossterm::event::KeyModifiers::CONTROL,
        ));
        let Some(InputEvent::Scale(scale)) = ev else {
            panic!("expected a scale event, got {ev:?}");
        };
        assert!(scale.is_multi_pointer());
        assert_eq!(scale.scale, WHEEL_ZOOM_STEP);
    }

    #[test]
    fn plain_wheel_stays_a_mouse_event() {
        let ev = input_event_from_crossterm(wheel(
            crossterm::event::MouseEventKind::ScrollDown,
            crossterm::event::KeyModifiers::NONE,
        ));
        assert_eq!(
            ev,
            Some(InputEvent::Mouse(MouseEvent {
                x: 3,
                y: 4,
                kind: MouseEventKind::ScrollDown,
                modifiers: KeyModifiers::none(),
            }))
        );
    }
}
