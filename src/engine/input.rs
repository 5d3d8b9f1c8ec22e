use crate::browser;
use crate::engine::Vec2;
use anyhow::Result;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use wasm_bindgen::JsCast;
use web_sys::{KeyboardEvent, MouseEvent};

/// Plain-data copy of a browser input event, so the game side never
/// touches web_sys types
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown(String),
    KeyUp(String),
    PointerDown { button: i16, position: Vec2 },
    PointerUp { button: i16 },
    PointerMove(Vec2),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

pub const LEFT_BUTTON: i16 = 0;
pub const RIGHT_BUTTON: i16 = 2;

// arrows and WASD both steer
static DIRECTION_KEYS: Lazy<HashMap<&'static str, Direction>> = Lazy::new(|| {
    HashMap::from([
        ("ArrowLeft", Direction::Left),
        ("KeyA", Direction::Left),
        ("ArrowRight", Direction::Right),
        ("KeyD", Direction::Right),
        ("ArrowUp", Direction::Up),
        ("KeyW", Direction::Up),
        ("ArrowDown", Direction::Down),
        ("KeyS", Direction::Down),
    ])
});

// keys whose default action scrolls the page
const SCROLL_KEYS: [&str; 5] = ["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight", "Space"];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct PointerState {
    pub position: Vec2,
    pub is_down: bool,
    pub just_pressed: bool,
    pub right_down: bool,
    pub right_just_pressed: bool,
}

/// Held keys plus the edges (just pressed) seen since the last simulation step
#[derive(Debug, Default)]
pub struct KeyState {
    pressed: HashSet<String>,
    just_pressed: HashSet<String>,
    pointer: PointerState,
}

impl KeyState {
    pub fn new() -> Self {
        KeyState::default()
    }

    pub fn is_pressed(&self, code: &str) -> bool {
        self.pressed.contains(code)
    }

    pub fn just_pressed(&self, code: &str) -> bool {
        self.just_pressed.contains(code)
    }

    pub fn any_just_pressed(&self, codes: &[&str]) -> bool {
        codes.iter().any(|code| self.just_pressed(code))
    }

    /// Browser key repeat sends keydown again while held, that is not a new edge
    pub fn set_pressed(&mut self, code: &str) {
        if self.pressed.insert(code.to_string()) {
            self.just_pressed.insert(code.to_string());
        }
    }

    pub fn set_released(&mut self, code: &str) {
        self.pressed.remove(code);
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.pressed
            .iter()
            .any(|code| DIRECTION_KEYS.get(code.as_str()) == Some(&direction))
    }

    /// True when any steering key went down since the last step
    pub fn direction_just_pressed(&self) -> bool {
        self.just_pressed
            .iter()
            .any(|code| DIRECTION_KEYS.contains_key(code.as_str()))
    }

    /// Raw steering axis in {-1, 0, 1}^2, screen coordinates (down is +y).
    /// Opposite keys cancel out.
    pub fn direction(&self) -> Vec2 {
        let axis = |negative, positive| {
            let mut value = 0.0;
            if self.is_held(negative) {
                value -= 1.0;
            }
            if self.is_held(positive) {
                value += 1.0;
            }
            value
        };
        Vec2::new(
            axis(Direction::Left, Direction::Right),
            axis(Direction::Up, Direction::Down),
        )
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown(code) => self.set_pressed(&code),
            InputEvent::KeyUp(code) => self.set_released(&code),
            InputEvent::PointerDown { button, position } => {
                self.pointer.position = position;
                let pointer = &mut self.pointer;
                match button {
                    LEFT_BUTTON => {
                        pointer.just_pressed |= !pointer.is_down;
                        pointer.is_down = true;
                    }
                    RIGHT_BUTTON => {
                        pointer.right_just_pressed |= !pointer.right_down;
                        pointer.right_down = true;
                    }
                    _ => {}
                }
            }
            InputEvent::PointerUp { button } => match button {
                LEFT_BUTTON => self.pointer.is_down = false,
                RIGHT_BUTTON => self.pointer.right_down = false,
                _ => {}
            },
            InputEvent::PointerMove(position) => self.pointer.position = position,
        }
    }

    /// Drops the edges once a simulation step has seen them
    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.pointer.just_pressed = false;
        self.pointer.right_just_pressed = false;
    }
}

// ==================== Browser wiring ====================
pub fn prepare_input() -> Result<UnboundedReceiver<InputEvent>> {
    let (sender, receiver) = unbounded();
    let window = browser::window()?;
    let canvas = browser::canvas()?;

    let onkeydown = keyboard_closure(sender.clone(), InputEvent::KeyDown);
    let onkeyup = keyboard_closure(sender.clone(), InputEvent::KeyUp);

    let mousedown_sender = sender.clone();
    let onmousedown = browser::closure_wrap(Box::new(move |event: MouseEvent| {
        let _ = mousedown_sender.unbounded_send(InputEvent::PointerDown {
            button: event.button(),
            position: Vec2::new(event.offset_x() as f64, event.offset_y() as f64),
        });
    }) as Box<dyn FnMut(MouseEvent)>);

    let mouseup_sender = sender.clone();
    let onmouseup = browser::closure_wrap(Box::new(move |event: MouseEvent| {
        let _ = mouseup_sender.unbounded_send(InputEvent::PointerUp {
            button: event.button(),
        });
    }) as Box<dyn FnMut(MouseEvent)>);

    let onmousemove = browser::closure_wrap(Box::new(move |event: MouseEvent| {
        let _ = sender.unbounded_send(InputEvent::PointerMove(Vec2::new(
            event.offset_x() as f64,
            event.offset_y() as f64,
        )));
    }) as Box<dyn FnMut(MouseEvent)>);

    // right click is a game input, not a context menu
    let oncontextmenu = browser::closure_wrap(Box::new(move |event: MouseEvent| {
        event.prevent_default();
    }) as Box<dyn FnMut(MouseEvent)>);

    window.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
    window.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
    canvas.set_onmousedown(Some(onmousedown.as_ref().unchecked_ref()));
    // a release outside the canvas still ends the press
    window.set_onmouseup(Some(onmouseup.as_ref().unchecked_ref()));
    canvas.set_onmousemove(Some(onmousemove.as_ref().unchecked_ref()));
    canvas.set_oncontextmenu(Some(oncontextmenu.as_ref().unchecked_ref()));

    // listeners live as long as the page
    onkeydown.forget();
    onkeyup.forget();
    onmousedown.forget();
    onmouseup.forget();
    onmousemove.forget();
    oncontextmenu.forget();

    Ok(receiver)
}

fn keyboard_closure(
    sender: UnboundedSender<InputEvent>,
    wrap: fn(String) -> InputEvent,
) -> wasm_bindgen::closure::Closure<dyn FnMut(KeyboardEvent)> {
    browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
        let code = event.code();
        if SCROLL_KEYS.contains(&code.as_str()) {
            event.prevent_default();
        }
        let _ = sender.unbounded_send(wrap(code));
    }) as Box<dyn FnMut(KeyboardEvent)>)
}

pub fn process_input(state: &mut KeyState, receiver: &mut UnboundedReceiver<InputEvent>) {
    while let Ok(event) = receiver.try_recv() {
        state.apply(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_repeat_is_not_a_new_edge() {
        let mut keys = KeyState::new();
        keys.set_pressed("Space");
        assert!(keys.just_pressed("Space"));
        keys.end_frame();
        keys.set_pressed("Space");
        assert!(keys.is_pressed("Space"));
        assert!(!keys.just_pressed("Space"));
    }

    #[test]
    fn release_then_press_is_a_new_edge() {
        let mut keys = KeyState::new();
        keys.set_pressed("KeyH");
        keys.end_frame();
        keys.set_released("KeyH");
        keys.set_pressed("KeyH");
        assert!(keys.just_pressed("KeyH"));
    }

    #[test]
    fn arrows_and_wasd_share_directions() {
        let mut keys = KeyState::new();
        keys.set_pressed("KeyD");
        keys.set_pressed("ArrowUp");
        assert_eq!(keys.direction(), Vec2::new(1.0, -1.0));
        assert!(keys.direction_just_pressed());
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut keys = KeyState::new();
        keys.set_pressed("ArrowLeft");
        keys.set_pressed("KeyD");
        assert_eq!(keys.direction(), Vec2::ZERO);
    }

    #[test]
    fn non_direction_keys_do_not_steer() {
        let mut keys = KeyState::new();
        keys.set_pressed("Space");
        assert_eq!(keys.direction(), Vec2::ZERO);
        assert!(!keys.direction_just_pressed());
    }

    #[test]
    fn pointer_events_track_left_button() {
        let mut keys = KeyState::new();
        keys.apply(InputEvent::PointerDown {
            button: LEFT_BUTTON,
            position: Vec2::new(12.0, 34.0),
        });
        assert!(keys.pointer().is_down);
        assert!(keys.pointer().just_pressed);
        assert_eq!(keys.pointer().position, Vec2::new(12.0, 34.0));

        keys.end_frame();
        assert!(!keys.pointer().just_pressed);

        keys.apply(InputEvent::PointerUp { button: LEFT_BUTTON });
        assert!(!keys.pointer().is_down);
    }

    #[test]
    fn right_button_is_tracked_apart_from_left() {
        let mut keys = KeyState::new();
        keys.apply(InputEvent::PointerDown {
            button: RIGHT_BUTTON,
            position: Vec2::new(1.0, 1.0),
        });
        assert!(keys.pointer().right_down);
        assert!(keys.pointer().right_just_pressed);
        assert!(!keys.pointer().is_down);
        assert!(!keys.pointer().just_pressed);

        keys.end_frame();
        keys.apply(InputEvent::PointerDown {
            button: RIGHT_BUTTON,
            position: Vec2::new(1.0, 1.0),
        });
        assert!(!keys.pointer().right_just_pressed);

        keys.apply(InputEvent::PointerUp { button: RIGHT_BUTTON });
        assert!(!keys.pointer().right_down);
    }

    #[test]
    fn middle_button_is_ignored() {
        let mut keys = KeyState::new();
        keys.apply(InputEvent::PointerDown {
            button: 1,
            position: Vec2::new(5.0, 6.0),
        });
        assert!(!keys.pointer().is_down);
        assert!(!keys.pointer().right_down);
        assert_eq!(keys.pointer().position, Vec2::new(5.0, 6.0));
    }

    #[test]
    fn release_anywhere_allows_the_next_click() {
        let mut keys = KeyState::new();
        keys.apply(InputEvent::PointerDown {
            button: LEFT_BUTTON,
            position: Vec2::ZERO,
        });
        keys.end_frame();
        keys.apply(InputEvent::PointerUp { button: LEFT_BUTTON });
        keys.apply(InputEvent::PointerDown {
            button: LEFT_BUTTON,
            position: Vec2::ZERO,
        });
        assert!(keys.pointer().just_pressed);
    }
}
